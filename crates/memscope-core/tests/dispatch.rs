//! Tests for signature normalization, dispatch and rendering limits

mod common;

use common::{Fixture, VECTOR};
use memscope_core::decoder::{Decoder, DisplayHint, Leaf};
use memscope_core::registry::{self, RegistryBuilder};
use memscope_core::render::{RenderLimits, Renderer};
use memscope_core::types::{Scalar, TypeSignature};
use memscope_core::{standard_registry, Namespace};

#[test]
fn test_qualifiers_references_and_typedefs_reach_the_same_decoder()
{
    let mut fx = Fixture::new();
    fx.catalog.define_typedef("DirectionVector", VECTOR);
    fx.catalog.define_typedef("Direction", "DirectionVector");
    let vector = fx.vector(&[7.0, 8.0, 9.0], 3, 1);
    let reference = fx.builder.alloc("reference", 8);
    fx.builder.write_pointer(reference, vector).unwrap();
    let image = fx.finish();

    let registry = standard_registry(&Namespace::default()).unwrap();
    let renderer = Renderer::new(&registry, RenderLimits::default());
    let direct = renderer.render(&image.handle(VECTOR, vector));

    for alias in ["const MR::Math::Vector<double>", "Direction", "const Direction"] {
        let handle = image.handle(alias, vector);
        assert_eq!(TypeSignature::of(&*handle).unwrap().as_str(), VECTOR, "{alias}");
        assert_eq!(renderer.render(&handle), direct, "{alias}");
    }
    let by_reference = image.handle("const Direction &", reference);
    assert_eq!(renderer.render(&by_reference), direct);
}

#[test]
fn test_alias_cycle_is_a_diagnostic()
{
    let mut fx = Fixture::new();
    fx.catalog.define_typedef("Ping", "Pong");
    fx.catalog.define_typedef("Pong", "Ping");
    let somewhere = fx.builder.alloc("somewhere", 8);
    let image = fx.finish();

    let registry = standard_registry(&Namespace::default()).unwrap();
    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle("Ping", somewhere));
    assert!(node.summary.starts_with("<error:"), "{}", node.summary);
    assert!(node.children.is_empty());
}

#[test]
fn test_template_arguments_do_not_trigger_a_match()
{
    let registry = standard_registry(&Namespace::default()).unwrap();
    let voxel = TypeSignature::from_name("BTS::Image::Container::Voxel< MR::Math::Vector<double> >");
    let vector = TypeSignature::from_name(VECTOR);
    assert_ne!(registry.matching_index(&voxel), registry.matching_index(&vector));
}

#[test]
fn test_custom_namespace_moves_every_registration()
{
    let ns = Namespace {
        root: "Tracto".to_string(),
        math: "Lin".to_string(),
    };
    let registry = standard_registry(&ns).unwrap();
    for name in ["Tracto::Fibre::Track", "Tracto::Image::Density::Voxel", "Lin::Matrix<float>", "Tracto::MCMC::State"] {
        assert!(registry.matching_index(&TypeSignature::from_name(name)).is_some(), "{name}");
    }
    assert!(registry.patterns().all(|pattern| !pattern.contains("BTS")));
}

#[test]
fn test_decoding_is_deterministic()
{
    let mut fx = Fixture::new();
    let vector = fx.vector(&[1.0, 2.0, 3.0, 4.0], 4, 1);
    let (types, map, _) = fx.int_map(&[(3, 0.3), (1, 0.1), (2, 0.2)]);
    let image = fx.finish();

    let registry = standard_registry(&Namespace::default()).unwrap();
    let renderer = Renderer::new(&registry, RenderLimits::default());
    for (type_name, address) in [(VECTOR, vector), (types.map.as_str(), map)] {
        let first = renderer.render(&image.handle(type_name, address));
        let second = renderer.render(&image.handle(type_name, address));
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }
}

#[test]
fn test_unmatched_value_renders_its_members()
{
    let mut fx = Fixture::new();
    fx.catalog.define_struct("Lab::Pair", &[("left", "int"), ("right", "double")]).unwrap();
    let pair = fx.alloc("Lab::Pair");
    fx.set("Lab::Pair", pair, "left", Scalar::Signed(-3));
    fx.set("Lab::Pair", pair, "right", Scalar::Float(2.5));
    let image = fx.finish();

    let registry = standard_registry(&Namespace::default()).unwrap();
    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle("Lab::Pair", pair));
    assert_eq!(node.summary, "{Lab::Pair}");
    assert_eq!(node.hint, DisplayHint::Scalar);
    assert_eq!(node.child_labels(), ["left", "right"]);
    assert_eq!(node.child_summaries(), ["-3", "2.5"]);
}

#[test]
fn test_depth_limit_truncates_nested_children()
{
    let mut fx = Fixture::new();
    let vector = fx.vector(&[1.0, 2.0], 2, 1);
    let image = fx.finish();

    let registry = standard_registry(&Namespace::default()).unwrap();
    let limits = RenderLimits {
        max_depth: 0,
        max_children: 64,
    };
    let node = Renderer::new(&registry, limits).render(&image.handle(VECTOR, vector));
    assert_eq!(node.summary, "MR::Math::Vector: size 2");
    assert!(node.children.is_empty());
    assert!(node.truncated);
    assert!(node.to_string().ends_with("...\n"));
}

#[test]
fn test_failing_factory_is_scoped_to_its_value()
{
    let mut builder = RegistryBuilder::new();
    builder
        .register("Lab::Pair", |handle, _| {
            handle.field("missing")?;
            Ok(Box::new(Leaf::text("unreachable")) as Box<dyn Decoder>)
        })
        .unwrap();
    let registry = builder.build();

    let mut fx = Fixture::new();
    fx.catalog.define_struct("Lab::Pair", &[("left", "int")]).unwrap();
    fx.catalog.define_struct("Lab::Outer", &[("pair", "Lab::Pair"), ("flag", "bool")]).unwrap();
    let outer = fx.alloc("Lab::Outer");
    fx.set("Lab::Outer", outer, "flag", Scalar::Bool(true));
    let image = fx.finish();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle("Lab::Outer", outer));
    assert_eq!(node.child_labels(), ["pair", "flag"]);
    let summaries = node.child_summaries();
    assert!(summaries[0].starts_with("<error:"), "{}", summaries[0]);
    assert_eq!(summaries[1], "true");
}

#[test]
fn test_global_registry_is_the_standard_catalogue()
{
    let global = registry::global().unwrap();
    let standard = standard_registry(&Namespace::default()).unwrap();
    assert_eq!(global.patterns().collect::<Vec<_>>(), standard.patterns().collect::<Vec<_>>());
}
