//! # Standard Catalogue
//!
//! The registration set for the tractography project's types, parameterized
//! by [`Namespace`] so a renamed or forked project reuses it unchanged.
//!
//! ## Registration order
//!
//! 1. Linear algebra: vectors, matrices and the types laid out like them
//! 2. Fibres: coordinates, triples, strands, tracks, tractlets, sections, sets
//! 3. Images: voxel containers, the expected-image variant, voxels
//! 4. MCMC proposals
//! 5. `std::map`
//!
//! Every pattern is anchored to the whole signature, so the order only
//! matters between patterns that genuinely overlap.

use std::sync::Arc;

use regex::escape;

use crate::config::Namespace;
use crate::decoder::{Decoder, DisplayHint};
use crate::decoders::composite::{ContainerShape, DisplayName, KeyedContainer, ValueTypeRule};
use crate::decoders::fibre::{self, FibreSet, Polyline, PolylineKind, Tractlet, Triple, SECTION_SLOTS};
use crate::decoders::fields::{FieldSequence, NamedFields};
use crate::decoders::ordered_map::{node_type, OrderedMap, TreeLayout};
use crate::decoders::strided::{MatrixLayout, PointerRange, StridedArray, StridedMatrix, VectorLayout};
use crate::decoders::variant::{Variant, VariantTable};
use crate::error::InspectResult;
use crate::registry::{Registry, RegistryBuilder};
use crate::types::TypeSignature;
use crate::value::Handle;

/// Discriminants of the expected-image buffer and the type each selects.
pub const EXPECTED_IMAGE_KINDS: [(&str, &str); 7] = [
    ("trilinear", "Trilinear"),
    ("top_hat", "TopHat"),
    ("gaussian", "Gaussian"),
    ("quartic", "Quartic"),
    ("realistic", "Realistic"),
    ("sinc", "Sinc"),
    ("reverse_sqrt", "ReverseSqrt"),
];

/// Members a density voxel is shown through.
pub const DENSITY_VOXEL_FIELDS: &[&str] = &["coordinate", "centre_point", "dens"];

fn boxed<D: Decoder + 'static>(decoder: D) -> Box<dyn Decoder>
{
    Box::new(decoder)
}

/// Build the registry for `namespace`.
///
/// ## Errors
///
/// `InvalidPattern` only if a namespace makes a pattern invalid, which
/// escaping rules out.
pub fn standard_registry(namespace: &Namespace) -> InspectResult<Registry>
{
    let mut builder = RegistryBuilder::new();
    register_math(&mut builder, namespace)?;
    register_fibre(&mut builder, namespace)?;
    register_image(&mut builder, namespace)?;
    register_mcmc(&mut builder, namespace)?;
    register_std(&mut builder)?;
    Ok(builder.build())
}

fn vector(builder: &mut RegistryBuilder, pattern: &str, title: String, layout: VectorLayout) -> InspectResult<()>
{
    builder.register(pattern, move |handle, _| {
        Ok(boxed(StridedArray::from_layout(title.clone(), &handle, &layout)?))
    })?;
    Ok(())
}

fn matrix(builder: &mut RegistryBuilder, pattern: &str, title: String) -> InspectResult<()>
{
    builder.register(pattern, move |handle, _| {
        Ok(boxed(StridedMatrix::from_layout(title.clone(), &handle, &MatrixLayout::STANDARD)?))
    })?;
    Ok(())
}

/// Vectors, matrices, and the state/tensor types that share their layout.
///
/// ## Errors
///
/// As [`standard_registry`].
pub fn register_math(builder: &mut RegistryBuilder, ns: &Namespace) -> InspectResult<()>
{
    let vector_type = ns.math_type("Vector");
    let matrix_type = ns.math_type("Matrix");
    vector(builder, &format!("{}<.*>", escape(&vector_type)), vector_type, VectorLayout::STANDARD)?;
    matrix(builder, &format!("{}<.*>", escape(&matrix_type)), matrix_type)?;

    for tensor in ["Fibre::Strand::Set::Tensor", "Fibre::Tract::Set::Tensor"] {
        let name = ns.qualify(tensor);
        matrix(builder, &escape(&name), name)?;
    }

    let state = ns.qualify("MCMC::State");
    vector(builder, &escape(&state), state.clone(), VectorLayout::STANDARD)?;
    let state_tensor = format!("{state}::Tensor");
    matrix(builder, &escape(&state_tensor), state_tensor)?;
    Ok(())
}

/// Coordinates and fibre models.
///
/// ## Errors
///
/// As [`standard_registry`].
pub fn register_fibre(builder: &mut RegistryBuilder, ns: &Namespace) -> InspectResult<()>
{
    builder.register(&format!("{}<.*>", escape(&ns.qualify("Triple"))), |handle, _| {
        Ok(boxed(Triple::new(&handle)?))
    })?;
    builder.register(&escape(&ns.qualify("Coord")), |handle, _| Ok(boxed(fibre::coord(&handle)?)))?;
    builder.register(&escape(&ns.qualify("Fibre::Strand")), |handle, _| {
        Ok(boxed(Polyline::new(&handle, PolylineKind::Strand)?))
    })?;
    builder.register(&escape(&ns.qualify("Fibre::Tractlet")), |handle, _| {
        Ok(boxed(Tractlet::new(&handle)?))
    })?;
    builder.register(&escape(&ns.qualify("Fibre::Track")), |handle, _| {
        Ok(boxed(Polyline::new(&handle, PolylineKind::Track)?))
    })?;

    for section in ["Fibre::Tractlet::Section", "Fibre::Strand::BasicSection", "Fibre::Strand::Section"] {
        builder.register(&escape(&ns.qualify(section)), move |handle, _| {
            Ok(boxed(FieldSequence::from_members(section, &handle, SECTION_SLOTS)?))
        })?;
    }

    for set in ["Fibre::Strand::Set", "Fibre::Tractlet::Set", "Fibre::Track::Set"] {
        builder.register(&escape(&ns.qualify(set)), move |handle, _| {
            Ok(boxed(FibreSet::new(set, &handle)?))
        })?;
    }
    builder.register(&format!("{}<.*>", escape(&ns.qualify("Fibre::Set"))), |handle, _| {
        Ok(boxed(FibreSet::new("Fibre::Set", &handle)?))
    })?;
    Ok(())
}

fn container(builder: &mut RegistryBuilder, pattern: &str, shape: ContainerShape) -> InspectResult<()>
{
    let shape = Arc::new(shape);
    builder.register(pattern, move |handle, _| Ok(boxed(KeyedContainer::new(&handle, &shape)?)))?;
    Ok(())
}

/// Intensities of a voxel, viewed as the `Voxel<element>` base it derives from.
fn voxel(handle: &Handle, base_type: &str, element: &str) -> InspectResult<Box<dyn Decoder>>
{
    let title = TypeSignature::of(&**handle)?.to_string();
    let base = handle.cast(base_type)?;
    let hint = if element == "double" { DisplayHint::Array } else { DisplayHint::Scalar };
    Ok(boxed(PointerRange::from_vector(title, &base, &["intensities"])?.with_hint(hint)))
}

/// Image buffers, the expected-image variant and voxel types.
///
/// ## Errors
///
/// As [`standard_registry`].
pub fn register_image(builder: &mut RegistryBuilder, ns: &Namespace) -> InspectResult<()>
{
    let image = ns.qualify("Image");
    let image_re = escape(&image);
    let shape = |value_type: ValueTypeRule, display: DisplayName| ContainerShape {
        tree_field: "voxels".to_string(),
        key_type: format!("{image}::Coord"),
        value_type,
        display,
        layout: TreeLayout::LIBSTDCXX,
    };

    container(
        builder,
        &format!("{image_re}::Buffer"),
        shape(ValueTypeRule::Fixed(format!("{image}::Voxel<double>")), DisplayName::Signature),
    )?;
    let expected_kinds: Vec<&str> = EXPECTED_IMAGE_KINDS.iter().map(|(_, kind)| *kind).collect();
    container(
        builder,
        &format!("{image_re}::(?:Expected::(?:{})|Observed)::Buffer", expected_kinds.join("|")),
        shape(ValueTypeRule::Sibling("Voxel".to_string()), DisplayName::Signature),
    )?;
    container(
        builder,
        &format!("{image_re}::Density::Buffer"),
        shape(ValueTypeRule::Fixed(format!("{image}::Density::Voxel")), DisplayName::Signature),
    )?;
    container(
        builder,
        &format!("{image_re}::Container::Buffer<.*>"),
        shape(
            ValueTypeRule::Substitute(format!("{image}::Container::Voxel<{{}}>")),
            DisplayName::Template(format!("{image}::Container::Buffer<{{}}>")),
        ),
    )?;
    container(
        builder,
        &format!("{image_re}::Reference::Buffer<.*>"),
        shape(
            ValueTypeRule::Substitute("std::__debug::vector<{}*, std::allocator<{}*>>".to_string()),
            DisplayName::Signature,
        ),
    )?;

    let mut table = VariantTable::new("type");
    for (discriminant, kind) in EXPECTED_IMAGE_KINDS {
        table = table.entry(discriminant, format!("{image}::Expected::{kind}::Buffer"));
    }
    let table = Arc::new(table);
    builder.register(&format!("{image_re}::Expected::Buffer"), move |handle, registry| {
        Ok(boxed(Variant::new(&handle, &table, registry)?))
    })?;

    for side in ["Expected", "Observed"] {
        container(
            builder,
            &format!("{image_re}::{side}::Buffer_tpl<.*>"),
            shape(
                ValueTypeRule::Argument,
                DisplayName::Template(format!("{image}::{side}::Buffer_tpl<{{}}>")),
            ),
        )?;
    }

    let double_voxel = format!("{image}::Voxel<double>");
    builder.register(
        &format!(
            "{image_re}::(?:Voxel<double>|Expected::(?:{})::Voxel|Observed::Voxel)",
            expected_kinds.join("|")
        ),
        move |handle, _| voxel(&handle, &double_voxel, "double"),
    )?;
    let voxel_base = format!("{image}::Voxel");
    builder.register(&format!("{image_re}::Container::Voxel<.*>"), move |handle, _| {
        let element = handle.template_argument(0)?;
        voxel(&handle, &format!("{voxel_base}<{}>", element.trim()), element.trim())
    })?;
    builder.register(&format!("{image_re}::Density::Voxel"), |handle, _| {
        Ok(boxed(NamedFields::new("Image::Density::Voxel", handle, DENSITY_VOXEL_FIELDS)))
    })?;
    Ok(())
}

/// Momentum proposals, which keep their vector in `momen`.
///
/// ## Errors
///
/// As [`standard_registry`].
pub fn register_mcmc(builder: &mut RegistryBuilder, ns: &Namespace) -> InspectResult<()>
{
    let momentum = ns.qualify("MCMC::Proposal::Momentum");
    let layout = VectorLayout::STANDARD.nested(&["momen"]);

    vector(builder, &escape(&momentum), "MCMC::Proposal::Momentum".to_string(), layout)?;
    for derived in ["Weighted", "Weighted::NonSeparable"] {
        let base = momentum.clone();
        let title = format!("MCMC::Proposal::Momentum::{derived}");
        builder.register(&escape(&format!("{momentum}::{derived}")), move |handle, _| {
            let base = handle.cast(&base)?;
            Ok(boxed(StridedArray::from_layout(title.clone(), &base, &layout)?))
        })?;
    }
    Ok(())
}

/// `std::map`, walked through its libstdc++ tree.
///
/// ## Errors
///
/// As [`standard_registry`].
pub fn register_std(builder: &mut RegistryBuilder) -> InspectResult<()>
{
    builder.register("std::map<.*>", |handle, _| {
        let key = handle.template_argument(0)?;
        let value = handle.template_argument(1)?;
        let node_pointer = format!("{} *", node_type(&key, &value));
        Ok(boxed(OrderedMap::new("std::map", handle, node_pointer, TreeLayout::LIBSTDCXX)))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_standard_registry_builds()
    {
        let registry = standard_registry(&Namespace::default()).unwrap();
        assert!(registry.len() > 20);
    }

    #[test]
    fn test_patterns_follow_namespace()
    {
        let ns = Namespace {
            root: "Tracto".to_string(),
            math: "Lin".to_string(),
        };
        let registry = standard_registry(&ns).unwrap();
        let strand = TypeSignature::from_name("Tracto::Fibre::Strand");
        let vector = TypeSignature::from_name("Lin::Vector<double>");
        assert!(registry.matching_index(&strand).is_some());
        assert!(registry.matching_index(&vector).is_some());
        assert!(registry
            .matching_index(&TypeSignature::from_name("BTS::Fibre::Strand"))
            .is_none());
    }

    #[test]
    fn test_every_expected_kind_has_a_voxel_decoder()
    {
        let registry = standard_registry(&Namespace::default()).unwrap();
        let plain = registry.matching_index(&TypeSignature::from_name("BTS::Image::Voxel<double>"));
        for (_, kind) in EXPECTED_IMAGE_KINDS {
            let voxel = TypeSignature::from_name(&format!("BTS::Image::Expected::{kind}::Voxel"));
            assert_eq!(registry.matching_index(&voxel), plain, "{kind}");
        }
    }

    #[test]
    fn test_expected_variants_and_concrete_buffers_are_distinct()
    {
        let registry = standard_registry(&Namespace::default()).unwrap();
        let variant = registry.matching_index(&TypeSignature::from_name("BTS::Image::Expected::Buffer"));
        let gaussian = registry.matching_index(&TypeSignature::from_name("BTS::Image::Expected::Gaussian::Buffer"));
        assert!(variant.is_some());
        assert!(gaussian.is_some());
        assert_ne!(variant, gaussian);
    }
}
