//! Tests for fibre and MCMC decoders

mod common;

use common::{Fixture, Image, VECTOR};
use memscope_core::decoder::DisplayHint;
use memscope_core::render::{RenderLimits, RenderedNode, Renderer};
use memscope_core::types::{Address, Scalar};
use memscope_core::{standard_registry, Namespace};

const STRAND: &str = "BTS::Fibre::Strand";
const TRACK: &str = "BTS::Fibre::Track";
const TRACTLET: &str = "BTS::Fibre::Tractlet";
const SECTION: &str = "BTS::Fibre::Strand::Section";
const COORD: &str = "BTS::Coord";
const TRIPLE: &str = "BTS::Triple<double>";
const MOMENTUM: &str = "BTS::MCMC::Proposal::Momentum";
const WEIGHTED: &str = "BTS::MCMC::Proposal::Momentum::Weighted";

fn fixture() -> Fixture
{
    let mut fx = Fixture::new();
    let strided = [("data", "double *"), ("stride", "size_t"), ("sze", "size_t")];
    fx.catalog.define_struct(STRAND, &strided).unwrap();
    fx.catalog.define_struct(TRACK, &strided).unwrap();
    fx.catalog
        .define_struct(
            TRACTLET,
            &[("data", "double *"), ("stride", "size_t"), ("dgree", "size_t"), ("size", "size_t")],
        )
        .unwrap();
    fx.catalog.define_struct(SECTION, &[("data", "double *"), ("stride", "size_t")]).unwrap();
    fx.catalog.define_struct(COORD, &[("data", "double *"), ("stride", "size_t")]).unwrap();
    fx.catalog.define_struct(TRIPLE, &[("p", "double [3]")]).unwrap();
    fx.catalog.define_struct("BTS::Fibre::Strand::Set", &[("sze", "size_t")]).unwrap();
    fx.catalog.define_struct(MOMENTUM, &[("momen", VECTOR)]).unwrap();
    fx.catalog.define_struct(WEIGHTED, &[("momen", VECTOR), ("weight", "double")]).unwrap();
    fx
}

/// Allocate `type_name` over fresh `values` with `data`/`stride` set.
fn strided(fx: &mut Fixture, type_name: &str, values: &[f64], stride: u64) -> Address
{
    let data = fx.builder.alloc_f64s("fibre data", values);
    let object = fx.alloc(type_name);
    fx.point(type_name, object, "data", data);
    fx.set(type_name, object, "stride", Scalar::Unsigned(stride));
    object
}

fn render(image: &Image, type_name: &str, address: Address) -> RenderedNode
{
    let registry = standard_registry(&Namespace::default()).unwrap();
    Renderer::new(&registry, RenderLimits::default()).render(&image.handle(type_name, address))
}

#[test]
fn test_strand_points()
{
    let mut fx = fixture();
    let strand = strided(&mut fx, STRAND, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1);
    fx.set(STRAND, strand, "sze", Scalar::Unsigned(2));
    let image = fx.finish();

    let node = render(&image, STRAND, strand);
    assert_eq!(node.summary, "Fibre::Strand (degree=2)");
    assert_eq!(node.hint, DisplayHint::Array);
    assert_eq!(node.child_labels(), ["0", "1"]);
    assert_eq!(node.child_summaries(), ["[1, 2, 3]", "[4, 5, 6]"]);
}

#[test]
fn test_track_uses_stride()
{
    let mut fx = fixture();
    let track = strided(&mut fx, TRACK, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0], 2);
    fx.set(TRACK, track, "sze", Scalar::Unsigned(1));
    let image = fx.finish();

    let node = render(&image, TRACK, track);
    assert_eq!(node.summary, "Fibre::Track (size=1)");
    assert_eq!(node.child_summaries(), ["[1, 2, 3]"]);
}

#[test]
fn test_tractlet_axes_and_alpha()
{
    let mut fx = fixture();
    let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 0.5];
    let tractlet = strided(&mut fx, TRACTLET, &values, 1);
    fx.set(TRACTLET, tractlet, "dgree", Scalar::Unsigned(1));
    fx.set(TRACTLET, tractlet, "size", Scalar::Unsigned(10));
    let image = fx.finish();

    let node = render(&image, TRACTLET, tractlet);
    assert_eq!(node.summary, "Fibre::Tractlet (degree=1, alpha=0.5)");
    assert_eq!(node.child_summaries(), ["[1, 2, 3 | 4, 5, 6 | 7, 8, 9]"]);
}

#[test]
fn test_tractlet_without_properties_has_unit_alpha()
{
    let mut fx = fixture();
    let tractlet = strided(&mut fx, TRACTLET, &[0.0; 9], 1);
    fx.set(TRACTLET, tractlet, "dgree", Scalar::Unsigned(1));
    fx.set(TRACTLET, tractlet, "size", Scalar::Unsigned(9));
    let image = fx.finish();

    assert_eq!(render(&image, TRACTLET, tractlet).summary, "Fibre::Tractlet (degree=1, alpha=1)");
}

#[test]
fn test_section_slots()
{
    let mut fx = fixture();
    let section = strided(&mut fx, SECTION, &[1.0, 2.0, 3.0, 0.0, 0.0, 1.0, 0.75], 1);
    let image = fx.finish();

    let node = render(&image, SECTION, section);
    assert_eq!(node.child_labels(), ["position", "tangent", "intensity"]);
    assert_eq!(node.child_summaries(), ["[1, 2, 3]", "[0, 0, 1]", "0.75"]);
}

#[test]
fn test_coord_and_triple_summaries()
{
    let mut fx = fixture();
    let coord = strided(&mut fx, COORD, &[1.0, 9.0, 2.0, 9.0, 3.0, 9.0], 2);
    let triple = fx.alloc(TRIPLE);
    let (p, _) = fx.catalog.offset_of(TRIPLE, "p").unwrap();
    for (i, value) in [4.0, 5.0, 6.0].into_iter().enumerate() {
        fx.builder.write_f64(triple + p + 8 * i as u64, value).unwrap();
    }
    let image = fx.finish();

    assert_eq!(render(&image, COORD, coord).summary, "[1, 2, 3]");
    let node = render(&image, TRIPLE, triple);
    assert_eq!(node.summary, "[4, 5, 6]");
    assert_eq!(node.child_labels(), ["0", "1", "2"]);
}

#[test]
fn test_fibre_set_reports_size_only()
{
    let mut fx = fixture();
    let set = fx.alloc("BTS::Fibre::Strand::Set");
    fx.set("BTS::Fibre::Strand::Set", set, "sze", Scalar::Unsigned(4));
    let image = fx.finish();

    let node = render(&image, "BTS::Fibre::Strand::Set", set);
    assert_eq!(node.summary, "Fibre::Strand::Set: size 4");
    assert!(node.children.is_empty());
}

#[test]
fn test_momentum_variants_share_the_nested_vector()
{
    let mut fx = fixture();
    let data = fx.builder.alloc_f64s("momentum", &[0.5, -0.5]);
    let mut proposals = Vec::new();
    for type_name in [MOMENTUM, WEIGHTED] {
        let proposal = fx.alloc(type_name);
        fx.set(type_name, proposal, "momen.size", Scalar::Unsigned(2));
        fx.set(type_name, proposal, "momen.stride", Scalar::Unsigned(1));
        fx.point(type_name, proposal, "momen.data", data);
        proposals.push(proposal);
    }
    let image = fx.finish();

    let plain = render(&image, MOMENTUM, proposals[0]);
    assert_eq!(plain.summary, "MCMC::Proposal::Momentum: size 2");
    assert_eq!(plain.child_summaries(), ["0.5", "-0.5"]);

    let weighted = render(&image, WEIGHTED, proposals[1]);
    assert_eq!(weighted.summary, "MCMC::Proposal::Momentum::Weighted: size 2");
    assert_eq!(weighted.child_summaries(), ["0.5", "-0.5"]);
}
