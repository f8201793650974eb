//! Tests for strided vector and matrix decoding

mod common;

use common::{Fixture, MATRIX, VECTOR};
use memscope_core::decoder::DisplayHint;
use memscope_core::render::{RenderLimits, Renderer};
use memscope_core::{standard_registry, Namespace};

#[test]
fn test_vector_summary_and_elements()
{
    let mut fx = Fixture::new();
    let vector = fx.vector(&[7.0, 8.0, 9.0], 3, 1);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle(VECTOR, vector));
    assert_eq!(node.summary, "MR::Math::Vector: size 3");
    assert_eq!(node.hint, DisplayHint::Array);
    assert_eq!(node.child_labels(), ["0", "1", "2"]);
    assert_eq!(node.child_summaries(), ["7", "8", "9"]);
    assert!(!node.truncated);
}

#[test]
fn test_vector_honours_stride()
{
    let mut fx = Fixture::new();
    let vector = fx.vector(&[1.0, -1.0, 2.0, -1.0, 3.0, -1.0], 3, 2);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle(VECTOR, vector));
    assert_eq!(node.child_summaries(), ["1", "2", "3"]);
}

#[test]
fn test_empty_vector_has_no_children()
{
    let mut fx = Fixture::new();
    let vector = fx.vector(&[0.0], 0, 1);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle(VECTOR, vector));
    assert_eq!(node.summary, "MR::Math::Vector: size 0");
    assert!(node.children.is_empty());
}

#[test]
fn test_zero_row_and_zero_col_matrix_is_empty()
{
    let mut fx = Fixture::new();
    let no_rows = fx.matrix(&[1.0, 2.0, 3.0, 4.0], 0, 3, 4);
    let no_cols = fx.matrix(&[1.0, 2.0, 3.0, 4.0], 2, 0, 0);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();
    let renderer = Renderer::new(&registry, RenderLimits::default());

    let node = renderer.render(&image.handle(MATRIX, no_rows));
    assert_eq!(node.summary, "MR::Math::Matrix: rows 0, cols 3");
    assert_eq!(node.hint, DisplayHint::Grid);
    assert!(node.children.is_empty());
    assert!(!node.truncated);

    let node = renderer.render(&image.handle(MATRIX, no_cols));
    assert_eq!(node.summary, "MR::Math::Matrix: rows 2, cols 0");
    assert!(node.children.is_empty());
    assert!(!node.truncated);
}

#[test]
fn test_matrix_view_skips_row_padding()
{
    let mut fx = Fixture::new();
    let matrix = fx.matrix(&[1.0, 2.0, 3.0, -99.0, 4.0, 5.0, 6.0, -99.0], 2, 3, 4);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle(MATRIX, matrix));
    assert_eq!(node.summary, "MR::Math::Matrix: rows 2, cols 3");
    assert_eq!(node.hint, DisplayHint::Grid);
    assert_eq!(node.child_labels(), ["(0,0)", "(0,1)", "(0,2)", "(1,0)", "(1,1)", "(1,2)"]);
    assert_eq!(node.child_summaries(), ["1", "2", "3", "4", "5", "6"]);
}

#[test]
fn test_matrix_with_short_row_stride_is_a_diagnostic()
{
    let mut fx = Fixture::new();
    let matrix = fx.matrix(&[1.0, 2.0, 3.0, 4.0], 2, 2, 1);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle(MATRIX, matrix));
    assert!(node.summary.starts_with("<error:"), "{}", node.summary);
    assert!(node.children.is_empty());
}

#[test]
fn test_unmapped_element_fails_only_that_child()
{
    let mut fx = Fixture::new();
    // claims four elements, only two are mapped
    let vector = fx.vector(&[1.0, 2.0], 4, 1);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();

    let node = Renderer::new(&registry, RenderLimits::default()).render(&image.handle(VECTOR, vector));
    let summaries = node.child_summaries();
    assert_eq!(summaries.len(), 4);
    assert_eq!(&summaries[..2], ["1", "2"]);
    assert!(summaries[2].starts_with("<error:"));
    assert!(summaries[3].starts_with("<error:"));
}

#[test]
fn test_huge_size_is_bounded_by_limits()
{
    let mut fx = Fixture::new();
    let vector = fx.vector(&[1.0, 2.0, 3.0], 1 << 60, 1);
    let image = fx.finish();
    let registry = standard_registry(&Namespace::default()).unwrap();
    let limits = RenderLimits {
        max_depth: 2,
        max_children: 3,
    };

    let node = Renderer::new(&registry, limits).render(&image.handle(VECTOR, vector));
    assert_eq!(node.children.len(), 3);
    assert!(node.truncated);
    assert_eq!(node.child_summaries(), ["1", "2", "3"]);
}

#[test]
fn test_strided_array_built_directly()
{
    use memscope_core::decoder::Decoder;
    use memscope_core::decoders::strided::{StridedArray, VectorLayout};

    let mut fx = Fixture::new();
    let vector = fx.vector(&[7.0, 8.0, 9.0], 3, 1);
    let image = fx.finish();

    let array = StridedArray::from_layout("Vector", &image.handle(VECTOR, vector), &VectorLayout::STANDARD).unwrap();
    assert_eq!(array.summary(), "Vector: size 3");
    assert_eq!(array.len(), 3);
    assert_eq!(array.element(1).unwrap().scalar().unwrap().to_string(), "8");
    assert!(array.element(3).is_err());
}
