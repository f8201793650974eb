//! # Decoders
//!
//! Concrete [`Decoder`](crate::decoder::Decoder) implementations, from the
//! generic layout primitives up to the project-specific views.
//!
//! ## Primitives
//!
//! - [`strided`]: flat arrays read with an element stride, row-major
//!   matrices with a row stride, `[start, finish)` pointer ranges
//! - [`fields`]: fixed-schema field sequences and named-field subsets
//! - [`ordered_map`]: in-order walk of a raw red-black tree
//!
//! ## Built on the primitives
//!
//! - [`variant`]: discriminant-driven re-typing
//! - [`composite`]: keyed voxel containers (tree walk plus value-type rules)
//! - [`fibre`]: coordinate triples, strands, tracks, tractlets
//! - [`opaque`]: what a value looks like when nothing is registered for it
//!
//! Each decoder keeps only the handle (and small bits of layout) it was built
//! from; children are recomputed every time they are requested.

pub mod composite;
pub mod fibre;
pub mod fields;
pub mod opaque;
pub mod ordered_map;
pub mod strided;
pub mod variant;

use crate::decoder::Child;
use crate::error::InspectResult;
use crate::value::Handle;

/// Turn the result of reading a sub-value into a child, keeping the error
/// scoped to that child.
pub(crate) fn child_or_diagnostic(result: InspectResult<Handle>) -> Child
{
    match result {
        Ok(handle) => Child::Value(handle),
        Err(err) => Child::diagnostic(&err),
    }
}
