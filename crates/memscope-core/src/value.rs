//! # Memory Value Handle
//!
//! The read-only view of one typed location in the inspected process.
//!
//! Handles are supplied by the host: a debugger plugin wraps its own value
//! API, tests and the CLI use [`SnapshotValue`](crate::snapshot::SnapshotValue)
//! over a captured byte image. Decoders only ever talk to this trait, so they
//! stay independent of any particular debugger.
//!
//! ## Design Philosophy
//!
//! The operations mirror what a C++ pretty-printer needs and nothing more:
//!
//! - **Navigation**: field lookup, pointer dereference, pointer arithmetic
//! - **Reinterpretation**: cast to another named type (same location)
//! - **Extraction**: scalar and string reads
//! - **Type queries**: declared type name, alias layers, template arguments
//!
//! There is no write operation.

use std::fmt;

use crate::error::InspectResult;
use crate::types::{Address, Scalar};

/// Owned, type-erased handle
pub type Handle = Box<dyn ValueHandle>;

/// What the host knows about one layer of a declared type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLayer
{
    /// `name` is a reference to the contained type
    Reference(String),
    /// `name` is a typedef of the contained type
    Typedef(String),
    /// `name` is a concrete type (or unknown to the host)
    Concrete,
}

/// Read-only accessor to a typed value in the inspected process
///
/// Every method that produces a new handle leaves `self` untouched; handles
/// are values, not cursors.
///
/// ## Errors
///
/// All fallible operations report through [`InspectError`](crate::error::InspectError):
/// unmapped memory, missing fields, wrong value category. Callers are expected
/// to scope those failures to the value they were decoding.
pub trait ValueHandle: fmt::Debug
{
    /// The type name as declared, before any alias resolution.
    fn declared_type(&self) -> String;

    /// Resolve one alias layer of `type_name`.
    ///
    /// Used by [`TypeSignature::of`](crate::types::TypeSignature::of) to peel
    /// references and typedefs until a concrete name is reached.
    fn type_layer(&self, type_name: &str) -> TypeLayer;

    /// Location of the value, if it lives in memory (computed pointers do not).
    fn address(&self) -> Option<Address>;

    /// Look up a member by name.
    fn field(&self, name: &str) -> InspectResult<Handle>;

    /// Member names in declaration order. Empty for non-aggregates.
    fn field_names(&self) -> InspectResult<Vec<String>>;

    /// Whether the value is a pointer.
    fn is_pointer(&self) -> bool;

    /// The address a pointer value holds.
    fn pointer_value(&self) -> InspectResult<Address>;

    /// `*p`: the value a pointer points at.
    fn dereference(&self) -> InspectResult<Handle>;

    /// `p + elements`: pointer arithmetic in units of the pointee size.
    fn offset(&self, elements: i64) -> InspectResult<Handle>;

    /// Reinterpret the same location as `type_name`.
    ///
    /// Casting a pointer to another pointer type reinterprets the pointee;
    /// this is how raw tree nodes are viewed through their concrete node type.
    fn cast(&self, type_name: &str) -> InspectResult<Handle>;

    /// Read a primitive value.
    fn scalar(&self) -> InspectResult<Scalar>;

    /// Read a string: NUL-terminated text behind a `char *`, or an enumerator name.
    fn string(&self) -> InspectResult<String>;

    /// The `index`th template argument of the value's concrete type.
    fn template_argument(&self, index: usize) -> InspectResult<String>;

    /// Clone into a new box.
    fn boxed_clone(&self) -> Handle;

    /// Follow a chain of member names: `["momen", "size"]` is `val.momen.size`.
    fn field_path(&self, path: &[&str]) -> InspectResult<Handle>
    {
        let mut current = self.boxed_clone();
        for name in path {
            current = current.field(name)?;
        }
        Ok(current)
    }

    /// Read the value as an element count or stride.
    fn count(&self) -> InspectResult<u64>
    {
        self.scalar()?.to_count()
    }

    /// Whether a pointer value is null.
    fn is_null(&self) -> InspectResult<bool>
    {
        Ok(self.pointer_value()?.is_null())
    }
}

impl Clone for Handle
{
    fn clone(&self) -> Self
    {
        self.boxed_clone()
    }
}
