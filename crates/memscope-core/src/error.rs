//! # Error Types
//!
//! Errors raised while reading values out of an inspected memory image.
//!
//! None of these are fatal to a host. Decoders catch them at the smallest
//! scope they can (one child, one field, one tree node) and turn them into a
//! diagnostic leaf, so a single unreadable pointer never hides its siblings.
//! We use `thiserror` to derive `Error` and the display strings.

use thiserror::Error;

use crate::types::Address;

/// Main error type for value inspection
///
/// ## Error Categories
///
/// 1. **Memory errors**: UnmappedAddress
/// 2. **Shape errors**: FieldNotFound, UnknownType, NotAPointer, NotAScalar, NotAString
/// 3. **Layout errors**: InvalidCount, Malformed, MissingTemplateArgument, AliasDepthExceeded
/// 4. **Registration errors**: InvalidPattern
#[derive(Error, Debug)]
pub enum InspectError
{
    /// The requested byte range is not covered by the snapshot
    ///
    /// This is what a dangling or garbage pointer in a malformed container
    /// turns into.
    #[error("Address {address} is not mapped ({len} bytes requested)")]
    UnmappedAddress
    {
        /// First byte requested
        address: Address,
        /// Number of bytes requested
        len: usize,
    },

    /// The value's type has no field with the given name
    #[error("Type '{type_name}' has no field '{field}'")]
    FieldNotFound
    {
        /// Type that was searched
        type_name: String,
        /// Field that was requested
        field: String,
    },

    /// The type catalogue has no entry for the given name
    #[error("Unknown type '{0}'")]
    UnknownType(String),

    /// A pointer operation was applied to a non-pointer value
    #[error("Value of type '{0}' is not a pointer")]
    NotAPointer(String),

    /// A scalar read was applied to an aggregate value
    #[error("Value of type '{0}' is not a scalar")]
    NotAScalar(String),

    /// A string read was applied to a value that is neither a C string nor an enum
    #[error("Value of type '{0}' cannot be read as a string")]
    NotAString(String),

    /// A size field held something that cannot be an element count
    #[error("Invalid element count: {0}")]
    InvalidCount(String),

    /// The type name has fewer template arguments than requested
    #[error("Type '{type_name}' has no template argument {index}")]
    MissingTemplateArgument
    {
        /// Type whose arguments were inspected
        type_name: String,
        /// Zero-based argument index
        index: usize,
    },

    /// A container's internal links contradict its own bookkeeping
    ///
    /// Raised when a tree descent or climb takes more steps than the
    /// container claims to hold nodes.
    #[error("Malformed structure: {0}")]
    Malformed(String),

    /// Typedef or reference chain too deep (most likely cyclic)
    #[error("Alias chain starting at '{0}' is too deep")]
    AliasDepthExceeded(String),

    /// A registration pattern failed to compile
    #[error("Invalid signature pattern '{pattern}': {source}")]
    InvalidPattern
    {
        /// The pattern as written by the caller
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Invalid argument passed to an engine function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for `Result<T, InspectError>`
///
/// ```rust
/// use memscope_core::error::InspectResult;
/// fn foo() -> InspectResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type InspectResult<T> = std::result::Result<T, InspectError>;
