//! Discriminated values.
//!
//! A base type whose concrete type is chosen at runtime by a string (or enum)
//! member. The discriminant is looked up in a fixed table; on a hit the value
//! is cast to the concrete type and shown through whatever decoder the
//! registry has for it.
//!
//! The concrete decoder is built when the variant is, so two variants whose
//! tables point at each other would nest without end. Nesting on one thread
//! is capped at [`MAX_VARIANT_NESTING`]; past that the innermost value is a
//! `Malformed` diagnostic.

use std::cell::Cell;
use std::sync::Arc;

use tracing::debug;

use crate::decoder::{Children, Decoder, DisplayHint};
use crate::decoders::opaque::OpaqueDecoder;
use crate::error::{InspectError, InspectResult};
use crate::registry::Registry;
use crate::types::TypeSignature;
use crate::value::Handle;

/// Variants built inside one another before the chain is treated as a cycle.
pub const MAX_VARIANT_NESTING: usize = 16;

thread_local! {
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

/// Marks one variant under construction on this thread
struct Nesting;

impl Nesting
{
    fn enter(original: &TypeSignature) -> InspectResult<Self>
    {
        let guard = Nesting;
        let depth = NESTING.with(|n| {
            n.set(n.get() + 1);
            n.get()
        });
        if depth > MAX_VARIANT_NESTING {
            return Err(InspectError::Malformed(format!(
                "variant '{original}' nests more than {MAX_VARIANT_NESTING} variants deep"
            )));
        }
        Ok(guard)
    }
}

impl Drop for Nesting
{
    fn drop(&mut self)
    {
        NESTING.with(|n| n.set(n.get().saturating_sub(1)));
    }
}

/// Discriminant member plus the explicit discriminant → type table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTable
{
    /// Member holding the discriminant
    pub field: String,
    /// `(discriminant, concrete type)` pairs, first match wins
    pub entries: Vec<(String, String)>,
}

impl VariantTable
{
    pub fn new(field: impl Into<String>) -> Self
    {
        Self {
            field: field.into(),
            entries: Vec::new(),
        }
    }

    /// Add one mapping.
    #[must_use]
    pub fn entry(mut self, discriminant: impl Into<String>, type_name: impl Into<String>) -> Self
    {
        self.entries.push((discriminant.into(), type_name.into()));
        self
    }

    /// Concrete type for `discriminant`.
    pub fn lookup(&self, discriminant: &str) -> Option<&str>
    {
        self.entries
            .iter()
            .find(|(key, _)| key == discriminant)
            .map(|(_, type_name)| type_name.as_str())
    }
}

enum Resolution
{
    Delegate(Box<dyn Decoder>),
    Unknown
    {
        discriminant: String,
        type_name: String,
    },
}

/// Decoder that re-dispatches on a runtime discriminant
pub struct Variant
{
    resolution: Resolution,
}

impl Variant
{
    /// Read the discriminant of `handle` and pick the concrete decoder.
    ///
    /// ## Errors
    ///
    /// Whatever reading the discriminant member reports. An unrecognized
    /// discriminant is not an error; it produces a diagnostic summary.
    pub fn new(handle: &Handle, table: &Arc<VariantTable>, registry: &Registry) -> InspectResult<Self>
    {
        let discriminant = handle.field(&table.field)?.string()?;
        let original = TypeSignature::of(&**handle)?;

        let Some(concrete) = table.lookup(&discriminant) else {
            debug!(%original, %discriminant, "unrecognized discriminant");
            return Ok(Self {
                resolution: Resolution::Unknown {
                    discriminant,
                    type_name: original.to_string(),
                },
            });
        };

        let cast = handle.cast(concrete)?;
        debug!(%original, %discriminant, concrete, "variant resolved");
        let _nesting = Nesting::enter(&original)?;
        // a table entry naming the variant type itself would recurse forever
        let delegate: Box<dyn Decoder> = if TypeSignature::of(&*cast)? == original {
            Box::new(OpaqueDecoder::new(cast))
        } else {
            registry.decode(&cast)
        };

        Ok(Self {
            resolution: Resolution::Delegate(delegate),
        })
    }
}

impl Decoder for Variant
{
    fn summary(&self) -> String
    {
        match &self.resolution {
            Resolution::Delegate(delegate) => delegate.summary(),
            Resolution::Unknown {
                discriminant,
                type_name,
            } => format!("Unknown {type_name} discriminant '{discriminant}'."),
        }
    }

    fn children(&self) -> Option<Children<'_>>
    {
        match &self.resolution {
            Resolution::Delegate(delegate) => delegate.children(),
            Resolution::Unknown { .. } => None,
        }
    }

    fn display_hint(&self) -> DisplayHint
    {
        match &self.resolution {
            Resolution::Delegate(delegate) => delegate.display_hint(),
            Resolution::Unknown { .. } => DisplayHint::Scalar,
        }
    }
}
