//! Default rendering for values no registration matches.
//!
//! Mirrors what a debugger prints without a pretty-printer: pointers as an
//! address (plus the text for `char *`), primitives by value, enums by name,
//! aggregates as their type with one child per member.

use crate::decoder::{Child, Children, Decoder, DisplayHint};
use crate::decoders::child_or_diagnostic;
use crate::types::TypeSignature;
use crate::value::Handle;

/// Structural fallback decoder
#[derive(Debug, Clone)]
pub struct OpaqueDecoder
{
    handle: Handle,
}

impl OpaqueDecoder
{
    pub fn new(handle: Handle) -> Self
    {
        Self { handle }
    }

    fn type_name(&self) -> String
    {
        TypeSignature::of(&*self.handle)
            .map_or_else(|_| self.handle.declared_type(), |signature| signature.to_string())
    }
}

impl Decoder for OpaqueDecoder
{
    fn summary(&self) -> String
    {
        if self.handle.is_pointer() {
            return match self.handle.pointer_value() {
                Ok(address) if address.is_null() => "0x0".to_string(),
                Ok(address) => match self.handle.string() {
                    Ok(text) => format!("{address} {text:?}"),
                    Err(_) => address.to_string(),
                },
                Err(err) => format!("<error: {err}>"),
            };
        }

        if let Ok(scalar) = self.handle.scalar() {
            // enums read as scalars too; prefer the enumerator name
            return self.handle.string().unwrap_or_else(|_| scalar.to_string());
        }

        match self.handle.field_names() {
            Ok(names) if !names.is_empty() => format!("{{{}}}", self.type_name()),
            Ok(_) => match self.handle.string() {
                Ok(text) => format!("{text:?}"),
                Err(_) => format!("{{{}}}", self.type_name()),
            },
            Err(err) => format!("<error: {err}>"),
        }
    }

    fn children(&self) -> Option<Children<'_>>
    {
        if self.handle.is_pointer() || self.handle.scalar().is_ok() {
            return None;
        }

        let names = self.handle.field_names().ok().filter(|names| !names.is_empty())?;
        Some(Box::new(names.into_iter().map(move |name| {
            let child: Child = child_or_diagnostic(self.handle.field(&name));
            (name, child)
        })))
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Scalar
    }
}
