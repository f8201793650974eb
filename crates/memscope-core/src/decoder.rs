//! # Decoder Interface
//!
//! What the host sees after dispatch: a summary line, an optional lazy
//! sequence of labelled children, and a hint about how to lay them out.

use std::fmt;

use crate::error::InspectError;
use crate::value::Handle;

/// How a host should lay out a node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayHint
{
    /// Leaf or plain aggregate
    Scalar,
    /// Indexed sequence
    Array,
    /// Row-major two-dimensional sequence
    Grid,
    /// Alternating key and value children
    Map,
}

impl fmt::Display for DisplayHint
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            DisplayHint::Scalar => "scalar",
            DisplayHint::Array => "array",
            DisplayHint::Grid => "grid",
            DisplayHint::Map => "map",
        };
        f.write_str(name)
    }
}

/// One child of a decoded node
pub enum Child
{
    /// Raw sub-value; the host dispatches it through the registry again
    Value(Handle),
    /// Already decoded (synthesized text, nested views, diagnostics)
    Node(Box<dyn Decoder>),
}

impl Child
{
    /// A leaf child holding plain text.
    pub fn text(text: impl Into<String>) -> Self
    {
        Child::Node(Box::new(Leaf::text(text)))
    }

    /// A leaf child reporting why a sub-value could not be read.
    pub fn diagnostic(error: &InspectError) -> Self
    {
        Child::Node(Box::new(Leaf::diagnostic(error)))
    }
}

impl fmt::Debug for Child
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Child::Value(handle) => f.debug_tuple("Value").field(handle).finish(),
            Child::Node(node) => f.debug_tuple("Node").field(&node.summary()).finish(),
        }
    }
}

/// Lazy child sequence. Dropping it early is always safe.
pub type Children<'a> = Box<dyn Iterator<Item = (String, Child)> + 'a>;

/// A decoder bound to one handle
///
/// Every call recomputes from the handle, so calling [`Decoder::children`]
/// twice yields two independent sequences.
pub trait Decoder
{
    /// One-line description of the value.
    fn summary(&self) -> String;

    /// Labelled children, or `None` for a leaf.
    fn children(&self) -> Option<Children<'_>>
    {
        None
    }

    /// Layout hint for the children.
    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Scalar
    }
}

/// A childless node with fixed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf
{
    text: String,
}

impl Leaf
{
    /// Plain text leaf.
    pub fn text(text: impl Into<String>) -> Self
    {
        Self { text: text.into() }
    }

    /// Diagnostic leaf for a failed read.
    pub fn diagnostic(error: &InspectError) -> Self
    {
        Self {
            text: format!("<error: {error}>"),
        }
    }
}

impl Decoder for Leaf
{
    fn summary(&self) -> String
    {
        self.text.clone()
    }
}
