//! Type signatures: the normalized names decoders are registered against.
//!
//! A handle's declared type is whatever the debug information says the
//! variable was declared as: `const Buffer &`, a typedef of a typedef, or a
//! template instance spelled with arbitrary spacing. Registrations are written
//! against the canonical spelling of the underlying type, so the normalizer
//! peels qualifiers, references and typedefs and then canonicalizes spacing
//! around template punctuation.

use std::fmt;

use smallvec::SmallVec;

use crate::error::{InspectError, InspectResult};
use crate::value::{TypeLayer, ValueHandle};

/// Maximum number of typedef/reference layers followed before giving up.
pub const MAX_ALIAS_DEPTH: usize = 32;

/// Normalized type name used as the registry lookup key
///
/// Never parsed structurally by the registry; patterns are matched against
/// the whole string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSignature(String);

impl TypeSignature
{
    /// Normalize the declared type of `handle`.
    ///
    /// ## Errors
    ///
    /// `AliasDepthExceeded` if the typedef/reference chain does not end
    /// within [`MAX_ALIAS_DEPTH`] steps.
    pub fn of(handle: &dyn ValueHandle) -> InspectResult<Self>
    {
        let declared = handle.declared_type();
        let mut name = strip_qualifiers(&declared).to_string();

        for _ in 0..MAX_ALIAS_DEPTH {
            match handle.type_layer(&name) {
                TypeLayer::Reference(target) | TypeLayer::Typedef(target) => {
                    name = strip_qualifiers(&target).to_string();
                }
                TypeLayer::Concrete => return Ok(Self(canonicalize(&name))),
            }
        }

        Err(InspectError::AliasDepthExceeded(declared))
    }

    /// Canonicalize a type name that needs no alias resolution.
    ///
    /// ```rust
    /// use memscope_core::types::TypeSignature;
    ///
    /// let sig = TypeSignature::from_name("const Container::Voxel< Math::Vector<double> > &");
    /// assert_eq!(sig.as_str(), "Container::Voxel<Math::Vector<double>>");
    /// ```
    pub fn from_name(name: &str) -> Self
    {
        Self(canonicalize(strip_qualifiers(name)))
    }

    /// The normalized name
    pub fn as_str(&self) -> &str
    {
        &self.0
    }
}

impl fmt::Display for TypeSignature
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// Remove cv-qualifiers and a trailing lvalue/rvalue reference marker.
pub fn strip_qualifiers(name: &str) -> &str
{
    let mut name = name.trim();
    loop {
        let before = name;
        for prefix in ["const ", "volatile "] {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest.trim_start();
            }
        }
        for suffix in ["&&", "&", " const", " volatile"] {
            if let Some(rest) = name.strip_suffix(suffix) {
                name = rest.trim_end();
            }
        }
        if name == before {
            return name;
        }
    }
}

/// Collapse whitespace, drop it around `<`, `>` and `,`, then put a single
/// space after every comma.
pub fn canonicalize(name: &str) -> String
{
    let collapsed: Vec<char> = {
        let mut chars = Vec::with_capacity(name.len());
        for word in name.split_whitespace() {
            if !chars.is_empty() {
                chars.push(' ');
            }
            chars.extend(word.chars());
        }
        chars
    };

    let mut out = String::with_capacity(collapsed.len());
    for (i, &c) in collapsed.iter().enumerate() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = collapsed.get(i + 1).copied();
            let punct = |ch: Option<char>| matches!(ch, Some('<' | '>' | ','));
            if prev == Some(' ') || punct(prev) || punct(next) {
                continue;
            }
        }
        out.push(c);
        if c == ',' {
            out.push(' ');
        }
    }
    out
}

/// Split the outermost template argument list of `name` at top-level commas.
///
/// `std::map<Coord, std::vector<double, A>>` yields `["Coord",
/// "std::vector<double, A>"]`. Names without a template argument list yield
/// nothing.
pub fn template_arguments(name: &str) -> SmallVec<[String; 4]>
{
    let mut args = SmallVec::new();
    let Some(open) = name.find('<') else {
        return args;
    };
    let Some(close) = name.rfind('>') else {
        return args;
    };
    if close <= open {
        return args;
    }

    let inner = &name[open + 1..close];
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() || !args.is_empty() {
        args.push(last.to_string());
    }
    args
}

/// Everything before the last top-level `::`, if any.
///
/// `A::B<C::D>::Buffer` yields `A::B<C::D>`.
pub fn enclosing_scope(name: &str) -> Option<&str>
{
    let mut depth = 0usize;
    let mut split = None;
    let bytes = name.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => split = Some(i),
            _ => {}
        }
    }
    split.map(|i| &name[..i])
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_strip_qualifiers()
    {
        assert_eq!(strip_qualifiers("const Foo &"), "Foo");
        assert_eq!(strip_qualifiers("volatile const Foo&&"), "Foo");
        assert_eq!(strip_qualifiers("Foo const"), "Foo");
        assert_eq!(strip_qualifiers("double *"), "double *");
    }

    #[test]
    fn test_canonicalize_template_spacing()
    {
        assert_eq!(canonicalize("Voxel< Math::Vector<double> >"), "Voxel<Math::Vector<double>>");
        assert_eq!(canonicalize("std::pair<const  Coord ,double>"), "std::pair<const Coord, double>");
        assert_eq!(canonicalize("Plain::Name"), "Plain::Name");
        assert_eq!(canonicalize("double  *"), "double *");
    }

    #[test]
    fn test_template_arguments()
    {
        let args = template_arguments("std::map<Coord, std::vector<double, A<B>>>");
        assert_eq!(args.as_slice(), ["Coord", "std::vector<double, A<B>>"]);
        assert!(template_arguments("Plain").is_empty());
        assert_eq!(template_arguments("Buffer< Fibre::Strand >").as_slice(), ["Fibre::Strand"]);
    }

    #[test]
    fn test_enclosing_scope()
    {
        assert_eq!(enclosing_scope("A::B::Buffer"), Some("A::B"));
        assert_eq!(enclosing_scope("A::B<C::D>::Buffer"), Some("A::B<C::D>"));
        assert_eq!(enclosing_scope("Buffer"), None);
    }
}
