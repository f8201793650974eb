//! # Renderer
//!
//! Host-side materialization of a decoded value into a plain tree.
//!
//! A decoder tree can be unbounded (a garbage size field claims 2^60
//! elements) or deeply nested, so the renderer only pulls what its
//! [`RenderLimits`] allow. Children past `max_children` are never requested;
//! the lazy sequence is simply dropped and the node marked truncated.

use std::fmt;

use tracing::trace;

use crate::decoder::{Child, Decoder, DisplayHint};
use crate::registry::Registry;
use crate::value::Handle;

/// How much of a decoded tree is materialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits
{
    /// Deepest level whose children are requested (the root is level 0)
    pub max_depth: usize,
    /// Children requested per node
    pub max_children: usize,
}

impl Default for RenderLimits
{
    fn default() -> Self
    {
        Self {
            max_depth: 6,
            max_children: 64,
        }
    }
}

/// One materialized node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNode
{
    pub summary: String,
    pub hint: DisplayHint,
    /// Labelled children, in decoder order
    pub children: Vec<(String, RenderedNode)>,
    /// Whether the decoder had more children than were requested
    pub truncated: bool,
}

impl RenderedNode
{
    /// Summaries of the direct children, in order.
    pub fn child_summaries(&self) -> Vec<&str>
    {
        self.children.iter().map(|(_, child)| child.summary.as_str()).collect()
    }

    /// Labels of the direct children, in order.
    pub fn child_labels(&self) -> Vec<&str>
    {
        self.children.iter().map(|(label, _)| label.as_str()).collect()
    }

    /// One-line form: the summary, followed by `{label = ...}` for each child.
    /// Map keys are printed this way.
    #[must_use]
    pub fn inline(&self) -> String
    {
        if self.children.is_empty() && !self.truncated {
            return self.summary.clone();
        }
        let mut parts: Vec<String> = self
            .children
            .iter()
            .map(|(label, child)| format!("{label} = {}", child.inline()))
            .collect();
        if self.truncated {
            parts.push("...".to_string());
        }
        format!("{} {{{}}}", self.summary, parts.join(", "))
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result
    {
        let pad = "  ".repeat(indent);
        if self.hint == DisplayHint::Map {
            for pair in self.children.chunks(2) {
                match pair {
                    [(_, key), (_, value)] => {
                        writeln!(f, "{pad}{} => {}", key.inline(), value.summary)?;
                        value.write_tree(f, indent + 1)?;
                    }
                    [(label, lone)] => {
                        writeln!(f, "{pad}{label} = {}", lone.summary)?;
                    }
                    _ => {}
                }
            }
        } else {
            for (label, child) in &self.children {
                writeln!(f, "{pad}{label} = {}", child.summary)?;
                child.write_tree(f, indent + 1)?;
            }
        }
        if self.truncated {
            writeln!(f, "{pad}...")?;
        }
        Ok(())
    }
}

impl fmt::Display for RenderedNode
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        writeln!(f, "{}", self.summary)?;
        self.write_tree(f, 1)
    }
}

/// Walks decoders, dispatching raw children through a registry
#[derive(Debug, Clone)]
pub struct Renderer<'r>
{
    registry: &'r Registry,
    limits: RenderLimits,
}

impl<'r> Renderer<'r>
{
    pub fn new(registry: &'r Registry, limits: RenderLimits) -> Self
    {
        Self { registry, limits }
    }

    /// Decode `handle` (opaquely if nothing matches) and materialize it.
    pub fn render(&self, handle: &Handle) -> RenderedNode
    {
        let decoder = self.registry.decode(handle);
        self.render_decoder(decoder.as_ref(), 0)
    }

    /// Materialize an already-built decoder at `depth`.
    pub fn render_decoder(&self, decoder: &dyn Decoder, depth: usize) -> RenderedNode
    {
        let mut node = RenderedNode {
            summary: decoder.summary(),
            hint: decoder.display_hint(),
            children: Vec::new(),
            truncated: false,
        };

        let Some(mut children) = decoder.children() else {
            return node;
        };
        if depth >= self.limits.max_depth {
            node.truncated = children.next().is_some();
            return node;
        }

        for (label, child) in children.by_ref().take(self.limits.max_children) {
            let rendered = match child {
                Child::Value(handle) => {
                    let decoder = self.registry.decode(&handle);
                    self.render_decoder(decoder.as_ref(), depth + 1)
                }
                Child::Node(decoder) => self.render_decoder(decoder.as_ref(), depth + 1),
            };
            node.children.push((label, rendered));
        }
        node.truncated = children.next().is_some();
        if node.truncated {
            trace!(depth, max_children = self.limits.max_children, "children truncated");
        }
        node
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::decoder::{Children, Leaf};

    /// Endless sequence of numbered leaves, each with a nested copy of itself
    struct Endless
    {
        hint: DisplayHint,
    }

    impl Decoder for Endless
    {
        fn summary(&self) -> String
        {
            "endless".to_string()
        }

        fn children(&self) -> Option<Children<'_>>
        {
            let hint = self.hint;
            Some(Box::new((0u64..).map(move |i| {
                let child = if i % 2 == 0 {
                    Child::text(i.to_string())
                } else {
                    Child::Node(Box::new(Endless { hint }))
                };
                (i.to_string(), child)
            })))
        }

        fn display_hint(&self) -> DisplayHint
        {
            self.hint
        }
    }

    #[test]
    fn test_unbounded_children_are_cut_at_the_limit()
    {
        let registry = Registry::empty();
        let limits = RenderLimits {
            max_depth: 1,
            max_children: 4,
        };
        let node = Renderer::new(&registry, limits).render_decoder(&Endless { hint: DisplayHint::Array }, 0);
        assert_eq!(node.child_labels(), ["0", "1", "2", "3"]);
        assert!(node.truncated);

        let (_, nested) = &node.children[1];
        assert!(nested.children.is_empty());
        assert!(nested.truncated);
    }

    #[test]
    fn test_leaf_is_never_truncated()
    {
        let registry = Registry::empty();
        let node = Renderer::new(&registry, RenderLimits::default()).render_decoder(&Leaf::text("x"), 0);
        assert_eq!(node.summary, "x");
        assert!(node.children.is_empty());
        assert!(!node.truncated);
    }

    /// Map of two struct keys that share a summary but differ in their members
    struct Keyed;

    impl Decoder for Keyed
    {
        fn summary(&self) -> String
        {
            "keyed".to_string()
        }

        fn children(&self) -> Option<Children<'_>>
        {
            let pairs = [(1, 2), (4, 5)].into_iter().flat_map(|(a, b)| {
                let key = Counted { values: vec![a, b] };
                [
                    ("key".to_string(), Child::Node(Box::new(key))),
                    ("value".to_string(), Child::text(format!("v{a}"))),
                ]
            });
            Some(Box::new(pairs))
        }

        fn display_hint(&self) -> DisplayHint
        {
            DisplayHint::Map
        }
    }

    struct Counted
    {
        values: Vec<i32>,
    }

    impl Decoder for Counted
    {
        fn summary(&self) -> String
        {
            "{Point}".to_string()
        }

        fn children(&self) -> Option<Children<'_>>
        {
            let names = ["x", "y"];
            Some(Box::new(
                names.into_iter().zip(self.values.clone()).map(|(name, v)| (name.to_string(), Child::text(v.to_string()))),
            ))
        }
    }

    #[test]
    fn test_map_display_shows_struct_key_members()
    {
        let registry = Registry::empty();
        let node = Renderer::new(&registry, RenderLimits::default()).render_decoder(&Keyed, 0);
        assert_eq!(node.to_string(), "keyed\n  {Point} {x = 1, y = 2} => v1\n  {Point} {x = 4, y = 5} => v4\n");
    }

    #[test]
    fn test_inline_marks_cut_children()
    {
        let registry = Registry::empty();
        let limits = RenderLimits {
            max_depth: 0,
            max_children: 8,
        };
        let node = Renderer::new(&registry, limits).render_decoder(&Counted { values: vec![1, 2] }, 0);
        assert_eq!(node.inline(), "{Point} {...}");
    }

    #[test]
    fn test_map_display_pairs_keys_with_values()
    {
        let registry = Registry::empty();
        let limits = RenderLimits {
            max_depth: 1,
            max_children: 2,
        };
        let node = Renderer::new(&registry, limits).render_decoder(&Endless { hint: DisplayHint::Map }, 0);
        assert_eq!(node.to_string(), "endless\n  0 => endless\n    ...\n  ...\n");
    }
}
