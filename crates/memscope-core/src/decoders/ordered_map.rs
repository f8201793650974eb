//! # Ordered Map Walk
//!
//! In-order traversal of a raw red-black tree, the storage behind
//! `std::map`/`std::set`, without calling any of the inspected program's
//! iterator code.
//!
//! ## Algorithm
//!
//! Start at the leftmost node (the tree header caches it) and repeat
//! `node_count` times:
//!
//! 1. Emit the current node's payload
//! 2. Find the successor: if the node has a right child, descend to the
//!    leftmost node of the right subtree; otherwise climb while the node is
//!    its parent's right child, and the successor is the first ancestor
//!    reached from a left child
//!
//! ## Malformed trees
//!
//! Memory may be captured mid-insertion or simply be garbage, so nothing
//! about the links is trusted:
//!
//! - the walk stops after `node_count` nodes whatever the links say
//! - every descent and every climb gives up after `node_count` steps, which
//!   a well-formed tree never needs
//! - a climb that runs out of ancestors (null parent) ends the walk
//! - the first link that cannot be read ends the walk with one error
//!
//! A `node_count` of zero is trusted without following any pointer.

use tracing::{trace, warn};

use crate::decoder::{Child, Children, Decoder, DisplayHint};
use crate::decoders::child_or_diagnostic;
use crate::error::{InspectError, InspectResult};
use crate::value::Handle;

/// Member names of the tree container and its nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLayout
{
    /// Path from the container to the node count
    pub count: &'static [&'static str],
    /// Path from the container to the leftmost node pointer
    pub leftmost: &'static [&'static str],
    pub left: &'static str,
    pub right: &'static str,
    pub parent: &'static str,
    /// Payload member of a node
    pub value: &'static str,
    /// Key member of the payload pair
    pub key: &'static str,
    /// Mapped member of the payload pair
    pub mapped: &'static str,
}

impl TreeLayout
{
    /// libstdc++ `std::_Rb_tree`
    pub const LIBSTDCXX: Self = Self {
        count: &["_M_t", "_M_impl", "_M_node_count"],
        leftmost: &["_M_t", "_M_impl", "_M_header", "_M_left"],
        left: "_M_left",
        right: "_M_right",
        parent: "_M_parent",
        value: "_M_value_field",
        key: "first",
        mapped: "second",
    };
}

impl Default for TreeLayout
{
    fn default() -> Self
    {
        Self::LIBSTDCXX
    }
}

/// libstdc++ node type holding `std::pair<const key, value>`.
pub fn node_type(key: &str, value: &str) -> String
{
    format!("std::_Rb_tree_node<std::pair<const {key}, {value}>>")
}

/// Iterator over the payloads of a tree, in key order
///
/// Yields one `Err` and then stops if a link cannot be followed.
#[derive(Debug)]
pub struct TreeWalk
{
    layout: TreeLayout,
    node_pointer_type: String,
    cursor: Option<Handle>,
    total: u64,
    emitted: u64,
    pending: Option<InspectError>,
}

impl TreeWalk
{
    /// Begin walking the tree container `tree`; nodes are viewed through
    /// `node_pointer_type` (e.g. `std::_Rb_tree_node<std::pair<const K, V>> *`).
    ///
    /// ## Errors
    ///
    /// Whatever reading the node count (or, if non-zero, the leftmost
    /// pointer) reports.
    pub fn new(tree: &Handle, node_pointer_type: &str, layout: TreeLayout) -> InspectResult<Self>
    {
        let total = tree.field_path(layout.count)?.count()?;
        let cursor = if total == 0 { None } else { Some(tree.field_path(layout.leftmost)?) };

        Ok(Self {
            layout,
            node_pointer_type: node_pointer_type.to_string(),
            cursor,
            total,
            emitted: 0,
            pending: None,
        })
    }

    /// The container's own count.
    pub fn node_count(&self) -> u64
    {
        self.total
    }

    fn payload(&self, link: &Handle) -> InspectResult<Handle>
    {
        link.cast(&self.node_pointer_type)?
            .dereference()?
            .field(self.layout.value)
    }

    fn link(&self, node: &Handle, name: &str) -> InspectResult<Handle>
    {
        node.dereference()?.field(name)
    }

    fn successor(&self, current: &Handle) -> InspectResult<Option<Handle>>
    {
        let right = self.link(current, self.layout.right)?;
        if !right.is_null()? {
            let mut node = right;
            for _ in 0..self.total {
                let left = self.link(&node, self.layout.left)?;
                if left.is_null()? {
                    return Ok(Some(node));
                }
                node = left;
            }
            return Err(InspectError::Malformed(format!(
                "left descent longer than {} nodes",
                self.total
            )));
        }

        let mut child = current.pointer_value()?;
        let mut parent = self.link(current, self.layout.parent)?;
        for _ in 0..self.total {
            if parent.is_null()? {
                return Ok(None);
            }
            let parent_right = self.link(&parent, self.layout.right)?;
            if parent_right.pointer_value()? != child {
                return Ok(Some(parent));
            }
            child = parent.pointer_value()?;
            parent = self.link(&parent, self.layout.parent)?;
        }
        Err(InspectError::Malformed(format!(
            "parent climb longer than {} nodes",
            self.total
        )))
    }
}

impl Iterator for TreeWalk
{
    type Item = InspectResult<Handle>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if let Some(err) = self.pending.take() {
            self.cursor = None;
            return Some(Err(err));
        }
        if self.emitted >= self.total {
            return None;
        }
        let current = self.cursor.take()?;

        let payload = match self.payload(&current) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(emitted = self.emitted, total = self.total, error = %err, "tree node unreadable");
                return Some(Err(err));
            }
        };
        self.emitted += 1;
        trace!(index = self.emitted - 1, node = ?current.pointer_value().ok(), "tree node");

        if self.emitted < self.total {
            match self.successor(&current) {
                Ok(Some(next)) => self.cursor = Some(next),
                Ok(None) => warn!(
                    emitted = self.emitted,
                    total = self.total,
                    "tree ran out of nodes before its count"
                ),
                Err(err) => {
                    warn!(emitted = self.emitted, total = self.total, error = %err, "tree walk stopped");
                    self.pending = Some(err);
                }
            }
        }

        Some(Ok(payload))
    }
}

/// Flatten a walk into alternating key and mapped children, labelled
/// `[0]`, `[1]`, ... as a map display expects.
pub fn pair_children(walk: TreeWalk, layout: TreeLayout) -> impl Iterator<Item = (String, Child)>
{
    walk.flat_map(move |payload| -> Vec<Child> {
        match payload {
            Ok(pair) => vec![
                child_or_diagnostic(pair.field(layout.key)),
                child_or_diagnostic(pair.field(layout.mapped)),
            ],
            Err(err) => vec![Child::diagnostic(&err)],
        }
    })
    .enumerate()
    .map(|(i, child)| (format!("[{i}]"), child))
}

/// Decoder for a plain ordered map (`std::map<K, V>`)
#[derive(Debug, Clone)]
pub struct OrderedMap
{
    title: String,
    tree: Handle,
    node_pointer_type: String,
    layout: TreeLayout,
}

impl OrderedMap
{
    pub fn new(title: impl Into<String>, tree: Handle, node_pointer_type: impl Into<String>, layout: TreeLayout) -> Self
    {
        Self {
            title: title.into(),
            tree,
            node_pointer_type: node_pointer_type.into(),
            layout,
        }
    }
}

impl Decoder for OrderedMap
{
    fn summary(&self) -> String
    {
        match self.tree.field_path(self.layout.count).and_then(|count| count.count()) {
            Ok(count) => format!("{} with {count} elements", self.title),
            Err(err) => format!("{} <error: {err}>", self.title),
        }
    }

    fn children(&self) -> Option<Children<'_>>
    {
        match TreeWalk::new(&self.tree, &self.node_pointer_type, self.layout) {
            Ok(walk) => Some(Box::new(pair_children(walk, self.layout))),
            Err(err) => Some(Box::new(std::iter::once(("[0]".to_string(), Child::diagnostic(&err))))),
        }
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Map
    }
}
