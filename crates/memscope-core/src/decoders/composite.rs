//! # Keyed Voxel Containers
//!
//! Image buffers keep their voxels in a `std::map<Coord, Voxel>` member.
//! Which `Voxel` type depends on the buffer type, and the tree nodes have to
//! be viewed through exactly that type, so a container decoder is an
//! [`ordered_map`](crate::decoders::ordered_map) walk plus two naming rules:
//!
//! - [`ValueTypeRule`]: how to derive the voxel type from the buffer type
//! - [`DisplayName`]: how to title the buffer
//!
//! Keys and voxels are handed back as raw values, so each is shown through
//! its own registration (or opaquely when there is none).

use tracing::debug;

use crate::decoder::{Child, Children, Decoder, DisplayHint};
use crate::decoders::ordered_map::{node_type, pair_children, TreeLayout, TreeWalk};
use crate::error::InspectResult;
use crate::types::signature::enclosing_scope;
use crate::types::TypeSignature;
use crate::value::Handle;

/// Placeholder substituted with the container's first template argument.
pub const ARGUMENT: &str = "{}";

fn substitute(template: &str, handle: &Handle) -> InspectResult<String>
{
    if template.contains(ARGUMENT) {
        let argument = handle.template_argument(0)?;
        Ok(template.replace(ARGUMENT, argument.trim()))
    } else {
        Ok(template.to_string())
    }
}

/// How the mapped type of a container is derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeRule
{
    /// Always this type
    Fixed(String),
    /// The container's first template argument itself (`Buffer_tpl<V>`)
    Argument,
    /// A template with [`ARGUMENT`] replaced by the first template argument
    /// (`Container::Buffer<T>` holds `Container::Voxel<T>`)
    Substitute(String),
    /// The container name with its last path segment replaced
    /// (`Expected::Gaussian::Buffer` holds `Expected::Gaussian::Voxel`)
    Sibling(String),
}

impl ValueTypeRule
{
    /// Mapped type name for the container `handle` of type `signature`.
    ///
    /// ## Errors
    ///
    /// `MissingTemplateArgument` if the rule needs one the type lacks.
    pub fn resolve(&self, handle: &Handle, signature: &TypeSignature) -> InspectResult<String>
    {
        match self {
            ValueTypeRule::Fixed(name) => Ok(name.clone()),
            ValueTypeRule::Argument => handle.template_argument(0).map(|arg| arg.trim().to_string()),
            ValueTypeRule::Substitute(template) => substitute(template, handle),
            ValueTypeRule::Sibling(last) => Ok(match enclosing_scope(signature.as_str()) {
                Some(scope) => format!("{scope}::{last}"),
                None => last.clone(),
            }),
        }
    }
}

/// How a container titles itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayName
{
    /// The normalized type name
    Signature,
    /// A template, with [`ARGUMENT`] replaced by the first template argument
    Template(String),
}

/// Static description of one container family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerShape
{
    /// Member holding the `std::map`
    pub tree_field: String,
    /// Key type of the map
    pub key_type: String,
    pub value_type: ValueTypeRule,
    pub display: DisplayName,
    pub layout: TreeLayout,
}

/// Decoder for a map-backed voxel container
#[derive(Debug, Clone)]
pub struct KeyedContainer
{
    title: String,
    tree: Handle,
    node_pointer_type: String,
    layout: TreeLayout,
}

impl KeyedContainer
{
    /// Resolve names and locate the tree member of `handle`.
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` if the tree member is missing, or whatever the naming
    /// rules report.
    pub fn new(handle: &Handle, shape: &ContainerShape) -> InspectResult<Self>
    {
        let signature = TypeSignature::of(&**handle)?;
        let value_type = shape.value_type.resolve(handle, &signature)?;
        let title = match &shape.display {
            DisplayName::Signature => signature.to_string(),
            DisplayName::Template(template) => substitute(template, handle)?,
        };
        let node_pointer_type = format!("{} *", node_type(&shape.key_type, &value_type));
        debug!(%signature, %value_type, "keyed container");

        Ok(Self {
            title,
            tree: handle.field(&shape.tree_field)?,
            node_pointer_type,
            layout: shape.layout,
        })
    }

    /// Pointer type the tree nodes are viewed through.
    pub fn node_pointer_type(&self) -> &str
    {
        &self.node_pointer_type
    }
}

impl Decoder for KeyedContainer
{
    fn summary(&self) -> String
    {
        self.title.clone()
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
