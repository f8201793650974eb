//! Fixed-schema aggregates.
//!
//! [`FieldSequence`] views packed storage as a fixed list of named slots (a
//! section is position 3, tangent 3, intensity 1, all stride-spaced from one
//! data pointer). [`NamedFields`] shows a fixed subset of a struct's members
//! in a fixed order.

use crate::decoder::{Child, Children, Decoder};
use crate::decoders::child_or_diagnostic;
use crate::decoders::strided::{element_at, window};
use crate::error::InspectResult;
use crate::value::Handle;

/// Name and width (in elements) of one slot
pub type Slot = (&'static str, u64);

/// Packed slots read from a data pointer and stride
///
/// Width-one slots become the element itself, wider slots a
/// [`StridedArray`](crate::decoders::strided::StridedArray) summarized inline.
#[derive(Debug, Clone)]
pub struct FieldSequence
{
    title: String,
    data: Handle,
    stride: u64,
    slots: &'static [Slot],
}

impl FieldSequence
{
    pub fn new(title: impl Into<String>, data: Handle, stride: u64, slots: &'static [Slot]) -> Self
    {
        Self {
            title: title.into(),
            data,
            stride,
            slots,
        }
    }

    /// Read `data` and `stride` members from `handle`.
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` or `InvalidCount` for a bad layout.
    pub fn from_members(title: impl Into<String>, handle: &Handle, slots: &'static [Slot]) -> InspectResult<Self>
    {
        let stride = handle.field("stride")?.count()?;
        let data = handle.field("data")?;
        Ok(Self::new(title, data, stride, slots))
    }

    fn slot(&self, first: u64, width: u64) -> Child
    {
        if width == 1 {
            return child_or_diagnostic(element_at(&self.data, first, self.stride));
        }

        match window(&self.data, first, width, self.stride) {
            Ok(array) => Child::Node(Box::new(array)),
            Err(err) => Child::diagnostic(&err),
        }
    }
}

impl Decoder for FieldSequence
{
    fn summary(&self) -> String
    {
        self.title.clone()
    }

    fn children(&self) -> Option<Children<'_>>
    {
        let mut first = 0u64;
        Some(Box::new(self.slots.iter().map(move |&(name, width)| {
            let child = self.slot(first, width);
            first += width;
            (name.to_string(), child)
        })))
    }
}

/// Fixed, ordered subset of a struct's members
#[derive(Debug, Clone)]
pub struct NamedFields
{
    title: String,
    handle: Handle,
    names: &'static [&'static str],
}

impl NamedFields
{
    pub fn new(title: impl Into<String>, handle: Handle, names: &'static [&'static str]) -> Self
    {
        Self {
            title: title.into(),
            handle,
            names,
        }
    }
}

impl Decoder for NamedFields
{
    fn summary(&self) -> String
    {
        self.title.clone()
    }

    fn children(&self) -> Option<Children<'_>>
    {
        Some(Box::new(
            self.names
                .iter()
                .map(move |&name| (name.to_string(), child_or_diagnostic(self.handle.field(name)))),
        ))
    }
}
