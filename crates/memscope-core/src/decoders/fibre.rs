//! # Fibre Decoders
//!
//! Views over the fibre model's packed `double` storage. Every fibre type
//! keeps a `data` pointer and an element `stride`; the interpretation of the
//! elements differs:
//!
//! | type       | storage                                                  |
//! |------------|----------------------------------------------------------|
//! | `Coord`    | x, y, z                                                  |
//! | `Strand`   | `sze` points of x, y, z                                  |
//! | `Track`    | `sze` points of x, y, z                                  |
//! | `Tractlet` | 3 axes x `dgree` coefficients x 3 dims, then properties  |
//! | `Section`  | position (3), tangent (3), intensity (1)                 |
//!
//! Sets only report their size; their elements are produced by a member
//! function, and nothing here ever calls into the inspected program.

use crate::decoder::{Child, Children, Decoder, DisplayHint};
use crate::decoders::fields::Slot;
use crate::decoders::child_or_diagnostic;
use crate::decoders::strided::{element_at, window, StridedArray};
use crate::error::{InspectError, InspectResult};
use crate::value::Handle;

/// Dimensions of a point.
pub const DIMS: u64 = 3;

/// Axes of a tractlet.
pub const TRACTLET_AXES: u64 = 3;

/// Slots of a section.
pub const SECTION_SLOTS: &[Slot] = &[("position", 3), ("tangent", 3), ("intensity", 1)];

fn data_and_stride(handle: &Handle) -> InspectResult<(Handle, u64)>
{
    Ok((handle.field("data")?, handle.field("stride")?.count()?))
}

/// Three stride-spaced values, `"[x, y, z]"`
pub fn coord(handle: &Handle) -> InspectResult<StridedArray>
{
    let (data, stride) = data_and_stride(handle)?;
    Ok(StridedArray::new("Coord", data, DIMS, stride).inline())
}

/// Struct wrapping a fixed array `p`
#[derive(Debug, Clone)]
pub struct Triple
{
    elements: Handle,
}

impl Triple
{
    /// ## Errors
    ///
    /// `FieldNotFound` if there is no `p` member.
    pub fn new(handle: &Handle) -> InspectResult<Self>
    {
        Ok(Self {
            elements: handle.field("p")?,
        })
    }
}

impl Decoder for Triple
{
    fn summary(&self) -> String
    {
        let names = match self.elements.field_names() {
            Ok(names) => names,
            Err(err) => return format!("<error: {err}>"),
        };
        let mut parts = Vec::with_capacity(names.len());
        for name in &names {
            match self.elements.field(name).and_then(|e| e.scalar()) {
                Ok(value) => parts.push(value.to_string()),
                Err(err) => return format!("<error: {err}>"),
            }
        }
        format!("[{}]", parts.join(", "))
    }

    fn children(&self) -> Option<Children<'_>>
    {
        let names = self.elements.field_names().ok()?;
        Some(Box::new(names.into_iter().map(move |name| {
            let child = child_or_diagnostic(self.elements.field(&name));
            (name, child)
        })))
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Array
    }
}

/// Which polyline flavour a [`Polyline`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolylineKind
{
    /// Sized by polynomial degree
    Strand,
    /// Sized by point count
    Track,
}

/// Strand or track: `sze` points of three stride-spaced values
#[derive(Debug, Clone)]
pub struct Polyline
{
    kind: PolylineKind,
    data: Handle,
    stride: u64,
    size: u64,
}

impl Polyline
{
    /// ## Errors
    ///
    /// `FieldNotFound` or `InvalidCount` for a bad `data`/`stride`/`sze`.
    pub fn new(handle: &Handle, kind: PolylineKind) -> InspectResult<Self>
    {
        let (data, stride) = data_and_stride(handle)?;
        Ok(Self {
            kind,
            data,
            stride,
            size: handle.field("sze")?.count()?,
        })
    }

    fn point(&self, index: u64) -> Child
    {
        let points = index
            .checked_mul(DIMS)
            .ok_or_else(|| InspectError::InvalidCount(format!("point {index}")))
            .and_then(|first| window(&self.data, first, DIMS, self.stride));
        match points {
            Ok(array) => Child::Node(Box::new(array)),
            Err(err) => Child::diagnostic(&err),
        }
    }
}

impl Decoder for Polyline
{
    fn summary(&self) -> String
    {
        match self.kind {
            PolylineKind::Strand => format!("Fibre::Strand (degree={})", self.size),
            PolylineKind::Track => format!("Fibre::Track (size={})", self.size),
        }
    }

    fn children(&self) -> Option<Children<'_>>
    {
        Some(Box::new((0..self.size).map(move |i| (i.to_string(), self.point(i)))))
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Array
    }
}

/// Tractlet: three axis strands of `dgree` coefficients, then properties
#[derive(Debug, Clone)]
pub struct Tractlet
{
    data: Handle,
    stride: u64,
    degree: u64,
    size: u64,
}

impl Tractlet
{
    /// ## Errors
    ///
    /// `FieldNotFound` or `InvalidCount` for a bad layout member.
    pub fn new(handle: &Handle) -> InspectResult<Self>
    {
        let (data, stride) = data_and_stride(handle)?;
        Ok(Self {
            data,
            stride,
            degree: handle.field("dgree")?.count()?,
            size: handle.field("size")?.count()?,
        })
    }

    fn block_len(&self) -> u64
    {
        self.degree.saturating_mul(TRACTLET_AXES * DIMS)
    }

    /// Element index of coefficient `degree` of axis `axis`, dimension `dim`.
    fn index(&self, degree: u64, axis: u64, dim: u64) -> InspectResult<u64>
    {
        axis.checked_mul(self.degree)
            .and_then(|i| i.checked_add(degree))
            .and_then(|i| i.checked_mul(DIMS))
            .and_then(|i| i.checked_add(dim))
            .ok_or_else(|| InspectError::InvalidCount(format!("tractlet degree {}", self.degree)))
    }

    /// First property after the coefficient block, or 1 when there is none.
    ///
    /// ## Errors
    ///
    /// Whatever reading the property reports.
    pub fn alpha(&self) -> InspectResult<String>
    {
        if self.size <= self.block_len() {
            return Ok("1".to_string());
        }
        Ok(element_at(&self.data, self.block_len(), self.stride)?.scalar()?.to_string())
    }

    fn coefficients(&self, degree: u64) -> InspectResult<String>
    {
        let mut axes = Vec::with_capacity(TRACTLET_AXES as usize);
        for axis in 0..TRACTLET_AXES {
            let mut values = Vec::with_capacity(DIMS as usize);
            for dim in 0..DIMS {
                values.push(
                    element_at(&self.data, self.index(degree, axis, dim)?, self.stride)?
                        .scalar()?
                        .to_string(),
                );
            }
            axes.push(values.join(", "));
        }
        Ok(format!("[{}]", axes.join(" | ")))
    }
}

impl Decoder for Tractlet
{
    fn summary(&self) -> String
    {
        let alpha = self.alpha().unwrap_or_else(|err| format!("<error: {err}>"));
        format!("Fibre::Tractlet (degree={}, alpha={alpha})", self.degree)
    }

    fn children(&self) -> Option<Children<'_>>
    {
        Some(Box::new((0..self.degree).map(move |i| {
            let child = match self.coefficients(i) {
                Ok(text) => Child::text(text),
                Err(err) => Child::diagnostic(&err),
            };
            (i.to_string(), child)
        })))
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Array
    }
}

/// Set of fibres: size only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibreSet
{
    title: String,
    size: u64,
}

impl FibreSet
{
    /// ## Errors
    ///
    /// `FieldNotFound` or `InvalidCount` for a bad `sze`.
    pub fn new(title: impl Into<String>, handle: &Handle) -> InspectResult<Self>
    {
        Ok(Self {
            title: title.into(),
            size: handle.field("sze")?.count()?,
        })
    }
}

impl Decoder for FibreSet
{
    fn summary(&self) -> String
    {
        format!("{}: size {}", self.title, self.size)
    }
}
