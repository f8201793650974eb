//! # Strided Views
//!
//! Flat element storage read through pointer arithmetic.
//!
//! - [`StridedArray`]: `n` elements, element `i` at `data + i * stride`
//! - [`StridedMatrix`]: `rows x cols` elements, element `(r, c)` at
//!   `data + r * row_stride + c`; `row_stride` may exceed `cols` when the
//!   matrix is a view into a wider buffer, and the padding is never read
//! - [`PointerRange`]: the elements between a `[start, finish)` pointer pair
//!
//! Strides and offsets are in elements, not bytes. Counts are read once, when
//! the decoder is built, so every child sequence is finite.

use tracing::trace;

use crate::decoder::{Child, Children, Decoder, DisplayHint};
use crate::decoders::child_or_diagnostic;
use crate::error::{InspectError, InspectResult};
use crate::value::Handle;

/// Elements an inline summary prints before eliding the rest.
pub const INLINE_SUMMARY_LIMIT: u64 = 16;

/// Member names a vector-like object stores its layout in
///
/// `prefix` is followed first; a momentum proposal keeps its vector in
/// `momen`, so its layout is `VectorLayout::STANDARD.nested(&["momen"])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorLayout
{
    pub prefix: &'static [&'static str],
    pub size: &'static str,
    pub stride: &'static str,
    pub data: &'static str,
}

impl VectorLayout
{
    /// `{size, stride, data}`
    pub const STANDARD: Self = Self {
        prefix: &[],
        size: "size",
        stride: "stride",
        data: "data",
    };

    /// The same members, found below `prefix`.
    #[must_use]
    pub const fn nested(self, prefix: &'static [&'static str]) -> Self
    {
        Self { prefix, ..self }
    }
}

/// Member names a matrix-like object stores its layout in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout
{
    pub prefix: &'static [&'static str],
    pub rows: &'static str,
    pub cols: &'static str,
    pub row_stride: &'static str,
    pub data: &'static str,
}

impl MatrixLayout
{
    /// `{size1, size2, tda, data}`
    pub const STANDARD: Self = Self {
        prefix: &[],
        rows: "size1",
        cols: "size2",
        row_stride: "tda",
        data: "data",
    };
}

fn member(handle: &Handle, prefix: &[&str], name: &str) -> InspectResult<Handle>
{
    let mut path = prefix.to_vec();
    path.push(name);
    handle.field_path(&path)
}

fn signed(value: u64, what: &str) -> InspectResult<i64>
{
    i64::try_from(value).map_err(|_| InspectError::InvalidCount(format!("{what} {value}")))
}

/// Element `index` of the flat storage starting at `data`.
///
/// ## Errors
///
/// `InvalidCount` if the element offset overflows, otherwise whatever the
/// pointer arithmetic or dereference reports.
pub fn element_at(data: &Handle, index: u64, stride: u64) -> InspectResult<Handle>
{
    let offset = index
        .checked_mul(stride)
        .ok_or_else(|| InspectError::InvalidCount(format!("element {index} with stride {stride}")))?;
    data.offset(signed(offset, "element offset")?)?.dereference()
}

/// `"[a, b, c]"` for `count` stride-spaced scalars starting at element `first`.
///
/// ## Errors
///
/// The first element that cannot be read.
pub fn inline_values(data: &Handle, first: u64, count: u64, stride: u64) -> InspectResult<String>
{
    let shown = count.min(INLINE_SUMMARY_LIMIT);
    let mut parts = Vec::with_capacity(shown as usize + 1);
    for i in 0..shown {
        let index = first
            .checked_add(i)
            .ok_or_else(|| InspectError::InvalidCount(format!("element {first} + {i}")))?;
        parts.push(element_at(data, index, stride)?.scalar()?.to_string());
    }
    if count > shown {
        parts.push("...".to_string());
    }
    Ok(format!("[{}]", parts.join(", ")))
}

/// Inline [`StridedArray`] of `len` elements starting at element `first`.
///
/// ## Errors
///
/// `InvalidCount` if the start offset overflows.
pub fn window(data: &Handle, first: u64, len: u64, stride: u64) -> InspectResult<StridedArray>
{
    let offset = first
        .checked_mul(stride)
        .ok_or_else(|| InspectError::InvalidCount(format!("element {first} with stride {stride}")))?;
    let start = data.offset(signed(offset, "element offset")?)?;
    Ok(StridedArray::new("", start, len, stride).inline())
}

/// How a [`StridedArray`] summarizes itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle
{
    /// `"<title>: size <n>"`
    Sized,
    /// The values themselves, `"[x, y, z]"`
    Inline,
}

/// One-dimensional strided view
#[derive(Debug, Clone)]
pub struct StridedArray
{
    title: String,
    data: Handle,
    len: u64,
    stride: u64,
    style: SummaryStyle,
}

impl StridedArray
{
    /// `len` elements starting at the pointer `data`, `stride` elements apart.
    pub fn new(title: impl Into<String>, data: Handle, len: u64, stride: u64) -> Self
    {
        Self {
            title: title.into(),
            data,
            len,
            stride,
            style: SummaryStyle::Sized,
        }
    }

    /// Read size, stride and data pointer from `handle`'s members.
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` if a layout member is missing, `InvalidCount` if size
    /// or stride is negative.
    pub fn from_layout(title: impl Into<String>, handle: &Handle, layout: &VectorLayout) -> InspectResult<Self>
    {
        let len = member(handle, layout.prefix, layout.size)?.count()?;
        let stride = member(handle, layout.prefix, layout.stride)?.count()?;
        let data = member(handle, layout.prefix, layout.data)?;
        Ok(Self::new(title, data, len, stride))
    }

    /// Summarize with the values instead of the size.
    #[must_use]
    pub fn inline(mut self) -> Self
    {
        self.style = SummaryStyle::Inline;
        self
    }

    pub fn len(&self) -> u64
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    /// Element `index`, or an error for an unreadable one.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` past the end, otherwise as [`element_at`].
    pub fn element(&self, index: u64) -> InspectResult<Handle>
    {
        if index >= self.len {
            return Err(InspectError::InvalidArgument(format!(
                "index {index} out of range for {} elements",
                self.len
            )));
        }
        element_at(&self.data, index, self.stride)
    }
}

impl Decoder for StridedArray
{
    fn summary(&self) -> String
    {
        match self.style {
            SummaryStyle::Sized => format!("{}: size {}", self.title, self.len),
            SummaryStyle::Inline => inline_values(&self.data, 0, self.len, self.stride)
                .unwrap_or_else(|err| format!("<error: {err}>")),
        }
    }

    fn children(&self) -> Option<Children<'_>>
    {
        trace!(title = %self.title, len = self.len, stride = self.stride, "strided array children");
        Some(Box::new(
            (0..self.len).map(move |i| (i.to_string(), child_or_diagnostic(self.element(i)))),
        ))
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Array
    }
}

/// Row-major two-dimensional strided view
#[derive(Debug, Clone)]
pub struct StridedMatrix
{
    title: String,
    data: Handle,
    rows: u64,
    cols: u64,
    row_stride: u64,
}

impl StridedMatrix
{
    /// `rows x cols` elements, each row starting `row_stride` elements after
    /// the previous one.
    ///
    /// ## Errors
    ///
    /// `InvalidCount` if `row_stride < cols` (rows would overlap).
    pub fn new(title: impl Into<String>, data: Handle, rows: u64, cols: u64, row_stride: u64) -> InspectResult<Self>
    {
        if row_stride < cols {
            return Err(InspectError::InvalidCount(format!(
                "row stride {row_stride} is smaller than column count {cols}"
            )));
        }
        Ok(Self {
            title: title.into(),
            data,
            rows,
            cols,
            row_stride,
        })
    }

    /// Read the dimensions, row stride and data pointer from `handle`'s members.
    ///
    /// ## Errors
    ///
    /// As [`StridedMatrix::new`], plus `FieldNotFound` for a missing member.
    pub fn from_layout(title: impl Into<String>, handle: &Handle, layout: &MatrixLayout) -> InspectResult<Self>
    {
        let rows = member(handle, layout.prefix, layout.rows)?.count()?;
        let cols = member(handle, layout.prefix, layout.cols)?.count()?;
        let row_stride = member(handle, layout.prefix, layout.row_stride)?.count()?;
        let data = member(handle, layout.prefix, layout.data)?;
        Self::new(title, data, rows, cols, row_stride)
    }

    /// Element at (`row`, `col`).
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` outside the matrix, otherwise as [`element_at`].
    pub fn element(&self, row: u64, col: u64) -> InspectResult<Handle>
    {
        if row >= self.rows || col >= self.cols {
            return Err(InspectError::InvalidArgument(format!(
                "({row},{col}) outside a {}x{} matrix",
                self.rows, self.cols
            )));
        }
        let index = row
            .checked_mul(self.row_stride)
            .and_then(|start| start.checked_add(col))
            .ok_or_else(|| InspectError::InvalidCount(format!("row {row} with stride {}", self.row_stride)))?;
        element_at(&self.data, index, 1)
    }
}

impl Decoder for StridedMatrix
{
    fn summary(&self) -> String
    {
        format!("{}: rows {}, cols {}", self.title, self.rows, self.cols)
    }

    fn children(&self) -> Option<Children<'_>>
    {
        let cols = self.cols;
        let cells = (0..self.rows).flat_map(move |row| (0..cols).map(move |col| (row, col)));
        Some(Box::new(cells.map(move |(row, col)| {
            (format!("({row},{col})"), child_or_diagnostic(self.element(row, col)))
        })))
    }

    fn display_hint(&self) -> DisplayHint
    {
        DisplayHint::Grid
    }
}

/// Elements between a `[start, finish)` pointer pair
///
/// The element count is fixed at construction from the address difference, so
/// a `finish` before `start` is empty and a misaligned one is rounded down.
#[derive(Debug, Clone)]
pub struct PointerRange
{
    title: String,
    start: Handle,
    len: u64,
    hint: DisplayHint,
}

impl PointerRange
{
    /// Elements from `start` up to (excluding) `finish`.
    ///
    /// ## Errors
    ///
    /// `NotAPointer` if either handle is not a pointer.
    pub fn new(title: impl Into<String>, start: Handle, finish: &Handle) -> InspectResult<Self>
    {
        let first = start.pointer_value()?;
        let end = finish.pointer_value()?;
        let len = match first.distance_to(end) {
            Some(0) | None => 0,
            Some(bytes) => {
                let element_size = first.distance_to(start.offset(1)?.pointer_value()?).unwrap_or(0);
                if element_size == 0 { 0 } else { bytes / element_size }
            }
        };

        Ok(Self {
            title: title.into(),
            start,
            len,
            hint: DisplayHint::Array,
        })
    }

    /// The elements of the `std::vector` at `path` below `handle`.
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` if the vector or its `_M_impl` members are missing.
    pub fn from_vector(title: impl Into<String>, handle: &Handle, path: &[&str]) -> InspectResult<Self>
    {
        let vector = handle.field_path(path)?;
        let start = vector.field_path(&["_M_impl", "_M_start"])?;
        let finish = vector.field_path(&["_M_impl", "_M_finish"])?;
        Self::new(title, start, &finish)
    }

    /// Override the default array hint.
    #[must_use]
    pub fn with_hint(mut self, hint: DisplayHint) -> Self
    {
        self.hint = hint;
        self
    }

    pub fn len(&self) -> u64
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }
}

impl Decoder for PointerRange
{
    fn summary(&self) -> String
    {
        self.title.clone()
    }

    fn children(&self) -> Option<Children<'_>>
    {
        Some(Box::new((0..self.len).map(move |i| {
            let child: Child = child_or_diagnostic(element_at(&self.start, i, 1));
            (format!("[{i}]"), child)
        })))
    }

    fn display_hint(&self) -> DisplayHint
    {
        self.hint
    }
}
