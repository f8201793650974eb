//! # Memory Snapshots
//!
//! A captured, read-only byte image of a process plus the machinery to view
//! it through typed handles.
//!
//! ## Layout
//!
//! - [`Snapshot`]: sorted, non-overlapping memory regions; every read is
//!   bounds-checked and an address outside all regions is an
//!   [`UnmappedAddress`](crate::error::InspectError::UnmappedAddress) error
//! - [`SnapshotBuilder`]: lays out regions and writes values while a test or
//!   demo fixture is constructed
//! - [`TypeCatalog`]: the type shapes (debug information stand-in)
//! - [`SnapshotValue`]: the [`ValueHandle`](crate::value::ValueHandle)
//!   implementation over both
//! - [`stl`]: libstdc++ container layouts (`std::map`, `std::vector`)
//!
//! Allocations are spaced apart, so reading past the end of one object never
//! silently lands in the next.

pub mod catalog;
pub mod stl;
pub mod value;

use std::fmt;

use tracing::trace;

pub use catalog::{FieldDef, TypeCatalog, TypeDef, TypeKind, POINTER_SIZE};
pub use value::SnapshotValue;

use crate::config::DEFAULT_MAX_STRING_LEN;
use crate::error::{InspectError, InspectResult};
use crate::types::{Address, Scalar, ScalarKind};

/// First address handed out by [`SnapshotBuilder::alloc`].
pub const HEAP_BASE: u64 = 0x0010_0000;

/// Alignment of every allocation.
pub const ALLOC_ALIGN: u64 = 16;

/// Unmapped bytes left between consecutive allocations.
pub const ALLOC_GAP: u64 = 0x100;

/// One contiguous mapped range
#[derive(Clone, PartialEq, Eq)]
pub struct Region
{
    /// Start address
    pub base: Address,
    /// Contents
    pub bytes: Vec<u8>,
    /// Label used in logs (`heap#3`, `"strand data"`)
    pub name: String,
}

impl Region
{
    /// One past the last mapped byte.
    pub fn end(&self) -> Address
    {
        self.base + self.bytes.len() as u64
    }

    /// Whether `[address, address + len)` lies inside this region.
    pub fn contains(&self, address: Address, len: usize) -> bool
    {
        address >= self.base
            && address
                .checked_add(len as u64)
                .is_some_and(|end| end <= self.end())
    }
}

impl fmt::Debug for Region
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("base", &format_args!("{}", self.base))
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Captured memory image
#[derive(Debug, Clone)]
pub struct Snapshot
{
    regions: Vec<Region>,
    max_string_len: usize,
}

impl Snapshot
{
    /// Mapped regions in address order.
    pub fn regions(&self) -> &[Region]
    {
        &self.regions
    }

    /// Longest C string [`Snapshot::read_cstring`] will scan.
    pub fn max_string_len(&self) -> usize
    {
        self.max_string_len
    }

    fn region_for(&self, address: Address) -> Option<&Region>
    {
        let index = self.regions.partition_point(|region| region.base <= address);
        index.checked_sub(1).map(|i| &self.regions[i])
    }

    /// Borrow `len` bytes at `address`.
    ///
    /// ## Errors
    ///
    /// `UnmappedAddress` unless the whole range lies inside one region.
    pub fn read(&self, address: Address, len: usize) -> InspectResult<&[u8]>
    {
        let region = self
            .region_for(address)
            .filter(|region| region.contains(address, len))
            .ok_or(InspectError::UnmappedAddress { address, len })?;

        let start = (address.value() - region.base.value()) as usize;
        Ok(&region.bytes[start..start + len])
    }

    /// Read a little-endian `u64`.
    ///
    /// ## Errors
    ///
    /// `UnmappedAddress` if the eight bytes are not mapped.
    pub fn read_u64(&self, address: Address) -> InspectResult<u64>
    {
        let bytes = self.read(address, 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Read a pointer-sized value as an address.
    ///
    /// ## Errors
    ///
    /// `UnmappedAddress` if the pointer itself is not mapped.
    pub fn read_pointer(&self, address: Address) -> InspectResult<Address>
    {
        self.read_u64(address).map(Address::new)
    }

    /// Read a primitive value.
    ///
    /// ## Errors
    ///
    /// `UnmappedAddress` if the bytes are not mapped.
    pub fn read_scalar(&self, address: Address, kind: ScalarKind) -> InspectResult<Scalar>
    {
        kind.decode(self.read(address, kind.size())?)
    }

    /// Read a NUL-terminated string, at most [`Snapshot::max_string_len`]
    /// bytes. A string running into the end of its region, or past the
    /// limit, is cut off there.
    ///
    /// ## Errors
    ///
    /// `UnmappedAddress` if `address` itself is not mapped.
    pub fn read_cstring(&self, address: Address) -> InspectResult<String>
    {
        let region = self
            .region_for(address)
            .filter(|region| region.contains(address, 1))
            .ok_or(InspectError::UnmappedAddress { address, len: 1 })?;

        let start = (address.value() - region.base.value()) as usize;
        let tail = &region.bytes[start..];
        let limit = tail.len().min(self.max_string_len);
        let len = tail[..limit].iter().position(|&b| b == 0).unwrap_or(limit);
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }
}

/// Incremental construction of a [`Snapshot`]
///
/// ## Example
///
/// ```rust
/// use memscope_core::snapshot::SnapshotBuilder;
///
/// let mut builder = SnapshotBuilder::new();
/// let data = builder.alloc_f64s("samples", &[7.0, 8.0, 9.0]);
/// let snapshot = builder.build();
/// assert_eq!(snapshot.read(data, 24)?.len(), 24);
/// assert!(snapshot.read(data + 24, 8).is_err());
/// # Ok::<(), memscope_core::error::InspectError>(())
/// ```
#[derive(Debug)]
pub struct SnapshotBuilder
{
    regions: Vec<Region>,
    next: u64,
    max_string_len: usize,
}

impl Default for SnapshotBuilder
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl SnapshotBuilder
{
    /// Empty image; allocations start at [`HEAP_BASE`].
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            regions: Vec::new(),
            next: HEAP_BASE,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }

    /// Cap C string reads on the finished snapshot.
    #[must_use]
    pub fn with_string_limit(mut self, max_string_len: usize) -> Self
    {
        self.max_string_len = max_string_len;
        self
    }

    /// Map `size` zeroed bytes and return their address.
    pub fn alloc(&mut self, name: &str, size: u64) -> Address
    {
        let base = Address::new(self.next);
        self.next = (self.next + size.max(1) + ALLOC_GAP).next_multiple_of(ALLOC_ALIGN);
        trace!(name, %base, size, "snapshot region mapped");
        self.regions.push(Region {
            base,
            bytes: vec![0; size as usize],
            name: name.to_string(),
        });
        base
    }

    /// Map `values` as consecutive `double`s.
    pub fn alloc_f64s(&mut self, name: &str, values: &[f64]) -> Address
    {
        let base = self.alloc(name, values.len() as u64 * 8);
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let region = self.regions.last_mut().map(|region| &mut region.bytes);
        if let Some(region) = region {
            region.copy_from_slice(&bytes);
        }
        base
    }

    /// Map `text` followed by a NUL byte.
    pub fn alloc_cstring(&mut self, text: &str) -> Address
    {
        let base = self.alloc("string", text.len() as u64 + 1);
        if let Some(region) = self.regions.last_mut() {
            region.bytes[..text.len()].copy_from_slice(text.as_bytes());
        }
        base
    }

    /// Overwrite mapped bytes.
    ///
    /// ## Errors
    ///
    /// `UnmappedAddress` if the range does not lie inside one allocation.
    pub fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> InspectResult<()>
    {
        let region = self
            .regions
            .iter_mut()
            .find(|region| region.contains(address, bytes.len()))
            .ok_or(InspectError::UnmappedAddress {
                address,
                len: bytes.len(),
            })?;

        let start = (address.value() - region.base.value()) as usize;
        region.bytes[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Write a primitive value as `kind`.
    ///
    /// ## Errors
    ///
    /// As [`SnapshotBuilder::write_bytes`].
    pub fn write_scalar(&mut self, address: Address, kind: ScalarKind, value: Scalar) -> InspectResult<()>
    {
        self.write_bytes(address, &kind.encode(value))
    }

    /// Write a `u64`.
    ///
    /// ## Errors
    ///
    /// As [`SnapshotBuilder::write_bytes`].
    pub fn write_u64(&mut self, address: Address, value: u64) -> InspectResult<()>
    {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Write a `double`.
    ///
    /// ## Errors
    ///
    /// As [`SnapshotBuilder::write_bytes`].
    pub fn write_f64(&mut self, address: Address, value: f64) -> InspectResult<()>
    {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Write a pointer.
    ///
    /// ## Errors
    ///
    /// As [`SnapshotBuilder::write_bytes`].
    pub fn write_pointer(&mut self, address: Address, target: Address) -> InspectResult<()>
    {
        self.write_u64(address, target.value())
    }

    /// Write a scalar (or enum) member, addressed by a dotted field path.
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` for a bad path, `NotAScalar` if the member is an
    /// aggregate, `UnmappedAddress` if `base` was never allocated.
    pub fn set_field(
        &mut self,
        catalog: &TypeCatalog,
        type_name: &str,
        base: Address,
        path: &str,
        value: Scalar,
    ) -> InspectResult<()>
    {
        let (offset, field_type) = catalog.offset_of(type_name, path)?;
        let kind = match catalog.concrete(&field_type)?.kind {
            TypeKind::Scalar(kind) | TypeKind::Enum { underlying: kind, .. } => kind,
            TypeKind::Pointer(_) => ScalarKind::U64,
            _ => return Err(InspectError::NotAScalar(field_type)),
        };
        self.write_scalar(base + offset, kind, value)
    }

    /// Write a pointer member, addressed by a dotted field path.
    ///
    /// ## Errors
    ///
    /// `FieldNotFound` for a bad path, `NotAPointer` if the member is not a
    /// pointer, `UnmappedAddress` if `base` was never allocated.
    pub fn set_pointer(
        &mut self,
        catalog: &TypeCatalog,
        type_name: &str,
        base: Address,
        path: &str,
        target: Address,
    ) -> InspectResult<()>
    {
        let (offset, field_type) = catalog.offset_of(type_name, path)?;
        if !matches!(catalog.concrete(&field_type)?.kind, TypeKind::Pointer(_)) {
            return Err(InspectError::NotAPointer(field_type));
        }
        self.write_pointer(base + offset, target)
    }

    /// Freeze into a read-only snapshot.
    #[must_use]
    pub fn build(mut self) -> Snapshot
    {
        self.regions.sort_by_key(|region| region.base);
        Snapshot {
            regions: self.regions,
            max_string_len: self.max_string_len,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_allocations_leave_unmapped_gaps()
    {
        let mut builder = SnapshotBuilder::new();
        let a = builder.alloc("a", 8);
        let b = builder.alloc("b", 8);
        assert!(b.value() >= a.value() + 8 + ALLOC_GAP);
        assert_eq!(b.value() % ALLOC_ALIGN, 0);

        let snapshot = builder.build();
        assert!(snapshot.read(a, 8).is_ok());
        assert!(snapshot.read(a + 8, 1).is_err());
        assert!(snapshot.read(a + 4, 8).is_err());
        assert!(snapshot.read(Address::NULL, 8).is_err());
    }

    #[test]
    fn test_read_cstring_respects_limit()
    {
        let mut builder = SnapshotBuilder::new().with_string_limit(4);
        let text = builder.alloc_cstring("gaussian");
        let snapshot = builder.build();
        assert_eq!(snapshot.read_cstring(text).unwrap(), "gaus");
    }

    #[test]
    fn test_write_and_read_back()
    {
        let mut builder = SnapshotBuilder::new();
        let slot = builder.alloc("slot", 16);
        builder.write_u64(slot, 0xdead_beef).unwrap();
        builder.write_f64(slot + 8, 2.5).unwrap();
        assert!(builder.write_u64(slot + 12, 0).is_err());

        let snapshot = builder.build();
        assert_eq!(snapshot.read_u64(slot).unwrap(), 0xdead_beef);
        assert_eq!(snapshot.read_scalar(slot + 8, ScalarKind::F64).unwrap(), Scalar::Float(2.5));
    }
}
