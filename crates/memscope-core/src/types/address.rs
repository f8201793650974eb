//! Memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed address inside an inspected memory image
///
/// Keeps raw pointer values read out of the target apart from the counts and
/// sizes they are combined with during pointer arithmetic.
///
/// ## Example
///
/// ```rust
/// use memscope_core::types::Address;
///
/// let base = Address::from(0x1000);
/// // third f64 of an array starting at `base`
/// assert_eq!(base.offset_elements(2, 8), Some(Address::from(0x1010)));
/// assert!(Address::NULL.is_null());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null pointer value
    pub const NULL: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null pointer
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add a byte offset, returning `None` on overflow
    ///
    /// ```rust
    /// use memscope_core::types::Address;
    ///
    /// assert_eq!(Address::from(0x1000).checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(Address::from(0x1000).checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Move by `count` elements of `element_size` bytes, in either direction
    ///
    /// This is C pointer arithmetic: `p + count`. Returns `None` if the result
    /// leaves the 64-bit address space, which for a garbage pointer read out of
    /// a malformed container is entirely possible.
    pub fn offset_elements(self, count: i64, element_size: u64) -> Option<Self>
    {
        let bytes = i128::from(count).checked_mul(i128::from(element_size))?;
        let target = i128::from(self.0).checked_add(bytes)?;
        u64::try_from(target).ok().map(Address)
    }

    /// Byte distance from `self` to `end`, or `None` if `end` lies before `self`
    pub fn distance_to(self, end: Address) -> Option<u64>
    {
        end.0.checked_sub(self.0)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:#x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
