//! Scalar values and the primitive kinds they are decoded from.

use std::fmt;

use crate::error::{InspectError, InspectResult};

/// Primitive machine type of a scalar field
///
/// All multi-byte kinds are read little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind
{
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl ScalarKind
{
    /// Size in bytes
    pub const fn size(self) -> usize
    {
        match self {
            ScalarKind::Bool | ScalarKind::Char | ScalarKind::I8 | ScalarKind::U8 => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
        }
    }

    /// Decode a value of this kind from exactly `self.size()` bytes.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if `bytes` has the wrong length.
    pub fn decode(self, bytes: &[u8]) -> InspectResult<Scalar>
    {
        if bytes.len() != self.size() {
            return Err(InspectError::InvalidArgument(format!(
                "{self:?} needs {} bytes, got {}",
                self.size(),
                bytes.len()
            )));
        }

        let mut wide = [0u8; 8];
        wide[..bytes.len()].copy_from_slice(bytes);
        let raw = u64::from_le_bytes(wide);

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let scalar = match self {
            ScalarKind::Bool => Scalar::Bool(raw != 0),
            ScalarKind::Char => Scalar::Char(raw as u8),
            ScalarKind::I8 => Scalar::Signed(i64::from(raw as u8 as i8)),
            ScalarKind::I16 => Scalar::Signed(i64::from(raw as u16 as i16)),
            ScalarKind::I32 => Scalar::Signed(i64::from(raw as u32 as i32)),
            ScalarKind::I64 => Scalar::Signed(raw as i64),
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::U64 => Scalar::Unsigned(raw),
            ScalarKind::F32 => Scalar::Float(f64::from(f32::from_bits(raw as u32))),
            ScalarKind::F64 => Scalar::Float(f64::from_bits(raw)),
        };
        Ok(scalar)
    }

    /// Encode `value` as this kind, converting numerically where needed.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode(self, value: Scalar) -> Vec<u8>
    {
        let bits: u64 = match (self, value) {
            (ScalarKind::F32, v) => u64::from((v.as_f64() as f32).to_bits()),
            (ScalarKind::F64, v) => v.as_f64().to_bits(),
            (_, Scalar::Signed(v)) => v as u64,
            (_, Scalar::Unsigned(v)) => v,
            (_, Scalar::Bool(b)) => u64::from(b),
            (_, Scalar::Char(c)) => u64::from(c),
            (_, Scalar::Float(v)) => v as i64 as u64,
        };
        bits.to_le_bytes()[..self.size()].to_vec()
    }
}

/// A primitive value read out of the inspected memory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar
{
    Bool(bool),
    Char(u8),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Scalar
{
    /// Numeric value as `f64` (booleans are 0/1)
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64
    {
        match self {
            Scalar::Bool(b) => f64::from(u8::from(b)),
            Scalar::Char(c) => f64::from(c),
            Scalar::Signed(v) => v as f64,
            Scalar::Unsigned(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }

    /// Interpret as an element count or stride.
    ///
    /// Size fields are sometimes `int`, sometimes `size_t`; both are accepted
    /// as long as the value is a non-negative integer.
    ///
    /// ## Errors
    ///
    /// `InvalidCount` for negative, fractional, or non-numeric values.
    pub fn to_count(self) -> InspectResult<u64>
    {
        match self {
            Scalar::Unsigned(v) => Ok(v),
            Scalar::Signed(v) => u64::try_from(v).map_err(|_| InspectError::InvalidCount(v.to_string())),
            other => Err(InspectError::InvalidCount(other.to_string())),
        }
    }
}

impl fmt::Display for Scalar
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Char(c) if c.is_ascii_graphic() || *c == b' ' => write!(f, "{c} '{}'", char::from(*c)),
            Scalar::Char(c) => write!(f, "{c}"),
            Scalar::Signed(v) => write!(f, "{v}"),
            Scalar::Unsigned(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_decode_little_endian()
    {
        assert_eq!(ScalarKind::F64.decode(&7.5f64.to_le_bytes()).unwrap(), Scalar::Float(7.5));
        assert_eq!(ScalarKind::I32.decode(&(-3i32).to_le_bytes()).unwrap(), Scalar::Signed(-3));
        assert_eq!(ScalarKind::U16.decode(&[0x34, 0x12]).unwrap(), Scalar::Unsigned(0x1234));
        assert_eq!(ScalarKind::F32.decode(&0.5f32.to_le_bytes()).unwrap(), Scalar::Float(0.5));
        assert!(ScalarKind::U64.decode(&[0; 4]).is_err());
    }

    #[test]
    fn test_float_display_drops_trailing_zero()
    {
        assert_eq!(Scalar::Float(7.0).to_string(), "7");
        assert_eq!(Scalar::Float(0.25).to_string(), "0.25");
    }

    #[test]
    fn test_to_count()
    {
        assert_eq!(Scalar::Unsigned(4).to_count().unwrap(), 4);
        assert_eq!(Scalar::Signed(4).to_count().unwrap(), 4);
        assert!(Scalar::Signed(-1).to_count().is_err());
        assert!(Scalar::Float(2.0).to_count().is_err());
    }
}
