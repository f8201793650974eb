//! # Types
//!
//! Plain data types shared by the handle interface and the decoders.

pub mod address;
pub mod scalar;
pub mod signature;

// Re-export all public types
pub use address::Address;
pub use scalar::{Scalar, ScalarKind};
pub use signature::TypeSignature;
