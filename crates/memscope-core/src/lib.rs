//! # memscope-core
//!
//! Structured views of raw process memory for debugger front-ends.
//!
//! A host hands the engine a [`ValueHandle`] (a typed location in the
//! inspected process). The engine normalizes the handle's type name, finds
//! the first registered decoder whose pattern matches it, and returns a
//! [`Decoder`]: a one-line summary plus a lazy, labelled sequence of
//! children. Children are either raw values, dispatched through the registry
//! again, or nested decoders.
//!
//! This crate provides:
//! - The handle trait and type-name normalization
//! - Generic decoders: strided arrays and matrices, red-black tree maps,
//!   tagged variants, field sequences
//! - A catalogue registering those decoders for the tractography project's
//!   types, under configurable namespaces
//! - A byte-image [`Snapshot`](snapshot::Snapshot) backend, used by tests and
//!   the CLI in place of a live debugger
//! - A bounded [`Renderer`] for materializing decoded trees
//!
//! ## Reads only
//!
//! Nothing here writes to the inspected process or calls functions in it.
//! Corrupt memory produces diagnostics, never a crash or an endless walk.

pub mod catalogue;
pub mod config;
pub mod decoder;
pub mod decoders;
pub mod error;
pub mod registry;
pub mod render;
pub mod snapshot;
pub mod types;
pub mod value;

pub use catalogue::standard_registry;
pub use config::{EngineConfig, Namespace};
pub use decoder::{Child, Decoder, DisplayHint};
// Re-export commonly used types
pub use error::{InspectError, InspectResult};
pub use registry::{Registry, RegistryBuilder};
pub use render::{RenderLimits, RenderedNode, Renderer};
pub use types::{Address, Scalar, ScalarKind, TypeSignature};
pub use value::{Handle, ValueHandle};
