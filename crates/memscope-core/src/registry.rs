//! # Decoder Registry
//!
//! Ordered table of (signature pattern, factory) pairs, resolved first match
//! wins.
//!
//! ## Lifecycle
//!
//! 1. Create a [`RegistryBuilder`] and `register` every pattern (startup)
//! 2. `build()` freezes it into a [`Registry`], which is cheap to clone and
//!    never changes again
//! 3. Hosts call [`Registry::resolve`] (or [`Registry::decode`]) per handle
//!
//! Patterns are regular expressions matched against the *whole* normalized
//! [`TypeSignature`]; `Math::Vector<.*>` never matches
//! `Container::Voxel<Math::Vector<double>>` just because the text appears in a
//! template argument.
//!
//! ## Process-wide registry
//!
//! [`install`] stores a registry once for the whole process; [`global`]
//! returns it, building the standard catalogue on first use if nothing was
//! installed. After that first access it is read-only and needs no locking.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::{debug, trace};

use crate::catalogue;
use crate::config::Namespace;
use crate::decoder::{Decoder, Leaf};
use crate::decoders::opaque::OpaqueDecoder;
use crate::error::{InspectError, InspectResult};
use crate::types::TypeSignature;
use crate::value::Handle;

/// Builds a decoder for a handle whose signature matched the pattern.
///
/// The registry is passed in so that decoders which need to dispatch
/// sub-values (variants, composites) can keep a clone of it.
pub type Factory = Box<dyn Fn(Handle, &Registry) -> InspectResult<Box<dyn Decoder>> + Send + Sync>;

struct Registration
{
    source: String,
    pattern: Regex,
    factory: Factory,
}

/// Mutable registration phase
///
/// ## Example
///
/// ```rust
/// use memscope_core::decoder::{Decoder, Leaf};
/// use memscope_core::registry::RegistryBuilder;
///
/// let mut builder = RegistryBuilder::new();
/// builder.register("Demo::Thing<.*>", |_handle, _registry| Ok(Box::new(Leaf::text("thing")) as Box<dyn Decoder>))?;
/// let registry = builder.build();
/// assert_eq!(registry.patterns().collect::<Vec<_>>(), ["Demo::Thing<.*>"]);
/// # Ok::<(), memscope_core::error::InspectError>(())
/// ```
#[derive(Default)]
pub struct RegistryBuilder
{
    registrations: Vec<Registration>,
}

impl RegistryBuilder
{
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Append a registration. Duplicates are kept; earlier ones win.
    ///
    /// ## Errors
    ///
    /// `InvalidPattern` if `pattern` is not a valid regular expression.
    pub fn register<F>(&mut self, pattern: &str, factory: F) -> InspectResult<&mut Self>
    where
        F: Fn(Handle, &Registry) -> InspectResult<Box<dyn Decoder>> + Send + Sync + 'static,
    {
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| InspectError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        self.registrations.push(Registration {
            source: pattern.to_string(),
            pattern: anchored,
            factory: Box::new(factory),
        });
        Ok(self)
    }

    /// Number of registrations so far.
    pub fn len(&self) -> usize
    {
        self.registrations.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool
    {
        self.registrations.is_empty()
    }

    /// Freeze into a read-only registry.
    #[must_use]
    pub fn build(self) -> Registry
    {
        debug!(registrations = self.registrations.len(), "decoder registry frozen");
        Registry {
            registrations: Arc::from(self.registrations),
        }
    }
}

/// Read-only decoder table
///
/// Cloning shares the underlying table.
#[derive(Clone)]
pub struct Registry
{
    registrations: Arc<[Registration]>,
}

impl Registry
{
    /// A registry that matches nothing; every value renders opaquely.
    #[must_use]
    pub fn empty() -> Self
    {
        RegistryBuilder::new().build()
    }

    /// Index of the registration that `signature` selects.
    pub fn matching_index(&self, signature: &TypeSignature) -> Option<usize>
    {
        self.registrations
            .iter()
            .position(|registration| registration.pattern.is_match(signature.as_str()))
    }

    /// Find and build the decoder for `handle`.
    ///
    /// Returns `None` when no pattern matches; that is not an error, the
    /// caller renders the value opaquely. A matching factory that fails to
    /// build produces a diagnostic leaf for this handle only.
    pub fn resolve(&self, handle: &Handle) -> Option<Box<dyn Decoder>>
    {
        let signature = match TypeSignature::of(&**handle) {
            Ok(signature) => signature,
            Err(err) => return Some(Box::new(Leaf::diagnostic(&err))),
        };

        let Some(index) = self.matching_index(&signature) else {
            trace!(%signature, "no decoder registered");
            return None;
        };

        let registration = &self.registrations[index];
        debug!(%signature, pattern = %registration.source, index, "decoder resolved");
        match (registration.factory)(handle.clone(), self) {
            Ok(decoder) => Some(decoder),
            Err(err) => {
                debug!(%signature, error = %err, "decoder factory failed");
                Some(Box::new(Leaf::diagnostic(&err)))
            }
        }
    }

    /// [`Registry::resolve`], falling back to the opaque default rendering.
    pub fn decode(&self, handle: &Handle) -> Box<dyn Decoder>
    {
        self.resolve(handle)
            .unwrap_or_else(|| Box::new(OpaqueDecoder::new(handle.clone())))
    }

    /// Registered patterns in lookup order.
    pub fn patterns(&self) -> impl Iterator<Item = &str>
    {
        self.registrations.iter().map(|registration| registration.source.as_str())
    }

    /// Number of registrations.
    pub fn len(&self) -> usize
    {
        self.registrations.len()
    }

    /// Whether the registry matches nothing.
    pub fn is_empty(&self) -> bool
    {
        self.registrations.is_empty()
    }
}

impl fmt::Debug for Registry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Registry")
            .field("patterns", &self.patterns().collect::<Vec<_>>())
            .finish()
    }
}

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// Install the process-wide registry.
///
/// ## Errors
///
/// Gives the registry back if one was already installed (or already built by
/// an earlier call to [`global`]).
pub fn install(registry: Registry) -> Result<(), Registry>
{
    GLOBAL.set(registry)
}

/// The process-wide registry, built from the standard catalogue with the
/// default [`Namespace`] if nothing was installed.
///
/// ## Errors
///
/// Only if the standard catalogue itself fails to register, which would be a
/// bug in a pattern.
pub fn global() -> InspectResult<&'static Registry>
{
    GLOBAL.get_or_try_init(|| catalogue::standard_registry(&Namespace::default()))
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn leaf(text: &'static str) -> impl Fn(Handle, &Registry) -> InspectResult<Box<dyn Decoder>> + Send + Sync
    {
        move |_, _| Ok(Box::new(Leaf::text(text)) as Box<dyn Decoder>)
    }

    #[test]
    fn test_first_match_wins_in_insertion_order()
    {
        let mut builder = RegistryBuilder::new();
        builder.register("Math::Vector<.*>", leaf("generic")).unwrap();
        builder.register("Math::Vector<double>", leaf("specific")).unwrap();
        let registry = builder.build();

        let signature = TypeSignature::from_name("Math::Vector<double>");
        assert_eq!(registry.matching_index(&signature), Some(0));
        for _ in 0..3 {
            assert_eq!(registry.matching_index(&signature), Some(0));
        }
    }

    #[test]
    fn test_patterns_are_anchored()
    {
        let mut builder = RegistryBuilder::new();
        builder.register("Math::Vector<.*>", leaf("vector")).unwrap();
        let registry = builder.build();

        let nested = TypeSignature::from_name("Container::Voxel<Math::Vector<double>>");
        assert_eq!(registry.matching_index(&nested), None);
    }

    #[test]
    fn test_invalid_pattern_is_reported()
    {
        let mut builder = RegistryBuilder::new();
        let err = builder.register("Broken<(", leaf("x")).err().unwrap();
        assert!(matches!(err, InspectError::InvalidPattern { .. }));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept()
    {
        let mut builder = RegistryBuilder::new();
        builder.register("A", leaf("one")).unwrap();
        builder.register("A", leaf("two")).unwrap();
        let registry = builder.build();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.matching_index(&TypeSignature::from_name("A")), Some(0));
    }
}
