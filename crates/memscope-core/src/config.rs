//! # Engine Configuration
//!
//! Settings a host may want to change without touching code: which C++
//! namespaces the standard catalogue registers against, and how much of a
//! decoded tree the renderer materializes.
//!
//! ## Environment Variables
//!
//! - `MEMSCOPE_NAMESPACE`: root namespace of the inspected project (default `BTS`)
//! - `MEMSCOPE_MATH_NAMESPACE`: namespace of the linear-algebra types (default `MR::Math`)
//! - `MEMSCOPE_MAX_DEPTH`: deepest level the renderer expands (default 6)
//! - `MEMSCOPE_MAX_CHILDREN`: children requested per node (default 64)
//! - `MEMSCOPE_MAX_STRING`: longest C string read from a snapshot (default 4096)

use std::env;
use std::str::FromStr;

use crate::error::{InspectError, InspectResult};
use crate::render::RenderLimits;

/// Environment variable for [`Namespace::root`].
pub const NAMESPACE_ENV: &str = "MEMSCOPE_NAMESPACE";
/// Environment variable for [`Namespace::math`].
pub const MATH_NAMESPACE_ENV: &str = "MEMSCOPE_MATH_NAMESPACE";
/// Environment variable for [`RenderLimits::max_depth`].
pub const MAX_DEPTH_ENV: &str = "MEMSCOPE_MAX_DEPTH";
/// Environment variable for [`RenderLimits::max_children`].
pub const MAX_CHILDREN_ENV: &str = "MEMSCOPE_MAX_CHILDREN";
/// Environment variable for [`EngineConfig::max_string_len`].
pub const MAX_STRING_ENV: &str = "MEMSCOPE_MAX_STRING";

/// Default cap on C string reads.
pub const DEFAULT_MAX_STRING_LEN: usize = 4096;

/// Namespace prefixes the standard catalogue is parameterized over
///
/// The same decoders serve `BTS::Fibre::Strand` and, say, a fork that moved
/// everything under `Tracto::`; only these prefixes change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace
{
    /// Project namespace (`BTS`)
    pub root: String,
    /// Linear-algebra namespace (`MR::Math`)
    pub math: String,
}

impl Default for Namespace
{
    fn default() -> Self
    {
        Self {
            root: "BTS".to_string(),
            math: "MR::Math".to_string(),
        }
    }
}

impl Namespace
{
    /// Fully qualified name below the project namespace: `qualify("Fibre::Strand")`.
    pub fn qualify(&self, path: &str) -> String
    {
        if self.root.is_empty() {
            path.to_string()
        } else {
            format!("{}::{path}", self.root)
        }
    }

    /// Fully qualified name below the math namespace: `math_type("Vector")`.
    pub fn math_type(&self, name: &str) -> String
    {
        if self.math.is_empty() {
            name.to_string()
        } else {
            format!("{}::{name}", self.math)
        }
    }
}

/// Everything configurable about one engine instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig
{
    /// Namespaces for the standard catalogue
    pub namespace: Namespace,
    /// Renderer expansion limits
    pub limits: RenderLimits,
    /// Longest C string read from a snapshot
    pub max_string_len: usize,
}

impl Default for EngineConfig
{
    fn default() -> Self
    {
        Self {
            namespace: Namespace::default(),
            limits: RenderLimits::default(),
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl EngineConfig
{
    /// Defaults overridden by whichever `MEMSCOPE_*` variables are set.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if a numeric variable does not parse.
    pub fn from_env() -> InspectResult<Self>
    {
        let mut config = Self::default();

        if let Ok(root) = env::var(NAMESPACE_ENV) {
            config.namespace.root = root.trim().trim_end_matches("::").to_string();
        }
        if let Ok(math) = env::var(MATH_NAMESPACE_ENV) {
            config.namespace.math = math.trim().trim_end_matches("::").to_string();
        }
        if let Some(depth) = parse_env(MAX_DEPTH_ENV)? {
            config.limits.max_depth = depth;
        }
        if let Some(children) = parse_env(MAX_CHILDREN_ENV)? {
            config.limits.max_children = children;
        }
        if let Some(len) = parse_env(MAX_STRING_ENV)? {
            config.max_string_len = len;
        }

        Ok(config)
    }
}

fn parse_env<T: FromStr>(name: &str) -> InspectResult<Option<T>>
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| InspectError::InvalidArgument(format!("{name}={raw} is not a valid number"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_namespace_qualify()
    {
        let ns = Namespace::default();
        assert_eq!(ns.qualify("Fibre::Strand"), "BTS::Fibre::Strand");
        assert_eq!(ns.math_type("Vector"), "MR::Math::Vector");

        let bare = Namespace {
            root: String::new(),
            math: String::new(),
        };
        assert_eq!(bare.qualify("Coord"), "Coord");
        assert_eq!(bare.math_type("Matrix"), "Matrix");
    }

    #[test]
    fn test_defaults()
    {
        let config = EngineConfig::default();
        assert_eq!(config.namespace.root, "BTS");
        assert_eq!(config.max_string_len, DEFAULT_MAX_STRING_LEN);
        assert!(config.limits.max_children > 0);
    }
}
