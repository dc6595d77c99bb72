//! Error types for the cachemux library.
//!
//! The caches themselves never signal errors: missing keys surface as
//! `None`, and a capacity of zero degrades every policy to a silent
//! no-op. The only fallible surface is configuration: the `try_*`
//! constructors validate user-tunable parameters (ratios, factors,
//! shard counts) and return [`ConfigError`] instead of panicking.
//!
//! ```
//! use cachemux::error::ConfigError;
//! use cachemux::policy::tiny_lfu::WTinyLfuCache;
//!
//! let cache: Result<WTinyLfuCache<u64, String>, ConfigError> =
//!     WTinyLfuCache::try_with_window_ratio(100, 0.05);
//! assert!(cache.is_ok());
//!
//! // Out-of-range ratio is caught without panicking.
//! let bad = WTinyLfuCache::<u64, String>::try_with_window_ratio(100, 1.5);
//! assert!(bad.is_err());
//! ```

use std::fmt;

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by the fallible `try_*` constructors, e.g.
/// [`WTinyLfuCache::try_with_window_ratio`](crate::policy::tiny_lfu::WTinyLfuCache::try_with_window_ratio)
/// or
/// [`LfuCache::try_with_aging`](crate::policy::lfu::LfuCache::try_with_aging).
/// Carries a human-readable description of which parameter failed
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_message() {
        let err = ConfigError::new("window ratio must be in (0, 1]");
        assert_eq!(err.to_string(), "window ratio must be in (0, 1]");
    }

    #[test]
    fn debug_includes_message() {
        let err = ConfigError::new("bad shard count");
        assert!(format!("{:?}", err).contains("bad shard count"));
    }

    #[test]
    fn message_accessor() {
        let err = ConfigError::new("k must be at least 1");
        assert_eq!(err.message(), "k must be at least 1");
    }

    #[test]
    fn clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }
}
