//! Error types for persistent map operations.
//!
//! Lookups never fail: an absent key is `None` (or the caller's default).
//! The errors here cover arguments that cannot be turned into a map at all,
//! exclusive inserts of a key that is already bound, and writes attempted
//! through the conventional map surface.

use thiserror::Error;

/// Result type alias using [`MapError`].
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors raised by persistent map operations.
///
/// # Examples
///
/// ```rust
/// use submap::MapError;
///
/// let error = MapError::UnsupportedOperation("put");
/// assert_eq!(
///     format!("{error}"),
///     "unsupported operation: put (persistent maps are immutable, use assoc/without)"
/// );
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// An argument cannot be interpreted by the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An in-place mutation was attempted on an immutable map.
    #[error("unsupported operation: {0} (persistent maps are immutable, use assoc/without)")]
    UnsupportedOperation(&'static str),

    /// An exclusive insert found the key already bound.
    #[error("key already present")]
    KeyAlreadyPresent,
}

impl MapError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
