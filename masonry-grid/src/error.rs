use alloc::string::String;

use thiserror::Error;

/// Fatal setup problems, reported synchronously by [`crate::Grid::new`] and
/// [`crate::Grid::rebuild`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("a content binder is required to populate item views")]
    MissingBinder,
    #[error("a viewport query is required to locate the container and its scroller")]
    MissingViewport,
    #[error("invalid item width range: min={min}, max={max}")]
    InvalidWidthRange { min: u32, max: u32 },
}

/// Failure reported by a [`crate::DataSource`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("data source failed: {message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by public grid operations.
///
/// Invalid arguments leave the grid untouched; the operation is a no-op.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("index {index} is out of bounds (len={len})")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("no item view with slot {slot}")]
    UnknownSlot { slot: usize },
    #[error("item view {slot} is not bound to a record")]
    UnboundSlot { slot: usize },
    #[error(transparent)]
    DataSource(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GridError {
    /// Whether the error stems from a bad argument (the call was a no-op).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfBounds { .. } | Self::UnknownSlot { .. } | Self::UnboundSlot { .. }
        )
    }
}
