/// Convenience result alias used across the crate.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by the caching layers and the render pass that drives them.
///
/// Only [`CacheError::Allocation`] is expected to reach a render pass under normal operation; the
/// composer treats it as a cache miss and renders the affected subtree live.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// Rejected input: configuration, scene description, or graph edit.
    #[error("validation error: {0}")]
    Validation(String),

    /// A raster surface could not be allocated.
    #[error("surface allocation failed: {0}")]
    Allocation(String),

    /// JSON decoding failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped foreign error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Build a [`CacheError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CacheError::Allocation`].
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`CacheError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for failures a render pass recovers from by rendering live.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Allocation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
