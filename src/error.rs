use thiserror::Error;

/// Discovery-wide error types.
///
/// Errors are `Clone` so the last failure can be kept inside the
/// immutable [`SearchState`](crate::search::state::SearchState) snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiscoveryError {
    /// Malformed filter input. Absorbed by normalization in the filter layer.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The Data Service was unreachable, timed out or rejected the query.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The user denied geolocation access.
    #[error("Permission error: {0}")]
    Permission(String),

    /// The device could not produce a position.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The bounded geospatial fallback could not fill a page.
    #[error("Partial result: requested {requested} items, got {returned}")]
    PartialResult { requested: usize, returned: usize },

    /// The Data Service does not expose an optional primitive.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DiscoveryError {
    /// Returns `true` for failures that belong to the geolocation flow.
    pub fn is_location_failure(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Permission(_) | DiscoveryError::LocationUnavailable(_)
        )
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for DiscoveryError {
    fn from(err: anyhow::Error) -> Self {
        DiscoveryError::Internal(err.to_string())
    }
}

impl From<::config::ConfigError> for DiscoveryError {
    fn from(err: ::config::ConfigError) -> Self {
        DiscoveryError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
