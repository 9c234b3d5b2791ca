use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::models::content::Coordinates;

/// Answer to a location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Platform service supplying device coordinates and permission state.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Ask the user for location access.
    async fn request_permission(&self) -> PermissionStatus;

    /// The current device position.
    ///
    /// Hardware or timeout failures are reported as
    /// [`DiscoveryError::LocationUnavailable`].
    async fn current_position(&self) -> Result<Coordinates, DiscoveryError>;
}

/// Ask for permission, then for one position fix.
pub async fn locate(provider: &dyn GeolocationProvider) -> Result<Coordinates, DiscoveryError> {
    if provider.request_permission().await == PermissionStatus::Denied {
        return Err(DiscoveryError::Permission(
            "location access was denied".into(),
        ));
    }

    let position = provider.current_position().await?;
    if !position.is_valid() {
        return Err(DiscoveryError::LocationUnavailable(format!(
            "provider returned an invalid position ({}, {})",
            position.lat, position.lng
        )));
    }
    Ok(position)
}

/// A provider pinned to one position, for fixed-location kiosks and the CLI.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    position: Coordinates,
}

impl FixedLocation {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    async fn current_position(&self) -> Result<Coordinates, DiscoveryError> {
        Ok(self.position)
    }
}
