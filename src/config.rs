use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;

/// Prefix of the environment variables read by [`EngineConfig::load`].
pub const ENV_PREFIX: &str = "VITRINA";

/// Over-fetch window of the geospatial fallback.
///
/// The first attempt reads `overfetch_multiplier × page_size` unfiltered
/// candidates; a single retry reads `retry_multiplier × page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoTuning {
    pub overfetch_multiplier: usize,
    pub retry_multiplier: usize,
}

impl Default for GeoTuning {
    fn default() -> Self {
        Self {
            overfetch_multiplier: 3,
            retry_multiplier: 6,
        }
    }
}

/// Tunables of the discovery engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Items per page on the general (paginated) search path.
    pub page_size: usize,
    /// Maximum items returned by a specialized (single-shot) search.
    pub strategy_limit: usize,
    /// Radius used when a location search does not name one.
    pub default_radius_km: f64,
    pub geo: GeoTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            strategy_limit: 50,
            default_radius_km: 10.0,
            geo: GeoTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Load the configuration.
    ///
    /// Sources, lowest precedence first:
    /// - built-in defaults
    /// - the optional file at `path` (format picked from the extension)
    /// - `VITRINA_*` environment variables, nested keys separated by `__`
    ///   (e.g. `VITRINA_GEO__OVERFETCH_MULTIPLIER=4`)
    pub fn load(path: Option<&Path>) -> Result<Self, DiscoveryError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: EngineConfig = settings.try_deserialize()?;
        Ok(loaded.normalized())
    }

    /// Replace unusable values with their defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();

        let page_size = if self.page_size == 0 {
            defaults.page_size
        } else {
            self.page_size
        };
        let strategy_limit = if self.strategy_limit == 0 {
            defaults.strategy_limit
        } else {
            self.strategy_limit
        };
        let default_radius_km =
            if self.default_radius_km.is_finite() && self.default_radius_km > 0.0 {
                self.default_radius_km
            } else {
                defaults.default_radius_km
            };

        let overfetch_multiplier = self.geo.overfetch_multiplier.max(1);
        let retry_multiplier = self.geo.retry_multiplier.max(overfetch_multiplier + 1);

        Self {
            page_size,
            strategy_limit,
            default_radius_km,
            geo: GeoTuning {
                overfetch_multiplier,
                retry_multiplier,
            },
        }
    }
}

/// MongoDB connection settings read from environment variables.
#[cfg(feature = "mongo")]
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[cfg(feature = "mongo")]
impl MongoConfig {
    /// Build the config from environment variables.
    ///
    /// - `MONGODB_URI` (default `mongodb://localhost:27017`)
    /// - `MONGODB_DATABASE` (default `vitrina`)
    /// - `MONGODB_COLLECTION` (default `content_items`)
    pub fn from_env() -> Self {
        Self {
            uri: std::env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| "vitrina".to_string()),
            collection: std::env::var("MONGODB_COLLECTION")
                .unwrap_or_else(|_| "content_items".to_string()),
        }
    }
}
