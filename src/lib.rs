//! Content discovery for a local-business video feed.
//!
//! [`DiscoveryEngine`] is the entry point: it owns the filter state, turns it
//! into Data Service queries, ranks and paginates the results, and publishes
//! every state change on a `watch` channel.

pub mod config;
pub mod error;
pub mod telemetry;

pub mod models {
    pub mod content;
    pub mod filters;
}

pub mod search {
    pub mod composer;
    pub mod engine;
    pub mod geo;
    pub mod mode;
    pub mod pagination;
    pub mod ranking;
    pub mod state;
    pub mod strategies;
}

pub mod services {
    pub mod data_service;
    pub mod geolocation;
    pub mod memory;
    #[cfg(feature = "mongo")]
    pub mod mongo;
}

pub use config::{EngineConfig, GeoTuning};
pub use error::DiscoveryError;
pub use models::content::{Category, ContentItem, Coordinates, PriceTier};
pub use models::filters::{FilterCriteria, FilterPatch, LocationFilter};
pub use search::engine::DiscoveryEngine;
pub use search::state::{LocationStatus, SearchState};
pub use services::data_service::DataService;
pub use services::geolocation::GeolocationProvider;
pub use services::memory::InMemoryDataService;
