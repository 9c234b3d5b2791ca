use std::sync::Arc;

use tokio::sync::watch;

use crate::config::EngineConfig;
use crate::error::DiscoveryError;
use crate::models::content::{Category, Coordinates};
use crate::models::filters::{FilterPatch, LocationFilter};
use crate::search::composer::QueryComposer;
use crate::search::mode::SearchMode;
use crate::search::state::{LocationStatus, PageTicket, SearchState};
use crate::services::data_service::DataService;
use crate::services::geolocation::{locate, GeolocationProvider};

/// The consumer-facing discovery API.
///
/// Holds the current [`SearchState`] in a `watch` channel: every operation
/// computes a new state from the previous one and publishes it, so the
/// presentation layer only has to subscribe and render. The state is never
/// held across an `await`, so reads stay available while a fetch is
/// suspended, and overlapping calls are arbitrated by the state transitions
/// themselves (loading flag and generation counter).
pub struct DiscoveryEngine {
    composer: QueryComposer,
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    state: watch::Sender<SearchState>,
}

impl DiscoveryEngine {
    pub fn new(data: Arc<dyn DataService>, config: EngineConfig) -> Self {
        let config = config.normalized();
        let state = watch::Sender::new(SearchState::new(config.page_size));
        Self {
            composer: QueryComposer::new(data, config),
            geolocation: None,
            state,
        }
    }

    /// Attach a geolocation provider for [`DiscoveryEngine::locate_user`].
    pub fn with_geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = Some(provider);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        self.composer.config()
    }

    /// The current state.
    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Receive every published state.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Merge a partial update into the filters. Never triggers a fetch.
    pub fn update_filters(&self, patch: FilterPatch) -> SearchState {
        self.transition(|state| state.with_filters(patch))
    }

    /// Restore default filters and drop the current results.
    pub fn reset_filters(&self) -> SearchState {
        self.transition(SearchState::reset)
    }

    /// Hide the error indicator.
    pub fn clear_error(&self) -> SearchState {
        self.transition(SearchState::without_error)
    }

    /// Run the general search with the current filters, replacing the results.
    pub async fn perform_search(&self) -> Result<SearchState, DiscoveryError> {
        let filters = self.state.borrow().filters().clone();
        self.run(SearchMode::General(filters)).await
    }

    /// Append the next page of the current general search.
    ///
    /// A no-op when there is nothing more to load, a fetch is already in
    /// flight, or the results came from a mode that does not paginate.
    pub async fn load_more(&self) -> Result<SearchState, DiscoveryError> {
        let mut ticket = None;
        self.state.send_if_modified(|state| match state.begin_load_more() {
            Some((next, t)) => {
                *state = next;
                ticket = Some(t);
                true
            }
            None => false,
        });

        let Some(ticket) = ticket else {
            tracing::trace!("load_more ignored: nothing to load or already loading");
            return Ok(self.snapshot());
        };

        self.fetch_and_commit(ticket).await
    }

    pub async fn search_by_tags<I, S>(&self, tags: I) -> Result<SearchState, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.into().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        tags.sort();
        tags.dedup();
        self.run(SearchMode::TagOnly(tags)).await
    }

    pub async fn search_by_business_name(
        &self,
        name: &str,
    ) -> Result<SearchState, DiscoveryError> {
        self.run(SearchMode::NameOnly(name.trim().to_string())).await
    }

    pub async fn search_with_active_coupons(
        &self,
        category: Option<Category>,
    ) -> Result<SearchState, DiscoveryError> {
        self.run(SearchMode::CouponOnly(category)).await
    }

    /// Items near a point. Without a usable radius the configured default is used.
    pub async fn search_by_location(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> Result<SearchState, DiscoveryError> {
        let center = Coordinates::new(lat, lng);
        if !center.is_valid() {
            let err = DiscoveryError::Validation(format!(
                "coordinates out of range: ({lat}, {lng})"
            ));
            self.transition(|state| state.with_error(err.clone()));
            return Err(err);
        }

        let radius_km = radius_km
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(self.config().default_radius_km);
        self.run(SearchMode::LocationOnly { center, radius_km }).await
    }

    /// Ask the geolocation provider for the device position, once.
    ///
    /// On success the filter location is set to the position with
    /// `radius_km` (or the configured default when missing or unusable). On
    /// failure the status and error are recorded and the filter location is
    /// cleared, so a later search runs without a radius. Results are left
    /// alone either way.
    pub async fn locate_user(&self, radius_km: Option<f64>) -> Result<Coordinates, DiscoveryError> {
        let outcome = match &self.geolocation {
            Some(provider) => locate(provider.as_ref()).await,
            None => Err(DiscoveryError::LocationUnavailable(
                "no geolocation provider configured".into(),
            )),
        };

        match outcome {
            Ok(position) => {
                let radius = radius_km
                    .filter(|r| r.is_finite() && *r > 0.0)
                    .unwrap_or(self.config().default_radius_km);
                let location = LocationFilter::new(position.lat, position.lng, Some(radius));
                self.transition(|state| {
                    state
                        .with_location(LocationStatus::Granted(position))
                        .with_filters(FilterPatch::default().location(location))
                });
                Ok(position)
            }
            Err(err) => {
                tracing::warn!("Geolocation failed: {err}");
                let status = match &err {
                    DiscoveryError::Permission(_) => LocationStatus::Denied,
                    _ => LocationStatus::Unavailable,
                };
                self.transition(|state| {
                    state
                        .with_location(status)
                        .with_filters(FilterPatch::default().clear_location())
                        .with_error(err.clone())
                });
                Err(err)
            }
        }
    }

    /// Locate the user and run the general search.
    ///
    /// A geolocation failure does not stop the search: it runs without a
    /// radius, and the failure stays visible through the location status and
    /// the error indicator once the results are in.
    pub async fn search_near_me(
        &self,
        radius_km: Option<f64>,
    ) -> Result<SearchState, DiscoveryError> {
        let located = self.locate_user(radius_km).await;
        if let Err(err) = &located {
            tracing::info!("Searching without a radius: {err}");
        }

        let state = self.perform_search().await?;
        match located {
            Ok(_) => Ok(state),
            Err(err) => Ok(self.transition(|state| match state.error() {
                Some(_) => state.clone(),
                None => state.with_error(err),
            })),
        }
    }

    async fn run(&self, mode: SearchMode) -> Result<SearchState, DiscoveryError> {
        tracing::debug!(mode = mode.label(), "Starting search");
        let mut ticket = None;
        self.state.send_modify(|state| {
            let (next, t) = state.begin_search(mode);
            *state = next;
            ticket = Some(t);
        });

        match ticket {
            Some(ticket) => self.fetch_and_commit(ticket).await,
            None => Err(DiscoveryError::Internal("search did not start".into())),
        }
    }

    async fn fetch_and_commit(&self, ticket: PageTicket) -> Result<SearchState, DiscoveryError> {
        let outcome = self
            .composer
            .fetch_page(&ticket.mode, ticket.offset, ticket.page_size)
            .await;
        let failure = outcome.as_ref().err().cloned();

        let committed = self.state.send_if_modified(|state| match state.commit(&ticket, outcome) {
            Some(next) => {
                *state = next;
                true
            }
            None => false,
        });

        if !committed {
            tracing::debug!(
                generation = ticket.generation,
                mode = ticket.mode.label(),
                "Discarding stale search response"
            );
            return Ok(self.snapshot());
        }

        match failure {
            Some(err) => {
                tracing::warn!(mode = ticket.mode.label(), "Search failed: {err}");
                Err(err)
            }
            None => Ok(self.snapshot()),
        }
    }

    fn transition<F>(&self, f: F) -> SearchState
    where
        F: FnOnce(&SearchState) -> SearchState,
    {
        self.state.send_modify(|state| {
            *state = f(state);
        });
        self.snapshot()
    }
}
