//! Radius filtering of candidate sets.
//!
//! Two strategies: delegate to the Data Service when it exposes a
//! location-aware primitive, otherwise over-fetch unfiltered candidates and
//! keep the ones within range using the haversine distance. Items without
//! coordinates never pass either way.

use crate::config::GeoTuning;
use crate::error::DiscoveryError;
use crate::models::content::{ContentItem, Coordinates};
use crate::models::filters::RadiusFilter;
use crate::search::pagination::FetchedPage;
use crate::search::ranking::rank;
use crate::services::data_service::{ContentQuery, DataService};

/// Mean earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// `true` if the item has coordinates within the radius.
pub fn within_radius(item: &ContentItem, filter: &RadiusFilter) -> bool {
    item.coordinates
        .is_some_and(|point| haversine_km(filter.center, point) <= filter.radius_km)
}

/// Keep in-range items, stopping once `limit` have been kept.
///
/// Returns the kept items and how many candidates were consumed to find
/// them: up to and including the last kept item when the limit was reached,
/// the whole input otherwise.
pub fn keep_within_radius(
    candidates: Vec<ContentItem>,
    filter: &RadiusFilter,
    limit: usize,
) -> (Vec<ContentItem>, usize) {
    let scanned = candidates.len();
    let mut kept = Vec::with_capacity(limit.min(scanned));

    for (index, item) in candidates.into_iter().enumerate() {
        if kept.len() == limit {
            return (kept, index);
        }
        if within_radius(&item, filter) {
            kept.push(item);
        }
    }

    (kept, scanned)
}

/// One page of radius-filtered results for a composed query.
///
/// Uses the Data Service's location primitive when it has one, the bounded
/// over-fetch fallback otherwise.
pub async fn fetch_within_radius(
    data: &dyn DataService,
    query: &ContentQuery,
    filter: &RadiusFilter,
    offset: usize,
    page_size: usize,
    tuning: &GeoTuning,
) -> Result<FetchedPage, DiscoveryError> {
    if data.supports_location_query() {
        fetch_native(data, query, filter, offset, page_size, tuning).await
    } else {
        fetch_fallback(data, query, filter, offset, page_size, tuning).await
    }
}

async fn fetch_native(
    data: &dyn DataService,
    query: &ContentQuery,
    filter: &RadiusFilter,
    offset: usize,
    page_size: usize,
    tuning: &GeoTuning,
) -> Result<FetchedPage, DiscoveryError> {
    let first = native_window(data, query, filter, offset, page_size, tuning.overfetch_multiplier)
        .await?;
    if first.settled(page_size) {
        return Ok(first.into_page(page_size, false));
    }

    // Residual predicates thinned the window out: one retry, as in the fallback.
    let retry = native_window(data, query, filter, offset, page_size, tuning.retry_multiplier)
        .await?;
    let partial = !retry.settled(page_size);
    if partial {
        warn_partial(page_size, retry.kept.len());
    }
    Ok(retry.into_page(page_size, partial))
}

async fn native_window(
    data: &dyn DataService,
    query: &ContentQuery,
    filter: &RadiusFilter,
    offset: usize,
    page_size: usize,
    multiplier: usize,
) -> Result<WindowScan, DiscoveryError> {
    // The location primitive has no offset, so read everything up to the end
    // of the requested page, with head-room for the in-process predicates.
    let limit = (offset + page_size) * multiplier;
    let candidates = data
        .submit_location_query(filter.center, filter.radius_km, query.category(), limit)
        .await?;
    let exhausted = candidates.len() < limit;

    let matching: Vec<ContentItem> = candidates
        .into_iter()
        .filter(|item| query.matches(item) && within_radius(item, filter))
        .collect();
    let matching_count = matching.len();

    let kept: Vec<ContentItem> = rank(matching)
        .into_iter()
        .skip(offset)
        .take(page_size)
        .collect();

    tracing::debug!(
        limit,
        matching = matching_count,
        kept = kept.len(),
        exhausted,
        "Native radius window"
    );

    Ok(WindowScan {
        consumed: kept.len(),
        total_count: exhausted.then_some(matching_count as u64),
        kept,
        exhausted,
    })
}

async fn fetch_fallback(
    data: &dyn DataService,
    query: &ContentQuery,
    filter: &RadiusFilter,
    offset: usize,
    page_size: usize,
    tuning: &GeoTuning,
) -> Result<FetchedPage, DiscoveryError> {
    let first = scan_window(data, query, filter, offset, page_size, tuning.overfetch_multiplier)
        .await?;
    if first.settled(page_size) {
        return Ok(first.into_page(page_size, false));
    }

    // One retry with a larger window, then give up on filling the page.
    let retry = scan_window(data, query, filter, offset, page_size, tuning.retry_multiplier)
        .await?;
    let partial = !retry.settled(page_size);
    if partial {
        warn_partial(page_size, retry.kept.len());
    }
    Ok(retry.into_page(page_size, partial))
}

struct WindowScan {
    kept: Vec<ContentItem>,
    consumed: usize,
    exhausted: bool,
    total_count: Option<u64>,
}

impl WindowScan {
    /// The page is either full or the candidate source ran dry.
    fn settled(&self, page_size: usize) -> bool {
        self.kept.len() == page_size || self.exhausted
    }

    fn into_page(self, page_size: usize, partial: bool) -> FetchedPage {
        FetchedPage {
            full: self.kept.len() == page_size,
            items: rank(self.kept),
            total_count: self.total_count,
            consumed: self.consumed,
            partial,
        }
    }
}

async fn scan_window(
    data: &dyn DataService,
    query: &ContentQuery,
    filter: &RadiusFilter,
    offset: usize,
    page_size: usize,
    multiplier: usize,
) -> Result<WindowScan, DiscoveryError> {
    let window = page_size * multiplier;
    let result = data.submit_query(query, offset, window).await?;
    let scanned = result.items.len();

    let (kept, consumed) = keep_within_radius(result.items, filter, page_size);
    tracing::debug!(window, scanned, kept = kept.len(), "Radius fallback window");

    Ok(WindowScan {
        kept,
        consumed,
        exhausted: scanned < window,
        total_count: None,
    })
}

fn warn_partial(requested: usize, returned: usize) {
    let err = DiscoveryError::PartialResult {
        requested,
        returned,
    };
    tracing::warn!("{err}; no further pages will be requested");
}
