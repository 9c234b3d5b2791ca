use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::models::content::{Category, ContentItem, Coordinates};
use crate::models::filters::RadiusFilter;
use crate::search::geo::within_radius;
use crate::services::data_service::{
    ContentQuery, DataService, Predicate, QueryResult, SortKey, DEFAULT_SORT,
};

/// In-process Data Service over a fixed catalog.
///
/// Evaluates predicates with [`Predicate::matches`] and exposes a native
/// location primitive unless built with
/// [`InMemoryDataService::without_location_queries`]. Request counters make
/// it usable as a test double.
#[derive(Debug, Default)]
pub struct InMemoryDataService {
    items: Vec<ContentItem>,
    location_queries_enabled: bool,
    queries: AtomicUsize,
    tag_queries: AtomicUsize,
    location_queries: AtomicUsize,
}

impl InMemoryDataService {
    /// Build a catalog. Later duplicates of an id are ignored.
    pub fn new(items: Vec<ContentItem>) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let unique: Vec<ContentItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();

        Self {
            items: unique,
            location_queries_enabled: true,
            ..Self::default()
        }
    }

    /// Hide the location primitive, forcing the geospatial fallback.
    pub fn without_location_queries(mut self) -> Self {
        self.location_queries_enabled = false;
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of `submit_query` calls served.
    pub fn query_count(&self) -> usize {
        self.queries.load(AtomicOrdering::SeqCst)
    }

    pub fn tag_query_count(&self) -> usize {
        self.tag_queries.load(AtomicOrdering::SeqCst)
    }

    pub fn location_query_count(&self) -> usize {
        self.location_queries.load(AtomicOrdering::SeqCst)
    }

    /// Requests of any kind.
    pub fn request_count(&self) -> usize {
        self.query_count() + self.tag_query_count() + self.location_query_count()
    }

    fn select<F>(&self, keep: F, sort: &[SortKey]) -> Vec<ContentItem>
    where
        F: Fn(&ContentItem) -> bool,
    {
        let mut selected: Vec<ContentItem> =
            self.items.iter().filter(|item| keep(item)).cloned().collect();
        selected.sort_by(|a, b| compare(a, b, sort));
        selected
    }
}

fn compare(a: &ContentItem, b: &ContentItem, sort: &[SortKey]) -> Ordering {
    sort.iter()
        .map(|key| match key {
            SortKey::CouponActiveDesc => b.coupon_active.cmp(&a.coupon_active),
            SortKey::CreatedAtDesc => b.created_at.cmp(&a.created_at),
            SortKey::IdAsc => a.id.cmp(&b.id),
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl DataService for InMemoryDataService {
    async fn submit_query(
        &self,
        query: &ContentQuery,
        offset: usize,
        limit: usize,
    ) -> Result<QueryResult, DiscoveryError> {
        self.queries.fetch_add(1, AtomicOrdering::SeqCst);

        let matching = self.select(|item| query.matches(item), &query.sort);
        let total_count = matching.len() as u64;
        let items = matching.into_iter().skip(offset).take(limit).collect();

        Ok(QueryResult { items, total_count })
    }

    async fn submit_tag_query(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError> {
        self.tag_queries.fetch_add(1, AtomicOrdering::SeqCst);

        let predicate = Predicate::TagsAny(tags.to_vec());
        let mut items = self.select(|item| predicate.matches(item), &DEFAULT_SORT);
        items.truncate(limit);
        Ok(items)
    }

    fn supports_location_query(&self) -> bool {
        self.location_queries_enabled
    }

    async fn submit_location_query(
        &self,
        origin: Coordinates,
        radius_km: f64,
        category: Option<Category>,
        limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError> {
        if !self.location_queries_enabled {
            return Err(DiscoveryError::Unsupported(
                "location queries are disabled on this catalog".into(),
            ));
        }
        self.location_queries.fetch_add(1, AtomicOrdering::SeqCst);

        let filter = RadiusFilter {
            center: origin,
            radius_km,
        };
        let mut items = self.select(
            |item| {
                within_radius(item, &filter)
                    && category.map_or(true, |c| item.category == Some(c))
            },
            &DEFAULT_SORT,
        );
        items.truncate(limit);
        Ok(items)
    }
}
