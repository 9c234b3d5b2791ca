#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use vitrina::models::content::{Category, ContentItem, Coordinates};
use vitrina::services::data_service::{ContentQuery, DataService, QueryResult};
use vitrina::{DiscoveryError, InMemoryDataService};

/// Centre of the fixture town.
pub const TOWN: Coordinates = Coordinates {
    lat: 4.4389,
    lng: -75.2322,
};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A content item created `age_minutes` before [`epoch`].
pub fn item(id: &str, age_minutes: i64) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        business_ref: format!("biz-{id}"),
        business_name: format!("Business {id}"),
        category: Some(Category::Cafe),
        rating: 4.0,
        price_tier: None,
        title: format!("Video {id}"),
        description: String::new(),
        tags: Vec::new(),
        coupon_active: false,
        created_at: epoch() - Duration::minutes(age_minutes),
        coordinates: Some(TOWN),
        engagement: Default::default(),
    }
}

/// 45 items mentioning "café", every third one with a coupon, plus 10
/// unrelated items.
pub fn cafe_catalog() -> Vec<ContentItem> {
    let mut items: Vec<ContentItem> = (0..45)
        .map(|i| ContentItem {
            title: format!("Morning at café #{i}"),
            description: "espresso and pastries".to_string(),
            tags: vec!["coffee".to_string()],
            coupon_active: i % 3 == 0,
            ..item(&format!("cafe-{i:02}"), i)
        })
        .collect();
    items.extend((0..10).map(|i| ContentItem {
        title: format!("Leg day #{i}"),
        category: Some(Category::Fitness),
        tags: vec!["gym".to_string()],
        ..item(&format!("gym-{i:02}"), i)
    }));
    items
}

/// Wraps an [`InMemoryDataService`] and holds one chosen `submit_query`
/// call until [`GatedDataService::release`] is called.
pub struct GatedDataService {
    inner: InMemoryDataService,
    gated_call: usize,
    calls: AtomicUsize,
    entered: Notify,
    released: Notify,
}

impl GatedDataService {
    /// Hold the `gated_call`-th query (1-based).
    pub fn new(items: Vec<ContentItem>, gated_call: usize) -> Self {
        Self {
            inner: InMemoryDataService::new(items),
            gated_call,
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            released: Notify::new(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Resolves once the gated call is parked.
    pub async fn wait_until_gated(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl DataService for GatedDataService {
    async fn submit_query(
        &self,
        query: &ContentQuery,
        offset: usize,
        limit: usize,
    ) -> Result<QueryResult, DiscoveryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.gated_call {
            self.entered.notify_one();
            self.released.notified().await;
        }
        self.inner.submit_query(query, offset, limit).await
    }

    async fn submit_tag_query(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.submit_tag_query(tags, limit).await
    }
}
