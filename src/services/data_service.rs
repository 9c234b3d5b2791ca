use async_trait::async_trait;

use crate::error::DiscoveryError;
use crate::models::content::{Category, ContentItem, Coordinates, PriceTier};

/// A single query clause. All clauses of a [`ContentQuery`] are ANDed.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring of the title OR the description.
    TextContains(String),
    /// Item tags intersect the given set.
    TagsAny(Vec<String>),
    /// Case-insensitive equality on the business name.
    BusinessNameEquals(String),
    /// Case-insensitive prefix of the business name.
    BusinessNamePrefix(String),
    Category(Category),
    /// Business rating greater than or equal to the bound.
    MinRating(f32),
    /// Price tier is one of the given tiers.
    PriceIn(Vec<PriceTier>),
    CouponActive(bool),
}

impl Predicate {
    /// Evaluate the clause against an item in-process.
    pub fn matches(&self, item: &ContentItem) -> bool {
        match self {
            Predicate::TextContains(needle) => {
                let needle = needle.to_lowercase();
                item.title.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
            }
            Predicate::TagsAny(tags) => item.tags.iter().any(|t| tags.contains(t)),
            Predicate::BusinessNameEquals(name) => {
                item.business_name.to_lowercase() == name.to_lowercase()
            }
            Predicate::BusinessNamePrefix(prefix) => item
                .business_name
                .to_lowercase()
                .starts_with(&prefix.to_lowercase()),
            Predicate::Category(category) => item.category == Some(*category),
            Predicate::MinRating(min) => item.rating >= *min,
            Predicate::PriceIn(tiers) => item.price_tier.is_some_and(|t| tiers.contains(&t)),
            Predicate::CouponActive(active) => item.coupon_active == *active,
        }
    }
}

/// Sort keys understood by every Data Service backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CouponActiveDesc,
    CreatedAtDesc,
    IdAsc,
}

/// The feed's default ordering: coupon first, newest first, id as tie-break.
pub const DEFAULT_SORT: [SortKey; 3] = [
    SortKey::CouponActiveDesc,
    SortKey::CreatedAtDesc,
    SortKey::IdAsc,
];

/// A composite predicate query.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    pub predicates: Vec<Predicate>,
    pub sort: Vec<SortKey>,
}

impl Default for ContentQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: DEFAULT_SORT.to_vec(),
        }
    }
}

impl ContentQuery {
    pub fn new(predicates: Vec<Predicate>) -> Self {
        Self {
            predicates,
            ..Self::default()
        }
    }

    /// `true` if the item satisfies every clause.
    pub fn matches(&self, item: &ContentItem) -> bool {
        self.predicates.iter().all(|p| p.matches(item))
    }

    /// The category clause, if the query carries one.
    pub fn category(&self) -> Option<Category> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Category(c) => Some(*c),
            _ => None,
        })
    }
}

/// One page of a predicate query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub items: Vec<ContentItem>,
    /// Number of items matching the query, regardless of offset/limit.
    pub total_count: u64,
}

/// The managed backend, reached only through a predicate-query contract.
///
/// Abstracted as a trait so the engine can run against MongoDB, the
/// in-memory backend, or a test double.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Run a composite query, skipping `offset` items and returning at most `limit`.
    async fn submit_query(
        &self,
        query: &ContentQuery,
        offset: usize,
        limit: usize,
    ) -> Result<QueryResult, DiscoveryError>;

    /// Items whose tags intersect `tags`, in the default order.
    async fn submit_tag_query(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError>;

    /// Whether [`DataService::submit_location_query`] is available.
    fn supports_location_query(&self) -> bool {
        false
    }

    /// Items within `radius_km` of `origin`, optionally restricted to a category.
    ///
    /// Backends without a location-aware primitive keep the default, and the
    /// engine falls back to in-process radius filtering.
    async fn submit_location_query(
        &self,
        _origin: Coordinates,
        _radius_km: f64,
        _category: Option<Category>,
        _limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError> {
        Err(DiscoveryError::Unsupported(
            "location queries are not supported by this data service".into(),
        ))
    }
}
