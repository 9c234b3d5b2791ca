use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::DiscoveryError;
use crate::models::filters::FilterCriteria;
use crate::search::geo::fetch_within_radius;
use crate::search::mode::SearchMode;
use crate::search::pagination::FetchedPage;
use crate::search::ranking::rank;
use crate::search::strategies;
use crate::services::data_service::{ContentQuery, DataService, Predicate};

/// Translate filter state into a composite query.
///
/// Location is not part of the predicate list: radius filtering is handled
/// by the geospatial filter.
pub fn compose(criteria: &FilterCriteria) -> ContentQuery {
    let mut predicates = Vec::new();

    if !criteria.search_query().is_empty() {
        predicates.push(Predicate::TextContains(criteria.search_query().to_string()));
    }
    if !criteria.tags().is_empty() {
        predicates.push(Predicate::TagsAny(criteria.tags().iter().cloned().collect()));
    }
    if let Some(category) = criteria.category() {
        predicates.push(Predicate::Category(category));
    }
    if !criteria.business_name().is_empty() {
        predicates.push(Predicate::BusinessNameEquals(
            criteria.business_name().to_string(),
        ));
    }
    if criteria.min_rating() > 0.0 {
        predicates.push(Predicate::MinRating(criteria.min_rating()));
    }
    if !criteria.price_range().is_empty() {
        predicates.push(Predicate::PriceIn(
            criteria.price_range().iter().copied().collect(),
        ));
    }
    if criteria.has_active_coupon() {
        predicates.push(Predicate::CouponActive(true));
    }

    ContentQuery::new(predicates)
}

/// Routes every search mode to the Data Service and produces ranked pages.
#[derive(Clone)]
pub struct QueryComposer {
    data: Arc<dyn DataService>,
    config: EngineConfig,
}

impl QueryComposer {
    pub fn new(data: Arc<dyn DataService>, config: EngineConfig) -> Self {
        Self { data, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch one page for `mode`.
    ///
    /// `offset` and `page_size` only matter for the general mode; the narrow
    /// modes always return a single terminal page of at most
    /// `strategy_limit` items.
    pub async fn fetch_page(
        &self,
        mode: &SearchMode,
        offset: usize,
        page_size: usize,
    ) -> Result<FetchedPage, DiscoveryError> {
        let data = self.data.as_ref();
        let limit = self.config.strategy_limit;

        match mode {
            SearchMode::General(criteria) => self.general(criteria, offset, page_size).await,
            SearchMode::TagOnly(tags) => strategies::by_tags(data, tags, limit).await,
            SearchMode::NameOnly(name) => strategies::by_business_name(data, name, limit).await,
            SearchMode::CouponOnly(category) => {
                strategies::with_active_coupons(data, *category, limit).await
            }
            SearchMode::LocationOnly { center, radius_km } => {
                strategies::by_location(data, *center, *radius_km, limit, &self.config.geo).await
            }
        }
    }

    /// The general search path: composed predicates, optional radius, ranking.
    pub async fn general(
        &self,
        criteria: &FilterCriteria,
        offset: usize,
        page_size: usize,
    ) -> Result<FetchedPage, DiscoveryError> {
        let query = compose(criteria);
        tracing::debug!(
            offset,
            page_size,
            predicates = query.predicates.len(),
            "Composed general query"
        );

        if let Some(radius) = criteria.radius_filter() {
            return fetch_within_radius(
                self.data.as_ref(),
                &query,
                &radius,
                offset,
                page_size,
                &self.config.geo,
            )
            .await;
        }

        let result = self.data.submit_query(&query, offset, page_size).await?;
        Ok(FetchedPage::from_items(
            rank(result.items),
            Some(result.total_count),
            page_size,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::{Category, PriceTier};
    use crate::models::filters::{FilterPatch, LocationFilter};

    #[test]
    fn test_empty_criteria_compose_no_predicates() {
        let query = compose(&FilterCriteria::default());
        assert!(query.predicates.is_empty());
    }

    #[test]
    fn test_every_field_maps_to_a_clause() {
        let criteria = FilterCriteria::from_patch(
            FilterPatch::default()
                .search_query("café")
                .tags(["coffee", "brunch"])
                .category(Category::Cafe)
                .business_name("Café Luna")
                .min_rating(3.5)
                .price_range([PriceTier::Budget, PriceTier::Moderate])
                .has_active_coupon(true)
                .near(4.4, -75.2, 3.0),
        );

        let query = compose(&criteria);
        assert_eq!(
            query.predicates,
            vec![
                Predicate::TextContains("café".into()),
                Predicate::TagsAny(vec!["brunch".into(), "coffee".into()]),
                Predicate::Category(Category::Cafe),
                Predicate::BusinessNameEquals("Café Luna".into()),
                Predicate::MinRating(3.5),
                Predicate::PriceIn(vec![PriceTier::Budget, PriceTier::Moderate]),
                Predicate::CouponActive(true),
            ]
        );
    }

    #[test]
    fn test_coupon_false_is_not_a_clause() {
        let criteria = FilterCriteria::from_patch(
            FilterPatch::default()
                .has_active_coupon(false)
                .location(LocationFilter::radius_only(2.0)),
        );
        assert!(compose(&criteria).predicates.is_empty());
    }
}
