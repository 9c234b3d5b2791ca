//! Narrow, single-predicate search entry points.
//!
//! Each strategy issues one query, ranks the candidates and returns a
//! terminal page: these modes never paginate.

use crate::config::GeoTuning;
use crate::error::DiscoveryError;
use crate::models::content::{Category, Coordinates};
use crate::models::filters::RadiusFilter;
use crate::search::geo::fetch_within_radius;
use crate::search::pagination::FetchedPage;
use crate::search::ranking::rank;
use crate::services::data_service::{ContentQuery, DataService, Predicate};

/// Items whose tags intersect `tags`. An empty set yields no results.
pub async fn by_tags(
    data: &dyn DataService,
    tags: &[String],
    limit: usize,
) -> Result<FetchedPage, DiscoveryError> {
    if tags.is_empty() {
        return Ok(FetchedPage::empty());
    }
    let items = data.submit_tag_query(tags, limit).await?;
    Ok(FetchedPage::terminal(rank(items)))
}

/// Items whose business name starts with `name` (case-insensitive).
pub async fn by_business_name(
    data: &dyn DataService,
    name: &str,
    limit: usize,
) -> Result<FetchedPage, DiscoveryError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(FetchedPage::empty());
    }
    let query = ContentQuery::new(vec![Predicate::BusinessNamePrefix(name.to_string())]);
    let result = data.submit_query(&query, 0, limit).await?;
    Ok(FetchedPage::terminal(rank(result.items)))
}

/// Items with an active coupon, optionally restricted to one category.
pub async fn with_active_coupons(
    data: &dyn DataService,
    category: Option<Category>,
    limit: usize,
) -> Result<FetchedPage, DiscoveryError> {
    let mut predicates = vec![Predicate::CouponActive(true)];
    if let Some(category) = category {
        predicates.push(Predicate::Category(category));
    }
    let result = data
        .submit_query(&ContentQuery::new(predicates), 0, limit)
        .await?;
    Ok(FetchedPage::terminal(rank(result.items)))
}

/// Items within `radius_km` of `center`, through the geospatial filter.
pub async fn by_location(
    data: &dyn DataService,
    center: Coordinates,
    radius_km: f64,
    limit: usize,
    tuning: &GeoTuning,
) -> Result<FetchedPage, DiscoveryError> {
    let filter = RadiusFilter { center, radius_km };
    let page =
        fetch_within_radius(data, &ContentQuery::default(), &filter, 0, limit, tuning).await?;
    Ok(FetchedPage::terminal(page.items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::ContentItem;
    use crate::search::ranking::is_ranked;
    use crate::services::memory::InMemoryDataService;
    use chrono::{Duration, TimeZone, Utc};

    fn item(id: &str, name: &str, tags: &[&str], coupon: bool, category: Category) -> ContentItem {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let age: i64 = id.bytes().map(i64::from).sum();
        ContentItem {
            id: id.to_string(),
            business_ref: format!("biz-{name}"),
            business_name: name.to_string(),
            category: Some(category),
            rating: 4.0,
            price_tier: None,
            title: format!("{name} video {id}"),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            coupon_active: coupon,
            created_at: base - Duration::minutes(age),
            coordinates: Some(Coordinates::new(4.44, -75.23)),
            engagement: Default::default(),
        }
    }

    fn catalog() -> InMemoryDataService {
        InMemoryDataService::new(vec![
            item("a1", "Café Luna", &["coffee"], false, Category::Cafe),
            item("a2", "Café Luna", &["coffee", "brunch"], true, Category::Cafe),
            item("b1", "Burger Barn", &["burgers"], true, Category::Restaurant),
            item("c1", "Lunar Gym", &["fitness"], false, Category::Fitness),
            item("d1", "Taco Town", &["tacos", "brunch"], false, Category::Restaurant),
        ])
    }

    #[tokio::test]
    async fn test_by_tags_ranks_and_terminates() {
        let data = catalog();
        let page = by_tags(&data, &["brunch".to_string()], 50).await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "d1"]);
        assert!(!page.has_more());
        assert!(is_ranked(&page.items));
    }

    #[tokio::test]
    async fn test_empty_tags_skip_the_data_service() {
        let data = catalog();
        let page = by_tags(&data, &[], 50).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(data.request_count(), 0);
    }

    #[tokio::test]
    async fn test_by_business_name_prefix() {
        let data = catalog();
        let page = by_business_name(&data, "  luna", 50).await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["c1"]);

        let page = by_business_name(&data, "   ", 50).await.unwrap();
        assert!(page.items.is_empty());

        let page = by_business_name(&data, "café", 50).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "a2");
    }

    #[tokio::test]
    async fn test_coupons_with_category() {
        let data = catalog();
        let page = with_active_coupons(&data, None, 50).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|i| i.coupon_active));

        let page = with_active_coupons(&data, Some(Category::Restaurant), 50)
            .await
            .unwrap();
        let ids: Vec<&str> = page.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b1"]);
    }

    #[tokio::test]
    async fn test_limit_is_respected() {
        let data = catalog();
        let page = by_tags(&data, &["coffee".to_string(), "brunch".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_by_location_terminates() {
        let data = catalog();
        let page = by_location(
            &data,
            Coordinates::new(4.4389, -75.2322),
            5.0,
            50,
            &GeoTuning::default(),
        )
        .await
        .unwrap();
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_more());
        assert_eq!(data.location_query_count(), 1);
    }
}
