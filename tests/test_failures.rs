mod common;

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;

use common::{cafe_catalog, item, TOWN};
use vitrina::models::content::{ContentItem, Coordinates};
use vitrina::services::data_service::{ContentQuery, DataService, QueryResult};
use vitrina::services::geolocation::{GeolocationProvider, PermissionStatus};
use vitrina::{DiscoveryEngine, DiscoveryError, EngineConfig, InMemoryDataService, LocationStatus};

mock! {
    pub Data {}

    #[async_trait]
    impl DataService for Data {
        async fn submit_query(
            &self,
            query: &ContentQuery,
            offset: usize,
            limit: usize,
        ) -> Result<QueryResult, DiscoveryError>;

        async fn submit_tag_query(
            &self,
            tags: &[String],
            limit: usize,
        ) -> Result<Vec<ContentItem>, DiscoveryError>;
    }
}

mock! {
    pub Geo {}

    #[async_trait]
    impl GeolocationProvider for Geo {
        async fn request_permission(&self) -> PermissionStatus;
        async fn current_position(&self) -> Result<Coordinates, DiscoveryError>;
    }
}

fn page(ids: &[&str], total: u64) -> QueryResult {
    QueryResult {
        items: ids.iter().enumerate().map(|(n, id)| item(id, n as i64)).collect(),
        total_count: total,
    }
}

fn small_pages() -> EngineConfig {
    EngineConfig {
        page_size: 2,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_transport_failure_keeps_previous_results() {
    let mut data = MockData::new();
    data.expect_submit_query()
        .with(mockall::predicate::always(), eq(0), eq(2))
        .times(1)
        .returning(|_, _, _| Ok(page(&["a", "b"], 5)));
    data.expect_submit_query()
        .with(mockall::predicate::always(), eq(2), eq(2))
        .times(1)
        .returning(|_, _, _| Err(DiscoveryError::Transport("connection reset".into())));

    let engine = DiscoveryEngine::new(Arc::new(data), small_pages());
    engine.perform_search().await.unwrap();

    let err = engine.load_more().await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Transport(_)));

    let state = engine.snapshot();
    assert_eq!(state.results().len(), 2);
    assert!(!state.is_loading());
    assert!(state.has_more());
    assert_eq!(state.error(), Some(&err));

    let state = engine.clear_error();
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_failed_first_page_keeps_old_results() {
    let mut data = MockData::new();
    let mut calls = 0;
    data.expect_submit_query()
        .times(2)
        .returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Ok(page(&["a"], 1))
            } else {
                Err(DiscoveryError::Transport("timeout".into()))
            }
        });

    let engine = DiscoveryEngine::new(Arc::new(data), small_pages());
    engine.perform_search().await.unwrap();
    assert!(engine.perform_search().await.is_err());

    let state = engine.snapshot();
    assert_eq!(state.results().len(), 1);
    assert!(!state.is_loading());
    assert!(matches!(state.error(), Some(DiscoveryError::Transport(_))));
}

#[tokio::test]
async fn test_retry_after_failure_succeeds() {
    let mut data = MockData::new();
    let mut calls = 0;
    data.expect_submit_query().returning(move |_, offset, _| {
        calls += 1;
        match calls {
            1 => Ok(page(&["a", "b"], 4)),
            2 => Err(DiscoveryError::Transport("flaky".into())),
            _ => {
                assert_eq!(offset, 2);
                Ok(page(&["c", "d"], 4))
            }
        }
    });

    let engine = DiscoveryEngine::new(Arc::new(data), small_pages());
    engine.perform_search().await.unwrap();
    assert!(engine.load_more().await.is_err());

    let state = engine.load_more().await.unwrap();
    assert_eq!(state.results().len(), 4);
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_denied_location_still_searches() {
    let mut geo = MockGeo::new();
    geo.expect_request_permission()
        .times(1)
        .returning(|| PermissionStatus::Denied);
    geo.expect_current_position().never();

    let data = Arc::new(InMemoryDataService::new(cafe_catalog()));
    let engine = DiscoveryEngine::new(data.clone(), EngineConfig::default())
        .with_geolocation(Arc::new(geo));

    let state = engine.search_near_me(Some(5.0)).await.unwrap();
    assert_eq!(state.location(), LocationStatus::Denied);
    assert_eq!(state.results().len(), 20);
    assert!(state.filters().radius_filter().is_none());
    assert_eq!(data.location_query_count(), 0);
}

#[tokio::test]
async fn test_granted_location_applies_radius() {
    let mut geo = MockGeo::new();
    geo.expect_request_permission()
        .returning(|| PermissionStatus::Granted);
    geo.expect_current_position().returning(|| Ok(TOWN));

    let data = Arc::new(InMemoryDataService::new(cafe_catalog()));
    let engine = DiscoveryEngine::new(data.clone(), EngineConfig::default())
        .with_geolocation(Arc::new(geo));

    let state = engine.search_near_me(None).await.unwrap();
    assert_eq!(state.location(), LocationStatus::Granted(TOWN));
    let radius = state.filters().radius_filter().unwrap();
    assert_eq!(radius.radius_km, 10.0);
    assert_eq!(data.location_query_count(), 1);
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_position_failure_is_reported() {
    let mut geo = MockGeo::new();
    geo.expect_request_permission()
        .returning(|| PermissionStatus::Granted);
    geo.expect_current_position()
        .returning(|| Err(DiscoveryError::LocationUnavailable("gps timeout".into())));

    let data = Arc::new(InMemoryDataService::new(cafe_catalog()));
    let engine = DiscoveryEngine::new(data, EngineConfig::default())
        .with_geolocation(Arc::new(geo));

    let err = engine.locate_user(None).await.unwrap_err();
    assert!(err.is_location_failure());

    let state = engine.snapshot();
    assert_eq!(state.location(), LocationStatus::Unavailable);
    assert_eq!(state.error(), Some(&err));
}

#[tokio::test]
async fn test_denied_after_granted_drops_stale_radius() {
    let mut geo = MockGeo::new();
    let mut asked = 0;
    geo.expect_request_permission().times(2).returning(move || {
        asked += 1;
        if asked == 1 {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        }
    });
    geo.expect_current_position().times(1).returning(|| Ok(TOWN));

    let far = Coordinates::new(48.8566, 2.3522);
    let mut items = cafe_catalog();
    items.extend((0..5).map(|i| ContentItem {
        coordinates: Some(far),
        ..item(&format!("paris-{i}"), i)
    }));
    let engine = DiscoveryEngine::new(
        Arc::new(InMemoryDataService::new(items)),
        EngineConfig::default(),
    )
    .with_geolocation(Arc::new(geo));

    let near = engine.search_near_me(Some(2.0)).await.unwrap();
    assert_eq!(near.filters().radius_filter().map(|r| r.radius_km), Some(2.0));
    assert_eq!(near.total_count(), 55);

    let state = engine.search_near_me(Some(2.0)).await.unwrap();
    assert_eq!(state.location(), LocationStatus::Denied);
    assert!(state.filters().radius_filter().is_none());
    assert_eq!(state.total_count(), 60);
    assert!(matches!(state.error(), Some(DiscoveryError::Permission(_))));
}
