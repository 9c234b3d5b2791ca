use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use vitrina::telemetry::init_tracing;
use vitrina::{
    Category, ContentItem, DiscoveryEngine, EngineConfig, FilterCriteria, FilterPatch,
    InMemoryDataService, LocationStatus, PriceTier, SearchState,
};

mod cli;
use cli::{Cli, Commands, SearchArgs};

/// What gets printed after a command runs.
#[derive(Debug, Serialize)]
struct StateView<'a> {
    filters: &'a FilterCriteria,
    active_filters: usize,
    results: &'a [ContentItem],
    total_count: u64,
    has_more: bool,
    is_loading: bool,
    error: Option<String>,
    location: String,
}

impl<'a> From<&'a SearchState> for StateView<'a> {
    fn from(state: &'a SearchState) -> Self {
        Self {
            filters: state.filters(),
            active_filters: state.filters().active_filter_count(),
            results: state.results(),
            total_count: state.total_count(),
            has_more: state.has_more(),
            is_loading: state.is_loading(),
            error: state.error().map(ToString::to_string),
            location: match state.location() {
                LocationStatus::Unknown => "unknown".to_string(),
                LocationStatus::Granted(c) => format!("{},{}", c.lat, c.lng),
                LocationStatus::Denied => "denied".to_string(),
                LocationStatus::Unavailable => "unavailable".to_string(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("vitrina=info")?;
    let cli = Cli::parse();

    let items = match &cli.fixture {
        Some(path) => load_fixture(path)?,
        None => Vec::new(),
    };
    let config = EngineConfig::load(cli.config.as_deref())?;
    tracing::info!(items = items.len(), "Catalog loaded");

    let engine = DiscoveryEngine::new(Arc::new(InMemoryDataService::new(items)), config);
    let state = run(&engine, cli.command).await;

    let view = StateView::from(&state);
    if cli.yaml {
        print!("{}", serde_yaml::to_string(&view)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }

    if let Some(err) = state.error() {
        bail!("search failed: {err}");
    }
    Ok(())
}

/// Run one command. Failures are recorded in the returned state.
async fn run(engine: &DiscoveryEngine, command: Commands) -> SearchState {
    let outcome = match command {
        Commands::Search(args) => search(engine, args).await,
        Commands::Tags { tags } => engine.search_by_tags(tags).await,
        Commands::Business { name } => engine.search_by_business_name(&name).await,
        Commands::Coupons { category } => {
            let category = category.as_deref().and_then(parse_category);
            engine.search_with_active_coupons(category).await
        }
        Commands::Nearby { lat, lng, radius } => {
            engine.search_by_location(lat, lng, radius).await
        }
    };

    if let Err(err) = outcome {
        tracing::debug!("Command finished with error: {err}");
    }
    engine.snapshot()
}

async fn search(
    engine: &DiscoveryEngine,
    args: SearchArgs,
) -> Result<SearchState, vitrina::DiscoveryError> {
    engine.update_filters(patch_from_args(&args));

    let mut state = engine.perform_search().await?;
    for _ in 0..args.pages {
        if !state.has_more() {
            break;
        }
        state = engine.load_more().await?;
    }
    Ok(state)
}

fn patch_from_args(args: &SearchArgs) -> FilterPatch {
    let mut patch = FilterPatch::default();
    if let Some(query) = &args.query {
        patch = patch.search_query(query.as_str());
    }
    if !args.tags.is_empty() {
        patch = patch.tags(args.tags.iter().cloned());
    }
    if let Some(name) = &args.business {
        patch = patch.business_name(name.as_str());
    }
    if let Some(category) = args.category.as_deref().and_then(parse_category) {
        patch = patch.category(category);
    }
    if args.coupon {
        patch = patch.has_active_coupon(true);
    }
    if let Some(rating) = args.min_rating {
        patch = patch.min_rating(rating);
    }
    if !args.prices.is_empty() {
        let tiers: Vec<PriceTier> = args
            .prices
            .iter()
            .filter_map(|p| {
                let tier = PriceTier::from_str_ci(p);
                if tier.is_none() {
                    tracing::warn!("Ignoring unknown price tier {p:?}");
                }
                tier
            })
            .collect();
        patch = patch.price_range(tiers);
    }
    match (args.near.as_deref().and_then(parse_point), args.radius) {
        (Some((lat, lng)), Some(radius)) => patch = patch.near(lat, lng, radius),
        (Some((lat, lng)), None) => {
            patch = patch.location(vitrina::LocationFilter::new(lat, lng, None))
        }
        (None, Some(radius)) => patch = patch.location(vitrina::LocationFilter::radius_only(radius)),
        (None, None) => {}
    }
    patch
}

fn parse_category(value: &str) -> Option<Category> {
    let category = Category::from_str_ci(value);
    if category.is_none() {
        tracing::warn!("Ignoring unknown category {value:?}");
    }
    category
}

fn parse_point(value: &str) -> Option<(f64, f64)> {
    let (lat, lng) = value.split_once(',')?;
    let point = (lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    Some(point)
}

/// Read a catalog, picking the format from the file extension.
fn load_fixture(path: &Path) -> Result<Vec<ContentItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let items = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
        Some("json") => serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        _ => bail!("Unsupported fixture format: {}", path.display()),
    };
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ITEM_JSON: &str = r#"[{
        "id": "v1",
        "business_ref": "b1",
        "business_name": "Café Luna",
        "category": "cafe",
        "title": "Latte art",
        "tags": ["coffee"],
        "coupon_active": true,
        "created_at": "2024-05-01T10:00:00Z",
        "coordinates": {"lat": 4.4389, "lng": -75.2322}
    }]"#;

    fn fixture(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_fixture() {
        let file = fixture(".json", ITEM_JSON);
        let items = load_fixture(file.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, Some(Category::Cafe));
        assert!(items[0].coupon_active);
    }

    #[test]
    fn test_load_yaml_fixture() {
        let yaml = "- id: v2\n  business_ref: b2\n  title: Tacos\n  created_at: 2024-05-01T10:00:00Z\n";
        let file = fixture(".yaml", yaml);
        let items = load_fixture(file.path()).unwrap();
        assert_eq!(items[0].id, "v2");
        assert!(items[0].tags.is_empty());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = fixture(".csv", "id\n");
        assert!(load_fixture(file.path()).is_err());
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("4.43, -75.23"), Some((4.43, -75.23)));
        assert_eq!(parse_point("4.43"), None);
        assert_eq!(parse_point("a,b"), None);
    }

    #[test]
    fn test_patch_from_args() {
        let args = SearchArgs {
            query: Some("latte".into()),
            category: Some("Cafe".into()),
            prices: vec!["$".into(), "nope".into()],
            near: Some("4.4389,-75.2322".into()),
            radius: Some(5.0),
            ..SearchArgs::default()
        };
        let criteria = FilterCriteria::from_patch(patch_from_args(&args));
        assert_eq!(criteria.search_query(), "latte");
        assert_eq!(criteria.category(), Some(Category::Cafe));
        assert_eq!(criteria.price_range().len(), 1);
        assert!(criteria.radius_filter().is_some());
    }

    #[tokio::test]
    async fn test_run_search_loads_extra_pages() {
        let file = fixture(".json", ITEM_JSON);
        let items = load_fixture(file.path()).unwrap();
        let engine = DiscoveryEngine::new(
            Arc::new(InMemoryDataService::new(items)),
            EngineConfig::default(),
        );
        let args = SearchArgs {
            tags: vec!["coffee".into()],
            pages: 2,
            ..SearchArgs::default()
        };
        let state = run(&engine, Commands::Search(args)).await;
        assert_eq!(state.results().len(), 1);
        assert!(!state.has_more());
        assert!(state.error().is_none());
    }
}
