use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::FindOptions;

use crate::config::MongoConfig;
use crate::error::DiscoveryError;
use crate::models::content::ContentItem;
use crate::services::data_service::{
    ContentQuery, DataService, Predicate, QueryResult, SortKey, DEFAULT_SORT,
};

/// MongoDB implementation of the DataService.
///
/// Has no location-aware primitive: radius searches go through the
/// in-process fallback.
pub struct MongoDataService {
    collection: mongodb::Collection<ContentItem>,
}

impl MongoDataService {
    pub fn new(db: &mongodb::Database, collection: &str) -> Self {
        Self {
            collection: db.collection(collection),
        }
    }

    /// Connect using [`MongoConfig`].
    pub async fn connect(config: &MongoConfig) -> Result<Self, DiscoveryError> {
        let client = mongodb::Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| DiscoveryError::Transport(format!("Failed to connect to MongoDB: {e}")))?;
        let db = client.database(&config.database);
        tracing::info!("Connected to MongoDB at {}", config.uri);
        Ok(Self::new(&db, &config.collection))
    }

    async fn find(
        &self,
        filter: Document,
        sort: &[SortKey],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError> {
        let options = FindOptions::builder()
            .sort(sort_document(sort))
            .skip(offset as u64)
            .limit(limit as i64)
            .build();

        let mut cursor = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;

        let mut items = Vec::new();
        while let Some(item) = cursor
            .try_next()
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?
        {
            items.push(item);
        }

        Ok(items)
    }
}

/// Translate a query into a MongoDB filter document.
pub fn filter_document(query: &ContentQuery) -> Document {
    let clauses: Vec<Document> = query.predicates.iter().map(predicate_document).collect();
    if clauses.is_empty() {
        doc! {}
    } else {
        doc! { "$and": clauses }
    }
}

fn predicate_document(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::TextContains(needle) => {
            let pattern = regex::escape(needle);
            doc! {
                "$or": [
                    { "title": { "$regex": &pattern, "$options": "i" } },
                    { "description": { "$regex": &pattern, "$options": "i" } },
                ]
            }
        }
        Predicate::TagsAny(tags) => doc! { "tags": { "$in": tags.clone() } },
        Predicate::BusinessNameEquals(name) => doc! {
            "business_name": { "$regex": format!("^{}$", regex::escape(name)), "$options": "i" }
        },
        Predicate::BusinessNamePrefix(prefix) => doc! {
            "business_name": { "$regex": format!("^{}", regex::escape(prefix)), "$options": "i" }
        },
        Predicate::Category(category) => doc! { "category": category.as_str() },
        Predicate::MinRating(min) => doc! { "rating": { "$gte": f64::from(*min) } },
        Predicate::PriceIn(tiers) => {
            let tiers: Vec<Bson> = tiers.iter().map(|t| Bson::from(t.as_str())).collect();
            doc! { "price_tier": { "$in": tiers } }
        }
        Predicate::CouponActive(active) => doc! { "coupon_active": *active },
    }
}

/// Translate sort keys into a MongoDB sort document.
pub fn sort_document(sort: &[SortKey]) -> Document {
    let mut document = Document::new();
    for key in sort {
        match key {
            SortKey::CouponActiveDesc => document.insert("coupon_active", -1),
            SortKey::CreatedAtDesc => document.insert("created_at", -1),
            SortKey::IdAsc => document.insert("id", 1),
        };
    }
    document
}

#[async_trait]
impl DataService for MongoDataService {
    async fn submit_query(
        &self,
        query: &ContentQuery,
        offset: usize,
        limit: usize,
    ) -> Result<QueryResult, DiscoveryError> {
        let filter = filter_document(query);
        tracing::debug!(%filter, offset, limit, "MongoDB content query");

        let total_count = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(|e| DiscoveryError::Transport(e.to_string()))?;
        let items = self.find(filter, &query.sort, offset, limit).await?;

        Ok(QueryResult { items, total_count })
    }

    async fn submit_tag_query(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<ContentItem>, DiscoveryError> {
        let filter = predicate_document(&Predicate::TagsAny(tags.to_vec()));
        self.find(filter, &DEFAULT_SORT, 0, limit).await
    }
}
