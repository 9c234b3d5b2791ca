use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business category a content item is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Restaurant,
    Cafe,
    Bar,
    Retail,
    Beauty,
    Fitness,
    Services,
    Entertainment,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Restaurant,
        Category::Cafe,
        Category::Bar,
        Category::Retail,
        Category::Beauty,
        Category::Fitness,
        Category::Services,
        Category::Entertainment,
        Category::Other,
    ];

    /// The stored (wire) name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Restaurant => "restaurant",
            Category::Cafe => "cafe",
            Category::Bar => "bar",
            Category::Retail => "retail",
            Category::Beauty => "beauty",
            Category::Fitness => "fitness",
            Category::Services => "services",
            Category::Entertainment => "entertainment",
            Category::Other => "other",
        }
    }

    /// Parse a category from a string (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lowered)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price band of a business, from cheapest to most expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Budget,
    Moderate,
    Upscale,
    Luxury,
}

impl PriceTier {
    pub const ALL: [PriceTier; 4] = [
        PriceTier::Budget,
        PriceTier::Moderate,
        PriceTier::Upscale,
        PriceTier::Luxury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Budget => "budget",
            PriceTier::Moderate => "moderate",
            PriceTier::Upscale => "upscale",
            PriceTier::Luxury => "luxury",
        }
    }

    /// Parse a tier from its name or its dollar-sign form (`$` .. `$$$$`).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "$" => Some(PriceTier::Budget),
            "$$" => Some(PriceTier::Moderate),
            "$$$" => Some(PriceTier::Upscale),
            "$$$$" => Some(PriceTier::Luxury),
            other => Self::ALL.into_iter().find(|t| t.as_str() == other),
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point on the earth's surface, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Engagement counters shown on a feed card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
}

/// A video tied to a business: the unit that is filtered, ranked and paginated.
///
/// Business attributes (name, category, rating, price tier, coordinates) are
/// denormalized onto the item so every predicate can be evaluated against a
/// single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Unique identifier of the video.
    pub id: String,
    /// Identifier of the owning business.
    pub business_ref: String,
    /// Display name of the owning business.
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub category: Option<Category>,
    /// Average business rating, 0..=5.
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub price_tier: Option<PriceTier>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Tags in author order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the business currently runs a discount offer.
    #[serde(default)]
    pub coupon_active: bool,
    pub created_at: DateTime<Utc>,
    /// Location of the owning business, if known.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub engagement: Engagement,
}
