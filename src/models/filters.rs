use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::DiscoveryError;
use crate::models::content::{Category, Coordinates, PriceTier};

/// Highest accepted rating.
pub const MAX_RATING: f32 = 5.0;

/// Half the earth's circumference: any larger radius covers the whole planet.
pub const MAX_RADIUS_KM: f64 = 20_037.5;

/// The location part of the filter state.
///
/// The radius only takes effect when both `lat` and `lng` are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

impl LocationFilter {
    pub fn new(lat: f64, lng: f64, radius_km: Option<f64>) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            radius_km,
        }
    }

    /// Only a radius, no point. Never filters anything.
    pub fn radius_only(radius_km: f64) -> Self {
        Self {
            radius_km: Some(radius_km),
            ..Self::default()
        }
    }

    pub fn point(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    fn normalized(self) -> Self {
        let point = match (self.lat, self.lng) {
            (None, None) => None,
            (Some(lat), Some(lng)) => validate_point(Coordinates::new(lat, lng))
                .map(Some)
                .unwrap_or_else(absorb(None)),
            _ => absorb(None)(DiscoveryError::Validation(
                "location needs both latitude and longitude".into(),
            )),
        };
        let radius_km = self
            .radius_km
            .and_then(|r| validate_radius(r).map(Some).unwrap_or_else(absorb(None)));

        Self {
            lat: point.map(|p| p.lat),
            lng: point.map(|p| p.lng),
            radius_km,
        }
    }
}

/// A fully specified radius restriction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub center: Coordinates,
    pub radius_km: f64,
}

/// The current filter predicate set of a search session.
///
/// Values are always normalized: invalid input is clamped or dropped when a
/// [`FilterPatch`] is applied, so a composed query never sees malformed input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterCriteria {
    search_query: String,
    tags: BTreeSet<String>,
    business_name: String,
    category: Option<Category>,
    has_active_coupon: bool,
    location: LocationFilter,
    min_rating: f32,
    price_range: BTreeSet<PriceTier>,
}

impl FilterCriteria {
    /// Build criteria from defaults plus a patch.
    pub fn from_patch(patch: FilterPatch) -> Self {
        Self::default().apply(patch)
    }

    /// Merge `patch` into a copy of `self`. Fields the patch leaves unset are retained.
    pub fn apply(&self, patch: FilterPatch) -> Self {
        let mut next = self.clone();

        if let Some(query) = patch.search_query {
            next.search_query = query.trim().to_string();
        }
        if let Some(tags) = patch.tags {
            next.tags = normalize_tags(tags);
        }
        if let Some(name) = patch.business_name {
            next.business_name = name.trim().to_string();
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(coupon) = patch.has_active_coupon {
            next.has_active_coupon = coupon;
        }
        if let Some(location) = patch.location {
            next.location = location.normalized();
        }
        if let Some(rating) = patch.min_rating {
            next.min_rating = validate_rating(rating).unwrap_or_else(absorb(0.0));
        }
        if let Some(prices) = patch.price_range {
            next.price_range = prices;
        }

        next
    }

    /// Restore the documented defaults.
    pub fn reset(&self) -> Self {
        Self::default()
    }

    /// `true` iff every field equals its default.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_active_filters(&self) -> bool {
        !self.is_empty()
    }

    /// Number of fields that differ from their default.
    pub fn active_filter_count(&self) -> usize {
        [
            !self.search_query.is_empty(),
            !self.tags.is_empty(),
            !self.business_name.is_empty(),
            self.category.is_some(),
            self.has_active_coupon,
            self.location != LocationFilter::default(),
            self.min_rating > 0.0,
            !self.price_range.is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// The radius restriction, present only when lat, lng and radius are all set.
    pub fn radius_filter(&self) -> Option<RadiusFilter> {
        let center = self.location.point()?;
        let radius_km = self.location.radius_km?;
        Some(RadiusFilter { center, radius_km })
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn has_active_coupon(&self) -> bool {
        self.has_active_coupon
    }

    pub fn location(&self) -> &LocationFilter {
        &self.location
    }

    pub fn min_rating(&self) -> f32 {
        self.min_rating
    }

    pub fn price_range(&self) -> &BTreeSet<PriceTier> {
        &self.price_range
    }
}

/// A partial update of [`FilterCriteria`]. `None` fields are left untouched.
///
/// `location` replaces the whole location object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterPatch {
    pub search_query: Option<String>,
    pub tags: Option<Vec<String>>,
    pub business_name: Option<String>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<Category>>,
    pub has_active_coupon: Option<bool>,
    pub location: Option<LocationFilter>,
    pub min_rating: Option<f32>,
    pub price_range: Option<BTreeSet<PriceTier>>,
}

impl FilterPatch {
    pub fn search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn business_name(mut self, name: impl Into<String>) -> Self {
        self.business_name = Some(name.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(Some(category));
        self
    }

    pub fn clear_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    pub fn has_active_coupon(mut self, active: bool) -> Self {
        self.has_active_coupon = Some(active);
        self
    }

    pub fn location(mut self, location: LocationFilter) -> Self {
        self.location = Some(location);
        self
    }

    pub fn near(self, lat: f64, lng: f64, radius_km: f64) -> Self {
        self.location(LocationFilter::new(lat, lng, Some(radius_km)))
    }

    pub fn clear_location(self) -> Self {
        self.location(LocationFilter::default())
    }

    pub fn min_rating(mut self, rating: f32) -> Self {
        self.min_rating = Some(rating);
        self
    }

    pub fn price_range<I: IntoIterator<Item = PriceTier>>(mut self, tiers: I) -> Self {
        self.price_range = Some(tiers.into_iter().collect());
        self
    }
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn validate_rating(rating: f32) -> Result<f32, DiscoveryError> {
    if rating.is_nan() {
        return Err(DiscoveryError::Validation("rating is not a number".into()));
    }
    Ok(rating.clamp(0.0, MAX_RATING))
}

fn validate_radius(radius_km: f64) -> Result<f64, DiscoveryError> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(DiscoveryError::Validation(format!(
            "radius must be a positive distance, got {radius_km}"
        )));
    }
    Ok(radius_km.min(MAX_RADIUS_KM))
}

fn validate_point(point: Coordinates) -> Result<Coordinates, DiscoveryError> {
    if point.is_valid() {
        Ok(point)
    } else {
        Err(DiscoveryError::Validation(format!(
            "coordinates out of range: ({}, {})",
            point.lat, point.lng
        )))
    }
}

/// Swallow a validation error, log it and fall back to `default`.
fn absorb<T>(default: T) -> impl FnOnce(DiscoveryError) -> T {
    move |err| {
        tracing::debug!("Dropping invalid filter input: {err}");
        default
    }
}
