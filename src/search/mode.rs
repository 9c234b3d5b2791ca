use crate::models::content::{Category, Coordinates};
use crate::models::filters::FilterCriteria;

/// Every way a result set can be produced.
///
/// All modes go through the same ranking policy. Only [`SearchMode::General`]
/// paginates: the narrow modes issue a single query and replace the result
/// set with `has_more = false`.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    /// Full predicate composition from the filter state.
    General(FilterCriteria),
    /// Items whose tags intersect the set.
    TagOnly(Vec<String>),
    /// Items whose business name starts with the given text.
    NameOnly(String),
    /// Items with an active coupon, optionally within one category.
    CouponOnly(Option<Category>),
    /// Items within a radius of a point.
    LocationOnly { center: Coordinates, radius_km: f64 },
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::General(FilterCriteria::default())
    }
}

impl SearchMode {
    /// Whether `load_more` can extend results produced by this mode.
    pub fn paginates(&self) -> bool {
        matches!(self, SearchMode::General(_))
    }

    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            SearchMode::General(_) => "general",
            SearchMode::TagOnly(_) => "tags",
            SearchMode::NameOnly(_) => "business_name",
            SearchMode::CouponOnly(_) => "coupons",
            SearchMode::LocationOnly { .. } => "location",
        }
    }
}
