use std::cmp::Ordering;

use crate::models::content::ContentItem;

/// Coupon-priority ordering: active coupon first, then newest, then id ascending.
///
/// The id tie-break makes the order total, so ranking is deterministic.
pub fn ranking_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.coupon_active
        .cmp(&a.coupon_active)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order a candidate set by the ranking policy.
///
/// Applied identically to every search mode.
pub fn rank(mut items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.sort_by(ranking_order);
    items
}

/// Returns `true` if `items` is already in ranking order.
pub fn is_ranked(items: &[ContentItem]) -> bool {
    items
        .windows(2)
        .all(|pair| ranking_order(&pair[0], &pair[1]) != Ordering::Greater)
}
