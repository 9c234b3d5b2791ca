use std::collections::HashSet;

use crate::models::content::ContentItem;

/// The outcome of fetching one page, whatever strategy produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Ranked page items.
    pub items: Vec<ContentItem>,
    /// Total matches reported by the source, when it knows.
    pub total_count: Option<u64>,
    /// How far the source offset advances past this page.
    pub consumed: usize,
    /// The page was full-sized, so another page may follow.
    pub full: bool,
    /// A bounded radius scan could not fill the page.
    pub partial: bool,
}

impl FetchedPage {
    /// A plain page from a predicate query: the offset advances by what was fetched.
    pub fn from_items(items: Vec<ContentItem>, total_count: Option<u64>, page_size: usize) -> Self {
        Self {
            consumed: items.len(),
            full: items.len() == page_size,
            partial: false,
            total_count,
            items,
        }
    }

    /// A single-shot result that never paginates.
    pub fn terminal(items: Vec<ContentItem>) -> Self {
        Self {
            consumed: items.len(),
            total_count: Some(items.len() as u64),
            full: false,
            partial: false,
            items,
        }
    }

    pub fn empty() -> Self {
        Self::terminal(Vec::new())
    }

    /// Whether the accumulator may ask for another page after this one.
    pub fn has_more(&self) -> bool {
        self.full && !self.partial
    }
}

/// Successive pages merged into one deduplicated, ordered list.
///
/// Merges are first-write-wins: an item whose id is already present is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageAccumulator {
    items: Vec<ContentItem>,
    seen: HashSet<String>,
    offset: usize,
    has_more: bool,
    loading: bool,
    total_count: u64,
}

impl PageAccumulator {
    /// Start a fresh list from a first page.
    pub fn first_page(page: FetchedPage) -> Self {
        Self::default().merge(page)
    }

    /// Append `page`, dropping ids already present, and advance the offset.
    pub fn merge(mut self, page: FetchedPage) -> Self {
        let has_more = page.has_more();
        let consumed = page.consumed;
        let reported_total = page.total_count;

        let mut dropped = 0usize;
        for item in page.items {
            if self.seen.insert(item.id.clone()) {
                self.items.push(item);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped duplicate items while merging a page");
        }

        self.offset += consumed;
        self.has_more = has_more;
        self.loading = false;
        self.total_count = reported_total
            .unwrap_or(self.items.len() as u64)
            .max(self.items.len() as u64);
        self
    }

    /// Mark a page fetch as in flight.
    ///
    /// Returns `None` when there is nothing more to load or a fetch is
    /// already running.
    pub fn begin_load(&self) -> Option<Self> {
        if !self.has_more || self.loading {
            return None;
        }
        Some(Self {
            loading: true,
            ..self.clone()
        })
    }

    /// Mark the in-flight fetch as finished without new items.
    pub fn settle(&self) -> Self {
        Self {
            loading: false,
            ..self.clone()
        }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }
}
