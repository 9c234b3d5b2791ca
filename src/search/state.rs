//! Immutable search-session state and its transitions.
//!
//! Every transition takes `&self` and returns a new state. Requests are
//! split in two halves: a `begin_*` call that returns a [`PageTicket`]
//! describing the fetch, and [`SearchState::commit`] that folds the outcome
//! back in, unless a newer search has bumped the generation in between.

use crate::error::DiscoveryError;
use crate::models::content::{ContentItem, Coordinates};
use crate::models::filters::{FilterCriteria, FilterPatch};
use crate::search::mode::SearchMode;
use crate::search::pagination::{FetchedPage, PageAccumulator};

/// Outcome of the last geolocation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LocationStatus {
    #[default]
    Unknown,
    Granted(Coordinates),
    Denied,
    Unavailable,
}

/// Whether a ticket replaces the result list or extends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    First,
    Next,
}

/// Everything needed to fetch one page and commit it later.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTicket {
    pub generation: u64,
    pub kind: PageKind,
    pub mode: SearchMode,
    pub offset: usize,
    pub page_size: usize,
}

/// Read-only snapshot of a search session.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    filters: FilterCriteria,
    mode: SearchMode,
    results: PageAccumulator,
    searching: bool,
    error: Option<DiscoveryError>,
    location: LocationStatus,
    generation: u64,
    page_size: usize,
}

impl SearchState {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: FilterCriteria::default(),
            mode: SearchMode::default(),
            results: PageAccumulator::default(),
            searching: false,
            error: None,
            location: LocationStatus::Unknown,
            generation: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    /// The mode that produced the current results.
    pub fn mode(&self) -> &SearchMode {
        &self.mode
    }

    pub fn results(&self) -> &[ContentItem] {
        self.results.items()
    }

    pub fn total_count(&self) -> u64 {
        self.results.total_count()
    }

    pub fn has_more(&self) -> bool {
        self.results.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.searching || self.results.is_loading()
    }

    pub fn error(&self) -> Option<&DiscoveryError> {
        self.error.as_ref()
    }

    pub fn location(&self) -> LocationStatus {
        self.location
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Merge a partial filter update. Results are left as they are.
    pub fn with_filters(&self, patch: FilterPatch) -> Self {
        Self {
            filters: self.filters.apply(patch),
            ..self.clone()
        }
    }

    /// Restore default filters and discard results.
    ///
    /// The generation moves forward so any in-flight response is dropped.
    pub fn reset(&self) -> Self {
        Self {
            filters: self.filters.reset(),
            mode: SearchMode::default(),
            results: PageAccumulator::default(),
            searching: false,
            error: None,
            generation: self.generation + 1,
            ..self.clone()
        }
    }

    pub fn with_location(&self, location: LocationStatus) -> Self {
        Self {
            location,
            ..self.clone()
        }
    }

    /// Record a failure without touching the visible results.
    pub fn with_error(&self, error: DiscoveryError) -> Self {
        Self {
            error: Some(error),
            ..self.clone()
        }
    }

    pub fn without_error(&self) -> Self {
        Self {
            error: None,
            ..self.clone()
        }
    }

    /// Start a new search in `mode`, superseding anything in flight.
    ///
    /// The current results stay visible until the first page commits.
    pub fn begin_search(&self, mode: SearchMode) -> (Self, PageTicket) {
        let generation = self.generation + 1;
        let ticket = PageTicket {
            generation,
            kind: PageKind::First,
            mode,
            offset: 0,
            page_size: self.page_size,
        };
        let next = Self {
            results: self.results.settle(),
            searching: true,
            error: None,
            generation,
            ..self.clone()
        };
        (next, ticket)
    }

    /// Start fetching the next page of the current results.
    ///
    /// `None` when the current mode does not paginate, there is nothing more
    /// to load, or a fetch is already in flight.
    pub fn begin_load_more(&self) -> Option<(Self, PageTicket)> {
        if self.searching || !self.mode.paginates() {
            return None;
        }
        let results = self.results.begin_load()?;
        let ticket = PageTicket {
            generation: self.generation,
            kind: PageKind::Next,
            mode: self.mode.clone(),
            offset: results.offset(),
            page_size: self.page_size,
        };
        Some((
            Self {
                results,
                error: None,
                ..self.clone()
            },
            ticket,
        ))
    }

    /// Fold a fetch outcome into the state.
    ///
    /// Returns `None` if the ticket is stale.
    pub fn commit(
        &self,
        ticket: &PageTicket,
        outcome: Result<FetchedPage, DiscoveryError>,
    ) -> Option<Self> {
        if ticket.generation != self.generation {
            return None;
        }

        let next = match (ticket.kind, outcome) {
            (PageKind::First, Ok(page)) => Self {
                mode: ticket.mode.clone(),
                results: PageAccumulator::first_page(page),
                searching: false,
                error: None,
                ..self.clone()
            },
            (PageKind::Next, Ok(page)) => Self {
                results: self.results.clone().merge(page),
                error: None,
                ..self.clone()
            },
            (PageKind::First, Err(err)) => Self {
                searching: false,
                error: Some(err),
                ..self.clone()
            },
            (PageKind::Next, Err(err)) => Self {
                results: self.results.settle(),
                error: Some(err),
                ..self.clone()
            },
        };
        Some(next)
    }
}
