//! Filter and sort descriptors plus the per-view query state machine.
//!
//! # Design
//! - Descriptors are plain values; view modes are derived from them and never stored.
//! - Every transition returns the page request it implies, so callers issue exactly one fetch.
//! - Equality between filters compares attribute and predicate, so two text searches with
//!   different queries are still "the same kind" of filter via [`FilterDescriptor::is_search`].

use patchflow_api_models::ApprovalStatus;
use serde::Serialize;

/// Attribute a filter predicate applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAttribute {
    /// Free-text match over the searchable fields.
    Text,
    /// Review outcome of the item.
    ApprovalStatus,
}

/// Value predicate of a filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValueMatch {
    /// Matches every item.
    Any,
    /// Attribute contains the given text.
    Contains(String),
    /// Attribute equals the given status.
    Equals(ApprovalStatus),
    /// Attribute differs from the given status.
    NotEquals(ApprovalStatus),
}

/// Server-side filter applied to a list query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FilterDescriptor {
    /// Attribute to filter on; `None` means unfiltered.
    pub attribute: Option<FilterAttribute>,
    /// Predicate over the attribute.
    pub value_matches: ValueMatch,
}

impl Default for FilterDescriptor {
    fn default() -> Self {
        Self::unfiltered()
    }
}

impl FilterDescriptor {
    /// Filter matching every item.
    #[must_use]
    pub const fn unfiltered() -> Self {
        Self {
            attribute: None,
            value_matches: ValueMatch::Any,
        }
    }

    /// Text search for `query`.
    #[must_use]
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            attribute: Some(FilterAttribute::Text),
            value_matches: ValueMatch::Contains(query.into()),
        }
    }

    /// Items that have already been reviewed.
    #[must_use]
    pub const fn history() -> Self {
        Self {
            attribute: Some(FilterAttribute::ApprovalStatus),
            value_matches: ValueMatch::NotEquals(ApprovalStatus::Pending),
        }
    }

    /// Items still awaiting review.
    #[must_use]
    pub const fn to_be_reviewed() -> Self {
        Self {
            attribute: Some(FilterAttribute::ApprovalStatus),
            value_matches: ValueMatch::Equals(ApprovalStatus::Pending),
        }
    }

    /// Whether this is the "to be reviewed" filter.
    #[must_use]
    pub fn is_review_mode(&self) -> bool {
        *self == Self::to_be_reviewed()
    }

    /// Whether this is the "history" filter.
    #[must_use]
    pub fn is_history(&self) -> bool {
        *self == Self::history()
    }

    /// Whether this is a text search, regardless of the query.
    #[must_use]
    pub fn is_search(&self) -> bool {
        self.attribute == Some(FilterAttribute::Text)
    }

    /// Query of a text search.
    #[must_use]
    pub fn search_query(&self) -> Option<&str> {
        match (&self.attribute, &self.value_matches) {
            (Some(FilterAttribute::Text), ValueMatch::Contains(query)) => Some(query),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Server-side sort applied to a list query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub struct SortDescriptor {
    /// Column to sort by; `None` means server default order.
    pub column_key: Option<String>,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortDescriptor {
    /// Sort by `column` in `direction`.
    #[must_use]
    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_key: Some(column.into()),
            direction,
        }
    }

    /// Descriptor after a header click on `column`.
    ///
    /// Clicking the active column flips its direction; a new column starts descending.
    #[must_use]
    pub fn toggled_for(&self, column: &str) -> Self {
        if self.column_key.as_deref() == Some(column) {
            Self {
                column_key: self.column_key.clone(),
                direction: self.direction.flipped(),
            }
        } else {
            Self::by(column, SortDirection::Desc)
        }
    }
}

/// Sort and filter a page was (or will be) fetched with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub struct PageQuery {
    /// Sort descriptor.
    pub sorting: SortDescriptor,
    /// Filter descriptor.
    pub filter: FilterDescriptor,
}

/// A page fetch implied by a query transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Query the page is fetched with.
    pub query: PageQuery,
}

/// Derived presentation mode of a list view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListMode<'a> {
    /// Showing the view's default filter.
    Idle,
    /// Showing a non-default, non-search filter.
    Filtered(&'a FilterDescriptor),
    /// Showing results for a text search.
    Searching(&'a str),
}

/// Result of a filter change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterTransition {
    /// Page to fetch.
    pub request: PageRequest,
    /// Whether the filter changed, which invalidates per-item review outcomes.
    pub filter_changed: bool,
}

/// Current page, sorting and filter of one list view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQueryState {
    current_page: u32,
    sorting: SortDescriptor,
    filter: FilterDescriptor,
    default_filter: FilterDescriptor,
}

impl ListQueryState {
    /// Fresh state on page 0 with `default_filter` active.
    #[must_use]
    pub fn new(default_filter: FilterDescriptor) -> Self {
        Self {
            current_page: 0,
            sorting: SortDescriptor::default(),
            filter: default_filter.clone(),
            default_filter,
        }
    }

    /// Zero-based current page.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Active sort descriptor.
    #[must_use]
    pub const fn sorting(&self) -> &SortDescriptor {
        &self.sorting
    }

    /// Active filter descriptor.
    #[must_use]
    pub const fn filter(&self) -> &FilterDescriptor {
        &self.filter
    }

    /// Filter the view starts with.
    #[must_use]
    pub const fn default_filter(&self) -> &FilterDescriptor {
        &self.default_filter
    }

    /// Query for the current sort and filter.
    #[must_use]
    pub fn query(&self) -> PageQuery {
        PageQuery {
            sorting: self.sorting.clone(),
            filter: self.filter.clone(),
        }
    }

    /// Request for the current page.
    #[must_use]
    pub fn current_request(&self) -> PageRequest {
        self.request_for(self.current_page)
    }

    fn request_for(&self, page: u32) -> PageRequest {
        PageRequest {
            page,
            query: self.query(),
        }
    }

    /// Switch filter and return to page 0.
    pub fn set_filter(&mut self, filter: FilterDescriptor) -> FilterTransition {
        let filter_changed = self.filter != filter;
        self.filter = filter;
        self.current_page = 0;
        FilterTransition {
            request: self.request_for(0),
            filter_changed,
        }
    }

    /// Run a text search; an empty query falls back to the history filter.
    pub fn search(&mut self, query: &str) -> FilterTransition {
        if query.is_empty() {
            return self.set_filter(FilterDescriptor::history());
        }
        self.set_filter(FilterDescriptor::search(query))
    }

    /// Apply a header click on `column`; the current page is kept.
    pub fn sort(&mut self, column: &str) -> PageRequest {
        self.sorting = self.sorting.toggled_for(column);
        self.current_request()
    }

    /// Move to `page` keeping sort and filter.
    pub fn change_page(&mut self, page: u32) -> PageRequest {
        self.current_page = page;
        self.current_request()
    }

    /// Derived mode.
    #[must_use]
    pub fn mode(&self) -> ListMode<'_> {
        if let Some(query) = self.filter.search_query() {
            ListMode::Searching(query)
        } else if self.filter == self.default_filter {
            ListMode::Idle
        } else {
            ListMode::Filtered(&self.filter)
        }
    }

    /// Whether the view shows items awaiting review.
    #[must_use]
    pub fn is_review_mode(&self) -> bool {
        self.filter.is_review_mode()
    }

    /// Whether the view shows search results.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.filter.is_search()
    }
}
