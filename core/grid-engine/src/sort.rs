//! FILENAME: core/grid-engine/src/sort.rs
//! PURPOSE: Sort state and its round trip through request URLs.
//! CONTEXT: Sorting is requested by expanding the `sortable` link with
//! `{sortBy, sortOrder}`. The state is set optimistically when a sort is
//! issued, reset on generic reloads, and re-derived by parsing the
//! `sortBy`/`sortOrder` parameters back out of whichever URL actually
//! loaded.

use link_template::query_param;
use serde::{Deserialize, Serialize};

/// Sort direction, serialized as `asc`/`desc` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The grid's current sort, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub attribute: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    /// No active sort.
    pub fn unsorted() -> Self {
        SortState::default()
    }

    pub fn new(attribute: impl Into<String>, direction: SortDirection) -> Self {
        SortState {
            attribute: Some(attribute.into()),
            direction: Some(direction),
        }
    }

    /// Re-derives the state from a loaded URL's query parameters.
    /// A URL without both parameters yields the unsorted state.
    pub fn from_url(url: &str) -> Self {
        let attribute = query_param(url, "sortBy");
        let direction = query_param(url, "sortOrder")
            .as_deref()
            .and_then(SortDirection::from_str);

        match (attribute, direction) {
            (Some(attribute), Some(direction)) => SortState::new(attribute, direction),
            _ => SortState::unsorted(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.attribute.is_some() && self.direction.is_some()
    }

    pub fn reset(&mut self) {
        *self = SortState::unsorted();
    }
}
