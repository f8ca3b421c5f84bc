//! FILENAME: core/grid-engine/src/config.rs
//! PURPOSE: Grid configuration (what the host decides up front).
//! CONTEXT: A grid is constructed from a collection URL plus the knobs
//! below: parse options, strategy names, column matchings (inline or
//! fetched from a URL), default search fields, selection policy, and
//! free-form options handed through to the strategies.

use serde_json::{Map, Value};

use crate::matching::Matching;
use crate::record::{ParseOptions, RecordId};

/// Where the column matchings come from.
#[derive(Debug, Clone)]
pub enum MatchingSource {
    /// Configured inline.
    Inline(Vec<Matching>),
    /// Fetched from a URL during initialization (a JSON array of
    /// matchings, or an object with a `matchings` array).
    Remote(String),
}

impl Default for MatchingSource {
    fn default() -> Self {
        MatchingSource::Inline(Vec::new())
    }
}

/// Everything a grid needs to know at construction time.
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// The collection resource URL: first load target and save base.
    pub url: String,

    /// Wire mapping (id key, children key, result key).
    pub parse: ParseOptions,

    /// Registered view strategy name, if the grid should render at all.
    pub view: Option<String>,

    /// Registered pagination strategy name.
    pub pagination: Option<String>,

    /// Column matchings, inline or fetched.
    pub matchings: MatchingSource,

    /// Default fields for `searchGrid` when the caller names none.
    pub search_fields: Vec<String>,

    /// Only records without children may be selected.
    pub leaf_only_selection: bool,

    /// Ids selected before the first load.
    pub preselected: Vec<RecordId>,

    /// Fallback page-size limit when no pagination strategy supplies one.
    pub limit: u64,

    /// Free-form options handed to the strategies at initialization.
    pub options: Map<String, Value>,
}

impl GridConfig {
    /// A minimal configuration for the given collection URL.
    pub fn new(url: impl Into<String>) -> Self {
        GridConfig {
            url: url.into(),
            parse: ParseOptions::default(),
            view: None,
            pagination: None,
            matchings: MatchingSource::default(),
            search_fields: Vec::new(),
            leaf_only_selection: false,
            preselected: Vec::new(),
            limit: 10,
            options: Map::new(),
        }
    }
}
