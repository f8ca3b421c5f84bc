//! FILENAME: core/grid-engine/src/strategy.rs
//! PURPOSE: Pluggable View and Pagination strategy contracts + registry.
//! CONTEXT: The engine never renders anything itself. A View strategy
//! turns the record set into a concrete presentation; a Pagination
//! strategy renders page controls and supplies the page-size limit. Both
//! are resolved by name from a process-wide registry that hosts populate
//! before constructing grids. Optional contract methods have safe no-op
//! defaults; a capabilities descriptor gates which controller operations
//! forward to the strategy.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use crate::matching::Matching;
use crate::record::Record;
use crate::record_set::RecordSet;

// ============================================================================
// CONTEXT
// ============================================================================

/// What a strategy gets to see at initialization: the grid's column
/// matchings plus free-form host options.
#[derive(Debug, Clone, Default)]
pub struct GridContext {
    pub matchings: Vec<Matching>,
    pub options: Map<String, Value>,
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// Which optional parts of the view contract a strategy implements.
/// The controller only forwards selection highlighting, incremental
/// add/remove, and resize calls when the corresponding flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewCapabilities {
    pub selection: bool,
    pub add_remove: bool,
    pub resize: bool,
    pub show_selected: bool,
}

// ============================================================================
// VIEW STRATEGY
// ============================================================================

/// Renders a presentation of the record set.
///
/// `initialize`, `render`, and `destroy` are the required core; the rest
/// default to no-ops and are only invoked when `capabilities` announces
/// them.
pub trait ViewStrategy {
    fn initialize(&mut self, ctx: &GridContext);

    /// Renders the record set. Called after every successful load and on
    /// explicit `render()` requests, never for point mutations.
    fn render(&mut self, records: &RecordSet);

    /// Detaches the presentation. After this call the strategy must
    /// tolerate (and ignore) any further method calls.
    fn destroy(&mut self);

    fn capabilities(&self) -> ViewCapabilities {
        ViewCapabilities::default()
    }

    fn on_resize(&mut self, _width: u32, _height: u32) {}

    fn select_record(&mut self, _id: &str) {}
    fn deselect_record(&mut self, _id: &str) {}
    fn deselect_all_records(&mut self) {}

    fn add_record(&mut self, _record: &Record, _at_top: bool) {}
    fn remove_record(&mut self, _id: &str) {}

    /// Restricts the presentation to selected records only.
    fn show_selected(&mut self, _only_selected: bool) {}
}

// ============================================================================
// PAGINATION STRATEGY
// ============================================================================

/// Renders page controls and supplies the page-size limit.
pub trait PaginationStrategy {
    fn initialize(&mut self, ctx: &GridContext);

    /// Renders page controls from the record set's pagination metadata.
    /// Called after loads and after every point mutation.
    fn render(&mut self, records: &RecordSet);

    /// The page-size limit this pagination requests.
    fn limit(&self) -> u64;

    fn destroy(&mut self);

    /// Height consumed by the page controls, if the strategy knows it
    /// (used to budget the remaining viewport for the view strategy).
    fn height(&self) -> Option<u32> {
        None
    }
}

// ============================================================================
// RESOLUTION ERROR
// ============================================================================

/// A strategy name did not resolve against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyResolutionError {
    pub kind: StrategyKind,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    View,
    Pagination,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::View => write!(f, "view"),
            StrategyKind::Pagination => write!(f, "pagination"),
        }
    }
}

impl std::fmt::Display for StrategyResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no {} strategy registered under name '{}'",
            self.kind, self.name
        )
    }
}

impl std::error::Error for StrategyResolutionError {}

// ============================================================================
// REGISTRY
// ============================================================================

type ViewFactory = Box<dyn Fn() -> Box<dyn ViewStrategy> + Send + Sync>;
type PaginationFactory = Box<dyn Fn() -> Box<dyn PaginationStrategy> + Send + Sync>;

static VIEW_REGISTRY: Lazy<RwLock<HashMap<String, ViewFactory>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

static PAGINATION_REGISTRY: Lazy<RwLock<HashMap<String, PaginationFactory>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a view strategy factory under a name. Re-registering a name
/// replaces the previous factory.
pub fn register_view(
    name: impl Into<String>,
    factory: impl Fn() -> Box<dyn ViewStrategy> + Send + Sync + 'static,
) {
    if let Ok(mut registry) = VIEW_REGISTRY.write() {
        registry.insert(name.into(), Box::new(factory));
    }
}

/// Registers a pagination strategy factory under a name.
pub fn register_pagination(
    name: impl Into<String>,
    factory: impl Fn() -> Box<dyn PaginationStrategy> + Send + Sync + 'static,
) {
    if let Ok(mut registry) = PAGINATION_REGISTRY.write() {
        registry.insert(name.into(), Box::new(factory));
    }
}

/// Resolves a view strategy by name.
pub fn resolve_view(name: &str) -> Result<Box<dyn ViewStrategy>, StrategyResolutionError> {
    VIEW_REGISTRY
        .read()
        .ok()
        .and_then(|registry| registry.get(name).map(|factory| factory()))
        .ok_or_else(|| StrategyResolutionError {
            kind: StrategyKind::View,
            name: name.to_string(),
        })
}

/// Resolves a pagination strategy by name.
pub fn resolve_pagination(
    name: &str,
) -> Result<Box<dyn PaginationStrategy>, StrategyResolutionError> {
    PAGINATION_REGISTRY
        .read()
        .ok()
        .and_then(|registry| registry.get(name).map(|factory| factory()))
        .ok_or_else(|| StrategyResolutionError {
            kind: StrategyKind::Pagination,
            name: name.to_string(),
        })
}
