//! FILENAME: core/grid-engine/src/lib.rs
//! PURPOSE: Main library entry point for the grid engine.
//! CONTEXT: This crate turns a remote (or in-memory) record collection
//! into an interactively browsable, sortable, paginated, selectable, and
//! optionally inline-editable view. It is decoupled from any concrete
//! rendering technology: presentation is delegated to pluggable View and
//! Pagination strategies, and all I/O goes through a transport trait.
//!
//! Layers:
//! - `record` / `record_set` / `links`: the data model (what we hold)
//! - `matching` / `sort` / `selection`: per-grid state (what we track)
//! - `strategy` / `events`: the host contract (what we show and signal)
//! - `transport` / `controller` / `editor`: orchestration (what we do)

pub mod config;
pub mod controller;
pub mod editor;
pub mod events;
pub mod links;
pub mod matching;
pub mod record;
pub mod record_set;
pub mod selection;
pub mod sort;
pub mod strategy;
pub mod transport;

// Re-export commonly used types at the crate root
pub use config::{GridConfig, MatchingSource};
pub use controller::{GridController, GridError, SaveError};
pub use editor::{FlushOutcome, FocusOutcome, InlineEditor, RowEditState};
pub use events::{EventBus, GridEvent};
pub use links::{LinkName, Links};
pub use matching::{fields_list, requested_fields, Matching, MatchingKind, ValidationRule};
pub use record::{flatten_records, normalize_id, ParseError, ParseOptions, Record, RecordId};
pub use record_set::RecordSet;
pub use selection::SelectionTracker;
pub use sort::{SortDirection, SortState};
pub use strategy::{
    register_pagination, register_view, resolve_pagination, resolve_view, GridContext,
    PaginationStrategy, StrategyKind, StrategyResolutionError, ViewCapabilities, ViewStrategy,
};
pub use transport::{HttpTransport, Method, Transport, TransportError};
