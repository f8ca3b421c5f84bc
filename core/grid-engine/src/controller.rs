//! FILENAME: core/grid-engine/src/controller.rs
//! PURPOSE: The grid controller (lifecycle/load orchestrator).
//! CONTEXT: This is the façade coordinating everything: it owns the
//! record set, the selection tracker, the sort state, the resolved
//! strategies, and the event bus. Loads go out through the transport,
//! responses replace the record set wholesale, point mutations patch it
//! in place. Capability-gated operations (sort/filter/search/children)
//! silently no-op when the server never advertised the link. Nothing in
//! here panics: failures travel as `Result`s and events.

use serde_json::{Map, Value};

use crate::config::{GridConfig, MatchingSource};
use crate::editor::InlineEditor;
use crate::events::{EventBus, GridEvent};
use crate::links::LinkName;
use crate::matching::{fields_list, requested_fields, Matching};
use crate::record::{normalize_id, ParseError, Record, RecordId};
use crate::record_set::RecordSet;
use crate::selection::SelectionTracker;
use crate::sort::{SortDirection, SortState};
use crate::strategy::{
    resolve_pagination, resolve_view, GridContext, PaginationStrategy, ViewStrategy,
};
use crate::transport::{Method, Transport, TransportError};

// ============================================================================
// ERRORS
// ============================================================================

/// A load (or child load) failed.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// The transport reported a failure.
    Transport(TransportError),
    /// The response could not be parsed into a record set.
    Parse(ParseError),
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::Transport(err) => write!(f, "{}", err),
            GridError::Parse(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GridError {}

impl From<TransportError> for GridError {
    fn from(err: TransportError) -> Self {
        GridError::Transport(err)
    }
}

impl From<ParseError> for GridError {
    fn from(err: ParseError) -> Self {
        GridError::Parse(err)
    }
}

/// A save failed. `field` names the offending column when the server
/// reported one; the record set is untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveError {
    pub field: Option<String>,
    pub message: String,
    pub status: Option<u16>,
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "save failed on field '{}': {}", field, self.message),
            None => write!(f, "save failed: {}", self.message),
        }
    }
}

impl std::error::Error for SaveError {}

impl From<TransportError> for SaveError {
    fn from(err: TransportError) -> Self {
        SaveError {
            field: err.field(),
            message: err.message.clone(),
            status: err.status,
        }
    }
}

// ============================================================================
// GRID CONTROLLER
// ============================================================================

/// The grid engine's façade.
///
/// Generic over the transport so hosts plug in HTTP, and tests plug in a
/// scripted in-memory transport. Every load or save takes `&mut self`,
/// which structurally rules out two overlapping loads on one controller;
/// the `is_loading` flag is still exposed so hosts can gate controls.
pub struct GridController<T: Transport> {
    config: GridConfig,
    transport: T,
    records: RecordSet,
    selection: SelectionTracker,
    sort: SortState,
    matchings: Vec<Matching>,
    view: Option<Box<dyn ViewStrategy>>,
    pagination: Option<Box<dyn PaginationStrategy>>,
    events: EventBus,
    is_loading: bool,
}

impl<T: Transport> GridController<T> {
    /// Builds a controller. Nothing is fetched or resolved until
    /// [`initialize`](Self::initialize).
    pub fn new(config: GridConfig, transport: T) -> Self {
        let matchings = match &config.matchings {
            MatchingSource::Inline(matchings) => matchings.clone(),
            MatchingSource::Remote(_) => Vec::new(),
        };
        let selection = SelectionTracker::new(config.leaf_only_selection);

        GridController {
            selection,
            matchings,
            config,
            transport,
            records: RecordSet::new(),
            sort: SortState::unsorted(),
            view: None,
            pagination: None,
            events: EventBus::new(),
            is_loading: false,
        }
    }

    /// Registers an event subscriber.
    pub fn subscribe(&mut self, subscriber: impl Fn(&GridEvent) + 'static) {
        self.events.subscribe(subscriber);
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Resolves strategies and matchings, unions pre-selected ids
    /// (configured plus `extra_selected` from the host), performs the
    /// first load, and emits `Initialized`.
    ///
    /// Strategy resolution failures are logged and non-fatal: the grid
    /// stays viewless but keeps working.
    pub async fn initialize(&mut self, extra_selected: &[RecordId]) -> Result<(), GridError> {
        self.resolve_strategies();
        self.resolve_matchings().await;

        let preselected: Vec<RecordId> = self
            .config
            .preselected
            .iter()
            .chain(extra_selected)
            .cloned()
            .collect();
        for id in preselected {
            self.selection.select(&id, self.records.get(&id));
        }

        self.load(None).await?;
        self.events.emit(&GridEvent::Initialized);
        Ok(())
    }

    fn resolve_strategies(&mut self) {
        let ctx = self.context();

        if let Some(name) = self.config.view.clone() {
            match resolve_view(&name) {
                Ok(mut view) => {
                    view.initialize(&ctx);
                    self.view = Some(view);
                }
                Err(err) => log::error!("{}; grid stays viewless", err),
            }
        }

        if let Some(name) = self.config.pagination.clone() {
            match resolve_pagination(&name) {
                Ok(mut pagination) => {
                    pagination.initialize(&ctx);
                    self.pagination = Some(pagination);
                }
                Err(err) => log::error!("{}; grid renders without page controls", err),
            }
        }
    }

    /// Fetches remote matchings when configured. Failures degrade to an
    /// empty matching set rather than aborting initialization.
    async fn resolve_matchings(&mut self) {
        let url = match &self.config.matchings {
            MatchingSource::Remote(url) => url.clone(),
            MatchingSource::Inline(_) => return,
        };

        match self.transport.fetch_json(&url).await {
            Ok(value) => {
                let list = value
                    .get("matchings")
                    .cloned()
                    .unwrap_or(value);
                match serde_json::from_value::<Vec<Matching>>(list) {
                    Ok(matchings) => self.matchings = matchings,
                    Err(err) => {
                        log::error!("matchings from {} are malformed: {}", url, err);
                    }
                }
            }
            Err(err) => log::error!("failed to fetch matchings from {}: {}", url, err),
        }
    }

    /// Destroys both strategies and drops all event subscribers.
    pub fn destroy(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.destroy();
        }
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.destroy();
        }
        self.view = None;
        self.pagination = None;
        self.events.clear();
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Loads the collection resource (the configured URL when none is
    /// given). On success the record set is replaced wholesale, the sort
    /// state is re-derived from the loaded URL, both strategies
    /// re-render, selection highlighting is restored, and `Loaded` is
    /// emitted. On failure `LoadingFailed` is emitted and the record set
    /// stays untouched.
    pub async fn load(&mut self, url: Option<&str>) -> Result<(), GridError> {
        let url = url.unwrap_or(&self.config.url).to_string();
        self.is_loading = true;

        let fetched = self.transport.fetch_json(&url).await;
        let value = match fetched {
            Ok(value) => value,
            Err(err) => {
                self.is_loading = false;
                log::warn!("load of {} failed: {}", url, err);
                self.events.emit(&GridEvent::LoadingFailed {
                    status: err.status,
                    message: err.message.clone(),
                });
                return Err(err.into());
            }
        };

        match RecordSet::from_json(&value, &self.config.parse) {
            Ok(records) => {
                self.records = records;
                self.sort = SortState::from_url(&url);
                self.render_view();
                self.render_pagination();
                self.restore_selection();
                self.is_loading = false;
                self.events.emit(&GridEvent::Loaded);
                Ok(())
            }
            Err(err) => {
                self.is_loading = false;
                log::warn!("response from {} is not a collection resource: {}", url, err);
                self.events.emit(&GridEvent::LoadingFailed {
                    status: None,
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Navigates to `page`. Out-of-range pages (`page < 1` or
    /// `page > pages`) are silent no-ops: no request is issued. Without
    /// an explicit URL the `pagination` link is expanded with
    /// `{page, limit}`. `PageChanged` is emitted only once the load
    /// resolves.
    pub async fn change_page(
        &mut self,
        url: Option<&str>,
        page: u64,
        limit: u64,
    ) -> Result<(), GridError> {
        if page < 1 || page > self.records.pages {
            log::debug!(
                "page {} out of range 1..={}, ignoring",
                page,
                self.records.pages
            );
            return Ok(());
        }

        let target = match url {
            Some(url) => url.to_string(),
            None => {
                let Some(template) = self.records.link(LinkName::Pagination) else {
                    log::debug!("no pagination link advertised, ignoring page change");
                    return Ok(());
                };
                template.expand(&[
                    ("page", page.to_string().as_str()),
                    ("limit", limit.to_string().as_str()),
                ])
            }
        };

        self.load(Some(&target)).await?;
        self.events.emit(&GridEvent::PageChanged { page });
        Ok(())
    }

    /// Sorts by `attribute`. Requires the `sortable` link; without it the
    /// call is a debug-logged no-op. The sort state is updated
    /// optimistically before the request resolves.
    pub async fn sort_grid(
        &mut self,
        attribute: &str,
        direction: SortDirection,
    ) -> Result<(), GridError> {
        let Some(template) = self.records.link(LinkName::Sortable) else {
            log::debug!("no sortable link advertised, ignoring sort request");
            return Ok(());
        };
        let url = template.expand(&[
            ("sortBy", attribute),
            ("sortOrder", direction.as_str()),
        ]);

        self.sort = SortState::new(attribute, direction);
        self.events.emit(&GridEvent::DataSorted {
            attribute: attribute.to_string(),
            direction,
        });
        self.load(Some(&url)).await
    }

    /// Searches the collection. Requires the `find` link. Falls back to
    /// the configured search fields when the caller names none.
    pub async fn search_grid(
        &mut self,
        search_string: &str,
        search_fields: Option<&[String]>,
    ) -> Result<(), GridError> {
        let Some(template) = self.records.link(LinkName::Find) else {
            log::debug!("no find link advertised, ignoring search request");
            return Ok(());
        };

        let fields = search_fields.unwrap_or(&self.config.search_fields).join(",");
        let mut vars: Vec<(&str, &str)> = vec![("searchString", search_string)];
        if !fields.is_empty() {
            vars.push(("searchFields", fields.as_str()));
        }

        let url = template.expand(&vars);
        self.load(Some(&url)).await
    }

    /// Replaces the column matchings and reloads through the `filter`
    /// link with the recomputed requested-fields list. A disabled id
    /// matching is still forced into the list.
    pub async fn filter_grid(&mut self, matchings: Vec<Matching>) -> Result<(), GridError> {
        let Some(template) = self.records.link(LinkName::Filter) else {
            log::debug!("no filter link advertised, ignoring filter request");
            return Ok(());
        };

        let fields = requested_fields(&matchings, &self.config.parse.id_key);
        let url = template.expand(&[("fieldsList", fields_list(&fields).as_str())]);
        self.matchings = matchings;
        self.load(Some(&url)).await
    }

    /// Lazily loads the children of `parent_id` through the `children`
    /// link and splices them directly after the parent row.
    pub async fn load_children(&mut self, parent_id: &str) -> Result<(), GridError> {
        let Some(template) = self.records.link(LinkName::Children) else {
            log::debug!("no children link advertised, ignoring child load");
            return Ok(());
        };
        if !self.records.contains(parent_id) {
            log::debug!("parent {} is not materialized, ignoring child load", parent_id);
            return Ok(());
        }
        let url = template.expand(&[("parentId", parent_id)]);

        let value = match self.transport.fetch_json(&url).await {
            Ok(value) => value,
            Err(err) => {
                log::warn!("child load of {} failed: {}", url, err);
                self.events.emit(&GridEvent::LoadingFailed {
                    status: err.status,
                    message: err.message.clone(),
                });
                return Err(err.into());
            }
        };

        let children = RecordSet::from_json(&value, &self.config.parse)?;
        let mut records: Vec<Record> = children.records().to_vec();
        for record in &mut records {
            // Roots of the fetched collection hang off the requested parent.
            if record.parent.is_none() {
                record.parent = Some(parent_id.to_string());
            }
        }

        self.records.insert_after(parent_id, records);
        self.render_view();
        self.render_pagination();
        self.restore_selection();
        self.events.emit(&GridEvent::Updated);
        Ok(())
    }

    // ========================================================================
    // SAVING
    // ========================================================================

    /// Saves `data` against the collection: PUT `url/id` when `data`
    /// carries an id (update), POST `url` otherwise (create). On success
    /// the server's canonical record is authoritative: an update replaces
    /// the row in place (order preserved), a create appends it — or
    /// prepends when `unshift` is set. On failure the record set is
    /// untouched and the server-named offending field is surfaced.
    pub async fn save_grid(
        &mut self,
        data: Map<String, Value>,
        url: Option<&str>,
        unshift: bool,
    ) -> Result<Record, SaveError> {
        let base = url.unwrap_or(&self.config.url).trim_end_matches('/').to_string();
        let id = data.get("id").and_then(normalize_id);

        let (method, target) = match &id {
            Some(id) => (Method::Put, format!("{}/{}", base, id)),
            None => (Method::Post, base),
        };

        let body = Value::Object(data);
        let response = match self.transport.send_json(method, &target, &body).await {
            Ok(response) => response,
            Err(err) => {
                let save_err = SaveError::from(err);
                log::warn!("{} {} failed: {}", method, target, save_err);
                self.events.emit(&GridEvent::DataSaveFailed {
                    field: save_err.field.clone(),
                    message: save_err.message.clone(),
                });
                return Err(save_err);
            }
        };

        let record = match Record::parse(&response, &self.config.parse, None) {
            Ok(record) => record,
            Err(err) => {
                let save_err = SaveError {
                    field: None,
                    message: format!("canonical record is unparseable: {}", err),
                    status: None,
                };
                self.events.emit(&GridEvent::DataSaveFailed {
                    field: None,
                    message: save_err.message.clone(),
                });
                return Err(save_err);
            }
        };

        let updating = id.is_some();
        if updating {
            if !self.records.replace(record.clone()) {
                self.records.push(vec![record.clone()]);
            }
        } else if unshift {
            self.records.unshift(vec![record.clone()]);
        } else {
            self.records.push(vec![record.clone()]);
        }

        if !updating {
            if let Some(view) = self.view.as_mut() {
                if view.capabilities().add_remove {
                    view.add_record(&record, unshift);
                }
            }
        }

        self.render_pagination();
        self.events.emit(&GridEvent::DataSaved {
            id: record.id.clone(),
        });
        Ok(record)
    }

    // ========================================================================
    // POINT MUTATIONS
    // ========================================================================

    /// Appends records. Re-renders page controls only.
    pub fn push_records(&mut self, records: Vec<Record>) {
        self.records.push(records);
        self.render_pagination();
        self.events.emit(&GridEvent::Updated);
    }

    /// Prepends records. Re-renders page controls only.
    pub fn unshift_records(&mut self, records: Vec<Record>) {
        self.records.unshift(records);
        self.render_pagination();
        self.events.emit(&GridEvent::Updated);
    }

    /// Removes a record by id. Returns false for unknown ids.
    pub fn remove_record(&mut self, id: &str) -> bool {
        if !self.records.remove(id) {
            return false;
        }
        if let Some(view) = self.view.as_mut() {
            if view.capabilities().add_remove {
                view.remove_record(id);
            }
        }
        self.render_pagination();
        self.events.emit(&GridEvent::Updated);
        true
    }

    /// Recursively merges `patch` into the record with the given id.
    /// Returns false for unknown ids.
    pub fn change_record(&mut self, id: &str, patch: &Map<String, Value>) -> bool {
        if !self.records.merge(id, patch) {
            return false;
        }
        self.render_pagination();
        self.events.emit(&GridEvent::Updated);
        true
    }

    /// Replaces the record with the same id wholesale (position
    /// preserved). Returns false for unknown ids.
    pub fn update_record(&mut self, record: Record) -> bool {
        if !self.records.replace(record) {
            return false;
        }
        self.render_pagination();
        self.events.emit(&GridEvent::Updated);
        true
    }

    /// Structurally re-renders the view strategy and restores selection
    /// highlighting.
    pub fn render(&mut self) {
        self.render_view();
        self.restore_selection();
    }

    /// Forwards a viewport resize to the view strategy, reserving
    /// whatever height the pagination strategy reports for its controls.
    /// Ignored unless the view announces the resize capability.
    pub fn resize(&mut self, width: u32, height: u32) {
        let reserved = self
            .pagination
            .as_ref()
            .and_then(|p| p.height())
            .unwrap_or(0);
        if let Some(view) = self.view.as_mut() {
            if view.capabilities().resize {
                view.on_resize(width, height.saturating_sub(reserved));
            }
        }
    }

    /// Restricts the presentation to selected records only. Ignored
    /// unless the view announces the show-selected capability.
    pub fn show_selected(&mut self, only_selected: bool) {
        if let Some(view) = self.view.as_mut() {
            if view.capabilities().show_selected {
                view.show_selected(only_selected);
            }
        }
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Selects a record. Idempotent: returns true only when the selection
    /// changed. Leaf-only selection rejects records known to have
    /// children.
    pub fn set_item_selected(&mut self, id: &str) -> bool {
        if !self.selection.select(id, self.records.get(id)) {
            return false;
        }
        if let Some(view) = self.view.as_mut() {
            if view.capabilities().selection {
                view.select_record(id);
            }
        }
        self.events.emit(&GridEvent::ItemSelected { id: id.to_string() });
        self.emit_selection_count();
        true
    }

    /// Deselects a record. Returns true only when the selection changed.
    pub fn set_item_unselected(&mut self, id: &str) -> bool {
        if !self.selection.deselect(id) {
            return false;
        }
        if let Some(view) = self.view.as_mut() {
            if view.capabilities().selection {
                view.deselect_record(id);
            }
        }
        self.events.emit(&GridEvent::ItemDeselected { id: id.to_string() });
        self.emit_selection_count();
        true
    }

    /// Toggles a record's selection. Returns the new selected state.
    pub fn toggle_item(&mut self, id: &str) -> bool {
        if self.selection.is_selected(id) {
            self.set_item_unselected(id);
            false
        } else {
            self.set_item_selected(id)
        }
    }

    /// Selects every (admissible) record on the current page.
    pub fn select_all_items(&mut self) {
        let ids: Vec<RecordId> = self.records.iter().map(|r| r.id.clone()).collect();
        for id in ids {
            self.set_item_selected(&id);
        }
        self.events.emit(&GridEvent::AllSelected);
    }

    /// Clears the whole selection (on-page and off-page ids alike).
    pub fn deselect_all_items(&mut self) {
        let cleared = self.selection.clear();
        if let Some(view) = self.view.as_mut() {
            if view.capabilities().selection {
                view.deselect_all_records();
            }
        }
        for id in cleared {
            self.events.emit(&GridEvent::ItemDeselected { id });
        }
        self.events.emit(&GridEvent::AllDeselected);
        self.emit_selection_count();
    }

    /// Makes the selection equal `target` by toggling the symmetric
    /// difference against the current selection.
    pub fn set_selected_items(&mut self, target: &[RecordId]) {
        for id in self.selection.symmetric_difference(target) {
            self.toggle_item(&id);
        }
    }

    pub fn item_is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    /// The selected ids, in selection order (page-independent).
    pub fn selected_ids(&self) -> &[RecordId] {
        self.selection.ids()
    }

    /// Reports a click on a record's presentation.
    pub fn item_clicked(&mut self, id: &str) {
        self.events.emit(&GridEvent::ItemClick { id: id.to_string() });
    }

    // ========================================================================
    // STRATEGY SWAPPING
    // ========================================================================

    /// Swaps the view strategy. An unknown name leaves the grid viewless
    /// (error-logged, like at initialization).
    pub fn change_view(&mut self, name: &str) -> bool {
        if let Some(view) = self.view.as_mut() {
            view.destroy();
        }
        self.view = None;

        match resolve_view(name) {
            Ok(mut view) => {
                view.initialize(&self.context());
                self.view = Some(view);
                self.render_view();
                self.restore_selection();
                true
            }
            Err(err) => {
                log::error!("{}; grid stays viewless", err);
                false
            }
        }
    }

    /// Swaps the pagination strategy.
    pub fn change_pagination(&mut self, name: &str) -> bool {
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.destroy();
        }
        self.pagination = None;

        match resolve_pagination(name) {
            Ok(mut pagination) => {
                pagination.initialize(&self.context());
                self.pagination = Some(pagination);
                self.render_pagination();
                true
            }
            Err(err) => {
                log::error!("{}; grid renders without page controls", err);
                false
            }
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn matchings(&self) -> &[Matching] {
        &self.matchings
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    /// The effective page-size limit: the pagination strategy's answer,
    /// or the configured fallback.
    pub fn limit(&self) -> u64 {
        self.pagination
            .as_ref()
            .map(|p| p.limit())
            .unwrap_or(self.config.limit)
    }

    /// An inline editor validating against the current matchings.
    pub fn editor(&self) -> InlineEditor {
        InlineEditor::new(self.matchings.clone())
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    fn context(&self) -> GridContext {
        GridContext {
            matchings: self.matchings.clone(),
            options: self.config.options.clone(),
        }
    }

    fn render_view(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.render(&self.records);
            self.events.emit(&GridEvent::ViewRendered);
        }
    }

    fn render_pagination(&mut self) {
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.render(&self.records);
        }
    }

    /// Re-applies selection highlighting for selected ids present on the
    /// materialized page.
    fn restore_selection(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if !view.capabilities().selection {
            return;
        }
        for id in self.selection.ids() {
            if self.records.contains(id) {
                view.select_record(id);
            }
        }
    }

    fn emit_selection_count(&self) {
        self.events.emit(&GridEvent::SelectionCount {
            count: self.selection.len(),
        });
    }
}
