//! FILENAME: tests/common/mod.rs
//! Shared test harness: a scripted in-memory transport, recording
//! strategies, an event recorder, and collection-envelope builders.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use grid_engine::{
    GridContext, GridEvent, Method, PaginationStrategy, RecordSet, Transport, TransportError,
    ViewCapabilities, ViewStrategy,
};

// ============================================================================
// SCRIPTED TRANSPORT
// ============================================================================

/// One request the controller issued.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockInner {
    stubs: HashMap<String, Value>,
    failures: HashMap<String, TransportError>,
    send_replies: VecDeque<Result<Value, TransportError>>,
    requests: Vec<LoggedRequest>,
}

/// In-memory transport scripted per URL (GET) and per call order (save).
/// Clones share state, so tests keep a handle for assertions after the
/// controller takes ownership.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Rc<RefCell<MockInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Scripts a successful GET for `url`.
    pub fn stub(&self, url: &str, response: Value) {
        self.inner.borrow_mut().stubs.insert(url.to_string(), response);
    }

    /// Scripts a failing GET for `url`.
    pub fn fail(&self, url: &str, error: TransportError) {
        self.inner
            .borrow_mut()
            .failures
            .insert(url.to_string(), error);
    }

    /// Queues the reply for the next POST/PUT, in call order.
    pub fn reply_to_send(&self, reply: Result<Value, TransportError>) {
        self.inner.borrow_mut().send_replies.push_back(reply);
    }

    /// Every request issued so far.
    pub fn requests(&self) -> Vec<LoggedRequest> {
        self.inner.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.borrow().requests.len()
    }
}

impl Transport for MockTransport {
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(LoggedRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            body: None,
        });
        if let Some(error) = inner.failures.get(url) {
            return Err(error.clone());
        }
        inner
            .stubs
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError {
                status: Some(404),
                message: format!("no stub for {}", url),
                body: None,
            })
    }

    async fn send_json(
        &self,
        method: Method,
        url: &str,
        body: &Value,
    ) -> Result<Value, TransportError> {
        let mut inner = self.inner.borrow_mut();
        inner.requests.push(LoggedRequest {
            method: method.to_string(),
            url: url.to_string(),
            body: Some(body.clone()),
        });
        inner
            .send_replies
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError {
                    status: Some(500),
                    message: "no scripted save reply".to_string(),
                    body: None,
                })
            })
    }
}

// ============================================================================
// RECORDING STRATEGIES
// ============================================================================

/// Call log shared between a test and its registered strategy instances.
/// `Arc<Mutex<_>>` because registry factories must be `Send + Sync`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn log_entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A view strategy that records every contract call it receives and
/// announces selection + add/remove capabilities.
pub struct RecordingView {
    pub calls: CallLog,
}

impl ViewStrategy for RecordingView {
    fn initialize(&mut self, _ctx: &GridContext) {
        self.calls.lock().unwrap().push("initialize".to_string());
    }

    fn render(&mut self, records: &RecordSet) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("render:{}", records.len()));
    }

    fn destroy(&mut self) {
        self.calls.lock().unwrap().push("destroy".to_string());
    }

    fn capabilities(&self) -> ViewCapabilities {
        ViewCapabilities {
            selection: true,
            add_remove: true,
            resize: false,
            show_selected: false,
        }
    }

    fn select_record(&mut self, id: &str) {
        self.calls.lock().unwrap().push(format!("select:{}", id));
    }

    fn deselect_record(&mut self, id: &str) {
        self.calls.lock().unwrap().push(format!("deselect:{}", id));
    }

    fn deselect_all_records(&mut self) {
        self.calls.lock().unwrap().push("deselect_all".to_string());
    }

    fn add_record(&mut self, record: &grid_engine::Record, at_top: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("add:{}:{}", record.id, at_top));
    }

    fn remove_record(&mut self, id: &str) {
        self.calls.lock().unwrap().push(format!("remove:{}", id));
    }
}

/// A view strategy announcing every optional capability, logging resize
/// and show-selected forwarding.
pub struct SizedView {
    pub calls: CallLog,
}

impl ViewStrategy for SizedView {
    fn initialize(&mut self, _ctx: &GridContext) {}
    fn render(&mut self, _records: &RecordSet) {}
    fn destroy(&mut self) {}

    fn capabilities(&self) -> ViewCapabilities {
        ViewCapabilities {
            selection: true,
            add_remove: true,
            resize: true,
            show_selected: true,
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("resize:{}x{}", width, height));
    }

    fn show_selected(&mut self, only_selected: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("show_selected:{}", only_selected));
    }
}

/// A pagination strategy reporting a fixed control height.
pub struct FixedHeightPagination {
    pub limit: u64,
    pub height: u32,
}

impl PaginationStrategy for FixedHeightPagination {
    fn initialize(&mut self, _ctx: &GridContext) {}
    fn render(&mut self, _records: &RecordSet) {}
    fn limit(&self) -> u64 {
        self.limit
    }
    fn destroy(&mut self) {}
    fn height(&self) -> Option<u32> {
        Some(self.height)
    }
}

/// A pagination strategy that records renders and reports a fixed limit.
pub struct RecordingPagination {
    pub calls: CallLog,
    pub limit: u64,
}

impl PaginationStrategy for RecordingPagination {
    fn initialize(&mut self, _ctx: &GridContext) {
        self.calls.lock().unwrap().push("initialize".to_string());
    }

    fn render(&mut self, records: &RecordSet) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("render:page={}", records.page));
    }

    fn limit(&self) -> u64 {
        self.limit
    }

    fn destroy(&mut self) {
        self.calls.lock().unwrap().push("destroy".to_string());
    }
}

// ============================================================================
// EVENT RECORDER
// ============================================================================

/// Collects every event a controller emits.
pub fn record_events(
    controller: &mut grid_engine::GridController<MockTransport>,
) -> Rc<RefCell<Vec<GridEvent>>> {
    let seen: Rc<RefCell<Vec<GridEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    controller.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    seen
}

pub fn has_event(seen: &Rc<RefCell<Vec<GridEvent>>>, wanted: &GridEvent) -> bool {
    seen.borrow().iter().any(|event| event == wanted)
}

// ============================================================================
// ENVELOPE BUILDERS
// ============================================================================

/// Full link set for a collection rooted at `base`.
pub fn all_links(base: &str) -> Value {
    json!({
        "self": {"href": base},
        "pagination": {"href": format!("{}{{?page,limit}}", base)},
        "sortable": {"href": format!("{}{{?sortBy,sortOrder}}", base)},
        "filter": {"href": format!("{}{{?fieldsList}}", base)},
        "find": {"href": format!("{}{{?searchString,searchFields}}", base)},
        "children": {"href": format!("{}/{{parentId}}/children", base)}
    })
}

/// A collection envelope with the given items and full links.
pub fn envelope(base: &str, items: Value, page: u64, pages: u64, total: u64) -> Value {
    json!({
        "_embedded": {"items": items},
        "total": total,
        "page": page,
        "pages": pages,
        "limit": 10,
        "_links": all_links(base)
    })
}

/// Items named `a`..`z` with numeric ids starting at `first_id`.
pub fn items(first_id: u64, names: &[&str]) -> Value {
    let list: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(offset, name)| json!({"id": first_id + offset as u64, "name": name}))
        .collect();
    Value::Array(list)
}
