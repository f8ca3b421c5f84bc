//! FILENAME: core/grid-engine/src/record_set.rs
//! PURPOSE: The record store (the grid's materialized page).
//! CONTEXT: This file defines the `RecordSet` struct holding the ordered
//! working copy of the current page's records, the pagination metadata,
//! and the advertised links. The list order is significant (it drives
//! presentation order); an id -> position side index gives O(1) lookup.
//! The set is replaced wholesale on every successful load and mutated in
//! place by point operations to support optimistic updates after save.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::links::{LinkName, Links};
use crate::record::{flatten_records, ParseError, ParseOptions, Record, RecordId};

/// The authoritative client copy of the current page.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// Order-significant record list.
    records: Vec<Record>,

    /// Side index: record id -> position in `records`.
    /// Kept consistent across every mutation.
    index: HashMap<RecordId, usize>,

    /// Advertised links (capability gates).
    pub links: Links,

    /// Total number of records in the remote collection.
    pub total: u64,

    /// Current page number (1-based).
    pub page: u64,

    /// Total number of pages.
    pub pages: u64,

    /// Page size limit used by the server for this page.
    pub limit: u64,
}

impl RecordSet {
    /// Creates an empty record set with no links.
    pub fn new() -> Self {
        RecordSet::default()
    }

    /// Parses a collection resource response:
    /// `{ "_embedded": {"<resultKey>": [...]}, "total": .., "_links": {..} }`.
    /// Nested children collections are flattened in order.
    pub fn from_json(value: &Value, opts: &ParseOptions) -> Result<Self, ParseError> {
        let embedded = value
            .get("_embedded")
            .and_then(|e| e.get(&opts.result_key))
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::MissingEmbedded {
                key: opts.result_key.clone(),
            })?;

        let records = flatten_records(embedded, opts)?;
        let links = value
            .get("_links")
            .map(Links::from_json)
            .unwrap_or_default();

        let count = records.len() as u64;
        let mut set = RecordSet {
            records,
            index: HashMap::new(),
            links,
            total: read_u64(value, "total").unwrap_or(count),
            page: read_u64(value, "page").unwrap_or(1),
            pages: read_u64(value, "pages").unwrap_or(1),
            limit: read_u64(value, "limit").unwrap_or(count),
        };
        set.rebuild_index();
        Ok(set)
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The ordered record slice.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// O(1) lookup by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Position of a record in presentation order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Returns the template for a link, if advertised.
    pub fn link(&self, name: LinkName) -> Option<&link_template::UriTemplate> {
        self.links.get(name)
    }

    /// True when the capability behind `name` is available.
    pub fn has_link(&self, name: LinkName) -> bool {
        self.links.has(name)
    }

    // ========================================================================
    // POINT MUTATIONS
    // ========================================================================

    /// Appends records at the end. A record whose id is already present
    /// replaces the existing one instead of duplicating it.
    pub fn push(&mut self, records: Vec<Record>) {
        for record in records {
            match self.index.get(&record.id) {
                Some(&pos) => self.records[pos] = record,
                None => {
                    self.index.insert(record.id.clone(), self.records.len());
                    self.records.push(record);
                }
            }
        }
    }

    /// Prepends records at the top, preserving their relative order.
    /// Incoming ids already present move to the front instead of
    /// duplicating.
    pub fn unshift(&mut self, records: Vec<Record>) {
        if records.is_empty() {
            return;
        }
        // Evict existing copies first; positions shift while removing, so
        // look them up against the live list rather than the index.
        for record in &records {
            if let Some(pos) = self.records.iter().position(|r| r.id == record.id) {
                self.records.remove(pos);
            }
        }
        for (offset, record) in records.into_iter().enumerate() {
            self.records.insert(offset, record);
        }
        self.rebuild_index();
    }

    /// Removes a record by id. Returns false when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.index.get(id).copied() {
            Some(pos) => {
                self.records.remove(pos);
                self.rebuild_index();
                true
            }
            None => false,
        }
    }

    /// Recursively merges `patch` into the record with the given id.
    /// Returns false when the id is unknown.
    pub fn merge(&mut self, id: &str, patch: &Map<String, Value>) -> bool {
        match self.index.get(id).copied() {
            Some(pos) => {
                self.records[pos].merge(patch);
                true
            }
            None => false,
        }
    }

    /// Replaces the record with the same id wholesale, preserving its
    /// position. Returns false when the id is unknown.
    pub fn replace(&mut self, record: Record) -> bool {
        match self.index.get(&record.id).copied() {
            Some(pos) => {
                self.records[pos] = record;
                true
            }
            None => false,
        }
    }

    /// Splices records directly after the record with the given id
    /// (used when lazily loaded children arrive). Returns false when the
    /// id is unknown.
    pub fn insert_after(&mut self, id: &str, records: Vec<Record>) -> bool {
        match self.index.get(id).copied() {
            Some(pos) => {
                for (offset, record) in records.into_iter().enumerate() {
                    self.records.insert(pos + 1 + offset, record);
                }
                self.rebuild_index();
                true
            }
            None => false,
        }
    }

    /// Rebuilds the id -> position index by scanning the list.
    /// O(n); called after structural edits that shift positions.
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, record) in self.records.iter().enumerate() {
            self.index.insert(record.id.clone(), pos);
        }
    }
}

fn read_u64(value: &Value, key: &str) -> Option<u64> {
    value.get(key).and_then(Value::as_u64)
}
