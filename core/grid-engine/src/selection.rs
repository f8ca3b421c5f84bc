//! FILENAME: core/grid-engine/src/selection.rs
//! PURPOSE: The selection tracker (page-independent selected ids).
//! CONTEXT: Selection outlives the materialized page: selecting a record
//! on page 1, paging away, and coming back keeps it selected. The tracker
//! holds a duplicate-free ordered id list. With leaf-only selection
//! configured, a record known to have children is never admitted; an id
//! whose record is not materialized cannot be checked and is admitted.

use crate::record::{Record, RecordId};

/// Durable, page-independent set of selected record identifiers.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    ids: Vec<RecordId>,
    leaf_only: bool,
}

impl SelectionTracker {
    pub fn new(leaf_only: bool) -> Self {
        SelectionTracker {
            ids: Vec::new(),
            leaf_only,
        }
    }

    /// True when the leaf-only constraint is configured.
    pub fn leaf_only(&self) -> bool {
        self.leaf_only
    }

    /// The selected ids, in selection order.
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    /// Admission check for the leaf-only constraint. `record` is the
    /// materialized record for the id, when the current page has it.
    pub fn admits(&self, record: Option<&Record>) -> bool {
        if !self.leaf_only {
            return true;
        }
        match record {
            Some(record) => record.is_leaf(),
            None => true,
        }
    }

    /// Adds an id. Idempotent: returns true only when the selection
    /// actually changed. The leaf-only constraint is enforced against the
    /// given materialized record.
    pub fn select(&mut self, id: &str, record: Option<&Record>) -> bool {
        if self.is_selected(id) || !self.admits(record) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    /// Removes an id. Returns true only when the selection changed.
    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| selected != id);
        self.ids.len() != before
    }

    /// Clears the selection, returning the ids that were selected.
    pub fn clear(&mut self) -> Vec<RecordId> {
        std::mem::take(&mut self.ids)
    }

    /// Computes the symmetric difference between the current selection and
    /// `target`: the ids whose state must be toggled so the selection
    /// equals `target`. Order: deselections first (in selection order),
    /// then new selections (in target order).
    pub fn symmetric_difference(&self, target: &[RecordId]) -> Vec<RecordId> {
        let mut toggles: Vec<RecordId> = self
            .ids
            .iter()
            .filter(|id| !target.contains(*id))
            .cloned()
            .collect();
        for id in target {
            if !self.is_selected(id) {
                toggles.push(id.clone());
            }
        }
        toggles
    }
}
