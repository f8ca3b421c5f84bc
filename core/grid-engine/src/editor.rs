//! FILENAME: core/grid-engine/src/editor.rs
//! PURPOSE: The inline-edit save protocol (per-row state machine).
//! CONTEXT: Inline editing runs one row at a time through
//! `Clean -> Focused -> Dirty -> Saving -> Clean | Error`. Entering
//! `Focused` snapshots the row's field values; dirtiness is live values
//! differing from that snapshot. The machine is pure: it never performs
//! the save itself, it tells the host what to do (`FlushOutcome::Save`)
//! and is informed of the outcome (`save_succeeded`/`save_failed`).

use serde_json::{Map, Value};

use crate::matching::Matching;
use crate::record::RecordId;

/// The per-row edit states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowEditState {
    /// No row under edit.
    #[default]
    Clean,
    /// A row is focused, values match the snapshot.
    Focused,
    /// Live values differ from the snapshot.
    Dirty,
    /// A save is in flight.
    Saving,
    /// The last save failed; attempted values are retained.
    Error,
}

/// Result of a focus request.
#[derive(Debug, Clone, PartialEq)]
pub enum FocusOutcome {
    /// The row is now focused.
    Focused,
    /// Another row has pending changes (or an in-flight save); the host
    /// must flush it through the save path before focusing this one.
    FlushPending { row: Option<RecordId> },
}

/// Result of flushing the focused row.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    /// Nothing changed; the row silently returned to `Clean` with no
    /// save attempt.
    NoChanges,
    /// A local validation rule blocks the save. The row stays dirty.
    ValidationFailed { field: String, message: String },
    /// Changed fields to save. `id` is present for updates, absent for
    /// row creation. The machine is now `Saving`.
    Save {
        id: Option<RecordId>,
        data: Map<String, Value>,
    },
}

/// The inline editor. Only one row may be focused or dirty at a time.
#[derive(Debug, Default)]
pub struct InlineEditor {
    state: RowEditState,
    row_id: Option<RecordId>,
    snapshot: Map<String, Value>,
    live: Map<String, Value>,
    error_field: Option<String>,
    matchings: Vec<Matching>,
}

impl InlineEditor {
    /// Creates an editor validating against the given column matchings.
    pub fn new(matchings: Vec<Matching>) -> Self {
        InlineEditor {
            matchings,
            ..Default::default()
        }
    }

    pub fn state(&self) -> RowEditState {
        self.state
    }

    /// The row currently under edit (`None` in `Clean`, or when editing a
    /// brand-new row).
    pub fn current_row(&self) -> Option<&RecordId> {
        self.row_id.as_ref()
    }

    /// The field the server blamed for the last failed save.
    pub fn error_field(&self) -> Option<&str> {
        self.error_field.as_deref()
    }

    /// The live (possibly unsaved) field values.
    pub fn live_values(&self) -> &Map<String, Value> {
        &self.live
    }

    /// Focuses a row, snapshotting its current field values. Pass
    /// `id = None` to edit a brand-new row. If another row still has
    /// pending changes (or a save in flight), the request is refused and
    /// the host must flush first.
    pub fn focus_row(
        &mut self,
        id: Option<RecordId>,
        values: Map<String, Value>,
    ) -> FocusOutcome {
        let same_row = id == self.row_id && self.state != RowEditState::Clean;
        let pending = matches!(
            self.state,
            RowEditState::Dirty | RowEditState::Saving | RowEditState::Error
        );
        if pending && !same_row {
            return FocusOutcome::FlushPending {
                row: self.row_id.clone(),
            };
        }
        if same_row {
            return FocusOutcome::Focused;
        }

        self.row_id = id;
        self.snapshot = values.clone();
        self.live = values;
        self.error_field = None;
        self.state = RowEditState::Focused;
        FocusOutcome::Focused
    }

    /// Updates one live field value and recomputes dirtiness against the
    /// snapshot. Ignored when no row is focused or a save is in flight.
    pub fn update_field(&mut self, attribute: &str, value: Value) {
        match self.state {
            RowEditState::Clean | RowEditState::Saving => return,
            RowEditState::Focused | RowEditState::Dirty | RowEditState::Error => {}
        }

        self.live.insert(attribute.to_string(), value);
        self.error_field = None;
        self.state = if self.changed_fields().is_empty() {
            RowEditState::Focused
        } else {
            RowEditState::Dirty
        };
    }

    /// Flushes the focused row: an unchanged row returns to `Clean` with
    /// no save attempt; a validation failure blocks the save; otherwise
    /// the changed fields are handed to the host and the machine enters
    /// `Saving`.
    pub fn flush(&mut self) -> FlushOutcome {
        match self.state {
            RowEditState::Clean | RowEditState::Saving => return FlushOutcome::NoChanges,
            RowEditState::Focused => {
                self.reset();
                return FlushOutcome::NoChanges;
            }
            RowEditState::Dirty | RowEditState::Error => {}
        }

        let data = self.changed_fields();
        if data.is_empty() {
            self.reset();
            return FlushOutcome::NoChanges;
        }

        if let Some((field, message)) = self.first_validation_failure() {
            return FlushOutcome::ValidationFailed { field, message };
        }

        self.state = RowEditState::Saving;
        FlushOutcome::Save {
            id: self.row_id.clone(),
            data,
        }
    }

    /// The save resolved; the server's canonical record is authoritative
    /// and has been merged by the caller. The machine returns to `Clean`.
    pub fn save_succeeded(&mut self) {
        self.reset();
    }

    /// The save failed. The offending field (when the server named one)
    /// is pinned and the attempted values are retained, not reverted.
    pub fn save_failed(&mut self, field: Option<String>) {
        self.error_field = field;
        self.state = RowEditState::Error;
    }

    /// Fields whose live value differs from the snapshot.
    fn changed_fields(&self) -> Map<String, Value> {
        let mut changed = Map::new();
        for (key, value) in &self.live {
            if self.snapshot.get(key) != Some(value) {
                changed.insert(key.clone(), value.clone());
            }
        }
        changed
    }

    /// First editable column whose validation rule rejects its live value.
    fn first_validation_failure(&self) -> Option<(String, String)> {
        for matching in &self.matchings {
            if !matching.editable {
                continue;
            }
            if let Some(rule) = &matching.validation {
                if let Err(message) = rule.check(self.live.get(&matching.attribute)) {
                    return Some((matching.attribute.clone(), message));
                }
            }
        }
        None
    }

    fn reset(&mut self) {
        self.state = RowEditState::Clean;
        self.row_id = None;
        self.snapshot = Map::new();
        self.live = Map::new();
        self.error_field = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::ValidationRule;
    use serde_json::json;

    fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn editor_with_required_name() -> InlineEditor {
        let mut name = Matching::new("name", "Name");
        name.editable = true;
        name.validation = Some(ValidationRule {
            required: true,
            message: Some("name is required".to_string()),
            ..Default::default()
        });
        InlineEditor::new(vec![name])
    }

    #[test]
    fn test_focus_snapshots_and_unchanged_flush_is_silent() {
        let mut editor = InlineEditor::new(Vec::new());
        let outcome = editor.focus_row(
            Some("7".to_string()),
            values(&[("name", json!("x"))]),
        );
        assert_eq!(outcome, FocusOutcome::Focused);
        assert_eq!(editor.state(), RowEditState::Focused);

        assert_eq!(editor.flush(), FlushOutcome::NoChanges);
        assert_eq!(editor.state(), RowEditState::Clean);
    }

    #[test]
    fn test_edit_back_to_snapshot_is_not_dirty() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(Some("7".to_string()), values(&[("name", json!("x"))]));

        editor.update_field("name", json!("y"));
        assert_eq!(editor.state(), RowEditState::Dirty);

        editor.update_field("name", json!("x"));
        assert_eq!(editor.state(), RowEditState::Focused);
    }

    #[test]
    fn test_flush_saves_changed_fields_only() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(
            Some("7".to_string()),
            values(&[("name", json!("x")), ("note", json!("keep"))]),
        );
        editor.update_field("name", json!("y"));

        match editor.flush() {
            FlushOutcome::Save { id, data } => {
                assert_eq!(id, Some("7".to_string()));
                assert_eq!(data.len(), 1);
                assert_eq!(data.get("name"), Some(&json!("y")));
            }
            other => panic!("expected Save, got {:?}", other),
        }
        assert_eq!(editor.state(), RowEditState::Saving);
    }

    #[test]
    fn test_validation_blocks_save() {
        let mut editor = editor_with_required_name();
        editor.focus_row(Some("7".to_string()), values(&[("name", json!("x"))]));
        editor.update_field("name", json!(""));

        assert_eq!(
            editor.flush(),
            FlushOutcome::ValidationFailed {
                field: "name".to_string(),
                message: "name is required".to_string(),
            }
        );
        assert_eq!(editor.state(), RowEditState::Dirty);
    }

    #[test]
    fn test_failed_save_pins_field_and_retains_values() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(Some("7".to_string()), values(&[("name", json!("x"))]));
        editor.update_field("name", json!("y"));
        editor.flush();

        editor.save_failed(Some("name".to_string()));
        assert_eq!(editor.state(), RowEditState::Error);
        assert_eq!(editor.error_field(), Some("name"));
        assert_eq!(editor.live_values().get("name"), Some(&json!("y")));

        // Correcting the field clears the pin and re-dirties the row.
        editor.update_field("name", json!("z"));
        assert_eq!(editor.state(), RowEditState::Dirty);
        assert_eq!(editor.error_field(), None);
    }

    #[test]
    fn test_successful_save_returns_to_clean() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(Some("7".to_string()), values(&[("name", json!("x"))]));
        editor.update_field("name", json!("y"));
        editor.flush();

        editor.save_succeeded();
        assert_eq!(editor.state(), RowEditState::Clean);
        assert!(editor.current_row().is_none());
    }

    #[test]
    fn test_focusing_second_row_demands_flush() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(Some("7".to_string()), values(&[("name", json!("x"))]));
        editor.update_field("name", json!("y"));

        let outcome = editor.focus_row(Some("8".to_string()), Map::new());
        assert_eq!(
            outcome,
            FocusOutcome::FlushPending {
                row: Some("7".to_string())
            }
        );
        // The dirty row is untouched.
        assert_eq!(editor.current_row(), Some(&"7".to_string()));
        assert_eq!(editor.state(), RowEditState::Dirty);
    }

    #[test]
    fn test_focusing_clean_second_row_switches() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(Some("7".to_string()), values(&[("name", json!("x"))]));

        let outcome = editor.focus_row(Some("8".to_string()), values(&[("name", json!("z"))]));
        assert_eq!(outcome, FocusOutcome::Focused);
        assert_eq!(editor.current_row(), Some(&"8".to_string()));
    }

    #[test]
    fn test_new_row_flush_has_no_id() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(None, Map::new());
        editor.update_field("name", json!("fresh"));

        match editor.flush() {
            FlushOutcome::Save { id, data } => {
                assert_eq!(id, None);
                assert_eq!(data.get("name"), Some(&json!("fresh")));
            }
            other => panic!("expected Save, got {:?}", other),
        }
    }

    #[test]
    fn test_update_ignored_while_saving() {
        let mut editor = InlineEditor::new(Vec::new());
        editor.focus_row(Some("7".to_string()), Map::new());
        editor.update_field("name", json!("y"));
        editor.flush();

        editor.update_field("name", json!("late"));
        assert_eq!(editor.live_values().get("name"), Some(&json!("y")));
        assert_eq!(editor.state(), RowEditState::Saving);
    }
}
