//! FILENAME: core/grid-engine/src/matching.rs
//! PURPOSE: Column matchings (display column -> record attribute).
//! CONTEXT: A matching describes one column: which attribute it reads,
//! its display label, rendering hints, and whether it is sortable,
//! editable, or disabled. Matchings drive the requested-fields list sent
//! with filter requests and the local validation applied before inline
//! saves.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// COLUMN KIND
// ============================================================================

/// How a column's values are coerced for display and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchingKind {
    #[default]
    String,
    Number,
    Date,
    Boolean,
}

// ============================================================================
// VALIDATION RULE
// ============================================================================

/// Local validation applied to an editable column before a save attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Regex the string form of the value must match.
    #[serde(default)]
    pub pattern: Option<String>,

    /// The value must be present and non-empty.
    #[serde(default)]
    pub required: bool,

    /// Message surfaced to the host when the rule fails.
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidationRule {
    /// Checks a field value against the rule. Returns the failure message
    /// (rule message or a generated one) when the rule is violated.
    pub fn check(&self, value: Option<&Value>) -> Result<(), String> {
        let text = value.map(value_text).unwrap_or_default();

        if self.required && text.is_empty() {
            return Err(self
                .message
                .clone()
                .unwrap_or_else(|| "value is required".to_string()));
        }

        if let Some(pattern) = &self.pattern {
            if !text.is_empty() {
                // An unparseable pattern is a configuration mistake; it is
                // logged and treated as passing rather than blocking edits.
                match Regex::new(pattern) {
                    Ok(regex) => {
                        if !regex.is_match(&text) {
                            return Err(self.message.clone().unwrap_or_else(|| {
                                format!("value does not match pattern '{}'", pattern)
                            }));
                        }
                    }
                    Err(err) => {
                        log::error!("invalid validation pattern '{}': {}", pattern, err);
                    }
                }
            }
        }

        Ok(())
    }
}

/// String form of a JSON value for validation purposes.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// One column descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matching {
    /// The record attribute this column reads.
    pub attribute: String,

    /// Display label.
    #[serde(default)]
    pub content: String,

    /// Value coercion hint.
    #[serde(default, rename = "type")]
    pub kind: MatchingKind,

    /// Fixed column width hint.
    #[serde(default)]
    pub width: Option<u32>,

    /// Extra presentation class hint.
    #[serde(default)]
    pub class: Option<String>,

    /// The column offers sorting (still gated by the `sortable` link).
    #[serde(default)]
    pub sortable: bool,

    /// The column accepts inline edits.
    #[serde(default)]
    pub editable: bool,

    /// Excluded from rendering and (except for the id field) from the
    /// requested-fields list.
    #[serde(default)]
    pub disabled: bool,

    /// Local validation for inline edits.
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

impl Matching {
    /// Creates an enabled, non-sortable, non-editable string column.
    pub fn new(attribute: impl Into<String>, content: impl Into<String>) -> Self {
        Matching {
            attribute: attribute.into(),
            content: content.into(),
            kind: MatchingKind::String,
            width: None,
            class: None,
            sortable: false,
            editable: false,
            disabled: false,
            validation: None,
        }
    }
}

/// Computes the requested-fields list for filter requests: every enabled
/// matching's attribute, in order. A disabled matching is excluded, but if
/// it names the identifier field it is still forced into the list — the
/// grid cannot address records without their ids.
pub fn requested_fields(matchings: &[Matching], id_field: &str) -> Vec<String> {
    matchings
        .iter()
        .filter(|m| !m.disabled || m.attribute == id_field)
        .map(|m| m.attribute.clone())
        .collect()
}

/// Joins requested fields into the `fieldsList` template variable.
pub fn fields_list(fields: &[String]) -> String {
    fields.join(",")
}
