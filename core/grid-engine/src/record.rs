//! FILENAME: core/grid-engine/src/record.rs
//! PURPOSE: The record model (one row of tabular data).
//! CONTEXT: Records arrive as JSON objects inside the collection
//! resource's `_embedded` array. The configured id attribute is
//! normalized to `id` at parse time, and a nested children collection is
//! flattened into the same ordered list: parents always precede their
//! children, and every child carries a weak `parent` back-reference
//! (relation only, never ownership).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record identity, normalized to a string at parse time.
/// JSON ids may arrive as numbers or strings; both normalize to their
/// string form.
pub type RecordId = String;

// ============================================================================
// PARSE OPTIONS
// ============================================================================

/// Controls how raw JSON objects map onto [`Record`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOptions {
    /// The attribute carrying record identity (normalized to `id`).
    pub id_key: String,

    /// The attribute carrying a nested children collection.
    pub children_key: String,

    /// A boolean attribute servers may set to advertise lazily loadable
    /// children (without embedding them).
    pub children_flag_key: String,

    /// The key of the record array inside the envelope's `_embedded`.
    pub result_key: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            id_key: "id".to_string(),
            children_key: "children".to_string(),
            children_flag_key: "hasChildren".to_string(),
            result_key: "items".to_string(),
        }
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// Error type for record / envelope parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The value expected to be a record was not a JSON object.
    NotAnObject,
    /// A record carried no usable id under the configured id key.
    MissingId { key: String },
    /// The envelope lacked `_embedded.<result_key>`.
    MissingEmbedded { key: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::NotAnObject => write!(f, "record is not a JSON object"),
            ParseError::MissingId { key } => {
                write!(f, "record has no usable id under key '{}'", key)
            }
            ParseError::MissingEmbedded { key } => {
                write!(f, "response has no _embedded.{} array", key)
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// RECORD
// ============================================================================

/// One row of tabular data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Normalized identity.
    pub id: RecordId,

    /// Weak back-reference to the id of the record this one is nested
    /// under. Always an id that appears earlier in the flattened order.
    pub parent: Option<RecordId>,

    /// True when the record has (embedded or lazily loadable) children.
    pub has_children: bool,

    /// The record's attributes, id included under the normalized `id` key.
    pub attributes: Map<String, Value>,
}

impl Record {
    /// Creates a record with the given id and no other attributes.
    pub fn new(id: impl Into<RecordId>) -> Self {
        let id = id.into();
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), Value::String(id.clone()));
        Record {
            id,
            parent: None,
            has_children: false,
            attributes,
        }
    }

    /// Creates a record from an attribute map, normalizing the id.
    pub fn from_attributes(attributes: Map<String, Value>) -> Result<Self, ParseError> {
        let opts = ParseOptions::default();
        Record::parse(&Value::Object(attributes), &opts, None)
    }

    /// Parses a single JSON object into a record, without descending into
    /// children. `parent` is the id of the enclosing record, if any.
    pub fn parse(
        value: &Value,
        opts: &ParseOptions,
        parent: Option<&RecordId>,
    ) -> Result<Self, ParseError> {
        let object = value.as_object().ok_or(ParseError::NotAnObject)?;

        let id = object
            .get(&opts.id_key)
            .and_then(normalize_id)
            .ok_or_else(|| ParseError::MissingId {
                key: opts.id_key.clone(),
            })?;

        let mut attributes = Map::new();
        for (key, attr) in object {
            if key == &opts.children_key {
                continue;
            }
            if key == &opts.id_key {
                // Normalize the configured id attribute to `id`.
                attributes.insert("id".to_string(), attr.clone());
                continue;
            }
            attributes.insert(key.clone(), attr.clone());
        }

        let flagged = object
            .get(&opts.children_flag_key)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let embedded = object
            .get(&opts.children_key)
            .and_then(Value::as_array)
            .map(|children| !children.is_empty())
            .unwrap_or(false);

        Ok(Record {
            id,
            parent: parent.cloned(),
            has_children: flagged || embedded,
            attributes,
        })
    }

    /// Retrieves an attribute value.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Sets an attribute value.
    pub fn set(&mut self, attribute: impl Into<String>, value: Value) {
        self.attributes.insert(attribute.into(), value);
    }

    /// True when the record has no children (selectable under a leaf-only
    /// selection policy).
    pub fn is_leaf(&self) -> bool {
        !self.has_children
    }

    /// Recursively merges `patch` into the record's attributes: nested
    /// objects merge key by key, everything else is replaced.
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (key, incoming) in patch {
            match self.attributes.get_mut(key) {
                Some(existing) => merge_value(existing, incoming),
                None => {
                    self.attributes.insert(key.clone(), incoming.clone());
                }
            }
        }
    }
}

/// Recursive merge helper: objects merge key by key, all other values
/// replace the destination.
fn merge_value(dst: &mut Value, src: &Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (key, incoming) in src_map {
                match dst_map.get_mut(key) {
                    Some(existing) => merge_value(existing, incoming),
                    None => {
                        dst_map.insert(key.clone(), incoming.clone());
                    }
                }
            }
        }
        (dst, src) => *dst = src.clone(),
    }
}

/// Normalizes a JSON id value (string or number) to its string form.
pub fn normalize_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// TREE FLATTENING
// ============================================================================

/// Flattens a JSON array of (possibly nested) record objects into an
/// ordered record list. Parents precede their children; every non-root
/// record's `parent` equals an id appearing earlier in the output.
pub fn flatten_records(values: &[Value], opts: &ParseOptions) -> Result<Vec<Record>, ParseError> {
    let mut out = Vec::new();
    for value in values {
        flatten_into(value, opts, None, &mut out)?;
    }
    Ok(out)
}

fn flatten_into(
    value: &Value,
    opts: &ParseOptions,
    parent: Option<&RecordId>,
    out: &mut Vec<Record>,
) -> Result<(), ParseError> {
    let record = Record::parse(value, opts, parent)?;
    let id = record.id.clone();
    out.push(record);

    if let Some(children) = value
        .as_object()
        .and_then(|o| o.get(&opts.children_key))
        .and_then(Value::as_array)
    {
        for child in children {
            flatten_into(child, opts, Some(&id), out)?;
        }
    }
    Ok(())
}
