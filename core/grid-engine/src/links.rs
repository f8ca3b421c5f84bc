//! FILENAME: core/grid-engine/src/links.rs
//! PURPOSE: HATEOAS link map for the collection resource.
//! CONTEXT: The server advertises which operations the current resource
//! supports by naming URI templates in `_links`. Presence of a link gates
//! the corresponding grid capability: no `sortable` link, no sorting.

use std::collections::HashMap;

use link_template::UriTemplate;
use serde_json::Value;

/// The link names the grid understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkName {
    /// The resource itself (reload target).
    SelfLink,
    /// Page navigation, expands `{page, limit}`.
    Pagination,
    /// Sorting, expands `{sortBy, sortOrder}`.
    Sortable,
    /// Column filtering, expands `{fieldsList}`.
    Filter,
    /// Searching, expands `{searchString, searchFields}`.
    Find,
    /// Lazy child loading, expands `{parentId}`.
    Children,
}

impl LinkName {
    /// The name used on the wire inside `_links`.
    pub fn wire_name(self) -> &'static str {
        match self {
            LinkName::SelfLink => "self",
            LinkName::Pagination => "pagination",
            LinkName::Sortable => "sortable",
            LinkName::Filter => "filter",
            LinkName::Find => "find",
            LinkName::Children => "children",
        }
    }

    /// Parses a wire name; unknown links are ignored by the caller.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "self" => Some(LinkName::SelfLink),
            "pagination" => Some(LinkName::Pagination),
            "sortable" => Some(LinkName::Sortable),
            "filter" => Some(LinkName::Filter),
            "find" => Some(LinkName::Find),
            "children" => Some(LinkName::Children),
            _ => None,
        }
    }
}

impl std::fmt::Display for LinkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

/// The advertised links of the current resource.
#[derive(Debug, Clone, Default)]
pub struct Links {
    map: HashMap<LinkName, UriTemplate>,
}

impl Links {
    /// Creates an empty link map (no capabilities).
    pub fn new() -> Self {
        Links::default()
    }

    /// Reads a `_links` object: `{ "<name>": {"href": "<template>"}, ... }`.
    /// Unknown link names and malformed entries are skipped.
    pub fn from_json(value: &Value) -> Self {
        let mut links = Links::new();
        if let Some(object) = value.as_object() {
            for (name, entry) in object {
                let Some(link_name) = LinkName::from_wire(name) else {
                    continue;
                };
                if let Some(href) = entry.get("href").and_then(Value::as_str) {
                    links.insert(link_name, UriTemplate::new(href));
                }
            }
        }
        links
    }

    pub fn insert(&mut self, name: LinkName, template: UriTemplate) {
        self.map.insert(name, template);
    }

    /// Returns the template for a link, if the capability is advertised.
    pub fn get(&self, name: LinkName) -> Option<&UriTemplate> {
        self.map.get(&name)
    }

    /// True when the capability behind `name` is available.
    pub fn has(&self, name: LinkName) -> bool {
        self.map.contains_key(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_reads_known_links() {
        let links = Links::from_json(&json!({
            "self": {"href": "/items"},
            "sortable": {"href": "/items{?sortBy,sortOrder}"},
            "unknown": {"href": "/nope"}
        }));

        assert!(links.has(LinkName::SelfLink));
        assert!(links.has(LinkName::Sortable));
        assert!(!links.has(LinkName::Filter));
        assert_eq!(
            links.get(LinkName::Sortable).unwrap().as_str(),
            "/items{?sortBy,sortOrder}"
        );
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let links = Links::from_json(&json!({"filter": {"url": "/items"}}));
        assert!(!links.has(LinkName::Filter));
        assert!(links.is_empty());
    }
}
