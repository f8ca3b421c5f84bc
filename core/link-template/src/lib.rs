//! FILENAME: core/link-template/src/lib.rs
//! PURPOSE: Main library entry point for link template handling.
//! CONTEXT: Servers advertise their operations as named URI templates
//! (HATEOAS links). This crate expands those templates into concrete
//! request URLs and parses query strings back out of loaded URLs.

pub mod query;
pub mod template;

// Re-export commonly used items at the crate root
pub use query::{decode_component, parse_query, query_param};
pub use template::{encode_component, UriTemplate};
