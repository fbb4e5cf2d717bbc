//! Scanning a configuration schema for embedded library references
//!
//! A semantics schema is an ordered array of field descriptors. Descriptors
//! nest: an object may carry further objects in any attribute, or an array of
//! child descriptors under `"fields"`. A child of type `"library"` lists the
//! content types it can embed as `"Name major.minor"` option strings; those
//! are the optional dependencies the resolver has to follow.
//!
//! Traversal uses an explicit work-list rather than call recursion, so stack
//! depth stays bounded on arbitrarily nested schemas.

use indexmap::IndexMap;
use serde_json::Value;

/// A library reference found inside a schema rather than in the manifest's
/// dependency lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalDependency {
    pub name: String,
    pub version: String,
}

/// Collect every optional library reference in a schema, keyed by name.
/// The last occurrence of a name wins. Non-array input yields nothing.
pub fn find_optional_libraries(semantics: &Value) -> IndexMap<String, OptionalDependency> {
    let mut found = IndexMap::new();
    let Some(entries) = semantics.as_array() else {
        return found;
    };

    let mut list: Vec<&Value> = entries.iter().collect();
    while !list.is_empty() {
        let mut next = Vec::new();
        for descriptor in list {
            let Some(attrs) = descriptor.as_object() else {
                continue;
            };
            for (attr, value) in attrs {
                if attr == "fields" && let Some(children) = value.as_array() {
                    for child in children {
                        if let Some(options) = library_options(child) {
                            for option in options {
                                record_option(&mut found, option);
                            }
                        } else {
                            next.push(child);
                        }
                    }
                }
                if value.is_object() {
                    next.push(value);
                }
            }
        }
        list = next;
    }

    found
}

/// The `options` array of a descriptor declaring `type == "library"`, if any.
fn library_options(descriptor: &Value) -> Option<&Vec<Value>> {
    if descriptor.get("type").and_then(Value::as_str) != Some("library") {
        return None;
    }
    descriptor.get("options").and_then(Value::as_array)
}

/// Parse one `"Name version"` option string.
fn record_option(found: &mut IndexMap<String, OptionalDependency>, option: &Value) {
    let Some(text) = option.as_str() else {
        return;
    };
    let mut parts = text.split_whitespace();
    let Some(name) = parts.next() else {
        return;
    };
    let version = parts.next().unwrap_or_default();
    found.insert(
        name.to_string(),
        OptionalDependency {
            name: name.to_string(),
            version: version.to_string(),
        },
    );
}
