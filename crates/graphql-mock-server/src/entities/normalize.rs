//! Canonical keys for GraphQL requests.
//!
//! Two requests that differ only in formatting must land on the same mock, so
//! both the query text and the variables are reduced to comparable strings
//! before touching the registry.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Introspection field clients such as Apollo inject into every selection set.
const TYPENAME_FIELD: &str = "__typename";

/// Reduce query text to its canonical form.
///
/// Strips every whitespace character, optional argument commas and injected
/// `__typename` selections. Idempotent.
pub fn normalize_query(query: &str) -> String {
    let mut normalized: String = query
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    while normalized.contains(TYPENAME_FIELD) {
        normalized = normalized.replace(TYPENAME_FIELD, "");
    }
    normalized
}

/// Reduce a variables value to its canonical key.
///
/// Absent and `null` variables become [`VariablesKey::Wildcard`]. Anything
/// else is serialized compactly with object keys sorted at every level.
pub fn normalize_variables(variables: Option<&Value>) -> VariablesKey {
    match variables {
        None | Some(Value::Null) => VariablesKey::Wildcard,
        Some(value) => VariablesKey::Exact(sorted(value).to_string()),
    }
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let ordered: BTreeMap<&String, Value> =
                object.iter().map(|(k, v)| (k, sorted(v))).collect();
            let mut map = Map::with_capacity(ordered.len());
            for (key, value) in ordered {
                map.insert(key.clone(), value);
            }
            Value::Object(map)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Canonical form of a query's text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(query: &str) -> Self {
        Self(normalize_query(query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when nothing but an empty selection set is left.
    pub fn is_empty_body(&self) -> bool {
        self.0.is_empty() || self.0 == "{}"
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical form of a request's variables.
///
/// `Wildcard` orders before every `Exact` key, so it is always the first
/// variables entry listed for a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariablesKey {
    /// Matches any variables sent with the query
    Wildcard,
    /// Matches exactly this serialized variables object
    Exact(String),
}

impl VariablesKey {
    pub fn new(variables: Option<&Value>) -> Self {
        normalize_variables(variables)
    }

    /// Key of an explicit empty variables object.
    pub fn empty() -> Self {
        VariablesKey::Exact("{}".to_string())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, VariablesKey::Wildcard)
    }
}

impl fmt::Display for VariablesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariablesKey::Wildcard => f.write_str("*"),
            VariablesKey::Exact(key) => f.write_str(key),
        }
    }
}
