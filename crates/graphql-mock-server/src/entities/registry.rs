use serde::Serialize;
use std::collections::BTreeMap;

use super::{Limit, MockEntry, QueryKey, VariablesKey};

/// Identifies the mock already occupying a (query, variables) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub query: String,
    pub variables: String,
}

/// Read-only view of one registered mock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MockSummary {
    pub query: String,
    pub variables: String,
    pub limit: Limit,
    pub uses_consumed: u32,
}

/// Store of registered mocks keyed by canonical (query, variables) pairs.
///
/// Ordered so that a query's entries are contiguous, with its wildcard entry
/// first, and so that scans are deterministic.
#[derive(Debug, Default)]
pub struct MockRegistry {
    entries: BTreeMap<(QueryKey, VariablesKey), MockEntry>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `entry` unless the pair is taken, in which case nothing changes
    /// and the occupant is described.
    pub fn register(
        &mut self,
        query: QueryKey,
        variables: VariablesKey,
        mut entry: MockEntry,
    ) -> Option<Conflict> {
        if let Some(existing) = self.entries.get(&(query.clone(), variables.clone())) {
            return Some(Conflict {
                query: existing.short_query(),
                variables: variables.to_string(),
            });
        }
        entry.reset_uses();
        self.entries.insert((query, variables), entry);
        None
    }

    /// Every variables entry registered for `query`, or `None` if the query
    /// was never mocked.
    pub fn lookup_query(&self, query: &QueryKey) -> Option<Vec<(&VariablesKey, &MockEntry)>> {
        let variants: Vec<_> = self
            .entries
            .range((query.clone(), VariablesKey::Wildcard)..)
            .take_while(|((q, _), _)| q == query)
            .map(|((_, v), entry)| (v, entry))
            .collect();
        if variants.is_empty() {
            None
        } else {
            Some(variants)
        }
    }

    /// The entry for the exact pair, falling back to the query's wildcard.
    pub fn lookup(&self, query: &QueryKey, variables: &VariablesKey) -> Option<&MockEntry> {
        self.entries
            .get(&(query.clone(), variables.clone()))
            .or_else(|| self.entries.get(&(query.clone(), VariablesKey::Wildcard)))
    }

    pub(crate) fn lookup_mut(
        &mut self,
        query: &QueryKey,
        variables: &VariablesKey,
    ) -> Option<&mut MockEntry> {
        let exact = (query.clone(), variables.clone());
        let key = if self.entries.contains_key(&exact) {
            exact
        } else {
            (query.clone(), VariablesKey::Wildcard)
        };
        self.entries.get_mut(&key)
    }

    /// Record one successful match.
    pub(crate) fn mark_consumed(entry: &mut MockEntry) {
        entry.mark_consumed();
    }

    /// Describe the first mock with a finite limit that has not been matched
    /// as many times as allowed.
    pub fn find_unused(&self) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, entry)| matches!(entry.limit(), Limit::Times(_)) && !entry.is_exhausted())
            .map(|((_, variables), entry)| entry.describe(variables))
    }

    /// Distinct registered query keys, in order.
    pub fn query_keys(&self) -> Vec<&QueryKey> {
        let mut keys: Vec<&QueryKey> = self.entries.keys().map(|(q, _)| q).collect();
        keys.dedup();
        keys
    }

    pub fn snapshot(&self) -> Vec<MockSummary> {
        self.entries
            .iter()
            .map(|((query, variables), entry)| MockSummary {
                query: query.to_string(),
                variables: variables.to_string(),
                limit: entry.limit(),
                uses_consumed: entry.uses_consumed(),
            })
            .collect()
    }

    pub fn reset_all(&mut self) {
        self.entries = BTreeMap::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Payload;
    use serde_json::json;

    const QUERY: &str = "{queryFoo{}}";

    fn entry(data: serde_json::Value) -> MockEntry {
        MockEntry::new(QUERY, Payload::Single(data), Limit::Times(1))
    }

    fn vars(value: serde_json::Value) -> VariablesKey {
        VariablesKey::new(Some(&value))
    }

    #[test]
    fn test_empty_registry() {
        let registry = MockRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup_query(&QueryKey::new(QUERY)).is_none());
        assert!(registry
            .lookup(&QueryKey::new(QUERY), &vars(json!({"a": 2})))
            .is_none());
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = MockRegistry::new();
        let conflict = registry.register(
            QueryKey::new(QUERY),
            vars(json!({"a": 2})),
            entry(json!({"foo": "bar"})),
        );
        assert!(conflict.is_none());

        let found = registry
            .lookup(&QueryKey::new(QUERY), &vars(json!({"a": 2})))
            .unwrap();
        assert_eq!(found.payload(), &Payload::Single(json!({"foo": "bar"})));
        assert_eq!(found.uses_consumed(), 0);
    }

    #[test]
    fn test_duplicate_is_rejected_without_overwrite() {
        let mut registry = MockRegistry::new();
        registry.register(
            QueryKey::new(QUERY),
            vars(json!({"a": 2})),
            entry(json!({"foo": "bar"})),
        );

        let conflict = registry
            .register(QueryKey::new(QUERY), vars(json!({"a": 2})), entry(json!({})))
            .unwrap();
        assert!(conflict.query.contains(QUERY));
        assert_eq!(conflict.variables, r#"{"a":2}"#);

        let found = registry
            .lookup(&QueryKey::new(QUERY), &vars(json!({"a": 2})))
            .unwrap();
        assert_eq!(found.payload(), &Payload::Single(json!({"foo": "bar"})));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_wildcard_fallback_and_specific_preference() {
        let mut registry = MockRegistry::new();
        let query = QueryKey::new(QUERY);
        registry.register(query.clone(), VariablesKey::Wildcard, entry(json!("any")));
        registry.register(query.clone(), vars(json!({"id": 1})), entry(json!("one")));

        let specific = registry.lookup(&query, &vars(json!({"id": 1}))).unwrap();
        assert_eq!(specific.payload(), &Payload::Single(json!("one")));

        let fallback = registry.lookup(&query, &vars(json!({"id": 2}))).unwrap();
        assert_eq!(fallback.payload(), &Payload::Single(json!("any")));

        let variants = registry.lookup_query(&query).unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants[0].0.is_wildcard());
    }

    #[test]
    fn test_lookup_query_is_scoped_to_query() {
        let mut registry = MockRegistry::new();
        registry.register(QueryKey::new("a"), VariablesKey::Wildcard, entry(json!(1)));
        registry.register(QueryKey::new("ab"), VariablesKey::Wildcard, entry(json!(2)));
        registry.register(QueryKey::new("b"), VariablesKey::empty(), entry(json!(3)));

        assert_eq!(registry.lookup_query(&QueryKey::new("a")).unwrap().len(), 1);
        assert!(registry.lookup_query(&QueryKey::new("c")).is_none());
        assert_eq!(registry.query_keys().len(), 3);
    }

    #[test]
    fn test_find_unused() {
        let mut registry = MockRegistry::new();
        assert!(registry.find_unused().is_none());

        let query = QueryKey::new(QUERY);
        registry.register(query.clone(), VariablesKey::Wildcard, entry(json!({})));
        assert_eq!(registry.find_unused().unwrap(), "{queryFoo{}}... *");

        let found = registry.lookup_mut(&query, &VariablesKey::empty()).unwrap();
        MockRegistry::mark_consumed(found);
        assert!(registry.find_unused().is_none());
    }

    #[test]
    fn test_find_unused_reports_first_of_many() {
        let mut registry = MockRegistry::new();
        for name in ["one", "two"] {
            registry.register(
                QueryKey::new(name),
                VariablesKey::Wildcard,
                MockEntry::new(name, Payload::Single(json!({})), Limit::Times(1)),
            );
        }
        assert_eq!(registry.find_unused().unwrap(), "one... *");
    }

    #[test]
    fn test_find_unused_ignores_unlimited() {
        let mut registry = MockRegistry::new();
        registry.register(
            QueryKey::new("test"),
            VariablesKey::Wildcard,
            MockEntry::new("test", Payload::Single(json!({})), Limit::Unlimited),
        );
        assert!(registry.find_unused().is_none());
    }

    #[test]
    fn test_partially_consumed_is_unused() {
        let mut registry = MockRegistry::new();
        let query = QueryKey::new("test");
        registry.register(
            query.clone(),
            VariablesKey::Wildcard,
            MockEntry::new("test", Payload::Single(json!({})), Limit::Times(2)),
        );
        let found = registry.lookup_mut(&query, &VariablesKey::Wildcard).unwrap();
        MockRegistry::mark_consumed(found);
        assert!(registry.find_unused().is_some());
    }

    #[test]
    fn test_reset_all() {
        let mut registry = MockRegistry::new();
        let query = QueryKey::new(QUERY);
        registry.register(query.clone(), VariablesKey::Wildcard, entry(json!({})));
        registry.reset_all();

        assert!(registry.is_empty());
        assert!(registry.lookup_query(&query).is_none());
        assert!(registry.lookup(&query, &VariablesKey::Wildcard).is_none());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot() {
        let mut registry = MockRegistry::new();
        registry.register(QueryKey::new("{ a }"), vars(json!({"x": 1})), entry(json!({})));
        let snapshot = registry.snapshot();
        assert_eq!(
            snapshot,
            vec![MockSummary {
                query: "{a}".to_string(),
                variables: r#"{"x":1}"#.to_string(),
                limit: Limit::Times(1),
                uses_consumed: 0,
            }]
        );
    }
}
