//! Per-endpoint query strings.

use crate::path::Endpoint;
use std::marker::PhantomData;

/// Ordered query-string parameters for endpoint `E`.
///
/// Values may be stored under any key, but only keys that `E` recognizes
/// are ever serialized, so an option set for one endpoint family cannot
/// leak into the path of another. Empty values are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryString<E: Endpoint> {
    params: Vec<(&'static str, String)>,
    _endpoint: PhantomData<E>,
}

impl<E: Endpoint> QueryString<E> {
    /// Create an empty query string.
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            _endpoint: PhantomData,
        }
    }

    /// Set a parameter, replacing any earlier value under the same key.
    pub(crate) fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
    }

    /// Set a parameter only when a value is present.
    pub(crate) fn set_opt(&mut self, key: &'static str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.set(key, value.to_string());
        }
    }

    /// Get the stored value for `key`, recognized or not.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Serializable pairs, in insertion order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(k, v)| E::PARAMS.contains(k) && !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Whether nothing would be serialized.
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}

impl<E: Endpoint> Default for QueryString<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write consistency required before an operation returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// One shard copy.
    One,
    /// A quorum of shard copies.
    Quorum,
    /// All shard copies.
    All,
}

impl Consistency {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Consistency::One => "one",
            Consistency::Quorum => "quorum",
            Consistency::All => "all",
        }
    }
}

impl std::fmt::Display for Consistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replication {
    /// Wait for replicas.
    Sync,
    /// Return once the primary has the change.
    Async,
}

impl Replication {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Replication::Sync => "sync",
            Replication::Async => "async",
        }
    }
}

impl std::fmt::Display for Replication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a supplied version is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionType {
    /// Version must match the stored version.
    Internal,
    /// Version must be greater than the stored version.
    External,
}

impl VersionType {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Internal => "internal",
            VersionType::External => "external",
        }
    }
}

impl std::fmt::Display for VersionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{Bulk, CreateIndex};

    #[test]
    fn test_only_recognized_keys_serialize() {
        let mut query = QueryString::<Bulk>::new();
        query.set("refresh", "true");
        query.set("version", "3");
        query.set("consistency", Consistency::Quorum.as_str());

        assert_eq!(
            query.pairs(),
            vec![
                ("refresh".to_string(), "true".to_string()),
                ("consistency".to_string(), "quorum".to_string()),
            ]
        );
        assert_eq!(query.get("version"), Some("3"));
    }

    #[test]
    fn test_create_index_recognizes_nothing_from_bulk() {
        let mut query = QueryString::<CreateIndex>::new();
        query.set("refresh", "true");
        query.set("consistency", "all");

        assert!(query.pairs().is_empty());
        assert!(query.is_empty());
    }

    #[test]
    fn test_set_replaces_and_empty_values_are_omitted() {
        let mut query = QueryString::<Bulk>::new();
        query.set("refresh", "true");
        query.set("refresh", "false");
        query.set("replication", "");

        assert_eq!(
            query.pairs(),
            vec![("refresh".to_string(), "false".to_string())]
        );
    }

    #[test]
    fn test_set_opt() {
        let mut query = QueryString::<Bulk>::new();
        query.set_opt("refresh", None::<bool>);
        assert!(query.is_empty());
        query.set_opt("refresh", Some(true));
        assert_eq!(query.get("refresh"), Some("true"));
    }
}
