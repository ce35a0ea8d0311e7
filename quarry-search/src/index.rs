//! Index creation.

use crate::config::ConnectionSettings;
use crate::document::{Document, TypeNameMarker};
use crate::error::Result;
use crate::path::{CreateIndex, HttpMethod, IndexPath, PathInfo};
use crate::resolver::TypeNameResolver;
use crate::transport::TransportRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Index settings for creating indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSettings {
    /// Number of shards.
    pub number_of_shards: Option<u32>,
    /// Number of replicas.
    pub number_of_replicas: Option<u32>,
    /// Analysis settings.
    pub analysis: Option<Value>,
    /// Additional settings; the `index.` prefix is not needed.
    pub settings: Map<String, Value>,
    /// Type mappings in insertion order.
    pub mappings: Vec<(TypeNameMarker, Value)>,
    /// Warmers by name.
    pub warmers: BTreeMap<String, Warmer>,
}

impl IndexSettings {
    /// Create new index settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of shards.
    pub fn shards(mut self, shards: u32) -> Self {
        self.number_of_shards = Some(shards);
        self
    }

    /// Set number of replicas.
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.number_of_replicas = Some(replicas);
        self
    }

    /// Mapping registered for `marker`.
    pub fn mapping(&self, marker: &TypeNameMarker) -> Option<&Value> {
        self.mappings
            .iter()
            .find(|(m, _)| m == marker)
            .map(|(_, mapping)| mapping)
    }

    fn put_mapping(&mut self, marker: TypeNameMarker, mapping: Value) {
        match self.mappings.iter_mut().find(|(m, _)| *m == marker) {
            Some(entry) => entry.1 = mapping,
            None => self.mappings.push((marker, mapping)),
        }
    }

    /// Request body; mapping keys are resolved to type names.
    pub fn to_json(&self, resolver: &TypeNameResolver<'_>) -> Result<Value> {
        let mut body = Map::new();
        let mut settings = self.settings.clone();

        if let Some(shards) = self.number_of_shards {
            settings.insert("number_of_shards".to_string(), json!(shards));
        }
        if let Some(replicas) = self.number_of_replicas {
            settings.insert("number_of_replicas".to_string(), json!(replicas));
        }
        if let Some(analysis) = &self.analysis {
            settings.insert("analysis".to_string(), analysis.clone());
        }

        if !settings.is_empty() {
            body.insert("settings".to_string(), Value::Object(settings));
        }

        if !self.mappings.is_empty() {
            let mut mappings = Map::new();
            for (marker, mapping) in &self.mappings {
                mappings.insert(resolver.type_name(marker)?, mapping.clone());
            }
            body.insert("mappings".to_string(), Value::Object(mappings));
        }

        if !self.warmers.is_empty() {
            let warmers = self
                .warmers
                .iter()
                .map(|(name, warmer)| Ok((name.clone(), serde_json::to_value(warmer)?)))
                .collect::<Result<Map<_, _>>>()?;
            body.insert("warmers".to_string(), Value::Object(warmers));
        }

        Ok(Value::Object(body))
    }
}

/// A search run against new segments before they become searchable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warmer {
    /// Warmer name.
    #[serde(skip)]
    pub name: String,
    /// Types the warmer applies to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    /// Search body.
    pub source: Value,
}

impl Warmer {
    /// Create a warmer running `source`.
    pub fn new(name: impl Into<String>, source: Value) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            source,
        }
    }

    /// Restrict the warmer to a type.
    pub fn of_type(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(type_name.into());
        self
    }
}

/// Descriptor for `POST /{index}`.
#[derive(Debug, Clone)]
pub struct CreateIndexDescriptor {
    settings: Arc<ConnectionSettings>,
    path: IndexPath,
    index_settings: IndexSettings,
}

impl CreateIndexDescriptor {
    /// Create a descriptor.
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self {
            settings,
            path: IndexPath::default(),
            index_settings: IndexSettings::default(),
        }
    }

    /// Name of the index to create.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.path.set_index(index);
        self
    }

    /// Start from existing settings, e.g. those read from another index.
    pub fn initialize_using(mut self, index_settings: IndexSettings) -> Self {
        self.index_settings = index_settings;
        self
    }

    /// Number of shards.
    pub fn number_of_shards(mut self, shards: u32) -> Self {
        self.index_settings.number_of_shards = Some(shards);
        self
    }

    /// Number of replicas.
    pub fn number_of_replicas(mut self, replicas: u32) -> Self {
        self.index_settings.number_of_replicas = Some(replicas);
        self
    }

    /// Free-form setting. Existing keys are kept.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.index_settings
            .settings
            .entry(key.into())
            .or_insert_with(|| value.into());
        self
    }

    /// Analysis settings (tokenizers, filters, analyzers).
    pub fn analysis(mut self, analysis: Value) -> Self {
        self.index_settings.analysis = Some(analysis);
        self
    }

    /// Add or replace the mapping for `T`.
    pub fn add_mapping<T: Document>(self, mapping: Value) -> Self {
        self.add_mapping_for(TypeNameMarker::of::<T>(), mapping)
    }

    /// Add or replace the mapping for `marker`.
    pub fn add_mapping_for(mut self, marker: TypeNameMarker, mapping: Value) -> Self {
        self.index_settings.put_mapping(marker, mapping);
        self
    }

    /// Remove the mapping for `T`.
    pub fn remove_mapping<T: Document>(self) -> Self {
        self.remove_mapping_for(&TypeNameMarker::of::<T>())
    }

    /// Remove the mapping for `marker`.
    pub fn remove_mapping_for(mut self, marker: &TypeNameMarker) -> Self {
        self.index_settings.mappings.retain(|(m, _)| m != marker);
        self
    }

    /// Add a warmer, replacing one with the same name.
    pub fn add_warmer(mut self, warmer: Warmer) -> Self {
        self.index_settings
            .warmers
            .insert(warmer.name.clone(), warmer);
        self
    }

    /// Remove a warmer by name.
    pub fn delete_warmer(mut self, name: &str) -> Self {
        self.index_settings.warmers.remove(name);
        self
    }

    /// Settings accumulated so far.
    pub fn index_settings(&self) -> &IndexSettings {
        &self.index_settings
    }

    /// Resolve the target path.
    pub fn path_info(&self) -> Result<PathInfo<CreateIndex>> {
        self.path.to_path_info(HttpMethod::Post)
    }

    /// Resolve and serialize into a request.
    pub fn to_request(&self) -> Result<TransportRequest> {
        let info = self.path_info()?;
        let resolver = TypeNameResolver::new(&self.settings);
        let body = self.index_settings.to_json(&resolver)?;
        Ok(TransportRequest::new(info.method, info.path()?)
            .with_query(info.query_pairs())
            .with_json(serde_json::to_string(&body)?))
    }

    /// Target index, if set.
    pub fn index_name(&self) -> Option<&str> {
        self.path.index()
    }
}

/// Acknowledgement returned by index management calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicesOperationResponse {
    /// Operation accepted.
    #[serde(default)]
    pub ok: bool,
    /// Acknowledged by all nodes.
    #[serde(default)]
    pub acknowledged: bool,
}
