//! Percolator registration and document percolation.
//!
//! Queries are accepted as raw JSON values.

use crate::config::ConnectionSettings;
use crate::document::{Document, TypeNameMarker};
use crate::error::{QuarryError, Result};
use crate::path::{
    DocumentPath, HttpMethod, IdPolicy, NamePath, Percolate, PathInfo, RegisterPercolator,
    UnregisterPercolator,
};
use crate::resolver::TypeNameResolver;
use crate::transport::TransportRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Resolve the index of a name-addressed percolator request.
fn percolator_index(
    settings: &ConnectionSettings,
    index: Option<&str>,
    marker: Option<&TypeNameMarker>,
) -> Result<String> {
    let resolver = TypeNameResolver::new(settings);
    match (index.filter(|i| !i.is_empty()), marker) {
        (Some(index), _) => Ok(index.to_string()),
        (None, Some(marker)) => resolver.index(marker),
        (None, None) => resolver.default_index(),
    }
}

/// Descriptor for `PUT /_percolator/{index}/{name}`.
#[derive(Debug, Clone)]
pub struct RegisterPercolatorDescriptor {
    settings: Arc<ConnectionSettings>,
    path: NamePath,
    index: Option<String>,
    marker: Option<TypeNameMarker>,
    query: Option<Value>,
    metadata: Map<String, Value>,
    refresh: Option<bool>,
}

impl RegisterPercolatorDescriptor {
    /// Create a descriptor.
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self {
            settings,
            path: NamePath::default(),
            index: None,
            marker: None,
            query: None,
            metadata: Map::new(),
            refresh: None,
        }
    }

    /// Name the percolator is registered under.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.path.set_name(name);
        self
    }

    /// Index whose documents the query percolates.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Use the index resolved for `T`.
    pub fn index_of<T: Document>(mut self) -> Self {
        self.marker = Some(TypeNameMarker::of::<T>());
        self
    }

    /// The query to register.
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Metadata stored alongside the query; percolate requests can filter on it.
    pub fn add_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Refresh the percolator index after registering.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Resolve the target path.
    pub fn path_info(&self) -> Result<PathInfo<RegisterPercolator>> {
        let mut info = self.path.to_path_info::<RegisterPercolator>(HttpMethod::Put)?;
        info.index = Some(percolator_index(
            &self.settings,
            self.index.as_deref(),
            self.marker.as_ref(),
        )?);
        info.query.set_opt("refresh", self.refresh);
        Ok(info)
    }

    /// Resolve and serialize into a request.
    pub fn to_request(&self) -> Result<TransportRequest> {
        let info = self.path_info()?;
        let query = self
            .query
            .clone()
            .ok_or_else(|| QuarryError::missing("Query"))?;

        let mut body = self.metadata.clone();
        body.insert("query".to_string(), query);

        Ok(TransportRequest::new(info.method, info.path()?)
            .with_query(info.query_pairs())
            .with_json(serde_json::to_string(&Value::Object(body))?))
    }
}

/// Descriptor for `DELETE /_percolator/{index}/{name}`.
#[derive(Debug, Clone)]
pub struct UnregisterPercolatorDescriptor {
    settings: Arc<ConnectionSettings>,
    path: NamePath,
    index: Option<String>,
    marker: Option<TypeNameMarker>,
    refresh: Option<bool>,
}

impl UnregisterPercolatorDescriptor {
    /// Create a descriptor.
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self {
            settings,
            path: NamePath::default(),
            index: None,
            marker: None,
            refresh: None,
        }
    }

    /// Name of the percolator to remove.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.path.set_name(name);
        self
    }

    /// Index the percolator was registered for.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Use the index resolved for `T`.
    pub fn index_of<T: Document>(mut self) -> Self {
        self.marker = Some(TypeNameMarker::of::<T>());
        self
    }

    /// Refresh the percolator index after removing.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Resolve the target path.
    pub fn path_info(&self) -> Result<PathInfo<UnregisterPercolator>> {
        let mut info = self
            .path
            .to_path_info::<UnregisterPercolator>(HttpMethod::Delete)?;
        info.index = Some(percolator_index(
            &self.settings,
            self.index.as_deref(),
            self.marker.as_ref(),
        )?);
        info.query.set_opt("refresh", self.refresh);
        Ok(info)
    }

    /// Resolve into a request.
    pub fn to_request(&self) -> Result<TransportRequest> {
        let info = self.path_info()?;
        Ok(TransportRequest::new(info.method, info.path()?).with_query(info.query_pairs()))
    }
}

/// Descriptor for `GET /{index}/{type}/_percolate`.
#[derive(Debug)]
pub struct PercolateDescriptor<'a, T: Document> {
    settings: Arc<ConnectionSettings>,
    object: &'a T,
    path: DocumentPath,
    query: Option<Value>,
    routing: Option<String>,
    preference: Option<String>,
}

impl<'a, T: Document> PercolateDescriptor<'a, T> {
    /// Percolate `object` against the registered queries.
    pub fn new(settings: Arc<ConnectionSettings>, object: &'a T) -> Self {
        Self {
            settings,
            object,
            path: DocumentPath::for_type::<T>(),
            query: None,
            routing: None,
            preference: None,
        }
    }

    /// Index, overriding type name resolution.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.path.set_index(index);
        self
    }

    /// Type name, overriding type name resolution.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.path.set_type(type_name);
        self
    }

    /// Only consider registered queries matching this query (on their metadata).
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Routing key.
    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// Shard preference.
    pub fn preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }

    /// Resolve the target path.
    pub fn path_info(&self) -> Result<PathInfo<Percolate>> {
        let mut info =
            self.path
                .to_path_info::<Percolate>(&self.settings, HttpMethod::Get, IdPolicy::Optional)?;
        info.id = None;
        info.query
            .set_opt("routing", self.routing.clone().or_else(|| self.object.routing()));
        info.query.set_opt("preference", self.preference.as_deref());
        Ok(info)
    }

    /// Resolve and serialize into a request.
    pub fn to_request(&self) -> Result<TransportRequest> {
        let info = self.path_info()?;

        let doc = serde_json::to_value(self.object)?;
        if doc.is_null() {
            return Err(QuarryError::missing("Document"));
        }

        let mut body = Map::new();
        body.insert("doc".to_string(), doc);
        if let Some(query) = &self.query {
            body.insert("query".to_string(), query.clone());
        }

        Ok(TransportRequest::new(info.method, info.path()?)
            .with_query(info.query_pairs())
            .with_json(serde_json::to_string(&Value::Object(body))?))
    }
}

/// Answer to registering or unregistering a percolator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercolatorResponse {
    /// Request accepted.
    #[serde(default)]
    pub ok: bool,
    /// Unregister only: whether the percolator existed.
    #[serde(default)]
    pub found: bool,
    /// Always `_percolator`.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// The index the percolator belongs to.
    #[serde(rename = "_type", default)]
    pub type_name: String,
    /// Percolator name.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Version of the stored query.
    #[serde(rename = "_version", default)]
    pub version: i64,
}

/// Names of the registered queries a document matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercolateResponse {
    /// Request accepted.
    #[serde(default)]
    pub ok: bool,
    /// Matching percolator names.
    #[serde(default)]
    pub matches: Vec<String>,
}

impl PercolateResponse {
    /// Whether `name` matched.
    pub fn matched(&self, name: &str) -> bool {
        self.matches.iter().any(|m| m == name)
    }
}
