//! Single-document update.

use crate::bulk::UpdateOperation;
use crate::config::ConnectionSettings;
use crate::document::{Document, TypeNameMarker};
use crate::error::Result;
use crate::path::{PathInfo, Update};
use crate::query_string::{Consistency, Replication, VersionType};
use crate::transport::TransportRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Descriptor for `POST /{index}/{type}/{id}/_update`.
///
/// Shares its validation with bulk update operations: an id and either a
/// partial document or a script are required. Item metadata is sent as
/// query-string options instead.
#[derive(Debug)]
pub struct UpdateDescriptor<'a, T: Document> {
    settings: Arc<ConnectionSettings>,
    op: UpdateOperation<'a, T>,
    refresh: Option<bool>,
    consistency: Option<Consistency>,
    replication: Option<Replication>,
    percolate: Option<String>,
}

impl<'a, T: Document> UpdateDescriptor<'a, T> {
    /// Update a document of type `T`.
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self::from_operation(settings, UpdateOperation::new())
    }

    /// Update a document addressed by an explicit type name.
    pub fn with_marker(settings: Arc<ConnectionSettings>, marker: TypeNameMarker) -> Self {
        Self::from_operation(settings, UpdateOperation::with_marker(marker))
    }

    /// Wrap a prepared update operation.
    pub fn from_operation(settings: Arc<ConnectionSettings>, op: UpdateOperation<'a, T>) -> Self {
        Self {
            settings,
            op,
            refresh: None,
            consistency: None,
            replication: None,
            percolate: None,
        }
    }

    fn map(mut self, f: impl FnOnce(UpdateOperation<'a, T>) -> UpdateOperation<'a, T>) -> Self {
        self.op = f(self.op);
        self
    }

    /// Infer id and routing from an existing object.
    pub fn object(self, object: &'a T) -> Self {
        self.map(|op| op.object(object))
    }

    /// Document id.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.map(|op| op.id(id))
    }

    /// Index, overriding type name resolution.
    pub fn index(self, index: impl Into<String>) -> Self {
        self.map(|op| op.index(index))
    }

    /// Type name, overriding type name resolution.
    pub fn type_name(self, type_name: impl Into<String>) -> Self {
        self.map(|op| op.type_name(type_name))
    }

    /// Routing key.
    pub fn routing(self, routing: impl Into<String>) -> Self {
        self.map(|op| op.routing(routing))
    }

    /// Parent document id.
    pub fn parent(self, parent: impl Into<String>) -> Self {
        self.map(|op| op.parent(parent))
    }

    /// Expected version.
    pub fn version(self, version: i64) -> Self {
        self.map(|op| op.version(version))
    }

    /// Version check mode.
    pub fn version_type(self, version_type: VersionType) -> Self {
        self.map(|op| op.version_type(version_type))
    }

    /// Partial document merged into the stored one.
    pub fn document<K: Serialize>(self, partial: &K) -> Self {
        self.map(|op| op.document(partial))
    }

    /// Update script.
    pub fn script(self, script: impl Into<String>) -> Self {
        self.map(|op| op.script(script))
    }

    /// Script parameter.
    pub fn param<V: Serialize>(self, name: impl Into<String>, value: V) -> Self {
        self.map(|op| op.param(name, value))
    }

    /// Script language.
    pub fn lang(self, lang: impl Into<String>) -> Self {
        self.map(|op| op.lang(lang))
    }

    /// Document indexed when the target does not exist.
    pub fn upsert<K: Serialize>(self, upsert: &K) -> Self {
        self.map(|op| op.upsert(upsert))
    }

    /// Use the partial document as the upsert document.
    pub fn doc_as_upsert(self, enabled: bool) -> Self {
        self.map(|op| op.doc_as_upsert(enabled))
    }

    /// Retries on version conflict.
    pub fn retry_on_conflict(self, retries: u32) -> Self {
        self.map(|op| op.retry_on_conflict(retries))
    }

    /// Refresh the shard after the update.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Required write consistency.
    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    /// Replication mode.
    pub fn replication(mut self, replication: Replication) -> Self {
        self.replication = Some(replication);
        self
    }

    /// Percolate the updated document.
    pub fn percolate(mut self, filter: impl Into<String>) -> Self {
        self.percolate = Some(filter.into());
        self
    }

    /// Resolve the target path, query options and body.
    pub fn resolve(self) -> Result<(PathInfo<Update>, serde_json::Value)> {
        let (path, meta, payload) = self.op.into_parts(&self.settings)?;

        let mut info = path.cast::<Update>();
        let query = &mut info.query;
        query.set_opt("refresh", self.refresh);
        query.set_opt("routing", meta.routing);
        query.set_opt("parent", meta.parent);
        query.set_opt("version", meta.version);
        query.set_opt("version_type", meta.version_type);
        query.set_opt("retry_on_conflict", meta.retry_on_conflict);
        query.set_opt("consistency", self.consistency);
        query.set_opt("replication", self.replication);
        query.set_opt("percolate", self.percolate);

        Ok((info, payload.to_json()))
    }

    /// Resolve and serialize into a request.
    pub fn to_request(self) -> Result<TransportRequest> {
        let (info, body) = self.resolve()?;
        Ok(TransportRequest::new(info.method, info.path()?)
            .with_query(info.query_pairs())
            .with_json(serde_json::to_string(&body)?))
    }
}

/// Answer to a single-document update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Update applied.
    #[serde(default)]
    pub ok: bool,
    /// Index.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Type name.
    #[serde(rename = "_type", default)]
    pub type_name: String,
    /// Document id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Version after the update.
    #[serde(rename = "_version", default)]
    pub version: i64,
}
