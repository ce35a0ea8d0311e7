//! Bulk operation model.
//!
//! [`BulkOperation`] is the closed set of things a batch can carry. Values
//! are only produced by the operation builders, which resolve the target
//! path and validate the payload up front, so every operation in a batch is
//! known to be encodable.

use crate::config::ConnectionSettings;
use crate::document::{Document, TypeNameMarker};
use crate::error::{QuarryError, Result};
use crate::path::{BulkItem, DocumentPath, HttpMethod, IdPolicy, PathInfo};
use crate::query_string::VersionType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    /// Index (insert or replace).
    Index,
    /// Create (fail if the id exists).
    Create,
    /// Partial update or scripted update.
    Update,
    /// Delete.
    Delete,
}

impl OpType {
    /// Key used for this operation on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpType::Index => "index",
            OpType::Create => "create",
            OpType::Update => "update",
            OpType::Delete => "delete",
        }
    }

    /// Parse a wire key.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "index" => Some(OpType::Index),
            "create" => Some(OpType::Create),
            "update" => Some(OpType::Update),
            "delete" => Some(OpType::Delete),
            _ => None,
        }
    }

    /// Whether a payload line follows the metadata line.
    pub fn has_payload(&self) -> bool {
        !matches!(self, OpType::Delete)
    }
}

impl std::fmt::Display for OpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item metadata carried on the action line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMeta {
    /// Routing key.
    pub routing: Option<String>,
    /// Parent document id.
    pub parent: Option<String>,
    /// Expected or external version.
    pub version: Option<i64>,
    /// How `version` is checked.
    pub version_type: Option<VersionType>,
    /// Update only: retries on version conflict.
    pub retry_on_conflict: Option<u32>,
    /// Index/create only: percolate query filter.
    pub percolate: Option<String>,
}

/// Body of an update operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    /// Partial document merged into the stored one.
    pub doc: Option<Value>,
    /// Update script.
    pub script: Option<String>,
    /// Script parameters.
    pub params: Map<String, Value>,
    /// Script language.
    pub lang: Option<String>,
    /// Document indexed when none exists.
    pub upsert: Option<Value>,
    /// Use `doc` as the upsert document.
    pub doc_as_upsert: Option<bool>,
}

impl UpdatePayload {
    /// Whether the payload changes anything.
    pub fn is_empty(&self) -> bool {
        self.doc.is_none() && self.script.is_none()
    }

    /// JSON body.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(doc) = &self.doc {
            body.insert("doc".to_string(), doc.clone());
        }
        if let Some(script) = &self.script {
            body.insert("script".to_string(), Value::String(script.clone()));
        }
        if !self.params.is_empty() {
            body.insert("params".to_string(), Value::Object(self.params.clone()));
        }
        if let Some(lang) = &self.lang {
            body.insert("lang".to_string(), Value::String(lang.clone()));
        }
        if let Some(upsert) = &self.upsert {
            body.insert("upsert".to_string(), upsert.clone());
        }
        if let Some(doc_as_upsert) = self.doc_as_upsert {
            body.insert("doc_as_upsert".to_string(), Value::Bool(doc_as_upsert));
        }
        Value::Object(body)
    }
}

/// A single, validated operation in a bulk batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOperation {
    /// Index a document.
    Index {
        /// Resolved target.
        path: PathInfo<BulkItem>,
        /// Action metadata.
        meta: OperationMeta,
        /// Serialized document, never null.
        document: Value,
    },
    /// Create a document.
    Create {
        /// Resolved target.
        path: PathInfo<BulkItem>,
        /// Action metadata.
        meta: OperationMeta,
        /// Serialized document, never null.
        document: Value,
    },
    /// Update a document.
    Update {
        /// Resolved target; id always present.
        path: PathInfo<BulkItem>,
        /// Action metadata.
        meta: OperationMeta,
        /// Partial document and/or script.
        payload: UpdatePayload,
    },
    /// Delete a document.
    Delete {
        /// Resolved target; id always present.
        path: PathInfo<BulkItem>,
        /// Action metadata.
        meta: OperationMeta,
    },
}

impl BulkOperation {
    /// Operation kind.
    pub fn op_type(&self) -> OpType {
        match self {
            BulkOperation::Index { .. } => OpType::Index,
            BulkOperation::Create { .. } => OpType::Create,
            BulkOperation::Update { .. } => OpType::Update,
            BulkOperation::Delete { .. } => OpType::Delete,
        }
    }

    /// Resolved target.
    pub fn path(&self) -> &PathInfo<BulkItem> {
        match self {
            BulkOperation::Index { path, .. }
            | BulkOperation::Create { path, .. }
            | BulkOperation::Update { path, .. }
            | BulkOperation::Delete { path, .. } => path,
        }
    }

    /// Action metadata.
    pub fn meta(&self) -> &OperationMeta {
        match self {
            BulkOperation::Index { meta, .. }
            | BulkOperation::Create { meta, .. }
            | BulkOperation::Update { meta, .. }
            | BulkOperation::Delete { meta, .. } => meta,
        }
    }

    /// Document carried by index and create operations.
    pub fn document(&self) -> Option<&Value> {
        match self {
            BulkOperation::Index { document, .. } | BulkOperation::Create { document, .. } => {
                Some(document)
            }
            BulkOperation::Update { .. } | BulkOperation::Delete { .. } => None,
        }
    }

    /// Submitted document id, if any.
    pub fn id(&self) -> Option<&str> {
        self.path().id()
    }
}

fn to_document<T: Serialize>(object: &T) -> Result<Value> {
    let value = serde_json::to_value(object)?;
    if value.is_null() {
        return Err(QuarryError::missing("Document"));
    }
    Ok(value)
}

macro_rules! target_setters {
    () => {
        /// Target index, overriding type name resolution.
        pub fn index(mut self, index: impl Into<String>) -> Self {
            self.path.set_index(index);
            self
        }

        /// Type name, overriding type name resolution.
        pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
            self.path.set_type(type_name);
            self
        }

        /// Document id, overriding the one inferred from the object.
        pub fn id(mut self, id: impl Into<String>) -> Self {
            self.path.set_id(id);
            self
        }

        /// Routing key.
        pub fn routing(mut self, routing: impl Into<String>) -> Self {
            self.meta.routing = Some(routing.into());
            self
        }

        /// Parent document id.
        pub fn parent(mut self, parent: impl Into<String>) -> Self {
            self.meta.parent = Some(parent.into());
            self
        }

        /// Expected version.
        pub fn version(mut self, version: i64) -> Self {
            self.meta.version = Some(version);
            self
        }

        /// Version check mode.
        pub fn version_type(mut self, version_type: VersionType) -> Self {
            self.meta.version_type = Some(version_type);
            self
        }
    };
}

/// Builder for an index operation.
#[derive(Debug)]
pub struct IndexOperation<'a, T: Document> {
    object: &'a T,
    path: DocumentPath,
    meta: OperationMeta,
}

impl<'a, T: Document> IndexOperation<'a, T> {
    /// Index `object`; id and routing default to the object's own.
    pub fn new(object: &'a T) -> Self {
        Self {
            object,
            path: DocumentPath::for_type::<T>(),
            meta: OperationMeta::default(),
        }
    }

    target_setters!();

    /// Percolate the document against matching registered queries.
    pub fn percolate(mut self, filter: impl Into<String>) -> Self {
        self.meta.percolate = Some(filter.into());
        self
    }

    pub(crate) fn build(mut self, settings: &ConnectionSettings) -> Result<BulkOperation> {
        let (path, meta, document) = resolve_stored(
            self.object,
            &mut self.path,
            self.meta,
            settings,
        )?;
        Ok(BulkOperation::Index {
            path,
            meta,
            document,
        })
    }
}

impl<'a, T: Document> From<&'a T> for IndexOperation<'a, T> {
    fn from(object: &'a T) -> Self {
        Self::new(object)
    }
}

/// Builder for a create operation.
#[derive(Debug)]
pub struct CreateOperation<'a, T: Document> {
    object: &'a T,
    path: DocumentPath,
    meta: OperationMeta,
}

impl<'a, T: Document> CreateOperation<'a, T> {
    /// Create `object`; id and routing default to the object's own.
    pub fn new(object: &'a T) -> Self {
        Self {
            object,
            path: DocumentPath::for_type::<T>(),
            meta: OperationMeta::default(),
        }
    }

    target_setters!();

    /// Percolate the document against matching registered queries.
    pub fn percolate(mut self, filter: impl Into<String>) -> Self {
        self.meta.percolate = Some(filter.into());
        self
    }

    pub(crate) fn build(mut self, settings: &ConnectionSettings) -> Result<BulkOperation> {
        let (path, meta, document) = resolve_stored(
            self.object,
            &mut self.path,
            self.meta,
            settings,
        )?;
        Ok(BulkOperation::Create {
            path,
            meta,
            document,
        })
    }
}

impl<'a, T: Document> From<&'a T> for CreateOperation<'a, T> {
    fn from(object: &'a T) -> Self {
        Self::new(object)
    }
}

fn resolve_stored<T: Document>(
    object: &T,
    path: &mut DocumentPath,
    mut meta: OperationMeta,
    settings: &ConnectionSettings,
) -> Result<(PathInfo<BulkItem>, OperationMeta, Value)> {
    path.default_id(object.id());
    if meta.routing.is_none() {
        meta.routing = object.routing();
    }
    let document = to_document(object)?;
    let info = path.to_path_info(settings, HttpMethod::Post, IdPolicy::Optional)?;
    Ok((info, meta, document))
}

/// Builder for an update operation.
///
/// The target type is `T`; the partial document may be any serializable
/// value. At least one of [`document`](Self::document) or
/// [`script`](Self::script) must be set.
#[derive(Debug)]
pub struct UpdateOperation<'a, T: Document> {
    object: Option<&'a T>,
    path: DocumentPath,
    meta: OperationMeta,
    payload: UpdatePayload,
    error: Option<serde_json::Error>,
}

impl<'a, T: Document> UpdateOperation<'a, T> {
    /// Update a document of type `T`.
    pub fn new() -> Self {
        Self {
            object: None,
            path: DocumentPath::for_type::<T>(),
            meta: OperationMeta::default(),
            payload: UpdatePayload::default(),
            error: None,
        }
    }

    /// Update a document addressed by an explicit type name.
    pub fn with_marker(marker: TypeNameMarker) -> Self {
        Self {
            path: DocumentPath::new(marker),
            ..Self::new()
        }
    }

    /// Infer id and routing from an existing object.
    pub fn object(mut self, object: &'a T) -> Self {
        self.object = Some(object);
        self
    }

    target_setters!();

    /// Partial document merged into the stored one.
    pub fn document<K: Serialize>(mut self, partial: &K) -> Self {
        match serde_json::to_value(partial) {
            Ok(value) => self.payload.doc = Some(value),
            Err(e) => self.error = self.error.or(Some(e)),
        }
        self
    }

    /// Update script.
    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.payload.script = Some(script.into());
        self
    }

    /// Script parameter.
    pub fn param<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.payload.params.insert(name.into(), value);
            }
            Err(e) => self.error = self.error.or(Some(e)),
        }
        self
    }

    /// Script language.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.payload.lang = Some(lang.into());
        self
    }

    /// Document indexed when the target does not exist.
    pub fn upsert<K: Serialize>(mut self, upsert: &K) -> Self {
        match serde_json::to_value(upsert) {
            Ok(value) => self.payload.upsert = Some(value),
            Err(e) => self.error = self.error.or(Some(e)),
        }
        self
    }

    /// Use the partial document as the upsert document.
    pub fn doc_as_upsert(mut self, enabled: bool) -> Self {
        self.payload.doc_as_upsert = Some(enabled);
        self
    }

    /// Retries on version conflict.
    pub fn retry_on_conflict(mut self, retries: u32) -> Self {
        self.meta.retry_on_conflict = Some(retries);
        self
    }

    pub(crate) fn into_parts(
        mut self,
        settings: &ConnectionSettings,
    ) -> Result<(PathInfo<BulkItem>, OperationMeta, UpdatePayload)> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        if let Some(object) = self.object {
            self.path.default_id(object.id());
            if self.meta.routing.is_none() {
                self.meta.routing = object.routing();
            }
        }

        let path = self
            .path
            .to_path_info(settings, HttpMethod::Post, IdPolicy::Required)?;
        if self.payload.is_empty() {
            return Err(QuarryError::Dsl(
                "update requires a partial document or a script".to_string(),
            ));
        }
        Ok((path, self.meta, self.payload))
    }

    pub(crate) fn build(self, settings: &ConnectionSettings) -> Result<BulkOperation> {
        let (path, meta, payload) = self.into_parts(settings)?;
        Ok(BulkOperation::Update {
            path,
            meta,
            payload,
        })
    }
}

impl<T: Document> Default for UpdateOperation<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a delete operation.
#[derive(Debug)]
pub struct DeleteOperation<'a, T: Document> {
    object: Option<&'a T>,
    path: DocumentPath,
    meta: OperationMeta,
}

impl<'a, T: Document> DeleteOperation<'a, T> {
    /// Delete a document of type `T`.
    pub fn new() -> Self {
        Self {
            object: None,
            path: DocumentPath::for_type::<T>(),
            meta: OperationMeta::default(),
        }
    }

    /// Delete a document addressed by an explicit type name.
    pub fn with_marker(marker: TypeNameMarker) -> Self {
        Self {
            path: DocumentPath::new(marker),
            ..Self::new()
        }
    }

    /// Infer id and routing from an existing object.
    pub fn object(mut self, object: &'a T) -> Self {
        self.object = Some(object);
        self
    }

    target_setters!();

    pub(crate) fn build(mut self, settings: &ConnectionSettings) -> Result<BulkOperation> {
        if let Some(object) = self.object {
            self.path.default_id(object.id());
            if self.meta.routing.is_none() {
                self.meta.routing = object.routing();
            }
        }
        let path = self
            .path
            .to_path_info(settings, HttpMethod::Delete, IdPolicy::Required)?;
        Ok(BulkOperation::Delete {
            path,
            meta: self.meta,
        })
    }
}

impl<T: Document> Default for DeleteOperation<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Project {
        id: u32,
        name: String,
    }

    impl Document for Project {
        fn type_tag() -> &'static str {
            "Project"
        }

        fn id(&self) -> Option<String> {
            Some(self.id.to_string())
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Note(Option<String>);

    impl Document for Note {
        fn type_tag() -> &'static str {
            "Note"
        }
    }

    fn settings() -> ConnectionSettings {
        ConnectionSettings::default().with_default_index("projects")
    }

    #[test]
    fn test_index_infers_id_from_object() {
        let project = Project {
            id: 7,
            name: "quarry".to_string(),
        };
        let op = IndexOperation::new(&project).build(&settings()).unwrap();

        assert_eq!(op.op_type(), OpType::Index);
        assert_eq!(op.id(), Some("7"));
        assert_eq!(op.path().index(), Some("projects"));
        assert_eq!(op.path().type_name(), Some("project"));
        assert_eq!(op.document(), Some(&json!({"id": 7, "name": "quarry"})));
    }

    #[test]
    fn test_explicit_id_wins() {
        let project = Project {
            id: 7,
            name: "quarry".to_string(),
        };
        let op = CreateOperation::new(&project)
            .id("custom")
            .routing("r1")
            .percolate("*")
            .build(&settings())
            .unwrap();

        assert_eq!(op.id(), Some("custom"));
        assert_eq!(op.meta().routing.as_deref(), Some("r1"));
        assert_eq!(op.meta().percolate.as_deref(), Some("*"));
    }

    #[test]
    fn test_index_without_id_is_allowed() {
        let note = Note(Some("hello".to_string()));
        let op = IndexOperation::new(&note).build(&settings()).unwrap();
        assert_eq!(op.id(), None);
    }

    #[test]
    fn test_null_document_rejected() {
        let note = Note(None);
        let err = IndexOperation::new(&note).build(&settings()).unwrap_err();
        assert_eq!(err.to_string(), "DSL error: missing Document()");
    }

    #[test]
    fn test_update_requires_id() {
        let err = UpdateOperation::<Project>::new()
            .document(&json!({"name": "x"}))
            .build(&settings())
            .unwrap_err();
        assert!(err.is_dsl());
        assert!(err.to_string().contains("Id"));
    }

    #[test]
    fn test_update_requires_doc_or_script() {
        let err = UpdateOperation::<Project>::new()
            .id("1")
            .build(&settings())
            .unwrap_err();
        assert!(err.is_dsl());

        let op = UpdateOperation::<Project>::new()
            .id("1")
            .script("ctx._source.counter += count")
            .param("count", 4)
            .lang("mvel")
            .retry_on_conflict(3)
            .build(&settings())
            .unwrap();
        match op {
            BulkOperation::Update { payload, meta, .. } => {
                assert_eq!(
                    payload.to_json(),
                    json!({
                        "script": "ctx._source.counter += count",
                        "params": {"count": 4},
                        "lang": "mvel"
                    })
                );
                assert_eq!(meta.retry_on_conflict, Some(3));
            }
            other => panic!("unexpected operation {:?}", other),
        }
    }

    #[test]
    fn test_update_infers_id_from_object() {
        let project = Project {
            id: 5000,
            name: "old".to_string(),
        };
        let op = UpdateOperation::new()
            .object(&project)
            .document(&json!({"name": "Sufixed-5000"}))
            .doc_as_upsert(true)
            .build(&settings())
            .unwrap();

        assert_eq!(op.id(), Some("5000"));
        assert!(op.document().is_none());
    }

    #[test]
    fn test_delete_requires_id() {
        let err = DeleteOperation::<Project>::new()
            .build(&settings())
            .unwrap_err();
        assert_eq!(err.to_string(), "DSL error: missing Id()");

        let op = DeleteOperation::<Project>::new()
            .id("3")
            .version(2)
            .version_type(VersionType::External)
            .build(&settings())
            .unwrap();
        assert_eq!(op.op_type(), OpType::Delete);
        assert_eq!(op.meta().version, Some(2));
    }

    #[test]
    fn test_explicit_marker() {
        let op = DeleteOperation::<Project>::with_marker(TypeNameMarker::name("legacy"))
            .id("3")
            .build(&settings())
            .unwrap();
        assert_eq!(op.path().type_name(), Some("legacy"));
    }

    #[test]
    fn test_op_type_wire_names() {
        assert_eq!(OpType::parse("create"), Some(OpType::Create));
        assert_eq!(OpType::parse("percolate"), None);
        assert!(!OpType::Delete.has_payload());
        assert_eq!(serde_json::to_string(&OpType::Update).unwrap(), "\"update\"");
    }
}
