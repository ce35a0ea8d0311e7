//! Bulk batch builder.

use super::codec::BulkCodec;
use super::operation::{
    BulkOperation, CreateOperation, DeleteOperation, IndexOperation, UpdateOperation,
};
use crate::config::ConnectionSettings;
use crate::document::Document;
use crate::error::{QuarryError, Result};
use crate::path::{Bulk, HttpMethod, PathInfo};
use crate::query_string::{Consistency, Replication};
use std::sync::Arc;

/// Accumulates operations for one bulk round trip.
///
/// Each operation is resolved and validated when it is added, so a failing
/// call leaves the batch unchanged.
///
/// # Example
///
/// ```rust,ignore
/// let mut bulk = client.bulk_descriptor();
/// bulk.index(IndexOperation::new(&project))?
///     .delete(DeleteOperation::<Project>::new().id("42"))?
///     .refresh(true);
/// let result = client.bulk(bulk).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BulkDescriptor {
    settings: Arc<ConnectionSettings>,
    path: PathInfo<Bulk>,
    operations: Vec<BulkOperation>,
}

impl BulkDescriptor {
    /// Create an empty batch.
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self {
            settings,
            path: PathInfo::new(HttpMethod::Post),
            operations: Vec::new(),
        }
    }

    /// Add an index operation.
    pub fn index<T: Document>(&mut self, op: IndexOperation<'_, T>) -> Result<&mut Self> {
        let op = op.build(&self.settings)?;
        self.operations.push(op);
        Ok(self)
    }

    /// Add an index operation per document, using each document's own id.
    pub fn index_many<'a, T, I>(&mut self, documents: I) -> Result<&mut Self>
    where
        T: Document + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let ops = documents
            .into_iter()
            .map(|doc| IndexOperation::new(doc).build(&self.settings))
            .collect::<Result<Vec<_>>>()?;
        self.operations.extend(ops);
        Ok(self)
    }

    /// Add a create operation.
    pub fn create<T: Document>(&mut self, op: CreateOperation<'_, T>) -> Result<&mut Self> {
        let op = op.build(&self.settings)?;
        self.operations.push(op);
        Ok(self)
    }

    /// Add an update operation.
    pub fn update<T: Document>(&mut self, op: UpdateOperation<'_, T>) -> Result<&mut Self> {
        let op = op.build(&self.settings)?;
        self.operations.push(op);
        Ok(self)
    }

    /// Add a delete operation.
    pub fn delete<T: Document>(&mut self, op: DeleteOperation<'_, T>) -> Result<&mut Self> {
        let op = op.build(&self.settings)?;
        self.operations.push(op);
        Ok(self)
    }

    /// Refresh affected shards once the batch is applied.
    pub fn refresh(&mut self, refresh: bool) -> &mut Self {
        self.path.query.set("refresh", refresh.to_string());
        self
    }

    /// Required write consistency.
    pub fn consistency(&mut self, consistency: Consistency) -> &mut Self {
        self.path.query.set("consistency", consistency.as_str());
        self
    }

    /// Replication mode.
    pub fn replication(&mut self, replication: Replication) -> &mut Self {
        self.path.query.set("replication", replication.as_str());
        self
    }

    /// Default index placed on the bulk path.
    pub fn fixed_index(&mut self, index: impl Into<String>) -> &mut Self {
        self.path.index = Some(index.into());
        self
    }

    /// Default type placed on the bulk path. Requires a fixed index.
    pub fn fixed_type(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.path.type_name = Some(type_name.into());
        self
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether no operations were added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations in submission order.
    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }

    /// Settings the batch resolves against.
    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        &self.settings
    }

    /// Freeze the batch into a request.
    pub fn build(self) -> Result<BulkRequest> {
        if self.operations.is_empty() {
            return Err(QuarryError::Dsl(
                "bulk request contains no operations".to_string(),
            ));
        }
        let path = self.path.path()?;
        let body = BulkCodec::encode(&self.operations)?;
        Ok(BulkRequest {
            path,
            query: self.path.query_pairs(),
            body,
            operations: self.operations,
        })
    }
}

/// An encoded, immutable bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    path: String,
    query: Vec<(String, String)>,
    body: String,
    operations: Vec<BulkOperation>,
}

impl BulkRequest {
    /// Request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query-string pairs.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// NDJSON body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Submitted operations, used to correlate the response.
    pub fn operations(&self) -> &[BulkOperation] {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Project {
        id: u32,
    }

    impl Document for Project {
        fn type_tag() -> &'static str {
            "Project"
        }

        fn id(&self) -> Option<String> {
            Some(self.id.to_string())
        }
    }

    fn descriptor() -> BulkDescriptor {
        BulkDescriptor::new(Arc::new(
            ConnectionSettings::default().with_default_index("projects"),
        ))
    }

    #[test]
    fn test_empty_batch_rejected() {
        let err = descriptor().build().unwrap_err();
        assert!(err.is_dsl());
    }

    #[test]
    fn test_invalid_operation_leaves_batch_unchanged() {
        let mut bulk = descriptor();
        bulk.index(IndexOperation::new(&Project { id: 1 })).unwrap();
        assert!(bulk.delete(DeleteOperation::<Project>::new()).is_err());
        assert_eq!(bulk.len(), 1);
    }

    #[test]
    fn test_build_with_options() {
        let projects: Vec<Project> = (1..=3).map(|id| Project { id }).collect();
        let mut bulk = descriptor();
        bulk.index_many(&projects)
            .unwrap()
            .refresh(true)
            .consistency(Consistency::Quorum)
            .replication(Replication::Async)
            .fixed_index("projects");

        let request = bulk.build().unwrap();
        assert_eq!(request.path(), "/projects/_bulk");
        assert_eq!(
            request.query(),
            &[
                ("refresh".to_string(), "true".to_string()),
                ("consistency".to_string(), "quorum".to_string()),
                ("replication".to_string(), "async".to_string()),
            ]
        );
        assert_eq!(request.operations().len(), 3);
        assert_eq!(request.body().lines().count(), 6);
    }

    #[test]
    fn test_fixed_type_without_index_rejected() {
        let mut bulk = descriptor();
        bulk.index(IndexOperation::new(&Project { id: 1 }))
            .unwrap()
            .fixed_type("project");
        assert!(bulk.build().unwrap_err().is_dsl());
    }
}
