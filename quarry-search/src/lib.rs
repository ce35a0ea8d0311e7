//! Typed client for Elasticsearch-style document engines.
//!
//! This crate turns typed operation descriptors into REST calls and engine
//! answers back into typed results:
//! - Path resolution with type name inference and per-endpoint query strings
//! - Bulk batches encoded as NDJSON, decoded positionally with per-item outcomes
//! - Index creation, percolator registration and percolation
//! - Single-document update and source reads
//!
//! # Example
//!
//! ```rust,no_run
//! use quarry_search::prelude::*;
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Project {
//!     id: u32,
//!     name: Option<String>,
//! }
//!
//! impl Document for Project {
//!     fn type_tag() -> &'static str {
//!         "Project"
//!     }
//!
//!     fn id(&self) -> Option<String> {
//!         Some(self.id.to_string())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let settings = ConnectionSettings::new("http://localhost:9200")
//!         .with_default_index("projects");
//!     let client = Client::new(settings)?;
//!
//!     let mut bulk = client.bulk_descriptor();
//!     bulk.index(IndexOperation::new(&Project { id: 1, name: None }))?
//!         .update(
//!             UpdateOperation::<Project>::new()
//!                 .id("2")
//!                 .document(&json!({"name": "renamed"})),
//!         )?
//!         .refresh(true);
//!
//!     let result = client.bulk(bulk).await?;
//!     for item in result.failed_items() {
//!         eprintln!("{} {:?} failed: {:?}", item.op_type, item.id, item.error);
//!     }
//!
//!     let project: Option<Project> = client.source("1").await?;
//!     println!("{:?}", project);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bulk;
mod client;
mod config;
mod document;
mod error;
mod index;
pub mod path;
mod percolate;
mod query_string;
mod resolver;
mod source;
mod transport;
mod update;

pub use bulk::{
    BulkCodec, BulkDescriptor, BulkOperation, BulkRequest, BulkResponseItem, BulkResult,
    CreateOperation, DeleteOperation, IndexOperation, OpType, OperationMeta, UpdateOperation,
    UpdatePayload,
};
pub use client::Client;
pub use config::{ConnectionSettings, TypeMapping};
pub use document::{Document, DocumentType, TypeNameMarker};
pub use error::{QuarryError, Result};
pub use index::{CreateIndexDescriptor, IndexSettings, IndicesOperationResponse, Warmer};
pub use path::{Endpoint, HttpMethod, PathInfo};
pub use percolate::{
    PercolateDescriptor, PercolateResponse, PercolatorResponse, RegisterPercolatorDescriptor,
    UnregisterPercolatorDescriptor,
};
pub use query_string::{Consistency, QueryString, Replication, VersionType};
pub use resolver::{TypeNameResolver, infer_type_name};
pub use source::SourceDescriptor;
pub use transport::{RequestBody, Transport, TransportRequest, TransportResponse};
pub use update::{UpdateDescriptor, UpdateResponse};

/// Re-export of the async-trait macro for custom [`Transport`] implementations.
pub use async_trait::async_trait;

/// Prelude for common imports.
///
/// ```
/// use quarry_search::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bulk::{
        BulkDescriptor, BulkResponseItem, BulkResult, CreateOperation, DeleteOperation,
        IndexOperation, OpType, UpdateOperation,
    };
    pub use crate::client::Client;
    pub use crate::config::ConnectionSettings;
    pub use crate::document::{Document, TypeNameMarker};
    pub use crate::error::{QuarryError, Result};
    pub use crate::index::{CreateIndexDescriptor, Warmer};
    pub use crate::query_string::{Consistency, Replication, VersionType};
    pub use crate::transport::{Transport, TransportRequest, TransportResponse};
}
