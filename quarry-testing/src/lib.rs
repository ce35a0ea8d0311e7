//! Testing utilities for Quarry.
//!
//! - [`RecordingTransport`] records requests and answers from a script,
//!   including delays and timeouts
//! - [`InMemoryEngine`] serves bulk, update, source, index creation and
//!   percolator calls from memory
//! - Assertions for bulk results and recorded requests
//!
//! ## Quick Start
//!
//! ```no_run
//! use quarry_search::{Client, ConnectionSettings};
//! use quarry_testing::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let engine = Arc::new(InMemoryEngine::new());
//! let client = Client::with_transport(
//!     ConnectionSettings::default().with_default_index("projects"),
//!     engine.clone(),
//! );
//!
//! let created = client.create_index("projects", |d| d.number_of_shards(1)).await.unwrap();
//! assert!(created.ok);
//! assert!(engine.index_exists("projects"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod assertions;
mod engine;
mod mock;

pub use assertions::*;
pub use engine::InMemoryEngine;
pub use mock::RecordingTransport;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::engine::InMemoryEngine;
    pub use crate::mock::RecordingTransport;
}
