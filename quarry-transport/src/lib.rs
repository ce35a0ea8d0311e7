//! # Quarry HTTP Transport
//!
//! The network half of the Quarry search client: one HTTP round trip per call,
//! against a single engine node, with per-request timeouts and basic auth.
//!
//! The transport knows nothing about indices, documents or bulk batches. It
//! takes a method, a path, query pairs and an optional body, and hands back
//! the status code and raw body. Retries and connection pooling policy are
//! deliberately left to callers and to `reqwest`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_transport::{HttpTransport, HttpTransportConfig, Method};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpTransport::new(HttpTransportConfig::new("http://localhost:9200"))?;
//!
//!     let response = transport
//!         .request(Method::POST, "/_bulk")
//!         .query("refresh", "true")
//!         .ndjson("{\"delete\":{\"_index\":\"projects\",\"_type\":\"project\",\"_id\":\"1\"}}\n")
//!         .send()
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;

pub use client::HttpTransport;
pub use config::{HttpTransportConfig, HttpTransportConfigBuilder};
pub use error::{Result, TransportError};
pub use request::RequestBuilder;
pub use response::Response;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, StatusCode};
pub use url::Url;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::HttpTransport;
    pub use crate::config::{HttpTransportConfig, HttpTransportConfigBuilder};
    pub use crate::error::{Result, TransportError};
    pub use crate::request::RequestBuilder;
    pub use crate::response::Response;
    pub use http::{Method, StatusCode};
}
