//! Search client.

use crate::bulk::{BulkCodec, BulkDescriptor, BulkResult, error_reason};
use crate::config::ConnectionSettings;
use crate::document::Document;
use crate::error::{QuarryError, Result};
use crate::index::{CreateIndexDescriptor, IndicesOperationResponse};
use crate::path::HttpMethod;
use crate::percolate::{
    PercolateDescriptor, PercolateResponse, PercolatorResponse, RegisterPercolatorDescriptor,
    UnregisterPercolatorDescriptor,
};
use crate::source::SourceDescriptor;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::update::{UpdateDescriptor, UpdateResponse};
use quarry_transport::HttpTransport;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Typed client for an Elasticsearch-style engine.
///
/// Every call resolves its path and validates its descriptor before the
/// transport is touched, and performs at most one round trip. Nothing is
/// retried.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    settings: Arc<ConnectionSettings>,
}

impl Client {
    /// Create a client talking HTTP to the node in `settings`.
    pub fn new(settings: ConnectionSettings) -> Result<Self> {
        info!(url = %settings.url, "Initializing search client");
        let transport = HttpTransport::new(settings.transport_config())?;
        Ok(Self::with_transport(settings, Arc::new(transport)))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(settings: ConnectionSettings, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            settings: Arc::new(settings),
        }
    }

    /// Connection settings.
    pub fn settings(&self) -> &Arc<ConnectionSettings> {
        &self.settings
    }

    /// Underlying transport.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    async fn perform(&self, endpoint: &'static str, request: TransportRequest) -> Result<TransportResponse> {
        debug!(
            endpoint,
            method = %request.method,
            path = %request.path,
            "Sending request"
        );
        self.transport.perform(request).await
    }

    // =========================================================================
    // Bulk
    // =========================================================================

    /// Start a bulk batch against this client's settings.
    pub fn bulk_descriptor(&self) -> BulkDescriptor {
        BulkDescriptor::new(self.settings.clone())
    }

    /// Send a bulk batch in one round trip.
    ///
    /// Item failures are reported in the result, never as an error. Retrying
    /// a batch is the caller's decision: index operations with an id are
    /// idempotent, create operations are not, and updates only under a
    /// version check.
    pub async fn bulk(&self, descriptor: BulkDescriptor) -> Result<BulkResult> {
        let request = descriptor.build()?;
        debug!(
            operations = request.operations().len(),
            path = request.path(),
            "Sending bulk batch"
        );

        let transport_request = TransportRequest::new(HttpMethod::Post, request.path())
            .with_query(request.query().to_vec())
            .with_ndjson(request.body());
        let response = self.perform("bulk", transport_request).await?;

        BulkCodec::decode(request.operations(), response.status, &response.body)
    }

    // =========================================================================
    // Indices
    // =========================================================================

    /// Create an index.
    pub async fn create_index(
        &self,
        index: impl Into<String>,
        configure: impl FnOnce(CreateIndexDescriptor) -> CreateIndexDescriptor,
    ) -> Result<IndicesOperationResponse> {
        let descriptor = configure(CreateIndexDescriptor::new(self.settings.clone()).index(index));
        let request = descriptor.to_request()?;
        let name = descriptor.index_name().unwrap_or_default().to_string();

        info!(index = %name, "Creating index");
        let response = self.perform("indices.create", request).await?;

        if !response.is_success() {
            let err = engine_error(&response);
            if let QuarryError::Engine { reason, .. } = &err
                && is_already_exists(reason)
            {
                return Err(QuarryError::IndexExists(name));
            }
            return Err(err);
        }

        response.json()
    }

    // =========================================================================
    // Percolator
    // =========================================================================

    /// Register a percolator query under `name` for the index of `T`.
    pub async fn register_percolator<T: Document>(
        &self,
        name: impl Into<String>,
        configure: impl FnOnce(RegisterPercolatorDescriptor) -> RegisterPercolatorDescriptor,
    ) -> Result<PercolatorResponse> {
        let descriptor = configure(
            RegisterPercolatorDescriptor::new(self.settings.clone())
                .index_of::<T>()
                .name(name),
        );
        let request = descriptor.to_request()?;
        let response = self.perform("percolator.register", request).await?;

        if !response.is_success() {
            return Err(engine_error(&response));
        }
        response.json()
    }

    /// Remove the percolator `name`. A missing percolator is reported with
    /// `found == false`.
    pub async fn unregister_percolator(
        &self,
        name: impl Into<String>,
        configure: impl FnOnce(UnregisterPercolatorDescriptor) -> UnregisterPercolatorDescriptor,
    ) -> Result<PercolatorResponse> {
        let descriptor = configure(UnregisterPercolatorDescriptor::new(self.settings.clone()).name(name));
        let request = descriptor.to_request()?;
        let response = self.perform("percolator.unregister", request).await?;

        match response.status {
            404 => Ok(response.json().unwrap_or_else(|_| PercolatorResponse {
                ok: true,
                ..PercolatorResponse::default()
            })),
            _ if response.is_success() => response.json(),
            _ => Err(engine_error(&response)),
        }
    }

    /// Match `object` against the registered percolator queries.
    pub async fn percolate<'a, T: Document>(
        &self,
        object: &'a T,
        configure: impl FnOnce(PercolateDescriptor<'a, T>) -> PercolateDescriptor<'a, T>,
    ) -> Result<PercolateResponse> {
        let descriptor = configure(PercolateDescriptor::new(self.settings.clone(), object));
        let request = descriptor.to_request()?;
        let response = self.perform("percolate", request).await?;

        if !response.is_success() {
            return Err(engine_error(&response));
        }
        response.json()
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Partially update or script-update a single document.
    pub async fn update<'a, T: Document + 'a>(
        &self,
        configure: impl FnOnce(UpdateDescriptor<'a, T>) -> UpdateDescriptor<'a, T>,
    ) -> Result<UpdateResponse> {
        let request = configure(UpdateDescriptor::new(self.settings.clone())).to_request()?;
        let response = self.perform("update", request).await?;

        match response.status {
            404 => Err(QuarryError::NotFound(error_text(&response))),
            _ if response.is_success() => response.json(),
            _ => Err(engine_error(&response)),
        }
    }

    /// Read the source of document `id` of type `T`. A missing document is `None`.
    pub async fn source<T: Document>(&self, id: impl Into<String>) -> Result<Option<T>> {
        self.source_with(|d| d.id(id)).await
    }

    /// Read a document's source with full control over the descriptor.
    pub async fn source_with<T: Document>(
        &self,
        configure: impl FnOnce(SourceDescriptor<T>) -> SourceDescriptor<T>,
    ) -> Result<Option<T>> {
        let request = configure(SourceDescriptor::new(self.settings.clone())).to_request()?;
        let response = self.perform("get_source", request).await?;

        match response.status {
            404 => Ok(None),
            _ if response.is_success() => response.json().map(Some),
            _ => Err(engine_error(&response)),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.settings.url)
            .field("default_index", &self.settings.default_index)
            .finish_non_exhaustive()
    }
}

fn error_text(response: &TransportResponse) -> String {
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(body) => body
            .get("error")
            .map(error_reason)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
    }
}

fn engine_error(response: &TransportResponse) -> QuarryError {
    let reason = error_text(response);
    warn!(status = response.status, reason = %reason, "Engine rejected request");
    QuarryError::Engine {
        status: response.status,
        reason,
    }
}

fn is_already_exists(reason: &str) -> bool {
    reason.contains("IndexAlreadyExistsException") || reason.contains("resource_already_exists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text() {
        let response = TransportResponse::new(
            400,
            r#"{"error":"IndexAlreadyExistsException[[projects] already exists]","status":400}"#,
        );
        let reason = error_text(&response);
        assert!(is_already_exists(&reason));

        let response = TransportResponse::new(
            400,
            r#"{"error":{"type":"resource_already_exists_exception","reason":"index [projects] already exists"}}"#,
        );
        assert!(is_already_exists(&error_text(&response)));

        let response = TransportResponse::new(502, "Bad Gateway");
        assert_eq!(error_text(&response), "Bad Gateway");
    }

    #[test]
    fn test_client_debug_hides_transport() {
        let client = Client::new(ConnectionSettings::default().with_default_index("projects")).unwrap();
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("localhost:9200"));
        assert!(rendered.contains("projects"));
    }
}
