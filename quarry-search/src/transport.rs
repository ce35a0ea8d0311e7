//! The seam between request building and the network.

use crate::error::Result;
use crate::path::HttpMethod;
use async_trait::async_trait;
use quarry_transport::{Bytes, HttpTransport, Method};
use serde::de::DeserializeOwned;

/// Serialized request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// A single JSON document.
    Json(String),
    /// Newline-delimited JSON.
    NdJson(String),
}

impl RequestBody {
    /// Body text.
    pub fn as_str(&self) -> &str {
        match self {
            RequestBody::Json(body) | RequestBody::NdJson(body) => body,
        }
    }
}

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path, starting with `/`.
    pub path: String,
    /// Query-string pairs.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    /// Request without query or body.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Set the query-string pairs.
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Set a JSON body.
    pub fn with_json(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Json(body.into()));
        self
    }

    /// Set an NDJSON body.
    pub fn with_ndjson(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::NdJson(body.into()));
        self
    }

    /// Query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Body text, if any.
    pub fn body_str(&self) -> Option<&str> {
        self.body.as_ref().map(RequestBody::as_str)
    }
}

/// Raw engine answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Executes one request against the engine.
///
/// Implementations perform exactly one round trip per call and never retry.
/// A timeout or cancellation is reported as an error, not as a response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request.
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse>;
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
        };

        let mut builder = self.request(method, request.path).queries(request.query);
        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json_body(body),
            Some(RequestBody::NdJson(body)) => builder.ndjson(body),
            None => builder,
        };

        let response = builder.send().await?;
        Ok(TransportResponse {
            status: response.status().as_u16(),
            body: response.into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = TransportRequest::new(HttpMethod::Post, "/_bulk")
            .with_query(vec![("refresh".to_string(), "true".to_string())])
            .with_ndjson("{}\n");

        assert_eq!(request.query_value("refresh"), Some("true"));
        assert_eq!(request.query_value("consistency"), None);
        assert_eq!(request.body, Some(RequestBody::NdJson("{}\n".to_string())));
        assert_eq!(request.body_str(), Some("{}\n"));
    }

    #[test]
    fn test_response_json() {
        let response = TransportResponse::new(201, r#"{"ok":true}"#);
        assert!(response.is_success());
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["ok"], true);

        assert!(!TransportResponse::new(404, "").is_success());
    }
}
