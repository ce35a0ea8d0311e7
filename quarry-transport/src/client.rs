//! HTTP transport implementation.

use http::Method;
use reqwest::Request;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::{HttpTransportConfig, RequestBuilder, Response, Result, TransportError};

/// HTTP transport bound to a single engine node.
#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    base_url: Url,
    config: Arc<HttpTransportConfig>,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if config.gzip {
            builder = builder.gzip(true);
        }

        let inner = builder
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        debug!(base_url = %base_url, "HTTP transport initialized");

        Ok(Self {
            inner,
            base_url,
            config: Arc::new(config),
        })
    }

    /// Get the underlying reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    /// Get the parsed base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create a request builder for `path`, relative to the base URL.
    pub fn request(&self, method: Method, path: impl Into<String>) -> RequestBuilder<'_> {
        RequestBuilder::new(self, method, path.into())
    }

    /// Execute a built request once.
    pub(crate) async fn execute(&self, request: Request, timeout: Duration) -> Result<Response> {
        debug!(method = %request.method(), url = %request.url(), "Sending request");

        let response = self
            .inner
            .execute(request)
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        Response::from_reqwest(response, timeout).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        assert_eq!(transport.base_url().as_str(), "http://localhost:9200/");
        assert!(transport.config().gzip);
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpTransport::new(HttpTransportConfig::new("not a url"));
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let config = HttpTransportConfig::builder("http://localhost:9200")
            .basic_auth("elastic", "secret")
            .build();
        let transport = HttpTransport::new(config).unwrap();
        let debug = format!("{:?}", transport);
        assert!(debug.contains("HttpTransport"));
        assert!(!debug.contains("secret"));
    }
}
