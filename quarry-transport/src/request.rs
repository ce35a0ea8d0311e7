//! Request builder.

use crate::{HttpTransport, Response, Result, TransportError};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::time::Duration;

/// Content type of newline-delimited JSON bodies (bulk requests).
const NDJSON: &str = "application/x-ndjson";

/// HTTP request builder.
pub struct RequestBuilder<'a> {
    transport: &'a HttpTransport,
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(transport: &'a HttpTransport, method: Method, path: String) -> Self {
        Self {
            transport,
            method,
            path,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    /// Add a header to the request. Invalid names or values are skipped.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters, preserving their order.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.query.push((k.into(), v.into()));
        }
        self
    }

    /// Set a JSON request body that is already serialized.
    pub fn json_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(body.into());
        self
    }

    /// Set a newline-delimited JSON body.
    pub fn ndjson(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.headers
            .insert(http::header::CONTENT_TYPE, HeaderValue::from_static(NDJSON));
        self.body = Some(body.into());
        self
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn basic_auth_header(&self) -> Option<String> {
        use base64::Engine;
        let config = self.transport.config();
        let username = config.username.as_ref()?;
        let credentials = format!(
            "{}:{}",
            username,
            config.password.as_deref().unwrap_or_default()
        );
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Some(format!("Basic {}", encoded))
    }

    /// Build the URL with query parameters.
    fn build_url(&self) -> Result<url::Url> {
        let base = self.transport.base_url();
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(format!(
                "{} cannot carry a path",
                base
            )));
        }

        // Appended, not joined: a base path such as a proxy prefix is kept.
        let mut url = base.clone();
        url.set_path(&format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        ));
        url.set_query(None);
        url.set_fragment(None);

        if !self.query.is_empty() {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                query_pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response> {
        let url = self.build_url()?;
        let timeout = self.timeout.unwrap_or(self.transport.config().timeout);

        let mut request = self.transport.inner().request(self.method.clone(), url);

        for (name, value) in &self.transport.config().default_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(auth) = self.basic_auth_header() {
            request = request.header(http::header::AUTHORIZATION, auth);
        }

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        request = request.timeout(timeout);

        self.transport.execute(request.build()?, timeout).await
    }
}
