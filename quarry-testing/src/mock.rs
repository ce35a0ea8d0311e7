// Scripted transport for testing

use async_trait::async_trait;
use parking_lot::Mutex;
use quarry_search::{QuarryError, Result, Transport, TransportRequest, TransportResponse};
use quarry_transport::TransportError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(TransportResponse),
    Delayed(Duration, TransportResponse),
    Timeout(Duration),
}

/// Transport that records every request and answers from a script.
///
/// Responses are consumed in order. When the script runs out, requests fail
/// with a connection error.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
}

impl RecordingTransport {
    /// Create a transport with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response
    pub fn with_response(self, status: u16, body: impl Into<String>) -> Self {
        self.push_response(status, body);
        self
    }

    /// Queue a JSON response
    pub fn with_json(self, status: u16, body: Value) -> Self {
        self.push_response(status, body.to_string());
        self
    }

    /// Queue a response delivered after `delay`
    pub fn with_delayed_response(self, delay: Duration, status: u16, body: impl Into<String>) -> Self {
        self.script.lock().push_back(Scripted::Delayed(
            delay,
            TransportResponse::new(status, body.into()),
        ));
        self
    }

    /// Queue a timeout
    pub fn with_timeout(self, after: Duration) -> Self {
        self.script.lock().push_back(Scripted::Timeout(after));
        self
    }

    /// Queue a raw response on a shared handle
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.script
            .lock()
            .push_back(Scripted::Respond(TransportResponse::new(status, body.into())));
    }

    /// All recorded requests, oldest first
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of recorded requests
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Most recent request
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    /// Number of scripted answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    /// Forget recorded requests
    pub fn clear(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().push(request);
        let next = self.script.lock().pop_front();

        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Scripted::Timeout(after)) => Err(QuarryError::Transport(TransportError::Timeout(after))),
            None => Err(QuarryError::Transport(TransportError::Connection(
                "no scripted response left".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_search::HttpMethod;

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let transport = RecordingTransport::new()
            .with_response(200, "{}")
            .with_timeout(Duration::from_secs(1));

        let first = transport
            .perform(TransportRequest::new(HttpMethod::Get, "/a"))
            .await
            .unwrap();
        assert_eq!(first.status, 200);

        let second = transport
            .perform(TransportRequest::new(HttpMethod::Get, "/b"))
            .await
            .unwrap_err();
        assert!(second.is_timeout());

        let third = transport
            .perform(TransportRequest::new(HttpMethod::Get, "/c"))
            .await
            .unwrap_err();
        assert!(!third.is_timeout());

        assert_eq!(transport.request_count(), 3);
        assert_eq!(transport.last_request().unwrap().path, "/c");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_response() {
        let transport =
            RecordingTransport::new().with_delayed_response(Duration::from_secs(5), 201, "{}");
        let response = transport
            .perform(TransportRequest::new(HttpMethod::Put, "/x"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(transport.remaining(), 0);
    }
}
