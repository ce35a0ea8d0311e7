//! Integration tests for quarry-transport against a mock HTTP server.

use quarry_transport::*;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_ndjson_post_with_query() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(query_param("refresh", "true"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string("{\"delete\":{\"_id\":\"1\"}}\n"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"took\":1,\"items\":[]}"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(HttpTransportConfig::new(server.uri())).unwrap();
    let response = transport
        .request(Method::POST, "/_bulk")
        .query("refresh", "true")
        .ndjson("{\"delete\":{\"_id\":\"1\"}}\n")
        .send()
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.text(), "{\"took\":1,\"items\":[]}");
}

#[tokio::test]
async fn test_error_status_is_not_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/project/42/_source"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(HttpTransportConfig::new(server.uri())).unwrap();
    let response = transport
        .request(Method::GET, "/projects/project/42/_source")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_basic_auth_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpTransportConfig::builder(server.uri())
        .basic_auth("user", "pass")
        .build();
    let transport = HttpTransport::new(config).unwrap();
    let response = transport.request(Method::GET, "/").send().await.unwrap();

    assert!(response.is_success());
}

#[tokio::test]
async fn test_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(HttpTransportConfig::new(server.uri())).unwrap();
    let result = transport
        .request(Method::POST, "/_bulk")
        .timeout(Duration::from_millis(50))
        .send()
        .await;

    let err = result.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {:?}", err);
}
