//! Integration tests for common Quarry workflows.
//!
//! These run the full client against the in-memory engine or a scripted
//! transport.

use quarry::prelude::*;
use quarry::{BulkCodec, HttpMethod};
use quarry_testing::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ElasticsearchProject {
    id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Document for ElasticsearchProject {
    fn type_tag() -> &'static str {
        "ElasticsearchProject"
    }

    fn id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}

fn settings() -> ConnectionSettings {
    ConnectionSettings::default().with_default_index("nest_test_data")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn in_memory() -> (Client, Arc<InMemoryEngine>) {
    let engine = Arc::new(InMemoryEngine::new());
    (Client::with_transport(settings(), engine.clone()), engine)
}

// =============================================================================
// Bulk Workflows
// =============================================================================

#[tokio::test]
async fn test_bulk_index_then_update_then_read() {
    init_tracing();
    let (client, engine) = in_memory();
    let projects: Vec<ElasticsearchProject> = (5000..6000)
        .map(|id| ElasticsearchProject { id, name: None })
        .collect();

    // Index 1000 documents in one batch
    let mut bulk = client.bulk_descriptor();
    bulk.index_many(&projects).unwrap();
    let result = client.bulk(bulk).await.unwrap();

    assert_bulk_ok(&result);
    assert_eq!(result.len(), 1000);
    assert!(result.iter().all(|item| item.op_type == OpType::Index));
    assert_eq!(engine.document_count("nest_test_data"), 1000);

    // Rename every document in a second batch
    let mut bulk = client.bulk_descriptor();
    for project in &projects {
        bulk.update(
            UpdateOperation::new()
                .object(project)
                .document(&json!({"name": format!("Sufixed-{}", project.id)})),
        )
        .unwrap();
    }
    bulk.refresh(true);
    let result = client.bulk(bulk).await.unwrap();

    assert_bulk_ok(&result);
    assert_eq!(result.len(), 1000);
    assert_eq!(result.items[0].id.as_deref(), Some("5000"));
    assert_eq!(result.items[999].id.as_deref(), Some("5999"));
    assert_query(&engine.requests()[1], "refresh", "true");

    let read: Option<ElasticsearchProject> = client.source("5000").await.unwrap();
    assert_eq!(read.unwrap().name.as_deref(), Some("Sufixed-5000"));
}

#[tokio::test]
async fn test_version_conflict_fails_one_item() {
    let (client, engine) = in_memory();
    engine.seed("nest_test_data", "elasticsearchproject", "1", json!({"id": 1}));

    let fresh: Vec<ElasticsearchProject> = (2..5)
        .map(|id| ElasticsearchProject { id, name: None })
        .collect();

    let mut bulk = client.bulk_descriptor();
    bulk.index_many(&fresh)
        .unwrap()
        .update(
            UpdateOperation::<ElasticsearchProject>::new()
                .id("1")
                .version(42)
                .document(&json!({"name": "stale"})),
        )
        .unwrap();
    let result = client.bulk(bulk).await.unwrap();

    assert!(result.is_valid);
    assert_eq!(result.len(), 4);
    assert_failed_count(&result, 1);
    assert_item_failed(&result, 3, "VersionConflictEngineException");
    assert!(result.items[..3].iter().all(|item| item.ok));
    assert_eq!(
        engine.document("nest_test_data", "elasticsearchproject", "1"),
        Some(json!({"id": 1}))
    );
}

#[tokio::test]
async fn test_timeout_produces_no_result() {
    init_tracing();
    let transport = RecordingTransport::new().with_timeout(Duration::from_secs(30));
    let client = Client::with_transport(settings(), Arc::new(transport.clone()));

    let mut bulk = client.bulk_descriptor();
    bulk.delete(DeleteOperation::<ElasticsearchProject>::new().id("1"))
        .unwrap();
    let err = client.bulk(bulk).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_wrong_item_count_is_protocol_error() {
    let transport = RecordingTransport::new().with_json(
        200,
        json!({"took": 1, "items": [{"index": {"_index": "nest_test_data", "_type": "elasticsearchproject", "_id": "1", "ok": true}}]}),
    );
    let client = Client::with_transport(settings(), Arc::new(transport));

    let projects = [
        ElasticsearchProject { id: 1, name: None },
        ElasticsearchProject { id: 2, name: None },
    ];
    let mut bulk = client.bulk_descriptor();
    bulk.index_many(&projects).unwrap();

    let err = client.bulk(bulk).await.unwrap_err();
    assert!(err.is_protocol());
}

#[test]
fn test_mixed_batch_wire_format() {
    let project = ElasticsearchProject { id: 1, name: None };
    let mut bulk = BulkDescriptor::new(Arc::new(settings()));
    bulk.index(IndexOperation::new(&project))
        .unwrap()
        .update(
            UpdateOperation::<ElasticsearchProject>::new()
                .id("2")
                .document(&json!({"name": "x"})),
        )
        .unwrap()
        .delete(DeleteOperation::<ElasticsearchProject>::new().id("3"))
        .unwrap();

    let body = BulkCodec::encode(bulk.operations()).unwrap();
    let request = TransportRequest::new(HttpMethod::Post, "/_bulk").with_ndjson(body);

    assert_ndjson_lines(
        &request,
        &[
            json!({"index": {"_index": "nest_test_data", "_type": "elasticsearchproject", "_id": "1"}}),
            json!({"id": 1}),
            json!({"update": {"_index": "nest_test_data", "_type": "elasticsearchproject", "_id": "2"}}),
            json!({"doc": {"name": "x"}}),
            json!({"delete": {"_index": "nest_test_data", "_type": "elasticsearchproject", "_id": "3"}}),
        ],
    );
}

// =============================================================================
// Index and Percolator Workflows
// =============================================================================

#[tokio::test]
async fn test_create_index_conflict() {
    let (client, _engine) = in_memory();

    client
        .create_index("nest_test_data", |d| d.number_of_replicas(0))
        .await
        .unwrap();
    let err = client
        .create_index("nest_test_data", |d| d)
        .await
        .unwrap_err();

    assert!(matches!(err, QuarryError::IndexExists(_)));
}

#[tokio::test]
async fn test_percolate_registered_query() {
    let (client, engine) = in_memory();

    client
        .register_percolator::<ElasticsearchProject>("named", |d| {
            d.query(json!({"match": {"name": "quarry"}}))
        })
        .await
        .unwrap();

    let doc = ElasticsearchProject {
        id: 9,
        name: Some("Quarry client".to_string()),
    };
    let response = client.percolate(&doc, |d| d).await.unwrap();
    assert_eq!(response.matches, vec!["named".to_string()]);

    let requests = engine.requests();
    assert_request(&requests[0], HttpMethod::Put, "/_percolator/nest_test_data/named");
    assert_request(
        &requests[1],
        HttpMethod::Get,
        "/nest_test_data/elasticsearchproject/_percolate",
    );
}
