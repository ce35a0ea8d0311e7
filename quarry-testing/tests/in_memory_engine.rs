//! Client calls served by the in-memory engine.

use quarry_search::HttpMethod;
use quarry_search::prelude::*;
use quarry_testing::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Project {
    id: u32,
    name: String,
    country: String,
}

impl Document for Project {
    fn type_tag() -> &'static str {
        "Project"
    }

    fn id(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}

fn project(id: u32, country: &str) -> Project {
    Project {
        id,
        name: format!("project-{}", id),
        country: country.to_string(),
    }
}

fn client() -> (Client, Arc<InMemoryEngine>) {
    let engine = Arc::new(InMemoryEngine::new());
    let client = Client::with_transport(
        ConnectionSettings::default().with_default_index("quarry_test"),
        engine.clone(),
    );
    (client, engine)
}

#[tokio::test]
async fn test_bulk_then_source() {
    let (client, engine) = client();
    let projects = vec![project(1, "nl"), project(2, "be")];

    let mut bulk = client.bulk_descriptor();
    bulk.index_many(&projects).unwrap().refresh(true);
    let result = client.bulk(bulk).await.unwrap();

    assert_bulk_ok(&result);
    assert_eq!(engine.document_count("quarry_test"), 2);

    let request = engine.requests().pop().unwrap();
    assert_request(&request, HttpMethod::Post, "/_bulk");
    assert_query(&request, "refresh", "true");

    let read: Option<Project> = client.source("2").await.unwrap();
    assert_eq!(read, Some(project(2, "be")));

    let missing: Option<Project> = client.source("3").await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_mixed_batch_reports_each_item() {
    let (client, engine) = client();
    engine.seed("quarry_test", "project", "1", json!({"id": 1, "name": "a", "country": "nl"}));

    let fresh = project(2, "nl");
    let taken = project(1, "nl");

    let mut bulk = client.bulk_descriptor();
    bulk.create(CreateOperation::new(&taken))
        .unwrap()
        .create(CreateOperation::new(&fresh))
        .unwrap()
        .delete(DeleteOperation::<Project>::new().id("404"))
        .unwrap()
        .update(
            UpdateOperation::<Project>::new()
                .id("1")
                .document(&json!({"name": "renamed"})),
        )
        .unwrap();
    let result = client.bulk(bulk).await.unwrap();

    assert!(result.is_valid);
    assert_op_types(
        &result,
        &[OpType::Create, OpType::Create, OpType::Delete, OpType::Update],
    );
    assert_item_failed(&result, 0, "DocumentAlreadyExistsException");
    assert_failed_count(&result, 1);
    assert_eq!(
        engine.document("quarry_test", "project", "1").unwrap()["name"],
        "renamed"
    );
}

#[tokio::test]
async fn test_index_without_id_gets_engine_id() {
    let (client, engine) = client();

    let mut bulk = client.bulk_descriptor();
    bulk.index(IndexOperation::new(&json_doc()).index("loose").type_name("doc"))
        .unwrap();
    let result = client.bulk(bulk).await.unwrap();

    assert_bulk_ok(&result);
    assert_op_types(&result, &[OpType::Index]);
    let id = result.items[0].id.clone().unwrap();
    assert!(!id.is_empty());
    assert!(engine.document("loose", "doc", &id).is_some());
}

#[derive(Debug, Serialize, Deserialize)]
struct Loose {
    value: u32,
}

impl Document for Loose {
    fn type_tag() -> &'static str {
        "Loose"
    }
}

fn json_doc() -> Loose {
    Loose { value: 7 }
}

#[tokio::test]
async fn test_create_index_twice() {
    let (client, engine) = client();

    let created = client
        .create_index("catalog", |d| d.number_of_shards(2).number_of_replicas(0))
        .await
        .unwrap();
    assert!(created.ok);
    assert_eq!(
        engine.index_settings("catalog").unwrap()["settings"]["number_of_shards"],
        2
    );

    let err = client.create_index("catalog", |d| d).await.unwrap_err();
    assert!(matches!(err, QuarryError::IndexExists(ref name) if name == "catalog"));
}

#[tokio::test]
async fn test_percolator_round_trip() {
    let (client, engine) = client();

    let registered = client
        .register_percolator::<Project>("dutch", |d| {
            d.query(json!({"term": {"country": "nl"}}))
                .add_metadata("color", "blue")
        })
        .await
        .unwrap();
    assert!(registered.ok);
    assert!(engine.percolator("quarry_test", "dutch").is_some());

    let matched = client.percolate(&project(1, "nl"), |d| d).await.unwrap();
    assert!(matched.matched("dutch"));

    let filtered = client
        .percolate(&project(1, "nl"), |d| {
            d.query(json!({"term": {"color": "red"}}))
        })
        .await
        .unwrap();
    assert!(filtered.matches.is_empty());

    let removed = client.unregister_percolator("dutch", |d| d).await.unwrap();
    assert!(removed.found);
    let again = client.unregister_percolator("dutch", |d| d).await.unwrap();
    assert!(!again.found);
}

#[tokio::test]
async fn test_single_update_of_missing_document() {
    let (client, _engine) = client();

    let err = client
        .update::<Project>(|d| d.id("9").document(&json!({"name": "x"})))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
