//! In-memory engine.
//!
//! Serves the subset of the REST API the client speaks: bulk, single update,
//! source reads, index creation and the percolator. Writes are visible
//! immediately, so `refresh` is accepted and ignored. Queries support
//! `match_all`, `term`, `match` and `bool`; scripts are rejected.

use async_trait::async_trait;
use parking_lot::Mutex;
use quarry_search::{HttpMethod, Result, Transport, TransportRequest, TransportResponse};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredDocument {
    source: Value,
    version: i64,
}

#[derive(Debug, Default)]
struct IndexState {
    settings: Value,
    documents: HashMap<(String, String), StoredDocument>,
}

#[derive(Debug, Clone)]
struct Percolator {
    query: Value,
    metadata: Map<String, Value>,
    version: i64,
}

#[derive(Debug, Default)]
struct EngineState {
    indices: BTreeMap<String, IndexState>,
    percolators: BTreeMap<String, BTreeMap<String, Percolator>>,
}

/// Address of a document.
#[derive(Debug, Clone)]
struct Target {
    index: String,
    type_name: String,
    id: Option<String>,
}

impl Target {
    fn describe(&self, id: &str) -> String {
        format!("[{}][0] [{}][{}]", self.index, self.type_name, id)
    }
}

/// Write preconditions.
#[derive(Debug, Clone, Default)]
struct Preconditions {
    version: Option<i64>,
    version_type: Option<String>,
}

/// A write that was applied.
#[derive(Debug)]
struct Applied {
    id: String,
    version: i64,
    found: bool,
}

/// A write the engine refused.
#[derive(Debug)]
struct Refused {
    status: u16,
    message: String,
}

impl Refused {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

type Outcome = std::result::Result<Applied, Refused>;

#[derive(Debug)]
struct BulkAction {
    op: String,
    target: Target,
    preconditions: Preconditions,
    payload: Option<Value>,
}

/// Engine double implementing [`Transport`].
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: Mutex<EngineState>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl InMemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document directly, bypassing the REST surface.
    pub fn seed(&self, index: &str, type_name: &str, id: &str, source: Value) {
        let mut state = self.state.lock();
        let documents = &mut state.indices.entry(index.to_string()).or_default().documents;
        let key = (type_name.to_string(), id.to_string());
        let version = documents.get(&key).map_or(1, |d| d.version + 1);
        documents.insert(key, StoredDocument { source, version });
    }

    /// Stored source of a document.
    pub fn document(&self, index: &str, type_name: &str, id: &str) -> Option<Value> {
        self.stored(index, type_name, id).map(|d| d.source)
    }

    /// Stored version of a document.
    pub fn version(&self, index: &str, type_name: &str, id: &str) -> Option<i64> {
        self.stored(index, type_name, id).map(|d| d.version)
    }

    fn stored(&self, index: &str, type_name: &str, id: &str) -> Option<StoredDocument> {
        self.state
            .lock()
            .indices
            .get(index)?
            .documents
            .get(&(type_name.to_string(), id.to_string()))
            .cloned()
    }

    /// Number of documents in an index.
    pub fn document_count(&self, index: &str) -> usize {
        self.state
            .lock()
            .indices
            .get(index)
            .map_or(0, |i| i.documents.len())
    }

    /// Whether an index exists.
    pub fn index_exists(&self, index: &str) -> bool {
        self.state.lock().indices.contains_key(index)
    }

    /// Body an index was created with.
    pub fn index_settings(&self, index: &str) -> Option<Value> {
        self.state.lock().indices.get(index).map(|i| i.settings.clone())
    }

    /// Registered percolator query.
    pub fn percolator(&self, index: &str, name: &str) -> Option<Value> {
        self.state
            .lock()
            .percolators
            .get(index)?
            .get(name)
            .map(|p| p.query.clone())
    }

    /// All requests served, oldest first.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests served.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn route(&self, request: &TransportRequest) -> TransportResponse {
        let segments: Vec<String> = request
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| s.to_string())
            })
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let body = request.body_str();

        use HttpMethod::*;
        match (request.method, segments.as_slice()) {
            (Post | Put, ["_bulk"]) => self.bulk(None, None, body),
            (Post | Put, [index, "_bulk"]) => self.bulk(Some(index), None, body),
            (Post | Put, [index, type_name, "_bulk"]) => self.bulk(Some(index), Some(type_name), body),
            (Put, ["_percolator", index, name]) => self.register_percolator(index, name, body),
            (Delete, ["_percolator", index, name]) => self.unregister_percolator(index, name),
            (Get | Post, [index, _, "_percolate"]) => self.percolate(index, body),
            (Post, [index, type_name, id, "_update"]) => self.update(index, type_name, id, body),
            (Get, [index, type_name, id, "_source"]) => self.source(index, type_name, id),
            (Post | Put, [index]) => self.create_index(index, body),
            _ => error_response(
                400,
                format!(
                    "No handler found for uri [{}] and method [{}]",
                    request.path, request.method
                ),
            ),
        }
    }

    fn bulk(&self, index: Option<&str>, type_name: Option<&str>, body: Option<&str>) -> TransportResponse {
        let actions = match parse_bulk(body.unwrap_or_default(), index, type_name) {
            Ok(actions) if !actions.is_empty() => actions,
            Ok(_) => {
                return error_response(
                    400,
                    "ActionRequestValidationException[Validation Failed: 1: no requests added;]",
                );
            }
            Err(message) => return error_response(400, message),
        };

        let mut state = self.state.lock();
        let items: Vec<Value> = actions
            .into_iter()
            .map(|action| {
                let outcome = match action.op.as_str() {
                    "index" => state.put(&action.target, &action.preconditions, action.payload, false),
                    "create" => state.put(&action.target, &action.preconditions, action.payload, true),
                    "update" => state.update(&action.target, &action.preconditions, action.payload),
                    _ => state.delete(&action.target, &action.preconditions),
                };
                let mut item = target_json(&action.target, action.target.id.as_deref());
                match outcome {
                    Ok(applied) => {
                        item.insert("_id".to_string(), json!(applied.id));
                        item.insert("_version".to_string(), json!(applied.version));
                        item.insert("ok".to_string(), json!(true));
                        if action.op == "delete" {
                            item.insert("found".to_string(), json!(applied.found));
                        }
                    }
                    Err(refused) => {
                        item.insert("error".to_string(), json!(refused.message));
                    }
                }
                // Generating an id turns an index into a create.
                let reported = if action.op == "index" && action.target.id.is_none() {
                    "create".to_string()
                } else {
                    action.op
                };
                let mut wrapper = Map::new();
                wrapper.insert(reported, Value::Object(item));
                Value::Object(wrapper)
            })
            .collect();

        json_response(200, json!({"took": 1, "items": items}))
    }

    fn update(&self, index: &str, type_name: &str, id: &str, body: Option<&str>) -> TransportResponse {
        let payload = match body.map(serde_json::from_str::<Value>) {
            Some(Ok(payload)) => payload,
            _ => return error_response(400, "ActionRequestValidationException[Validation Failed: 1: script or doc is missing;]"),
        };
        let target = Target {
            index: index.to_string(),
            type_name: type_name.to_string(),
            id: Some(id.to_string()),
        };

        match self.state.lock().update(&target, &Preconditions::default(), Some(payload)) {
            Ok(applied) => {
                let mut body = target_json(&target, Some(&applied.id));
                body.insert("ok".to_string(), json!(true));
                body.insert("_version".to_string(), json!(applied.version));
                json_response(200, Value::Object(body))
            }
            Err(refused) => error_response(refused.status, refused.message),
        }
    }

    fn source(&self, index: &str, type_name: &str, id: &str) -> TransportResponse {
        match self.document(index, type_name, id) {
            Some(source) => json_response(200, source),
            None => TransportResponse::new(404, ""),
        }
    }

    fn create_index(&self, index: &str, body: Option<&str>) -> TransportResponse {
        if index.starts_with('_') || index.chars().any(|c| c.is_uppercase()) {
            return error_response(
                400,
                format!("InvalidIndexNameException[[{0}] Invalid index name [{0}], must be lowercase]", index),
            );
        }

        let settings = match body.filter(|b| !b.trim().is_empty()).map(serde_json::from_str::<Value>) {
            None => json!({}),
            Some(Ok(settings)) => settings,
            Some(Err(e)) => return error_response(400, format!("ElasticSearchParseException[Failed to parse content: {}]", e)),
        };

        let mut state = self.state.lock();
        if state.indices.contains_key(index) {
            return error_response(400, format!("IndexAlreadyExistsException[[{}] Already exists]", index));
        }
        state.indices.insert(
            index.to_string(),
            IndexState {
                settings,
                documents: HashMap::new(),
            },
        );
        json_response(200, json!({"ok": true, "acknowledged": true}))
    }

    fn register_percolator(&self, index: &str, name: &str, body: Option<&str>) -> TransportResponse {
        let mut metadata = match body.map(serde_json::from_str::<Value>) {
            Some(Ok(Value::Object(map))) => map,
            _ => return error_response(400, "ElasticSearchParseException[Failed to derive xcontent from (offset=0, length=0): []]"),
        };
        let Some(query) = metadata.remove("query") else {
            return error_response(400, "PercolatorException[[_percolator] failed to parse query [".to_string() + name + "]]");
        };

        let mut state = self.state.lock();
        let registered = state.percolators.entry(index.to_string()).or_default();
        let version = registered.get(name).map_or(1, |p| p.version + 1);
        registered.insert(
            name.to_string(),
            Percolator {
                query,
                metadata,
                version,
            },
        );

        json_response(
            if version == 1 { 201 } else { 200 },
            json!({"ok": true, "_index": "_percolator", "_type": index, "_id": name, "_version": version}),
        )
    }

    fn unregister_percolator(&self, index: &str, name: &str) -> TransportResponse {
        let removed = self
            .state
            .lock()
            .percolators
            .get_mut(index)
            .and_then(|registered| registered.remove(name));

        let (status, found, version) = match removed {
            Some(p) => (200, true, p.version + 1),
            None => (404, false, 1),
        };
        json_response(
            status,
            json!({"ok": true, "found": found, "_index": "_percolator", "_type": index, "_id": name, "_version": version}),
        )
    }

    fn percolate(&self, index: &str, body: Option<&str>) -> TransportResponse {
        let request = match body.map(serde_json::from_str::<Value>) {
            Some(Ok(request)) => request,
            _ => return error_response(400, "ElasticSearchParseException[No doc to percolate in the request]"),
        };
        let Some(doc) = request.get("doc") else {
            return error_response(400, "ElasticSearchParseException[No doc to percolate in the request]");
        };
        let filter = request.get("query");

        let state = self.state.lock();
        let matches: Vec<&String> = state
            .percolators
            .get(index)
            .map(|registered| {
                registered
                    .iter()
                    .filter(|(_, p)| filter.is_none_or(|f| matches_query(f, &Value::Object(p.metadata.clone()))))
                    .filter(|(_, p)| matches_query(&p.query, doc))
                    .map(|(name, _)| name)
                    .collect()
            })
            .unwrap_or_default();

        json_response(200, json!({"ok": true, "matches": matches}))
    }
}

impl EngineState {
    fn documents(&mut self, index: &str) -> &mut HashMap<(String, String), StoredDocument> {
        &mut self.indices.entry(index.to_string()).or_default().documents
    }

    fn put(&mut self, target: &Target, pre: &Preconditions, source: Option<Value>, create: bool) -> Outcome {
        let Some(source) = source.filter(Value::is_object) else {
            return Err(Refused::new(400, "MapperParsingException[failed to parse, document is empty]"));
        };
        let id = target
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let key = (target.type_name.clone(), id.clone());
        let documents = self.documents(&target.index);
        let current = documents.get(&key).map(|d| d.version);

        if create && current.is_some() {
            return Err(Refused::new(
                409,
                format!("DocumentAlreadyExistsException[{}: document already exists]", target.describe(&id)),
            ));
        }
        let version = next_version(target, &id, current, pre)?;
        documents.insert(key, StoredDocument { source, version });

        Ok(Applied {
            id,
            version,
            found: current.is_some(),
        })
    }

    fn update(&mut self, target: &Target, pre: &Preconditions, payload: Option<Value>) -> Outcome {
        let id = target.id.clone().unwrap_or_default();
        let payload = payload.unwrap_or(Value::Null);
        let key = (target.type_name.clone(), id.clone());
        let documents = self.documents(&target.index);

        let Some(existing) = documents.get(&key).cloned() else {
            let upsert = payload.get("upsert").cloned().or_else(|| {
                payload
                    .get("doc_as_upsert")
                    .and_then(Value::as_bool)
                    .filter(|enabled| *enabled)
                    .and_then(|_| payload.get("doc").cloned())
            });
            return match upsert {
                Some(source) => {
                    documents.insert(key, StoredDocument { source, version: 1 });
                    Ok(Applied {
                        id,
                        version: 1,
                        found: false,
                    })
                }
                None => Err(Refused::new(
                    404,
                    format!("DocumentMissingException[{}: document missing]", target.describe(&id)),
                )),
            };
        };

        if payload.get("script").is_some() {
            return Err(Refused::new(
                400,
                "ElasticSearchIllegalArgumentException[failed to execute script: scripting is not available]",
            ));
        }
        let Some(partial) = payload.get("doc") else {
            return Err(Refused::new(
                400,
                "ActionRequestValidationException[Validation Failed: 1: script or doc is missing;]",
            ));
        };

        let version = next_version(target, &id, Some(existing.version), pre)?;
        let mut source = existing.source;
        merge(&mut source, partial);
        documents.insert(key, StoredDocument { source, version });

        Ok(Applied {
            id,
            version,
            found: true,
        })
    }

    fn delete(&mut self, target: &Target, pre: &Preconditions) -> Outcome {
        let id = target.id.clone().unwrap_or_default();
        let key = (target.type_name.clone(), id.clone());
        let documents = self.documents(&target.index);
        let current = documents.get(&key).map(|d| d.version);

        let version = next_version(target, &id, current, pre)?;
        let found = documents.remove(&key).is_some();
        Ok(Applied { id, version, found })
    }
}

fn next_version(target: &Target, id: &str, current: Option<i64>, pre: &Preconditions) -> std::result::Result<i64, Refused> {
    let conflict = |provided: i64| {
        Refused::new(
            409,
            format!(
                "VersionConflictEngineException[{}: version conflict, current [{}], provided [{}]]",
                target.describe(id),
                current.unwrap_or(-1),
                provided
            ),
        )
    };

    match (pre.version, pre.version_type.as_deref()) {
        (Some(provided), Some("external")) => {
            if current.is_some_and(|c| provided <= c) {
                Err(conflict(provided))
            } else {
                Ok(provided)
            }
        }
        (Some(provided), _) => {
            if current == Some(provided) {
                Ok(provided + 1)
            } else {
                Err(conflict(provided))
            }
        }
        (None, _) => Ok(current.map_or(1, |c| c + 1)),
    }
}

fn parse_bulk(body: &str, index: Option<&str>, type_name: Option<&str>) -> std::result::Result<Vec<BulkAction>, String> {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty()).enumerate();
    let mut actions = Vec::new();

    while let Some((n, line)) = lines.next() {
        let malformed = || format!("ElasticSearchIllegalArgumentException[Malformed action/metadata line [{}]]", n + 1);

        let action: Value = serde_json::from_str(line).map_err(|_| malformed())?;
        let Some((op, meta)) = action.as_object().filter(|o| o.len() == 1).and_then(|o| o.iter().next()) else {
            return Err(malformed());
        };
        if !matches!(op.as_str(), "index" | "create" | "update" | "delete") {
            return Err(format!("ElasticSearchIllegalArgumentException[Action/metadata line [{}] contains an unknown parameter [{}]]", n + 1, op));
        }

        let field = |name: &str| meta.get(name).and_then(Value::as_str).map(str::to_string);
        let target = Target {
            index: field("_index")
                .or_else(|| index.map(str::to_string))
                .ok_or_else(|| format!("ActionRequestValidationException[Validation Failed: 1: index is missing for line [{}];]", n + 1))?,
            type_name: field("_type")
                .or_else(|| type_name.map(str::to_string))
                .ok_or_else(|| format!("ActionRequestValidationException[Validation Failed: 1: type is missing for line [{}];]", n + 1))?,
            id: field("_id"),
        };
        if matches!(op.as_str(), "update" | "delete") && target.id.is_none() {
            return Err(format!("ActionRequestValidationException[Validation Failed: 1: id is missing for line [{}];]", n + 1));
        }
        let preconditions = Preconditions {
            version: meta.get("_version").and_then(Value::as_i64),
            version_type: field("_version_type"),
        };

        let payload = if op == "delete" {
            None
        } else {
            let (_, source) = lines.next().ok_or_else(|| format!("ElasticSearchParseException[Missing source for line [{}]]", n + 1))?;
            Some(serde_json::from_str(source).map_err(|e| format!("MapperParsingException[failed to parse]; nested: {}", e))?)
        };

        actions.push(BulkAction {
            op: op.clone(),
            target,
            preconditions,
            payload,
        });
    }

    Ok(actions)
}

fn merge(target: &mut Value, partial: &Value) {
    match (target, partial) {
        (Value::Object(target), Value::Object(partial)) => {
            for (key, value) in partial {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => merge(existing, value),
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, partial) => *target = partial.clone(),
    }
}

/// Evaluate the supported query subset against a document.
fn matches_query(query: &Value, doc: &Value) -> bool {
    let Some((kind, clause)) = query.as_object().and_then(|q| q.iter().next()) else {
        return false;
    };

    match kind.as_str() {
        "match_all" => true,
        "term" => single_field(clause).is_some_and(|(field, expected)| {
            let expected = match expected {
                Value::Object(o) => o.get("value").cloned().unwrap_or(Value::Null),
                other => other.clone(),
            };
            let expected = scalar_text(&expected);
            tokens(lookup(doc, field)).iter().any(|t| Some(t) == expected.as_ref())
        }),
        "match" => single_field(clause).is_some_and(|(field, query)| {
            let text = match query {
                Value::Object(o) => o.get("query").and_then(scalar_text),
                other => scalar_text(other),
            };
            let field_tokens = tokens(lookup(doc, field));
            text.is_some_and(|text| {
                text.split_whitespace()
                    .any(|word| field_tokens.contains(&word.to_lowercase()))
            })
        }),
        "bool" => {
            let clauses = |name: &str| -> Vec<Value> {
                match clause.get(name) {
                    Some(Value::Array(items)) => items.clone(),
                    Some(single) => vec![single.clone()],
                    None => Vec::new(),
                }
            };
            let must = clauses("must");
            let should = clauses("should");
            let must_not = clauses("must_not");
            must.iter().all(|q| matches_query(q, doc))
                && (should.is_empty() || should.iter().any(|q| matches_query(q, doc)))
                && !must_not.iter().any(|q| matches_query(q, doc))
        }
        _ => false,
    }
}

fn single_field(clause: &Value) -> Option<(&str, &Value)> {
    clause
        .as_object()
        .and_then(|c| c.iter().next())
        .map(|(field, value)| (field.as_str(), value))
}

fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    field.split('.').try_fold(doc, |value, part| value.get(part))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Lowercased whitespace tokens plus the whole lowercased value.
fn tokens(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().flat_map(|v| tokens(Some(v))).collect(),
        Some(value) => match scalar_text(value) {
            Some(text) => {
                let lower = text.to_lowercase();
                let mut out: Vec<String> = lower.split_whitespace().map(str::to_string).collect();
                out.push(lower);
                out
            }
            None => Vec::new(),
        },
        None => Vec::new(),
    }
}

fn target_json(target: &Target, id: Option<&str>) -> Map<String, Value> {
    let mut item = Map::new();
    item.insert("_index".to_string(), json!(target.index));
    item.insert("_type".to_string(), json!(target.type_name));
    if let Some(id) = id {
        item.insert("_id".to_string(), json!(id));
    }
    item
}

fn json_response(status: u16, body: Value) -> TransportResponse {
    TransportResponse::new(status, body.to_string())
}

fn error_response(status: u16, message: impl Into<String>) -> TransportResponse {
    json_response(status, json!({"error": message.into(), "status": status}))
}

#[async_trait]
impl Transport for InMemoryEngine {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse> {
        let response = self.route(&request);
        debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            "in-memory engine served request"
        );
        self.requests.lock().push(request);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(engine: &InMemoryEngine, body: &str) -> Value {
        let response = engine.route(&TransportRequest::new(HttpMethod::Post, "/_bulk").with_ndjson(body));
        assert_eq!(response.status, 200);
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn test_bulk_index_and_delete() {
        let engine = InMemoryEngine::new();
        let body = concat!(
            r#"{"index":{"_index":"p","_type":"t","_id":"1"}}"#, "\n",
            r#"{"name":"one"}"#, "\n",
            r#"{"delete":{"_index":"p","_type":"t","_id":"2"}}"#, "\n",
        );
        let response = bulk(&engine, body);

        assert_eq!(response["items"][0]["index"]["ok"], true);
        assert_eq!(response["items"][0]["index"]["_version"], 1);
        assert_eq!(response["items"][1]["delete"]["found"], false);
        assert_eq!(engine.document("p", "t", "1"), Some(json!({"name": "one"})));
    }

    #[test]
    fn test_create_conflict_and_version_check() {
        let engine = InMemoryEngine::new();
        engine.seed("p", "t", "1", json!({"name": "one"}));

        let body = concat!(
            r#"{"create":{"_index":"p","_type":"t","_id":"1"}}"#, "\n",
            r#"{"name":"again"}"#, "\n",
            r#"{"index":{"_index":"p","_type":"t","_id":"1","_version":7}}"#, "\n",
            r#"{"name":"stale"}"#, "\n",
            r#"{"index":{"_index":"p","_type":"t","_id":"1","_version":1}}"#, "\n",
            r#"{"name":"fresh"}"#, "\n",
        );
        let response = bulk(&engine, body);

        assert!(response["items"][0]["create"]["error"].as_str().unwrap().starts_with("DocumentAlreadyExists"));
        assert!(response["items"][1]["index"]["error"].as_str().unwrap().starts_with("VersionConflict"));
        assert_eq!(response["items"][2]["index"]["_version"], 2);
        assert_eq!(engine.version("p", "t", "1"), Some(2));
    }

    #[test]
    fn test_update_merges_and_upserts() {
        let engine = InMemoryEngine::new();
        engine.seed("p", "t", "1", json!({"name": "one", "meta": {"a": 1}}));

        let body = concat!(
            r#"{"update":{"_index":"p","_type":"t","_id":"1"}}"#, "\n",
            r#"{"doc":{"meta":{"b":2}}}"#, "\n",
            r#"{"update":{"_index":"p","_type":"t","_id":"2"}}"#, "\n",
            r#"{"doc":{"name":"two"},"doc_as_upsert":true}"#, "\n",
            r#"{"update":{"_index":"p","_type":"t","_id":"3"}}"#, "\n",
            r#"{"doc":{"name":"three"}}"#, "\n",
        );
        let response = bulk(&engine, body);

        assert_eq!(
            engine.document("p", "t", "1"),
            Some(json!({"name": "one", "meta": {"a": 1, "b": 2}}))
        );
        assert_eq!(engine.document("p", "t", "2"), Some(json!({"name": "two"})));
        assert!(response["items"][2]["update"]["error"].as_str().unwrap().starts_with("DocumentMissing"));
    }

    #[test]
    fn test_index_without_id_reported_as_create() {
        let engine = InMemoryEngine::new();
        let body = concat!(
            r#"{"index":{"_index":"p","_type":"t"}}"#, "\n",
            r#"{"name":"anonymous"}"#, "\n",
        );
        let response = bulk(&engine, body);

        assert!(response["items"][0].get("index").is_none());
        let id = response["items"][0]["create"]["_id"].as_str().unwrap();
        assert_eq!(engine.document("p", "t", id), Some(json!({"name": "anonymous"})));
    }

    #[test]
    fn test_malformed_bulk_rejected() {
        let engine = InMemoryEngine::new();
        let response = engine.route(&TransportRequest::new(HttpMethod::Post, "/_bulk").with_ndjson("{\"index\":{}}\n"));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_query_subset() {
        let doc = json!({"name": "elasticsearch.pm", "country": "netherlands", "loc": 100000});

        assert!(matches_query(&json!({"match_all": {}}), &doc));
        assert!(matches_query(&json!({"term": {"name": "elasticsearch.pm"}}), &doc));
        assert!(matches_query(&json!({"term": {"loc": 100000}}), &doc));
        assert!(!matches_query(&json!({"term": {"country": "belgium"}}), &doc));
        assert!(matches_query(&json!({"match": {"country": {"query": "Netherlands"}}}), &doc));
        assert!(matches_query(
            &json!({"bool": {"must": [{"term": {"country": "netherlands"}}], "must_not": {"term": {"name": "nest"}}}}),
            &doc
        ));
        assert!(!matches_query(&json!({"regexp": {"name": ".*"}}), &doc));
    }

    #[test]
    fn test_unknown_route() {
        let engine = InMemoryEngine::new();
        let response = engine.route(&TransportRequest::new(HttpMethod::Head, "/a/b"));
        assert_eq!(response.status, 400);
    }
}
