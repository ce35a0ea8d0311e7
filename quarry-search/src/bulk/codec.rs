//! NDJSON encoding of bulk batches and positional decoding of results.

use super::operation::{BulkOperation, OpType, OperationMeta};
use super::response::{BulkResponseItem, BulkResult};
use crate::error::{QuarryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Encoder and decoder for the bulk wire format.
///
/// Stateless; the codec never reorders, merges or retries operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkCodec;

#[derive(Serialize)]
struct ActionMetadata<'a> {
    #[serde(rename = "_index")]
    index: Option<&'a str>,
    #[serde(rename = "_type")]
    type_name: Option<&'a str>,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(rename = "_routing", skip_serializing_if = "Option::is_none")]
    routing: Option<&'a str>,
    #[serde(rename = "_parent", skip_serializing_if = "Option::is_none")]
    parent: Option<&'a str>,
    #[serde(rename = "_version", skip_serializing_if = "Option::is_none")]
    version: Option<i64>,
    #[serde(rename = "_version_type", skip_serializing_if = "Option::is_none")]
    version_type: Option<&'static str>,
    #[serde(rename = "_retry_on_conflict", skip_serializing_if = "Option::is_none")]
    retry_on_conflict: Option<u32>,
    #[serde(rename = "_percolate", skip_serializing_if = "Option::is_none")]
    percolate: Option<&'a str>,
}

impl<'a> ActionMetadata<'a> {
    fn new(op: &'a BulkOperation) -> Self {
        let path = op.path();
        let OperationMeta {
            routing,
            parent,
            version,
            version_type,
            retry_on_conflict,
            percolate,
        } = op.meta();

        Self {
            index: path.index(),
            type_name: path.type_name(),
            id: path.id(),
            routing: routing.as_deref(),
            parent: parent.as_deref(),
            version: *version,
            version_type: version_type.map(|v| v.as_str()),
            retry_on_conflict: match op.op_type() {
                OpType::Update => *retry_on_conflict,
                _ => None,
            },
            percolate: match op.op_type() {
                OpType::Index | OpType::Create => percolate.as_deref(),
                _ => None,
            },
        }
    }
}

#[derive(Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    items: Option<Vec<Value>>,
    error: Option<Value>,
}

#[derive(Deserialize)]
struct RawItemStatus {
    #[serde(rename = "_index")]
    index: Option<String>,
    #[serde(rename = "_type")]
    type_name: Option<String>,
    #[serde(rename = "_id")]
    id: Option<String>,
    #[serde(rename = "_version")]
    version: Option<i64>,
    ok: Option<bool>,
    status: Option<u16>,
    error: Option<Value>,
}

impl BulkCodec {
    /// Encode `operations` as an NDJSON body.
    ///
    /// Each operation yields an action line; index, create and update also
    /// yield a payload line. The body ends with a newline.
    pub fn encode(operations: &[BulkOperation]) -> Result<String> {
        let mut body = String::new();

        for op in operations {
            let mut action = BTreeMap::new();
            action.insert(op.op_type().as_str(), ActionMetadata::new(op));
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');

            match op {
                BulkOperation::Index { document, .. } | BulkOperation::Create { document, .. } => {
                    body.push_str(&serde_json::to_string(document)?);
                    body.push('\n');
                }
                BulkOperation::Update { payload, .. } => {
                    body.push_str(&serde_json::to_string(&payload.to_json())?);
                    body.push('\n');
                }
                BulkOperation::Delete { .. } => {}
            }
        }

        Ok(body)
    }

    /// Decode an engine response against the submitted `operations`.
    ///
    /// Items are correlated by position and tagged with the submitted kind.
    /// A count mismatch or an unknown item kind yields
    /// [`QuarryError::Protocol`] and no result. A non-2xx answer without an
    /// items array yields [`QuarryError::Engine`].
    pub fn decode(operations: &[BulkOperation], status: u16, body: &[u8]) -> Result<BulkResult> {
        let success = (200..300).contains(&status);

        let raw: RawBulkResponse = match serde_json::from_slice(body) {
            Ok(raw) => raw,
            Err(e) if success => {
                warn!(error = %e, "bulk response is not valid JSON");
                return Err(QuarryError::Protocol(format!("malformed bulk response: {}", e)));
            }
            Err(_) => {
                return Err(QuarryError::Engine {
                    status,
                    reason: String::from_utf8_lossy(body).into_owned(),
                });
            }
        };

        let raw_items = match raw.items {
            Some(items) => items,
            None if success => {
                warn!("bulk response has no items array");
                return Err(QuarryError::Protocol(
                    "bulk response has no items array".to_string(),
                ));
            }
            None => {
                return Err(QuarryError::Engine {
                    status,
                    reason: raw
                        .error
                        .as_ref()
                        .map(error_reason)
                        .unwrap_or_else(|| format!("status {}", status)),
                });
            }
        };

        if raw_items.len() != operations.len() {
            warn!(
                submitted = operations.len(),
                received = raw_items.len(),
                "bulk response item count mismatch"
            );
            return Err(QuarryError::Protocol(format!(
                "submitted {} operations but received {} items",
                operations.len(),
                raw_items.len()
            )));
        }

        let items = operations
            .iter()
            .zip(raw_items)
            .enumerate()
            .map(|(position, (op, raw))| decode_item(position, op, raw))
            .collect::<Result<Vec<_>>>()?;

        let result = BulkResult {
            took: raw.took,
            is_valid: success,
            items,
        };

        debug!(
            items = result.len(),
            failed = result.failed_items().count(),
            took = result.took,
            "decoded bulk response"
        );

        Ok(result)
    }
}

fn decode_item(position: usize, op: &BulkOperation, raw: Value) -> Result<BulkResponseItem> {
    let submitted = op.op_type();

    let (key, status) = match raw {
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some(entry) => entry,
            None => return Err(protocol_item(position, "empty item")),
        },
        _ => return Err(protocol_item(position, "item is not a single-key object")),
    };

    match OpType::parse(&key) {
        Some(reported) if reported == submitted => {}
        // An index without an id is reported as a create once the engine assigns one.
        Some(reported) => {
            warn!(position, submitted = %submitted, reported = %reported, "bulk item kind differs from submitted");
        }
        None => {
            warn!(position, submitted = %submitted, reported = %key, "bulk item has unknown kind");
            return Err(protocol_item(position, &format!("unknown operation kind {}", key)));
        }
    }

    let status: RawItemStatus = serde_json::from_value(status)
        .map_err(|e| protocol_item(position, &e.to_string()))?;

    let error = status.error.as_ref().map(error_reason);
    let ok = error.is_none()
        && status
            .ok
            .unwrap_or_else(|| status.status.is_none_or(|s| (200..300).contains(&s)));

    let path = op.path();
    Ok(BulkResponseItem {
        op_type: submitted,
        index: status
            .index
            .unwrap_or_else(|| path.index().unwrap_or_default().to_string()),
        type_name: status
            .type_name
            .unwrap_or_else(|| path.type_name().unwrap_or_default().to_string()),
        id: status.id.or_else(|| path.id().map(str::to_string)),
        version: status.version,
        ok,
        status: status.status,
        error,
    })
}

fn protocol_item(position: usize, detail: &str) -> QuarryError {
    QuarryError::Protocol(format!("bulk item {}: {}", position, detail))
}

/// Flatten an engine error value (0.90 strings or `{type, reason}` objects).
pub(crate) fn error_reason(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(map) => {
            let kind = map.get("type").and_then(Value::as_str);
            let reason = map.get("reason").and_then(Value::as_str);
            match (kind, reason) {
                (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
                (None, Some(reason)) => reason.to_string(),
                (Some(kind), None) => kind.to_string(),
                (None, None) => error.to_string(),
            }
        }
        other => other.to_string(),
    }
}
