// Assertions for bulk results and recorded requests

use quarry_search::{BulkResult, HttpMethod, OpType, RequestBody, TransportRequest};
use serde_json::Value;

/// Assert that a batch was accepted and every item succeeded
pub fn assert_bulk_ok(result: &BulkResult) {
    assert!(result.is_valid, "Expected a valid bulk response");
    let failed: Vec<String> = result
        .failed_items()
        .map(|item| format!("{} {:?}: {:?}", item.op_type, item.id, item.error))
        .collect();
    assert!(failed.is_empty(), "Expected no failed items, got {:?}", failed);
}

/// Assert that the item at `position` failed and its error mentions `fragment`
pub fn assert_item_failed(result: &BulkResult, position: usize, fragment: &str) {
    let Some(item) = result.items.get(position) else {
        panic!(
            "Expected an item at position {}, batch has {}",
            position,
            result.items.len()
        );
    };
    assert!(!item.ok, "Expected item {} to fail, it succeeded", position);
    let error = item.error.as_deref().unwrap_or_default();
    assert!(
        error.contains(fragment),
        "Expected item {} error to contain '{}', got '{}'",
        position,
        fragment,
        error
    );
}

/// Assert the number of failed items
pub fn assert_failed_count(result: &BulkResult, expected: usize) {
    let actual = result.failed_items().count();
    assert_eq!(
        actual, expected,
        "Expected {} failed items, got {}",
        expected, actual
    );
}

/// Assert the operation kinds of a batch, in order
pub fn assert_op_types(result: &BulkResult, expected: &[OpType]) {
    let actual: Vec<OpType> = result.iter().map(|item| item.op_type).collect();
    assert_eq!(actual, expected, "Operation kinds do not match");
}

/// Assert method and path of a request
pub fn assert_request(request: &TransportRequest, method: HttpMethod, path: &str) {
    assert_eq!(
        (request.method, request.path.as_str()),
        (method, path),
        "Expected {} {}, got {} {}",
        method,
        path,
        request.method,
        request.path
    );
}

/// Assert a query-string value
pub fn assert_query(request: &TransportRequest, key: &str, expected: &str) {
    let actual = request.query_value(key);
    assert_eq!(
        actual,
        Some(expected),
        "Expected query '{}' to be '{}', got {:?}",
        key,
        expected,
        actual
    );
}

/// Assert that a query-string key is absent
pub fn assert_no_query(request: &TransportRequest, key: &str) {
    assert!(
        request.query_value(key).is_none(),
        "Expected no query '{}', got {:?}",
        key,
        request.query
    );
}

/// Assert that the body is NDJSON with exactly these lines, newline terminated
pub fn assert_ndjson_lines(request: &TransportRequest, expected: &[Value]) {
    let Some(RequestBody::NdJson(body)) = &request.body else {
        panic!("Expected an NDJSON body, got {:?}", request.body);
    };
    assert!(body.ends_with('\n'), "NDJSON body must end with a newline");

    let lines: Vec<Value> = body
        .lines()
        .enumerate()
        .map(|(n, line)| match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => panic!("Line {} is not JSON ({}): {}", n + 1, e, line),
        })
        .collect();
    assert_eq!(lines, expected, "NDJSON lines do not match");
}

/// Assert that the body is a JSON document equal to `expected`
pub fn assert_json_body(request: &TransportRequest, expected: &Value) {
    let Some(RequestBody::Json(body)) = &request.body else {
        panic!("Expected a JSON body, got {:?}", request.body);
    };
    let actual: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => panic!("Body is not JSON ({}): {}", e, body),
    };
    assert_eq!(&actual, expected, "JSON bodies do not match");
}
