//! Bulk results.

use super::operation::OpType;

/// Outcome of one submitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponseItem {
    /// Kind of the submitted operation.
    pub op_type: OpType,
    /// Index the engine applied the operation to.
    pub index: String,
    /// Type name.
    pub type_name: String,
    /// Document id; engine-assigned when none was submitted.
    pub id: Option<String>,
    /// Document version after the operation.
    pub version: Option<i64>,
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Per-item status code, when the engine reports one.
    pub status: Option<u16>,
    /// Failure reason.
    pub error: Option<String>,
}

impl BulkResponseItem {
    /// Whether the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.ok
    }
}

/// Result of a bulk round trip.
///
/// `is_valid` only describes the round trip. Individual operations can still
/// have failed; check [`has_failures`](Self::has_failures).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResult {
    /// Engine processing time in milliseconds.
    pub took: u64,
    /// The engine was reached and answered 2xx with a well-formed body.
    pub is_valid: bool,
    /// One item per submitted operation, in submission order.
    pub items: Vec<BulkResponseItem>,
}

impl BulkResult {
    /// Whether any item failed.
    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|item| !item.ok)
    }

    /// Items that failed.
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkResponseItem> {
        self.items.iter().filter(|item| !item.ok)
    }

    /// Iterate over the items in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, BulkResponseItem> {
        self.items.iter()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for BulkResult {
    type Item = BulkResponseItem;
    type IntoIter = std::vec::IntoIter<BulkResponseItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a BulkResult {
    type Item = &'a BulkResponseItem;
    type IntoIter = std::slice::Iter<'a, BulkResponseItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
