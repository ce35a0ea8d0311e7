// Quarry - A strongly-typed client for Elasticsearch-style search engines
//
// This library resolves typed operations into REST paths, batches writes into
// bulk requests and decodes engine answers into typed results.

// Re-export the client surface
pub use quarry_search::*;

// Re-export the HTTP layer
pub use quarry_transport;

#[cfg(feature = "testing")]
pub use quarry_testing;
