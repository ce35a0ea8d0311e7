//! Bulk batches: operation model, builder, wire codec and results.

mod codec;
mod descriptor;
mod operation;
mod response;

pub(crate) use codec::error_reason;

pub use codec::BulkCodec;
pub use descriptor::{BulkDescriptor, BulkRequest};
pub use operation::{
    BulkOperation, CreateOperation, DeleteOperation, IndexOperation, OpType, OperationMeta,
    UpdateOperation, UpdatePayload,
};
pub use response::{BulkResponseItem, BulkResult};
