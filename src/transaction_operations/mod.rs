//! Transaction operations module for DynamoDB.
//!
//! Handles transactional writes with all-or-nothing semantics:
//! - `operation` - The [`WriteOperation`] variants and [`TransactionBatch`]
//! - `write` - Submission through TransactWriteItems
//!
//! All operations in a batch either commit together or fail together.

mod operation;
mod write;

use thiserror::Error;

use crate::errors::Error;

pub use operation::{TransactionBatch, WriteOperation, build_batch};
pub use write::{build_transact_write_item, build_transact_write_items, failed_operation};

/// Maximum items per transaction (DynamoDB limit).
pub const TRANSACTION_MAX_ITEMS: usize = 100;

/// A transaction that was not committed. Nothing in the batch was applied.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The service named the operation that failed.
    #[error("operation {index} failed: {code}{}", .message.as_ref().map(|m| format!(" ({})", m)).unwrap_or_default())]
    OperationFailed {
        index: usize,
        code: String,
        message: Option<String>,
    },

    /// Canceled without a per-operation reason.
    #[error("transaction canceled: {reason}")]
    Canceled { reason: String },

    #[error("transaction exceeds maximum of {max} items (got {got})")]
    TooManyOperations { max: usize, got: usize },

    #[error("operation {index} is malformed: {reason}")]
    InvalidOperation { index: usize, reason: String },

    /// Rejected before evaluation (validation, throttling, connectivity).
    #[error(transparent)]
    Service(#[from] Error),
}

/// Anything that can commit a [`TransactionBatch`] atomically.
pub trait TransactionSubmitter {
    /// Commit every operation in `batch`, or none of them.
    fn submit(&self, batch: TransactionBatch) -> Result<(), TransactionError>;
}
