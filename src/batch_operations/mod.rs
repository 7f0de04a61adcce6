//! Batch operations module for DynamoDB.
//!
//! This module provides batch operations:
//! - `batch_write` - Write multiple items in as few requests as the limits allow
//!
//! Requests are split to respect DynamoDB limits and unprocessed items are
//! resubmitted after a fixed delay.

mod write;

pub use write::{BATCH_WRITE_MAX_ITEMS, batch_write, build_write_requests};
