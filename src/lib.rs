//! Blocking call-throughs for DynamoDB tables, indexes, items and transactions.
//!
//! Every operation translates into one or two remote calls. Waiting for
//! tables and indexes goes through the fixed-delay poller in [`waiter`];
//! multi-item writes go through [`transaction_operations`].

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

pub mod basic_operations;
pub mod batch_operations;
pub mod client;
pub mod commands;
pub mod conversions;
pub mod errors;
pub mod expression;
pub mod query_operations;
pub mod sample;
pub mod table_operations;
pub mod transaction_operations;
pub mod waiter;

/// A DynamoDB item or key.
pub type Item = HashMap<String, AttributeValue>;

pub use client::{ClientConfig, DynamoClient};
pub use errors::{Error, Result};
pub use expression::{Condition, Expression};
pub use transaction_operations::{
    TransactionBatch, TransactionError, TransactionSubmitter, WriteOperation, build_batch,
};
pub use waiter::{WaitConfig, WaitError, wait_until, wait_until_with_progress};
