//! Get item operation.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::ReturnConsumedCapacity;
use std::time::Instant;

use crate::Item;
use crate::client::DynamoClient;
use crate::errors::{Result, map_sdk_error};

/// Core async get_item operation.
pub async fn execute_get_item(
    client: Client,
    table: &str,
    key: Item,
    consistent_read: bool,
) -> Result<Option<Item>> {
    let start = Instant::now();
    let result = client
        .get_item()
        .table_name(table)
        .set_key(Some(key))
        .consistent_read(consistent_read)
        .return_consumed_capacity(ReturnConsumedCapacity::Total)
        .send()
        .await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(output) => {
            let consumed_rcu = output.consumed_capacity().and_then(|c| c.capacity_units());
            tracing::debug!(table, duration_ms, ?consumed_rcu, "get_item");
            Ok(output.item)
        }
        Err(e) => Err(map_sdk_error(e, Some(table))),
    }
}

/// Get an item by key. Returns `None` if it does not exist.
pub fn get_item(
    client: &DynamoClient,
    table: &str,
    key: Item,
    consistent_read: bool,
) -> Result<Option<Item>> {
    client.block_on(execute_get_item(
        client.sdk().clone(),
        table,
        key,
        consistent_read,
    ))
}
