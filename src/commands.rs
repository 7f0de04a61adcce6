//! One function per CLI subcommand.
//!
//! Each command performs its call-through against the music dataset defaults
//! and returns a JSON value for the binary to print.

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Value, json};
use std::time::Duration;

use crate::Item;
use crate::basic_operations::{
    PreparedDeleteItem, PreparedPutItem, delete_item, get_item, parse_return_values,
    prepare_update_item, put_item, update_item,
};
use crate::batch_operations::batch_write;
use crate::client::DynamoClient;
use crate::conversions::item_to_json;
use crate::errors::{Error, Result};
use crate::query_operations::{QueryRequest, query, scan};
use crate::sample;
use crate::table_operations::{
    INDEX_POLL_DELAY, IndexCondition, TABLE_WAIT_DELAY, TABLE_WAIT_MAX_ATTEMPTS, TableWaiter,
    create_backup, create_global_secondary_index, create_table, default_backup_name,
    default_index_name, delete_global_secondary_index, delete_table, index_status,
    recreate_global_secondary_index, recreate_table, wait_for_index, wait_for_table,
};
use crate::transaction_operations::{TransactionBatch, TransactionError, TransactionSubmitter};
use crate::waiter::{WaitConfig, wait_until_with_progress};

/// Delay between checks after `create-table` and `delete-table`.
pub const TABLE_CHANGE_WAIT_DELAY: Duration = Duration::from_secs(1);

/// Checks after `create-table` and `delete-table` before giving up.
pub const TABLE_CHANGE_WAIT_MAX_ATTEMPTS: u32 = 10;

/// Wait settings for `create-table` and `delete-table`.
///
/// Each value falls back to its own default.
pub fn table_change_wait_config(delay_secs: Option<u64>, max_attempts: Option<u32>) -> WaitConfig {
    WaitConfig::bounded(
        delay_secs.map(Duration::from_secs).unwrap_or(TABLE_CHANGE_WAIT_DELAY),
        max_attempts.unwrap_or(TABLE_CHANGE_WAIT_MAX_ATTEMPTS),
    )
}

/// Wait settings for `table-waiter` and `recreate-table`.
///
/// Both values must be given to override the defaults.
pub fn table_wait_config(delay_secs: Option<u64>, max_attempts: Option<u32>) -> WaitConfig {
    match (delay_secs, max_attempts) {
        (Some(delay), Some(max)) => WaitConfig::bounded(Duration::from_secs(delay), max),
        _ => WaitConfig::bounded(TABLE_WAIT_DELAY, TABLE_WAIT_MAX_ATTEMPTS),
    }
}

/// Wait settings for index commands. Unbounded unless `max_attempts` is set.
pub fn index_wait_config(delay_secs: Option<u64>, max_attempts: Option<u32>) -> WaitConfig {
    let delay = delay_secs.map(Duration::from_secs).unwrap_or(INDEX_POLL_DELAY);
    WaitConfig {
        delay,
        max_attempts,
    }
}

fn index_name(table: &str, index: Option<String>) -> String {
    index.unwrap_or_else(|| default_index_name(table, sample::LENGTH))
}

fn items_json(items: &[Item]) -> Result<Value> {
    Ok(Value::Array(
        items.iter().map(item_to_json).collect::<Result<Vec<_>>>()?,
    ))
}

fn optional_item_json(item: Option<Item>) -> Result<Value> {
    item.as_ref().map(item_to_json).transpose().map(|v| v.unwrap_or(Value::Null))
}

pub fn ping(client: &DynamoClient) -> Result<Value> {
    client.ping()?;
    Ok(json!({ "region": client.region(), "reachable": true }))
}

pub fn create_table_cmd(client: &DynamoClient, table: &str, wait: &WaitConfig) -> Result<Value> {
    create_table(client, &sample::music_table(table))?;
    wait_for_table(client, table, TableWaiter::Exists, wait)?;
    Ok(json!({ "table": table, "status": "created" }))
}

pub fn delete_table_cmd(client: &DynamoClient, table: &str, wait: &WaitConfig) -> Result<Value> {
    delete_table(client, table)?;
    wait_for_table(client, table, TableWaiter::NotExists, wait)?;
    Ok(json!({ "table": table, "status": "deleted" }))
}

pub fn recreate_table_cmd(client: &DynamoClient, table: &str, wait: &WaitConfig) -> Result<Value> {
    recreate_table(client, &sample::music_table(table), wait)?;
    Ok(json!({ "table": table, "status": "recreated" }))
}

pub fn table_waiter_cmd(
    client: &DynamoClient,
    waiter: &str,
    table: &str,
    wait: &WaitConfig,
) -> Result<Value> {
    let waiter: TableWaiter = waiter.parse()?;
    wait_for_table(client, table, waiter, wait)?;
    Ok(json!({ "table": table, "waiter": waiter.name(), "satisfied": true }))
}

pub fn put_item_cmd(client: &DynamoClient, table: &str) -> Result<Value> {
    let item = sample::song_item(None, sample::random_length(), 1);
    let consumed = put_item(client, PreparedPutItem::new(table, item.clone()))?;
    Ok(json!({
        "item": item_to_json(&item)?,
        "consumed_capacity": consumed,
    }))
}

pub fn batch_write_cmd(client: &DynamoClient, table: &str, amount: u32) -> Result<Value> {
    let items = sample::song_items(amount);
    let written = items.len();
    batch_write(client, table, items, Vec::new())?;
    Ok(json!({ "table": table, "written": written }))
}

pub fn get_item_cmd(client: &DynamoClient, table: &str, idx: Option<u32>) -> Result<Value> {
    let item = get_item(client, table, sample::song_key(idx), false)?;
    optional_item_json(item)
}

/// Set `Length` and `Awards` on the sample song to `value`.
pub fn update_item_cmd(
    client: &DynamoClient,
    table: &str,
    idx: Option<u32>,
    value: i64,
    return_values: &str,
) -> Result<Value> {
    let updates = vec![
        (sample::LENGTH.to_string(), AttributeValue::N(value.to_string())),
        (sample::AWARDS.to_string(), AttributeValue::N(value.to_string())),
    ];
    let prepared = prepare_update_item(
        table,
        sample::song_key(idx),
        Some(updates),
        None,
        None,
        false,
        parse_return_values(return_values)?,
    )?;
    optional_item_json(update_item(client, prepared)?)
}

pub fn delete_item_cmd(client: &DynamoClient, table: &str, idx: Option<u32>) -> Result<Value> {
    let prepared = PreparedDeleteItem::new(table, sample::song_key(idx)).return_old();
    optional_item_json(delete_item(client, prepared)?)
}

/// Full scan plus a filtered scan on `Length` and `Awards`.
pub fn scan_table_cmd(client: &DynamoClient, table: &str, length: u32, awards: u32) -> Result<Value> {
    let all = scan(client, table, None)?;
    let filter = sample::length_and_awards_filter(length, awards);
    let filtered = scan(client, table, Some(&filter))?;
    Ok(json!({
        "items": items_json(&all)?,
        "filtered": items_json(&filtered)?,
    }))
}

pub fn query_table_cmd(client: &DynamoClient, table: &str) -> Result<Value> {
    let items = query(client, &QueryRequest::new(table, sample::first_artist_songs()))?;
    items_json(&items)
}

/// Top `top` songs of an album ordered by length.
pub fn query_top_cmd(
    client: &DynamoClient,
    table: &str,
    album: &str,
    top: i32,
    ascending: bool,
) -> Result<Value> {
    let request = QueryRequest::new(table, sample::album_condition(album))
        .index(sample::ALBUM_LENGTH_INDEX)
        .limit(top)
        .scan_forward(ascending);
    let items = query(client, &request)?;
    Ok(Value::Array(
        items
            .iter()
            .map(|item| {
                let mut picked = Item::new();
                for attr in [sample::ARTIST, sample::LENGTH] {
                    if let Some(value) = item.get(attr) {
                        picked.insert(attr.to_string(), value.clone());
                    }
                }
                item_to_json(&picked)
            })
            .collect::<Result<Vec<_>>>()?,
    ))
}

pub fn create_index_cmd(client: &DynamoClient, table: &str, index: Option<String>) -> Result<Value> {
    let definition = sample::length_index(table, index);
    create_global_secondary_index(client, &definition)?;
    Ok(json!({ "table": table, "index": definition.index_name, "status": "CREATING" }))
}

pub fn delete_index_cmd(client: &DynamoClient, table: &str, index: Option<String>) -> Result<Value> {
    let index = index_name(table, index);
    delete_global_secondary_index(client, table, &index)?;
    Ok(json!({ "table": table, "index": index, "status": "DELETING" }))
}

/// Current index status. With `watch`, keep polling until the index is gone.
pub fn index_status_cmd(
    client: &DynamoClient,
    table: &str,
    index: Option<String>,
    watch: Option<&WaitConfig>,
) -> Result<Value> {
    let index = index_name(table, index);
    let status = match watch {
        None => index_status(client, table, &index)?,
        Some(config) => wait_until_with_progress(
            || index_status(client, table, &index),
            |status| status.is_none(),
            config,
            |attempt, status| {
                let status = status.as_ref().map(|s| s.as_str()).unwrap_or("ABSENT");
                tracing::info!(table, index = %index, attempt, status, "index status");
            },
        )?,
    };
    Ok(json!({
        "table": table,
        "index": index,
        "status": status.as_ref().map(|s| s.as_str()),
    }))
}

pub fn wait_index_cmd(
    client: &DynamoClient,
    table: &str,
    index: Option<String>,
    condition: &str,
    wait: &WaitConfig,
) -> Result<Value> {
    let condition: IndexCondition = condition.parse()?;
    let index = index_name(table, index);
    let status = wait_for_index(client, table, &index, condition, wait)?;
    Ok(json!({
        "table": table,
        "index": index,
        "condition": condition.name(),
        "status": status.as_ref().map(|s| s.as_str()),
    }))
}

pub fn recreate_index_cmd(
    client: &DynamoClient,
    table: &str,
    index: Option<String>,
    wait: &WaitConfig,
) -> Result<Value> {
    let definition = sample::length_index(table, index);
    recreate_global_secondary_index(client, &definition, wait)?;
    Ok(json!({ "table": table, "index": definition.index_name, "status": "ACTIVE" }))
}

/// Wait for the length index to be active, then query it.
pub fn query_index_cmd(
    client: &DynamoClient,
    table: &str,
    index: Option<String>,
    length: u32,
    wait: &WaitConfig,
) -> Result<Value> {
    let index = index_name(table, index);
    wait_for_index(client, table, &index, IndexCondition::Active, wait)?;
    let request = QueryRequest::new(table, sample::length_condition(length)).index(&index);
    items_json(&query(client, &request)?)
}

pub fn backup_table_cmd(client: &DynamoClient, table: &str, backup: Option<String>) -> Result<Value> {
    let backup = backup.unwrap_or_else(|| default_backup_name(table));
    let summary = create_backup(client, table, &backup)?;
    Ok(serde_json::to_value(summary)?)
}

/// Which sample transaction to submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserTransaction {
    CreateNewUser,
    UpdateNewUser,
    UpdateUser,
}

impl UserTransaction {
    pub fn batch(self, artist: &str, song_title: &str, length: u32) -> TransactionBatch {
        match self {
            UserTransaction::CreateNewUser => {
                sample::create_new_user_batch(artist, song_title, length)
            }
            UserTransaction::UpdateNewUser => {
                sample::update_new_user_batch(artist, song_title, length)
            }
            UserTransaction::UpdateUser => sample::update_user_batch(artist, song_title, length),
        }
    }
}

/// Submit one of the sample user transactions. `length` is random when absent.
pub fn transact_user_cmd<S: TransactionSubmitter>(
    submitter: &S,
    kind: UserTransaction,
    artist: &str,
    song_title: &str,
    length: Option<u32>,
) -> Result<Value, TransactionError> {
    let length = length.unwrap_or_else(sample::random_length);
    let batch = kind.batch(artist, song_title, length);
    let operations: Vec<Value> = batch
        .operations()
        .iter()
        .map(|op| json!({ "kind": op.kind(), "table": op.table() }))
        .collect();

    submitter.submit(batch)?;
    Ok(json!({ "committed": true, "length": length, "operations": operations }))
}

/// Reject zero-sized batch writes before touching the service.
pub fn validate_amount(amount: u32) -> Result<u32> {
    if amount == 0 {
        return Err(Error::Validation("amount must be at least 1".into()));
    }
    Ok(amount)
}
