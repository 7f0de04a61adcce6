//! Batch write operations for DynamoDB.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{DeleteRequest, PutRequest, WriteRequest};
use std::collections::HashMap;
use std::time::Duration;

use crate::Item;
use crate::client::DynamoClient;
use crate::errors::{Error, Result, map_sdk_error};

/// Maximum items per batch write request (DynamoDB limit).
pub const BATCH_WRITE_MAX_ITEMS: usize = 25;

/// Maximum resubmissions of unprocessed items per chunk.
const BATCH_MAX_RETRIES: usize = 5;

/// Fixed pause before resubmitting unprocessed items.
const UNPROCESSED_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Build the write requests for puts followed by deletes.
pub fn build_write_requests(put_items: Vec<Item>, delete_keys: Vec<Item>) -> Result<Vec<WriteRequest>> {
    let mut requests = Vec::with_capacity(put_items.len() + delete_keys.len());

    for item in put_items {
        let put_request = PutRequest::builder().set_item(Some(item)).build()?;
        requests.push(WriteRequest::builder().put_request(put_request).build());
    }

    for key in delete_keys {
        let delete_request = DeleteRequest::builder().set_key(Some(key)).build()?;
        requests.push(
            WriteRequest::builder()
                .delete_request(delete_request)
                .build(),
        );
    }

    Ok(requests)
}

/// Send one chunk, returning whatever the service left unprocessed.
async fn execute_batch_write_chunk(
    client: &Client,
    table: &str,
    pending: Vec<WriteRequest>,
) -> Result<Vec<WriteRequest>> {
    let mut request_items = HashMap::new();
    request_items.insert(table.to_string(), pending);

    let output = client
        .batch_write_item()
        .set_request_items(Some(request_items))
        .send()
        .await
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    Ok(output
        .unprocessed_items
        .and_then(|mut unprocessed| unprocessed.remove(table))
        .unwrap_or_default())
}

/// Batch write items to a DynamoDB table.
///
/// Handles:
/// - Splitting requests to respect the 25-item limit
/// - Resubmitting unprocessed items after a fixed delay
pub fn batch_write(
    client: &DynamoClient,
    table: &str,
    put_items: Vec<Item>,
    delete_keys: Vec<Item>,
) -> Result<()> {
    let all_requests = build_write_requests(put_items, delete_keys)?;
    if all_requests.is_empty() {
        return Ok(());
    }

    let total = all_requests.len();
    for (chunk_index, chunk) in all_requests.chunks(BATCH_WRITE_MAX_ITEMS).enumerate() {
        let mut pending: Vec<WriteRequest> = chunk.to_vec();
        let mut retries = 0;

        loop {
            pending = client.block_on(execute_batch_write_chunk(client.sdk(), table, pending))?;
            if pending.is_empty() {
                break;
            }
            if retries >= BATCH_MAX_RETRIES {
                return Err(Error::Throttled(format!(
                    "Failed to process {} items after {} retries",
                    pending.len(),
                    BATCH_MAX_RETRIES
                )));
            }
            retries += 1;
            tracing::warn!(
                table,
                chunk = chunk_index,
                unprocessed = pending.len(),
                retry = retries,
                "resubmitting unprocessed items"
            );
            std::thread::sleep(UNPROCESSED_RETRY_DELAY);
        }
    }

    tracing::info!(table, items = total, "batch write complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    #[test]
    fn puts_come_before_deletes() {
        let item = Item::from([("Artist".to_string(), AttributeValue::S("a".into()))]);
        let requests = build_write_requests(vec![item.clone()], vec![item]).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].put_request().is_some());
        assert!(requests[1].delete_request().is_some());
    }

    #[test]
    fn chunking_respects_the_service_limit() {
        let items: Vec<Item> = (0..60)
            .map(|i| Item::from([("Artist".to_string(), AttributeValue::S(i.to_string()))]))
            .collect();
        let requests = build_write_requests(items, Vec::new()).unwrap();
        let sizes: Vec<usize> = requests.chunks(BATCH_WRITE_MAX_ITEMS).map(<[_]>::len).collect();
        assert_eq!(sizes, [25, 25, 10]);
    }
}
