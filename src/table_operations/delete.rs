//! Delete table operation.

use crate::client::DynamoClient;
use crate::errors::{Result, map_sdk_error};

/// Delete a table. Does not wait for it to disappear.
pub fn delete_table(client: &DynamoClient, table: &str) -> Result<()> {
    client
        .block_on(client.sdk().delete_table().table_name(table).send())
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    tracing::info!(table, "table deletion started");
    Ok(())
}
