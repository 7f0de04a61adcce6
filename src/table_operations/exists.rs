//! Table existence and status checks.

use aws_sdk_dynamodb::types::{TableDescription, TableStatus};

use crate::client::DynamoClient;
use crate::errors::{Error, Result, map_sdk_error};

/// Describe a table. Fails with `ResourceNotFound` if it does not exist.
pub fn describe_table(client: &DynamoClient, table: &str) -> Result<TableDescription> {
    let output = client
        .block_on(client.sdk().describe_table().table_name(table).send())
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    output
        .table
        .ok_or_else(|| Error::ResourceNotFound(format!("Table '{}' not found", table)))
}

/// Current table status, or `None` if the table does not exist.
pub fn table_status(client: &DynamoClient, table: &str) -> Result<Option<TableStatus>> {
    match describe_table(client, table) {
        Ok(description) => Ok(description.table_status().cloned()),
        Err(Error::ResourceNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Check if a table exists, in any status.
pub fn table_exists(client: &DynamoClient, table: &str) -> Result<bool> {
    Ok(table_status(client, table)?.is_some())
}
