//! Drop-and-create helper for scratch tables.

use super::create::{TableDefinition, create_table};
use super::delete::delete_table;
use super::exists::table_exists;
use super::wait::{TableWaiter, wait_for_table};
use crate::client::DynamoClient;
use crate::errors::Result;
use crate::waiter::WaitConfig;

/// Delete the table if it exists, wait until it is gone, then create it again
/// and wait until it is active.
pub fn recreate_table(
    client: &DynamoClient,
    definition: &TableDefinition,
    config: &WaitConfig,
) -> Result<()> {
    let table = definition.table.as_str();

    if table_exists(client, table)? {
        delete_table(client, table)?;
        wait_for_table(client, table, TableWaiter::NotExists, config)?;
    }
    create_table(client, definition)?;
    wait_for_table(client, table, TableWaiter::Exists, config)?;
    Ok(())
}
