//! Table management operations for DynamoDB.
//!
//! This module provides table lifecycle operations:
//! - `create` - Create a new table
//! - `delete` - Delete a table
//! - `exists` - Check if a table exists and read its status
//! - `wait` - Wait for a table to become active or disappear
//! - `recreate` - Delete and create a table, waiting for each step
//! - `gsi` - Global secondary index lifecycle
//! - `backup` - On-demand backups

mod backup;
mod create;
mod delete;
mod exists;
mod gsi;
mod recreate;
mod wait;

// Re-export public functions
pub use backup::{BackupSummary, create_backup, default_backup_name};
pub use create::{KeyAttribute, TableDefinition, Throughput, create_table};
pub use delete::delete_table;
pub use exists::{describe_table, table_exists, table_status};
pub use gsi::{
    INDEX_POLL_DELAY, IndexCondition, IndexDefinition, check_index,
    create_global_secondary_index, default_index_name, delete_global_secondary_index,
    find_index_status, index_status, recreate_global_secondary_index, wait_for_index,
};
pub use recreate::recreate_table;
pub use wait::{
    TABLE_WAIT_DELAY, TABLE_WAIT_MAX_ATTEMPTS, TableWaiter, wait_for_table, wait_for_table_active,
};
