//! On-demand table backups.

use serde::Serialize;

use crate::client::DynamoClient;
use crate::errors::{Error, Result, map_sdk_error};

/// What CreateBackup reported about the new backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    pub arn: String,
    pub name: String,
    pub status: String,
    pub size_bytes: Option<i64>,
}

/// Default backup name for a table.
pub fn default_backup_name(table: &str) -> String {
    format!("{}-backup", table)
}

/// Start an on-demand backup of `table`.
pub fn create_backup(client: &DynamoClient, table: &str, backup_name: &str) -> Result<BackupSummary> {
    let output = client
        .block_on(
            client
                .sdk()
                .create_backup()
                .table_name(table)
                .backup_name(backup_name)
                .send(),
        )
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    let details = output
        .backup_details()
        .ok_or_else(|| Error::Service("CreateBackup returned no backup details".into()))?;

    let summary = BackupSummary {
        arn: details.backup_arn().to_string(),
        name: details.backup_name().to_string(),
        status: details.backup_status().as_str().to_string(),
        size_bytes: details.backup_size_bytes(),
    };
    tracing::info!(table, backup = %summary.name, status = %summary.status, "backup requested");
    Ok(summary)
}
