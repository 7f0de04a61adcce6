//! Table waiters built on the condition poller.

use aws_sdk_dynamodb::types::TableStatus;
use std::str::FromStr;
use std::time::Duration;

use super::exists::table_status;
use crate::client::DynamoClient;
use crate::errors::{Error, Result};
use crate::waiter::{WaitConfig, wait_until_with_progress};

/// Default delay between table status checks.
pub const TABLE_WAIT_DELAY: Duration = Duration::from_secs(20);

/// Default number of table status checks.
pub const TABLE_WAIT_MAX_ATTEMPTS: u32 = 25;

/// The table state to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableWaiter {
    /// The table exists and is `ACTIVE`.
    Exists,
    /// The table is gone.
    NotExists,
}

impl TableWaiter {
    pub fn is_satisfied(self, status: Option<&TableStatus>) -> bool {
        match self {
            TableWaiter::Exists => status == Some(&TableStatus::Active),
            TableWaiter::NotExists => status.is_none(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TableWaiter::Exists => "table_exists",
            TableWaiter::NotExists => "table_not_exists",
        }
    }
}

impl FromStr for TableWaiter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table_exists" | "table-exists" => Ok(TableWaiter::Exists),
            "table_not_exists" | "table-not-exists" => Ok(TableWaiter::NotExists),
            _ => Err(Error::Validation(format!(
                "Waiter ({}) is not valid! Valid waiters are table_exists, table_not_exists.",
                s
            ))),
        }
    }
}

/// Block until `table` reaches the state named by `waiter`.
pub fn wait_for_table(
    client: &DynamoClient,
    table: &str,
    waiter: TableWaiter,
    config: &WaitConfig,
) -> Result<()> {
    tracing::info!(
        waiter = waiter.name(),
        table,
        delay_secs = config.delay.as_secs_f64(),
        max_attempts = ?config.max_attempts,
        "waiting for table"
    );

    wait_until_with_progress(
        || table_status(client, table),
        |status| waiter.is_satisfied(status.as_ref()),
        config,
        |attempt, status| {
            let status = status.as_ref().map(TableStatus::as_str).unwrap_or("ABSENT");
            tracing::info!(table, attempt, status, "waiting for {}", waiter.name());
        },
    )?;
    Ok(())
}

/// Block until `table` is `ACTIVE`.
pub fn wait_for_table_active(client: &DynamoClient, table: &str, config: &WaitConfig) -> Result<()> {
    wait_for_table(client, table, TableWaiter::Exists, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_requires_active() {
        assert!(TableWaiter::Exists.is_satisfied(Some(&TableStatus::Active)));
        assert!(!TableWaiter::Exists.is_satisfied(Some(&TableStatus::Creating)));
        assert!(!TableWaiter::Exists.is_satisfied(None));
    }

    #[test]
    fn not_exists_accepts_only_absence() {
        assert!(TableWaiter::NotExists.is_satisfied(None));
        assert!(!TableWaiter::NotExists.is_satisfied(Some(&TableStatus::Deleting)));
    }

    #[test]
    fn waiter_names_parse() {
        assert_eq!("table_exists".parse::<TableWaiter>().unwrap(), TableWaiter::Exists);
        assert_eq!(
            "table-not-exists".parse::<TableWaiter>().unwrap(),
            TableWaiter::NotExists
        );
        assert!("index_exists".parse::<TableWaiter>().is_err());
    }
}
