//! Global secondary index lifecycle: create, delete, inspect and wait.

use aws_sdk_dynamodb::types::{
    CreateGlobalSecondaryIndexAction, DeleteGlobalSecondaryIndexAction,
    GlobalSecondaryIndexUpdate, IndexStatus, KeyType, Projection, ProjectionType,
    TableDescription,
};
use std::str::FromStr;
use std::time::Duration;

use super::create::{KeyAttribute, Throughput};
use super::exists::describe_table;
use crate::client::DynamoClient;
use crate::errors::{Error, Result, map_sdk_error};
use crate::waiter::{WaitConfig, wait_until_with_progress};

/// Default delay between index status checks.
pub const INDEX_POLL_DELAY: Duration = Duration::from_secs(5);

/// Name used when no index name is given: `<table>-<attr>-global-secondary-index`.
pub fn default_index_name(table: &str, attribute: &str) -> String {
    format!("{}-{}-global-secondary-index", table, attribute)
}

/// A global secondary index to add to an existing table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDefinition {
    pub table: String,
    pub index_name: String,
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
    pub projection: ProjectionType,
    /// Must be `None` for on-demand tables.
    pub throughput: Option<Throughput>,
}

impl IndexDefinition {
    fn create_action(&self) -> Result<CreateGlobalSecondaryIndexAction> {
        let mut schema = vec![self.hash_key.schema_element(KeyType::Hash)?];
        if let Some(range) = &self.range_key {
            schema.push(range.schema_element(KeyType::Range)?);
        }

        let projection = Projection::builder()
            .projection_type(self.projection.clone())
            .build();

        let throughput = self.throughput.map(Throughput::to_sdk).transpose()?;

        Ok(CreateGlobalSecondaryIndexAction::builder()
            .index_name(&self.index_name)
            .set_key_schema(Some(schema))
            .projection(projection)
            .set_provisioned_throughput(throughput)
            .build()?)
    }
}

/// Start building a global secondary index. Returns immediately.
pub fn create_global_secondary_index(client: &DynamoClient, definition: &IndexDefinition) -> Result<()> {
    let mut attribute_definitions = vec![definition.hash_key.definition()?];
    if let Some(range) = &definition.range_key {
        attribute_definitions.push(range.definition()?);
    }

    let update = GlobalSecondaryIndexUpdate::builder()
        .create(definition.create_action()?)
        .build();

    client
        .block_on(
            client
                .sdk()
                .update_table()
                .table_name(&definition.table)
                .set_attribute_definitions(Some(attribute_definitions))
                .global_secondary_index_updates(update)
                .send(),
        )
        .map_err(|e| map_sdk_error(e, Some(&definition.table)))?;

    tracing::info!(
        table = %definition.table,
        index = %definition.index_name,
        "secondary index is creating"
    );
    Ok(())
}

/// Start deleting a global secondary index. Returns immediately.
pub fn delete_global_secondary_index(client: &DynamoClient, table: &str, index: &str) -> Result<()> {
    let action = DeleteGlobalSecondaryIndexAction::builder()
        .index_name(index)
        .build()?;
    let update = GlobalSecondaryIndexUpdate::builder().delete(action).build();

    client
        .block_on(
            client
                .sdk()
                .update_table()
                .table_name(table)
                .global_secondary_index_updates(update)
                .send(),
        )
        .map_err(|e| map_sdk_error(e, Some(table)))?;

    tracing::info!(table, index, "secondary index is deleting");
    Ok(())
}

/// Status of the named index in a table description, `None` if absent.
pub fn find_index_status(description: &TableDescription, index: &str) -> Option<IndexStatus> {
    description
        .global_secondary_indexes()
        .iter()
        .find(|gsi| gsi.index_name() == Some(index))
        .map(|gsi| {
            gsi.index_status()
                .cloned()
                .unwrap_or_else(|| IndexStatus::from("UNKNOWN"))
        })
}

/// Current status of `index` on `table`, `None` if the index does not exist.
///
/// Fails if the table itself does not exist.
pub fn index_status(client: &DynamoClient, table: &str, index: &str) -> Result<Option<IndexStatus>> {
    let description = describe_table(client, table)?;
    Ok(find_index_status(&description, index))
}

/// The index state to check or wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCondition {
    Active,
    Exists,
    NotExists,
}

impl IndexCondition {
    pub fn is_satisfied(self, status: Option<&IndexStatus>) -> bool {
        match self {
            IndexCondition::Active => status == Some(&IndexStatus::Active),
            IndexCondition::Exists => status.is_some(),
            IndexCondition::NotExists => status.is_none(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IndexCondition::Active => "active",
            IndexCondition::Exists => "exists",
            IndexCondition::NotExists => "not_exists",
        }
    }
}

impl FromStr for IndexCondition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(IndexCondition::Active),
            "exists" => Ok(IndexCondition::Exists),
            "not_exists" | "not-exists" => Ok(IndexCondition::NotExists),
            _ => Err(Error::Validation(format!(
                "Invalid index condition '{}'. Valid values are active, exists, not_exists.",
                s
            ))),
        }
    }
}

/// Check whether `index` on `table` is in the given state right now.
pub fn check_index(
    client: &DynamoClient,
    table: &str,
    index: &str,
    condition: IndexCondition,
) -> Result<bool> {
    Ok(condition.is_satisfied(index_status(client, table, index)?.as_ref()))
}

/// Block until `index` on `table` reaches `condition`.
///
/// Each unsatisfied check is logged with the index's current status.
pub fn wait_for_index(
    client: &DynamoClient,
    table: &str,
    index: &str,
    condition: IndexCondition,
    config: &WaitConfig,
) -> Result<Option<IndexStatus>> {
    let status = wait_until_with_progress(
        || index_status(client, table, index),
        |status| condition.is_satisfied(status.as_ref()),
        config,
        |attempt, status| {
            let status = status.as_ref().map(IndexStatus::as_str).unwrap_or("ABSENT");
            tracing::info!(
                table,
                index,
                attempt,
                status,
                "waiting for index to be {}",
                condition.name()
            );
        },
    )?;
    Ok(status)
}

/// Drop the index if present, wait for it to disappear, recreate it and wait
/// until it is active.
pub fn recreate_global_secondary_index(
    client: &DynamoClient,
    definition: &IndexDefinition,
    config: &WaitConfig,
) -> Result<()> {
    let table = definition.table.as_str();
    let index = definition.index_name.as_str();

    if check_index(client, table, index, IndexCondition::Exists)? {
        delete_global_secondary_index(client, table, index)?;
    }
    wait_for_index(client, table, index, IndexCondition::NotExists, config)?;
    create_global_secondary_index(client, definition)?;
    wait_for_index(client, table, index, IndexCondition::Active, config)?;

    tracing::info!(table, index, "global secondary index is created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::GlobalSecondaryIndexDescription;

    fn description(indexes: &[(&str, IndexStatus)]) -> TableDescription {
        let gsis = indexes
            .iter()
            .map(|(name, status)| {
                GlobalSecondaryIndexDescription::builder()
                    .index_name(*name)
                    .index_status(status.clone())
                    .build()
            })
            .collect();
        TableDescription::builder()
            .set_global_secondary_indexes(Some(gsis))
            .build()
    }

    #[test]
    fn finds_status_by_name() {
        let desc = description(&[
            ("other-index", IndexStatus::Active),
            ("music-test-Length-global-secondary-index", IndexStatus::Creating),
        ]);
        assert_eq!(
            find_index_status(&desc, "music-test-Length-global-secondary-index"),
            Some(IndexStatus::Creating)
        );
        assert_eq!(find_index_status(&desc, "missing"), None);
    }

    #[test]
    fn table_without_indexes_has_no_status() {
        let desc = TableDescription::builder().build();
        assert_eq!(find_index_status(&desc, "any"), None);
    }

    #[test]
    fn conditions() {
        let creating = IndexStatus::Creating;
        let active = IndexStatus::Active;

        assert!(!IndexCondition::Active.is_satisfied(Some(&creating)));
        assert!(IndexCondition::Active.is_satisfied(Some(&active)));
        assert!(IndexCondition::Exists.is_satisfied(Some(&creating)));
        assert!(!IndexCondition::Exists.is_satisfied(None));
        assert!(IndexCondition::NotExists.is_satisfied(None));
        assert!(!IndexCondition::NotExists.is_satisfied(Some(&IndexStatus::Deleting)));
    }

    #[test]
    fn default_name_matches_convention() {
        assert_eq!(
            default_index_name("music-test", "Length"),
            "music-test-Length-global-secondary-index"
        );
    }

    #[test]
    fn create_action_omits_throughput_for_on_demand() {
        let definition = IndexDefinition {
            table: "music-test".into(),
            index_name: "idx".into(),
            hash_key: KeyAttribute::number("Length"),
            range_key: None,
            projection: ProjectionType::All,
            throughput: None,
        };
        let action = definition.create_action().unwrap();
        assert_eq!(action.index_name(), "idx");
        assert!(action.provisioned_throughput().is_none());
        assert_eq!(action.key_schema()[0].attribute_name(), "Length");
    }
}
