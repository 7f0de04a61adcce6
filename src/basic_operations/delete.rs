//! Delete item operation.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::types::{
    ReturnConsumedCapacity, ReturnValue, ReturnValuesOnConditionCheckFailure,
};
use std::time::Instant;

use crate::Item;
use crate::client::DynamoClient;
use crate::errors::{Result, map_sdk_error_with_item};
use crate::expression::Expression;

/// Prepared delete_item data.
#[derive(Debug, Clone)]
pub struct PreparedDeleteItem {
    pub table: String,
    pub key: Item,
    pub condition: Option<Expression>,
    pub return_values_on_condition_check_failure: Option<ReturnValuesOnConditionCheckFailure>,
    /// DeleteItem only supports NONE and ALL_OLD.
    pub return_old: bool,
}

impl PreparedDeleteItem {
    pub fn new(table: &str, key: Item) -> Self {
        PreparedDeleteItem {
            table: table.to_string(),
            key,
            condition: None,
            return_values_on_condition_check_failure: None,
            return_old: false,
        }
    }

    pub fn condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn return_old(mut self) -> Self {
        self.return_old = true;
        self
    }
}

/// Core async delete_item operation.
pub async fn execute_delete_item(
    client: Client,
    prepared: PreparedDeleteItem,
) -> Result<Option<Item>, (SdkError<DeleteItemError>, String, Option<Item>)> {
    let mut request = client
        .delete_item()
        .table_name(&prepared.table)
        .set_key(Some(prepared.key))
        .return_consumed_capacity(ReturnConsumedCapacity::Total);

    if let Some(condition) = prepared.condition {
        request = request.condition_expression(condition.text);
        for (placeholder, attr_name) in condition.names {
            request = request.expression_attribute_names(placeholder, attr_name);
        }
        for (placeholder, attr_value) in condition.values {
            request = request.expression_attribute_values(placeholder, attr_value);
        }
    }
    if let Some(return_on_failure) = prepared.return_values_on_condition_check_failure {
        request = request.return_values_on_condition_check_failure(return_on_failure);
    }
    if prepared.return_old {
        request = request.return_values(ReturnValue::AllOld);
    }

    let start = Instant::now();
    let result = request.send().await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(output) => {
            let consumed_wcu = output.consumed_capacity().and_then(|c| c.capacity_units());
            tracing::debug!(table = %prepared.table, duration_ms, ?consumed_wcu, "delete_item");

            if prepared.return_old {
                Ok(output.attributes().cloned())
            } else {
                Ok(None)
            }
        }
        Err(e) => {
            let item = extract_item_from_delete_error(&e);
            Err((e, prepared.table, item))
        }
    }
}

/// Extract the item from a ConditionalCheckFailedException.
fn extract_item_from_delete_error(err: &SdkError<DeleteItemError>) -> Option<Item> {
    if let SdkError::ServiceError(service_err) = err
        && let DeleteItemError::ConditionalCheckFailedException(ccf) = service_err.err()
    {
        return ccf.item().cloned();
    }
    None
}

/// Delete an item, blocking until complete. Returns the old item when requested.
pub fn delete_item(client: &DynamoClient, prepared: PreparedDeleteItem) -> Result<Option<Item>> {
    client
        .block_on(execute_delete_item(client.sdk().clone(), prepared))
        .map_err(|(e, tbl, item)| map_sdk_error_with_item(e, Some(&tbl), item))
}
