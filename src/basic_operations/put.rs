//! Put item operation.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{ReturnConsumedCapacity, ReturnValuesOnConditionCheckFailure};
use std::time::Instant;

use crate::Item;
use crate::client::DynamoClient;
use crate::errors::{Result, map_sdk_error_with_item};
use crate::expression::Expression;

/// Prepared put_item data.
#[derive(Debug, Clone)]
pub struct PreparedPutItem {
    pub table: String,
    pub item: Item,
    pub condition: Option<Expression>,
    pub return_values_on_condition_check_failure: Option<ReturnValuesOnConditionCheckFailure>,
}

impl PreparedPutItem {
    pub fn new(table: &str, item: Item) -> Self {
        PreparedPutItem {
            table: table.to_string(),
            item,
            condition: None,
            return_values_on_condition_check_failure: None,
        }
    }

    /// Only write when `condition` holds; report the existing item if it does not.
    pub fn condition(mut self, condition: Expression) -> Self {
        self.condition = Some(condition);
        self.return_values_on_condition_check_failure =
            Some(ReturnValuesOnConditionCheckFailure::AllOld);
        self
    }
}

/// Core async put_item operation. Returns consumed write capacity.
pub async fn execute_put_item(
    client: Client,
    prepared: PreparedPutItem,
) -> Result<Option<f64>, (SdkError<PutItemError>, String, Option<Item>)> {
    let mut request = client
        .put_item()
        .table_name(&prepared.table)
        .set_item(Some(prepared.item))
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

    let start = Instant::now();
    let result = request.send().await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(output) => {
            let consumed_wcu = output.consumed_capacity().and_then(|c| c.capacity_units());
            tracing::debug!(table = %prepared.table, duration_ms, ?consumed_wcu, "put_item");
            Ok(consumed_wcu)
        }
        Err(e) => {
            let item = extract_item_from_put_error(&e);
            Err((e, prepared.table, item))
        }
    }
}

/// Extract the item from a ConditionalCheckFailedException.
fn extract_item_from_put_error(err: &SdkError<PutItemError>) -> Option<Item> {
    if let SdkError::ServiceError(service_err) = err
        && let PutItemError::ConditionalCheckFailedException(ccf) = service_err.err()
    {
        return ccf.item().cloned();
    }
    None
}

/// Put an item, blocking until complete.
pub fn put_item(client: &DynamoClient, prepared: PreparedPutItem) -> Result<Option<f64>> {
    client
        .block_on(execute_put_item(client.sdk().clone(), prepared))
        .map_err(|(e, tbl, item)| map_sdk_error_with_item(e, Some(&tbl), item))
}
