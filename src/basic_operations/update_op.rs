//! Update item operation.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeValue, ReturnConsumedCapacity, ReturnValue, ReturnValuesOnConditionCheckFailure,
};
use std::collections::HashMap;
use std::time::Instant;

use crate::Item;
use crate::client::DynamoClient;
use crate::errors::{Error, Result, map_sdk_error_with_item};
use crate::expression::{Expression, set_expression};

/// Prepared update_item data.
#[derive(Debug, Clone)]
pub struct PreparedUpdateItem {
    pub table: String,
    pub key: Item,
    pub update: Expression,
    pub condition: Option<Expression>,
    /// Placeholders of `update` and `condition`, merged.
    pub names: HashMap<String, String>,
    pub values: Item,
    pub return_values_on_condition_check_failure: Option<ReturnValuesOnConditionCheckFailure>,
    pub return_values: Option<ReturnValue>,
}

/// Convert a CLI string to a DynamoDB ReturnValue enum.
pub fn parse_return_values(value: &str) -> Result<Option<ReturnValue>> {
    match value {
        "NONE" => Ok(None),
        "ALL_OLD" => Ok(Some(ReturnValue::AllOld)),
        "UPDATED_OLD" => Ok(Some(ReturnValue::UpdatedOld)),
        "ALL_NEW" => Ok(Some(ReturnValue::AllNew)),
        "UPDATED_NEW" => Ok(Some(ReturnValue::UpdatedNew)),
        _ => Err(Error::Validation(format!(
            "Invalid return_values: '{}'. Must be one of: NONE, ALL_OLD, UPDATED_OLD, ALL_NEW, UPDATED_NEW",
            value
        ))),
    }
}

/// Prepare update_item from field:value pairs or a raw update expression.
pub fn prepare_update_item(
    table: &str,
    key: Item,
    updates: Option<Vec<(String, AttributeValue)>>,
    update_expression: Option<Expression>,
    condition: Option<Expression>,
    return_values_on_condition_check_failure: bool,
    return_values: Option<ReturnValue>,
) -> Result<PreparedUpdateItem> {
    let update = match (updates, update_expression) {
        (Some(upd), _) if !upd.is_empty() => set_expression(upd),
        (_, Some(expr)) => expr,
        _ => {
            return Err(Error::Validation(
                "Either 'updates' or 'update_expression' must be provided".into(),
            ));
        }
    };

    let return_on_failure = if return_values_on_condition_check_failure {
        Some(ReturnValuesOnConditionCheckFailure::AllOld)
    } else {
        None
    };

    let (names, values) =
        Expression::merged_placeholders(std::iter::once(&update).chain(&condition))?;

    Ok(PreparedUpdateItem {
        table: table.to_string(),
        key,
        update,
        condition,
        names,
        values,
        return_values_on_condition_check_failure: return_on_failure,
        return_values,
    })
}

/// Core async update_item operation.
pub async fn execute_update_item(
    client: Client,
    prepared: PreparedUpdateItem,
) -> Result<Option<Item>, (SdkError<UpdateItemError>, String, Option<Item>)> {
    let has_return_values = prepared.return_values.is_some();
    let mut request = client
        .update_item()
        .table_name(&prepared.table)
        .set_key(Some(prepared.key))
        .update_expression(prepared.update.text)
        .return_consumed_capacity(ReturnConsumedCapacity::Total);

    if let Some(condition) = prepared.condition {
        request = request.condition_expression(condition.text);
    }

    for (placeholder, attr_name) in prepared.names {
        request = request.expression_attribute_names(placeholder, attr_name);
    }

    for (placeholder, attr_value) in prepared.values {
        request = request.expression_attribute_values(placeholder, attr_value);
    }

    if let Some(return_on_failure) = prepared.return_values_on_condition_check_failure {
        request = request.return_values_on_condition_check_failure(return_on_failure);
    }

    if let Some(rv) = prepared.return_values {
        request = request.return_values(rv);
    }

    let start = Instant::now();
    let result = request.send().await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(output) => {
            let consumed_wcu = output.consumed_capacity().and_then(|c| c.capacity_units());
            tracing::debug!(table = %prepared.table, duration_ms, ?consumed_wcu, "update_item");

            if has_return_values {
                Ok(output.attributes().cloned())
            } else {
                Ok(None)
            }
        }
        Err(e) => {
            let item = extract_item_from_update_error(&e);
            Err((e, prepared.table, item))
        }
    }
}

/// Extract the item from a ConditionalCheckFailedException.
fn extract_item_from_update_error(err: &SdkError<UpdateItemError>) -> Option<Item> {
    if let SdkError::ServiceError(service_err) = err
        && let UpdateItemError::ConditionalCheckFailedException(ccf) = service_err.err()
    {
        return ccf.item().cloned();
    }
    None
}

/// Update an item, blocking until complete. Returns attributes when requested.
pub fn update_item(client: &DynamoClient, prepared: PreparedUpdateItem) -> Result<Option<Item>> {
    client
        .block_on(execute_update_item(client.sdk().clone(), prepared))
        .map_err(|(e, tbl, item)| map_sdk_error_with_item(e, Some(&tbl), item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Condition;

    fn key() -> Item {
        Item::from([("Artist".to_string(), AttributeValue::S("a".into()))])
    }

    #[test]
    fn updates_take_precedence_over_raw_expression() {
        let prepared = prepare_update_item(
            "music-test",
            key(),
            Some(vec![("Length".to_string(), AttributeValue::N("1".into()))]),
            Some(Expression::raw("REMOVE Awards")),
            None,
            false,
            None,
        )
        .unwrap();
        assert_eq!(prepared.update.text, "SET #f0 = :v0");
    }

    #[test]
    fn condition_placeholders_are_merged_with_the_update() {
        let prepared = prepare_update_item(
            "music-test",
            key(),
            Some(vec![("Length".to_string(), AttributeValue::N("1".into()))]),
            None,
            Some(Condition::attribute_exists("Artist").build("c")),
            true,
            None,
        )
        .unwrap();
        assert_eq!(prepared.names["#f0"], "Length");
        assert_eq!(prepared.names["#c0"], "Artist");
        assert_eq!(prepared.values.len(), 1);
    }

    #[test]
    fn condition_reusing_update_placeholders_is_rejected() {
        let err = prepare_update_item(
            "music-test",
            key(),
            Some(vec![("Length".to_string(), AttributeValue::N("1".into()))]),
            None,
            Some(Condition::attribute_exists("Artist").build("f")),
            false,
            None,
        );
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn missing_update_is_rejected() {
        let err = prepare_update_item("music-test", key(), None, None, None, false, None);
        assert!(matches!(err, Err(Error::Validation(_))));
    }

    #[test]
    fn return_values_parse() {
        assert_eq!(parse_return_values("ALL_NEW").unwrap(), Some(ReturnValue::AllNew));
        assert_eq!(parse_return_values("NONE").unwrap(), None);
        assert!(parse_return_values("SOME").is_err());
    }
}
