//! Submitting a [`TransactionBatch`] through TransactWriteItems.

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{
    CancellationReason, ConditionCheck, Delete, Put, TransactWriteItem, Update,
};
use std::time::Instant;

use super::operation::{TransactionBatch, WriteOperation};
use super::{TRANSACTION_MAX_ITEMS, TransactionError, TransactionSubmitter};
use crate::client::DynamoClient;
use crate::errors::{Error, Result, map_sdk_error};
use crate::expression::Expression;

impl TransactionSubmitter for DynamoClient {
    fn submit(&self, batch: TransactionBatch) -> Result<(), TransactionError> {
        if batch.is_empty() {
            return Ok(());
        }
        if batch.len() > TRANSACTION_MAX_ITEMS {
            return Err(TransactionError::TooManyOperations {
                max: TRANSACTION_MAX_ITEMS,
                got: batch.len(),
            });
        }

        let transact_items = build_transact_write_items(batch.operations())?;
        let count = transact_items.len();

        let start = Instant::now();
        let result = self.block_on(execute_transact_write(self.sdk().clone(), transact_items));
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(()) => tracing::info!(operations = count, duration_ms, "transaction committed"),
            Err(e) => tracing::info!(operations = count, duration_ms, error = %e, "transaction rejected"),
        }
        result
    }
}

/// Core async TransactWriteItems call.
pub async fn execute_transact_write(
    client: Client,
    transact_items: Vec<TransactWriteItem>,
) -> Result<(), TransactionError> {
    client
        .transact_write_items()
        .set_transact_items(Some(transact_items))
        .send()
        .await
        .map(|_| ())
        .map_err(map_transact_error)
}

/// Convert every operation, reporting the index of the first malformed one.
pub fn build_transact_write_items(
    operations: &[WriteOperation],
) -> Result<Vec<TransactWriteItem>, TransactionError> {
    operations
        .iter()
        .enumerate()
        .map(|(index, op)| {
            build_transact_write_item(op).map_err(|e| TransactionError::InvalidOperation {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Build a TransactWriteItem from a [`WriteOperation`].
///
/// An `Insert` without an explicit condition must name at least one key
/// attribute, since its not-exists guard is built from the key.
pub fn build_transact_write_item(op: &WriteOperation) -> Result<TransactWriteItem> {
    if let WriteOperation::Insert {
        key,
        condition: None,
        ..
    } = op
        && key.is_empty()
    {
        return Err(Error::Validation(
            "insert has no key attributes to guard with attribute_not_exists".into(),
        ));
    }

    let condition = op.effective_condition();

    match op {
        WriteOperation::Insert { table, .. } | WriteOperation::Put { table, .. } => {
            let mut put_builder = Put::builder().table_name(table).set_item(op.item());
            if let Some(expr) = &condition {
                put_builder = put_builder.condition_expression(&expr.text);
            }
            let (names, values) = Expression::merged_placeholders(condition.iter())?;
            let put = put_builder
                .set_expression_attribute_names(non_empty(names))
                .set_expression_attribute_values(non_empty(values))
                .build()?;
            Ok(TransactWriteItem::builder().put(put).build())
        }
        WriteOperation::ConditionalUpdate {
            table, key, update, ..
        } => {
            let mut update_builder = Update::builder()
                .table_name(table)
                .set_key(Some(key.clone()))
                .update_expression(&update.text);
            if let Some(expr) = &condition {
                update_builder = update_builder.condition_expression(&expr.text);
            }
            let (names, values) =
                Expression::merged_placeholders(std::iter::once(update).chain(condition.iter()))?;
            let update = update_builder
                .set_expression_attribute_names(non_empty(names))
                .set_expression_attribute_values(non_empty(values))
                .build()?;
            Ok(TransactWriteItem::builder().update(update).build())
        }
        WriteOperation::Delete { table, key, .. } => {
            let mut delete_builder = Delete::builder().table_name(table).set_key(Some(key.clone()));
            if let Some(expr) = &condition {
                delete_builder = delete_builder.condition_expression(&expr.text);
            }
            let (names, values) = Expression::merged_placeholders(condition.iter())?;
            let delete = delete_builder
                .set_expression_attribute_names(non_empty(names))
                .set_expression_attribute_values(non_empty(values))
                .build()?;
            Ok(TransactWriteItem::builder().delete(delete).build())
        }
        WriteOperation::ExistenceCheck {
            table,
            key,
            condition,
        } => {
            let check = ConditionCheck::builder()
                .table_name(table)
                .set_key(Some(key.clone()))
                .condition_expression(&condition.text)
                .set_expression_attribute_names(non_empty(condition.names.clone()))
                .set_expression_attribute_values(non_empty(condition.values.clone()))
                .build()?;
            Ok(TransactWriteItem::builder().condition_check(check).build())
        }
    }
}

/// The service rejects empty placeholder maps, so omit them.
fn non_empty<K, V>(map: std::collections::HashMap<K, V>) -> Option<std::collections::HashMap<K, V>> {
    if map.is_empty() { None } else { Some(map) }
}

/// Map a TransactWriteItems failure, extracting the failing operation when reported.
fn map_transact_error(err: SdkError<TransactWriteItemsError>) -> TransactionError {
    if let SdkError::ServiceError(service_err) = &err
        && let TransactWriteItemsError::TransactionCanceledException(canceled) = service_err.err()
    {
        if let Some(failure) = failed_operation(canceled.cancellation_reasons()) {
            return failure;
        }
        return TransactionError::Canceled {
            reason: canceled
                .message()
                .unwrap_or("Transaction was canceled")
                .to_string(),
        };
    }
    TransactionError::Service(map_sdk_error(err, None))
}

/// Find the first cancellation reason that is not `None`.
///
/// Reasons are positional: entry `i` describes operation `i`.
pub fn failed_operation(reasons: &[CancellationReason]) -> Option<TransactionError> {
    reasons.iter().enumerate().find_map(|(index, reason)| match reason.code() {
        Some("None") | None => None,
        Some(code) => Some(TransactionError::OperationFailed {
            index,
            code: code.to_string(),
            message: reason.message().map(str::to_string),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Item;
    use crate::expression::{Condition, set_expression};
    use aws_sdk_dynamodb::config::http::HttpResponse;
    use aws_sdk_dynamodb::error::ErrorMetadata;
    use aws_sdk_dynamodb::types::AttributeValue;
    use aws_sdk_dynamodb::types::error::TransactionCanceledException;

    fn service_error(err: TransactWriteItemsError) -> SdkError<TransactWriteItemsError> {
        let status = 400u16.try_into().expect("valid status code");
        SdkError::service_error(err, HttpResponse::new(status, "".into()))
    }

    fn canceled(reasons: Vec<CancellationReason>) -> SdkError<TransactWriteItemsError> {
        let exception = TransactionCanceledException::builder()
            .message("Transaction cancelled, please refer cancellation reasons for specific reasons")
            .set_cancellation_reasons(Some(reasons))
            .build();
        service_error(TransactWriteItemsError::TransactionCanceledException(exception))
    }

    fn key(artist: &str) -> Item {
        Item::from([
            ("Artist".to_string(), AttributeValue::S(artist.into())),
            ("SongTitle".to_string(), AttributeValue::S("Song".into())),
        ])
    }

    #[test]
    fn insert_becomes_conditional_put() {
        let payload = Item::from([("Length".to_string(), AttributeValue::N("5".into()))]);
        let item =
            build_transact_write_item(&WriteOperation::insert("music-default", key("a"), payload))
                .unwrap();
        let put = item.put().unwrap();

        assert_eq!(put.table_name(), "music-default");
        assert_eq!(put.item().len(), 3);
        assert_eq!(
            put.condition_expression(),
            Some("attribute_not_exists(#k0) AND attribute_not_exists(#k1)")
        );
        assert_eq!(put.expression_attribute_names().unwrap()["#k1"], "SongTitle");
        assert!(put.expression_attribute_values().is_none());
    }

    #[test]
    fn update_merges_update_and_condition_placeholders() {
        let op = WriteOperation::update(
            "music-test",
            key("a"),
            set_expression([("Length", AttributeValue::N("9".into()))]),
        )
        .with_condition(Condition::attribute_exists("Artist").build("c"));

        let item = build_transact_write_item(&op).unwrap();
        let update = item.update().unwrap();
        assert_eq!(update.update_expression(), "SET #f0 = :v0");
        assert_eq!(update.condition_expression(), Some("attribute_exists(#c0)"));
        let names = update.expression_attribute_names().unwrap();
        assert_eq!(names["#f0"], "Length");
        assert_eq!(names["#c0"], "Artist");
    }

    #[test]
    fn existence_check_becomes_condition_check() {
        let item =
            build_transact_write_item(&WriteOperation::existence_check("music-test", key("a")))
                .unwrap();
        let check = item.condition_check().unwrap();
        assert_eq!(
            check.condition_expression(),
            "attribute_exists(#c0) AND attribute_exists(#c1)"
        );
    }

    #[test]
    fn failed_operation_reports_first_non_none_reason() {
        let reasons = vec![
            CancellationReason::builder().code("None").build(),
            CancellationReason::builder()
                .code("ConditionalCheckFailed")
                .message("The conditional request failed")
                .build(),
        ];
        match failed_operation(&reasons) {
            Some(TransactionError::OperationFailed {
                index,
                code,
                message,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(code, "ConditionalCheckFailed");
                assert_eq!(message.as_deref(), Some("The conditional request failed"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn all_none_reasons_report_nothing() {
        let reasons = vec![CancellationReason::builder().code("None").build()];
        assert!(failed_operation(&reasons).is_none());
    }

    #[test]
    fn cancellation_with_reasons_names_the_failing_operation() {
        let err = map_transact_error(canceled(vec![
            CancellationReason::builder().code("None").build(),
            CancellationReason::builder()
                .code("ConditionalCheckFailed")
                .message("The conditional request failed")
                .build(),
            CancellationReason::builder().code("None").build(),
        ]));
        assert!(matches!(
            err,
            TransactionError::OperationFailed { index: 1, ref code, .. } if code == "ConditionalCheckFailed"
        ));
    }

    #[test]
    fn cancellation_without_reasons_is_opaque() {
        let err = map_transact_error(canceled(Vec::new()));
        match err {
            TransactionError::Canceled { reason } => assert!(reason.starts_with("Transaction cancelled")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn other_service_errors_are_mapped_through_the_common_table() {
        let meta = ErrorMetadata::builder()
            .code("ValidationException")
            .message("Transaction request cannot include multiple operations on one item")
            .build();
        let err = map_transact_error(service_error(TransactWriteItemsError::generic(meta)));
        assert!(matches!(
            &err,
            TransactionError::Service(Error::Validation(msg))
                if msg == "Transaction request cannot include multiple operations on one item"
        ));
    }

    #[test]
    fn keyless_insert_is_rejected_with_its_index() {
        let ops = [
            WriteOperation::put("music-test", key("a"), Item::new()),
            WriteOperation::insert("music-test", Item::new(), Item::new()),
        ];
        match build_transact_write_items(&ops) {
            Err(TransactionError::InvalidOperation { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn keyless_insert_with_explicit_condition_is_allowed() {
        let op = WriteOperation::insert("music-test", Item::new(), key("a"))
            .with_condition(Condition::attribute_not_exists("Artist").build("c"));
        let item = build_transact_write_item(&op).unwrap();
        assert_eq!(
            item.put().unwrap().condition_expression(),
            Some("attribute_not_exists(#c0)")
        );
    }

    #[test]
    fn clashing_placeholder_prefixes_are_rejected() {
        let op = WriteOperation::update(
            "music-test",
            key("a"),
            set_expression([("Length", AttributeValue::N("9".into()))]),
        )
        .with_condition(Condition::attribute_exists("Artist").build("f"));

        assert!(matches!(
            build_transact_write_items(&[op]),
            Err(TransactionError::InvalidOperation { index: 0, .. })
        ));
    }
}
