//! Write operations and the ordered batch they are submitted in.

use crate::Item;
use crate::expression::{Condition, Expression, not_exists_condition};

/// One write inside a transaction.
///
/// Constructors enforce the fields each kind requires; nothing else is
/// validated locally.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Put that fails if the item already exists, unless `condition` overrides
    /// the implicit precondition.
    Insert {
        table: String,
        key: Item,
        payload: Item,
        condition: Option<Expression>,
    },
    /// Unconditional put (or conditional, if `condition` is set).
    Put {
        table: String,
        key: Item,
        payload: Item,
        condition: Option<Expression>,
    },
    ConditionalUpdate {
        table: String,
        key: Item,
        update: Expression,
        condition: Option<Expression>,
    },
    Delete {
        table: String,
        key: Item,
        condition: Option<Expression>,
    },
    /// Asserts a condition on an item without writing it.
    ExistenceCheck {
        table: String,
        key: Item,
        condition: Expression,
    },
}

impl WriteOperation {
    pub fn insert(table: impl Into<String>, key: Item, payload: Item) -> Self {
        WriteOperation::Insert {
            table: table.into(),
            key,
            payload,
            condition: None,
        }
    }

    pub fn put(table: impl Into<String>, key: Item, payload: Item) -> Self {
        WriteOperation::Put {
            table: table.into(),
            key,
            payload,
            condition: None,
        }
    }

    pub fn update(table: impl Into<String>, key: Item, update: Expression) -> Self {
        WriteOperation::ConditionalUpdate {
            table: table.into(),
            key,
            update,
            condition: None,
        }
    }

    pub fn delete(table: impl Into<String>, key: Item) -> Self {
        WriteOperation::Delete {
            table: table.into(),
            key,
            condition: None,
        }
    }

    /// Check that the item exists: `attribute_exists` on its key attributes.
    pub fn existence_check(table: impl Into<String>, key: Item) -> Self {
        let mut attrs: Vec<&str> = key.keys().map(String::as_str).collect();
        attrs.sort_unstable();
        let condition = attrs
            .into_iter()
            .map(Condition::attribute_exists)
            .reduce(Condition::and)
            .map(|c| c.build("c"))
            .unwrap_or_default();
        WriteOperation::ExistenceCheck {
            table: table.into(),
            key,
            condition,
        }
    }

    /// Check an arbitrary condition on an item.
    pub fn condition_check(table: impl Into<String>, key: Item, condition: Expression) -> Self {
        WriteOperation::ExistenceCheck {
            table: table.into(),
            key,
            condition,
        }
    }

    /// Attach (or replace) the condition expression.
    pub fn with_condition(mut self, expr: Expression) -> Self {
        match &mut self {
            WriteOperation::Insert { condition, .. }
            | WriteOperation::Put { condition, .. }
            | WriteOperation::ConditionalUpdate { condition, .. }
            | WriteOperation::Delete { condition, .. } => *condition = Some(expr),
            WriteOperation::ExistenceCheck { condition, .. } => *condition = expr,
        }
        self
    }

    pub fn table(&self) -> &str {
        match self {
            WriteOperation::Insert { table, .. }
            | WriteOperation::Put { table, .. }
            | WriteOperation::ConditionalUpdate { table, .. }
            | WriteOperation::Delete { table, .. }
            | WriteOperation::ExistenceCheck { table, .. } => table,
        }
    }

    pub fn key(&self) -> &Item {
        match self {
            WriteOperation::Insert { key, .. }
            | WriteOperation::Put { key, .. }
            | WriteOperation::ConditionalUpdate { key, .. }
            | WriteOperation::Delete { key, .. }
            | WriteOperation::ExistenceCheck { key, .. } => key,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WriteOperation::Insert { .. } => "insert",
            WriteOperation::Put { .. } => "put",
            WriteOperation::ConditionalUpdate { .. } => "update",
            WriteOperation::Delete { .. } => "delete",
            WriteOperation::ExistenceCheck { .. } => "condition_check",
        }
    }

    /// The full item written by `Insert` and `Put`: key merged with payload.
    pub fn item(&self) -> Option<Item> {
        match self {
            WriteOperation::Insert { key, payload, .. } | WriteOperation::Put { key, payload, .. } => {
                let mut item = payload.clone();
                item.extend(key.iter().map(|(k, v)| (k.clone(), v.clone())));
                Some(item)
            }
            _ => None,
        }
    }

    /// The condition sent to the service, including the implicit one on `Insert`.
    pub fn effective_condition(&self) -> Option<Expression> {
        match self {
            WriteOperation::Insert {
                key, condition: None, ..
            } => not_exists_condition(key.keys().map(String::as_str)).map(|c| c.build("k")),
            WriteOperation::Insert { condition, .. }
            | WriteOperation::Put { condition, .. }
            | WriteOperation::ConditionalUpdate { condition, .. }
            | WriteOperation::Delete { condition, .. } => condition.clone(),
            WriteOperation::ExistenceCheck { condition, .. } => Some(condition.clone()),
        }
    }
}

/// An ordered list of writes committed all-or-nothing.
///
/// Two operations on the same item are rejected by the service at submit time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionBatch {
    operations: Vec<WriteOperation>,
}

impl TransactionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, operation: WriteOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }
}

impl FromIterator<WriteOperation> for TransactionBatch {
    fn from_iter<I: IntoIterator<Item = WriteOperation>>(iter: I) -> Self {
        TransactionBatch {
            operations: iter.into_iter().collect(),
        }
    }
}

/// Assemble operations into a batch, keeping their order.
pub fn build_batch(operations: impl IntoIterator<Item = WriteOperation>) -> TransactionBatch {
    operations.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn key(artist: &str, song: &str) -> Item {
        Item::from([
            ("Artist".to_string(), AttributeValue::S(artist.into())),
            ("SongTitle".to_string(), AttributeValue::S(song.into())),
        ])
    }

    #[test]
    fn insert_has_implicit_not_exists_condition() {
        let op = WriteOperation::insert("music-test", key("a", "b"), Item::new());
        let condition = op.effective_condition().unwrap();
        assert_eq!(
            condition.text,
            "attribute_not_exists(#k0) AND attribute_not_exists(#k1)"
        );
        assert_eq!(condition.names["#k0"], "Artist");
        assert_eq!(condition.names["#k1"], "SongTitle");
    }

    #[test]
    fn explicit_condition_replaces_the_implicit_one() {
        let op = WriteOperation::insert("music-test", key("a", "b"), Item::new())
            .with_condition(Expression::raw("attribute_not_exists(Artist)"));
        assert_eq!(
            op.effective_condition().unwrap().text,
            "attribute_not_exists(Artist)"
        );
    }

    #[test]
    fn put_has_no_condition_by_default() {
        let op = WriteOperation::put("music-test", key("a", "b"), Item::new());
        assert!(op.effective_condition().is_none());
    }

    #[test]
    fn item_merges_key_over_payload() {
        let payload = Item::from([
            ("Artist".to_string(), AttributeValue::S("ignored".into())),
            ("Length".to_string(), AttributeValue::N("3".into())),
        ]);
        let op = WriteOperation::put("t", key("a", "b"), payload);
        let item = op.item().unwrap();
        assert_eq!(item["Artist"], AttributeValue::S("a".into()));
        assert_eq!(item.len(), 3);
    }

    #[test]
    fn build_batch_keeps_order() {
        let batch = build_batch([
            WriteOperation::existence_check("t", key("a", "b")),
            WriteOperation::delete("t", key("c", "d")),
        ]);
        let kinds: Vec<_> = batch.operations().iter().map(WriteOperation::kind).collect();
        assert_eq!(kinds, ["condition_check", "delete"]);
    }
}
