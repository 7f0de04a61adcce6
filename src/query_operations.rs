//! Query and scan operations.

use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

use crate::Item;
use crate::client::DynamoClient;
use crate::errors::{Result, map_sdk_error};
use crate::expression::{Condition, Expression};

/// A key-condition query against a table or one of its indexes.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub key_condition: Condition,
    pub filter: Option<Condition>,
    /// Stop after this many items. `None` reads every page.
    pub limit: Option<i32>,
    /// Ascending sort key order when true.
    pub scan_forward: bool,
}

impl QueryRequest {
    pub fn new(table: impl Into<String>, key_condition: Condition) -> Self {
        QueryRequest {
            table: table.into(),
            index: None,
            key_condition,
            filter: None,
            limit: None,
            scan_forward: true,
        }
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn filter(mut self, filter: Condition) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn scan_forward(mut self, forward: bool) -> Self {
        self.scan_forward = forward;
        self
    }
}

fn placeholders(
    expressions: &[&Expression],
) -> Result<(Option<HashMap<String, String>>, Option<Item>)> {
    let (names, values) = Expression::merged_placeholders(expressions.iter().copied())?;
    Ok((
        (!names.is_empty()).then_some(names),
        (!values.is_empty()).then_some(values),
    ))
}

/// Core async query. Follows pagination unless a limit is set.
pub async fn execute_query(client: &Client, request: &QueryRequest) -> Result<Vec<Item>> {
    let key_expr = request.key_condition.build("k");
    let filter_expr = request.filter.as_ref().map(|f| f.build("q"));
    let mut exprs = vec![&key_expr];
    exprs.extend(filter_expr.as_ref());
    let (names, values) = placeholders(&exprs)?;

    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let output = client
            .query()
            .table_name(&request.table)
            .set_index_name(request.index.clone())
            .key_condition_expression(&key_expr.text)
            .set_filter_expression(filter_expr.as_ref().map(|f| f.text.clone()))
            .set_expression_attribute_names(names.clone())
            .set_expression_attribute_values(values.clone())
            .set_limit(request.limit)
            .scan_index_forward(request.scan_forward)
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, Some(&request.table)))?;

        items.extend(output.items.unwrap_or_default());
        start_key = output.last_evaluated_key;
        if start_key.is_none() || request.limit.is_some() {
            break;
        }
    }

    tracing::debug!(table = %request.table, index = ?request.index, count = items.len(), "query");
    Ok(items)
}

/// Run a query, blocking until every page is read.
pub fn query(client: &DynamoClient, request: &QueryRequest) -> Result<Vec<Item>> {
    client.block_on(execute_query(client.sdk(), request))
}

/// Core async scan with an optional filter, reading every page.
pub async fn execute_scan(
    client: &Client,
    table: &str,
    filter: Option<&Condition>,
) -> Result<Vec<Item>> {
    let filter_expr = filter.map(|f| f.build("s"));
    let exprs: Vec<&Expression> = filter_expr.iter().collect();
    let (names, values) = placeholders(&exprs)?;

    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let output = client
            .scan()
            .table_name(table)
            .set_filter_expression(filter_expr.as_ref().map(|f| f.text.clone()))
            .set_expression_attribute_names(names.clone())
            .set_expression_attribute_values(values.clone())
            .set_exclusive_start_key(start_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, Some(table)))?;

        items.extend(output.items.unwrap_or_default());
        start_key = output.last_evaluated_key;
        if start_key.is_none() {
            break;
        }
    }

    tracing::debug!(table, count = items.len(), filtered = filter.is_some(), "scan");
    Ok(items)
}

/// Scan a whole table, blocking until every page is read.
pub fn scan(client: &DynamoClient, table: &str, filter: Option<&Condition>) -> Result<Vec<Item>> {
    client.block_on(execute_scan(client.sdk(), table, filter))
}
