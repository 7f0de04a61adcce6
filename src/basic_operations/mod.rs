//! Single-item operations for DynamoDB.
//!
//! This module provides:
//! - `put` - Put an item, optionally conditional
//! - `get` - Get an item by key
//! - `update_op` - Update an item from field:value pairs or an expression
//! - `delete` - Delete an item, optionally conditional
//!
//! Each operation has a prepared request, an async executor and a blocking wrapper.

mod delete;
mod get;
mod put;
mod update_op;

pub use delete::{PreparedDeleteItem, delete_item, execute_delete_item};
pub use get::{execute_get_item, get_item};
pub use put::{PreparedPutItem, execute_put_item, put_item};
pub use update_op::{
    PreparedUpdateItem, execute_update_item, parse_return_values, prepare_update_item,
    update_item,
};
