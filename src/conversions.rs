//! Type conversions between JSON and DynamoDB AttributeValue.

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use crate::Item;
use crate::errors::{Error, Result};

/// Convert a JSON value to a DynamoDB AttributeValue.
///
/// Handles: string, bool, number, null, array, object.
pub fn json_to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(list) => AttributeValue::L(list.iter().map(json_to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute_value(v)))
                .collect(),
        ),
    }
}

/// Parse a JSON object into an item.
pub fn json_to_item(value: &Value) -> Result<Item> {
    match value {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_attribute_value(v)))
            .collect()),
        other => Err(Error::Serialization(format!(
            "expected a JSON object for an item, got: {}",
            other
        ))),
    }
}

/// Parse an item from JSON text, e.g. a CLI argument.
pub fn parse_item(text: &str) -> Result<Item> {
    let value: Value = serde_json::from_str(text)?;
    json_to_item(&value)
}

/// Convert a DynamoDB AttributeValue to plain JSON.
///
/// Sets become arrays and binary values become base64 strings.
pub fn attribute_value_to_json(value: &AttributeValue) -> Result<Value> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::B(b) => Value::String(BASE64.encode(b.as_ref())),
        AttributeValue::L(list) => Value::Array(
            list.iter()
                .map(attribute_value_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::M(map) => Value::Object(attribute_map_to_json(map)?),
        AttributeValue::Ss(ss) => Value::Array(ss.iter().cloned().map(Value::String).collect()),
        AttributeValue::Ns(ns) => Value::Array(
            ns.iter()
                .map(|n| parse_number(n))
                .collect::<Result<Vec<_>>>()?,
        ),
        AttributeValue::Bs(bs) => Value::Array(
            bs.iter()
                .map(|b| Value::String(BASE64.encode(b.as_ref())))
                .collect(),
        ),
        _ => {
            return Err(Error::Serialization(
                "Unknown DynamoDB AttributeValue type".into(),
            ));
        }
    })
}

/// Convert an item to a JSON object.
pub fn item_to_json(item: &Item) -> Result<Value> {
    Ok(Value::Object(attribute_map_to_json(item)?))
}

fn attribute_map_to_json(map: &HashMap<String, AttributeValue>) -> Result<Map<String, Value>> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|k| Ok((k.clone(), attribute_value_to_json(&map[k])?)))
        .collect()
}

/// Parse a DynamoDB number string as an integer when possible, float otherwise.
fn parse_number(n: &str) -> Result<Value> {
    if !(n.contains('.') || n.contains('e') || n.contains('E'))
        && let Ok(i) = n.parse::<i64>()
    {
        return Ok(Value::Number(i.into()));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| Error::Serialization(format!("Invalid number: {}", n)))
}

/// Wrap raw bytes as a binary attribute.
pub fn binary(bytes: impl Into<Vec<u8>>) -> AttributeValue {
    AttributeValue::B(Blob::new(bytes.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_from_json_text() {
        let item = parse_item(r#"{"Artist": "No One You Know", "Length": 42, "Tags": [true, null]}"#)
            .unwrap();
        assert_eq!(item["Artist"], AttributeValue::S("No One You Know".into()));
        assert_eq!(item["Length"], AttributeValue::N("42".into()));
        assert_eq!(
            item["Tags"],
            AttributeValue::L(vec![AttributeValue::Bool(true), AttributeValue::Null(true)])
        );
    }

    #[test]
    fn non_object_item_is_rejected() {
        assert!(matches!(parse_item("[1, 2]"), Err(Error::Serialization(_))));
    }

    #[test]
    fn numbers_and_sets_render_as_json() {
        let mut item = Item::new();
        item.insert("Length".into(), AttributeValue::N("7".into()));
        item.insert("Ratio".into(), AttributeValue::N("0.5".into()));
        item.insert("Codes".into(), AttributeValue::Ns(vec!["1".into(), "2".into()]));
        item.insert("Raw".into(), binary(b"hi".to_vec()));

        assert_eq!(
            item_to_json(&item).unwrap(),
            json!({"Codes": [1, 2], "Length": 7, "Ratio": 0.5, "Raw": "aGk="})
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        let value = AttributeValue::N("not-a-number".into());
        assert!(attribute_value_to_json(&value).is_err());
    }
}
