//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB attribute maps and store
//! items. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use localeyes_core::storage::{Item, ItemKey, RepositoryError, Value, PK, SK};

pub type AttributeMap = HashMap<String, AttributeValue>;

/// Convert a store value to a DynamoDB attribute.
///
/// Integral numbers are written without a fractional part so counters like
/// `likes` read back as integers.
pub fn value_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::S(s) => AttributeValue::S(s.clone()),
        Value::N(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            AttributeValue::N((*n as i64).to_string())
        }
        Value::N(n) => AttributeValue::N(n.to_string()),
        Value::Bool(b) => AttributeValue::Bool(*b),
    }
}

/// Convert a DynamoDB attribute to a store value.
pub fn attribute_to_value(
    name: &str,
    attribute: &AttributeValue,
) -> Result<Value, RepositoryError> {
    match attribute {
        AttributeValue::S(s) => Ok(Value::S(s.clone())),
        AttributeValue::N(n) => n.parse::<f64>().map(Value::N).map_err(|_| {
            RepositoryError::InvalidData(format!("Invalid number in field {}: {}", name, n))
        }),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        other => Err(RepositoryError::InvalidData(format!(
            "Unsupported attribute type in field {}: {:?}",
            name, other
        ))),
    }
}

/// Convert a store item to a DynamoDB item.
pub fn item_to_attributes(item: &Item) -> AttributeMap {
    item.iter()
        .map(|(name, value)| (name.clone(), value_to_attribute(value)))
        .collect()
}

/// Convert a DynamoDB item to a store item.
pub fn attributes_to_item(attributes: &AttributeMap) -> Result<Item, RepositoryError> {
    attributes
        .iter()
        .map(|(name, attribute)| Ok((name.clone(), attribute_to_value(name, attribute)?)))
        .collect()
}

/// Key attributes of an item.
pub fn key_to_attributes(key: &ItemKey) -> AttributeMap {
    HashMap::from([
        (PK.to_string(), AttributeValue::S(key.pk.clone())),
        (SK.to_string(), AttributeValue::S(key.sk.clone())),
    ])
}
