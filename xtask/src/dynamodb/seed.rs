//! Administrator account seeding.
//!
//! The admin routes trust any token whose username matches the configured
//! administrator, so the account has to exist before anyone can log in as
//! it. The three user views are written in one transaction that fails if
//! any of them is already present.

use super::error::{DynamodbError, Result};
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use localeyes_core::auth::hash_password;
use localeyes_core::social::{derive_tag, generate_user_id, User};
use localeyes_core::storage::codec::{user_by_email_item, user_by_id_item, user_by_username_item};
use localeyes_core::storage::{Item, Value, PK};
use std::collections::HashMap;

/// Build the administrator user with a freshly hashed password.
pub fn admin_user(username: &str, email: &str, password: &str, city: &str) -> Result<User> {
    let password_hash =
        hash_password(password).map_err(|e| DynamodbError::InvalidInput(e.to_string()))?;
    Ok(User {
        id: generate_user_id(),
        email: email.to_string(),
        username: username.to_string(),
        password_hash,
        city: city.to_string(),
        dwelling_age: 0.0,
        is_active: true,
        tag: derive_tag(0.0),
    })
}

/// Every item that makes up a user.
pub fn user_items(user: &User) -> Vec<Item> {
    vec![
        user_by_id_item(user),
        user_by_email_item(user),
        user_by_username_item(user),
    ]
}

fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::S(s) => AttributeValue::S(s.clone()),
        Value::N(n) if n.fract() == 0.0 => AttributeValue::N((*n as i64).to_string()),
        Value::N(n) => AttributeValue::N(n.to_string()),
        Value::Bool(b) => AttributeValue::Bool(*b),
    }
}

fn to_attributes(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), to_attribute(value)))
        .collect()
}

/// Write the user's views atomically.
pub async fn seed_user(client: &Client, table_name: &str, user: &User) -> Result<()> {
    let mut request = client.transact_write_items();
    for item in user_items(user) {
        let put = Put::builder()
            .table_name(table_name)
            .set_item(Some(to_attributes(&item)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", PK)
            .build()
            .map_err(|e| DynamodbError::AwsSdk(e.to_string()))?;
        request = request.transact_items(TransactWriteItem::builder().put(put).build());
    }

    request.send().await.map_err(|err| {
        let cancelled = err
            .as_service_error()
            .is_some_and(|e| e.is_transaction_canceled_exception());
        if cancelled {
            DynamodbError::AlreadySeeded {
                username: user.username.clone(),
            }
        } else {
            DynamodbError::AwsSdk(err.to_string())
        }
    })?;

    Ok(())
}
