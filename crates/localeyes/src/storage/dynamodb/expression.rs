//! Expression building for conditions, updates, filters and key conditions.
//!
//! Every attribute name and value is bound through a placeholder (`#aN`,
//! `:vN`) so reserved words such as `type` and `text` never reach the
//! expression text.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use localeyes_core::storage::{
    Condition, Filter, SortKeyCondition, UpdateAction, Value, PK, RECENCY_INDEX_SORT_KEY, SK,
};

use super::conversions::value_to_attribute;

/// Placeholder bindings collected while rendering expressions.
#[derive(Debug, Default)]
pub struct Expressions {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl Expressions {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, a)| a.as_str() == attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#a{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    pub fn condition(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Exists => format!("attribute_exists({})", self.name(PK)),
            Condition::NotExists => format!("attribute_not_exists({})", self.name(PK)),
            Condition::Equals { attribute, value } => {
                let name = self.name(attribute);
                let value = self.value(value_to_attribute(value));
                format!("{} = {}", name, value)
            }
        }
    }

    /// Renders update actions as `SET ... ADD ...`.
    pub fn update(&mut self, actions: &[UpdateAction]) -> String {
        let mut sets = Vec::new();
        let mut adds = Vec::new();
        for action in actions {
            match action {
                UpdateAction::Set { attribute, value } => {
                    let name = self.name(attribute);
                    let value = self.value(value_to_attribute(value));
                    sets.push(format!("{} = {}", name, value));
                }
                UpdateAction::Add { attribute, delta } => {
                    let name = self.name(attribute);
                    let value = self.value(value_to_attribute(&Value::int(*delta)));
                    adds.push(format!("{} {}", name, value));
                }
            }
        }

        let mut clauses = Vec::new();
        if !sets.is_empty() {
            clauses.push(format!("SET {}", sets.join(", ")));
        }
        if !adds.is_empty() {
            clauses.push(format!("ADD {}", adds.join(", ")));
        }
        clauses.join(" ")
    }

    pub fn filter(&mut self, filter: &Filter) -> String {
        match filter {
            Filter::Contains {
                attribute,
                substring,
            } => {
                let name = self.name(attribute);
                let value = self.value(AttributeValue::S(substring.clone()));
                format!("contains({}, {})", name, value)
            }
            Filter::NotEquals { attribute, value } => {
                let name = self.name(attribute);
                let value = self.value(value_to_attribute(value));
                format!("{} <> {}", name, value)
            }
        }
    }

    /// Key condition of a query; on the recency index the range attribute
    /// is the creation time instead of the sort key.
    pub fn key_condition(
        &mut self,
        partition: &str,
        sort_key: &SortKeyCondition,
        recency_index: bool,
    ) -> String {
        let pk = self.name(PK);
        let pk_value = self.value(AttributeValue::S(partition.to_string()));
        let expression = format!("{} = {}", pk, pk_value);

        match sort_key {
            SortKeyCondition::Any => expression,
            SortKeyCondition::BeginsWith(prefix) => {
                let range = if recency_index {
                    RECENCY_INDEX_SORT_KEY
                } else {
                    SK
                };
                let name = self.name(range);
                let value = self.value(AttributeValue::S(prefix.clone()));
                format!("{} AND begins_with({}, {})", expression, name, value)
            }
        }
    }

    /// Attribute name bindings, `None` when nothing was bound.
    pub fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    /// Attribute value bindings, `None` when nothing was bound.
    pub fn values(&self) -> Option<HashMap<String, AttributeValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_expressions() {
        let mut exprs = Expressions::new();
        assert_eq!(exprs.condition(&Condition::NotExists), "attribute_not_exists(#a0)");
        assert_eq!(exprs.condition(&Condition::Exists), "attribute_exists(#a0)");
        assert_eq!(
            exprs.condition(&Condition::equals("user_id", Value::s("u1"))),
            "#a1 = :v0"
        );

        let names = exprs.names().unwrap();
        assert_eq!(names.get("#a0").map(String::as_str), Some("pk"));
        assert_eq!(names.get("#a1").map(String::as_str), Some("user_id"));
        assert_eq!(
            exprs.values().unwrap().get(":v0"),
            Some(&AttributeValue::S("u1".to_string()))
        );
    }

    #[test]
    fn test_update_expression_groups_clauses() {
        let mut exprs = Expressions::new();
        let expression = exprs.update(&[
            UpdateAction::set("title", Value::s("t")),
            UpdateAction::add("likes", -1),
            UpdateAction::set("type", Value::s("FOOD")),
        ]);
        assert_eq!(expression, "SET #a0 = :v0, #a2 = :v2 ADD #a1 :v1");
        assert_eq!(
            exprs.values().unwrap().get(":v1"),
            Some(&AttributeValue::N("-1".to_string()))
        );
    }

    #[test]
    fn test_key_condition_on_table_and_index() {
        let mut exprs = Expressions::new();
        let expression = exprs.key_condition(
            "user:u1",
            &SortKeyCondition::BeginsWith("post:".to_string()),
            false,
        );
        assert_eq!(expression, "#a0 = :v0 AND begins_with(#a1, :v1)");
        assert_eq!(exprs.names().unwrap().get("#a1").map(String::as_str), Some("sk"));

        let mut exprs = Expressions::new();
        assert_eq!(
            exprs.key_condition("posts", &SortKeyCondition::Any, true),
            "#a0 = :v0"
        );
    }

    #[test]
    fn test_filter_expressions() {
        let mut exprs = Expressions::new();
        assert_eq!(
            exprs.filter(&Filter::contains("title", "chai")),
            "contains(#a0, :v0)"
        );
        assert_eq!(
            exprs.filter(&Filter::not_equals("username", Value::s("admin"))),
            "#a1 <> :v1"
        );
    }

    #[test]
    fn test_empty_bindings_are_none() {
        let exprs = Expressions::new();
        assert!(exprs.names().is_none());
        assert!(exprs.values().is_none());
    }
}
