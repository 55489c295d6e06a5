//! Table configuration types (Functional Core - pure data).

use localeyes_core::storage::{codec::ATTR_TTL, PK, RECENCY_INDEX_SORT_KEY, SK};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub gsis: Vec<GsiConfig>,
    /// Attribute holding the expiry epoch of short-lived items.
    pub ttl_attribute: Option<String>,
}

/// A key attribute definition. Every key of the table is a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
}

impl KeyAttribute {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Global Secondary Index configuration. Indexes project all attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
}

impl TableConfig {
    /// Sets the table name.
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }

    /// Sets the name of the recency index.
    pub fn with_index_name(mut self, name: &str) -> Self {
        if let Some(gsi) = self.gsis.first_mut() {
            gsi.name = name.to_string();
        }
        self
    }
}

/// Returns the canonical table configuration for localeyes.
///
/// One table keyed by `pk`/`sk`, plus the recency index that shares the
/// partition key and sorts by `created_at`.
pub fn localeyes_table_config() -> TableConfig {
    TableConfig {
        table_name: "localeyes".to_string(),
        partition_key: KeyAttribute::new(PK),
        sort_key: Some(KeyAttribute::new(SK)),
        gsis: vec![GsiConfig {
            name: "created_at-index".to_string(),
            partition_key: KeyAttribute::new(PK),
            sort_key: Some(KeyAttribute::new(RECENCY_INDEX_SORT_KEY)),
        }],
        ttl_attribute: Some(ATTR_TTL.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recency_index_shares_the_partition_key() {
        let config = localeyes_table_config();
        assert_eq!(config.partition_key.name, "pk");
        assert_eq!(config.gsis[0].partition_key.name, "pk");
        assert_eq!(
            config.gsis[0].sort_key.as_ref().map(|k| k.name.as_str()),
            Some("created_at")
        );
    }

    #[test]
    fn names_can_be_overridden() {
        let config = localeyes_table_config()
            .with_table_name("staging")
            .with_index_name("recent");
        assert_eq!(config.table_name, "staging");
        assert_eq!(config.gsis[0].name, "recent");
    }
}
