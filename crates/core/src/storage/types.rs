//! Item model for the single table.
//!
//! A store item is a flat attribute map. Every item carries the string
//! attributes `pk` and `sk`; everything else is entity data.

use std::collections::BTreeMap;

/// Partition key attribute name.
pub const PK: &str = "pk";
/// Sort key attribute name.
pub const SK: &str = "sk";
/// Sort key attribute of the recency index (partition key is `pk`).
pub const RECENCY_INDEX_SORT_KEY: &str = "created_at";

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    S(String),
    N(f64),
    Bool(bool),
}

impl Value {
    pub fn s(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    pub fn int(value: i64) -> Self {
        Self::N(value as f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::N(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::N(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// A stored item.
pub type Item = BTreeMap<String, Value>;

/// Primary key of an item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub pk: String,
    pub sk: String,
}

impl ItemKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Reads the key attributes of an item.
    pub fn from_item(item: &Item) -> Option<Self> {
        let pk = item.get(PK)?.as_str()?;
        let sk = item.get(SK)?.as_str()?;
        Some(Self::new(pk, sk))
    }

    /// An item holding only the key attributes.
    pub fn to_item(&self) -> Item {
        Item::from([
            (PK.to_string(), Value::s(&self.pk)),
            (SK.to_string(), Value::s(&self.sk)),
        ])
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.pk, self.sk)
    }
}

/// Guard evaluated against the current version of an item before a write.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The item exists.
    Exists,
    /// The item does not exist.
    NotExists,
    /// The item exists and `attribute` equals `value`.
    Equals { attribute: String, value: Value },
}

impl Condition {
    pub fn equals(attribute: impl Into<String>, value: Value) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value,
        }
    }

    /// Evaluates the condition against the stored item, if any.
    pub fn holds(&self, current: Option<&Item>) -> bool {
        match (self, current) {
            (Self::Exists, current) => current.is_some(),
            (Self::NotExists, current) => current.is_none(),
            (Self::Equals { attribute, value }, Some(item)) => item.get(attribute) == Some(value),
            (Self::Equals { .. }, None) => false,
        }
    }
}

/// One clause of an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    Set { attribute: String, value: Value },
    /// Adds `delta` to a numeric attribute, treating a missing one as zero.
    Add { attribute: String, delta: i64 },
}

impl UpdateAction {
    pub fn set(attribute: impl Into<String>, value: Value) -> Self {
        Self::Set {
            attribute: attribute.into(),
            value,
        }
    }

    pub fn add(attribute: impl Into<String>, delta: i64) -> Self {
        Self::Add {
            attribute: attribute.into(),
            delta,
        }
    }

    /// Applies the clause to an item in place.
    pub fn apply(&self, item: &mut Item) {
        match self {
            Self::Set { attribute, value } => {
                item.insert(attribute.clone(), value.clone());
            }
            Self::Add { attribute, delta } => {
                let current = item.get(attribute).and_then(Value::as_f64).unwrap_or(0.0);
                item.insert(attribute.clone(), Value::N(current + *delta as f64));
            }
        }
    }
}

/// Sort key restriction of a query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortKeyCondition {
    #[default]
    Any,
    BeginsWith(String),
}

/// Post-read filter applied by the store after the key condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// String attribute contains a substring (case sensitive).
    Contains { attribute: String, substring: String },
    /// Attribute differs from a value.
    NotEquals { attribute: String, value: Value },
}

impl Filter {
    pub fn contains(attribute: impl Into<String>, substring: impl Into<String>) -> Self {
        Self::Contains {
            attribute: attribute.into(),
            substring: substring.into(),
        }
    }

    pub fn not_equals(attribute: impl Into<String>, value: Value) -> Self {
        Self::NotEquals {
            attribute: attribute.into(),
            value,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Contains {
                attribute,
                substring,
            } => item
                .get(attribute)
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(substring.as_str())),
            Self::NotEquals { attribute, value } => item.get(attribute) != Some(value),
        }
    }
}

/// A single query page request against one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub partition: String,
    pub sort_key: SortKeyCondition,
    pub filter: Option<Filter>,
    /// Maximum number of items evaluated (before filtering) in this page.
    pub limit: Option<u32>,
    pub exclusive_start_key: Option<Item>,
    pub scan_forward: bool,
    /// Query the recency index instead of the table.
    pub recency_index: bool,
}

impl Query {
    pub fn partition(pk: impl Into<String>) -> Self {
        Self {
            partition: pk.into(),
            sort_key: SortKeyCondition::Any,
            filter: None,
            limit: None,
            exclusive_start_key: None,
            scan_forward: true,
            recency_index: false,
        }
    }

    pub fn begins_with(mut self, prefix: impl Into<String>) -> Self {
        self.sort_key = SortKeyCondition::BeginsWith(prefix.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.scan_forward = false;
        self
    }

    pub fn on_recency_index(mut self) -> Self {
        self.recency_index = true;
        self
    }

    pub fn start_after(mut self, key: Option<Item>) -> Self {
        self.exclusive_start_key = key;
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Present when more items may follow.
    pub last_evaluated_key: Option<Item>,
}

/// Non-transactional write used by batch operations.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(ItemKey),
}

/// One member of an all-or-nothing transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactWriteItem {
    Put {
        item: Item,
        condition: Option<Condition>,
    },
    Delete {
        key: ItemKey,
        condition: Option<Condition>,
    },
    Update {
        key: ItemKey,
        actions: Vec<UpdateAction>,
        condition: Option<Condition>,
    },
}

impl TransactWriteItem {
    pub fn put(item: Item, condition: Option<Condition>) -> Self {
        Self::Put { item, condition }
    }

    pub fn delete(key: ItemKey, condition: Option<Condition>) -> Self {
        Self::Delete { key, condition }
    }

    pub fn update(key: ItemKey, actions: Vec<UpdateAction>, condition: Option<Condition>) -> Self {
        Self::Update {
            key,
            actions,
            condition,
        }
    }

    /// Key of the item the write targets, if it can be determined.
    pub fn key(&self) -> Option<ItemKey> {
        match self {
            Self::Put { item, .. } => ItemKey::from_item(item),
            Self::Delete { key, .. } | Self::Update { key, .. } => Some(key.clone()),
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Self::Put { condition, .. }
            | Self::Delete { condition, .. }
            | Self::Update { condition, .. } => condition.as_ref(),
        }
    }
}
