use thiserror::Error;

/// Errors that can occur during store and repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    /// A single-item write was rejected by its condition.
    #[error("Condition failed for {0}")]
    ConditionFailed(String),
    /// A transaction was cancelled; `failed` lists the indices of the
    /// members whose condition did not hold.
    #[error("Transaction cancelled (failed conditions at {failed:?})")]
    TransactionCancelled { failed: Vec<usize> },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// True when a write was refused because a condition did not hold,
    /// as opposed to the store failing.
    pub fn is_condition_failure(&self) -> bool {
        match self {
            Self::ConditionFailed(_) => true,
            Self::TransactionCancelled { failed } => !failed.is_empty(),
            _ => false,
        }
    }

    /// True when the transaction member at `index` failed its condition.
    pub fn failed_at(&self, index: usize) -> bool {
        matches!(self, Self::TransactionCancelled { failed } if failed.contains(&index))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
