use serde::{Deserialize, Serialize};

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the holder.
    pub sub: String,
    /// User id of the holder.
    pub id: String,
    /// Expiry, unix seconds.
    pub exp: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, user_id: impl Into<String>, exp: i64) -> Self {
        Self {
            sub: username.into(),
            id: user_id.into(),
            exp,
        }
    }

    pub fn username(&self) -> &str {
        &self.sub
    }

    pub fn user_id(&self) -> &str {
        &self.id
    }
}
