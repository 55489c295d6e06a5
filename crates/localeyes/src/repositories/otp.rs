use std::sync::Arc;

use chrono::{DateTime, Utc};

use localeyes_core::auth::{calculate_expiry, generate_otp, OTP_TTL};
use localeyes_core::social::OtpRecord;
use localeyes_core::storage::codec::{item_to_otp, otp_to_item};
use localeyes_core::storage::{keys, RepositoryError, Result, TableStore};

const ENTITY: &str = "Otp";

/// Password reset codes, keyed by email with the code as sort key.
#[derive(Clone)]
pub struct OtpRepository {
    store: Arc<dyn TableStore>,
}

impl OtpRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    pub fn generate(&self) -> String {
        generate_otp()
    }

    /// Stores a code valid for ten minutes from `now`.
    pub async fn save(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<OtpRecord> {
        let record = OtpRecord {
            email: email.to_string(),
            code: code.to_string(),
            expires_at: calculate_expiry(now, OTP_TTL).timestamp(),
        };
        self.store.put(otp_to_item(&record), None).await?;

        tracing::debug!(email, "Stored password reset code");
        Ok(record)
    }

    /// Point lookup of a code. Unknown and expired codes are `NotFound`.
    pub async fn validate(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<OtpRecord> {
        let not_found = || RepositoryError::NotFound {
            entity_type: ENTITY,
            id: email.to_string(),
        };

        let item = self
            .store
            .get(&keys::otp(email, code))
            .await?
            .ok_or_else(not_found)?;
        let record = item_to_otp(&item)?;
        if record.is_expired(now) {
            return Err(not_found());
        }
        Ok(record)
    }

    /// Removes a code once it has been used.
    pub async fn consume(&self, email: &str, code: &str) -> Result<()> {
        self.store.delete(&keys::otp(email, code), None).await?;
        Ok(())
    }
}
