//! The `{message, code, data}` envelope every endpoint answers with.
//!
//! `code` is an application status that is independent of the HTTP status:
//! clients branch on it, and `DbError` additionally triggers an alert.

use serde::{Deserialize, Serialize};

/// Application status carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Success,
    AuthError,
    InvalidRequest,
    DbError,
}

impl ResponseCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::AuthError => 3300,
            Self::InvalidRequest => 4400,
            Self::DbError => 5500,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(Self::Success),
            3300 => Some(Self::AuthError),
            4400 => Some(Self::InvalidRequest),
            5500 => Some(Self::DbError),
            _ => None,
        }
    }

    /// Whether a response with this code must be reported out of band.
    pub fn requires_alert(self) -> bool {
        matches!(self, Self::DbError)
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u16::deserialize(deserializer)?;
        Self::from_u16(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown response code {code}")))
    }
}

/// Response body shared by every route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub message: String,
    pub code: ResponseCode,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Successful response carrying `data`.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            code: ResponseCode::Success,
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// Successful response without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: ResponseCode::Success,
            data: None,
        }
    }

    /// Failure response; failures never carry data.
    pub fn error(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            data: None,
        }
    }
}

/// Details of a failed response that has to be reported to operators.
///
/// Attached to the HTTP response so the alerting layer can publish it
/// together with the final HTTP status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertContext {
    pub code: ResponseCode,
    pub message: String,
}

impl AlertContext {
    /// Alert for a response with `code`, described by `detail`, when that
    /// code must be reported out of band.
    pub fn for_code(code: ResponseCode, detail: impl Into<String>) -> Option<Self> {
        code.requires_alert().then(|| Self {
            code,
            message: detail.into(),
        })
    }
}
