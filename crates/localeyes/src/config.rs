use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(Self::DynamoDb),
            "memory" | "inmemory" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// Sender identity used for password reset mail.
#[derive(Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub sender_email: String,
    pub sender_password: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    pub storage: StorageBackend,
    /// Region of the DynamoDB table (default: "us-east-1")
    pub dynamo_region: String,
    /// Table name (default: "localeyes")
    pub table_name: String,
    /// Recency index name (default: "created_at-index")
    pub index_name: String,
    /// Local DynamoDB endpoint, if any.
    pub endpoint_url: Option<String>,
    /// Region of the alert topic (defaults to the table region)
    pub sns_region: String,
    /// Alert topic; alerts are only logged when unset.
    pub sns_topic_arn: Option<String>,
    /// Token signing secret.
    pub secret: String,
    /// Username of the administrator account (default: "admin")
    pub admin_username: String,
    pub smtp: SmtpConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("storage", &self.storage)
            .field("dynamo_region", &self.dynamo_region)
            .field("table_name", &self.table_name)
            .field("index_name", &self.index_name)
            .field("endpoint_url", &self.endpoint_url)
            .field("sns_region", &self.sns_region)
            .field("sns_topic_arn", &self.sns_topic_arn)
            .field("secret", &"<redacted>")
            .field("admin_username", &self.admin_username)
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `Secret` - Token signing secret (required)
    /// - `AdminUsername` - Administrator username (default: "admin")
    /// - `STORAGE_BACKEND` - `dynamodb` or `memory` (default: "dynamodb")
    /// - `DYNAMO_REGION` - DynamoDB region (default: "us-east-1")
    /// - `TABLE_NAME` - Table name (default: "localeyes")
    /// - `INDEX_NAME` - Recency index name (default: "created_at-index")
    /// - `AWS_ENDPOINT_URL` - Local DynamoDB endpoint (optional)
    /// - `SNS_REGION` - Alert topic region (default: `DYNAMO_REGION`)
    /// - `SNS_TOPIC_ARN` - Alert topic (optional)
    /// - `SMTPServer`, `SMTPPort`, `SMTPSenderEmail`, `SMTPSenderPassword` -
    ///   mail sender identity (port default: 587)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let storage = match var("STORAGE_BACKEND") {
            None => StorageBackend::DynamoDb,
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value,
            })?,
        };
        let port = match var("SMTPPort") {
            None => 587,
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "SMTPPort",
                value,
            })?,
        };
        let dynamo_region = or("DYNAMO_REGION", "us-east-1");

        Ok(Self {
            storage,
            sns_region: var("SNS_REGION").unwrap_or_else(|| dynamo_region.clone()),
            dynamo_region,
            table_name: or("TABLE_NAME", "localeyes"),
            index_name: or("INDEX_NAME", "created_at-index"),
            endpoint_url: var("AWS_ENDPOINT_URL"),
            sns_topic_arn: var("SNS_TOPIC_ARN"),
            secret: var("Secret").ok_or(ConfigError::Missing("Secret"))?,
            admin_username: or("AdminUsername", "admin"),
            smtp: SmtpConfig {
                server: or("SMTPServer", "smtp.gmail.com"),
                port,
                sender_email: or("SMTPSenderEmail", ""),
                sender_password: or("SMTPSenderPassword", ""),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_secret_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("Secret"));
        assert_eq!(
            load(&[("Secret", "  ")]).unwrap_err(),
            ConfigError::Missing("Secret")
        );
    }

    #[test]
    fn test_default_values() {
        let config = load(&[("Secret", "s3cr3t")]).unwrap();

        assert_eq!(config.storage, StorageBackend::DynamoDb);
        assert_eq!(config.dynamo_region, "us-east-1");
        assert_eq!(config.sns_region, "us-east-1");
        assert_eq!(config.table_name, "localeyes");
        assert_eq!(config.index_name, "created_at-index");
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.sns_topic_arn, None);
        assert_eq!(config.smtp.port, 587);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("Secret", "s3cr3t"),
            ("STORAGE_BACKEND", "Memory"),
            ("DYNAMO_REGION", "ap-south-1"),
            ("TABLE_NAME", "le-test"),
            ("INDEX_NAME", "recent"),
            ("SNS_TOPIC_ARN", "arn:aws:sns:ap-south-1:1:alerts"),
            ("AdminUsername", "root"),
            ("SMTPPort", "2525"),
            ("SMTPSenderEmail", "noreply@localeyes.app"),
        ])
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.sns_region, "ap-south-1");
        assert_eq!(config.table_name, "le-test");
        assert_eq!(config.index_name, "recent");
        assert_eq!(config.admin_username, "root");
        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.smtp.sender_email, "noreply@localeyes.app");
        assert!(config.sns_topic_arn.is_some());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            load(&[("Secret", "s"), ("STORAGE_BACKEND", "sqlite")]),
            Err(ConfigError::Invalid { name: "STORAGE_BACKEND", .. })
        ));
        assert!(matches!(
            load(&[("Secret", "s"), ("SMTPPort", "smtp")]),
            Err(ConfigError::Invalid { name: "SMTPPort", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = load(&[("Secret", "t0ps3cr3t"), ("SMTPSenderPassword", "hunter2")]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("t0ps3cr3t"));
    }
}
