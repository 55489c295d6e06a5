//! Out-of-band reporting of server errors.
//!
//! Responses whose envelope code is `DbError` carry an [`AlertContext`]
//! extension. [`publish_alerts`] picks it up once the handler is done and
//! hands it to the configured [`AlertPublisher`] on a background task, so
//! the client never waits on (or sees) the alert delivery.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{SecondsFormat, Utc};
use localeyes_core::response::AlertContext;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Failed to encode alert: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("Failed to publish alert: {0}")]
    Publish(String),
}

/// Body of an alert message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub error_code: String,
    pub status_code: String,
    pub message: String,
    pub timestamp: String,
}

impl Alert {
    pub fn new(context: &AlertContext, status: u16) -> Self {
        Self {
            error_code: context.code.as_u16().to_string(),
            status_code: status.to_string(),
            message: context.message.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

#[async_trait]
pub trait AlertPublisher: Send + Sync {
    async fn publish(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Publisher used when no topic is configured.
#[derive(Debug, Clone, Default)]
pub struct LogAlertPublisher;

#[async_trait]
impl AlertPublisher for LogAlertPublisher {
    async fn publish(&self, alert: &Alert) -> Result<(), AlertError> {
        tracing::error!(
            error_code = %alert.error_code,
            status_code = %alert.status_code,
            message = %alert.message,
            "Server error alert"
        );
        Ok(())
    }
}

#[cfg(feature = "dynamodb")]
pub use sns::SnsAlertPublisher;

#[cfg(feature = "dynamodb")]
mod sns {
    use std::collections::HashMap;

    use aws_sdk_sns::types::MessageAttributeValue;
    use aws_sdk_sns::Client;

    use super::*;

    /// Publishes alerts to an SNS topic.
    #[derive(Debug, Clone)]
    pub struct SnsAlertPublisher {
        client: Client,
        topic_arn: String,
    }

    impl SnsAlertPublisher {
        pub fn new(client: Client, topic_arn: impl Into<String>) -> Self {
            Self {
                client,
                topic_arn: topic_arn.into(),
            }
        }

        /// Creates a publisher using the AWS SDK default credential chain.
        pub async fn connect(region: &str, topic_arn: impl Into<String>) -> Self {
            let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(region.to_string()))
                .load()
                .await;

            Self::new(Client::new(&config), topic_arn)
        }
    }

    fn attribute(data_type: &str, value: &str) -> Result<MessageAttributeValue, AlertError> {
        MessageAttributeValue::builder()
            .data_type(data_type)
            .string_value(value)
            .build()
            .map_err(|e| AlertError::Publish(format!("Failed to build attribute: {e}")))
    }

    #[async_trait]
    impl AlertPublisher for SnsAlertPublisher {
        async fn publish(&self, alert: &Alert) -> Result<(), AlertError> {
            let message = serde_json::to_string(alert)?;

            let mut attributes = HashMap::new();
            attributes.insert(
                "ErrorCode".to_string(),
                attribute("String", &alert.error_code)?,
            );
            attributes.insert(
                "StatusCode".to_string(),
                attribute("Number", &alert.status_code)?,
            );

            self.client
                .publish()
                .topic_arn(&self.topic_arn)
                .message(message)
                .set_message_attributes(Some(attributes))
                .send()
                .await
                .map_err(|e| AlertError::Publish(e.to_string()))?;

            tracing::debug!(topic_arn = %self.topic_arn, "Published alert");
            Ok(())
        }
    }
}

/// Middleware publishing an alert for every response that carries an
/// [`AlertContext`].
pub async fn publish_alerts(
    State(publisher): State<Arc<dyn AlertPublisher>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if let Some(context) = response.extensions().get::<AlertContext>() {
        let alert = Alert::new(context, response.status().as_u16());
        tokio::spawn(async move {
            if let Err(e) = publisher.publish(&alert).await {
                tracing::error!(error = %e, "Failed to send alert");
            }
        });
    }

    response
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Publisher keeping every alert it receives.
    #[derive(Debug, Default)]
    pub struct RecordingPublisher {
        pub alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertPublisher for RecordingPublisher {
        async fn publish(&self, alert: &Alert) -> Result<(), AlertError> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }
}
