//! Delivery of password reset codes.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid mail message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("SMTP is not configured: {0} is empty")]
    NotConfigured(&'static str),
}

/// Sends a one-time password to the owner of an email address.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError>;
}

pub const OTP_SUBJECT: &str = "Localeyes password reset";

/// The plain text message carrying `otp` to `to`.
pub fn otp_message(from: &str, to: &str, otp: &str) -> Result<Message, MailError> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = to.parse()?;

    Ok(Message::builder()
        .from(from)
        .to(to)
        .subject(OTP_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(format!("Hello,\r\nThis is your otp to reset password: {otp}"))?)
}

/// Mailer delivering codes through an authenticated STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    sender: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Builds the transport; every SMTP setting must be present.
    pub fn new(smtp: &SmtpConfig) -> Result<Self, MailError> {
        for (name, value) in [
            ("SMTPServer", &smtp.server),
            ("SMTPSenderEmail", &smtp.sender_email),
            ("SMTPSenderPassword", &smtp.sender_password),
        ] {
            if value.trim().is_empty() {
                return Err(MailError::NotConfigured(name));
            }
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.sender_email.clone(),
                smtp.sender_password.clone(),
            ))
            .build();

        Ok(Self {
            sender: smtp.sender_email.clone(),
            transport,
        })
    }
}

#[async_trait]
impl OtpMailer for SmtpMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError> {
        let message = otp_message(&self.sender, email, otp)?;
        self.transport.send(message).await?;
        tracing::info!(to = email, "Sent password reset code");
        Ok(())
    }
}

/// Mailer that only logs the request. Used with the in-memory backend, where
/// no SMTP relay is expected.
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
    server: String,
}

impl LogMailer {
    pub fn new(smtp: &SmtpConfig) -> Self {
        Self {
            sender: smtp.sender_email.clone(),
            server: format!("{}:{}", smtp.server, smtp.port),
        }
    }
}

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError> {
        if self.sender.is_empty() {
            return Err(MailError::Delivery("no sender address configured".to_string()));
        }

        tracing::info!(
            to = email,
            from = %self.sender,
            server = %self.server,
            otp_length = otp.len(),
            "Password reset code not delivered; logging mailer in use"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Mailer keeping the codes it was asked to send.
    #[derive(Debug, Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        pub fn last_code_for(&self, email: &str) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(to, _)| to == email)
                .map(|(_, otp)| otp.clone())
        }
    }

    #[async_trait]
    impl OtpMailer for RecordingMailer {
        async fn send_otp(&self, email: &str, otp: &str) -> Result<(), MailError> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), otp.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp(sender: &str) -> SmtpConfig {
        SmtpConfig {
            server: "smtp.example.com".to_string(),
            port: 587,
            sender_email: sender.to_string(),
            sender_password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_log_mailer_requires_sender() {
        assert!(LogMailer::new(&smtp("noreply@example.com"))
            .send_otp("a@b.com", "123456")
            .await
            .is_ok());
        assert!(LogMailer::new(&smtp(""))
            .send_otp("a@b.com", "123456")
            .await
            .is_err());
    }

    #[test]
    fn test_otp_message_carries_code() {
        let message = otp_message("noreply@example.com", "nisha@example.com", "482913").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: noreply@example.com"));
        assert!(raw.contains("To: nisha@example.com"));
        assert!(raw.contains(&format!("Subject: {OTP_SUBJECT}")));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("This is your otp to reset password: 482913"));
    }

    #[test]
    fn test_otp_message_rejects_bad_recipient() {
        assert!(matches!(
            otp_message("noreply@example.com", "not an address", "482913"),
            Err(MailError::Address(_))
        ));
    }

    #[test]
    fn test_smtp_mailer_requires_credentials() {
        let mut config = smtp("noreply@example.com");
        config.sender_password = String::new();

        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::NotConfigured("SMTPSenderPassword"))
        ));
        assert!(matches!(
            SmtpMailer::new(&smtp("")),
            Err(MailError::NotConfigured("SMTPSenderEmail"))
        ));
    }

    #[tokio::test]
    async fn test_smtp_mailer_builds_with_full_config() {
        assert!(SmtpMailer::new(&smtp("noreply@example.com")).is_ok());
    }
}
