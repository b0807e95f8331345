use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Send failed: {0}")]
    SendFailed(String),
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), ProviderError>;
    fn is_enabled(&self) -> bool;
}

pub struct SmtpProvider {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> Result<Self, ProviderError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(
            config.user.clone(),
            config.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), ProviderError> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            ProviderError::NotEnabled("SMTP email provider is not enabled".to_string())
        })?;

        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| ProviderError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("{}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject)
            .header(ContentType::TEXT_HTML)
            .body(email.body_html.clone())
            .map_err(|e| ProviderError::SendFailed(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| ProviderError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

/// Records every message instead of sending it. Can be switched into a
/// failing mode to exercise delivery errors.
#[derive(Default)]
pub struct MockEmailProvider {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl MockEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    pub fn send_count(&self) -> usize {
        self.sent().len()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::SendFailed("mock delivery failure".to_string()));
        }

        self.sent
            .lock()
            .map_err(|_| ProviderError::SendFailed("mock outbox poisoned".to_string()))?
            .push(email.clone());

        tracing::info!(to = %email.to, subject = %email.subject, "[MOCK] Email would be sent");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "tourist@example.com".to_string(),
            subject: "Booking Confirmation".to_string(),
            body_html: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn mock_records_messages() {
        let mock = MockEmailProvider::new();
        mock.send(&message()).await.unwrap();
        assert_eq!(mock.send_count(), 1);
        assert_eq!(mock.sent()[0].subject, "Booking Confirmation");
    }

    #[tokio::test]
    async fn failing_mock_reports_error_and_records_nothing() {
        let mock = MockEmailProvider::new();
        mock.set_failing(true);
        assert!(mock.send(&message()).await.is_err());
        assert_eq!(mock.send_count(), 0);
    }

    #[tokio::test]
    async fn disabled_smtp_refuses_to_send() {
        let provider = SmtpProvider::new(SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            user: String::new(),
            password: Secret::new(String::new()),
            from_email: "noreply@example.com".to_string(),
            from_name: "Tourist Helper".to_string(),
            enabled: false,
        })
        .unwrap();

        assert!(!provider.is_enabled());
        assert!(matches!(
            provider.send(&message()).await,
            Err(ProviderError::NotEnabled(_))
        ));
    }
}
