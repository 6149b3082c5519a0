//! Outbound email. Delivery is best-effort: callers get a status, never an error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

const RELAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail relay rejected message (status {status}): {message}")]
    Relay { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}

/// Carried in `AppState` as `Arc<dyn Mailer>`.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct RelayMailer {
    client: Client,
    url: String,
    token: Option<String>,
}

impl RelayMailer {
    pub fn new(url: String, token: Option<String>) -> Result<Self, MailError> {
        Ok(Self {
            client: Client::builder().timeout(RELAY_TIMEOUT).build()?,
            url,
            token,
        })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let mut request = self.client.post(&self.url).json(email);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Relay {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Used when no relay is configured: the message only goes to the log.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            "Mail to {} ({}): {}",
            email.to, email.subject, email.text
        );
        Ok(())
    }
}

pub fn verification_email(config: &Config, to: &str, token: &str) -> OutgoingEmail {
    OutgoingEmail {
        from: config.mail_from.clone(),
        to: to.to_string(),
        subject: "Verify your account".to_string(),
        text: format!("Click to verify: {}", config.verification_url(token)),
    }
}

pub async fn send_verification(
    mailer: &dyn Mailer,
    config: &Config,
    to: &str,
    token: &str,
) -> DeliveryStatus {
    let email = verification_email(config, to, token);
    match mailer.send(&email).await {
        Ok(()) => DeliveryStatus::Delivered,
        Err(e) => {
            warn!("Verification email to {to} failed: {e}");
            DeliveryStatus::Failed
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;
    use crate::config::Config;

    fn config() -> Config {
        Config {
            public_url: "http://jobs.local".to_string(),
            ..Config::for_tests()
        }
    }

    #[test]
    fn test_verification_email_contents() {
        let email = verification_email(&config(), "ana@example.com", "k3y");
        assert_eq!(email.from, "noreply@example.com");
        assert_eq!(email.to, "ana@example.com");
        assert_eq!(email.subject, "Verify your account");
        assert_eq!(email.text, "Click to verify: http://jobs.local/verify?token=k3y");
    }

    #[tokio::test]
    async fn test_send_verification_reports_delivery() {
        let mailer = RecordingMailer::default();
        let status = send_verification(&mailer, &config(), "ana@example.com", "t").await;
        assert_eq!(status, DeliveryStatus::Delivered);
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_verification_swallows_failure() {
        let mailer = RecordingMailer::failing();
        let status = send_verification(&mailer, &config(), "ana@example.com", "t").await;
        assert_eq!(status, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let email = verification_email(&config(), "ana@example.com", "t");
        assert!(LogMailer.send(&email).await.is_ok());
    }
}
