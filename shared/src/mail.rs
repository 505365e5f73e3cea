//! Outgoing transactional email.
//!
//! Handlers build an [`OutgoingEmail`] and hand it to a [`MailSender`]. Two
//! senders exist: the Resend HTTP API (default) and Amazon SES.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_ses::types::{Body, Content, Destination, Message};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::MailProvider;
use crate::{Config, Error, Result};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// A single message ready to send.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentEmail {
    pub id: String,
}

/// Anything that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail>;
}

/// Sends through the Resend REST API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl MailSender for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail> {
        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("Failed to reach Resend: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, subject = %email.subject, "Resend rejected email");
            return Err(Error::ExternalService(format!("Resend returned {}: {}", status, body)));
        }

        let sent: SentEmail = response
            .json()
            .await
            .map_err(|e| Error::ExternalService(format!("Invalid Resend response: {}", e)))?;

        info!(email_id = %sent.id, recipients = email.to.len(), "Email sent via Resend");
        Ok(sent)
    }
}

/// Sends through Amazon SES.
pub struct SesMailer {
    client: aws_sdk_ses::Client,
}

impl SesMailer {
    pub fn new(client: aws_sdk_ses::Client) -> Self {
        Self { client }
    }
}

fn ses_content(data: &str) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to build SES content: {}", e)))
}

#[async_trait]
impl MailSender for SesMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<SentEmail> {
        let message = Message::builder()
            .subject(ses_content(&email.subject)?)
            .body(Body::builder().html(ses_content(&email.html)?).build())
            .build();

        let destination = Destination::builder()
            .set_to_addresses(Some(email.to.clone()))
            .build();

        let result = self
            .client
            .send_email()
            .source(&email.from)
            .destination(destination)
            .message(message)
            .send()
            .await
            .map_err(|e| Error::ExternalService(format!("Failed to send email: {}", e)))?;

        let id = result.message_id().to_string();
        info!(email_id = %id, recipients = email.to.len(), "Email sent via SES");
        Ok(SentEmail { id })
    }
}

/// Build the sender selected by `MAIL_PROVIDER`.
pub async fn mailer_from_config(config: &Config) -> Result<Arc<dyn MailSender>> {
    match config.mail_provider {
        MailProvider::Resend => {
            let api_key = Config::require(&config.resend_api_key, "RESEND_API_KEY")?;
            Ok(Arc::new(ResendMailer::new(config.http_client()?, api_key)))
        }
        MailProvider::Ses => {
            let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Ok(Arc::new(SesMailer::new(aws_sdk_ses::Client::new(&aws))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resend_payload_shape() {
        let email = OutgoingEmail {
            from: "OnTimely <noreply@ontimely.co.uk>".to_string(),
            to: vec!["guest@example.com".to_string()],
            subject: "Gala • Your Guest Access".to_string(),
            html: "<p>hi</p>".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&email).unwrap(),
            serde_json::json!({
                "from": "OnTimely <noreply@ontimely.co.uk>",
                "to": ["guest@example.com"],
                "subject": "Gala • Your Guest Access",
                "html": "<p>hi</p>",
            })
        );
    }

    #[tokio::test]
    async fn test_resend_requires_api_key() {
        let config = Config::default();
        let err = mailer_from_config(&config).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_sent_email_parses_resend_ack() {
        let sent: SentEmail = serde_json::from_str(r#"{"id":"49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#).unwrap();
        assert_eq!(sent.id, "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794");
    }
}
