//! Outbound notification channel.
//!
//! Fulfillment handlers compose messages; this module delivers them via
//! the Resend API, or logs and skips when no API key is configured.
//! Delivery failures are the caller's problem only to the extent of
//! logging: a payment that succeeded must never be rolled back because
//! its notification could not be sent.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Retry delays in seconds (exponential backoff: 1s, 4s, 16s)
const RETRY_DELAYS: &[u64] = &[1, 4, 16];

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A composed notification, ready for delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

/// Result of attempting delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Delivered to the email API.
    Sent,
    /// No API key configured; message logged and dropped.
    Disabled,
}

/// Delivery abstraction so tests can record messages instead of sending.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<SendOutcome>;
}

/// Resend API request body.
#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    /// Base64-encoded file content.
    content: String,
}

/// Resend API response.
#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    #[allow(dead_code)]
    id: String,
}

/// Email channel backed by the Resend API.
#[derive(Clone)]
pub struct ResendChannel {
    api_key: Option<String>,
    from_email: String,
    http_client: Client,
}

impl ResendChannel {
    pub fn new(api_key: Option<String>, from_email: String) -> Self {
        Self {
            api_key,
            from_email,
            http_client: Client::new(),
        }
    }

    /// Send a request to the Resend API with exponential backoff retry.
    ///
    /// Retries on transient errors (network issues, 5xx, 429 rate limit).
    /// Fails immediately on non-transient errors (4xx except 429).
    async fn send_with_retry(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
        to_email: &str,
    ) -> Result<SendOutcome> {
        let mut last_error: Option<AppError> = None;

        for (attempt, delay_secs) in std::iter::once(&0u64).chain(RETRY_DELAYS).enumerate() {
            if *delay_secs > 0 {
                tracing::warn!(
                    attempt,
                    delay_secs,
                    "Retrying email send after transient failure"
                );
                tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
            }

            match self.send_request(api_key, request).await {
                Ok(()) => {
                    tracing::info!(to = %to_email, attempt, "Notification email sent");
                    return Ok(SendOutcome::Sent);
                }
                Err((error, is_transient)) => {
                    if is_transient {
                        last_error = Some(error);
                    } else {
                        return Err(error);
                    }
                }
            }
        }

        tracing::error!(
            to = %to_email,
            attempts = RETRY_DELAYS.len() + 1,
            "Email send failed after all retries"
        );
        Err(last_error.unwrap_or_else(|| {
            AppError::Internal("Email service error: all retries exhausted".into())
        }))
    }

    /// Send a single request. Returns Ok(()) on success, or
    /// Err((AppError, is_transient)) on failure.
    async fn send_request(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
    ) -> std::result::Result<(), (AppError, bool)> {
        let response = self
            .http_client
            .post(RESEND_API_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send request to email API");
                // Network errors are transient
                (
                    AppError::Internal(format!("Email service error: {}", e)),
                    true,
                )
            })?;

        let status = response.status();

        if status.is_success() {
            let _result: ResendEmailResponse = response.json().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to parse email API response");
                (AppError::Internal("Email service response error".into()), false)
            })?;
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            let is_transient = status.as_u16() == 429 || status.is_server_error();

            if is_transient {
                tracing::warn!(status = %status, body = %body, "Email API returned transient error");
            } else {
                tracing::error!(status = %status, body = %body, "Email API returned non-transient error");
            }

            Err((
                AppError::Internal(format!("Email service error: {} - {}", status, body)),
                is_transient,
            ))
        }
    }
}

#[async_trait]
impl NotificationChannel for ResendChannel {
    async fn send(&self, message: &EmailMessage) -> Result<SendOutcome> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(
                to = %message.to,
                subject = %message.subject,
                "No email API key configured, dropping notification"
            );
            return Ok(SendOutcome::Disabled);
        };

        let request = ResendEmailRequest {
            from: &self.from_email,
            to: vec![&message.to],
            subject: &message.subject,
            html: &message.html_body,
            attachments: message
                .attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.filename,
                    content: BASE64.encode(&a.content),
                })
                .collect(),
        };

        self.send_with_retry(api_key, &request, &message.to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delays_configuration() {
        assert_eq!(RETRY_DELAYS.len(), 3, "Should have 3 retry attempts");
        assert_eq!(RETRY_DELAYS, &[1, 4, 16], "Exponential backoff: 1s, 4s, 16s");

        let total_delay: u64 = RETRY_DELAYS.iter().sum();
        assert_eq!(total_delay, 21);
    }

    #[tokio::test]
    async fn test_disabled_channel_drops_message() {
        let channel = ResendChannel::new(None, "noreply@janhit.example".to_string());
        let message = EmailMessage {
            to: "citizen@example.com".to_string(),
            subject: "hello".to_string(),
            html_body: "<p>hi</p>".to_string(),
            attachments: vec![],
        };

        let outcome = channel.send(&message).await.unwrap();
        assert_eq!(outcome, SendOutcome::Disabled);
    }
}
