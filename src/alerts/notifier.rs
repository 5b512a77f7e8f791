//! Notification delivery for fired alerts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::config::AlertRule;
use crate::data::Reading;

/// Content of a one-shot alert notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertNotice {
    pub subject: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertNotice {
    pub fn new(rule: &AlertRule, reading: &Reading) -> Self {
        Self {
            subject: format!("Alert: {} {}", reading.symbol, rule.direction),
            body: rule.describe(reading.value),
            timestamp: reading.observed_at,
        }
    }
}

/// Sink for alert notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, address: &str, notice: &AlertNotice) -> Result<(), NotifierError>;
}

/// Notifier that only writes to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, address: &str, notice: &AlertNotice) -> Result<(), NotifierError> {
        tracing::warn!(
            to = %address,
            subject = %notice.subject,
            "Alert triggered: {}",
            notice.body
        );
        Ok(())
    }
}

/// Notifier that hands messages to a mail relay over an HTTP webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, address: &str, notice: &AlertNotice) -> Result<(), NotifierError> {
        let payload = serde_json::json!({
            "to": address,
            "subject": notice.subject,
            "body": notice.body,
            "timestamp": notice.timestamp.to_rfc3339(),
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifierError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(to = %address, url = %self.url, "Webhook notification sent");

        Ok(())
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Webhook error: {0}")]
    Webhook(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::Direction;

    #[test]
    fn test_notice_content() {
        let rule = AlertRule::new("finance", "AAPL", 200.0, Direction::Above);
        let reading = Reading::new("finance", "AAPL", 201.5).unwrap();
        let notice = AlertNotice::new(&rule, &reading);

        assert_eq!(notice.subject, "Alert: AAPL above");
        assert_eq!(notice.body, "finance/AAPL = 201.5 is above threshold 200");
        assert_eq!(notice.timestamp, reading.observed_at);
    }

    #[tokio::test]
    async fn test_log_notification() {
        let rule = AlertRule::new("sensor", "humidity", 30.0, Direction::Below);
        let reading = Reading::new("sensor", "humidity", 25.0).unwrap();

        // Log notification should always succeed
        let result = LogNotifier
            .notify("ops@example.com", &AlertNotice::new(&rule, &reading))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_unreachable_is_error() {
        let notifier = WebhookNotifier::new(reqwest::Client::new(), "http://127.0.0.1:1/relay");
        let rule = AlertRule::new("sensor", "humidity", 30.0, Direction::Below);
        let reading = Reading::new("sensor", "humidity", 25.0).unwrap();

        let result = notifier
            .notify("ops@example.com", &AlertNotice::new(&rule, &reading))
            .await;
        assert!(matches!(result, Err(NotifierError::Webhook(_))));
    }
}
