//! Live channel wire events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{AlertRule, Direction};
use crate::data::Reading;

/// Server to client event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LiveEvent {
    ReadingUpdate(ReadingUpdate),
    AlertFired(AlertFired),
}

impl LiveEvent {
    pub fn reading_update(reading: &Reading) -> Self {
        LiveEvent::ReadingUpdate(ReadingUpdate {
            source: reading.source.clone(),
            symbol: reading.symbol.clone(),
            value: reading.value,
            observed_at: reading.observed_at,
        })
    }

    pub fn alert_fired(rule: &AlertRule, reading: &Reading) -> Self {
        LiveEvent::AlertFired(AlertFired {
            source: reading.source.clone(),
            symbol: reading.symbol.clone(),
            value: reading.value,
            direction: rule.direction,
            threshold: rule.threshold,
            observed_at: reading.observed_at,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::ReadingUpdate(_) => "reading-update",
            LiveEvent::AlertFired(_) => "alert-fired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingUpdate {
    pub source: String,
    pub symbol: String,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFired {
    pub source: String,
    pub symbol: String,
    pub value: f64,
    pub direction: Direction,
    pub threshold: f64,
    pub observed_at: DateTime<Utc>,
}

/// Client to server event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    RegisterAlert(RegisterAlert),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAlert {
    pub source: String,
    pub symbol: String,
    pub threshold: f64,
    /// Required: the core never assumes a direction
    pub direction: Direction,
    #[serde(default)]
    pub notify_address: Option<String>,
}

impl From<RegisterAlert> for AlertRule {
    fn from(req: RegisterAlert) -> Self {
        AlertRule {
            source: req.source,
            symbol: req.symbol,
            threshold: req.threshold,
            direction: req.direction,
            notify_address: req.notify_address.filter(|a| !a.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_update_wire_shape() {
        let reading = Reading::new("finance", "AAPL", 201.0).unwrap();
        let json = serde_json::to_value(LiveEvent::reading_update(&reading)).unwrap();

        assert_eq!(json["type"], "reading-update");
        assert_eq!(json["source"], "finance");
        assert_eq!(json["symbol"], "AAPL");
        assert_eq!(json["value"], 201.0);
        assert!(json.get("observedAt").is_some());
    }

    #[test]
    fn test_alert_fired_wire_shape() {
        let reading = Reading::new("finance", "AAPL", 201.0).unwrap();
        let rule = AlertRule::new("finance", "AAPL", 200.0, Direction::Above);
        let json = serde_json::to_value(LiveEvent::alert_fired(&rule, &reading)).unwrap();

        assert_eq!(json["type"], "alert-fired");
        assert_eq!(json["direction"], "above");
        assert_eq!(json["threshold"], 200.0);
        assert_eq!(json["value"], 201.0);
    }

    #[test]
    fn test_register_alert_parse() {
        let raw = r#"{"type":"register-alert","source":"finance","symbol":"AAPL",
            "threshold":200,"direction":"below","notifyAddress":"ops@example.com"}"#;
        let ClientEvent::RegisterAlert(req) = serde_json::from_str(raw).unwrap();
        let rule = AlertRule::from(req);

        assert_eq!(rule.direction, Direction::Below);
        assert_eq!(rule.threshold, 200.0);
        assert_eq!(rule.notify_address.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_register_alert_requires_direction() {
        let raw = r#"{"type":"register-alert","source":"finance","symbol":"AAPL","threshold":200}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());

        let raw = r#"{"type":"register-alert","source":"finance","symbol":"AAPL",
            "threshold":200,"direction":"sideways"}"#;
        assert!(serde_json::from_str::<ClientEvent>(raw).is_err());
    }

    #[test]
    fn test_blank_notify_address_dropped() {
        let req = RegisterAlert {
            source: "sensor".to_string(),
            symbol: "humidity".to_string(),
            threshold: 60.0,
            direction: Direction::Above,
            notify_address: Some("  ".to_string()),
        };
        assert!(AlertRule::from(req).notify_address.is_none());
    }
}
