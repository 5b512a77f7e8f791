//! Alert evaluation against incoming readings

use std::sync::Arc;

use super::config::AlertRule;
use super::notifier::{AlertNotice, Notifier};
use super::registry::{AlertError, AlertRegistry};
use crate::data::Reading;
use crate::hub::{BroadcastHub, LiveEvent};
use crate::scheduler::SessionId;

/// Evaluates readings against pending rules and dispatches fired alerts
pub struct AlertEvaluator {
    registry: Arc<AlertRegistry>,
    notifier: Arc<dyn Notifier>,
    hub: Arc<BroadcastHub>,
}

impl AlertEvaluator {
    pub fn new(
        registry: Arc<AlertRegistry>,
        notifier: Arc<dyn Notifier>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            registry,
            notifier,
            hub,
        }
    }

    pub fn registry(&self) -> &Arc<AlertRegistry> {
        &self.registry
    }

    /// Register a rule on behalf of a session
    pub fn register(&self, rule: AlertRule, owner: SessionId) -> Result<(), AlertError> {
        let (source, symbol) = (rule.source.clone(), rule.symbol.clone());
        let (threshold, direction) = (rule.threshold, rule.direction);

        self.registry.register(rule, owner.clone())?;

        tracing::info!(
            session_id = %owner,
            source = %source,
            symbol = %symbol,
            threshold,
            direction = %direction,
            "Alert rule registered"
        );
        Ok(())
    }

    /// Fire every rule the reading matches.
    ///
    /// Each fired rule is broadcast to all subscribers; rules with a
    /// notification address also get a notification sent on its own task.
    /// Returns the rules that fired.
    pub fn evaluate(&self, reading: &Reading) -> Vec<AlertRule> {
        let fired = self.registry.take_matching(reading);

        for rule in &fired {
            tracing::info!(
                source = %reading.source,
                symbol = %reading.symbol,
                value = reading.value,
                threshold = rule.threshold,
                direction = %rule.direction,
                "Alert fired"
            );

            self.hub.publish(LiveEvent::alert_fired(rule, reading));

            if let Some(address) = rule.notify_address.clone() {
                let notifier = Arc::clone(&self.notifier);
                let notice = AlertNotice::new(rule, reading);
                tokio::spawn(async move {
                    if let Err(e) = notifier.notify(&address, &notice).await {
                        tracing::error!(
                            to = %address,
                            error = %e,
                            "Failed to send notification"
                        );
                    }
                });
            }
        }

        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::notifier::NotifierError;
    use crate::alerts::Direction;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, AlertNotice)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, address: &str, notice: &AlertNotice) -> Result<(), NotifierError> {
            self.sent.lock().push((address.to_string(), notice.clone()));
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _: &str, _: &AlertNotice) -> Result<(), NotifierError> {
            Err(NotifierError::Webhook("relay down".to_string()))
        }
    }

    fn aapl(value: f64) -> Reading {
        Reading::new("finance", "AAPL", value).unwrap()
    }

    #[tokio::test]
    async fn test_aapl_scenario() {
        let hub = Arc::new(BroadcastHub::default());
        let mut viewer = hub.subscribe();
        let evaluator = AlertEvaluator::new(
            Arc::new(AlertRegistry::new()),
            Arc::new(RecordingNotifier::default()),
            Arc::clone(&hub),
        );

        evaluator
            .register(
                AlertRule::new("finance", "AAPL", 200.0, Direction::Above),
                SessionId::new(),
            )
            .unwrap();

        assert!(evaluator.evaluate(&aapl(199.0)).is_empty());
        assert_eq!(evaluator.registry().pending_count(), 1);

        assert_eq!(evaluator.evaluate(&aapl(201.0)).len(), 1);
        assert_eq!(evaluator.registry().pending_count(), 0);

        match viewer.try_recv().unwrap() {
            LiveEvent::AlertFired(fired) => {
                assert_eq!(fired.symbol, "AAPL");
                assert_eq!(fired.value, 201.0);
                assert_eq!(fired.direction, Direction::Above);
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert!(evaluator.evaluate(&aapl(205.0)).is_empty());
        assert!(viewer.try_recv().is_err());
    }

    #[test]
    fn test_rejected_rule_is_not_registered() {
        let evaluator = AlertEvaluator::new(
            Arc::new(AlertRegistry::new()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(BroadcastHub::default()),
        );

        let result = evaluator.register(
            AlertRule::new("finance", "AAPL", f64::NAN, Direction::Above),
            SessionId::new(),
        );
        assert!(matches!(result, Err(AlertError::InvalidThreshold(_))));

        let result = evaluator.register(
            AlertRule::new("finance", " ", 10.0, Direction::Below),
            SessionId::new(),
        );
        assert!(matches!(result, Err(AlertError::MissingKey)));

        assert_eq!(evaluator.registry().pending_count(), 0);
        assert!(evaluator.evaluate(&aapl(1.0e9)).is_empty());
    }

    #[tokio::test]
    async fn test_notification_sent_to_address() {
        let notifier = Arc::new(RecordingNotifier::default());
        let evaluator = AlertEvaluator::new(
            Arc::new(AlertRegistry::new()),
            notifier.clone(),
            Arc::new(BroadcastHub::default()),
        );

        evaluator
            .register(
                AlertRule::new("finance", "AAPL", 100.0, Direction::Below)
                    .with_notify_address("ops@example.com"),
                SessionId::new(),
            )
            .unwrap();
        evaluator
            .register(
                AlertRule::new("finance", "AAPL", 90.0, Direction::Below),
                SessionId::new(),
            )
            .unwrap();

        assert_eq!(evaluator.evaluate(&aapl(80.0)).len(), 2);

        // Notification runs on a spawned task
        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ops@example.com");
    }

    #[tokio::test]
    async fn test_notification_failure_is_not_fatal() {
        let hub = Arc::new(BroadcastHub::default());
        let mut viewer = hub.subscribe();
        let evaluator = AlertEvaluator::new(
            Arc::new(AlertRegistry::new()),
            Arc::new(FailingNotifier),
            Arc::clone(&hub),
        );

        evaluator
            .register(
                AlertRule::new("finance", "AAPL", 1.0, Direction::Above)
                    .with_notify_address("ops@example.com"),
                SessionId::new(),
            )
            .unwrap();

        assert_eq!(evaluator.evaluate(&aapl(2.0)).len(), 1);
        assert_eq!(viewer.recv().await.unwrap().kind(), "alert-fired");
    }
}
