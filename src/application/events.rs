// Session lifecycle events published to optional subscribers
use crate::domain::warning::Warning;
use serde::Serialize;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    TransferStarted { plant_id: String, row_limit: u64 },
    SampleReceived { row_index: i64, accepted_count: u64 },
    SampleRejected { row_index: i64, reason: String },
    WarningRaised { warning: Warning },
    TransferCompleted { accepted_count: u64, percent_of_limit: f64 },
    SessionAborted { reason: String },
}

#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // Err only means nobody is listening
        let _ = self.tx.send(event);
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::new();
        publisher.publish(SessionEvent::SessionAborted {
            reason: "nobody home".to_string(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();
        publisher.publish(SessionEvent::SampleReceived {
            row_index: 3,
            accepted_count: 1,
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::SampleReceived {
                row_index: 3,
                accepted_count: 1
            }
        );
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(SessionEvent::SessionAborted {
            reason: "shutdown".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "session_aborted");
        assert_eq!(json["reason"], "shutdown");
    }
}
