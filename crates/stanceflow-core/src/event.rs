use crate::types::RunId;

/// Run event broadcast to all subscribers.
///
/// The executor publishes after each node completes; observers (loggers,
/// UIs, run recorders) subscribe without being threaded into control flow.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A run started executing at the graph entry node.
    RunStarted { run_id: RunId },
    /// A node is about to execute.
    NodeStarted { run_id: RunId, node: String },
    /// A node finished and its state update was applied.
    NodeCompleted {
        run_id: RunId,
        node: String,
        elapsed_ms: u64,
    },
    /// A debate turn was appended to the history.
    DebateTurn {
        run_id: RunId,
        turn: usize,
        agreed: Option<bool>,
    },
    /// The analyzed target was replaced mid-run.
    TargetReplaced { run_id: RunId, target: String },
    /// The run reached the terminal signal.
    RunCompleted { run_id: RunId, nodes_executed: usize },
    /// The run aborted on a collaborator failure or cancellation.
    RunFailed { run_id: RunId, error: String },
}

/// Broadcast fan-out for run events.
///
/// Every subscriber sees every event published after it subscribed. A
/// subscriber that falls more than `capacity` events behind receives a
/// lag marker from the channel and skips ahead; the publisher never blocks.
pub struct EventBus {
    tx: tokio::sync::broadcast::Sender<RunEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = tokio::sync::broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. With no live subscribers the event is dropped,
    /// which is the expected state for runs nobody is observing.
    pub fn publish(&self, event: RunEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RunEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        let run_id = RunId::from_string("r1");
        bus.publish(RunEvent::RunStarted {
            run_id: run_id.clone(),
        });

        match rx.recv().await.unwrap() {
            RunEvent::RunStarted { run_id: got } => assert_eq!(got, run_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(RunEvent::RunCompleted {
            run_id: RunId::new(),
            nodes_executed: 6,
        });
    }

    #[test]
    fn test_subscriber_count_tracks_receivers() {
        let bus = EventBus::new(8);
        let rx = bus.subscribe();
        let rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
        drop(rx);
        drop(rx2);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
