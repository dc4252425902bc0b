//! Progress sink adapter publishing engine deltas onto the bus.

use trellis_core::{ProgressSink, ProgressUpdate};
use uuid::Uuid;

use crate::{Event, EventBus};

/// Adapts the engine's progress reporting to bus events for one run.
#[derive(Clone)]
pub struct BusProgressSink {
    bus: EventBus,
    run_id: Uuid,
}

impl BusProgressSink {
    /// Bind a sink to `bus` for the run identified by `run_id`.
    #[must_use]
    pub const fn new(bus: EventBus, run_id: Uuid) -> Self {
        Self { bus, run_id }
    }
}

impl ProgressSink for BusProgressSink {
    fn report(&self, update: ProgressUpdate) {
        let _ = self.bus.publish(Event::RunProgress {
            run_id: self.run_id,
            increment: update.increment,
            message: update.message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sink_publishes_progress_events() {
        let bus = EventBus::with_capacity(8);
        let run_id = Uuid::from_u128(42);
        let mut stream = bus.subscribe(None);

        let sink = BusProgressSink::new(bus, run_id);
        sink.report(ProgressUpdate::with_message(10, "validated"));

        let envelope = stream.next().await.expect("event should arrive");
        match envelope.event {
            Event::RunProgress {
                run_id: seen,
                increment,
                message,
            } => {
                assert_eq!(seen, run_id);
                assert_eq!(increment, 10);
                assert_eq!(message.as_deref(), Some("validated"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
