use async_trait::async_trait;
use domain::HalEvent;
use domain::event::EventPublisher;
use tracing::debug;

/// Reports HAL events as structured log records.
///
/// Bus open/close and dropped writes are already logged where they happen,
/// so only the per-tag I/O failures are recorded here.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

fn logged_at_source(event: &HalEvent) -> bool {
    matches!(
        event,
        HalEvent::BusOpened { .. } | HalEvent::BusClosed { .. } | HalEvent::WriteDropped { .. }
    )
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(
        &self,
        event: HalEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if logged_at_source(&event) {
            return Ok(());
        }
        match &event {
            HalEvent::ReadFailed {
                tag,
                device,
                timestamp,
            } => {
                debug!(tag = %tag, device = %device, %timestamp, "Read failed");
            }
            HalEvent::WriteFailed {
                tag,
                device,
                value,
                timestamp,
            } => {
                debug!(tag = %tag, device = %device, value, %timestamp, "Write failed");
            }
            _ => {}
        }
        Ok(())
    }
}
