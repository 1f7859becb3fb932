use crate::HalEvent;
use async_trait::async_trait;

/// Telemetry sink for HAL events. Delivery is best effort.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: HalEvent)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
