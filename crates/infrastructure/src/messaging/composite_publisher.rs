use async_trait::async_trait;
use domain::HalEvent;
use domain::event::EventPublisher;
use std::sync::Arc;

/// Fans every event out to several sinks
pub struct CompositeEventPublisher {
    publishers: Vec<Arc<dyn EventPublisher>>,
}

impl CompositeEventPublisher {
    pub fn new(publishers: Vec<Arc<dyn EventPublisher>>) -> Self {
        Self { publishers }
    }
}

#[async_trait]
impl EventPublisher for CompositeEventPublisher {
    async fn publish(
        &self,
        event: HalEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        for publisher in &self.publishers {
            // A failing sink does not starve the others
            if let Err(e) = publisher.publish(event.clone()).await {
                tracing::error!("Failed to publish event to one of the publishers: {}", e);
            }
        }
        Ok(())
    }
}
