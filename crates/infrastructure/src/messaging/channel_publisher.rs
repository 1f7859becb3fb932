use async_trait::async_trait;
use domain::HalEvent;
use domain::event::EventPublisher;
use tokio::sync::mpsc;

/// Forwards events into an unbounded channel for an in-process consumer
#[derive(Clone)]
pub struct ChannelEventPublisher {
    tx: mpsc::UnboundedSender<HalEvent>,
}

impl ChannelEventPublisher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HalEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventPublisher for ChannelEventPublisher {
    async fn publish(
        &self,
        event: HalEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.tx
            .send(event)
            .map_err(|_| "Event receiver dropped".into())
    }
}
