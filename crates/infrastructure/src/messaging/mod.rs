pub mod channel_publisher;
pub mod composite_publisher;
pub mod tracing_publisher;

pub use channel_publisher::ChannelEventPublisher;
pub use composite_publisher::CompositeEventPublisher;
pub use tracing_publisher::TracingEventPublisher;
