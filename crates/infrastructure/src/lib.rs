//! Infrastructure layer - Serial buses, device drivers, configuration, telemetry

pub mod bus;
pub mod config;
pub mod drivers;
pub mod messaging;

pub use bus::{ModbusBus, RtuClientFactory, SimulatedPlant};
pub use config::{HalSettings, PlantConfig};
pub use drivers::DeviceFactory;
pub use messaging::{ChannelEventPublisher, CompositeEventPublisher, TracingEventPublisher};
