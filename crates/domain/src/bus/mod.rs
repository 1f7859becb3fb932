mod client;
mod connection_state;
mod register_bus;
mod register_class;
mod retry_policy;
mod spec;

pub use client::{ClientFactory, ProtocolClient, UnitAddressing, UnitArgument, UnitParameter};
pub use connection_state::ConnectionState;
pub use register_bus::RegisterBus;
pub use register_class::RegisterClass;
pub use retry_policy::RetryPolicy;
pub use spec::{BusSpec, Parity};
