mod modbus_bus;
pub mod retry;
mod rtu_client;
mod simulated_client;

pub use modbus_bus::ModbusBus;
pub use rtu_client::{RtuClient, RtuClientFactory};
pub use simulated_client::{RecordedWrite, SimulatedClient, SimulatedPlant};
