use std::sync::Arc;

use async_trait::async_trait;
use domain::bus::RegisterBus;
use domain::device::{DeviceKind, FieldDevice};
use tracing::warn;

/// Holding register carrying the percent command
pub const CMD_ADDRESS: u16 = 0x0001;

/// Device driven by a single percent command register: programmable power
/// supplies and variable-speed pumps.
pub struct CommandRegisterDevice {
    name: String,
    kind: DeviceKind,
    bus: Arc<dyn RegisterBus>,
    unit: u8,
}

impl CommandRegisterDevice {
    pub fn power_supply(name: impl Into<String>, bus: Arc<dyn RegisterBus>, unit: u8) -> Self {
        Self::new(name, DeviceKind::PowerSupply, bus, unit)
    }

    pub fn pump(name: impl Into<String>, bus: Arc<dyn RegisterBus>, unit: u8) -> Self {
        Self::new(name, DeviceKind::Pump, bus, unit)
    }

    fn new(name: impl Into<String>, kind: DeviceKind, bus: Arc<dyn RegisterBus>, unit: u8) -> Self {
        Self {
            name: name.into(),
            kind,
            bus,
            unit,
        }
    }
}

#[async_trait]
impl FieldDevice for CommandRegisterDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn unit(&self) -> u8 {
        self.unit
    }

    async fn write_percent(&self, percent: f64) -> bool {
        if percent.is_nan() {
            warn!(device = %self.name, "Refusing NaN percent");
            return false;
        }
        let value = percent.clamp(0.0, 100.0).round() as u16;
        self.bus.write_register(self.unit, CMD_ADDRESS, value).await
    }
}
