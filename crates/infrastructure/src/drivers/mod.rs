mod analog_input;
mod analog_output;
mod command_register;
mod thermocouple;

pub use analog_input::AnalogInput;
pub use analog_output::AnalogOutput;
pub use command_register::CommandRegisterDevice;
pub use thermocouple::ThermocoupleInput;

use std::collections::HashMap;
use std::sync::Arc;

use domain::DomainError;
use domain::bus::{RegisterBus, RegisterClass, RetryPolicy};
use domain::device::{DeviceKind, FieldDevice};

use crate::bus::ModbusBus;
use crate::bus::retry::try_until_some;
use crate::config::DeviceConfig;

/// Factory for field-device drivers
pub struct DeviceFactory;

impl DeviceFactory {
    /// Build the driver for one configured device on `bus`
    pub fn create(
        config: &DeviceConfig,
        bus: Arc<dyn RegisterBus>,
    ) -> Result<Arc<dyn FieldDevice>, DomainError> {
        let device: Arc<dyn FieldDevice> = match config.kind()? {
            DeviceKind::AnalogInput => {
                let mut ai = AnalogInput::new(&config.name, bus, config.addr)
                    .with_retry(config.retry_policy());
                if let Some(channels) = config.channels {
                    ai = ai.with_channels(channels);
                }
                Arc::new(ai)
            }
            DeviceKind::ThermocoupleInput => Arc::new(
                ThermocoupleInput::new(&config.name, bus, config.addr)
                    .with_retry(config.retry_policy()),
            ),
            DeviceKind::AnalogOutput => Arc::new(AnalogOutput::new(&config.name, bus, config.addr)),
            DeviceKind::PowerSupply => Arc::new(CommandRegisterDevice::power_supply(
                &config.name,
                bus,
                config.addr,
            )),
            DeviceKind::Pump => Arc::new(CommandRegisterDevice::pump(
                &config.name,
                bus,
                config.addr,
            )),
        };
        Ok(device)
    }

    /// Build every configured device, resolving each one's bus by name
    pub fn create_all(
        configs: &[DeviceConfig],
        buses: &HashMap<String, Arc<ModbusBus>>,
    ) -> Result<HashMap<String, Arc<dyn FieldDevice>>, DomainError> {
        configs
            .iter()
            .map(|config| -> Result<(String, Arc<dyn FieldDevice>), DomainError> {
                let bus = buses
                    .get(&config.bus)
                    .ok_or_else(|| DomainError::UnknownBus {
                        device: config.name.clone(),
                        bus: config.bus.clone(),
                    })?;
                let device = Self::create(config, bus.clone() as Arc<dyn RegisterBus>)?;
                Ok((config.name.clone(), device))
            })
            .collect()
    }
}

/// Read one register, honouring the device's retry policy
async fn read_single(
    bus: &Arc<dyn RegisterBus>,
    retry: RetryPolicy,
    device: &str,
    class: RegisterClass,
    unit: u8,
    address: u32,
) -> Option<u16> {
    let Ok(address) = u16::try_from(address) else {
        tracing::warn!(device, address, "Register address beyond 16-bit space");
        return None;
    };
    let registers = try_until_some(retry, device, move || {
        bus.read_registers(class, unit, address, 1)
    })
    .await?;
    registers.first().copied()
}
