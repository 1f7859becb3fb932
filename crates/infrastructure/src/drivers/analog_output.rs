use std::sync::Arc;

use async_trait::async_trait;
use domain::bus::RegisterBus;
use domain::device::{DeviceKind, FieldDevice};
use tracing::warn;

/// Holding register of output channel 1; channel `n` is `CH1_ADDRESS + n - 1`
pub const CH1_ADDRESS: u16 = 0x000A;

pub const MAX_VOLTS: f64 = 10.0;

/// 0-10 V analog output module with a fixed-point register per channel
pub struct AnalogOutput {
    name: String,
    bus: Arc<dyn RegisterBus>,
    unit: u8,
}

impl AnalogOutput {
    pub fn new(name: impl Into<String>, bus: Arc<dyn RegisterBus>, unit: u8) -> Self {
        Self {
            name: name.into(),
            bus,
            unit,
        }
    }

    fn channel_address(&self, channel: i32) -> Option<u16> {
        if channel <= 0 {
            warn!(device = %self.name, channel, "Output channels start from 1");
            return None;
        }
        let address = u16::try_from(channel - 1)
            .ok()
            .and_then(|n| CH1_ADDRESS.checked_add(n));
        if address.is_none() {
            warn!(device = %self.name, channel, "Output channel beyond register space");
        }
        address
    }
}

#[async_trait]
impl FieldDevice for AnalogOutput {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::AnalogOutput
    }

    fn unit(&self) -> u8 {
        self.unit
    }

    async fn write_voltage(&self, channel: i32, volts: f64, reg_scale: u32) -> bool {
        if volts.is_nan() {
            warn!(device = %self.name, channel, "Refusing NaN voltage");
            return false;
        }
        let Some(address) = self.channel_address(channel) else {
            return false;
        };

        let volts = volts.clamp(0.0, MAX_VOLTS);
        let raw = (volts * f64::from(reg_scale)).round();
        if raw > f64::from(u16::MAX) {
            warn!(
                device = %self.name,
                channel,
                volts,
                reg_scale,
                "Encoded voltage exceeds register range"
            );
            return false;
        }
        self.bus.write_register(self.unit, address, raw as u16).await
    }

    async fn write_percent_as_voltage(&self, channel: i32, percent: f64, reg_scale: u32) -> bool {
        if percent.is_nan() {
            warn!(device = %self.name, channel, "Refusing NaN percent");
            return false;
        }
        let volts = MAX_VOLTS * percent.clamp(0.0, 100.0) / 100.0;
        self.write_voltage(channel, volts, reg_scale).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::mock::MockBus;
    use mockall::predicate::eq;

    fn expect_write(bus: &mut MockBus, address: u16, value: u16) {
        bus.expect_write_register()
            .with(eq(3), eq(address), eq(value))
            .times(1)
            .returning(|_, _, _| true);
    }

    #[tokio::test]
    async fn test_percent_maps_onto_voltage_register() {
        let mut bus = MockBus::new();
        expect_write(&mut bus, 0x000A, 7500);

        let ao = AnalogOutput::new("AO1", Arc::new(bus), 3);
        assert!(ao.write_percent_as_voltage(1, 75.0, 1000).await);
    }

    #[tokio::test]
    async fn test_channel_offsets_from_base() {
        let mut bus = MockBus::new();
        expect_write(&mut bus, 0x000A + 3, 2500);

        let ao = AnalogOutput::new("AO1", Arc::new(bus), 3);
        assert!(ao.write_voltage(4, 2.5, 1000).await);
    }

    #[tokio::test]
    async fn test_voltage_is_clamped() {
        let mut bus = MockBus::new();
        expect_write(&mut bus, 0x000A, 10000);
        expect_write(&mut bus, 0x000B, 0);

        let ao = AnalogOutput::new("AO1", Arc::new(bus), 3);
        assert!(ao.write_voltage(1, 12.7, 1000).await);
        assert!(ao.write_voltage(2, -1.0, 1000).await);
    }

    #[tokio::test]
    async fn test_percent_is_clamped() {
        let mut bus = MockBus::new();
        expect_write(&mut bus, 0x000A, 10000);

        let ao = AnalogOutput::new("AO1", Arc::new(bus), 3);
        assert!(ao.write_percent_as_voltage(1, 140.0, 1000).await);
    }

    #[tokio::test]
    async fn test_rounds_to_nearest_count() {
        let mut bus = MockBus::new();
        expect_write(&mut bus, 0x000A, 1235);

        let ao = AnalogOutput::new("AO1", Arc::new(bus), 3);
        assert!(ao.write_voltage(1, 1.2346, 1000).await);
    }

    #[tokio::test]
    async fn test_invalid_channel_rejected_without_bus_traffic() {
        let ao = AnalogOutput::new("AO1", Arc::new(MockBus::new()), 3);
        assert!(!ao.write_voltage(0, 5.0, 1000).await);
        assert!(!ao.write_percent_as_voltage(-2, 50.0, 1000).await);
    }

    #[tokio::test]
    async fn test_register_overflow_rejected() {
        let ao = AnalogOutput::new("AO1", Arc::new(MockBus::new()), 3);
        assert!(!ao.write_voltage(1, 10.0, 10_000).await);
    }

    #[tokio::test]
    async fn test_bus_rejection_propagates_as_false() {
        let mut bus = MockBus::new();
        bus.expect_write_register().returning(|_, _, _| false);

        let ao = AnalogOutput::new("AO1", Arc::new(bus), 3);
        assert!(!ao.write_voltage(1, 5.0, 1000).await);
    }

    #[tokio::test]
    async fn test_not_readable() {
        let ao = AnalogOutput::new("AO1", Arc::new(MockBus::new()), 3);
        assert!(!ao.capabilities().readable);
        assert!(ao.capabilities().writable_voltage);
        assert_eq!(ao.read_channel(1).await, None);
    }
}
