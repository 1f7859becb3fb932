use async_trait::async_trait;

use super::{Capabilities, DeviceKind};

/// A field device attached to a bus at a unit address.
///
/// Every operation absorbs its own failures: reads yield `None`, writes
/// yield `false`. Operations a device does not support keep the default
/// bodies, so callers check [`Capabilities`] first.
#[async_trait]
pub trait FieldDevice: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> DeviceKind;

    fn unit(&self) -> u8;

    fn capabilities(&self) -> Capabilities {
        self.kind().capabilities()
    }

    /// Raw register value of one input channel
    async fn read_channel(&self, _channel: i32) -> Option<u16> {
        None
    }

    /// Drive an output channel to `volts`, encoded as `round(volts * reg_scale)`
    async fn write_voltage(&self, _channel: i32, _volts: f64, _reg_scale: u32) -> bool {
        false
    }

    /// Map 0-100 % onto the voltage range of an output channel
    async fn write_percent_as_voltage(
        &self,
        _channel: i32,
        _percent: f64,
        _reg_scale: u32,
    ) -> bool {
        false
    }

    /// Single percent command register
    async fn write_percent(&self, _percent: f64) -> bool {
        false
    }
}
