use std::sync::Arc;

use async_trait::async_trait;
use domain::addressing::holding_offset;
use domain::bus::{RegisterBus, RegisterClass, RetryPolicy};
use domain::device::{DeviceKind, FieldDevice};
use tracing::warn;

use super::read_single;

/// Documented address of channel 0
pub const CH0_ADDRESS: u32 = 40001;

/// Channel count of the stock 32-channel module
pub const DEFAULT_CHANNELS: u16 = 32;

/// Multi-channel analog input module (DAM-3151 family).
///
/// Channel `n` is holding register `40001 + n`, an unsigned 16-bit count over
/// the configured input range. Values are returned raw; engineering units
/// come from the tag's linear scale.
pub struct AnalogInput {
    name: String,
    bus: Arc<dyn RegisterBus>,
    unit: u8,
    channels: u16,
    retry: RetryPolicy,
}

impl AnalogInput {
    pub fn new(name: impl Into<String>, bus: Arc<dyn RegisterBus>, unit: u8) -> Self {
        Self {
            name: name.into(),
            bus,
            unit,
            channels: DEFAULT_CHANNELS,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl FieldDevice for AnalogInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::AnalogInput
    }

    fn unit(&self) -> u8 {
        self.unit
    }

    async fn read_channel(&self, channel: i32) -> Option<u16> {
        if channel < 0 || channel >= i32::from(self.channels) {
            warn!(
                device = %self.name,
                channel,
                channels = self.channels,
                "Channel out of range for analog input"
            );
            return None;
        }
        let address = holding_offset(CH0_ADDRESS) + channel as u32;
        read_single(
            &self.bus,
            self.retry,
            &self.name,
            RegisterClass::Holding,
            self.unit,
            address,
        )
        .await
    }
}
