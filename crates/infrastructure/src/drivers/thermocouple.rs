use std::sync::Arc;

use async_trait::async_trait;
use domain::bus::{RegisterBus, RegisterClass, RetryPolicy};
use domain::device::{DeviceKind, FieldDevice};
use tracing::warn;

use super::read_single;

/// Thermocouple input module (DAM-3130 family).
///
/// Channels count from 1; channel `n` is input register offset `n - 1`.
pub struct ThermocoupleInput {
    name: String,
    bus: Arc<dyn RegisterBus>,
    unit: u8,
    retry: RetryPolicy,
}

impl ThermocoupleInput {
    pub fn new(name: impl Into<String>, bus: Arc<dyn RegisterBus>, unit: u8) -> Self {
        Self {
            name: name.into(),
            bus,
            unit,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl FieldDevice for ThermocoupleInput {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::ThermocoupleInput
    }

    fn unit(&self) -> u8 {
        self.unit
    }

    async fn read_channel(&self, channel: i32) -> Option<u16> {
        if channel <= 0 {
            warn!(device = %self.name, channel, "Thermocouple channels start from 1");
            return None;
        }
        read_single(
            &self.bus,
            self.retry,
            &self.name,
            RegisterClass::Input,
            self.unit,
            (channel - 1) as u32,
        )
        .await
    }
}
