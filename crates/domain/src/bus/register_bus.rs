use async_trait::async_trait;

use super::RegisterClass;

/// Register primitives a device driver needs from its bus.
///
/// Neither call fails loudly: an unavailable read is `None`, a rejected
/// write is `false`.
#[async_trait]
pub trait RegisterBus: Send + Sync {
    async fn read_registers(
        &self,
        class: RegisterClass,
        unit: u8,
        address: u16,
        count: u16,
    ) -> Option<Vec<u16>>;

    async fn write_register(&self, unit: u8, address: u16, value: u16) -> bool;
}
