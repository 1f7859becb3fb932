mod capabilities;
mod field_device;
mod kind;

pub use capabilities::Capabilities;
pub use field_device::FieldDevice;
pub use kind::DeviceKind;
