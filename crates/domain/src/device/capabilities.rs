/// What a field device can do, checked instead of inspecting its type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub readable: bool,
    pub writable_percent: bool,
    pub writable_voltage: bool,
}

impl Capabilities {
    pub const NONE: Self = Self {
        readable: false,
        writable_percent: false,
        writable_voltage: false,
    };

    pub const READABLE: Self = Self {
        readable: true,
        ..Self::NONE
    };

    /// Voltage output; percent commands are mapped onto the voltage range.
    pub const VOLTAGE_OUTPUT: Self = Self {
        writable_voltage: true,
        ..Self::NONE
    };

    pub const PERCENT_OUTPUT: Self = Self {
        writable_percent: true,
        ..Self::NONE
    };

    pub fn is_writable(&self) -> bool {
        self.writable_percent || self.writable_voltage
    }
}
