use serde::{Deserialize, Serialize};

use crate::addressing::{HOLDING_BASE, INPUT_BASE};

/// Addressable register space exposed by a field device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterClass {
    /// Read-only input registers (3x)
    Input,
    /// Read/write holding registers (4x)
    Holding,
}

impl RegisterClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Holding => "holding",
        }
    }

    /// Documented address of the first register in this class.
    pub fn base(&self) -> u32 {
        match self {
            Self::Input => INPUT_BASE,
            Self::Holding => HOLDING_BASE,
        }
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::Holding)
    }
}
