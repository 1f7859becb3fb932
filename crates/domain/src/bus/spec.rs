use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Serial line parity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Even => "E",
            Self::Odd => "O",
        }
    }
}

impl FromStr for Parity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "n" | "none" => Ok(Self::None),
            "e" | "even" => Ok(Self::Even),
            "o" | "odd" => Ok(Self::Odd),
            _ => Err(DomainError::InvalidConfiguration(format!(
                "Invalid parity: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Parity {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Parity> for String {
    fn from(parity: Parity) -> Self {
        parity.as_str().to_string()
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical parameters of one half-duplex serial line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSpec {
    pub port: String,
    #[serde(default = "default_baud", alias = "baudrate")]
    pub baud: u32,
    #[serde(default = "default_parity")]
    pub parity: Parity,
    #[serde(default = "default_stop_bits", alias = "stopbits")]
    pub stop_bits: u8,
    #[serde(default = "default_byte_size", alias = "bytesize")]
    pub byte_size: u8,
    #[serde(default = "default_timeout_ms", alias = "timeout")]
    pub timeout_ms: u64,
}

fn default_baud() -> u32 {
    9600
}
fn default_parity() -> Parity {
    Parity::None
}
fn default_stop_bits() -> u8 {
    1
}
fn default_byte_size() -> u8 {
    8
}
fn default_timeout_ms() -> u64 {
    200
}

impl BusSpec {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: default_baud(),
            parity: default_parity(),
            stop_bits: default_stop_bits(),
            byte_size: default_byte_size(),
            timeout_ms: default_timeout_ms(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.port.trim().is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "Serial port must not be empty".into(),
            ));
        }
        if !matches!(self.stop_bits, 1 | 2) {
            return Err(DomainError::InvalidConfiguration(format!(
                "Invalid stop bits: {}",
                self.stop_bits
            )));
        }
        if !(5..=8).contains(&self.byte_size) {
            return Err(DomainError::InvalidConfiguration(format!(
                "Invalid byte size: {}",
                self.byte_size
            )));
        }
        if self.baud == 0 {
            return Err(DomainError::InvalidConfiguration(
                "Baud rate must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = BusSpec::new("/dev/ttyUSB0");
        assert_eq!(spec.baud, 9600);
        assert_eq!(spec.parity, Parity::None);
        assert_eq!(spec.stop_bits, 1);
        assert_eq!(spec.byte_size, 8);
        assert_eq!(spec.timeout_ms, 200);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_parity_parsing_is_lenient() {
        assert_eq!("N".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!("even".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!(" Odd ".parse::<Parity>().unwrap(), Parity::Odd);
        assert!("M".parse::<Parity>().is_err());
    }

    #[test]
    fn test_deserialize_with_legacy_names() {
        let spec: BusSpec = serde_json::from_value(serde_json::json!({
            "port": "COM3",
            "baudrate": 19200,
            "parity": "E",
            "stopbits": 2,
            "bytesize": 7,
            "timeout": 500
        }))
        .unwrap();
        assert_eq!(spec.baud, 19200);
        assert_eq!(spec.parity, Parity::Even);
        assert_eq!(spec.stop_bits, 2);
        assert_eq!(spec.byte_size, 7);
        assert_eq!(spec.timeout_ms, 500);
    }

    #[test]
    fn test_invalid_framing_rejected() {
        let mut spec = BusSpec::new("COM1");
        spec.stop_bits = 3;
        assert!(spec.validate().is_err());

        let mut spec = BusSpec::new("COM1");
        spec.byte_size = 9;
        assert!(spec.validate().is_err());

        assert!(BusSpec::new("  ").validate().is_err());
    }
}
