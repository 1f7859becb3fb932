use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Capabilities;
use crate::error::DomainError;

/// Type of field device on a serial bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Multi-channel analog input module (raw register per channel)
    AnalogInput,
    /// Thermocouple input module, channels numbered from 1
    ThermocoupleInput,
    /// 0-10 V analog output module
    AnalogOutput,
    /// Programmable power supply, percent command
    PowerSupply,
    /// Variable-speed pump, percent command
    Pump,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalogInput => "AI",
            Self::ThermocoupleInput => "TDA",
            Self::AnalogOutput => "AO",
            Self::PowerSupply => "PPS",
            Self::Pump => "PUMP",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::AnalogInput | Self::ThermocoupleInput => Capabilities::READABLE,
            Self::AnalogOutput => Capabilities::VOLTAGE_OUTPUT,
            Self::PowerSupply | Self::Pump => Capabilities::PERCENT_OUTPUT,
        }
    }
}

impl FromStr for DeviceKind {
    type Err = DomainError;

    /// Case-insensitive; accepts the short catalogue codes and spelled-out names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "AI" | "ANALOG_INPUT" => Ok(Self::AnalogInput),
            "TDA" | "TC" | "THERMOCOUPLE" | "THERMOCOUPLE_INPUT" => Ok(Self::ThermocoupleInput),
            "AO" | "ANALOG_OUTPUT" => Ok(Self::AnalogOutput),
            "PPS" | "POWER_SUPPLY" => Ok(Self::PowerSupply),
            "PUMP" => Ok(Self::Pump),
            _ => Err(DomainError::UnknownDeviceType(s.to_string())),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ai".parse::<DeviceKind>().unwrap(), DeviceKind::AnalogInput);
        assert_eq!("Tda".parse::<DeviceKind>().unwrap(), DeviceKind::ThermocoupleInput);
        assert_eq!("AO".parse::<DeviceKind>().unwrap(), DeviceKind::AnalogOutput);
        assert_eq!("pps".parse::<DeviceKind>().unwrap(), DeviceKind::PowerSupply);
        assert_eq!("Pump".parse::<DeviceKind>().unwrap(), DeviceKind::Pump);
    }

    #[test]
    fn test_parse_spelled_out_names() {
        assert_eq!(
            "analog-input".parse::<DeviceKind>().unwrap(),
            DeviceKind::AnalogInput
        );
        assert_eq!(
            "Power Supply".parse::<DeviceKind>().unwrap(),
            DeviceKind::PowerSupply
        );
    }

    #[test]
    fn test_unknown_type_is_error() {
        let err = "VFD".parse::<DeviceKind>().unwrap_err();
        assert_eq!(err, DomainError::UnknownDeviceType("VFD".into()));
    }

    #[test]
    fn test_round_trip_through_short_code() {
        for kind in [
            DeviceKind::AnalogInput,
            DeviceKind::ThermocoupleInput,
            DeviceKind::AnalogOutput,
            DeviceKind::PowerSupply,
            DeviceKind::Pump,
        ] {
            assert_eq!(kind.as_str().parse::<DeviceKind>().unwrap(), kind);
        }
    }
}
