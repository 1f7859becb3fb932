use async_trait::async_trait;

use super::{BusSpec, RegisterClass};
use crate::error::DomainError;

/// Names under which a protocol client may accept the unit address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitParameter {
    Slave,
    Unit,
    DeviceId,
}

impl UnitParameter {
    /// Fixed negotiation order.
    pub const PREFERENCE: [UnitParameter; 3] = [Self::Slave, Self::Unit, Self::DeviceId];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slave => "slave",
            Self::Unit => "unit",
            Self::DeviceId => "device_id",
        }
    }
}

/// How a bus passes the unit address to its client, settled once at connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitAddressing {
    Named(UnitParameter),
    Positional,
}

impl UnitAddressing {
    /// Pick the first preferred parameter name the client accepts,
    /// falling back to positional calling.
    pub fn negotiate(accepted: &[UnitParameter]) -> Self {
        UnitParameter::PREFERENCE
            .iter()
            .find(|p| accepted.contains(p))
            .map(|p| Self::Named(*p))
            .unwrap_or(Self::Positional)
    }

    pub fn argument(&self, unit: u8) -> UnitArgument {
        match self {
            Self::Named(param) => UnitArgument::Named(*param, unit),
            Self::Positional => UnitArgument::Positional(unit),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Named(param) => param.as_str(),
            Self::Positional => "positional",
        }
    }
}

/// Unit address as handed to a client call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitArgument {
    Named(UnitParameter, u8),
    Positional(u8),
}

impl UnitArgument {
    pub fn unit(&self) -> u8 {
        match self {
            Self::Named(_, unit) | Self::Positional(unit) => *unit,
        }
    }
}

/// Register-protocol client for one serial line.
///
/// Implementations own the wire framing. A client that cannot take the
/// unit address under the requested name answers
/// `DomainError::UnsupportedArgument`.
#[async_trait]
pub trait ProtocolClient: Send {
    /// Open the underlying port
    async fn connect(&mut self) -> Result<(), DomainError>;

    /// Release the underlying port
    async fn close(&mut self) -> Result<(), DomainError>;

    /// Unit-address parameter names this client accepts by name
    fn unit_parameters(&self) -> Vec<UnitParameter>;

    /// Read `count` contiguous registers of `class` starting at `address`
    async fn read_registers(
        &mut self,
        class: RegisterClass,
        address: u16,
        count: u16,
        unit: UnitArgument,
    ) -> Result<Vec<u16>, DomainError>;

    /// Write a single holding register
    async fn write_register(
        &mut self,
        address: u16,
        value: u16,
        unit: UnitArgument,
    ) -> Result<(), DomainError>;
}

/// Builds the protocol client for a configured bus
pub trait ClientFactory: Send + Sync {
    fn create(&self, bus_name: &str, spec: &BusSpec) -> Box<dyn ProtocolClient>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_follows_preference() {
        assert_eq!(
            UnitAddressing::negotiate(&[UnitParameter::DeviceId, UnitParameter::Slave]),
            UnitAddressing::Named(UnitParameter::Slave)
        );
        assert_eq!(
            UnitAddressing::negotiate(&[UnitParameter::DeviceId, UnitParameter::Unit]),
            UnitAddressing::Named(UnitParameter::Unit)
        );
        assert_eq!(
            UnitAddressing::negotiate(&[UnitParameter::DeviceId]),
            UnitAddressing::Named(UnitParameter::DeviceId)
        );
    }

    #[test]
    fn test_negotiation_falls_back_to_positional() {
        assert_eq!(UnitAddressing::negotiate(&[]), UnitAddressing::Positional);
    }

    #[test]
    fn test_argument_carries_unit() {
        let arg = UnitAddressing::Named(UnitParameter::Unit).argument(7);
        assert_eq!(arg, UnitArgument::Named(UnitParameter::Unit, 7));
        assert_eq!(arg.unit(), 7);
        assert_eq!(UnitAddressing::Positional.argument(3).unit(), 3);
    }
}
