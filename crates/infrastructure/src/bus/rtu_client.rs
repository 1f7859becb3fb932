use std::fmt::Display;

use async_trait::async_trait;
use domain::DomainError;
use domain::bus::{
    BusSpec, ClientFactory, Parity, ProtocolClient, RegisterClass, UnitArgument, UnitParameter,
};
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tokio_serial::SerialStream;

/// Modbus RTU client over a local serial port
pub struct RtuClient {
    bus: String,
    spec: BusSpec,
    context: Option<Context>,
}

impl RtuClient {
    pub fn new(bus: impl Into<String>, spec: BusSpec) -> Self {
        Self {
            bus: bus.into(),
            spec,
            context: None,
        }
    }

    fn port_name(&self) -> String {
        // Windows needs the device namespace prefix for COM10 and up
        if cfg!(target_os = "windows") && !self.spec.port.starts_with(r"\\.\") {
            format!(r"\\.\{}", self.spec.port)
        } else {
            self.spec.port.clone()
        }
    }

    fn context(&mut self, unit: UnitArgument) -> Result<&mut Context, DomainError> {
        let ctx = self.context.as_mut().ok_or(DomainError::NotConnected)?;
        // tokio-modbus takes the unit as the per-request slave, whatever the calling convention
        ctx.set_slave(Slave(unit.unit()));
        Ok(ctx)
    }
}

fn to_parity(parity: Parity) -> tokio_serial::Parity {
    match parity {
        Parity::None => tokio_serial::Parity::None,
        Parity::Even => tokio_serial::Parity::Even,
        Parity::Odd => tokio_serial::Parity::Odd,
    }
}

fn to_stop_bits(stop_bits: u8) -> Result<tokio_serial::StopBits, DomainError> {
    match stop_bits {
        1 => Ok(tokio_serial::StopBits::One),
        2 => Ok(tokio_serial::StopBits::Two),
        _ => Err(DomainError::InvalidConfiguration(format!(
            "Invalid stop bits: {}",
            stop_bits
        ))),
    }
}

fn to_data_bits(byte_size: u8) -> Result<tokio_serial::DataBits, DomainError> {
    match byte_size {
        5 => Ok(tokio_serial::DataBits::Five),
        6 => Ok(tokio_serial::DataBits::Six),
        7 => Ok(tokio_serial::DataBits::Seven),
        8 => Ok(tokio_serial::DataBits::Eight),
        _ => Err(DomainError::InvalidConfiguration(format!(
            "Invalid data bits: {}",
            byte_size
        ))),
    }
}

/// Split the transport / exception layers of a tokio-modbus reply
fn flatten<T, X: Display, E: Display>(reply: Result<Result<T, X>, E>) -> Result<T, DomainError> {
    match reply {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(exception)) => Err(DomainError::Protocol(exception.to_string())),
        Err(e) => Err(DomainError::Transport(e.to_string())),
    }
}

#[async_trait]
impl ProtocolClient for RtuClient {
    async fn connect(&mut self) -> Result<(), DomainError> {
        let port_name = self.port_name();
        tracing::debug!(
            bus = %self.bus,
            port = %port_name,
            baud = self.spec.baud,
            parity = %self.spec.parity,
            "Opening serial port"
        );

        let builder = tokio_serial::new(&port_name, self.spec.baud)
            .data_bits(to_data_bits(self.spec.byte_size)?)
            .parity(to_parity(self.spec.parity))
            .stop_bits(to_stop_bits(self.spec.stop_bits)?)
            .timeout(self.spec.timeout());

        let port = SerialStream::open(&builder).map_err(|e| {
            DomainError::Transport(format!("Failed to open serial port {}: {}", port_name, e))
        })?;

        self.context = Some(tokio_modbus::client::rtu::attach_slave(
            port,
            Slave::broadcast(),
        ));
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DomainError> {
        // Dropping the context releases the port
        self.context = None;
        Ok(())
    }

    fn unit_parameters(&self) -> Vec<UnitParameter> {
        vec![UnitParameter::Slave]
    }

    async fn read_registers(
        &mut self,
        class: RegisterClass,
        address: u16,
        count: u16,
        unit: UnitArgument,
    ) -> Result<Vec<u16>, DomainError> {
        let ctx = self.context(unit)?;
        let reply = match class {
            RegisterClass::Input => ctx.read_input_registers(address, count).await,
            RegisterClass::Holding => ctx.read_holding_registers(address, count).await,
        };
        flatten(reply)
    }

    async fn write_register(
        &mut self,
        address: u16,
        value: u16,
        unit: UnitArgument,
    ) -> Result<(), DomainError> {
        let ctx = self.context(unit)?;
        flatten(ctx.write_single_register(address, value).await)
    }
}

/// Builds an [`RtuClient`] per configured bus
#[derive(Debug, Clone, Copy, Default)]
pub struct RtuClientFactory;

impl ClientFactory for RtuClientFactory {
    fn create(&self, bus_name: &str, spec: &BusSpec) -> Box<dyn ProtocolClient> {
        Box::new(RtuClient::new(bus_name, spec.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_parameter_mapping() {
        assert_eq!(to_parity(Parity::Even), tokio_serial::Parity::Even);
        assert_eq!(to_stop_bits(2).unwrap(), tokio_serial::StopBits::Two);
        assert_eq!(to_data_bits(7).unwrap(), tokio_serial::DataBits::Seven);
        assert!(to_stop_bits(0).is_err());
        assert!(to_data_bits(9).is_err());
    }

    #[test]
    fn test_flatten_layers() {
        let ok: Result<Result<u16, String>, String> = Ok(Ok(5));
        assert_eq!(flatten(ok).unwrap(), 5);

        let exception: Result<Result<u16, String>, String> = Ok(Err("Illegal data address".into()));
        assert!(matches!(flatten(exception), Err(DomainError::Protocol(_))));

        let transport: Result<Result<u16, String>, String> = Err("broken pipe".into());
        assert!(matches!(flatten(transport), Err(DomainError::Transport(_))));
    }

    #[tokio::test]
    async fn test_transactions_before_connect_fail() {
        let mut client = RtuClient::new("daq", BusSpec::new("/dev/null-port"));
        let result = client
            .read_registers(RegisterClass::Holding, 0, 1, UnitArgument::Positional(1))
            .await;
        assert_eq!(result, Err(DomainError::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_to_missing_port_fails() {
        let mut client = RtuClient::new("daq", BusSpec::new("/dev/does-not-exist-hal"));
        assert!(matches!(
            client.connect().await,
            Err(DomainError::Transport(_))
        ));
    }
}
