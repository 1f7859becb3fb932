use std::time::Duration;

use async_trait::async_trait;
use domain::DomainError;
use domain::bus::{
    BusSpec, ClientFactory, ConnectionState, ProtocolClient, RegisterBus, RegisterClass,
    UnitAddressing, UnitArgument,
};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Upper bound on how long `close()` may wait for an in-flight transaction
pub const CLOSE_GRACE: Duration = Duration::from_millis(250);

/// One physical half-duplex serial line.
///
/// The protocol client sits behind an async mutex that every register
/// transaction holds for its full duration, so transactions issued by
/// different tasks never interleave on the wire.
pub struct ModbusBus {
    name: String,
    spec: BusSpec,
    link: Mutex<BusLink>,
}

struct BusLink {
    client: Box<dyn ProtocolClient>,
    state: ConnectionState,
    addressing: UnitAddressing,
}

impl ModbusBus {
    pub fn new(name: impl Into<String>, spec: BusSpec, client: Box<dyn ProtocolClient>) -> Self {
        Self {
            name: name.into(),
            spec,
            link: Mutex::new(BusLink {
                client,
                state: ConnectionState::Disconnected,
                addressing: UnitAddressing::Positional,
            }),
        }
    }

    pub fn from_factory(
        name: impl Into<String>,
        spec: BusSpec,
        factory: &dyn ClientFactory,
    ) -> Self {
        let name = name.into();
        let client = factory.create(&name, &spec);
        Self::new(name, spec, client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &BusSpec {
        &self.spec
    }

    pub async fn state(&self) -> ConnectionState {
        self.link.lock().await.state
    }

    /// Unit-address convention settled at the last successful open
    pub async fn addressing(&self) -> UnitAddressing {
        self.link.lock().await.addressing
    }

    /// Open the port and negotiate how the client takes unit addresses.
    /// Returns whether the bus is usable.
    pub async fn open(&self) -> bool {
        let mut link = self.link.lock().await;
        let Ok(connecting) = link.state.to_connecting() else {
            warn!(bus = %self.name, state = ?link.state, "Bus already open");
            return link.state.is_connected();
        };
        link.state = connecting;

        match link.client.connect().await {
            Ok(()) => {
                link.addressing = UnitAddressing::negotiate(&link.client.unit_parameters());
                link.state = link.state.to_connected().unwrap_or(ConnectionState::Connected);
                debug!(
                    bus = %self.name,
                    addressing = link.addressing.describe(),
                    "Negotiated unit addressing"
                );
                info!(bus = %self.name, port = %self.spec.port, "Bus opened");
                true
            }
            Err(e) => {
                link.state = link.state.to_failed();
                error!(bus = %self.name, port = %self.spec.port, error = %e, "Bus open failed");
                false
            }
        }
    }

    /// Release the port. Best effort: never waits longer than [`CLOSE_GRACE`].
    pub async fn close(&self) {
        let closing = async {
            let mut link = self.link.lock().await;
            if let Err(e) = link.client.close().await {
                debug!(bus = %self.name, error = %e, "Client close reported an error");
            }
            link.state = link.state.to_disconnected();
        };

        match timeout(CLOSE_GRACE, closing).await {
            Ok(()) => info!(bus = %self.name, "Bus closed"),
            Err(_) => warn!(bus = %self.name, "Bus did not close in time, abandoning"),
        }
    }

    /// Read `count` registers of `class` from `unit`. `None` when the bus is
    /// down, the transaction fails or times out, or the reply is short.
    pub async fn read(
        &self,
        class: RegisterClass,
        unit: u8,
        address: u16,
        count: u16,
    ) -> Option<Vec<u16>> {
        let mut link = self.link.lock().await;
        if !link.state.is_connected() {
            debug!(bus = %self.name, unit, address, "Read skipped, bus not connected");
            return None;
        }

        let result = timeout(
            self.spec.timeout(),
            link.read(&self.name, class, unit, address, count),
        )
        .await
        .unwrap_or(Err(DomainError::Timeout(self.spec.timeout_ms)));

        match result {
            Ok(registers) if registers.len() >= count as usize => Some(registers),
            Ok(registers) => {
                warn!(
                    bus = %self.name,
                    unit,
                    address,
                    expected = count,
                    received = registers.len(),
                    "Short register reply"
                );
                None
            }
            Err(e) => {
                warn!(
                    bus = %self.name,
                    unit,
                    address,
                    class = class.as_str(),
                    error = %e,
                    "Register read failed"
                );
                None
            }
        }
    }

    /// Write one holding register. `false` on any failure.
    pub async fn write(&self, unit: u8, address: u16, value: u16) -> bool {
        let mut link = self.link.lock().await;
        if !link.state.is_connected() {
            debug!(bus = %self.name, unit, address, "Write skipped, bus not connected");
            return false;
        }

        let result = timeout(
            self.spec.timeout(),
            link.write(&self.name, unit, address, value),
        )
        .await
        .unwrap_or(Err(DomainError::Timeout(self.spec.timeout_ms)));

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(bus = %self.name, unit, address, value, error = %e, "Register write failed");
                false
            }
        }
    }
}

impl BusLink {
    async fn read(
        &mut self,
        bus: &str,
        class: RegisterClass,
        unit: u8,
        address: u16,
        count: u16,
    ) -> Result<Vec<u16>, DomainError> {
        let argument = self.addressing.argument(unit);
        match self.client.read_registers(class, address, count, argument).await {
            Err(DomainError::UnsupportedArgument(name)) if is_named(argument) => {
                self.pin_positional(bus, &name);
                self.client
                    .read_registers(class, address, count, UnitArgument::Positional(unit))
                    .await
            }
            other => other,
        }
    }

    async fn write(
        &mut self,
        bus: &str,
        unit: u8,
        address: u16,
        value: u16,
    ) -> Result<(), DomainError> {
        let argument = self.addressing.argument(unit);
        match self.client.write_register(address, value, argument).await {
            Err(DomainError::UnsupportedArgument(name)) if is_named(argument) => {
                self.pin_positional(bus, &name);
                self.client
                    .write_register(address, value, UnitArgument::Positional(unit))
                    .await
            }
            other => other,
        }
    }

    fn pin_positional(&mut self, bus: &str, rejected: &str) {
        warn!(bus, rejected, "Client rejected named unit argument, using positional");
        self.addressing = UnitAddressing::Positional;
    }
}

fn is_named(argument: UnitArgument) -> bool {
    matches!(argument, UnitArgument::Named(..))
}

#[async_trait]
impl RegisterBus for ModbusBus {
    async fn read_registers(
        &self,
        class: RegisterClass,
        unit: u8,
        address: u16,
        count: u16,
    ) -> Option<Vec<u16>> {
        self.read(class, unit, address, count).await
    }

    async fn write_register(&self, unit: u8, address: u16, value: u16) -> bool {
        self.write(unit, address, value).await
    }
}
