use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use domain::DomainError;
use domain::bus::{
    BusSpec, ClientFactory, ProtocolClient, RegisterClass, UnitArgument, UnitParameter,
};

type RegisterKey = (String, u8, RegisterClass, u16);

/// A register write observed by the simulated plant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub bus: String,
    pub unit: u8,
    pub address: u16,
    pub value: u16,
}

/// In-memory register image shared by every simulated bus client.
///
/// Registers never written read back as `0`. Faults are injected per bus
/// or per (bus, unit).
#[derive(Clone, Default)]
pub struct SimulatedPlant {
    state: Arc<Mutex<PlantState>>,
}

#[derive(Default)]
struct PlantState {
    registers: HashMap<RegisterKey, u16>,
    writes: Vec<RecordedWrite>,
    failing_units: HashSet<(String, u8)>,
    unresponsive: HashSet<String>,
    refused: HashSet<String>,
    rejects_named: HashSet<String>,
    unit_parameters: HashMap<String, Vec<UnitParameter>>,
    arguments: HashMap<String, Vec<UnitArgument>>,
    connects: HashMap<String, usize>,
}

impl SimulatedPlant {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlantState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_register(
        &self,
        bus: &str,
        unit: u8,
        class: RegisterClass,
        address: u16,
        value: u16,
    ) {
        self.lock()
            .registers
            .insert((bus.to_string(), unit, class, address), value);
    }

    pub fn register(&self, bus: &str, unit: u8, class: RegisterClass, address: u16) -> Option<u16> {
        self.lock()
            .registers
            .get(&(bus.to_string(), unit, class, address))
            .copied()
    }

    /// Every write accepted so far, in order
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.lock().writes.clone()
    }

    /// Unit arguments the clients of `bus` were called with, in order
    pub fn arguments(&self, bus: &str) -> Vec<UnitArgument> {
        self.lock().arguments.get(bus).cloned().unwrap_or_default()
    }

    pub fn connect_count(&self, bus: &str) -> usize {
        self.lock().connects.get(bus).copied().unwrap_or(0)
    }

    /// Make every transaction addressed to `unit` on `bus` fail
    pub fn fail_unit(&self, bus: &str, unit: u8) {
        self.lock().failing_units.insert((bus.to_string(), unit));
    }

    pub fn restore_unit(&self, bus: &str, unit: u8) {
        self.lock().failing_units.remove(&(bus.to_string(), unit));
    }

    /// An unresponsive bus never answers a transaction
    pub fn set_unresponsive(&self, bus: &str, unresponsive: bool) {
        let mut state = self.lock();
        if unresponsive {
            state.unresponsive.insert(bus.to_string());
        } else {
            state.unresponsive.remove(bus);
        }
    }

    /// The port of `bus` cannot be opened
    pub fn refuse_connect(&self, bus: &str) {
        self.lock().refused.insert(bus.to_string());
    }

    /// Override the unit-address names the client of `bus` advertises
    pub fn set_unit_parameters(&self, bus: &str, params: Vec<UnitParameter>) {
        self.lock().unit_parameters.insert(bus.to_string(), params);
    }

    /// The client of `bus` advertises names but refuses them when called
    pub fn reject_named_arguments(&self, bus: &str) {
        self.lock().rejects_named.insert(bus.to_string());
    }
}

impl ClientFactory for SimulatedPlant {
    fn create(&self, bus_name: &str, _spec: &BusSpec) -> Box<dyn ProtocolClient> {
        Box::new(SimulatedClient::new(bus_name, self.clone()))
    }
}

/// Protocol client backed by a [`SimulatedPlant`]
pub struct SimulatedClient {
    bus: String,
    plant: SimulatedPlant,
    connected: bool,
}

impl SimulatedClient {
    pub fn new(bus: impl Into<String>, plant: SimulatedPlant) -> Self {
        Self {
            bus: bus.into(),
            plant,
            connected: false,
        }
    }

    /// Record the call and decide whether it may proceed.
    fn admit(&self, argument: UnitArgument) -> Result<Admission, DomainError> {
        if !self.connected {
            return Err(DomainError::NotConnected);
        }
        let mut state = self.plant.lock();
        state
            .arguments
            .entry(self.bus.clone())
            .or_default()
            .push(argument);

        if let UnitArgument::Named(param, _) = argument {
            if state.rejects_named.contains(&self.bus) {
                return Err(DomainError::UnsupportedArgument(param.as_str().to_string()));
            }
        }
        if state.unresponsive.contains(&self.bus) {
            return Ok(Admission::Hang);
        }
        if state
            .failing_units
            .contains(&(self.bus.clone(), argument.unit()))
        {
            return Err(DomainError::Transport(format!(
                "No response from unit {}",
                argument.unit()
            )));
        }
        Ok(Admission::Proceed)
    }
}

enum Admission {
    Proceed,
    Hang,
}

#[async_trait]
impl ProtocolClient for SimulatedClient {
    async fn connect(&mut self) -> Result<(), DomainError> {
        let mut state = self.plant.lock();
        *state.connects.entry(self.bus.clone()).or_default() += 1;
        if state.refused.contains(&self.bus) {
            return Err(DomainError::Transport(format!(
                "Failed to open simulated port for {}",
                self.bus
            )));
        }
        self.connected = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DomainError> {
        self.connected = false;
        Ok(())
    }

    fn unit_parameters(&self) -> Vec<UnitParameter> {
        self.plant
            .lock()
            .unit_parameters
            .get(&self.bus)
            .cloned()
            .unwrap_or_else(|| vec![UnitParameter::Slave])
    }

    async fn read_registers(
        &mut self,
        class: RegisterClass,
        address: u16,
        count: u16,
        unit: UnitArgument,
    ) -> Result<Vec<u16>, DomainError> {
        if let Admission::Hang = self.admit(unit)? {
            return std::future::pending().await;
        }
        let state = self.plant.lock();
        let registers = (0..count)
            .map(|i| {
                let key = (self.bus.clone(), unit.unit(), class, address.wrapping_add(i));
                state.registers.get(&key).copied().unwrap_or(0)
            })
            .collect();
        Ok(registers)
    }

    async fn write_register(
        &mut self,
        address: u16,
        value: u16,
        unit: UnitArgument,
    ) -> Result<(), DomainError> {
        if let Admission::Hang = self.admit(unit)? {
            return std::future::pending().await;
        }
        let mut state = self.plant.lock();
        state.registers.insert(
            (self.bus.clone(), unit.unit(), RegisterClass::Holding, address),
            value,
        );
        state.writes.push(RecordedWrite {
            bus: self.bus.clone(),
            unit: unit.unit(),
            address,
            value,
        });
        Ok(())
    }
}
