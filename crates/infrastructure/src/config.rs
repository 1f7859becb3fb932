use std::collections::HashSet;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use domain::DomainError;
use domain::bus::{BusSpec, RetryPolicy};
use domain::device::DeviceKind;
use domain::tag::{
    ChannelBinding, DEFAULT_REG_SCALE, LinearScale, TagDefinition, WriteMode, WriteSemantics,
};
use serde::{Deserialize, Serialize};

/// One serial line
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BusConfig {
    pub name: String,
    #[serde(flatten)]
    pub spec: BusSpec,
}

/// One field device on a bus
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub bus: String,
    #[serde(alias = "unit")]
    pub addr: u8,
    /// Analog-input channel count
    #[serde(default)]
    pub channels: Option<u16>,
    /// Read attempts per poll for sensor devices
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,
}

impl DeviceConfig {
    pub fn kind(&self) -> Result<DeviceKind, DomainError> {
        self.device_type.parse()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retries.unwrap_or(1),
            self.retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(RetryPolicy::DEFAULT_DELAY),
        )
    }
}

/// Either a bare gain or a full `{gain, offset}` pair
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum ScaleConfig {
    Gain(f64),
    Linear(LinearScale),
}

impl From<ScaleConfig> for LinearScale {
    fn from(scale: ScaleConfig) -> Self {
        match scale {
            ScaleConfig::Gain(gain) => LinearScale::new(gain, 0.0),
            ScaleConfig::Linear(scale) => scale,
        }
    }
}

/// One logical point
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TagConfig {
    pub name: String,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub channel: Option<i32>,
    #[serde(default)]
    pub scale: Option<ScaleConfig>,
    /// Engineering unit; `"V"` selects voltage writes on analog outputs
    #[serde(default)]
    pub unit: Option<String>,
    /// `"percent"` forces percent writes even for a volt-unit tag
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub reg_scale: Option<u32>,
}

impl TagConfig {
    pub fn to_definition(&self) -> TagDefinition {
        TagDefinition {
            name: self.name.clone(),
            binding: self
                .device
                .as_ref()
                .filter(|d| !d.trim().is_empty())
                .map(|d| ChannelBinding::new(d.clone(), self.channel)),
            scale: self.scale.map(LinearScale::from).unwrap_or_default(),
            write: WriteSemantics::new(
                WriteMode::from_unit_and_kind(self.unit.as_deref(), self.kind.as_deref()),
                self.reg_scale.unwrap_or(DEFAULT_REG_SCALE),
            ),
        }
    }
}

/// Timing of the HAL workers
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HalSettings {
    #[serde(default = "default_poll_period_ms")]
    pub poll_period_ms: u64,
    #[serde(default = "default_write_wait_ms")]
    pub write_wait_ms: u64,
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
    /// Logical tag set to 1.0 when any read of a poll sweep failed.
    /// Only maintained when the plant declares a tag of that name.
    #[serde(default = "default_health_tag")]
    pub health_tag: Option<String>,
}

fn default_poll_period_ms() -> u64 {
    200
}
fn default_write_wait_ms() -> u64 {
    100
}
fn default_join_timeout_ms() -> u64 {
    1000
}
fn default_health_tag() -> Option<String> {
    Some("comm_bad".to_string())
}

impl HalSettings {
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    pub fn write_wait(&self) -> Duration {
        Duration::from_millis(self.write_wait_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

impl Default for HalSettings {
    fn default() -> Self {
        Self {
            poll_period_ms: default_poll_period_ms(),
            write_wait_ms: default_write_wait_ms(),
            join_timeout_ms: default_join_timeout_ms(),
            health_tag: default_health_tag(),
        }
    }
}

/// Full plant description: buses, devices on them, tags bound to devices
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PlantConfig {
    #[serde(default)]
    pub buses: Vec<BusConfig>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
    #[serde(default)]
    pub settings: HalSettings,
}

impl PlantConfig {
    /// Load from a file (format by extension), layered with `PLANT__*`
    /// environment overrides, then validate.
    pub fn load(path: &str) -> Result<Self, DomainError> {
        let source = Config::builder()
            .add_source(File::with_name(path).required(true))
            // e.g. PLANT__SETTINGS__POLL_PERIOD_MS=500
            .add_source(
                Environment::with_prefix("PLANT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?;

        Self::from_source(source)
    }

    /// Parse an in-memory YAML document, then validate.
    pub fn from_yaml_str(content: &str) -> Result<Self, DomainError> {
        let source = Config::builder()
            .add_source(File::from_str(content, FileFormat::Yaml))
            .build()
            .map_err(config_error)?;

        Self::from_source(source)
    }

    fn from_source(source: Config) -> Result<Self, DomainError> {
        let plant: Self = source.try_deserialize().map_err(config_error)?;
        plant.validate()?;
        Ok(plant)
    }

    /// Reject descriptions the HAL cannot be built from.
    pub fn validate(&self) -> Result<(), DomainError> {
        unique("bus", self.buses.iter().map(|b| b.name.as_str()))?;
        unique("device", self.devices.iter().map(|d| d.name.as_str()))?;
        unique("tag", self.tags.iter().map(|t| t.name.as_str()))?;

        for bus in &self.buses {
            bus.spec.validate().map_err(|e| {
                DomainError::InvalidConfiguration(format!("bus '{}': {}", bus.name, e))
            })?;
        }

        let bus_names: HashSet<&str> = self.buses.iter().map(|b| b.name.as_str()).collect();
        for device in &self.devices {
            device.kind()?;
            if !bus_names.contains(device.bus.as_str()) {
                return Err(DomainError::UnknownBus {
                    device: device.name.clone(),
                    bus: device.bus.clone(),
                });
            }
        }

        let device_names: HashSet<&str> = self.devices.iter().map(|d| d.name.as_str()).collect();
        for tag in self.tags.iter().map(TagConfig::to_definition) {
            if let Some(device) = tag.device() {
                if !device_names.contains(device) {
                    return Err(DomainError::UnknownDevice {
                        tag: tag.name.clone(),
                        device: device.to_string(),
                    });
                }
                if self.settings.health_tag.as_deref() == Some(tag.name.as_str()) {
                    return Err(DomainError::InvalidConfiguration(format!(
                        "health tag '{}' must not be bound to a device",
                        tag.name
                    )));
                }
            }
        }

        if self.settings.poll_period_ms == 0 {
            return Err(DomainError::InvalidConfiguration(
                "poll_period_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn tag_definitions(&self) -> Vec<TagDefinition> {
        self.tags.iter().map(TagConfig::to_definition).collect()
    }
}

fn unique<'a>(what: &str, names: impl Iterator<Item = &'a str>) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(DomainError::InvalidConfiguration(format!(
                "duplicate {} name '{}'",
                what, name
            )));
        }
    }
    Ok(())
}

fn config_error(e: config::ConfigError) -> DomainError {
    DomainError::InvalidConfiguration(e.to_string())
}
