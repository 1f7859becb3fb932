use serde::{Deserialize, Serialize};

use super::LinearScale;

/// Default register counts per volt for analog outputs (fixed 3 decimals)
pub const DEFAULT_REG_SCALE: u32 = 1000;

/// Physical binding of a tag to a device channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub device: String,
    #[serde(default)]
    pub channel: Option<i32>,
}

impl ChannelBinding {
    pub fn new(device: impl Into<String>, channel: Option<i32>) -> Self {
        Self {
            device: device.into(),
            channel,
        }
    }

    /// Channel used when polling; input modules count from 0 unless told otherwise.
    pub fn read_channel(&self) -> i32 {
        self.channel.unwrap_or(0)
    }

    /// Channel used when writing; output modules count from 1.
    pub fn write_channel(&self) -> i32 {
        self.channel.unwrap_or(1)
    }
}

/// How a commanded value is interpreted on an analog output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriteMode {
    #[default]
    Percent,
    Voltage,
}

impl WriteMode {
    /// Voltage only when the tag is in volts and not explicitly a percent.
    pub fn from_unit_and_kind(unit: Option<&str>, kind: Option<&str>) -> Self {
        let in_volts = unit.is_some_and(|u| u.trim().eq_ignore_ascii_case("V"));
        let is_percent = kind.is_some_and(|k| k.trim().eq_ignore_ascii_case("percent"));
        if in_volts && !is_percent {
            Self::Voltage
        } else {
            Self::Percent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSemantics {
    pub mode: WriteMode,
    pub reg_scale: u32,
}

impl WriteSemantics {
    pub fn new(mode: WriteMode, reg_scale: u32) -> Self {
        Self { mode, reg_scale }
    }
}

impl Default for WriteSemantics {
    fn default() -> Self {
        Self::new(WriteMode::Percent, DEFAULT_REG_SCALE)
    }
}

/// A logical point exposed by the HAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDefinition {
    pub name: String,
    /// `None` for logical/derived tags
    pub binding: Option<ChannelBinding>,
    pub scale: LinearScale,
    pub write: WriteSemantics,
}

impl TagDefinition {
    /// A tag with no device behind it
    pub fn logical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
            scale: LinearScale::default(),
            write: WriteSemantics::default(),
        }
    }

    pub fn bound(name: impl Into<String>, device: impl Into<String>, channel: i32) -> Self {
        Self {
            binding: Some(ChannelBinding::new(device, Some(channel))),
            ..Self::logical(name)
        }
    }

    pub fn with_scale(mut self, scale: LinearScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    pub fn device(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.device.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mode_resolution() {
        assert_eq!(
            WriteMode::from_unit_and_kind(Some("V"), None),
            WriteMode::Voltage
        );
        assert_eq!(
            WriteMode::from_unit_and_kind(Some("v"), Some("voltage")),
            WriteMode::Voltage
        );
        assert_eq!(
            WriteMode::from_unit_and_kind(Some("V"), Some("Percent")),
            WriteMode::Percent
        );
        assert_eq!(
            WriteMode::from_unit_and_kind(Some("%"), None),
            WriteMode::Percent
        );
        assert_eq!(WriteMode::from_unit_and_kind(None, None), WriteMode::Percent);
    }

    #[test]
    fn test_channel_defaults_differ_for_read_and_write() {
        let binding = ChannelBinding::new("AO1", None);
        assert_eq!(binding.read_channel(), 0);
        assert_eq!(binding.write_channel(), 1);

        let binding = ChannelBinding::new("AO1", Some(4));
        assert_eq!(binding.read_channel(), 4);
        assert_eq!(binding.write_channel(), 4);
    }

    #[test]
    fn test_logical_tag_is_unbound() {
        let tag = TagDefinition::logical("comm_bad");
        assert!(!tag.is_bound());
        assert_eq!(tag.device(), None);
        assert_eq!(tag.write, WriteSemantics::default());
    }

    #[test]
    fn test_bound_tag_builder() {
        let tag = TagDefinition::bound("T1", "AI1", 3).with_scale(LinearScale::new(0.1, -50.0));
        assert_eq!(tag.device(), Some("AI1"));
        assert_eq!(tag.scale.gain, 0.1);
        assert_eq!(tag.write.reg_scale, DEFAULT_REG_SCALE);
    }
}
