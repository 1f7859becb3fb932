use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown device type: {0}")]
    UnknownDeviceType(String),

    #[error("Unknown bus '{bus}' referenced by device '{device}'")]
    UnknownBus { device: String, bus: String },

    #[error("Unknown device '{device}' referenced by tag '{tag}'")]
    UnknownDevice { tag: String, device: String },

    #[error("Bus is not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol exception: {0}")]
    Protocol(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Client does not accept argument: {0}")]
    UnsupportedArgument(String),
}

impl DomainError {
    /// True for errors that can only come from a bad plant description.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_)
                | Self::UnknownDeviceType(_)
                | Self::UnknownBus { .. }
                | Self::UnknownDevice { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_classified() {
        assert!(DomainError::UnknownDeviceType("XYZ".into()).is_configuration());
        assert!(
            DomainError::UnknownBus {
                device: "AI1".into(),
                bus: "daq".into()
            }
            .is_configuration()
        );
        assert!(!DomainError::Timeout(200).is_configuration());
        assert!(!DomainError::NotConnected.is_configuration());
    }

    #[test]
    fn test_display_names_the_offender() {
        let err = DomainError::UnknownDevice {
            tag: "T1".into(),
            device: "AI9".into(),
        };
        assert_eq!(err.to_string(), "Unknown device 'AI9' referenced by tag 'T1'");
    }
}
