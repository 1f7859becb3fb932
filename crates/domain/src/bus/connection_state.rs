use serde::{Deserialize, Serialize};

/// Connection state of one serial bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not opened, or closed at shutdown
    Disconnected,
    /// Open in progress
    Connecting,
    /// Port open; register transactions are allowed
    Connected,
    /// Open attempt failed; every transaction reports unavailable
    Failed,
}

impl ConnectionState {
    /// Check if state allows an open attempt
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Transition to connecting state
    pub fn to_connecting(&self) -> Result<Self, &'static str> {
        match self {
            Self::Disconnected | Self::Failed => Ok(Self::Connecting),
            _ => Err("Can only connect from Disconnected or Failed state"),
        }
    }

    /// Transition to connected state
    pub fn to_connected(&self) -> Result<Self, &'static str> {
        match self {
            Self::Connecting => Ok(Self::Connected),
            _ => Err("Can only complete connection from Connecting state"),
        }
    }

    /// Transition to disconnected state
    pub fn to_disconnected(&self) -> Self {
        Self::Disconnected
    }

    /// Transition to failed state
    pub fn to_failed(&self) -> Self {
        Self::Failed
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}
