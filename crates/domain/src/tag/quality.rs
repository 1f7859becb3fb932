use serde::{Deserialize, Serialize};

/// Tag value quality indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagQuality {
    /// Latest operation on the tag succeeded
    Good,
    /// Latest operation on the tag failed; value is unavailable
    Bad,
    /// Nothing has been recorded yet
    Unknown,
}

impl TagQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Bad => "Bad",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Good)
    }
}

impl Default for TagQuality {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for TagQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
