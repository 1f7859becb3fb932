use serde::{Deserialize, Serialize};

/// Linear transform from raw register counts to engineering units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    #[serde(default = "default_gain")]
    pub gain: f64,
    #[serde(default)]
    pub offset: f64,
}

fn default_gain() -> f64 {
    1.0
}

impl LinearScale {
    pub fn new(gain: f64, offset: f64) -> Self {
        Self { gain, offset }
    }

    /// `raw * gain + offset`
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.gain + self.offset
    }
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new(default_gain(), 0.0)
    }
}
