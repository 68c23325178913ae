//! Configuration for cutting instructions and reports.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Time estimates used for instructions and the cost report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct CuttingConfig {
    /// Minutes to mount one stock block.
    pub setup_minutes: f64,

    /// Minutes to cut out one piece.
    pub cut_minutes: f64,

    /// Minutes to inspect the pieces of one block.
    pub quality_minutes: f64,
}

impl Default for CuttingConfig {
    fn default() -> Self {
        Self {
            setup_minutes: 15.0,
            cut_minutes: 2.5,
            quality_minutes: 5.0,
        }
    }
}

impl CuttingConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the setup time per block.
    pub fn with_setup_minutes(mut self, minutes: f64) -> Self {
        self.setup_minutes = minutes.max(0.0);
        self
    }

    /// Sets the cutting time per piece.
    pub fn with_cut_minutes(mut self, minutes: f64) -> Self {
        self.cut_minutes = minutes.max(0.0);
        self
    }

    /// Sets the inspection time per block.
    pub fn with_quality_minutes(mut self, minutes: f64) -> Self {
        self.quality_minutes = minutes.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CuttingConfig::default();
        assert_eq!(config.setup_minutes, 15.0);
        assert_eq!(config.cut_minutes, 2.5);
        assert_eq!(config.quality_minutes, 5.0);
    }

    #[test]
    fn test_negative_times_clamped() {
        let config = CuttingConfig::new().with_cut_minutes(-1.0).with_setup_minutes(3.0);
        assert_eq!(config.cut_minutes, 0.0);
        assert_eq!(config.setup_minutes, 3.0);
    }
}
