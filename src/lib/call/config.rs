//! Immutable per-run calling configuration.

use log::warn;

use crate::core::error::{DamconError, Result};
use crate::damage::{CorrectionMode, DetectionMode};

/// Settings shared by every position of a run. Built once, then only read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub correction: CorrectionMode,
    pub detection: DetectionMode,
    /// Positions with fewer raw observations are called `N`.
    pub min_coverage: u32,
    /// Majority frequency required for a call.
    pub min_frequency: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            correction: CorrectionMode::None,
            detection: DetectionMode::ReferenceBased,
            min_coverage: 3,
            min_frequency: 0.8,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.min_frequency.is_finite() || !(0.0..=1.0).contains(&self.min_frequency) {
            return Err(DamconError::ThresholdValidation {
                field: "min_frequency".to_string(),
                min: 0.0,
                max: 1.0,
                value: self.min_frequency,
            });
        }

        if self.correction.is_enabled() && self.detection == DetectionMode::None {
            warn!(
                "Correction mode {} has no effect with detection disabled",
                self.correction
            );
        }

        Ok(())
    }

    /// Whether any position can end up corrected.
    #[inline]
    pub fn corrects(&self) -> bool {
        self.correction.is_enabled() && self.detection != DetectionMode::None
    }
}
