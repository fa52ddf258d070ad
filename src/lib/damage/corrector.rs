//! Damage correction strategies.
//!
//! A corrector takes the buffered observations of one position and returns a
//! new list; the input is left untouched so the uncorrected view stays
//! available for reporting.

use std::sync::Arc;

use super::profile::DamageProfileTable;
use super::{CorrectionMode, DamagePattern};
use crate::core::error::{DamconError, Result};
use crate::position::observation::Observation;
use crate::position::Base;

/// Rewrites a pileup once a damage pattern has been detected.
pub trait DamageCorrector: Send + Sync {
    fn correct(&self, observations: &[Observation], pattern: DamagePattern)
        -> Result<Vec<Observation>>;
}

/// Leaves every observation as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughCorrector;

impl DamageCorrector for PassThroughCorrector {
    fn correct(
        &self,
        observations: &[Observation],
        _pattern: DamagePattern,
    ) -> Result<Vec<Observation>> {
        Ok(observations.to_vec())
    }
}

/// Masks suspect observations as `N`. Weights are never changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilencingCorrector;

impl DamageCorrector for SilencingCorrector {
    fn correct(
        &self,
        observations: &[Observation],
        pattern: DamagePattern,
    ) -> Result<Vec<Observation>> {
        let Some((strand, base)) = pattern.suspect() else {
            return Ok(observations.to_vec());
        };
        Ok(observations
            .iter()
            .map(|o| {
                if o.strand == strand && o.base == base {
                    o.with_base(Base::N)
                } else {
                    o.clone()
                }
            })
            .collect())
    }
}

/// Down-weights suspect observations by their damage probability and hands
/// the removed weight to the undamaged base as one synthetic observation.
#[derive(Debug, Clone)]
pub struct WeightingCorrector {
    profiles: Arc<DamageProfileTable>,
}

impl WeightingCorrector {
    pub fn new(profiles: Arc<DamageProfileTable>) -> Self {
        Self { profiles }
    }
}

impl DamageCorrector for WeightingCorrector {
    fn correct(
        &self,
        observations: &[Observation],
        pattern: DamagePattern,
    ) -> Result<Vec<Observation>> {
        let (Some((strand, base)), Some(original)) = (pattern.suspect(), pattern.original_base())
        else {
            return Ok(observations.to_vec());
        };

        let mut upvote = 0.0;
        let mut corrected = Vec::with_capacity(observations.len() + 1);
        for o in observations {
            if o.strand == strand && o.base == base {
                let profile = self.profiles.resolve(o.read_group.as_deref())?;
                let p = profile.probability_at(
                    o.read_offset as usize,
                    o.read_length as usize,
                    o.strand,
                );
                upvote += p;
                corrected.push(o.with_weight(1.0 - p));
            } else {
                corrected.push(o.clone());
            }
        }
        corrected.push(Observation::synthetic(original, upvote));
        Ok(corrected)
    }
}

/// Pick the corrector for a run. Weighting needs a profile table.
pub fn build_corrector(
    mode: CorrectionMode,
    profiles: Option<Arc<DamageProfileTable>>,
) -> Result<Box<dyn DamageCorrector>> {
    match mode {
        CorrectionMode::None => Ok(Box::new(PassThroughCorrector)),
        CorrectionMode::Silence => Ok(Box::new(SilencingCorrector)),
        CorrectionMode::Weight => {
            let profiles = profiles.ok_or_else(|| {
                DamconError::Config(
                    "weighting correction requires damage profiles (--dp5/--dp3 or --dp-table)"
                        .to_string(),
                )
            })?;
            Ok(Box::new(WeightingCorrector::new(profiles)))
        }
    }
}
