//! Damage pattern detection.
//!
//! When both signatures are present at one position, C→T on the forward
//! strand is checked first and wins.

use super::{CorrectionMode, DamagePattern, DetectionMode};
use crate::position::observation::Observation;
use crate::position::{Base, Strand};

/// Decides which damage pattern, if any, a pileup shows.
pub trait DamageClassifier: Send + Sync {
    fn classify(&self, observations: &[Observation], reference_base: Base) -> DamagePattern;
}

/// Damage is only called where the reference carries the undamaged base.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceBasedClassifier;

impl DamageClassifier for ReferenceBasedClassifier {
    fn classify(&self, observations: &[Observation], reference_base: Base) -> DamagePattern {
        if reference_base == Base::C && any_on_strand(observations, Strand::Forward, Base::T) {
            DamagePattern::ForwardCT
        } else if reference_base == Base::G && any_on_strand(observations, Strand::Reverse, Base::A)
        {
            DamagePattern::ReverseGA
        } else {
            DamagePattern::None
        }
    }
}

/// Damage is called from the observed bases alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceFreeClassifier;

impl DamageClassifier for ReferenceFreeClassifier {
    fn classify(&self, observations: &[Observation], _reference_base: Base) -> DamagePattern {
        let has_c = observations.iter().any(|o| o.base == Base::C);
        if has_c && any_on_strand(observations, Strand::Forward, Base::T) {
            return DamagePattern::ForwardCT;
        }
        let has_g = observations.iter().any(|o| o.base == Base::G);
        if has_g && any_on_strand(observations, Strand::Reverse, Base::A) {
            return DamagePattern::ReverseGA;
        }
        DamagePattern::None
    }
}

/// Never reports damage.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledClassifier;

impl DamageClassifier for DisabledClassifier {
    fn classify(&self, _observations: &[Observation], _reference_base: Base) -> DamagePattern {
        DamagePattern::None
    }
}

#[inline]
fn any_on_strand(observations: &[Observation], strand: Strand, base: Base) -> bool {
    observations
        .iter()
        .any(|o| o.strand == strand && o.base == base)
}

/// Pick the classifier for a run. Detection is off whenever correction is.
pub fn build_classifier(
    correction: CorrectionMode,
    detection: DetectionMode,
) -> Box<dyn DamageClassifier> {
    if !correction.is_enabled() {
        return Box::new(DisabledClassifier);
    }
    match detection {
        DetectionMode::None => Box::new(DisabledClassifier),
        DetectionMode::ReferenceBased => Box::new(ReferenceBasedClassifier),
        DetectionMode::ReferenceFree => Box::new(ReferenceFreeClassifier),
    }
}
