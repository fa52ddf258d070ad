//! Per-position reconstruction: classify, correct, call, tabulate.
//!
//! Each flushed pileup runs through the whole chain at once. Positions are
//! independent of each other, so a batch can be processed on the rayon pool
//! as long as the results come back in key order.

use std::sync::Arc;

use rayon::prelude::*;

use super::alleles::AlleleCounts;
use super::config::PipelineConfig;
use super::consensus::{ConsensusCall, ConsensusCaller};
use super::frequency::BaseFrequencyTable;
use crate::core::error::Result;
use crate::damage::classifier::{build_classifier, DamageClassifier};
use crate::damage::corrector::{build_corrector, DamageCorrector};
use crate::damage::profile::DamageProfileTable;
use crate::damage::DamagePattern;
use crate::position::accumulator::Pileup;
use crate::position::{Base, PositionKey};

/// Batches smaller than this are processed on the calling thread.
pub const PARALLEL_BATCH_THRESHOLD: usize = 512;

/// Everything reported for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedPosition {
    pub key: PositionKey,
    pub reference_base: Base,
    /// Number of observations before correction.
    pub raw_coverage: usize,
    pub pattern: DamagePattern,
    pub prior: BaseFrequencyTable,
    pub corrected: BaseFrequencyTable,
    pub call: ConsensusCall,
    pub prior_alleles: AlleleCounts,
    pub corrected_alleles: AlleleCounts,
}

impl ReconstructedPosition {
    /// A damage pattern fired and the corrector ran.
    #[inline]
    pub fn is_corrected(&self) -> bool {
        self.pattern.is_damaged()
    }

    #[inline]
    pub fn is_covered(&self) -> bool {
        self.raw_coverage > 0
    }
}

/// Strategies and thresholds chosen once for the run.
pub struct PositionPipeline {
    config: PipelineConfig,
    classifier: Box<dyn DamageClassifier>,
    corrector: Box<dyn DamageCorrector>,
    caller: ConsensusCaller,
}

impl PositionPipeline {
    pub fn new(config: PipelineConfig, profiles: Option<Arc<DamageProfileTable>>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: build_classifier(config.correction, config.detection),
            corrector: build_corrector(config.correction, profiles)?,
            caller: ConsensusCaller::new(config.min_coverage, config.min_frequency),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one slot through the chain. The pileup is consumed.
    pub fn process(&self, pileup: Pileup, reference_base: Base) -> Result<ReconstructedPosition> {
        let Pileup { key, observations } = pileup;
        let raw_coverage = observations.len();
        let prior = BaseFrequencyTable::from_observations(&observations);

        let (pattern, corrected) = if (raw_coverage as u64) < u64::from(self.config.min_coverage) {
            (DamagePattern::None, prior)
        } else {
            let pattern = self.classifier.classify(&observations, reference_base);
            if pattern.is_damaged() {
                let corrected = self.corrector.correct(&observations, pattern)?;
                (pattern, BaseFrequencyTable::from_observations(&corrected))
            } else {
                (pattern, prior)
            }
        };

        let call = self.caller.call(raw_coverage, &corrected);
        Ok(ReconstructedPosition {
            key,
            reference_base,
            raw_coverage,
            pattern,
            prior_alleles: AlleleCounts::tabulate(&prior, reference_base),
            corrected_alleles: AlleleCounts::tabulate(&corrected, reference_base),
            prior,
            corrected,
            call,
        })
    }

    /// Process a flushed batch, in parallel when `parallel` is set and the
    /// batch is large enough. Output order always matches input order.
    pub fn process_batch(
        &self,
        batch: Vec<(Pileup, Base)>,
        parallel: bool,
    ) -> Result<Vec<ReconstructedPosition>> {
        if parallel && batch.len() >= PARALLEL_BATCH_THRESHOLD {
            batch
                .into_par_iter()
                .map(|(pileup, reference_base)| self.process(pileup, reference_base))
                .collect()
        } else {
            batch
                .into_iter()
                .map(|(pileup, reference_base)| self.process(pileup, reference_base))
                .collect()
        }
    }
}
