//! Threshold-based consensus calling.

use serde::Serialize;

use super::frequency::BaseFrequencyTable;
use crate::position::{Base, CANONICAL_BASES};

/// Frequency reported when a call is forced to `N` by a threshold.
pub const NO_CALL_FREQUENCY: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsensusCall {
    pub base: Base,
    pub frequency: f64,
}

impl ConsensusCall {
    pub fn no_call() -> Self {
        Self {
            base: Base::N,
            frequency: NO_CALL_FREQUENCY,
        }
    }

    #[inline]
    pub fn is_no_call(&self) -> bool {
        self.base == Base::N
    }
}

/// Coverage and majority-frequency thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ConsensusCaller {
    min_coverage: u32,
    min_frequency: f64,
}

impl ConsensusCaller {
    pub fn new(min_coverage: u32, min_frequency: f64) -> Self {
        Self {
            min_coverage,
            min_frequency,
        }
    }

    /// Call one position from its raw coverage and corrected distribution.
    ///
    /// Equal weights resolve to the first base in A, C, G, T order.
    pub fn call(&self, raw_coverage: usize, corrected: &BaseFrequencyTable) -> ConsensusCall {
        if (raw_coverage as u64) < u64::from(self.min_coverage) {
            return ConsensusCall::no_call();
        }

        let total = corrected.total();
        if total <= 0.0 {
            return ConsensusCall::no_call();
        }

        let mut best = CANONICAL_BASES[0];
        let mut best_weight = corrected.get(best);
        for &base in &CANONICAL_BASES[1..] {
            let weight = corrected.get(base);
            if weight > best_weight {
                best = base;
                best_weight = weight;
            }
        }

        let frequency = best_weight / total;
        if frequency < self.min_frequency {
            return ConsensusCall::no_call();
        }
        ConsensusCall {
            base: best,
            frequency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::observation::Observation;

    fn table(weights: &[(Base, f64)]) -> BaseFrequencyTable {
        let pileup: Vec<Observation> = weights
            .iter()
            .map(|&(b, w)| Observation::synthetic(b, w))
            .collect();
        BaseFrequencyTable::from_observations(&pileup)
    }

    #[test]
    fn low_coverage_is_a_no_call_whatever_the_bases() {
        let caller = ConsensusCaller::new(3, 0.0);
        let call = caller.call(2, &table(&[(Base::A, 2.0)]));
        assert_eq!(call, ConsensusCall::no_call());
        assert_eq!(call.frequency, NO_CALL_FREQUENCY);
    }

    #[test]
    fn zero_total_weight_is_a_no_call() {
        let caller = ConsensusCaller::new(0, 0.0);
        assert!(caller.call(4, &BaseFrequencyTable::default()).is_no_call());
        assert!(caller.call(1, &table(&[(Base::C, 0.0)])).is_no_call());
    }

    #[test]
    fn majority_and_frequency() {
        let caller = ConsensusCaller::new(1, 0.5);
        let call = caller.call(15, &table(&[(Base::C, 12.5), (Base::T, 2.5)]));
        assert_eq!(call.base, Base::C);
        assert!((call.frequency - 12.5 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn below_min_frequency_is_a_no_call() {
        let caller = ConsensusCaller::new(1, 0.8);
        let call = caller.call(10, &table(&[(Base::A, 7.0), (Base::G, 3.0)]));
        assert!(call.is_no_call());
        assert_eq!(call.frequency, NO_CALL_FREQUENCY);

        let exact = ConsensusCaller::new(1, 0.7).call(10, &table(&[(Base::A, 7.0), (Base::G, 3.0)]));
        assert_eq!(exact.base, Base::A);
    }

    #[test]
    fn ties_go_to_the_earlier_base() {
        let caller = ConsensusCaller::new(1, 0.0);
        assert_eq!(caller.call(4, &table(&[(Base::T, 2.0), (Base::G, 2.0)])).base, Base::G);
        assert_eq!(
            caller
                .call(4, &table(&[(Base::A, 1.0), (Base::C, 1.0), (Base::G, 1.0), (Base::T, 1.0)]))
                .base,
            Base::A
        );
    }
}
