//! Weighted base distribution of one position.

use std::fmt;

use itertools::Itertools;

use crate::position::observation::Observation;
use crate::position::{Base, CANONICAL_BASES};

/// Accumulated weight per informative base. `N` observations add nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaseFrequencyTable {
    weights: [f64; 4],
}

impl BaseFrequencyTable {
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut weights = [0.0; 4];
        for o in observations {
            if let Some(idx) = o.base.index() {
                weights[idx] += o.weight;
            }
        }
        Self { weights }
    }

    /// Weight of `base`; always zero for `N`.
    #[inline]
    pub fn get(&self, base: Base) -> f64 {
        base.index().map_or(0.0, |idx| self.weights[idx])
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Bases with their weights in A, C, G, T order.
    pub fn iter(&self) -> impl Iterator<Item = (Base, f64)> + '_ {
        CANONICAL_BASES.iter().map(move |&b| (b, self.get(b)))
    }
}

/// Weight with at most two decimals, trailing zeros dropped.
pub fn format_weight(weight: f64) -> String {
    let fixed = format!("{:.2}", weight);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

impl fmt::Display for BaseFrequencyTable {
    /// `A=10,C=0,G=0,T=2.5`
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fields = self.iter().format_with(",", |(base, weight), g| {
            g(&format_args!("{}={}", base, format_weight(weight)))
        });
        write!(f, "{}", fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Strand;

    #[test]
    fn sums_weights_and_ignores_n() {
        let pileup = vec![
            Observation::new(Base::C, 0, 5, Strand::Forward, None),
            Observation::new(Base::C, 1, 5, Strand::Forward, None).with_weight(0.5),
            Observation::new(Base::N, 2, 5, Strand::Forward, None),
            Observation::synthetic(Base::T, 0.25),
        ];
        let table = BaseFrequencyTable::from_observations(&pileup);
        assert_eq!(table.get(Base::C), 1.5);
        assert_eq!(table.get(Base::T), 0.25);
        assert_eq!(table.get(Base::A), 0.0);
        assert_eq!(table.get(Base::N), 0.0);
        assert_eq!(table.total(), 1.75);
    }

    #[test]
    fn formats_counts_compactly() {
        assert_eq!(format_weight(10.0), "10");
        assert_eq!(format_weight(2.5), "2.5");
        assert_eq!(format_weight(0.8333), "0.83");
        assert_eq!(format_weight(0.0), "0");
        assert_eq!(format_weight(0.001), "0");

        let pileup = vec![
            Observation::synthetic(Base::C, 12.5),
            Observation::synthetic(Base::T, 2.5),
        ];
        assert_eq!(
            BaseFrequencyTable::from_observations(&pileup).to_string(),
            "A=0,C=12.5,G=0,T=2.5"
        );
    }
}
