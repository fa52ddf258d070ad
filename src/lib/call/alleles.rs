//! Reference-first allele tabulation for variant records.

use super::frequency::BaseFrequencyTable;
use crate::position::{Base, CANONICAL_BASES};

/// Parallel allele and depth lists. The reference allele is always first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleCounts {
    alleles: Vec<Base>,
    counts: Vec<u64>,
}

impl AlleleCounts {
    /// Reference base with its rounded weight, then every other base whose
    /// weight rounds to at least one, in A, C, G, T order.
    pub fn tabulate(table: &BaseFrequencyTable, reference_base: Base) -> Self {
        let mut alleles = vec![reference_base];
        let mut counts = vec![round_weight(table.get(reference_base))];

        for &base in CANONICAL_BASES.iter().filter(|&&b| b != reference_base) {
            let count = round_weight(table.get(base));
            if count >= 1 {
                alleles.push(base);
                counts.push(count);
            }
        }
        Self { alleles, counts }
    }

    pub fn alleles(&self) -> &[Base] {
        &self.alleles
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn reference(&self) -> Base {
        self.alleles[0]
    }

    /// Everything after the reference allele.
    pub fn alternates(&self) -> &[Base] {
        &self.alleles[1..]
    }
}

/// Round half up to a whole count.
#[inline]
fn round_weight(weight: f64) -> u64 {
    if weight <= 0.0 {
        0
    } else {
        (weight + 0.5).floor() as u64
    }
}
