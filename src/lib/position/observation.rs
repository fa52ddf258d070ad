//! A single read's evidence at a single pileup slot.

use smartstring::alias::String;

use super::{Base, Strand};

/// Weight every freshly resolved observation starts with.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// One base observed by one read at one position.
///
/// Observations are plain values: correction stages build new lists instead of
/// mutating the buffered ones, so pre- and post-correction views never alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub base: Base,
    /// 0-based offset of the base in the stored read sequence.
    pub read_offset: u32,
    /// Length of the stored read sequence.
    pub read_length: u32,
    pub strand: Strand,
    pub weight: f64,
    pub read_group: Option<String>,
}

impl Observation {
    pub fn new(
        base: Base,
        read_offset: u32,
        read_length: u32,
        strand: Strand,
        read_group: Option<String>,
    ) -> Self {
        Self {
            base,
            read_offset,
            read_length,
            strand,
            weight: DEFAULT_WEIGHT,
            read_group,
        }
    }

    /// Synthetic observation carrying pooled weight for `base`, with no read
    /// geometry of its own.
    pub fn synthetic(base: Base, weight: f64) -> Self {
        Self {
            base,
            read_offset: 0,
            read_length: 0,
            strand: Strand::Forward,
            weight,
            read_group: None,
        }
    }

    /// Copy of this observation with a different base.
    #[inline]
    pub fn with_base(&self, base: Base) -> Self {
        Self {
            base,
            ..self.clone()
        }
    }

    /// Copy of this observation with a different weight.
    #[inline]
    pub fn with_weight(&self, weight: f64) -> Self {
        Self {
            weight,
            ..self.clone()
        }
    }

    #[inline]
    pub fn is_forward(&self) -> bool {
        self.strand == Strand::Forward
    }

    #[inline]
    pub fn is_reverse(&self) -> bool {
        self.strand == Strand::Reverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_copies_leave_original_untouched() {
        let original = Observation::new(Base::T, 3, 40, Strand::Forward, Some("rg1".into()));
        let masked = original.with_base(Base::N);
        let weighted = original.with_weight(0.25);

        assert_eq!(original.base, Base::T);
        assert_eq!(original.weight, DEFAULT_WEIGHT);
        assert_eq!(masked.base, Base::N);
        assert_eq!(masked.weight, DEFAULT_WEIGHT);
        assert_eq!(weighted.base, Base::T);
        assert_eq!(weighted.weight, 0.25);
        assert_eq!(weighted.read_group.as_deref(), Some("rg1"));
    }
}
