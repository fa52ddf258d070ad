//! Genomic position primitives used across the reconstruction pipeline.
//!
//! - [`PositionKey`]: ordered (coordinate, insertion offset) key
//! - [`Base`] and [`Strand`]: the nucleotide alphabet and read orientation
//! - [`observation::Observation`]: one read's evidence at one position
//! - [`accumulator::PositionAccumulator`]: the ordered streaming buffer

pub mod accumulator;
pub mod observation;

use serde::Serialize;
use std::fmt;

/// Canonical order of the informative bases. Used for tie-breaking and for
/// allele tabulation so output is reproducible.
pub const CANONICAL_BASES: [Base; 4] = [Base::A, Base::C, Base::G, Base::T];

/// A nucleotide as observed in a read. Anything that is not A, C, G or T is `N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Base {
    A,
    C,
    G,
    T,
    N,
}

impl Base {
    /// Decode an ASCII nucleotide, case-insensitively.
    #[inline]
    pub fn from_ascii(byte: u8) -> Self {
        match byte.to_ascii_uppercase() {
            b'A' => Base::A,
            b'C' => Base::C,
            b'G' => Base::G,
            b'T' => Base::T,
            _ => Base::N,
        }
    }

    #[inline]
    pub fn as_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
            Base::N => 'N',
        }
    }

    /// Index into an `[_; 4]` table in [`CANONICAL_BASES`] order, `None` for `N`.
    #[inline]
    pub fn index(self) -> Option<usize> {
        match self {
            Base::A => Some(0),
            Base::C => Some(1),
            Base::G => Some(2),
            Base::T => Some(3),
            Base::N => None,
        }
    }

    #[inline]
    pub fn is_informative(self) -> bool {
        self != Base::N
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Orientation of the read an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    #[inline]
    pub fn from_is_reverse(is_reverse: bool) -> Self {
        if is_reverse {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }
}

/// Key of one pileup slot: a 1-based reference coordinate and an insertion
/// offset (0 for the reference base itself).
///
/// Field order makes the derived ordering coordinate-major, offset-minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PositionKey {
    pub coordinate: u64,
    pub insertion_offset: u32,
}

impl PositionKey {
    #[inline]
    pub fn new(coordinate: u64, insertion_offset: u32) -> Self {
        Self {
            coordinate,
            insertion_offset,
        }
    }

    /// Key of the reference base at `coordinate`.
    #[inline]
    pub fn reference(coordinate: u64) -> Self {
        Self::new(coordinate, 0)
    }

    #[inline]
    pub fn is_insertion(&self) -> bool {
        self.insertion_offset > 0
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.coordinate, self.insertion_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_order_numerically_not_lexically() {
        let mut keys = vec![
            PositionKey::new(10, 0),
            PositionKey::new(9, 2),
            PositionKey::new(9, 10),
            PositionKey::new(9, 0),
            PositionKey::new(100, 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                PositionKey::new(9, 0),
                PositionKey::new(9, 2),
                PositionKey::new(9, 10),
                PositionKey::new(10, 0),
                PositionKey::new(100, 0),
            ]
        );
    }

    #[test]
    fn base_decoding() {
        assert_eq!(Base::from_ascii(b'c'), Base::C);
        assert_eq!(Base::from_ascii(b'R'), Base::N);
        assert_eq!(Base::T.index(), Some(3));
        assert_eq!(Base::N.index(), None);
        assert_eq!(Base::G.to_string(), "G");
    }
}
