//! Owned alignment with a precomputed reference→read offset table.

use rust_htslib::bam::record::{Cigar, CigarString};
use smartstring::alias::String;

use super::{AlignedRead, ResolvedBase};
use crate::core::error::{DamconError, Result};
use crate::position::{Base, Strand};

/// A read aligned to the reference, resolved once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSegment {
    start: u64,
    bases: Vec<u8>,
    strand: Strand,
    read_group: Option<String>,
    /// Read offset for each reference coordinate from `start`; `None` where
    /// the reference is deleted or skipped.
    read_offsets: Vec<Option<u32>>,
}

impl AlignedSegment {
    /// Build a segment from its 1-based start, stored read bases and CIGAR.
    ///
    /// M, = and X consume reference and read; I and S consume the read only;
    /// D and N consume the reference only; H and P consume neither.
    pub fn new(
        start: u64,
        bases: Vec<u8>,
        ops: &[Cigar],
        strand: Strand,
        read_group: Option<String>,
    ) -> Result<Self> {
        if start == 0 {
            return Err(DamconError::InvalidInput(
                "alignment start must be 1-based".to_string(),
            ));
        }

        let mut read_offsets = Vec::new();
        let mut read_pos: u32 = 0;
        for op in ops {
            match *op {
                Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) => {
                    read_offsets.extend((read_pos..read_pos + len).map(Some));
                    read_pos += len;
                }
                Cigar::Del(len) | Cigar::RefSkip(len) => {
                    read_offsets.extend(std::iter::repeat(None).take(len as usize));
                }
                Cigar::Ins(len) | Cigar::SoftClip(len) => {
                    read_pos += len;
                }
                Cigar::HardClip(_) | Cigar::Pad(_) => {}
            }
        }

        if read_pos as usize > bases.len() {
            return Err(DamconError::Parse(format!(
                "CIGAR consumes {} read bases but the read has {}",
                read_pos,
                bases.len()
            )));
        }

        Ok(Self {
            start,
            bases,
            strand,
            read_group,
            read_offsets,
        })
    }

    /// Convenience constructor from a textual CIGAR such as `3S10M2D5M`.
    pub fn from_cigar_str(
        start: u64,
        bases: &[u8],
        cigar: &str,
        strand: Strand,
        read_group: Option<&str>,
    ) -> Result<Self> {
        let ops = CigarString::try_from(cigar)?;
        Self::new(
            start,
            bases.to_vec(),
            &ops.0,
            strand,
            read_group.map(String::from),
        )
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[inline]
    pub fn read_group(&self) -> Option<&str> {
        self.read_group.as_deref()
    }

    #[inline]
    pub fn read_length(&self) -> u32 {
        self.bases.len() as u32
    }

    /// Number of reference coordinates spanned, deletions included.
    #[inline]
    pub fn reference_length(&self) -> u64 {
        self.read_offsets.len() as u64
    }
}

impl AlignedRead for AlignedSegment {
    #[inline]
    fn alignment_start(&self) -> u64 {
        self.start
    }

    #[inline]
    fn alignment_end(&self) -> u64 {
        self.start + self.reference_length() - 1
    }

    fn resolve(&self, coordinate: u64) -> Option<ResolvedBase> {
        if coordinate < self.start {
            return None;
        }
        let idx = (coordinate - self.start) as usize;
        let offset = (*self.read_offsets.get(idx)?)?;
        Some(ResolvedBase {
            base: Base::from_ascii(self.bases[offset as usize]),
            read_offset: offset,
            read_length: self.read_length(),
            strand: self.strand,
            read_group: self.read_group.clone(),
        })
    }
}
