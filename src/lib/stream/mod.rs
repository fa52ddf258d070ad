//! Aligned read sources.
//!
//! The pileup only needs three things from an alignment: where it starts,
//! where it ends, and what base (if any) it shows at a given reference
//! coordinate. [`AlignedRead`] captures exactly that; [`ReadStream`] is any
//! ordered source of such reads.
//!
//! - [`segment::AlignedSegment`]: owned, CIGAR-resolved alignment
//! - [`bam::BamReadStream`]: coordinate-sorted BAM input via rust-htslib

pub mod bam;
pub mod segment;

use smartstring::alias::String;

use crate::core::error::Result;
use crate::position::{Base, Strand};

/// What a read shows at one reference coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBase {
    pub base: Base,
    pub read_offset: u32,
    pub read_length: u32,
    pub strand: Strand,
    pub read_group: Option<String>,
}

/// An alignment that can be queried per reference coordinate.
pub trait AlignedRead {
    /// First aligned reference coordinate (1-based, inclusive).
    fn alignment_start(&self) -> u64;

    /// Last aligned reference coordinate (1-based, inclusive). Smaller than
    /// the start when the read aligns no reference bases.
    fn alignment_end(&self) -> u64;

    /// The base at `coordinate`, or `None` for deletions, skips and
    /// coordinates outside the alignment.
    fn resolve(&self, coordinate: u64) -> Option<ResolvedBase>;
}

/// An ordered source of aligned reads.
pub trait ReadStream {
    type Read: AlignedRead;

    fn next_read(&mut self) -> Option<Result<Self::Read>>;
}

impl<R, I> ReadStream for I
where
    R: AlignedRead,
    I: Iterator<Item = Result<R>>,
{
    type Read = R;

    #[inline]
    fn next_read(&mut self) -> Option<Result<R>> {
        self.next()
    }
}
