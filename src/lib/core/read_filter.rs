//! Read filtering primitives.
//!
//! This module exposes the [`ReadFilter`] trait along with the default
//! implementation used when streaming alignments into the pileup.

use rust_htslib::bam::record::Record;

/// A trait for filtering reads based on various criteria.
///
/// Implementations should return `true` if the read passes the filter and
/// `false` otherwise.
pub trait ReadFilter {
    /// Filter a read based on various criteria.
    fn filter_read(&self, read: &Record) -> bool;
}

/// Mapping-quality filter that also drops alignments which cannot contribute a
/// primary observation (unmapped, secondary, and supplementary records).
pub struct DefaultReadFilter {
    /// The read's mapping quality must be greater than or equal to this value to pass.
    min_mapq: u8,
}

impl DefaultReadFilter {
    /// Create a new [`DefaultReadFilter`] with the specified criteria.
    pub fn new(min_mapq: u8) -> Self {
        Self { min_mapq }
    }
}

impl ReadFilter for DefaultReadFilter {
    #[inline(always)]
    fn filter_read(&self, read: &Record) -> bool {
        !read.is_unmapped()
            && !read.is_secondary()
            && !read.is_supplementary()
            && read.mapq() >= self.min_mapq
    }
}
