//! Coordinate-sorted BAM input.
//!
//! Records are filtered, restricted to the reference contig, and converted to
//! owned [`AlignedSegment`]s. The stream itself does not enforce ordering;
//! the position accumulator rejects out-of-order records.

use std::path::Path;

use log::{info, warn};
use rust_htslib::bam::{
    self,
    record::{Aux, Record},
    Read,
};
use smartstring::alias::String;

use super::segment::AlignedSegment;
use crate::core::error::{DamconError, Result};
use crate::core::read_filter::{DefaultReadFilter, ReadFilter};
use crate::position::Strand;

/// Counters describing what the stream skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub yielded: u64,
    pub filtered: u64,
    pub other_contig: u64,
}

/// Streams alignments for one contig out of a BAM file.
pub struct BamReadStream<F: ReadFilter = DefaultReadFilter> {
    reader: bam::Reader,
    record: Record,
    filter: F,
    tid: u32,
    contig: std::string::String,
    read_groups: Vec<std::string::String>,
    stats: StreamStats,
}

impl<F: ReadFilter> BamReadStream<F> {
    /// Open `path` and restrict the stream to `contig`.
    ///
    /// Fails when the contig is absent from the BAM header, so a mismatched
    /// reference is reported before any position is processed.
    pub fn from_path<P: AsRef<Path>>(path: P, contig: &str, filter: F) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DamconError::FileNotFound(format!(
                "BAM file not found: {}",
                path.display()
            )));
        }

        let reader = bam::Reader::from_path(path)?;
        let tid = reader.header().tid(contig.as_bytes()).ok_or_else(|| {
            DamconError::ReferenceGenome(format!(
                "Reference contig '{}' is not present in the header of {}",
                contig,
                path.display()
            ))
        })?;

        let header = bam::Header::from_template(reader.header());
        let header_map = header.to_hashmap();

        let sort_order = header_map
            .get("HD")
            .and_then(|records| records.first())
            .and_then(|hd| hd.get("SO").cloned());
        match sort_order.as_deref() {
            Some("coordinate") => {}
            Some(other) => warn!(
                "{} declares sort order '{}'; input must be coordinate-sorted",
                path.display(),
                other
            ),
            None => warn!(
                "{} does not declare a sort order; input must be coordinate-sorted",
                path.display()
            ),
        }

        let read_groups: Vec<std::string::String> = header_map
            .get("RG")
            .map(|records| {
                records
                    .iter()
                    .filter_map(|rg| rg.get("ID").cloned())
                    .collect()
            })
            .unwrap_or_default();

        info!(
            "Opened {} (contig {} as tid {}, {} read group(s))",
            path.display(),
            contig,
            tid,
            read_groups.len()
        );

        Ok(Self {
            reader,
            record: Record::new(),
            filter,
            tid,
            contig: contig.to_string(),
            read_groups,
            stats: StreamStats::default(),
        })
    }

    /// Read group identifiers declared in the BAM header.
    pub fn read_groups(&self) -> &[std::string::String] {
        &self.read_groups
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }
}

impl<F: ReadFilter> Iterator for BamReadStream<F> {
    type Item = Result<AlignedSegment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read(&mut self.record) {
                None => return None,
                Some(Err(err)) => return Some(Err(err.into())),
                Some(Ok(())) => {}
            }

            if !self.filter.filter_read(&self.record) {
                self.stats.filtered += 1;
                continue;
            }

            if self.record.tid() < 0 || self.record.tid() as u32 != self.tid {
                if self.stats.other_contig == 0 {
                    warn!(
                        "Skipping alignments to contigs other than {}",
                        self.contig
                    );
                }
                self.stats.other_contig += 1;
                continue;
            }

            self.stats.yielded += 1;
            return Some(segment_from_record(&self.record));
        }
    }
}

/// Convert an htslib record into an [`AlignedSegment`].
pub fn segment_from_record(record: &Record) -> Result<AlignedSegment> {
    let cigar = record.cigar();
    let read_group = match record.aux(b"RG") {
        Ok(Aux::String(value)) => Some(String::from(value)),
        _ => None,
    };

    let start = u64::try_from(record.pos())
        .map_err(|_| DamconError::InvalidInput("mapped record without a position".to_string()))?
        + 1;

    AlignedSegment::new(
        start,
        record.seq().as_bytes(),
        &cigar,
        Strand::from_is_reverse(record.is_reverse()),
        read_group,
    )
}
