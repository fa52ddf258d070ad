//! BED regions around corrected positions, for genome-browser review.

use std::io::Write;

use bio::io::bed;

use crate::call::pipeline::ReconstructedPosition;
use crate::core::error::Result;
use crate::engine::PositionSink;

/// Bases shown before the corrected position.
const FLANK_BEFORE: u64 = 3;
/// Bases shown after the corrected position.
const FLANK_AFTER: u64 = 2;

/// 0-based start and 1-based end of the window around a 1-based position.
pub fn roi_window(position: u64, contig_length: u64) -> (u64, u64) {
    (
        position.saturating_sub(FLANK_BEFORE),
        (position + FLANK_AFTER).min(contig_length),
    )
}

/// Buffered BED output; rows reach `W` when the writer is dropped.
pub struct RoiWriter<W: Write> {
    writer: bed::Writer<W>,
    contig: String,
    contig_length: u64,
    regions: u64,
}

impl<W: Write> RoiWriter<W> {
    /// Write the comment header, then hand `writer` to the BED encoder.
    pub fn new(mut writer: W, contig: &str, contig_length: u64) -> Result<Self> {
        writeln!(writer, "#CHROM=chromosome or scaffold name")?;
        writeln!(writer, "#ROI_START=0-based start position of ROI")?;
        writeln!(writer, "#ROI_END=1-based end position of ROI")?;
        writeln!(writer, "#CORRECTED_POS=1-based position of corrected variant")?;
        writeln!(writer, "#CHROM\tROI_START\tROI_END\tCORRECTED_POS")?;
        Ok(Self {
            writer: bed::Writer::new(writer),
            contig: contig.to_string(),
            contig_length,
            regions: 0,
        })
    }

    pub fn regions(&self) -> u64 {
        self.regions
    }
}

impl<W: Write> PositionSink for RoiWriter<W> {
    fn accept(&mut self, position: &ReconstructedPosition) -> Result<()> {
        if position.key.is_insertion() || !position.is_corrected() {
            return Ok(());
        }
        let coordinate = position.key.coordinate;
        let (start, end) = roi_window(coordinate, self.contig_length);
        let mut record = bed::Record::new();
        record.set_chrom(&self.contig);
        record.set_start(start);
        record.set_end(end);
        record.set_name(&format!("CORRECTED_POS:{}", coordinate));
        self.writer.write(&record)?;
        self.regions += 1;
        Ok(())
    }
}
