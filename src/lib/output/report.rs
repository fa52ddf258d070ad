//! Tab-separated correction report.
//!
//! With correction enabled only corrected positions are listed; without it
//! every reference position is.

use std::io::Write;

use serde::Serialize;

use crate::call::frequency::format_weight;
use crate::call::pipeline::ReconstructedPosition;
use crate::core::error::Result;
use crate::engine::PositionSink;

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ReportRow<'a> {
    chrom: &'a str,
    pos: u64,
    #[serde(rename = "REF")]
    reference: char,
    #[serde(rename = "COV")]
    coverage: usize,
    allele_counts_prior: String,
    allele_counts_corrected: String,
    base_call: char,
    base_freq: String,
}

pub struct CorrectionReport<W: Write> {
    writer: csv::Writer<W>,
    contig: String,
    all_positions: bool,
    rows: u64,
}

impl<W: Write> CorrectionReport<W> {
    /// `all_positions` lists every reference position instead of only the
    /// corrected ones.
    pub fn new(writer: W, contig: &str, all_positions: bool) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(b'\t')
                .has_headers(true)
                .from_writer(writer),
            contig: contig.to_string(),
            all_positions,
            rows: 0,
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
    }
}

impl<W: Write> PositionSink for CorrectionReport<W> {
    fn accept(&mut self, position: &ReconstructedPosition) -> Result<()> {
        if position.key.is_insertion() || !(self.all_positions || position.is_corrected()) {
            return Ok(());
        }
        self.writer.serialize(ReportRow {
            chrom: &self.contig,
            pos: position.key.coordinate,
            reference: position.reference_base.as_char(),
            coverage: position.raw_coverage,
            allele_counts_prior: position.prior.to_string(),
            allele_counts_corrected: position.corrected.to_string(),
            base_call: position.call.base.as_char(),
            base_freq: format_weight(position.call.frequency),
        })?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.rows == 0 {
            // No row means serde never emitted the header.
            self.writer.write_record([
                "CHROM",
                "POS",
                "REF",
                "COV",
                "ALLELE_COUNTS_PRIOR",
                "ALLELE_COUNTS_CORRECTED",
                "BASE_CALL",
                "BASE_FREQ",
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::{corrected_position, position};
    use crate::position::{Base, PositionKey};

    #[test]
    fn lists_corrected_positions() {
        let mut report = CorrectionReport::new(Vec::new(), "chrM", false);
        report
            .accept(&position(PositionKey::reference(1), Base::A, Base::A))
            .unwrap();
        report.accept(&corrected_position(2, 10.0, 0.0)).unwrap();
        report.finish().unwrap();
        assert_eq!(report.rows(), 1);

        let text = String::from_utf8(report.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "CHROM\tPOS\tREF\tCOV\tALLELE_COUNTS_PRIOR\tALLELE_COUNTS_CORRECTED\tBASE_CALL\tBASE_FREQ\n\
             chrM\t2\tC\t15\tA=0,C=10,G=0,T=5\tA=0,C=10,G=0,T=0\tC\t1\n"
        );
    }

    #[test]
    fn all_positions_without_correction() {
        let mut report = CorrectionReport::new(Vec::new(), "chrM", true);
        report
            .accept(&position(PositionKey::reference(1), Base::A, Base::A))
            .unwrap();
        report
            .accept(&position(PositionKey::reference(2), Base::C, Base::N))
            .unwrap();
        report
            .accept(&position(PositionKey::new(2, 1), Base::N, Base::G))
            .unwrap();
        report.finish().unwrap();

        let text = String::from_utf8(report.into_inner().unwrap()).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(
            rows,
            vec![
                "chrM\t1\tA\t1\tA=1,C=0,G=0,T=0\tA=1,C=0,G=0,T=0\tA\t1",
                "chrM\t2\tC\t0\tA=0,C=0,G=0,T=0\tA=0,C=0,G=0,T=0\tN\t-1",
            ]
        );
    }

    #[test]
    fn empty_report_still_has_a_header() {
        let mut report = CorrectionReport::new(Vec::new(), "chrM", false);
        report.finish().unwrap();
        let text = String::from_utf8(report.into_inner().unwrap()).unwrap();
        assert!(text.starts_with("CHROM\tPOS\tREF"));
        assert_eq!(text.lines().count(), 1);
    }
}
