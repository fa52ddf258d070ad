//! VCF 4.2 writer backed by htslib.
//!
//! One record per reference position (or per corrected position). REF and
//! ALT come from the corrected allele tabulation; `DP` is the raw coverage.

use std::path::Path;

use rust_htslib::bcf::{self, record::Numeric, Format};

use crate::call::config::PipelineConfig;
use crate::call::pipeline::ReconstructedPosition;
use crate::core::error::Result;
use crate::engine::PositionSink;

/// Contig and run settings written into the header.
#[derive(Debug, Clone)]
pub struct VcfHeader<'a> {
    pub contig: &'a str,
    pub contig_length: u64,
    pub sample: &'a str,
    pub config: &'a PipelineConfig,
}

impl VcfHeader<'_> {
    pub fn build(&self) -> bcf::Header {
        let mut header = bcf::Header::new();
        header.push_record(
            format!("##source={}-{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).as_bytes(),
        );
        header.push_record(
            format!("##contig=<ID={},length={}>", self.contig, self.contig_length).as_bytes(),
        );
        header.push_record(
            br#"##INFO=<ID=CALL,Number=1,Type=String,Description="Consensus base call after damage correction">"#,
        );
        header.push_record(
            br#"##INFO=<ID=FREQ,Number=1,Type=Float,Description="Weighted frequency of the called base, -1 when no call was made">"#,
        );
        header.push_record(
            br#"##INFO=<ID=DMG,Number=1,Type=String,Description="Damage pattern detected at this position (none, CT or GA)">"#,
        );
        header.push_record(
            br#"##FORMAT=<ID=AD,Number=R,Type=Integer,Description="Allelic depths for the ref and alt alleles in the order listed">"#,
        );
        header.push_record(
            br#"##FORMAT=<ID=DP,Number=1,Type=Integer,Description="Read depth before damage correction">"#,
        );
        for (key, value) in [
            ("correction", self.config.correction.to_string()),
            ("detection", self.config.detection.to_string()),
            ("min_coverage", self.config.min_coverage.to_string()),
            ("min_frequency", self.config.min_frequency.to_string()),
        ] {
            header.push_record(format!("##damcon_{}={}", key, value).as_bytes());
        }
        header.push_sample(self.sample.as_bytes());
        header
    }
}

pub struct VcfWriter {
    writer: bcf::Writer,
    rid: u32,
    corrected_only: bool,
    records: u64,
}

impl VcfWriter {
    /// Create `path` and write the header. `gzip` selects BGZF output.
    pub fn create<P: AsRef<Path>>(
        path: P,
        header: &VcfHeader,
        gzip: bool,
        threads: usize,
        corrected_only: bool,
    ) -> Result<Self> {
        let mut writer = bcf::Writer::from_path(path, &header.build(), !gzip, Format::Vcf)?;
        if gzip && threads > 1 {
            writer.set_threads(threads)?;
        }
        let rid = writer.header().name2rid(header.contig.as_bytes())?;
        Ok(Self {
            writer,
            rid,
            corrected_only,
            records: 0,
        })
    }

    pub fn records(&self) -> u64 {
        self.records
    }
}

/// Two decimals, matching the report table.
#[inline]
fn round_frequency(frequency: f64) -> f32 {
    ((frequency * 100.0).round() / 100.0) as f32
}

impl PositionSink for VcfWriter {
    fn accept(&mut self, position: &ReconstructedPosition) -> Result<()> {
        if position.key.is_insertion() || (self.corrected_only && !position.is_corrected()) {
            return Ok(());
        }
        let alleles = &position.corrected_alleles;
        let allele_bytes: Vec<[u8; 1]> = alleles
            .alleles()
            .iter()
            .map(|base| [base.as_char() as u8])
            .collect();
        let allele_refs: Vec<&[u8]> = allele_bytes.iter().map(|a| &a[..]).collect();
        let depths: Vec<i32> = alleles.counts().iter().map(|&c| c as i32).collect();
        let call = position.call.base.to_string();
        let pattern = position.pattern.to_string();

        let mut record = self.writer.empty_record();
        record.set_rid(Some(self.rid));
        record.set_pos(position.key.coordinate as i64 - 1);
        record.set_qual(f32::missing());
        record.set_alleles(&allele_refs)?;
        record.push_info_string(b"CALL", &[call.as_bytes()])?;
        record.push_info_float(b"FREQ", &[round_frequency(position.call.frequency)])?;
        record.push_info_string(b"DMG", &[pattern.as_bytes()])?;
        record.push_format_integer(b"AD", &depths)?;
        record.push_format_integer(b"DP", &[position.raw_coverage as i32])?;
        self.writer.write(&record)?;
        self.records += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{CorrectionMode, DetectionMode};
    use crate::output::test_support::{corrected_position, position};
    use crate::position::{Base, PositionKey};
    use std::fs;

    fn config() -> PipelineConfig {
        PipelineConfig {
            correction: CorrectionMode::Weight,
            detection: DetectionMode::ReferenceBased,
            min_coverage: 3,
            min_frequency: 0.8,
        }
    }

    fn header(config: &PipelineConfig) -> VcfHeader<'_> {
        VcfHeader {
            contig: "chrM",
            contig_length: 16569,
            sample: "ind1_wc-upvote",
            config,
        }
    }

    fn body(text: &str) -> Vec<&str> {
        text.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn writes_header_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf");
        let config = config();
        let mut writer = VcfWriter::create(&path, &header(&config), false, 1, false).unwrap();
        writer
            .accept(&position(PositionKey::reference(1), Base::G, Base::G))
            .unwrap();
        writer.accept(&corrected_position(2, 12.5, 2.5)).unwrap();
        writer
            .accept(&position(PositionKey::reference(3), Base::A, Base::N))
            .unwrap();
        writer
            .accept(&position(PositionKey::new(3, 1), Base::N, Base::T))
            .unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.records(), 3);
        drop(writer);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("##fileformat=VCFv4.2\n"));
        assert!(text.contains("##contig=<ID=chrM,length=16569>\n"));
        assert!(text.contains("##damcon_correction=weight\n"));
        assert!(text.contains("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tind1_wc-upvote\n"));

        assert_eq!(
            body(&text),
            vec![
                "chrM\t1\t.\tG\t.\t.\t.\tCALL=G;FREQ=1;DMG=none\tAD:DP\t1:1",
                "chrM\t2\t.\tC\tT\t.\t.\tCALL=C;FREQ=0.83;DMG=CT\tAD:DP\t13,3:15",
                "chrM\t3\t.\tA\t.\t.\t.\tCALL=N;FREQ=-1;DMG=none\tAD:DP\t0:0",
            ]
        );
    }

    #[test]
    fn corrected_only_skips_untouched_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf");
        let config = config();
        let mut writer = VcfWriter::create(&path, &header(&config), false, 1, true).unwrap();
        writer
            .accept(&position(PositionKey::reference(1), Base::G, Base::G))
            .unwrap();
        writer.accept(&corrected_position(2, 10.0, 0.0)).unwrap();
        assert_eq!(writer.records(), 1);
        drop(writer);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(body(&text), vec!["chrM\t2\t.\tC\t.\t.\t.\tCALL=C;FREQ=1;DMG=CT\tAD:DP\t10:15"]);
    }

    #[test]
    fn gzip_output_reads_back_through_htslib() {
        use rust_htslib::bcf::Read;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf.gz");
        let config = config();
        let mut writer = VcfWriter::create(&path, &header(&config), true, 1, false).unwrap();
        writer.accept(&corrected_position(7, 12.5, 2.5)).unwrap();
        drop(writer);

        let mut reader = bcf::Reader::from_path(&path).unwrap();
        let records: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pos(), 6);
        let alleles: Vec<&[u8]> = records[0].alleles();
        assert_eq!(alleles, vec![&b"C"[..], &b"T"[..]]);
    }
}
