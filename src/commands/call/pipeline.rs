use anyhow::{Context, Result};
use damcon_lib::call::{PipelineConfig, PositionPipeline};
use damcon_lib::core::io::open_output;
use damcon_lib::damage::profile::DamageProfileTable;
use damcon_lib::engine::{PositionSink, Reconstructor, RunSummary};
use damcon_lib::output::fasta::ConsensusFastaWriter;
use damcon_lib::output::report::CorrectionReport;
use damcon_lib::output::roi::RoiWriter;
use damcon_lib::output::vcf::{VcfHeader, VcfWriter};
use damcon_lib::output::OutputLayout;
use damcon_lib::reference::Reference;
use damcon_lib::stream::ReadStream;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;

use super::args::ProfileSource;

const COMPRESSION_LEVEL: u32 = 6;

type OutputWriter = Box<dyn Write>;

/// Load the damage profiles a weighting run needs.
pub fn load_profiles(source: Option<&ProfileSource>) -> Result<Option<Arc<DamageProfileTable>>> {
    let table = match source {
        None => return Ok(None),
        Some(ProfileSource::Pair { dp5, dp3 }) => DamageProfileTable::from_profile_pair(dp5, dp3)
            .with_context(|| {
                format!(
                    "Failed to load damage profiles {} / {}",
                    dp5.display(),
                    dp3.display()
                )
            })?,
        Some(ProfileSource::Table(path)) => DamageProfileTable::from_table(path)
            .with_context(|| format!("Failed to load damage profile table {}", path.display()))?,
    };
    info!(
        "Damage profiles ready: {} read group(s){}",
        table.len(),
        if table.has_default() {
            " with a default"
        } else {
            ""
        }
    );
    Ok(Some(Arc::new(table)))
}

/// The writers of one run, opened up front so path problems surface before
/// the scan starts.
///
/// Each writer fills a hidden sibling of its final path. [`OutputSet::commit`]
/// renames them into place; dropping the set instead removes them, so a
/// failed run leaves no partial files behind.
pub struct OutputSet {
    layout: OutputLayout,
    fasta: ConsensusFastaWriter<OutputWriter>,
    vcf: VcfWriter,
    report: CorrectionReport<OutputWriter>,
    roi: Option<RoiWriter<OutputWriter>>,
    // Declared last: writers close before their files are removed.
    staged: Vec<(TempPath, PathBuf)>,
}

impl OutputSet {
    pub fn create(
        layout: OutputLayout,
        reference: &Reference,
        config: &PipelineConfig,
        corrected_only: bool,
        threads: usize,
    ) -> Result<Self> {
        let mut staged = Vec::new();

        let fasta_path = stage(&layout.fasta(), &mut staged)?;
        let fasta = ConsensusFastaWriter::new(open(&fasta_path, &layout, threads)?, layout.stem())?;

        let header = VcfHeader {
            contig: reference.contig(),
            contig_length: reference.len(),
            sample: layout.stem(),
            config,
        };
        let vcf_path = stage(&layout.vcf(), &mut staged)?;
        let vcf = VcfWriter::create(&vcf_path, &header, layout.gzip(), threads, corrected_only)
            .with_context(|| format!("Failed to create {}", layout.vcf().display()))?;

        let report_path = stage(&layout.report(), &mut staged)?;
        let report = CorrectionReport::new(
            open(&report_path, &layout, threads)?,
            reference.contig(),
            !config.correction.is_enabled(),
        );

        let roi = if config.correction.is_enabled() {
            let roi_path = stage(&layout.roi(), &mut staged)?;
            Some(RoiWriter::new(
                open(&roi_path, &layout, threads)?,
                reference.contig(),
                reference.len(),
            )?)
        } else {
            None
        };

        Ok(Self {
            layout,
            fasta,
            vcf,
            report,
            roi,
            staged,
        })
    }

    /// Every writer as a sink, in a fixed order.
    pub fn sinks(&mut self) -> Vec<&mut dyn PositionSink> {
        let mut sinks: Vec<&mut dyn PositionSink> =
            vec![&mut self.fasta, &mut self.vcf, &mut self.report];
        if let Some(roi) = self.roi.as_mut() {
            sinks.push(roi);
        }
        sinks
    }

    /// Paths of the files this set writes once committed.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.layout.fasta(), self.layout.vcf(), self.layout.report()];
        if self.roi.is_some() {
            paths.push(self.layout.roi());
        }
        paths
    }

    pub fn log(&self) {
        info!(
            "Wrote {} consensus bases, {} VCF record(s), {} report row(s)",
            self.fasta.len(),
            self.vcf.records(),
            self.report.rows()
        );
        if let Some(roi) = &self.roi {
            info!("Wrote {} region(s) of interest", roi.regions());
        }
        for path in self.paths() {
            info!("  -> {}", path.display());
        }
    }

    /// Close every writer and move the staged files to their final paths.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let OutputSet {
            fasta,
            vcf,
            report,
            roi,
            staged,
            ..
        } = self;
        drop((fasta, vcf, report, roi));

        let mut committed = Vec::with_capacity(staged.len());
        for (temp, target) in staged {
            temp.persist(&target)
                .with_context(|| format!("Failed to move output into {}", target.display()))?;
            committed.push(target);
        }
        Ok(committed)
    }
}

/// Reserve a hidden temporary file next to `target`.
fn stage(target: &Path, staged: &mut Vec<(TempPath, PathBuf)>) -> Result<PathBuf> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::Builder::new()
        .prefix(".damcon-")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create a staging file for {}", target.display()))?
        .into_temp_path();
    let path = temp.to_path_buf();
    staged.push((temp, target.to_path_buf()));
    Ok(path)
}

fn open(path: &Path, layout: &OutputLayout, threads: usize) -> Result<OutputWriter> {
    open_output(path, layout.gzip(), threads, COMPRESSION_LEVEL)
        .with_context(|| format!("Failed to create {}", path.display()))
}

/// Scan the stream once and feed every output.
pub fn reconstruct<S: ReadStream>(
    reference: &Reference,
    pipeline: &PositionPipeline,
    stream: &mut S,
    outputs: &mut OutputSet,
    threads: usize,
) -> Result<RunSummary> {
    let mut sinks = outputs.sinks();
    let summary = Reconstructor::new(reference, pipeline)
        .with_parallel(threads > 1)
        .run(stream, &mut sinks)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use damcon_lib::core::error::Result as LibResult;
    use damcon_lib::damage::{CorrectionMode, DetectionMode};
    use damcon_lib::position::Strand;
    use damcon_lib::stream::segment::AlignedSegment;
    use std::fs;

    fn config(correction: CorrectionMode) -> PipelineConfig {
        PipelineConfig {
            correction,
            detection: DetectionMode::ReferenceBased,
            min_coverage: 2,
            min_frequency: 0.6,
        }
    }

    fn reads() -> Vec<LibResult<AlignedSegment>> {
        vec![
            AlignedSegment::from_cigar_str(1, b"ACCT", "4M", Strand::Forward, None),
            AlignedSegment::from_cigar_str(1, b"ACTT", "4M", Strand::Forward, None),
            AlignedSegment::from_cigar_str(2, b"CTTA", "4M", Strand::Forward, None),
        ]
    }

    #[test]
    fn writes_every_output_for_a_silencing_run() {
        let dir = tempfile::tempdir().unwrap();
        let reference = Reference::new("chrT", b"ACCTAG");
        let config = config(CorrectionMode::Silence);
        let pipeline = PositionPipeline::new(config, None).unwrap();
        let layout = OutputLayout::new(dir.path(), "ind1", config.correction, false);

        let mut outputs = OutputSet::create(layout, &reference, &config, false, 1).unwrap();
        let mut stream = reads().into_iter();
        let summary = reconstruct(&reference, &pipeline, &mut stream, &mut outputs, 1).unwrap();
        assert_eq!(summary.positions, 6);
        let paths = outputs.paths();
        let committed = outputs.commit().unwrap();

        assert_eq!(committed, paths);
        assert_eq!(paths.len(), 4);
        for path in &paths {
            assert!(path.exists(), "{} missing", path.display());
        }

        let fasta = fs::read_to_string(dir.path().join("ind1_silence-dam.fasta")).unwrap();
        assert_eq!(fasta, ">ind1_silence-dam\nACCTNN\n");

        let report = fs::read_to_string(dir.path().join("ind1_silence-dam.report.tsv")).unwrap();
        let rows: Vec<&str> = report.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("chrT\t3\tC\t3\t"));

        let bed = fs::read_to_string(dir.path().join("ind1_silence-dam.bed")).unwrap();
        assert!(bed.ends_with("chrT\t0\t5\tCORRECTED_POS:3\n"));
    }

    #[test]
    fn uncorrected_runs_skip_the_roi_file() {
        let dir = tempfile::tempdir().unwrap();
        let reference = Reference::new("chrT", b"ACCTAG");
        let config = config(CorrectionMode::None);
        let layout = OutputLayout::new(dir.path(), "ind1", config.correction, true);

        let outputs = OutputSet::create(layout, &reference, &config, false, 1).unwrap();
        let paths = outputs.paths();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| p.to_string_lossy().ends_with(".gz")));
        outputs.commit().unwrap();
        assert!(paths.iter().all(|p| p.exists()));
        assert!(!dir.path().join("ind1_no-cor.bed.gz").exists());
    }

    #[test]
    fn failed_scan_leaves_no_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let reference = Reference::new("chrT", b"ACCTAGACCTAG");
        let config = config(CorrectionMode::Silence);
        let pipeline = PositionPipeline::new(config, None).unwrap();
        let layout = OutputLayout::new(dir.path(), "ind1", config.correction, false);

        let mut outputs = OutputSet::create(layout, &reference, &config, false, 1).unwrap();
        let mut stream = vec![
            AlignedSegment::from_cigar_str(1, b"ACCT", "4M", Strand::Forward, None),
            AlignedSegment::from_cigar_str(8, b"CCTA", "4M", Strand::Forward, None),
            AlignedSegment::from_cigar_str(2, b"CCTA", "4M", Strand::Forward, None),
        ]
        .into_iter();
        let err = reconstruct(&reference, &pipeline, &mut stream, &mut outputs, 1).unwrap_err();
        assert!(err.to_string().contains("not coordinate-sorted"));
        drop(outputs);

        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
    }

    #[test]
    fn profiles_are_only_loaded_on_request() {
        assert!(load_profiles(None).unwrap().is_none());

        let dir = tempfile::tempdir().unwrap();
        let dp5 = dir.path().join("5p.txt");
        let dp3 = dir.path().join("3p.txt");
        fs::write(&dp5, "pos\tC>T\n1\t0.3\n2\t0.1\n").unwrap();
        fs::write(&dp3, "pos\tG>A\n1\t0.2\n").unwrap();

        let source = ProfileSource::Pair { dp5, dp3 };
        let table = load_profiles(Some(&source)).unwrap().unwrap();
        assert!(table.has_default());

        let missing = ProfileSource::Table(dir.path().join("absent.tsv"));
        assert!(load_profiles(Some(&missing)).is_err());
    }
}
