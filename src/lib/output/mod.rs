//! Result writers.
//!
//! Every writer is a [`PositionSink`](crate::engine::PositionSink). The
//! FASTA, report and BED writers wrap any `Write` target; the VCF goes
//! through htslib and owns its file.
//!
//! - [`fasta`]: consensus sequence
//! - [`vcf`]: per-position variant records
//! - [`report`]: correction report table
//! - [`roi`]: regions of interest around corrected positions

pub mod fasta;
pub mod report;
pub mod roi;
pub mod vcf;

use std::path::{Path, PathBuf};

use crate::core::fs::ensure_gz_path;
use crate::damage::CorrectionMode;

/// File names of one run: `<sample>_<mode>.<ext>`, optionally gzipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    stem: String,
    gzip: bool,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(dir: P, sample: &str, mode: CorrectionMode, gzip: bool) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stem: record_name(sample, mode),
            gzip,
        }
    }

    /// Name used for the FASTA header and the VCF sample column.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn gzip(&self) -> bool {
        self.gzip
    }

    pub fn fasta(&self) -> PathBuf {
        self.path("fasta")
    }

    pub fn vcf(&self) -> PathBuf {
        self.path("vcf")
    }

    pub fn report(&self) -> PathBuf {
        self.path("report.tsv")
    }

    pub fn roi(&self) -> PathBuf {
        self.path("bed")
    }

    fn path(&self, extension: &str) -> PathBuf {
        let path = self.dir.join(format!("{}.{}", self.stem, extension));
        if self.gzip {
            ensure_gz_path(&path)
        } else {
            path
        }
    }
}

/// `<sample>_<mode short name>`
pub fn record_name(sample: &str, mode: CorrectionMode) -> String {
    format!("{}_{}", sample, mode.short_name())
}
