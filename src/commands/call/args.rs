use anyhow::{bail, Result};
use damcon_lib::call::PipelineConfig;
use damcon_lib::damage::{CorrectionMode, DetectionMode};
use log::info;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

/// CLI arguments for the `call` subcommand.
#[derive(Debug, Clone, StructOpt)]
#[structopt(author, name = "call")]
pub struct CallArgs {
    /// Coordinate-sorted BAM of reads mapped to a single contig.
    #[structopt(long, short = "b")]
    pub bam: PathBuf,

    /// Reference FASTA (plain or gzipped); the first record is used.
    #[structopt(long, short = "r")]
    pub reference: PathBuf,

    /// Output directory, created when missing.
    #[structopt(long, short = "o")]
    pub output: PathBuf,

    /// Damage correction: none, silence or weight.
    #[structopt(long, short = "m", default_value = "none")]
    pub mode: CorrectionMode,

    /// Damage detection: none, based (reference-based) or free (reference-free).
    #[structopt(long, short = "d", default_value = "based")]
    pub detection: DetectionMode,

    /// 5' damage profile (C>T substitution frequency per read offset).
    #[structopt(long)]
    pub dp5: Option<PathBuf>,

    /// 3' damage profile (G>A substitution frequency per read offset).
    #[structopt(long)]
    pub dp3: Option<PathBuf>,

    /// Per-read-group profile table: `read_group  dp5_path  dp3_path`.
    #[structopt(long = "dp-table")]
    pub dp_table: Option<PathBuf>,

    /// Minimum raw coverage for a consensus call.
    #[structopt(long, short = "c", default_value = "3")]
    pub min_coverage: u32,

    /// Minimum weighted frequency of the majority base for a consensus call.
    #[structopt(long = "min-freq", short = "f", default_value = "0.8")]
    pub min_freq: f64,

    /// Sample name used in output file names (defaults to the BAM file stem).
    #[structopt(long, short = "s")]
    pub sample_name: Option<String>,

    /// Minimum mapping quality for reads to be used.
    #[structopt(long, short = "q", default_value = "0")]
    pub min_mapq: u8,

    /// Number of worker threads to use.
    #[structopt(long, short = "t", default_value = "1")]
    pub threads: usize,

    /// Only write VCF records for corrected positions.
    #[structopt(long)]
    pub corrected_only: bool,

    /// Gzip every output file (`.gz` is appended).
    #[structopt(long, short = "z")]
    pub gzip: bool,

    /// Validate inputs and settings without processing.
    #[structopt(long)]
    pub dry_run: bool,
}

/// Where damage profiles come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    Pair { dp5: PathBuf, dp3: PathBuf },
    Table(PathBuf),
}

/// Normalised configuration derived from [`CallArgs`].
#[derive(Debug, Clone)]
pub struct CallConfig {
    pub bam: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
    pub sample: String,
    pub mode: CorrectionMode,
    pub detection: DetectionMode,
    pub dp5: Option<PathBuf>,
    pub dp3: Option<PathBuf>,
    pub dp_table: Option<PathBuf>,
    pub min_coverage: u32,
    pub min_freq: f64,
    pub min_mapq: u8,
    pub threads: usize,
    pub corrected_only: bool,
    pub gzip: bool,
    pub dry_run: bool,
}

impl From<CallArgs> for CallConfig {
    fn from(args: CallArgs) -> CallConfig {
        let sample = args
            .sample_name
            .unwrap_or_else(|| sample_from_path(&args.bam));
        CallConfig {
            bam: args.bam,
            reference: args.reference,
            output: args.output,
            sample,
            mode: args.mode,
            detection: args.detection,
            dp5: args.dp5,
            dp3: args.dp3,
            dp_table: args.dp_table,
            min_coverage: args.min_coverage,
            min_freq: args.min_freq,
            min_mapq: args.min_mapq,
            threads: args.threads,
            corrected_only: args.corrected_only,
            gzip: args.gzip,
            dry_run: args.dry_run,
        }
    }
}

/// File name without its extension, e.g. `ind1.sorted.bam` -> `ind1.sorted`.
fn sample_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("sample")
        .to_string()
}

impl CallConfig {
    #[inline]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            correction: self.mode,
            detection: self.detection,
            min_coverage: self.min_coverage,
            min_frequency: self.min_freq,
        }
    }

    /// Damage profiles this run needs. Only weighting reads them; other modes
    /// ignore any profiles passed.
    pub fn profile_source(&self) -> Result<Option<ProfileSource>> {
        if self.mode != CorrectionMode::Weight {
            if self.dp5.is_some() || self.dp3.is_some() || self.dp_table.is_some() {
                log::warn!(
                    "Damage profiles are only used by weight correction; ignoring them in {} mode",
                    self.mode
                );
            }
            return Ok(None);
        }

        match (&self.dp5, &self.dp3, &self.dp_table) {
            (Some(dp5), Some(dp3), None) => Ok(Some(ProfileSource::Pair {
                dp5: dp5.clone(),
                dp3: dp3.clone(),
            })),
            (None, None, Some(table)) => Ok(Some(ProfileSource::Table(table.clone()))),
            (None, None, None) => {
                bail!("Weight correction needs damage profiles: pass --dp5 and --dp3, or --dp-table")
            }
            (_, _, Some(_)) => bail!("--dp-table cannot be combined with --dp5/--dp3"),
            _ => bail!("--dp5 and --dp3 must be given together"),
        }
    }

    /// Check settings and input files before any alignment is read.
    pub fn validate(&self) -> Result<()> {
        self.pipeline_config().validate()?;
        if self.threads == 0 {
            bail!("Too few threads selected. Min 1");
        }

        for (label, path) in [("BAM", &self.bam), ("Reference", &self.reference)] {
            if !path.exists() {
                bail!("{} file not found: {}", label, path.display());
            }
        }

        if let Some(source) = self.profile_source()? {
            let paths: Vec<&PathBuf> = match &source {
                ProfileSource::Pair { dp5, dp3 } => vec![dp5, dp3],
                ProfileSource::Table(table) => vec![table],
            };
            for path in paths {
                if !path.exists() {
                    bail!("Damage profile not found: {}", path.display());
                }
            }
        }

        if self.output.exists() && !self.output.is_dir() {
            bail!(
                "Output path {} exists and is not a directory",
                self.output.display()
            );
        }

        info!("Configuration validation passed");
        Ok(())
    }

    /// Log the run parameters.
    pub fn log(&self) {
        info!("BAM file:          {}", self.bam.display());
        info!("Reference file:    {}", self.reference.display());
        info!("Output directory:  {}", self.output.display());
        info!("Sample:            {}", self.sample);
        info!("Correction mode:   {} ({})", self.mode, self.mode.short_name());
        info!("Detection mode:    {}", self.detection);
        info!("Minimum coverage:  {}", self.min_coverage);
        info!("Minimum frequency: {}", self.min_freq);
        info!("Minimum MAPQ:      {}", self.min_mapq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CallArgs {
        let mut argv = vec!["call", "-b", "in/ind1.bam", "-r", "ref.fa", "-o", "out"];
        argv.extend_from_slice(extra);
        CallArgs::from_iter_safe(argv).unwrap()
    }

    #[test]
    fn defaults_follow_the_documented_values() {
        let config: CallConfig = args(&[]).into();
        assert_eq!(config.sample, "ind1");
        assert_eq!(config.mode, CorrectionMode::None);
        assert_eq!(config.detection, DetectionMode::ReferenceBased);
        assert_eq!(config.min_coverage, 3);
        assert_eq!(config.min_freq, 0.8);
        assert_eq!(config.threads, 1);
        assert!(!config.gzip);
    }

    #[test]
    fn modes_accept_short_aliases() {
        let config: CallConfig = args(&["-m", "wc-upvote", "-d", "free"]).into();
        assert_eq!(config.mode, CorrectionMode::Weight);
        assert_eq!(config.detection, DetectionMode::ReferenceFree);
        assert!(CallArgs::from_iter_safe(vec!["call", "-b", "a", "-r", "b", "-o", "c", "-m", "x"])
            .is_err());
    }

    #[test]
    fn weighting_requires_a_profile_source() {
        let config: CallConfig = args(&["-m", "weight"]).into();
        assert!(config.profile_source().is_err());

        let config: CallConfig = args(&["-m", "weight", "--dp5", "a.txt"]).into();
        assert!(config.profile_source().is_err());

        let config: CallConfig =
            args(&["-m", "weight", "--dp5", "a", "--dp3", "b", "--dp-table", "t"]).into();
        assert!(config.profile_source().is_err());

        let config: CallConfig = args(&["-m", "weight", "--dp-table", "t.tsv"]).into();
        assert_eq!(
            config.profile_source().unwrap(),
            Some(ProfileSource::Table(PathBuf::from("t.tsv")))
        );
    }

    #[test]
    fn profiles_are_ignored_without_weighting() {
        let config: CallConfig = args(&["-m", "silence", "--dp5", "a"]).into();
        assert_eq!(config.profile_source().unwrap(), None);
    }

    #[test]
    fn validation_reports_missing_inputs_and_bad_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let bam = dir.path().join("ind1.bam");
        let reference = dir.path().join("ref.fa");
        std::fs::write(&bam, b"").unwrap();
        std::fs::write(&reference, b">chrM\nACGT\n").unwrap();

        let mut config: CallConfig = args(&[]).into();
        assert!(config.validate().is_err());

        config.bam = bam;
        config.reference = reference;
        config.output = dir.path().join("out");
        config.validate().unwrap();

        config.min_freq = 1.5;
        assert!(config.validate().is_err());
    }
}
