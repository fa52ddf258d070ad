//! Damage-aware consensus calling.
//!
//! One pass over a coordinate-sorted BAM produces the consensus FASTA, a VCF,
//! the correction report and, when correction is enabled, a BED of regions
//! around corrected positions.

mod args;
mod pipeline;

use anyhow::{Context, Result};
use damcon_lib::call::PositionPipeline;
use damcon_lib::core::fs::make_parent_dirs;
use damcon_lib::core::read_filter::DefaultReadFilter;
use damcon_lib::damage::CorrectionMode;
use damcon_lib::output::OutputLayout;
use damcon_lib::reference::Reference;
use damcon_lib::stream::bam::BamReadStream;
use log::info;

use crate::commands::common;

pub use args::{CallArgs, CallConfig};
use pipeline::{load_profiles, reconstruct, OutputSet};

/// Execute the `call` command end-to-end.
pub fn run_call(args: CallArgs) -> Result<()> {
    let config: CallConfig = args.into();

    info!("Running damcon call on {:?}", config.bam);
    config.log();
    config.validate()?;

    if config.dry_run {
        info!("Dry run complete, inputs and settings are valid");
        return Ok(());
    }

    let threads = common::configure_global_thread_pool(config.threads)?;

    let reference = Reference::load(&config.reference)?;
    info!(
        "Reference contig {} ({} bp)",
        reference.contig(),
        reference.len()
    );

    let source = config.profile_source()?;
    let profiles = load_profiles(source.as_ref())?;
    let pipeline_config = config.pipeline_config();
    let pipeline = PositionPipeline::new(pipeline_config, profiles.clone())?;

    let mut stream = BamReadStream::from_path(
        &config.bam,
        reference.contig(),
        DefaultReadFilter::new(config.min_mapq),
    )?;
    if config.mode == CorrectionMode::Weight {
        if let Some(profiles) = &profiles {
            profiles
                .validate_read_groups(stream.read_groups())
                .context("Damage profiles do not cover the BAM read groups")?;
        }
    }

    let layout = OutputLayout::new(&config.output, &config.sample, config.mode, config.gzip);
    make_parent_dirs(layout.fasta()).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.display()
        )
    })?;
    let mut outputs = OutputSet::create(
        layout,
        &reference,
        &pipeline_config,
        config.corrected_only,
        threads,
    )?;

    let summary = reconstruct(&reference, &pipeline, &mut stream, &mut outputs, threads)?;

    let stats = stream.stats();
    info!(
        "Alignments used: {}, filtered: {}, other contigs: {}",
        stats.yielded, stats.filtered, stats.other_contig
    );
    summary.log();
    outputs.log();
    outputs.commit()?;
    info!("Consensus calling complete -> {:?}", config.output);
    Ok(())
}
