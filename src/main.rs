//! DAMCON - damage-aware consensus reconstruction for ancient DNA
//!
//! DAMCON rebuilds the consensus sequence of a single reference contig from
//! coordinate-sorted alignments. Cytosine deamination (C→T on forward reads,
//! G→A on reverse reads) is detected per position and either masked or
//! down-weighted with per-read-group damage profiles before calling.
//!
//! # Tools
//!
//! - `call`: consensus FASTA, VCF, correction report and regions of interest
//!
//! # Usage
//!
//! ```bash
//! # Plain consensus without damage correction
//! damcon call --bam ind1.bam --reference chrM.fa --output out
//!
//! # Reference-free detection with profile-based weighting
//! damcon call --bam ind1.bam --reference chrM.fa --output out \
//!     --mode weight --detection free --dp5 5pCtoT_freq.txt --dp3 3pGtoA_freq.txt
//! ```

extern crate damcon_lib;
pub mod commands;
use anyhow::Result;
use damcon_lib::core::errors::is_broken_pipe;
use env_logger::Env;
use log::*;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(rename_all = "kebab-case", author, about)]
/// Damage-aware consensus calling for ancient DNA
struct Args {
    #[structopt(subcommand)]
    subcommand: Subcommand,
}

#[derive(StructOpt)]
enum Subcommand {
    /// Reconstruct the consensus and call variants with damage correction
    Call(commands::CallArgs),
}

impl Subcommand {
    fn run(self) -> Result<()> {
        match self {
            Subcommand::Call(args) => commands::run_call(args)?,
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = Args::from_args().subcommand.run() {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
