//! DAMCON: damage-aware consensus reconstruction for ancient DNA
//!
//! DAMCON rebuilds a consensus sequence and per-position variant calls for a
//! single reference contig from coordinate-sorted alignments, detecting and
//! correcting cytosine deamination along the way.
//! The library provides functionality for:
//! 1. Streaming per-position pileups out of a sorted BAM file
//! 2. Detecting C→T / G→A damage signatures at each position
//! 3. Correcting them by masking or by profile-based down-weighting
//! 4. Calling consensus bases and writing FASTA, VCF, report and BED output
//!
//! # Modules
//!
//! The main modules are:
//! - [`stream`]: Aligned read sources (BAM via rust-htslib)
//! - [`position`]: Position keys, observations and the streaming accumulator
//! - [`damage`]: Damage profiles, classifiers and correctors
//! - [`call`]: Consensus calling and allele tabulation
//! - [`engine`]: The single-pass reconstruction driver
//! - [`reference`]: Reference contig loading
//! - [`output`]: Result writers
//! - [`core`]: Errors, I/O helpers, read filtering and progress logging

pub mod call;
pub mod core;
pub mod damage;
pub mod engine;
pub mod output;
pub mod position;
pub mod reference;
pub mod stream;
