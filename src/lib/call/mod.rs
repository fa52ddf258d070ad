//! Consensus and variant calling for one position at a time.
//!
//! - [`frequency`]: weighted A/C/G/T distribution
//! - [`consensus`]: coverage and frequency thresholds
//! - [`alleles`]: reference-first allele/depth lists
//! - [`config`]: the immutable run configuration
//! - [`pipeline`]: classify → correct → call → tabulate

pub mod alleles;
pub mod config;
pub mod consensus;
pub mod frequency;
pub mod pipeline;

pub use alleles::AlleleCounts;
pub use config::PipelineConfig;
pub use consensus::{ConsensusCall, ConsensusCaller, NO_CALL_FREQUENCY};
pub use frequency::BaseFrequencyTable;
pub use pipeline::{PositionPipeline, ReconstructedPosition};
