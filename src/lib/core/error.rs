//! Error types for the damcon library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DamconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTSlib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Reference genome error: {0}")]
    ReferenceGenome(String),

    #[error("Threshold validation error: {field} must be between {min} and {max}, got {value}")]
    ThresholdValidation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No damage profile available for read group '{read_group}' and no default profile was given")]
    MissingProfile { read_group: String },

    #[error("Input is not coordinate-sorted: position {current} seen after {previous}")]
    UnsortedInput { previous: u64, current: u64 },

    #[error("Empty data: {0}")]
    EmptyData(String),
}

pub type Result<T> = std::result::Result<T, DamconError>;
