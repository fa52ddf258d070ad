pub mod concurrency;
pub mod error;
pub mod errors;
pub mod fs;
pub mod io;
pub mod progress;
pub mod read_filter;

pub mod prelude {
    pub use super::concurrency::determine_allowed_cpus;
    pub use super::error::{DamconError, Result};
    pub use super::errors::is_broken_pipe;
    pub use super::fs::{ensure_gz_path, is_gzipped, make_parent_dirs};
    pub use super::io::{get_reader, open_input, open_output};
    pub use super::progress::ProgressTracker;
    pub use super::read_filter::{DefaultReadFilter, ReadFilter};
}
