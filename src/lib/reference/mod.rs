//! Single-contig reference sequence.
//!
//! The whole contig is held in memory: reconstruction walks every position
//! of it once, so random access through an index buys nothing.

use std::path::Path;

use bio::io::fasta;
use log::{info, warn};

use crate::core::error::{DamconError, Result};
use crate::core::io::open_input;
use crate::position::Base;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    contig: String,
    sequence: Vec<u8>,
}

impl Reference {
    /// Build a reference from a contig name and its bases.
    pub fn new(contig: impl Into<String>, sequence: &[u8]) -> Self {
        Self {
            contig: contig.into(),
            sequence: sequence.to_ascii_uppercase(),
        }
    }

    /// Load the first record of a plain or gzipped FASTA file.
    ///
    /// The contig name is the header up to the first whitespace. Further
    /// records are ignored with a warning.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DamconError::FileNotFound(format!(
                "Reference FASTA not found: {}",
                path.display()
            )));
        }

        let mut records = fasta::Reader::from_bufread(open_input(path)?).records();
        let first = records
            .next()
            .ok_or_else(|| {
                DamconError::ReferenceGenome(format!("{} contains no sequence", path.display()))
            })?
            .map_err(|e| {
                DamconError::ReferenceGenome(format!("Failed to parse {}: {}", path.display(), e))
            })?;
        first.check().map_err(|e| {
            DamconError::ReferenceGenome(format!("Invalid record in {}: {}", path.display(), e))
        })?;

        let skipped = records.count();
        if skipped > 0 {
            warn!(
                "{} holds {} more record(s); only {} is used",
                path.display(),
                skipped,
                first.id()
            );
        }

        let reference = Self::new(first.id(), first.seq());
        if reference.is_empty() {
            return Err(DamconError::ReferenceGenome(format!(
                "Contig {} in {} is empty",
                reference.contig,
                path.display()
            )));
        }
        info!(
            "Loaded reference contig {} ({} bp)",
            reference.contig,
            reference.len()
        );
        Ok(reference)
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.sequence.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Base at a 1-based coordinate; `N` outside the contig.
    #[inline]
    pub fn base_at(&self, coordinate: u64) -> Base {
        if coordinate == 0 {
            return Base::N;
        }
        self.sequence
            .get((coordinate - 1) as usize)
            .map_or(Base::N, |&b| Base::from_ascii(b))
    }
}
