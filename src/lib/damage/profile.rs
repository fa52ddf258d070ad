//! Empirical damage profiles and their projection onto reads.
//!
//! A profile holds two probability curves: one indexed from the read's 5′ end
//! and one whose last value sits at the read's 3′ end. Profiles are loaded once
//! per run and shared read-only between workers.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::core::error::{DamconError, Result};
use crate::core::io::get_reader;
use crate::position::Strand;

/// Read group used when reads carry no `RG` tag, and the fallback for groups
/// without a profile of their own.
pub const DEFAULT_READ_GROUP: &str = "default";

/// 5′ and 3′ deamination probability curves for one read group.
#[derive(Debug, Clone, PartialEq)]
pub struct DamageProfile {
    five_prime: Vec<f64>,
    three_prime: Vec<f64>,
}

impl DamageProfile {
    /// Build a profile, rejecting probabilities outside `[0, 1]`.
    pub fn new(five_prime: Vec<f64>, three_prime: Vec<f64>) -> Result<Self> {
        for (field, values) in [("dp5", &five_prime), ("dp3", &three_prime)] {
            if let Some(&bad) = values
                .iter()
                .find(|v| !v.is_finite() || **v < 0.0 || **v > 1.0)
            {
                return Err(DamconError::ThresholdValidation {
                    field: field.to_string(),
                    min: 0.0,
                    max: 1.0,
                    value: bad,
                });
            }
        }
        Ok(Self {
            five_prime,
            three_prime,
        })
    }

    /// The same probability at every offset of both curves.
    pub fn flat(probability: f64, length: usize) -> Result<Self> {
        Self::new(vec![probability; length], vec![probability; length])
    }

    pub fn five_prime(&self) -> &[f64] {
        &self.five_prime
    }

    pub fn three_prime(&self) -> &[f64] {
        &self.three_prime
    }

    /// Per-offset damage probabilities for a read of `read_length` bases.
    ///
    /// The 5′ curve fills the read from the left for at most half of it
    /// (rounded up), the 3′ curve fills the rest from the right, and anything
    /// in between is zero. Reverse-strand reads use the reversed 3′ curve in
    /// the first role and the reversed 5′ curve in the second.
    pub fn map_to_read(&self, read_length: usize, strand: Strand) -> Vec<f64> {
        (0..read_length)
            .map(|offset| self.probability_at(offset, read_length, strand))
            .collect()
    }

    /// Single entry of [`map_to_read`](Self::map_to_read), without building
    /// the vector. Offsets past the end of the read have probability zero.
    pub fn probability_at(&self, offset: usize, read_length: usize, strand: Strand) -> f64 {
        if offset >= read_length {
            return 0.0;
        }
        match strand {
            Strand::Forward => fill_value(
                offset,
                read_length,
                self.five_prime.len(),
                |i| self.five_prime[i],
                self.three_prime.len(),
                |i| self.three_prime[i],
            ),
            Strand::Reverse => {
                let n5 = self.five_prime.len();
                let n3 = self.three_prime.len();
                fill_value(
                    offset,
                    read_length,
                    n3,
                    |i| self.three_prime[n3 - 1 - i],
                    n5,
                    |i| self.five_prime[n5 - 1 - i],
                )
            }
        }
    }
}

/// Value at `offset` of a length-`len` vector filled with `head` from the left
/// and `tail` from the right.
#[inline]
fn fill_value<H, T>(
    offset: usize,
    len: usize,
    head_len: usize,
    head: H,
    tail_len: usize,
    tail: T,
) -> f64
where
    H: Fn(usize) -> f64,
    T: Fn(usize) -> f64,
{
    let k5 = len.div_ceil(2).min(head_len);
    if offset < k5 {
        return head(offset);
    }
    let k3 = (len - k5).min(tail_len);
    if offset >= len - k3 {
        tail(tail_len + offset - len)
    } else {
        0.0
    }
}

/// Damage profiles keyed by read group, with an optional fallback.
#[derive(Debug, Clone, Default)]
pub struct DamageProfileTable {
    profiles: FxHashMap<String, DamageProfile>,
    default: Option<DamageProfile>,
}

impl DamageProfileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile. The group named [`DEFAULT_READ_GROUP`] becomes the
    /// fallback.
    pub fn insert(&mut self, read_group: impl Into<String>, profile: DamageProfile) {
        let read_group = read_group.into();
        if read_group == DEFAULT_READ_GROUP {
            self.default = Some(profile);
        } else {
            self.profiles.insert(read_group, profile);
        }
    }

    pub fn with_default(mut self, profile: DamageProfile) -> Self {
        self.default = Some(profile);
        self
    }

    /// Number of profiles, the fallback included.
    pub fn len(&self) -> usize {
        self.profiles.len() + usize::from(self.default.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Profile for a read group: its own if registered, else the fallback.
    pub fn lookup(&self, read_group: Option<&str>) -> Option<&DamageProfile> {
        read_group
            .and_then(|rg| self.profiles.get(rg))
            .or(self.default.as_ref())
    }

    /// Like [`lookup`](Self::lookup) but a missing profile is an error.
    pub fn resolve(&self, read_group: Option<&str>) -> Result<&DamageProfile> {
        self.lookup(read_group)
            .ok_or_else(|| DamconError::MissingProfile {
                read_group: read_group.unwrap_or(DEFAULT_READ_GROUP).to_string(),
            })
    }

    /// Check that every read group declared by the input resolves to a
    /// profile. Run before scanning so a gap never surfaces mid-run.
    pub fn validate_read_groups<S: AsRef<str>>(&self, read_groups: &[S]) -> Result<()> {
        if self.is_empty() {
            return Err(DamconError::Config(
                "weighting requires at least one damage profile".to_string(),
            ));
        }
        if read_groups.is_empty() && self.default.is_none() {
            // Untagged reads can only use the fallback.
            return Err(DamconError::MissingProfile {
                read_group: DEFAULT_READ_GROUP.to_string(),
            });
        }
        for rg in read_groups {
            let rg = rg.as_ref();
            if !self.profiles.contains_key(rg) {
                if self.default.is_none() {
                    return Err(DamconError::MissingProfile {
                        read_group: rg.to_string(),
                    });
                }
                debug!("Read group {} falls back to the default damage profile", rg);
            }
        }
        Ok(())
    }

    /// Single 5′/3′ pair used for every read.
    pub fn from_profile_pair<P: AsRef<Path>, Q: AsRef<Path>>(dp5: P, dp3: Q) -> Result<Self> {
        let profile = DamageProfile::new(
            parse_profile_file(dp5.as_ref())?,
            parse_profile_file(dp3.as_ref())?,
        )?;
        info!(
            "Loaded default damage profile ({} 5' / {} 3' values)",
            profile.five_prime.len(),
            profile.three_prime.len()
        );
        Ok(Self::new().with_default(profile))
    }

    /// Read-group table: one `read_group  dp5_path  dp3_path` row per group.
    /// Relative profile paths are taken relative to the table itself.
    pub fn from_table<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        ensure_exists(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut table = Self::new();
        let mut reader = get_reader(path, false)?;
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < 3 {
                return Err(DamconError::Parse(format!(
                    "{}: row {} needs read_group, dp5 and dp3 columns",
                    path.display(),
                    line + 1
                )));
            }
            let read_group = record[0].trim();
            let dp5 = resolve_relative(&base_dir, record[1].trim());
            let dp3 = resolve_relative(&base_dir, record[2].trim());

            let profile = DamageProfile::new(parse_profile_file(&dp5)?, parse_profile_file(&dp3)?)?;
            if table.profiles.contains_key(read_group) {
                warn!(
                    "Read group {} listed twice in {}; keeping the last",
                    read_group,
                    path.display()
                );
            }
            table.insert(read_group, profile);
        }

        if table.is_empty() {
            return Err(DamconError::EmptyData(format!(
                "no damage profiles listed in {}",
                path.display()
            )));
        }
        info!(
            "Loaded {} damage profile(s) from {}{}",
            table.len(),
            path.display(),
            if table.has_default() { " (with default)" } else { "" }
        );
        Ok(table)
    }
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(DamconError::FileNotFound(format!(
            "Damage profile file not found: {}",
            path.display()
        )))
    }
}

fn resolve_relative(base_dir: &Path, entry: &str) -> PathBuf {
    let candidate = Path::new(entry);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}

/// Parse one profile TSV. The header names the columns; values come from the
/// `C>T` (or `G>A`) column, falling back to the second column.
pub fn parse_profile_file(path: &Path) -> Result<Vec<f64>> {
    ensure_exists(path)?;
    let mut reader = get_reader(path, true)?;
    let headers = reader.headers()?.clone();
    let column = headers
        .iter()
        .position(|h| h.contains("C>T") || h.contains("G>A"))
        .unwrap_or(if headers.len() > 1 { 1 } else { 0 });

    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = record.get(column).map(str::trim).unwrap_or("");
        let value: f64 = field.parse().map_err(|_| {
            DamconError::Parse(format!(
                "{}: row {} has no numeric value in column {} ('{}')",
                path.display(),
                row + 2,
                column + 1,
                field
            ))
        })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(DamconError::EmptyData(format!(
            "damage profile {} has no values",
            path.display()
        )));
    }
    debug!("Parsed {} damage values from {}", values.len(), path.display());
    Ok(values)
}
