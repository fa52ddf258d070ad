//! Deamination damage detection and correction.
//!
//! Ancient DNA accumulates cytosine deamination near fragment ends. On reads
//! mapped to the forward strand it appears as C→T, on reverse-mapped reads as
//! the complementary G→A. This module decides whether a position shows that
//! signature and rewrites its observations accordingly.
//!
//! - [`profile`]: per read-group damage probability curves
//! - [`classifier`]: [`DamagePattern`] detection strategies
//! - [`corrector`]: silencing and weighting strategies

pub mod classifier;
pub mod corrector;
pub mod profile;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::position::{Base, Strand};

/// Damage signature detected at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DamagePattern {
    None,
    /// C→T on forward-strand reads.
    ForwardCT,
    /// G→A on reverse-strand reads.
    ReverseGA,
}

impl DamagePattern {
    /// The (strand, base) pair an observation must show to be suspect.
    pub fn suspect(&self) -> Option<(Strand, Base)> {
        match self {
            DamagePattern::None => None,
            DamagePattern::ForwardCT => Some((Strand::Forward, Base::T)),
            DamagePattern::ReverseGA => Some((Strand::Reverse, Base::A)),
        }
    }

    /// The undamaged base a suspect observation most likely stood for.
    pub fn original_base(&self) -> Option<Base> {
        match self {
            DamagePattern::None => None,
            DamagePattern::ForwardCT => Some(Base::C),
            DamagePattern::ReverseGA => Some(Base::G),
        }
    }

    #[inline]
    pub fn is_damaged(&self) -> bool {
        *self != DamagePattern::None
    }
}

impl fmt::Display for DamagePattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DamagePattern::None => write!(f, "none"),
            DamagePattern::ForwardCT => write!(f, "CT"),
            DamagePattern::ReverseGA => write!(f, "GA"),
        }
    }
}

/// How suspect observations are treated once a pattern is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMode {
    None,
    Silence,
    Weight,
}

impl CorrectionMode {
    /// Tag used in output file names and FASTA headers.
    pub fn short_name(&self) -> &'static str {
        match self {
            CorrectionMode::None => "no-cor",
            CorrectionMode::Silence => "silence-dam",
            CorrectionMode::Weight => "wc-upvote",
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        *self != CorrectionMode::None
    }
}

impl FromStr for CorrectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "no-cor" | "0" => Ok(CorrectionMode::None),
            "silence" | "silence-dam" | "1" => Ok(CorrectionMode::Silence),
            "weight" | "wc" | "wc-upvote" | "2" => Ok(CorrectionMode::Weight),
            _ => Err(format!(
                "Invalid correction mode: {}. Valid modes: none, silence, weight",
                s
            )),
        }
    }
}

impl fmt::Display for CorrectionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorrectionMode::None => write!(f, "none"),
            CorrectionMode::Silence => write!(f, "silence"),
            CorrectionMode::Weight => write!(f, "weight"),
        }
    }
}

/// Which classifier looks for damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    None,
    /// Requires the reference base to be C (or G).
    ReferenceBased,
    /// Looks only at the observed bases.
    ReferenceFree,
}

impl FromStr for DetectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "0" => Ok(DetectionMode::None),
            "based" | "reference-based" | "ref-based" | "1" => Ok(DetectionMode::ReferenceBased),
            "free" | "reference-free" | "ref-free" | "2" => Ok(DetectionMode::ReferenceFree),
            _ => Err(format!(
                "Invalid detection mode: {}. Valid modes: none, based, free",
                s
            )),
        }
    }
}

impl fmt::Display for DetectionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DetectionMode::None => write!(f, "none"),
            DetectionMode::ReferenceBased => write!(f, "based"),
            DetectionMode::ReferenceFree => write!(f, "free"),
        }
    }
}
