//! Metric handlers.
//!
//! Each handler wraps one libvship handler of the matching kind:
//!
//! - **SSIMULACRA2** ([`Ssimu2Handler`]): higher is better, 100 = identical
//! - **Butteraugli** ([`ButteraugliHandler`]): lower is better, 0 = identical
//! - **CVVDP** ([`CvvdpHandler`]): temporal, in JOD, 10 = identical
//!
//! ## Perception Thresholds
//!
//! | Level | SSIMULACRA2 | Butteraugli | Description |
//! |-------|-------------|-------------|-------------|
//! | Imperceptible | > 90 | < 1.0 | Visually identical |
//! | Marginal | > 80 | < 2.0 | Only A/B comparison reveals |
//! | Subtle | > 70 | < 3.0 | Barely noticeable |
//! | Noticeable | > 50 | < 5.0 | Visible on inspection |
//! | Degraded | <= 50 | >= 5.0 | Clearly visible artifacts |

pub mod butteraugli;
pub mod cvvdp;
pub mod ssimu2;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use butteraugli::{ButteraugliHandler, ButteraugliScore};
pub use cvvdp::{CvvdpHandler, CvvdpOptions};
pub use ssimu2::Ssimu2Handler;

/// The metrics libvship provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Ssimu2,
    Butteraugli,
    Cvvdp,
}

impl Metric {
    /// Whether the metric accumulates state across frames.
    #[must_use]
    pub fn is_temporal(self) -> bool {
        matches!(self, Self::Cvvdp)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ssimu2 => write!(f, "ssimu2"),
            Self::Butteraugli => write!(f, "butteraugli"),
            Self::Cvvdp => write!(f, "cvvdp"),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssimu2" | "ssimulacra2" => Ok(Self::Ssimu2),
            "butteraugli" | "butter" => Ok(Self::Butteraugli),
            "cvvdp" => Ok(Self::Cvvdp),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// Perceptual quality level based on metric thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerceptionLevel {
    Imperceptible,
    Marginal,
    Subtle,
    Noticeable,
    Degraded,
}

impl PerceptionLevel {
    /// Level for a SSIMULACRA2 score.
    #[must_use]
    pub fn from_ssimu2(score: f64) -> Self {
        if score > 90.0 {
            Self::Imperceptible
        } else if score > 80.0 {
            Self::Marginal
        } else if score > 70.0 {
            Self::Subtle
        } else if score > 50.0 {
            Self::Noticeable
        } else {
            Self::Degraded
        }
    }

    /// Level for a Butteraugli distance.
    #[must_use]
    pub fn from_butteraugli(distance: f64) -> Self {
        if distance < 1.0 {
            Self::Imperceptible
        } else if distance < 2.0 {
            Self::Marginal
        } else if distance < 3.0 {
            Self::Subtle
        } else if distance < 5.0 {
            Self::Noticeable
        } else {
            Self::Degraded
        }
    }

    /// Short code for tabular output.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Imperceptible => "IMP",
            Self::Marginal => "MAR",
            Self::Subtle => "SUB",
            Self::Noticeable => "NOT",
            Self::Degraded => "DEG",
        }
    }
}

impl std::fmt::Display for PerceptionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imperceptible => write!(f, "Imperceptible"),
            Self::Marginal => write!(f, "Marginal"),
            Self::Subtle => write!(f, "Subtle"),
            Self::Noticeable => write!(f, "Noticeable"),
            Self::Degraded => write!(f, "Degraded"),
        }
    }
}
