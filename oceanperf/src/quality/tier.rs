//! Quality tier ladder.
//!
//! Tiers are totally ordered (`VeryLow < Low < Medium < High`). Every
//! adjustment moves exactly one step; both ends of the ladder absorb
//! further movement in their direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rendering quality tier selected for the ocean background.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// Minimum geometry, no optional layers.
    VeryLow,

    /// Sparse geometry with atmosphere only.
    Low,

    /// Balanced default when nothing better is known.
    #[default]
    Medium,

    /// Full detail with every effect layer.
    High,
}

impl Tier {
    /// All tiers in ascending order.
    pub const ALL: [Tier; 4] = [Tier::VeryLow, Tier::Low, Tier::Medium, Tier::High];

    /// Downgrade to the next lower tier.
    ///
    /// `VeryLow` stays `VeryLow`.
    pub fn downgrade(&self) -> Self {
        match self {
            Tier::High => Tier::Medium,
            Tier::Medium => Tier::Low,
            Tier::Low => Tier::VeryLow,
            Tier::VeryLow => Tier::VeryLow,
        }
    }

    /// Upgrade to the next higher tier.
    ///
    /// `High` stays `High`.
    pub fn upgrade(&self) -> Self {
        match self {
            Tier::VeryLow => Tier::Low,
            Tier::Low => Tier::Medium,
            Tier::Medium => Tier::High,
            Tier::High => Tier::High,
        }
    }

    /// Whether this is the bottom of the ladder.
    pub fn is_lowest(&self) -> bool {
        *self == Tier::VeryLow
    }

    /// Whether this is the top of the ladder.
    pub fn is_highest(&self) -> bool {
        *self == Tier::High
    }

    /// Persisted name (`VERY_LOW`, `LOW`, `MEDIUM`, `HIGH`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::VeryLow => "VERY_LOW",
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
        }
    }

    /// Short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Tier::VeryLow => "very low (static-looking water, no effects)",
            Tier::Low => "low (sparse waves, atmosphere only)",
            Tier::Medium => "medium (reflections and specular highlights)",
            Tier::High => "high (full detail, all effect layers)",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a tier name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier '{0}' (expected VERY_LOW, LOW, MEDIUM or HIGH)")]
pub struct ParseTierError(pub String);

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "VERY_LOW" | "VERYLOW" => Ok(Tier::VeryLow),
            "LOW" => Ok(Tier::Low),
            "MEDIUM" => Ok(Tier::Medium),
            "HIGH" => Ok(Tier::High),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}
