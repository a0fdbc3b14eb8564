//! Metric snapshots and the dimensions statistics are computed over.

use serde::{Deserialize, Serialize};

/// One player's standing on the ladder at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Ladder rating points
    pub mmr: i64,

    /// Highest army strength the player has fielded
    pub power: i64,

    /// Position on the world ladder (1 = best)
    #[serde(default)]
    pub world_rank: Option<u32>,

    /// Total wins on the account
    #[serde(default)]
    pub total_wins: i64,
}

impl MetricSnapshot {
    /// Create a snapshot without a world rank.
    pub fn new(mmr: i64, power: i64, total_wins: i64) -> Self {
        Self {
            mmr,
            power,
            world_rank: None,
            total_wins,
        }
    }

    /// Builder method to set the world rank.
    pub fn with_world_rank(mut self, rank: u32) -> Self {
        self.world_rank = Some(rank);
        self
    }

    /// Read a single aggregated dimension.
    pub fn get(&self, dim: Dimension) -> i64 {
        match dim {
            Dimension::Mmr => self.mmr,
            Dimension::Power => self.power,
            Dimension::TotalWins => self.total_wins,
        }
    }

    /// Build a snapshot by evaluating `f` once per dimension.
    pub fn from_fn(mut f: impl FnMut(Dimension) -> i64) -> Self {
        Self::new(
            f(Dimension::Mmr),
            f(Dimension::Power),
            f(Dimension::TotalWins),
        )
    }
}

/// Metric dimensions aggregated independently of each other.
///
/// World rank is not included: its extrema are fixed by the ladder size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Mmr,
    Power,
    TotalWins,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Mmr, Dimension::Power, Dimension::TotalWins];
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Mmr => write!(f, "mmr"),
            Dimension::Power => write!(f, "power"),
            Dimension::TotalWins => write!(f, "total_wins"),
        }
    }
}
