//! # Ladder Tracker
//!
//! Tracks world-ladder standings scraped from game logs and ranks players by
//! a composite score.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (records, player histories, scores, colors)
//! - **calculate**: Scoring math and matchup ratios
//! - **leaderboard**: Player store with merge, recompute and ranking
//! - **ingest**: Game log importer
//! - **storage**: Local `records.json` persistence
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod ingest;
pub mod leaderboard;
pub mod models;
pub mod storage;

pub use leaderboard::{LeaderboardError, LeaderboardStore, MergeStats};
pub use models::*;
