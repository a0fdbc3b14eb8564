//! Leaderboard store: merge, recompute and ranking.
//!
//! The store owns every [`PlayerHistory`]. Mutations go through
//! [`LeaderboardStore::add_record`] and [`LeaderboardStore::merge_from`], both
//! of which mark derived data stale until [`LeaderboardStore::recompute`] runs.
//!
//! The store does no locking; callers sharing it across threads must
//! serialize access themselves.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info};

use crate::calculate::DEFAULT_WORST_WORLD_RANK;
use crate::models::{
    hsv_gradient, ColorScale, Dimension, MetricSnapshot, PlayerHistory, PlayerId, PlayerRecord,
    Score,
};

/// Errors raised by leaderboard operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaderboardError {
    #[error("leaderboard has no players to rank")]
    Empty,
}

/// Counts reported by [`LeaderboardStore::merge_from`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub new_players: usize,
    pub new_records: usize,
}

/// All tracked players plus ladder-wide aggregates.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    players: BTreeMap<PlayerId, PlayerHistory>,
    global_max_metrics: MetricSnapshot,
    global_min_metrics: MetricSnapshot,
    latest_timestamp: Option<NaiveDateTime>,
    all_timestamps: BTreeSet<NaiveDateTime>,
    worst_world_rank: u32,
    color_scale: ColorScale,
    stale: bool,
}

impl Default for LeaderboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaderboardStore {
    pub fn new() -> Self {
        Self {
            players: BTreeMap::new(),
            global_max_metrics: MetricSnapshot::new(0, 0, 0).with_world_rank(1),
            global_min_metrics: MetricSnapshot::new(0, 0, 0).with_world_rank(1),
            latest_timestamp: None,
            all_timestamps: BTreeSet::new(),
            worst_world_rank: DEFAULT_WORST_WORLD_RANK,
            color_scale: hsv_gradient,
            stale: false,
        }
    }

    /// Builder method to set the ladder size used as the worst world rank.
    pub fn with_worst_world_rank(mut self, rank: u32) -> Self {
        self.worst_world_rank = rank;
        self.stale = !self.players.is_empty();
        self
    }

    /// Builder method to replace the percentile-to-color mapping.
    pub fn with_color_scale(mut self, color_scale: ColorScale) -> Self {
        self.color_scale = color_scale;
        self.stale = !self.players.is_empty();
        self
    }

    /// Add one record, creating the player on first sight.
    ///
    /// Returns `false` if the player already has a record at that timestamp.
    pub fn add_record(&mut self, record: PlayerRecord) -> bool {
        let added = match self.players.get_mut(&record.player_id) {
            Some(history) => history.add_record(record),
            None => {
                self.players
                    .insert(record.player_id.clone(), PlayerHistory::new(record));
                true
            }
        };

        if added {
            self.stale = true;
        }
        added
    }

    /// Merge another store into this one.
    ///
    /// Known players receive only records whose timestamp they do not already
    /// have; unknown players are adopted whole.
    pub fn merge_from(&mut self, source: LeaderboardStore) -> MergeStats {
        let mut stats = MergeStats::default();

        for (id, source_history) in source.players {
            match self.players.get_mut(&id) {
                Some(target) => {
                    for record in source_history.records() {
                        if target.add_record(record.clone()) {
                            stats.new_records += 1;
                        }
                    }
                }
                None => {
                    self.players.insert(id, source_history);
                    stats.new_players += 1;
                }
            }
        }

        if stats.new_players > 0 || stats.new_records > 0 {
            self.stale = true;
        }

        info!("Discovered {} new records", stats.new_records);
        info!("Discovered {} new players", stats.new_players);
        stats
    }

    /// Recompute every derived field, score and rank.
    pub fn recompute(&mut self) -> Result<(), LeaderboardError> {
        let latest = self
            .players
            .values()
            .map(PlayerHistory::latest_timestamp)
            .max()
            .ok_or(LeaderboardError::Empty)?;

        self.latest_timestamp = Some(latest);
        self.all_timestamps = self
            .players
            .values()
            .flat_map(|p| p.records().iter().map(|r| r.timestamp))
            .collect();

        for history in self.players.values_mut() {
            history.recompute_derived();
        }

        let players = &self.players;
        let extreme = |dim: Dimension, pick: fn(i64, i64) -> i64| -> i64 {
            players
                .values()
                .map(|p| p.max_metrics.get(dim))
                .reduce(pick)
                .unwrap_or(0)
        };
        let global_max = MetricSnapshot::from_fn(|dim| extreme(dim, i64::max)).with_world_rank(1);
        let global_min = MetricSnapshot::from_fn(|dim| extreme(dim, i64::min))
            .with_world_rank(self.worst_world_rank);

        for history in self.players.values_mut() {
            history.compute_score(&global_max, latest);
        }

        let mut ranking: Vec<(PlayerId, Score)> = self
            .players
            .iter()
            .map(|(id, p)| (id.clone(), p.score.unwrap_or(Score::Stale)))
            .collect();
        ranking.sort_by(|a, b| a.1.rank_cmp(&b.1));

        let player_count = ranking.len();
        for (position, (id, _)) in ranking.iter().enumerate() {
            if let Some(history) = self.players.get_mut(id) {
                history.set_rank(position + 1, player_count, self.color_scale);
            }
        }

        self.global_max_metrics = global_max;
        self.global_min_metrics = global_min;
        self.stale = false;

        debug!(
            "Recomputed {} players across {} snapshots",
            player_count,
            self.all_timestamps.len()
        );
        Ok(())
    }

    /// Players ordered by rank, recomputing first if anything changed.
    pub fn players(&mut self) -> Result<Vec<&PlayerHistory>, LeaderboardError> {
        if self.players.is_empty() {
            return Ok(Vec::new());
        }
        if self.stale {
            self.recompute()?;
        }
        Ok(self.ranked())
    }

    /// Players ordered by their last computed rank, without recomputing.
    pub fn ranked(&self) -> Vec<&PlayerHistory> {
        let mut players: Vec<&PlayerHistory> = self.players.values().collect();
        players.sort_by_key(|p| p.score_rank.unwrap_or(usize::MAX));
        players
    }

    pub fn player(&self, id: &str) -> Option<&PlayerHistory> {
        self.players.get(id)
    }

    /// Players whose current name or any alias matches, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Vec<&PlayerHistory> {
        self.players.values().filter(|p| p.answers_to(name)).collect()
    }

    /// Iterate players in id order.
    pub fn histories(&self) -> impl Iterator<Item = &PlayerHistory> {
        self.players.values()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = &PlayerId> {
        self.players.keys()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.players.values().map(|p| p.records().len()).sum()
    }

    /// True when records changed since the last recompute.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn global_max_metrics(&self) -> &MetricSnapshot {
        &self.global_max_metrics
    }

    pub fn global_min_metrics(&self) -> &MetricSnapshot {
        &self.global_min_metrics
    }

    pub fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.latest_timestamp
    }

    /// Every distinct snapshot time, ascending.
    pub fn all_timestamps(&self) -> &BTreeSet<NaiveDateTime> {
        &self.all_timestamps
    }

    pub fn worst_world_rank(&self) -> u32 {
        self.worst_world_rank
    }

    /// Lowest non-stale score, or 0 when nobody is scored.
    pub fn min_score(&self) -> f64 {
        self.players
            .values()
            .filter_map(|p| match p.score {
                Some(Score::Scored(v)) => Some(v),
                _ => None,
            })
            .reduce(f64::min)
            .unwrap_or(0.0)
    }
}
