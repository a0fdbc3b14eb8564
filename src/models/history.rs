//! Per-player aggregate: record history, derived statistics and score.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{ColorScale, Dimension, MetricSnapshot, PlayerId, PlayerRecord, Rgb};
use crate::calculate;

/// Composite score of a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Score {
    /// Player reported at the latest ladder snapshot.
    Scored(f64),
    /// Player was missing from the latest snapshot; standing unknown.
    Stale,
}

impl Score {
    /// Sentinel used by older consumers for stale players.
    pub const STALE_VALUE: f64 = -1.0;

    /// Numeric value, with `Stale` mapped to `-1`.
    pub fn value(&self) -> f64 {
        match self {
            Score::Scored(v) => *v,
            Score::Stale => Self::STALE_VALUE,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Score::Stale)
    }

    /// Ranking order: higher scores first, stale after every scored entry.
    pub fn rank_cmp(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::Scored(a), Score::Scored(b)) => b.total_cmp(a),
            (Score::Scored(_), Score::Stale) => Ordering::Less,
            (Score::Stale, Score::Scored(_)) => Ordering::Greater,
            (Score::Stale, Score::Stale) => Ordering::Equal,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Score::Scored(v) => write!(f, "{:.3}", v),
            Score::Stale => write!(f, "stale"),
        }
    }
}

/// Every record of one player plus the statistics derived from them.
///
/// Records are kept sorted by timestamp and unique per timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerHistory {
    pub id: PlayerId,
    records: Vec<PlayerRecord>,
    pub current_name: String,
    pub aliases: BTreeSet<String>,
    pub current_metrics: MetricSnapshot,
    pub max_metrics: MetricSnapshot,
    pub median_metrics: MetricSnapshot,
    pub min_metrics: MetricSnapshot,
    pub score: Option<Score>,
    pub score_rank: Option<usize>,
    pub percentile: Option<f64>,
    pub display_color: Rgb,
}

impl PlayerHistory {
    /// Start a history from the first record seen for a player.
    pub fn new(first: PlayerRecord) -> Self {
        let metrics = first.metrics;
        Self {
            id: first.player_id.clone(),
            current_name: first.observed_name.clone(),
            aliases: BTreeSet::new(),
            current_metrics: metrics,
            max_metrics: metrics,
            median_metrics: metrics,
            min_metrics: metrics,
            records: vec![first],
            score: None,
            score_rank: None,
            percentile: None,
            display_color: Rgb::default(),
        }
    }

    /// Records in ascending timestamp order.
    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    pub fn latest_record(&self) -> &PlayerRecord {
        // A history is never constructed without a record and never shrinks.
        &self.records[self.records.len() - 1]
    }

    pub fn latest_timestamp(&self) -> NaiveDateTime {
        self.latest_record().timestamp
    }

    pub fn has_timestamp(&self, timestamp: NaiveDateTime) -> bool {
        self.records
            .binary_search_by_key(&timestamp, |r| r.timestamp)
            .is_ok()
    }

    /// Insert a record in timestamp order.
    ///
    /// Returns `false` and leaves the history untouched if a record with the
    /// same timestamp already exists.
    pub(crate) fn add_record(&mut self, record: PlayerRecord) -> bool {
        match self
            .records
            .binary_search_by_key(&record.timestamp, |r| r.timestamp)
        {
            Ok(_) => false,
            Err(pos) => {
                self.records.insert(pos, record);
                self.score = None;
                true
            }
        }
    }

    /// Recompute name, aliases and per-dimension min/median/max.
    pub fn recompute_derived(&mut self) {
        let latest = self.latest_record();
        let (metrics, name) = (latest.metrics, latest.observed_name.clone());
        self.current_metrics = metrics;
        self.current_name = name;

        let current_name = &self.current_name;
        self.aliases = self
            .records
            .iter()
            .filter(|r| &r.observed_name != current_name)
            .map(|r| r.observed_name.clone())
            .collect();

        let records = &self.records;
        let column =
            |dim: Dimension| -> Vec<i64> { records.iter().map(|r| r.metrics.get(dim)).collect() };

        self.max_metrics =
            MetricSnapshot::from_fn(|dim| column(dim).into_iter().max().unwrap_or(0));
        self.min_metrics =
            MetricSnapshot::from_fn(|dim| column(dim).into_iter().min().unwrap_or(0));
        self.median_metrics = MetricSnapshot::from_fn(|dim| calculate::median(&column(dim)));
    }

    /// Score the player against the ladder-wide maxima.
    pub fn compute_score(&mut self, global_max: &MetricSnapshot, latest: NaiveDateTime) {
        if self.latest_timestamp() != latest {
            self.score = Some(Score::Stale);
            return;
        }

        self.score = Some(Score::Scored(calculate::composite_score(
            &self.current_metrics,
            &self.max_metrics,
            global_max,
        )));
    }

    pub(crate) fn set_rank(&mut self, rank: usize, player_count: usize, color_scale: ColorScale) {
        let percentile = calculate::rank_percentile(rank, player_count);
        self.score_rank = Some(rank);
        self.percentile = Some(percentile);
        self.display_color = color_scale(percentile);
    }

    /// Case-insensitive match against the current name or any alias.
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.current_name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}
