//! Scoring engine math.
//!
//! Pure functions behind the composite score and the consumer-facing ratios:
//! - Median of integer metric columns
//! - Loss ratio ("farmed wins" penalty) and composite score
//! - Rank percentile used for display colors
//! - Left/right matchup ratios

use crate::models::{MetricSnapshot, PlayerHistory, Score};

/// Weight of the mmr share in the composite score.
pub const MMR_WEIGHT: f64 = 9.0;

/// Weight of the power share in the composite score.
pub const POWER_WEIGHT: f64 = 1.0;

/// Weight of the loss ratio penalty.
pub const LOSS_RATIO_WEIGHT: f64 = 0.1;

/// Power corresponding to one unit of the win/power ratio.
pub const POWER_PER_WIN_UNIT: f64 = 600.0;

/// Number of players shown on the world ladder.
pub const DEFAULT_WORST_WORLD_RANK: u32 = 200;

/// Floor applied to matchup side values before normalization.
const RATIO_FLOOR: f64 = 0.01;

/// Bounds of a matchup ratio.
const RATIO_MIN: f64 = 0.1;
const RATIO_MAX: f64 = 0.99;

/// Median of a metric column.
///
/// Even-length columns average the middle pair, truncating toward zero.
/// Returns 0 for an empty column.
pub fn median(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2
    }
}

/// Fourth root of wins per 600 power. Zero power yields 0.
pub fn loss_ratio(max_total_wins: i64, max_power: i64) -> f64 {
    if max_power == 0 {
        return 0.0;
    }

    let wins_per_unit = max_total_wins as f64 / (max_power as f64 / POWER_PER_WIN_UNIT);
    wins_per_unit.sqrt().sqrt()
}

/// Share of `value` in `max`, 0 when `max` is zero.
fn share(value: i64, max: i64) -> f64 {
    if max == 0 {
        0.0
    } else {
        value as f64 / max as f64
    }
}

/// Composite score of a non-stale player.
pub fn composite_score(
    current: &MetricSnapshot,
    player_max: &MetricSnapshot,
    global_max: &MetricSnapshot,
) -> f64 {
    let loss = loss_ratio(player_max.total_wins, player_max.power);
    let mmr_percentage = share(current.mmr, global_max.mmr);
    let power_percentage = share(current.power, global_max.power);

    mmr_percentage * MMR_WEIGHT + power_percentage * POWER_WEIGHT - loss * LOSS_RATIO_WEIGHT
}

/// Rank percentile: 1 - rank / player_count.
pub fn rank_percentile(rank: usize, player_count: usize) -> f64 {
    if player_count == 0 {
        return 0.0;
    }
    1.0 - rank as f64 / player_count as f64
}

/// Ratio of two side values after normalizing against a ladder minimum.
pub fn matchup_ratio(left: f64, right: f64, minimum: f64) -> f64 {
    let left = (left.max(RATIO_FLOOR) - minimum).max(RATIO_FLOOR);
    let right = (right.max(RATIO_FLOOR) - minimum).max(RATIO_FLOOR);
    (left / (left + right)).clamp(RATIO_MIN, RATIO_MAX)
}

fn side_value<F>(side: &[&PlayerHistory], f: F) -> f64
where
    F: Fn(&PlayerHistory) -> f64,
{
    side.iter().map(|&p| f(p)).fold(RATIO_FLOOR, f64::max)
}

/// Score-based matchup ratio; values above 0.5 favor the left side.
///
/// Players that have not been scored yet count as stale.
pub fn score_ratio(left: &[&PlayerHistory], right: &[&PlayerHistory], min_score: f64) -> f64 {
    let score = |p: &PlayerHistory| p.score.unwrap_or(Score::Stale).value();
    matchup_ratio(side_value(left, score), side_value(right, score), min_score)
}

/// Mmr-based matchup ratio; values above 0.5 favor the left side.
pub fn mmr_ratio(left: &[&PlayerHistory], right: &[&PlayerHistory], min_mmr: i64) -> f64 {
    let mmr = |p: &PlayerHistory| p.current_metrics.mmr as f64;
    matchup_ratio(side_value(left, mmr), side_value(right, mmr), min_mmr as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[5, 1, 3]), 3);
    }

    #[test]
    fn test_median_even_truncates() {
        assert_eq!(median(&[1, 2]), 1);
        assert_eq!(median(&[10, 20, 30, 40]), 25);
    }

    #[test]
    fn test_median_empty() {
        assert_eq!(median(&[]), 0);
    }

    #[test]
    fn test_loss_ratio() {
        // 16 wins at 600 power -> 16 per unit -> fourth root 2
        assert!((loss_ratio(16, 600) - 2.0).abs() < 1e-12);
        assert!((loss_ratio(1, 9600) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_loss_ratio_zero_power() {
        assert_eq!(loss_ratio(10, 0), 0.0);
    }

    #[test]
    fn test_composite_score_weights() {
        let global = MetricSnapshot::new(1000, 600, 10);
        let current = MetricSnapshot::new(500, 300, 0);
        let player_max = MetricSnapshot::new(500, 300, 0);

        // 0.5 * 9 + 0.5 * 1 - 0
        let score = composite_score(&current, &player_max, &global);
        assert!((score - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_composite_score_zero_global_max() {
        let zero = MetricSnapshot::new(0, 0, 0);
        assert_eq!(composite_score(&zero, &zero, &zero), 0.0);
    }

    #[test]
    fn test_rank_percentile() {
        assert_eq!(rank_percentile(1, 4), 0.75);
        assert_eq!(rank_percentile(4, 4), 0.0);
        assert_eq!(rank_percentile(1, 0), 0.0);
    }

    #[test]
    fn test_matchup_ratio_even() {
        assert!((matchup_ratio(5.0, 5.0, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_matchup_ratio_favors_left() {
        // (9 - 1) / ((9 - 1) + (3 - 1))
        assert!((matchup_ratio(9.0, 3.0, 1.0) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_matchup_ratio_clamped() {
        assert_eq!(matchup_ratio(100.0, 0.0, 0.0), 0.99);
        assert_eq!(matchup_ratio(0.0, 100.0, 0.0), 0.1);
    }
}
