//! Game log importer.
//!
//! The game client writes every ranking response it receives to its text
//! logs. A snapshot starts with a header line such as
//!
//! ```text
//! [Info][18:05:09 2024/11/02 ...] recv message [12] - [ResponseRankList]
//! ```
//!
//! followed by a JSON array spread over one or more lines. Each snapshot of
//! the world ladder becomes one [`PlayerRecord`] per listed player, all
//! sharing the header's timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::leaderboard::LeaderboardStore;
use crate::models::{MetricSnapshot, PlayerId, PlayerRecord};

const HEADER_PATTERN: &str = concat!(
    r"^\[Info\]\[(\d{2}:\d{2}:\d{2}) (\d{4}/\d{2}/\d{2}).*\]",
    r" recv message \[\d+\] - \[ResponseRankList\]"
);
const HEADER_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Board type of the world ladder; other boards are ignored.
const WORLD_LADDER_TYPE: i64 = 2;

/// Errors that can occur while importing logs.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Log directory not found: {0}")]
    LogDirMissing(PathBuf),
}

/// Counters collected during an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub files: usize,
    pub snapshots: usize,
    pub records: usize,
    pub skipped_snapshots: usize,
}

#[derive(Debug, Deserialize)]
struct RankListPayload {
    #[serde(rename = "type", default = "default_board_type")]
    board_type: i64,

    #[serde(default)]
    players: Vec<RankEntry>,
}

fn default_board_type() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankEntry {
    base_info: BaseInfo,

    #[serde(default)]
    rank: Option<u32>,

    #[serde(default)]
    point: i64,

    #[serde(default)]
    fight_point: FightPoint,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseInfo {
    userid: PlayerId,

    #[serde(default)]
    risk_info: RiskInfo,
}

#[derive(Debug, Default, Deserialize)]
struct RiskInfo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FightPoint {
    #[serde(default)]
    highest_point: i64,

    #[serde(default)]
    total_wins: i64,
}

impl RankEntry {
    fn into_record(self, timestamp: NaiveDateTime) -> PlayerRecord {
        let mut metrics = MetricSnapshot::new(
            self.point,
            self.fight_point.highest_point,
            self.fight_point.total_wins,
        );
        metrics.world_rank = Some(self.rank.unwrap_or(0));

        let name = self
            .base_info
            .risk_info
            .name
            .unwrap_or_else(|| "Unknown".to_string());

        PlayerRecord::new(self.base_info.userid, timestamp, metrics, name)
    }
}

/// Parses ranking snapshots out of game log files.
#[derive(Debug, Clone)]
pub struct LogImporter {
    header: Regex,
    expected_players: usize,
}

impl LogImporter {
    /// Create an importer accepting ladders of exactly `expected_players`.
    pub fn new(expected_players: usize) -> Result<Self, IngestError> {
        Ok(Self {
            header: Regex::new(HEADER_PATTERN)?,
            expected_players,
        })
    }

    /// Import every `.txt` log in `dir` into a fresh store.
    pub fn import_dir(&self, dir: &Path) -> Result<(LeaderboardStore, IngestStats), IngestError> {
        if !dir.is_dir() {
            return Err(IngestError::LogDirMissing(dir.to_path_buf()));
        }

        let pattern = dir.join("*.txt");
        let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable log entry: {}", e);
                    None
                }
            })
            .collect();
        paths.sort();

        let mut store = LeaderboardStore::new();
        let mut stats = IngestStats::default();

        for path in &paths {
            let bytes = fs::read(path)?;
            let content = String::from_utf8_lossy(&bytes);
            let lines: Vec<&str> = content.lines().collect();

            debug!("Scanning {:?} ({} lines)", path, lines.len());
            self.import_lines(&lines, &mut store, &mut stats);
            stats.files += 1;
        }

        info!(
            "Imported {} snapshots ({} records) from {} log files",
            stats.snapshots, stats.records, stats.files
        );
        Ok((store, stats))
    }

    /// Import snapshots from already-split log lines.
    pub fn import_lines(
        &self,
        lines: &[&str],
        store: &mut LeaderboardStore,
        stats: &mut IngestStats,
    ) {
        for (i, line) in lines.iter().enumerate() {
            let Some(timestamp) = self.header_timestamp(line) else {
                continue;
            };

            let Some(payload) = self.extract_payload(&lines[i + 1..]) else {
                debug!("No JSON payload after snapshot header at {}", timestamp);
                continue;
            };

            match self.parse_snapshot(payload, timestamp) {
                Some(records) => {
                    stats.snapshots += 1;
                    for record in records {
                        if store.add_record(record) {
                            stats.records += 1;
                        }
                    }
                }
                None => stats.skipped_snapshots += 1,
            }
        }
    }

    fn header_timestamp(&self, line: &str) -> Option<NaiveDateTime> {
        let caps = self.header.captures(line.trim())?;
        let stamp = format!("{} {}", &caps[2], &caps[1]);
        NaiveDateTime::parse_from_str(&stamp, HEADER_TIME_FORMAT).ok()
    }

    /// Accumulate lines until they form a JSON array; take its first element.
    ///
    /// Stops at the next snapshot header.
    fn extract_payload(&self, lines: &[&str]) -> Option<serde_json::Value> {
        let mut buffer = String::new();
        for line in lines {
            if self.header.is_match(line.trim()) {
                return None;
            }
            buffer.push_str(line.trim());
            if let Ok(serde_json::Value::Array(mut items)) =
                serde_json::from_str::<serde_json::Value>(&buffer)
            {
                if items.is_empty() {
                    return None;
                }
                return Some(items.swap_remove(0));
            }
        }
        None
    }

    fn parse_snapshot(
        &self,
        payload: serde_json::Value,
        timestamp: NaiveDateTime,
    ) -> Option<Vec<PlayerRecord>> {
        let payload: RankListPayload = match serde_json::from_value(payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed parsing ladder snapshot at {}: {}", timestamp, e);
                return None;
            }
        };

        if payload.board_type != WORLD_LADDER_TYPE {
            debug!("Ignoring board type {} at {}", payload.board_type, timestamp);
            return None;
        }

        if payload.players.len() != self.expected_players {
            warn!(
                "Failed parsing ladder snapshot at {}: expected {} players, found {}",
                timestamp,
                self.expected_players,
                payload.players.len()
            );
            return None;
        }

        Some(
            payload
                .players
                .into_iter()
                .map(|entry| entry.into_record(timestamp))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn entry(id: u32, name: &str, point: i64) -> serde_json::Value {
        serde_json::json!({
            "rank": id,
            "point": point,
            "baseInfo": {"userid": id, "riskInfo": {"name": name}},
            "fightPoint": {"highestPoint": 5000 + point, "totalWins": 100}
        })
    }

    fn snapshot(board_type: i64, count: u32) -> String {
        let players: Vec<serde_json::Value> =
            (1..=count).map(|i| entry(i, &format!("P{}", i), 4000 - i as i64)).collect();
        serde_json::to_string_pretty(&serde_json::json!([{"type": board_type, "players": players}]))
            .unwrap()
    }

    fn header(time: &str) -> String {
        format!(
            "[Info][{} 2024/11/02 +0100] recv message [77] - [ResponseRankList]",
            time
        )
    }

    fn run(importer: &LogImporter, text: &str) -> (LeaderboardStore, IngestStats) {
        let lines: Vec<&str> = text.lines().collect();
        let mut store = LeaderboardStore::new();
        let mut stats = IngestStats::default();
        importer.import_lines(&lines, &mut store, &mut stats);
        (store, stats)
    }

    #[test]
    fn test_header_timestamp() {
        let importer = LogImporter::new(3).unwrap();
        let ts = importer.header_timestamp(&header("18:05:09")).unwrap();
        assert_eq!(
            ts,
            NaiveDate::from_ymd_opt(2024, 11, 2)
                .unwrap()
                .and_hms_opt(18, 5, 9)
                .unwrap()
        );
        assert!(importer
            .header_timestamp("[Info][18:05:09 2024/11/02] recv message [1] - [ResponseLogin]")
            .is_none());
    }

    #[test]
    fn test_import_multiline_snapshot() {
        let importer = LogImporter::new(3).unwrap();
        let text = format!("noise\n{}\n{}\ntrailing", header("18:05:09"), snapshot(2, 3));
        let (store, stats) = run(&importer, &text);

        assert_eq!(stats.snapshots, 1);
        assert_eq!(stats.records, 3);
        assert_eq!(store.len(), 3);

        let p1 = store.player("1").unwrap();
        let record = &p1.records()[0];
        assert_eq!(record.observed_name, "P1");
        assert_eq!(record.metrics.mmr, 3999);
        assert_eq!(record.metrics.power, 8999);
        assert_eq!(record.metrics.total_wins, 100);
        assert_eq!(record.metrics.world_rank, Some(1));
    }

    #[test]
    fn test_wrong_player_count_is_skipped() {
        let importer = LogImporter::new(200).unwrap();
        let text = format!("{}\n{}", header("18:05:09"), snapshot(2, 3));
        let (store, stats) = run(&importer, &text);

        assert!(store.is_empty());
        assert_eq!(stats.skipped_snapshots, 1);
    }

    #[test]
    fn test_other_board_types_ignored() {
        let importer = LogImporter::new(3).unwrap();
        let text = format!("{}\n{}", header("18:05:09"), snapshot(1, 3));
        let (store, _) = run(&importer, &text);
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let importer = LogImporter::new(1).unwrap();
        let text = format!(
            "{}\n{}",
            header("09:00:00"),
            r#"[{"type": 2, "players": [{"baseInfo": {"userid": "abc"}}]}]"#
        );
        let (store, _) = run(&importer, &text);

        let record = &store.player("abc").unwrap().records()[0];
        assert_eq!(record.observed_name, "Unknown");
        assert_eq!(record.metrics, MetricSnapshot::new(0, 0, 0).with_world_rank(0));
    }

    #[test]
    fn test_repeated_snapshot_is_deduplicated() {
        let importer = LogImporter::new(2).unwrap();
        let block = format!("{}\n{}", header("18:05:09"), snapshot(2, 2));
        let text = format!("{}\n{}", block, block);
        let (store, stats) = run(&importer, &text);

        assert_eq!(stats.snapshots, 2);
        assert_eq!(stats.records, 2);
        assert_eq!(store.record_count(), 2);
    }

    #[test]
    fn test_truncated_payload_stops_at_next_header() {
        let importer = LogImporter::new(2).unwrap();
        let text = format!(
            "{}\n[{{\"type\": 2,\n{}\n{}",
            header("18:00:00"),
            header("18:05:09"),
            snapshot(2, 2)
        );
        let (store, stats) = run(&importer, &text);

        assert_eq!(stats.snapshots, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.player("1").unwrap().records().len(), 1);
    }

    #[test]
    fn test_import_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("a.txt"),
            format!("{}\n{}", header("18:05:09"), snapshot(2, 2)),
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("b.txt"),
            format!("{}\n{}", header("19:05:09"), snapshot(2, 2)),
        )
        .unwrap();
        fs::write(temp_dir.path().join("ignored.log"), "garbage").unwrap();

        let importer = LogImporter::new(2).unwrap();
        let (store, stats) = importer.import_dir(temp_dir.path()).unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.snapshots, 2);
        assert_eq!(store.record_count(), 4);
    }

    #[test]
    fn test_import_missing_dir() {
        let importer = LogImporter::new(200).unwrap();
        let result = importer.import_dir(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(IngestError::LogDirMissing(_))));
    }
}
