//! Timestamped player observations.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{MetricSnapshot, PlayerId};

/// Format used for timestamps in persisted data.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single observation of a player on the ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Stable player identifier
    #[serde(rename = "id")]
    pub player_id: PlayerId,

    /// When the ladder snapshot was taken (second precision, no timezone)
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    /// Standing at that time
    pub metrics: MetricSnapshot,

    /// Name the player had at that time
    #[serde(rename = "name")]
    pub observed_name: String,
}

impl PlayerRecord {
    pub fn new(
        player_id: impl Into<PlayerId>,
        timestamp: NaiveDateTime,
        metrics: MetricSnapshot,
        observed_name: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            timestamp,
            metrics,
            observed_name: observed_name.into(),
        }
    }
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` timestamps.
pub mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_record_serialization_schema() {
        let record = PlayerRecord::new(
            "42",
            ts(18, 5, 9),
            MetricSnapshot::new(4200, 9100, 300).with_world_rank(3),
            "Alice",
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["timestamp"], "2024-11-02 18:05:09");
        assert_eq!(value["name"], "Alice");
        assert_eq!(value["metrics"]["world_rank"], 3);
    }

    #[test]
    fn test_record_parses_persisted_form() {
        let json = r#"{
            "id": "42",
            "timestamp": "2024-11-02 18:05:09",
            "metrics": {"mmr": 4200, "power": 9100, "world_rank": 3, "total_wins": 300},
            "name": "Alice"
        }"#;
        let record: PlayerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.timestamp, ts(18, 5, 9));
        assert_eq!(record.player_id.as_str(), "42");
        assert_eq!(record.metrics.mmr, 4200);
    }

    #[test]
    fn test_record_rejects_timezone_suffix() {
        let json = r#"{
            "id": "42",
            "timestamp": "2024-11-02T18:05:09Z",
            "metrics": {"mmr": 1, "power": 1},
            "name": "Alice"
        }"#;
        assert!(serde_json::from_str::<PlayerRecord>(json).is_err());
    }
}
