use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub incorrect: u32,
    #[serde(
        alias = "lastSeen",
        default = "epoch",
        deserialize_with = "deserialize_timestamp"
    )]
    pub last_seen: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            correct: 0,
            incorrect: 0,
            last_seen: now,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Fraction answered correctly, 0 when never attempted.
    pub fn accuracy(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            n => self.correct as f64 / n as f64,
        }
    }

    pub fn record(&mut self, was_correct: bool, now: DateTime<Utc>) {
        if was_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.last_seen = now;
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
    Float(f64),
}

/// Accepts RFC 3339 strings or epoch milliseconds. Anything unreadable falls
/// back to the epoch so the record counts as long unseen.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    let parsed = match raw {
        Some(RawTimestamp::Text(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok(),
        Some(RawTimestamp::Millis(ms)) => Utc.timestamp_millis_opt(ms).single(),
        Some(RawTimestamp::Float(ms)) => Utc.timestamp_millis_opt(ms as i64).single(),
        None => None,
    };
    Ok(parsed.unwrap_or_else(|| {
        log::warn!("unreadable last-seen timestamp, using epoch");
        epoch()
    }))
}

pub type ProgressMap = BTreeMap<String, ProgressRecord>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    pub schema_version: u32,
    pub records: ProgressMap,
}

impl Default for ProgressData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records: ProgressMap::new(),
        }
    }
}

impl ProgressData {
    pub fn from_records(records: ProgressMap) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            records,
        }
    }
}

/// On-disk shapes: the versioned envelope, or a bare name -> record map.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum StoredProgress {
    Versioned(ProgressData),
    Bare(ProgressMap),
}

impl From<StoredProgress> for ProgressData {
    fn from(stored: StoredProgress) -> Self {
        match stored {
            StoredProgress::Versioned(data) => data,
            StoredProgress::Bare(records) => ProgressData::from_records(records),
        }
    }
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub rolecall_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub progress: ProgressData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rfc3339_and_millis() {
        let json = r#"{
            "Imp": {"correct": 2, "incorrect": 1, "last_seen": "2024-03-01T12:00:00Z"},
            "Po": {"correct": 0, "incorrect": 4, "lastSeen": 1709294400000}
        }"#;
        let map: ProgressMap = serde_json::from_str(json).unwrap();
        assert_eq!(map["Imp"].last_seen, map["Po"].last_seen);
        assert_eq!(map["Imp"].attempts(), 3);
    }

    #[test]
    fn bad_timestamp_becomes_epoch() {
        let json = r#"{"correct": 1, "incorrect": 0, "last_seen": "yesterday"}"#;
        let record: ProgressRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.last_seen, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(record.correct, 1);
    }

    #[test]
    fn bare_map_upgrades_to_versioned() {
        let json = r#"{"Chef": {"correct": 1, "incorrect": 0, "last_seen": 0}}"#;
        let stored: StoredProgress = serde_json::from_str(json).unwrap();
        let data = ProgressData::from(stored);
        assert_eq!(data.schema_version, SCHEMA_VERSION);
        assert_eq!(data.records["Chef"].correct, 1);
    }

    #[test]
    fn accuracy_of_unseen_is_zero() {
        let record = ProgressRecord::new(Utc::now());
        assert_eq!(record.accuracy(), 0.0);
    }
}
