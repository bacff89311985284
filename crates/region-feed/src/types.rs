//! Feed payload types.
//!
//! The upstream documents carry codes and levels as strings; the raw
//! serde types mirror that wire shape and are converted into typed
//! records here. A record with a missing code or a non-numeric level is
//! skipped with a warning rather than failing the batch.

use chrono::{DateTime, Datelike, FixedOffset};
use serde::Deserialize;
use tracing::warn;

/// A region as published by the upstream region list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRecord {
    /// External region code.
    pub code: i64,
    /// Category label ("municipality", "district", "state").
    pub kind: String,
    /// Display name.
    pub name: String,
}

/// One alert-level observation within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningObservation {
    /// External region code.
    pub region_code: i64,
    /// Calendar-week bucket derived from the snapshot timestamp.
    pub week: i64,
    /// Observed alert level, stored without clamping.
    pub level: i64,
    /// Free-text justification; may be empty.
    pub reason: String,
}

/// One upstream snapshot: a timestamp and the levels observed at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningSnapshot {
    /// Upstream publication timestamp, kept verbatim for dedup.
    pub taken_at: String,
    /// Observations for every region in the snapshot.
    pub entries: Vec<WarningObservation>,
}

/// Wire shape of the region list document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRegionsDoc {
    #[serde(rename = "Regionen")]
    pub regions: Vec<RawRegion>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRegion {
    #[serde(rename = "GKZ")]
    pub code: String,
    #[serde(rename = "Region")]
    pub kind: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Wire shape of one snapshot in the warning-level document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSnapshot {
    #[serde(rename = "Stand")]
    pub taken_at: String,
    #[serde(rename = "Warnstufen")]
    pub warnings: Vec<RawWarning>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawWarning {
    #[serde(rename = "GKZ")]
    pub code: String,
    #[serde(rename = "Warnstufe")]
    pub level: String,
    #[serde(rename = "Begruendung", default)]
    pub reason: String,
}

impl RegionRecord {
    /// Convert a raw region, skipping records with a non-numeric code.
    pub(crate) fn from_raw(raw: RawRegion) -> Option<Self> {
        let code = match raw.code.trim().parse::<i64>() {
            Ok(code) => code,
            Err(_) => {
                warn!(code = %raw.code, name = %raw.name, "Skipping region with malformed code");
                return None;
            }
        };

        Some(Self {
            code,
            kind: raw.kind,
            name: raw.name,
        })
    }
}

impl WarningSnapshot {
    /// Convert a raw snapshot, deriving the ISO calendar week from its
    /// timestamp and dropping malformed observations.
    ///
    /// Returns `None` when the timestamp itself cannot be parsed; without
    /// it there is no week bucket to file the observations under.
    pub(crate) fn from_raw(raw: RawSnapshot) -> Option<Self> {
        let week = match parse_week(&raw.taken_at) {
            Some(week) => week,
            None => {
                warn!(taken_at = %raw.taken_at, "Skipping snapshot with unparseable timestamp");
                return None;
            }
        };

        let entries = raw
            .warnings
            .into_iter()
            .filter_map(|w| WarningObservation::from_raw(w, week))
            .collect();

        Some(Self {
            taken_at: raw.taken_at,
            entries,
        })
    }
}

impl WarningObservation {
    pub(crate) fn from_raw(raw: RawWarning, week: i64) -> Option<Self> {
        let region_code = match raw.code.trim().parse::<i64>() {
            Ok(code) => code,
            Err(_) => {
                warn!(code = %raw.code, "Skipping observation with malformed region code");
                return None;
            }
        };

        let level = match raw.level.trim().parse::<i64>() {
            Ok(level) => level,
            Err(_) => {
                warn!(region_code, level = %raw.level, "Skipping observation with non-numeric level");
                return None;
            }
        };

        Some(Self {
            region_code,
            week,
            level,
            reason: raw.reason,
        })
    }
}

/// ISO calendar week of an RFC 3339 timestamp.
fn parse_week(taken_at: &str) -> Option<i64> {
    let parsed: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(taken_at).ok()?;
    Some(i64::from(parsed.iso_week().week()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_with_numeric_code_converts() {
        let raw = RawRegion {
            code: "701".to_string(),
            kind: "Bezirk".to_string(),
            name: "Innsbruck-Land".to_string(),
        };

        let record = RegionRecord::from_raw(raw).unwrap();
        assert_eq!(record.code, 701);
        assert_eq!(record.name, "Innsbruck-Land");
    }

    #[test]
    fn region_with_malformed_code_is_skipped() {
        let raw = RawRegion {
            code: "abc".to_string(),
            kind: "Bezirk".to_string(),
            name: "Nowhere".to_string(),
        };

        assert!(RegionRecord::from_raw(raw).is_none());
    }

    #[test]
    fn snapshot_derives_iso_week_and_drops_bad_entries() {
        let json = r#"
        {
            "Stand": "2020-10-01T14:00:00+02:00",
            "Warnstufen": [
                { "GKZ": "701", "Warnstufe": "2", "Begruendung": "" },
                { "GKZ": "702", "Warnstufe": "hoch", "Begruendung": "" },
                { "GKZ": "", "Warnstufe": "3" }
            ]
        }
        "#;

        let raw: RawSnapshot = serde_json::from_str(json).unwrap();
        let snapshot = WarningSnapshot::from_raw(raw).unwrap();

        // 2020-10-01 falls in ISO week 40; only the well-formed entry survives.
        assert_eq!(snapshot.taken_at, "2020-10-01T14:00:00+02:00");
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entries[0].region_code, 701);
        assert_eq!(snapshot.entries[0].week, 40);
        assert_eq!(snapshot.entries[0].level, 2);
        assert_eq!(snapshot.entries[0].reason, "");
    }

    #[test]
    fn snapshot_with_bad_timestamp_is_skipped() {
        let raw = RawSnapshot {
            taken_at: "yesterday".to_string(),
            warnings: vec![],
        };

        assert!(WarningSnapshot::from_raw(raw).is_none());
    }

    #[test]
    fn missing_reason_defaults_to_empty() {
        let json = r#"{ "GKZ": "701", "Warnstufe": "1" }"#;
        let raw: RawWarning = serde_json::from_str(json).unwrap();
        let obs = WarningObservation::from_raw(raw, 40).unwrap();
        assert_eq!(obs.reason, "");
    }
}
