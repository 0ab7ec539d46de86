use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::model::ScheduleSnapshot;

/// Writes the snapshot as pretty JSON, replacing any previous one. The
/// document goes to a temp file first and is moved into place with a
/// rename, so a concurrent reader never observes a partial write.
pub fn save_snapshot(path: &Path, snapshot: &ScheduleSnapshot) -> Result<()> {
    let payload = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialize snapshot")?;
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    fs::write(&tmp, payload)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Loads the last persisted snapshot. A missing file is not an error;
/// the board simply starts empty.
pub fn load_snapshot(path: &Path) -> Result<Option<ScheduleSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let snapshot: ScheduleSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::{load_snapshot, save_snapshot};
    use crate::model::{FlightNode, Identification, RawFlightRecord, ScheduleSnapshot};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        dir.push(format!("flightboard-test-{suffix}"));
        let _ = fs::create_dir_all(&dir);
        dir.push(name);
        dir
    }

    fn record(callsign: &str) -> RawFlightRecord {
        RawFlightRecord {
            flight: Some(FlightNode {
                identification: Some(Identification {
                    callsign: Some(callsign.to_string()),
                    number: None,
                }),
                ..FlightNode::default()
            }),
        }
    }

    #[test]
    fn snapshot_roundtrip_preserves_order() {
        let path = temp_file("flight-schedule.json");
        let snapshot = ScheduleSnapshot {
            airport: "CGH".to_string(),
            fetched_at_utc: "2025-06-01T15:00:00Z".to_string(),
            arrivals: vec![record("TAM3100"), record("GLO1402"), record("AZU2879")],
            departures: vec![record("TAM3101")],
        };
        save_snapshot(&path, &snapshot).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.arrivals.len(), 3);
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn missing_snapshot_is_none() {
        let path = temp_file("absent.json");
        assert!(load_snapshot(&path).unwrap().is_none());
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn overwrite_fully_replaces_previous_snapshot() {
        let path = temp_file("flight-schedule.json");
        let first = ScheduleSnapshot {
            airport: "CGH".to_string(),
            fetched_at_utc: "2025-06-01T15:00:00Z".to_string(),
            arrivals: vec![record("OLD1"), record("OLD2")],
            departures: Vec::new(),
        };
        save_snapshot(&path, &first).unwrap();
        let second = ScheduleSnapshot {
            airport: "CGH".to_string(),
            fetched_at_utc: "2025-06-01T15:00:20Z".to_string(),
            arrivals: vec![record("NEW1")],
            departures: vec![record("NEW2")],
        };
        save_snapshot(&path, &second).unwrap();
        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded, second);
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }
}
