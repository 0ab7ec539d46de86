use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use toml_edit::DocumentMut;
use tracing::{debug, info, warn};

use crate::highlight::{Direction, HighlightBoard, HistoryEntry, Selection};
use crate::model::ScheduleSnapshot;
use crate::normalize::{self, display_offset, FlightRow};

/// Process-wide board state. Highlight selections, flash flags and the
/// retired-highlight history live here for the lifetime of the process
/// and are mutated only on the main execution path.
pub struct App {
    pub airport_code: String,
    pub refresh: Duration,
    pub snapshot: Option<ScheduleSnapshot>,
    pub arrivals: Vec<FlightRow>,
    pub departures: Vec<FlightRow>,
    pub board: HighlightBoard,
    pub highlight_arr: Option<Selection>,
    pub highlight_dep: Option<Selection>,
    pub flash_arr: bool,
    pub flash_dep: bool,
    pub last_error: Option<String>,
    pub last_update: Option<DateTime<FixedOffset>>,
    pub simplified: bool,
    pub config_path: PathBuf,
    pub last_export: Option<String>,
    tick: u64,
}

impl App {
    pub fn new(
        airport_code: String,
        refresh: Duration,
        simplified: bool,
        config_path: PathBuf,
    ) -> Self {
        App {
            airport_code: airport_code.to_uppercase(),
            refresh,
            snapshot: None,
            arrivals: Vec::new(),
            departures: Vec::new(),
            board: HighlightBoard::default(),
            highlight_arr: None,
            highlight_dep: None,
            flash_arr: false,
            flash_dep: false,
            last_error: None,
            last_update: None,
            simplified,
            config_path,
            last_export: None,
            tick: 0,
        }
    }

    /// One refresh cycle with fresh data: normalize, reselect highlights,
    /// clear any previous error.
    pub fn apply_snapshot(&mut self, snapshot: ScheduleSnapshot, now: DateTime<FixedOffset>) {
        debug!(
            "apply_snapshot arrivals={} departures={} fetched_at={}",
            snapshot.arrivals.len(),
            snapshot.departures.len(),
            snapshot.fetched_at_utc
        );
        self.arrivals = normalize::normalize(&snapshot.arrivals);
        self.departures = normalize::normalize(&snapshot.departures);
        self.snapshot = Some(snapshot);
        self.refresh_highlights(now);
        self.last_update = Some(now);
        self.last_error = None;
    }

    /// One refresh cycle without fresh data. The previous rows stay on
    /// the board, but the selector still runs so an expired highlight is
    /// retired on time.
    pub fn apply_error(&mut self, msg: String, now: DateTime<FixedOffset>) {
        warn!("apply_error: {msg}");
        self.last_error = Some(msg);
        self.refresh_highlights(now);
    }

    fn refresh_highlights(&mut self, now: DateTime<FixedOffset>) {
        self.highlight_arr = self.board.select(Direction::Arrival, &self.arrivals, now);
        self.highlight_dep = self.board.select(Direction::Departure, &self.departures, now);
        self.flash_arr = self.board.arrival.flash_active();
        self.flash_dep = self.board.departure.flash_active();
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        self.board.history()
    }

    pub fn last_retired(&self, direction: Direction) -> Option<&HistoryEntry> {
        self.board.last_retired(direction)
    }

    pub fn toggle_simplified(&mut self) {
        self.simplified = !self.simplified;
        debug!(
            "display mode -> {}",
            if self.simplified { "SIMPLIFIED" } else { "FULL" }
        );
        self.persist_simplified();
    }

    /// Writes the display-mode toggle back to the config file, keeping
    /// whatever else the file contains intact.
    fn persist_simplified(&self) {
        let existing = fs::read_to_string(&self.config_path).unwrap_or_default();
        let mut doc = existing
            .parse::<DocumentMut>()
            .unwrap_or_else(|_| DocumentMut::new());
        doc["simplified"] = toml_edit::value(self.simplified);
        if let Err(err) = fs::write(&self.config_path, doc.to_string()) {
            warn!("config save failed: {err}");
        } else {
            info!("display mode saved to {}", self.config_path.display());
        }
    }

    /// Snapshot fetch time rendered in the display timezone, when the
    /// persisted ISO-8601 stamp parses.
    pub fn fetched_at_brt(&self) -> Option<String> {
        let stamp = self.snapshot.as_ref()?.fetched_at_utc.as_str();
        let parsed = DateTime::parse_from_rfc3339(stamp).ok()?;
        Some(
            parsed
                .with_timezone(&display_offset())
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        )
    }

    pub fn set_last_export(&mut self, path: String) {
        info!("exported {path}");
        self.last_export = Some(path);
    }

    pub fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::highlight::Direction;
    use crate::model::{
        EventTime, FlightNode, GenericStatus, GenericStatusText, Identification, RawFlightRecord,
        ScheduleSnapshot, StatusNode,
    };
    use crate::normalize::display_offset;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use std::path::PathBuf;
    use std::time::Duration;

    fn now() -> DateTime<FixedOffset> {
        display_offset()
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .unwrap()
    }

    fn record(callsign: &str, event_utc: i64) -> RawFlightRecord {
        RawFlightRecord {
            flight: Some(FlightNode {
                identification: Some(Identification {
                    callsign: Some(callsign.to_string()),
                    number: None,
                }),
                status: Some(StatusNode {
                    text: None,
                    generic: Some(GenericStatus {
                        status: Some(GenericStatusText {
                            text: Some("estimated".to_string()),
                        }),
                        event_time: Some(EventTime {
                            utc: Some(event_utc),
                        }),
                    }),
                }),
                ..FlightNode::default()
            }),
        }
    }

    fn app() -> App {
        App::new(
            "cgh".to_string(),
            Duration::from_secs(20),
            false,
            PathBuf::from("unused.toml"),
        )
    }

    #[test]
    fn apply_snapshot_populates_rows_and_highlight() {
        let mut app = app();
        let at = now();
        let snapshot = ScheduleSnapshot {
            airport: "CGH".to_string(),
            fetched_at_utc: "2025-06-01T15:00:00Z".to_string(),
            arrivals: vec![record("TAM3100", (at.timestamp()) + 300)],
            departures: Vec::new(),
        };
        app.apply_snapshot(snapshot, at);
        assert_eq!(app.airport_code, "CGH");
        assert_eq!(app.arrivals.len(), 1);
        assert!(app.departures.is_empty());
        let highlight = app.highlight_arr.as_ref().expect("arrival highlight");
        assert_eq!(highlight.row.flight_code, "TAM3100");
        assert!(app.highlight_dep.is_none());
        assert!(app.flash_arr);
        assert!(app.last_error.is_none());
    }

    #[test]
    fn apply_error_keeps_rows_and_advances_expiry() {
        let mut app = app();
        let at = now();
        let snapshot = ScheduleSnapshot {
            airport: "CGH".to_string(),
            fetched_at_utc: "2025-06-01T15:00:00Z".to_string(),
            arrivals: vec![record("TAM3100", at.timestamp() + 300)],
            departures: Vec::new(),
        };
        app.apply_snapshot(snapshot, at);

        // A failed cycle well past the grace window still retires the
        // stale highlight into history.
        let later = at + chrono::Duration::minutes(10);
        app.apply_error("HTTP 503".to_string(), later);
        assert_eq!(app.last_error.as_deref(), Some("HTTP 503"));
        assert_eq!(app.arrivals.len(), 1);
        assert!(app.highlight_arr.is_none());
        assert_eq!(app.history().len(), 1);
        assert_eq!(
            app.last_retired(Direction::Arrival).unwrap().flight_code,
            "TAM3100"
        );
    }

    #[test]
    fn fetched_at_converts_to_display_timezone() {
        let mut app = app();
        app.snapshot = Some(ScheduleSnapshot {
            airport: "CGH".to_string(),
            fetched_at_utc: "2025-06-01T15:00:00Z".to_string(),
            arrivals: Vec::new(),
            departures: Vec::new(),
        });
        assert_eq!(app.fetched_at_brt().as_deref(), Some("2025-06-01 12:00:00"));

        app.snapshot.as_mut().unwrap().fetched_at_utc = "not-a-date".to_string();
        assert!(app.fetched_at_brt().is_none());
    }

    #[test]
    fn toggle_simplified_persists_to_config() {
        let mut dir = std::env::temp_dir();
        dir.push(format!(
            "flightboard-app-test-{}",
            std::process::id()
        ));
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("flightboard.toml");
        std::fs::write(&path, "airport_code = \"cgh\"\n").unwrap();

        let mut app = App::new(
            "cgh".to_string(),
            Duration::from_secs(20),
            false,
            path.clone(),
        );
        app.toggle_simplified();
        assert!(app.simplified);

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("airport_code = \"cgh\""));
        assert!(saved.contains("simplified = true"));

        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }
}
