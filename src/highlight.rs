use std::collections::VecDeque;

use chrono::{DateTime, Duration, FixedOffset};
use tracing::{debug, info};

use crate::normalize::FlightRow;

/// Rows closer than this to `now` are skipped when picking a new highlight.
const SELECTION_LEAD_SECS: i64 = 120;
/// A highlight stays on the board until this long after its event time.
const SELECTION_GRACE_SECS: i64 = 60;
/// Refresh cycles the flash emphasis survives after a highlight change.
pub const FLASH_CYCLES: u8 = 6;
/// Combined history capacity across both directions.
pub const HISTORY_CAP: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Arrival,
    Departure,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Arrival => "Chegada",
            Direction::Departure => "Partida",
        }
    }
}

/// An active highlight: the row plus its position in the source list,
/// which serves as its identity for change detection.
#[derive(Clone, Debug)]
pub struct Selection {
    pub row: FlightRow,
    pub index: usize,
}

#[derive(Clone, Debug, Default)]
pub struct HighlightState {
    current: Option<Selection>,
    last_index: Option<usize>,
    flash: u8,
}

impl HighlightState {
    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Reports whether the flash emphasis is still live and burns one cycle.
    /// Call once per refresh pass, not per frame.
    pub fn flash_active(&mut self) -> bool {
        let active = self.flash > 0;
        if active {
            self.flash -= 1;
        }
        active
    }
}

/// A retired highlight, kept for the rolling history panel.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub direction: Direction,
    pub time_label: String,
    pub flight_code: String,
    pub route_label: String,
    pub carrier: String,
    pub status_label: String,
}

/// All cross-refresh highlight state: one slot per direction plus the
/// shared bounded history. Owned by the hosting process and reset only
/// on restart.
#[derive(Clone, Debug, Default)]
pub struct HighlightBoard {
    pub arrival: HighlightState,
    pub departure: HighlightState,
    history: VecDeque<HistoryEntry>,
}

impl HighlightBoard {
    /// Picks the next relevant flight for one direction.
    ///
    /// An existing selection is sticky until one minute past its event
    /// time, so it does not vanish at the moment of arrival/departure.
    /// Once expired it is retired into the history and the earliest row
    /// at least two minutes out from `now` takes its place. `now` is
    /// threaded in by the caller; this never reads the wall clock.
    pub fn select(
        &mut self,
        direction: Direction,
        rows: &[FlightRow],
        now: DateTime<FixedOffset>,
    ) -> Option<Selection> {
        let retired = {
            let state = self.state_mut(direction);
            if let Some(selection) = state.current.as_ref() {
                let still_valid = selection
                    .row
                    .event_time
                    .is_some_and(|at| now < at + Duration::seconds(SELECTION_GRACE_SECS));
                if still_valid {
                    return Some(selection.clone());
                }
            }
            state.current.take()
        };
        if let Some(selection) = retired {
            self.record_history(direction, &selection.row);
        }

        let threshold = now + Duration::seconds(SELECTION_LEAD_SECS);
        let mut best: Option<(usize, DateTime<FixedOffset>)> = None;
        for (index, row) in rows.iter().enumerate() {
            let Some(at) = row.event_time else { continue };
            if at < threshold {
                continue;
            }
            if best.is_none_or(|(_, best_at)| at < best_at) {
                best = Some((index, at));
            }
        }

        let state = self.state_mut(direction);
        let (index, _) = best?;
        if state.last_index != Some(index) {
            debug!(
                "highlight change {} -> index {index} ({})",
                direction.label(),
                rows[index].flight_code
            );
            state.flash = FLASH_CYCLES;
        }
        state.last_index = Some(index);
        let selection = Selection {
            row: rows[index].clone(),
            index,
        };
        state.current = Some(selection.clone());
        Some(selection)
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    /// Most recent retired highlight for one direction, if any.
    pub fn last_retired(&self, direction: Direction) -> Option<&HistoryEntry> {
        self.history.iter().find(|entry| entry.direction == direction)
    }

    fn record_history(&mut self, direction: Direction, row: &FlightRow) {
        info!(
            "highlight retired: {} {} {}",
            direction.label(),
            row.flight_code,
            row.time_label
        );
        self.history.push_front(HistoryEntry {
            direction,
            time_label: row.time_label.clone(),
            flight_code: row.flight_code.clone(),
            route_label: row.route_label.clone(),
            carrier: row.carrier.clone(),
            status_label: row.status_label.clone(),
        });
        self.history.truncate(HISTORY_CAP);
    }

    fn state_mut(&mut self, direction: Direction) -> &mut HighlightState {
        match direction {
            Direction::Arrival => &mut self.arrival,
            Direction::Departure => &mut self.departure,
        }
    }
}
