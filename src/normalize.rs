use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::model::{FlightNode, RawFlightRecord};

/// Label used when the raw status is missing or not in the translation table.
pub const UNKNOWN_STATUS_LABEL: &str = "Status desconhecido";

/// Display timezone for the board: America/Sao_Paulo, fixed UTC-03:00
/// (no DST under current rules).
pub fn display_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("UTC-03:00 is a valid offset")
}

/// One display-ready row. Produced once per raw record, in provider order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlightRow {
    /// "HH:MMh", or empty when no event time could be resolved.
    pub time_label: String,
    pub flight_code: String,
    /// Origin name for arrivals, destination name for departures.
    pub route_label: String,
    /// IATA code of the same endpoint, used by the simplified layout.
    pub route_code: String,
    pub carrier: String,
    pub aircraft: String,
    /// Translated status, with the clock time appended where the status
    /// has a time concept ("Estimado às 14:05").
    pub status_label: String,
    pub raw_status: String,
    pub event_time: Option<DateTime<FixedOffset>>,
}

/// Converts raw records into display rows. Pure: same input, same output.
/// Records with malformed or missing fields still produce a row with the
/// affected fields blank.
pub fn normalize(records: &[RawFlightRecord]) -> Vec<FlightRow> {
    records.iter().map(row_from_record).collect()
}

fn row_from_record(record: &RawFlightRecord) -> FlightRow {
    let Some(flight) = record.flight.as_ref() else {
        return FlightRow {
            status_label: UNKNOWN_STATUS_LABEL.to_string(),
            raw_status: "unknown".to_string(),
            ..FlightRow::default()
        };
    };

    let flight_code = resolve_flight_code(flight);
    let raw_status = resolve_status(flight);
    let event_time = resolve_event_time(flight)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        .map(|dt| dt.with_timezone(&display_offset()));

    let clock = event_time
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default();
    let time_label = if clock.is_empty() {
        String::new()
    } else {
        format!("{clock}h")
    };

    let (route_label, route_code) = resolve_route(flight);

    FlightRow {
        time_label,
        flight_code,
        route_label,
        route_code,
        carrier: flight
            .airline
            .as_ref()
            .and_then(|a| a.name.clone())
            .unwrap_or_default(),
        aircraft: resolve_aircraft(flight),
        status_label: translate_status(&raw_status, &clock),
        raw_status,
        event_time,
    }
}

/// Callsign, else the flight-number default, else empty.
fn resolve_flight_code(flight: &FlightNode) -> String {
    flight
        .identification
        .as_ref()
        .and_then(|id| {
            id.callsign.clone().or_else(|| {
                id.number.as_ref().and_then(|number| number.default.clone())
            })
        })
        .unwrap_or_default()
}

/// Generic status text, else top-level status text, else literal "unknown".
fn resolve_status(flight: &FlightNode) -> String {
    flight
        .status
        .as_ref()
        .and_then(|status| {
            status
                .generic
                .as_ref()
                .and_then(|generic| generic.status.as_ref())
                .and_then(|inner| inner.text.clone())
                .or_else(|| status.text.clone())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Generic event time, else scheduled arrival, else scheduled departure.
fn resolve_event_time(flight: &FlightNode) -> Option<i64> {
    let generic = flight
        .status
        .as_ref()
        .and_then(|status| status.generic.as_ref())
        .and_then(|generic| generic.event_time.as_ref())
        .and_then(|event| event.utc);
    let scheduled = flight.time.as_ref().and_then(|time| time.scheduled.as_ref());
    generic
        .or_else(|| scheduled.and_then(|s| s.arrival))
        .or_else(|| scheduled.and_then(|s| s.departure))
}

/// Origin if present, else destination, else blank. Code follows the same
/// endpoint that supplied the name.
fn resolve_route(flight: &FlightNode) -> (String, String) {
    let pair = flight.airport.as_ref();
    let origin = pair.and_then(|p| p.origin.as_ref());
    let destination = pair.and_then(|p| p.destination.as_ref());
    let endpoint = origin
        .filter(|e| e.name.as_deref().is_some_and(|n| !n.is_empty()))
        .or(destination);
    let name = endpoint
        .and_then(|e| e.name.clone())
        .unwrap_or_default();
    let code = endpoint
        .and_then(|e| e.code.as_ref())
        .and_then(|c| c.iata.clone())
        .unwrap_or_default();
    (name, code)
}

fn resolve_aircraft(flight: &FlightNode) -> String {
    flight
        .aircraft
        .as_ref()
        .and_then(|aircraft| aircraft.model.as_ref())
        .and_then(|model| model.text.clone().or_else(|| model.code.clone()))
        .unwrap_or_default()
}

/// Fixed translation table, matched case-insensitively. Statuses with no
/// time concept (cancelled, unknown) never get a clock suffix.
pub fn translate_status(raw: &str, clock: &str) -> String {
    let key = raw.trim().to_ascii_lowercase();
    let (label, takes_time) = match key.as_str() {
        "landed" => ("Pouso estimado às", true),
        "estimated" => ("Estimado às", true),
        "scheduled" => ("Programado para", true),
        "delayed" => ("Atrasado para", true),
        "cancelled" => ("Cancelado", false),
        "departed" => ("Partida estimada às", true),
        _ => (UNKNOWN_STATUS_LABEL, false),
    };
    if takes_time && !clock.is_empty() {
        format!("{label} {clock}")
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, translate_status, FlightRow, UNKNOWN_STATUS_LABEL};
    use crate::model::RawFlightRecord;

    fn record(json: &str) -> RawFlightRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn flight_code_falls_back_to_number_default() {
        let rows = normalize(&[record(
            r#"{"flight": {"identification": {"number": {"default": "G31234"}}}}"#,
        )]);
        assert_eq!(rows[0].flight_code, "G31234");

        let rows = normalize(&[record(
            r#"{"flight": {"identification": {"callsign": "GLO1234", "number": {"default": "G31234"}}}}"#,
        )]);
        assert_eq!(rows[0].flight_code, "GLO1234");

        let rows = normalize(&[record(r#"{"flight": {}}"#)]);
        assert_eq!(rows[0].flight_code, "");
    }

    #[test]
    fn unknown_status_is_case_insensitive() {
        assert_eq!(translate_status("TAXIING", "12:00"), UNKNOWN_STATUS_LABEL);
        assert_eq!(translate_status("diverted", ""), UNKNOWN_STATUS_LABEL);
        assert_eq!(translate_status("", ""), UNKNOWN_STATUS_LABEL);
        assert_eq!(translate_status("LANDED", "09:30"), "Pouso estimado às 09:30");
        assert_eq!(translate_status(" Estimated ", "10:00"), "Estimado às 10:00");
    }

    #[test]
    fn cancelled_never_gets_a_clock_suffix() {
        assert_eq!(translate_status("cancelled", "08:15"), "Cancelado");
        assert_eq!(translate_status("Cancelled", ""), "Cancelado");
    }

    #[test]
    fn event_time_renders_in_brt() {
        // 2025-01-01 00:00:00 UTC is 2024-12-31 21:00 in UTC-3.
        let rows = normalize(&[record(
            r#"{"flight": {"status": {"generic": {"status": {"text": "estimated"}, "eventTime": {"utc": 1735689600}}}}}"#,
        )]);
        assert_eq!(rows[0].time_label, "21:00h");
        assert_eq!(rows[0].status_label, "Estimado às 21:00");
        assert!(rows[0].event_time.is_some());
    }

    #[test]
    fn event_time_falls_back_to_scheduled_times() {
        let rows = normalize(&[record(
            r#"{"flight": {"time": {"scheduled": {"arrival": 1735693200}}}}"#,
        )]);
        // 2025-01-01 01:00:00 UTC -> 22:00 BRT.
        assert_eq!(rows[0].time_label, "22:00h");

        let rows = normalize(&[record(
            r#"{"flight": {"time": {"scheduled": {"departure": 1735693200}}}}"#,
        )]);
        assert_eq!(rows[0].time_label, "22:00h");
    }

    #[test]
    fn missing_event_time_leaves_row_blank_but_present() {
        let rows = normalize(&[record(r#"{"flight": {"airline": {"name": "GOL"}}}"#)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time_label, "");
        assert_eq!(rows[0].carrier, "GOL");
        assert!(rows[0].event_time.is_none());
    }

    #[test]
    fn route_prefers_origin_over_destination() {
        let rows = normalize(&[record(
            r#"{"flight": {"airport": {
                "origin": {"name": "Congonhas", "code": {"iata": "CGH"}},
                "destination": {"name": "Galeão", "code": {"iata": "GIG"}}
            }}}"#,
        )]);
        assert_eq!(rows[0].route_label, "Congonhas");
        assert_eq!(rows[0].route_code, "CGH");

        let rows = normalize(&[record(
            r#"{"flight": {"airport": {"destination": {"name": "Galeão", "code": {"iata": "GIG"}}}}}"#,
        )]);
        assert_eq!(rows[0].route_label, "Galeão");
        assert_eq!(rows[0].route_code, "GIG");
    }

    #[test]
    fn aircraft_prefers_model_text_over_code() {
        let rows = normalize(&[record(
            r#"{"flight": {"aircraft": {"model": {"code": "B738"}}}}"#,
        )]);
        assert_eq!(rows[0].aircraft, "B738");

        let rows = normalize(&[record(
            r#"{"flight": {"aircraft": {"model": {"text": "Boeing 737-800", "code": "B738"}}}}"#,
        )]);
        assert_eq!(rows[0].aircraft, "Boeing 737-800");
    }

    #[test]
    fn normalize_is_idempotent() {
        let records = vec![
            record(
                r#"{"flight": {"identification": {"callsign": "AZU4567"},
                    "status": {"generic": {"status": {"text": "scheduled"}, "eventTime": {"utc": 1735696800}}},
                    "airline": {"name": "Azul"}}}"#,
            ),
            record(r#"{"flight": {}}"#),
            record(r#"{}"#),
        ];
        let first: Vec<FlightRow> = normalize(&records);
        let second: Vec<FlightRow> = normalize(&records);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
