use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Top of the provider response. Every level is optional because the
/// upstream schema drifts; the interesting payload sits at
/// `result.response.airport.pluginData.schedule`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub result: Option<ProviderResult>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderResult {
    #[serde(default)]
    pub response: Option<ProviderInner>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderInner {
    #[serde(default)]
    pub airport: Option<AirportNode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AirportNode {
    #[serde(default, rename = "pluginData")]
    pub plugin_data: Option<PluginData>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PluginData {
    #[serde(default)]
    pub schedule: Option<ScheduleNode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScheduleNode {
    #[serde(default)]
    pub arrivals: Option<BoardNode>,
    #[serde(default)]
    pub departures: Option<BoardNode>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BoardNode {
    #[serde(default)]
    pub data: Vec<RawFlightRecord>,
}

impl ProviderResponse {
    /// Walks down to the schedule node, or `None` if any segment of the
    /// expected path is missing or renamed.
    pub fn into_schedule(self) -> Option<ScheduleNode> {
        self.result?.response?.airport?.plugin_data?.schedule
    }
}

/// One raw arrival or departure entry as delivered by the provider.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawFlightRecord {
    #[serde(default)]
    pub flight: Option<FlightNode>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FlightNode {
    #[serde(default)]
    pub identification: Option<Identification>,
    #[serde(default)]
    pub status: Option<StatusNode>,
    #[serde(default)]
    pub time: Option<TimeNode>,
    #[serde(default)]
    pub airport: Option<AirportPair>,
    #[serde(default)]
    pub aircraft: Option<AircraftNode>,
    #[serde(default)]
    pub airline: Option<AirlineNode>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Identification {
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub number: Option<FlightNumber>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FlightNumber {
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct StatusNode {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub generic: Option<GenericStatus>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GenericStatus {
    #[serde(default)]
    pub status: Option<GenericStatusText>,
    #[serde(default, rename = "eventTime")]
    pub event_time: Option<EventTime>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct GenericStatusText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct EventTime {
    #[serde(default, deserialize_with = "de_opt_i64_from_any")]
    pub utc: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct TimeNode {
    #[serde(default)]
    pub scheduled: Option<ScheduledTimes>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ScheduledTimes {
    #[serde(default, deserialize_with = "de_opt_i64_from_any")]
    pub arrival: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64_from_any")]
    pub departure: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AirportPair {
    #[serde(default)]
    pub origin: Option<AirportRef>,
    #[serde(default)]
    pub destination: Option<AirportRef>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AirportRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<AirportCode>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AirportCode {
    #[serde(default)]
    pub iata: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AircraftNode {
    #[serde(default)]
    pub model: Option<AircraftModel>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AircraftModel {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AirlineNode {
    #[serde(default)]
    pub name: Option<String>,
}

/// The persisted batch of arrivals/departures. Each fetch fully replaces
/// the previous one; there is no merging.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ScheduleSnapshot {
    pub airport: String,
    pub fetched_at_utc: String,
    #[serde(default)]
    pub arrivals: Vec<RawFlightRecord>,
    #[serde(default)]
    pub departures: Vec<RawFlightRecord>,
}

fn de_opt_i64_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(Some(value))
            } else if let Some(value) = number.as_f64() {
                Ok(Some(value as i64))
            } else {
                Ok(None)
            }
        }
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else if let Ok(value) = trimmed.parse::<i64>() {
                Ok(Some(value))
            } else if let Ok(value) = trimmed.parse::<f64>() {
                Ok(Some(value as i64))
            } else {
                Ok(None)
            }
        }
        Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "expected number or null, got {other}"
        ))),
    }
}
