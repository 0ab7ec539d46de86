use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::{ProviderResponse, RawFlightRecord, ScheduleSnapshot};
use crate::storage;

/// Records kept per direction when building a snapshot.
pub const SCHEDULE_KEEP: usize = 10;

/// Everything the fetcher needs from the configuration.
#[derive(Clone, Debug)]
pub struct FetchSettings {
    pub api_url: String,
    pub airport_code: String,
    pub limit: u64,
    pub timeout: Duration,
    pub user_agent: String,
    pub snapshot_path: PathBuf,
}

impl FetchSettings {
    pub fn from_config(config: &Config) -> Self {
        FetchSettings {
            api_url: config.api_url.clone(),
            airport_code: config.airport_code.clone(),
            limit: config.fetch_limit,
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
            snapshot_path: PathBuf::from(&config.snapshot_file),
        }
    }
}

/// Spawns the background fetch loop: one request per cycle, snapshot
/// persisted on success, outcome reported over `tx`. A unit message on
/// `wake_rx` forces an early cycle (manual refresh); there is no retry
/// or backoff inside a cycle.
pub fn spawn_fetcher(
    settings: FetchSettings,
    refresh: Duration,
    tx: Sender<Result<ScheduleSnapshot, String>>,
    wake_rx: Receiver<()>,
) {
    thread::spawn(move || {
        info!("fetcher started for {}", settings.airport_code.to_uppercase());
        let client = match build_client(&settings) {
            Ok(client) => client,
            Err(err) => {
                warn!("client error: {err}");
                let _ = tx.send(Err(format!("Client error: {err}")));
                return;
            }
        };

        let sleep = if refresh.is_zero() {
            Duration::from_millis(200)
        } else {
            refresh
        };

        loop {
            let outcome = fetch_once(&client, &settings);
            match &outcome {
                Ok(snapshot) => {
                    if let Err(err) = storage::save_snapshot(&settings.snapshot_path, snapshot) {
                        warn!("snapshot write failed: {err:#}");
                    }
                    info!(
                        "fetched {} arrivals, {} departures",
                        snapshot.arrivals.len(),
                        snapshot.departures.len()
                    );
                }
                Err(err) => warn!("fetch failed: {err}"),
            }
            if tx.send(outcome).is_err() {
                debug!("receiver dropped, exiting fetcher");
                break;
            }
            match wake_rx.recv_timeout(sleep) {
                Ok(()) => debug!("manual refresh requested"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });
}

/// One-shot collector mode: fetch and persist a single snapshot. Errors
/// are logged and swallowed so the process still exits cleanly; the next
/// scheduled invocation simply tries again.
pub fn collect_once(settings: &FetchSettings) {
    let client = match build_client(settings) {
        Ok(client) => client,
        Err(err) => {
            warn!("client error: {err}");
            return;
        }
    };
    match fetch_once(&client, settings) {
        Ok(snapshot) => {
            if let Err(err) = storage::save_snapshot(&settings.snapshot_path, &snapshot) {
                warn!("snapshot write failed: {err:#}");
                return;
            }
            info!(
                "saved {} arrivals and {} departures to {}",
                snapshot.arrivals.len(),
                snapshot.departures.len(),
                settings.snapshot_path.display()
            );
        }
        Err(err) => warn!("fetch failed: {err}"),
    }
}

fn build_client(settings: &FetchSettings) -> reqwest::Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.timeout)
        .build()
}

/// Issues a single schedule request and shapes the response into a
/// snapshot. Any failure (transport, non-2xx, body shape, missing
/// nested path) leaves the previous snapshot untouched.
fn fetch_once(
    client: &reqwest::blocking::Client,
    settings: &FetchSettings,
) -> Result<ScheduleSnapshot, String> {
    let timestamp = Utc::now().timestamp().to_string();
    let limit = settings.limit.to_string();
    let resp = client
        .get(settings.api_url.as_str())
        .query(&[
            ("code", settings.airport_code.as_str()),
            ("plugin[]", "schedule"),
            ("plugin-setting[schedule][mode]", ""),
            ("plugin-setting[schedule][timestamp]", timestamp.as_str()),
            ("page", "1"),
            ("limit", limit.as_str()),
        ])
        .send()
        .map_err(|err| err.to_string())?;

    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {status}"));
    }

    let body: ProviderResponse = resp.json().map_err(|err| err.to_string())?;
    let schedule = body.into_schedule().ok_or_else(|| {
        "missing path result.response.airport.pluginData.schedule in response".to_string()
    })?;

    Ok(ScheduleSnapshot {
        airport: settings.airport_code.to_uppercase(),
        fetched_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        arrivals: keep_first(schedule.arrivals.map(|b| b.data).unwrap_or_default()),
        departures: keep_first(schedule.departures.map(|b| b.data).unwrap_or_default()),
    })
}

fn keep_first(mut records: Vec<RawFlightRecord>) -> Vec<RawFlightRecord> {
    records.truncate(SCHEDULE_KEEP);
    records
}


#[cfg(all(test, feature = "net-tests"))]
mod net_tests {
    use super::{fetch_once, FetchSettings};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    fn settings(url: String) -> FetchSettings {
        FetchSettings {
            api_url: url,
            airport_code: "cgh".to_string(),
            limit: 100,
            timeout: Duration::from_secs(5),
            user_agent: "test-agent".to_string(),
            snapshot_path: PathBuf::from("unused.json"),
        }
    }

    #[test]
    fn fetch_once_paths() {
        let client = reqwest::blocking::Client::builder().build().unwrap();
        if let Ok(listener) = TcpListener::bind("127.0.0.1:0") {
            let addr = listener.local_addr().unwrap();

            thread::spawn(move || {
                if let Ok((mut stream, _)) = listener.accept() {
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf);
                    let body = r#"{"result":{"response":{"airport":{"pluginData":{"schedule":{
                        "arrivals":{"data":[{"flight":{"identification":{"callsign":"TAM3100"}}}]},
                        "departures":{"data":[]}
                    }}}}}}"#;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/json\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            });

            let url = format!("http://{}", addr);
            let snapshot = fetch_once(&client, &settings(url)).expect("fetch ok");
            assert_eq!(snapshot.airport, "CGH");
            assert_eq!(snapshot.arrivals.len(), 1);
            assert!(snapshot.departures.is_empty());
            assert!(snapshot.fetched_at_utc.ends_with('Z'));
        } else {
            let url = "http://127.0.0.1:1".to_string();
            assert!(fetch_once(&client, &settings(url)).is_err());
        }
    }
}
