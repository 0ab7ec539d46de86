mod app;
mod config;
mod export;
mod highlight;
mod logging;
mod model;
mod net;
mod normalize;
mod runtime;
mod storage;
mod ui;

use anyhow::Result;
use chrono::Utc;
use std::sync::mpsc;

use app::App;
use config::parse_args;
use logging::init as init_logging;
use net::{collect_once, spawn_fetcher, FetchSettings};
use normalize::display_offset;
use runtime::{init_terminal, restore_terminal, run_app};
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    info!("flightboard starting");
    debug!("config path: {}", config.config_path.display());

    let settings = FetchSettings::from_config(&config);

    // One-shot collector mode: fetch, persist, exit. Failures are logged
    // only; the exit code stays zero so schedulers just call again later.
    if config.collect_once {
        collect_once(&settings);
        info!("flightboard collector done");
        return Ok(());
    }

    let mut app = App::new(
        config.airport_code.clone(),
        config.refresh,
        config.simplified,
        config.config_path.clone(),
    );

    // Start from the last persisted snapshot so the board is not blank
    // while the first fetch is in flight.
    match storage::load_snapshot(&settings.snapshot_path) {
        Ok(Some(snapshot)) => {
            let now = Utc::now().with_timezone(&display_offset());
            app.apply_snapshot(snapshot, now);
        }
        Ok(None) => {}
        Err(err) => warn!("ignoring unreadable snapshot: {err:#}"),
    }

    let (tx, rx) = mpsc::channel();
    let (refresh_tx, refresh_rx) = mpsc::channel();
    spawn_fetcher(settings, config.refresh, tx, refresh_rx);

    let mut terminal = init_terminal()?;
    let res = run_app(&mut terminal, app, rx, refresh_tx);
    restore_terminal(&mut terminal)?;

    if let Err(err) = res {
        warn!("runtime error: {err}");
        eprintln!("{err}");
    }

    info!("flightboard exited");
    Ok(())
}
