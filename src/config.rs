use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.flightradar24.com/common/v1/airport.json";
pub const DEFAULT_AIRPORT_CODE: &str = "cgh";
/// Single active refresh cadence for the whole fetch/display cycle.
pub const DEFAULT_REFRESH_SECS: u64 = 20;
pub const DEFAULT_FETCH_LIMIT: u64 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SNAPSHOT_FILE: &str = "flight-schedule.json";
// The provider rejects requests without a browser-like User-Agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub airport_code: String,
    pub refresh: Duration,
    pub fetch_limit: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub snapshot_file: String,
    pub simplified: bool,
    pub collect_once: bool,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
    pub config_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_url: Option<String>,
    airport_code: Option<String>,
    refresh_secs: Option<u64>,
    fetch_limit: Option<u64>,
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    snapshot_file: Option<String>,
    simplified: Option<bool>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

pub fn parse_args() -> Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let env_config = env::var("FLIGHTBOARD_CONFIG").ok().map(PathBuf::from);
    let config_path = explicit_config
        .clone()
        .or(env_config)
        .unwrap_or_else(|| PathBuf::from("flightboard.toml"));

    let mut config = Config {
        api_url: DEFAULT_API_URL.to_string(),
        airport_code: DEFAULT_AIRPORT_CODE.to_string(),
        refresh: Duration::from_secs(DEFAULT_REFRESH_SECS),
        fetch_limit: DEFAULT_FETCH_LIMIT,
        timeout_secs: DEFAULT_TIMEOUT_SECS,
        user_agent: DEFAULT_USER_AGENT.to_string(),
        snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
        simplified: false,
        collect_once: false,
        log_enabled: false,
        log_level: "info".to_string(),
        log_file: "flightboard.log".to_string(),
        config_path: config_path.clone(),
    };

    if config_path.exists() {
        if let Some(file_config) = load_file_config(&config_path)? {
            apply_file_config(&mut config, file_config);
        }
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }

    config.config_path = config_path;

    if let Ok(value) = env::var("FLIGHTBOARD_URL") {
        config.api_url = value;
    }
    if let Ok(value) = env::var("FLIGHTBOARD_AIRPORT") {
        config.airport_code = value;
    }
    if let Ok(value) = env::var("FLIGHTBOARD_REFRESH") {
        if let Ok(secs) = value.parse::<u64>() {
            config.refresh = Duration::from_secs(secs.max(1));
        }
    }
    if let Ok(value) = env::var("FLIGHTBOARD_LIMIT") {
        if let Ok(limit) = value.parse::<u64>() {
            config.fetch_limit = limit.max(1);
        }
    }
    if let Ok(value) = env::var("FLIGHTBOARD_TIMEOUT") {
        if let Ok(secs) = value.parse::<u64>() {
            config.timeout_secs = secs.max(1);
        }
    }
    if let Ok(value) = env::var("FLIGHTBOARD_USER_AGENT") {
        config.user_agent = value;
    }
    if let Ok(value) = env::var("FLIGHTBOARD_SNAPSHOT_FILE") {
        config.snapshot_file = value;
    }
    if let Ok(value) = env::var("FLIGHTBOARD_SIMPLIFIED") {
        config.simplified = env_truthy(&value);
    }
    if let Ok(value) = env::var("FLIGHTBOARD_LOG_ENABLED") {
        config.log_enabled = env_truthy(&value);
    }
    if let Ok(value) = env::var("FLIGHTBOARD_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Ok(value) = env::var("FLIGHTBOARD_LOG_FILE") {
        config.log_file = value;
    }

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                iter.next();
            }
            "--airport" => {
                config.airport_code = iter
                    .next()
                    .ok_or_else(|| anyhow!("--airport needs a value"))?
                    .to_string();
            }
            "--refresh" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--refresh needs a value"))?;
                let secs: u64 = value.parse()?;
                config.refresh = Duration::from_secs(secs.max(1));
            }
            "--simplified" => {
                config.simplified = true;
            }
            "--collect-once" => {
                config.collect_once = true;
            }
            _ => {}
        }
    }

    config.airport_code = config.airport_code.trim().to_ascii_lowercase();
    if config.airport_code.is_empty() {
        return Err(anyhow!("airport code must not be empty"));
    }

    Ok(config)
}

fn load_file_config(path: &Path) -> Result<Option<FileConfig>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => return Err(anyhow!("Failed to read {}: {err}", path.display())),
    };
    let file_config: FileConfig = toml::from_str(&content)
        .map_err(|err| anyhow!("Failed to parse {}: {err}", path.display()))?;
    Ok(Some(file_config))
}

fn apply_file_config(config: &mut Config, file: FileConfig) {
    if let Some(value) = file.api_url {
        config.api_url = value;
    }
    if let Some(value) = file.airport_code {
        config.airport_code = value;
    }
    if let Some(secs) = file.refresh_secs {
        config.refresh = Duration::from_secs(secs.max(1));
    }
    if let Some(value) = file.fetch_limit {
        config.fetch_limit = value.max(1);
    }
    if let Some(value) = file.timeout_secs {
        config.timeout_secs = value.max(1);
    }
    if let Some(value) = file.user_agent {
        config.user_agent = value;
    }
    if let Some(value) = file.snapshot_file {
        config.snapshot_file = value;
    }
    if let Some(value) = file.simplified {
        config.simplified = value;
    }
    if let Some(value) = file.log_enabled {
        config.log_enabled = value;
    }
    if let Some(value) = file.log_level {
        config.log_level = value;
    }
    if let Some(value) = file.log_file {
        config.log_file = value;
    }
}

fn env_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes" | "on")
}
