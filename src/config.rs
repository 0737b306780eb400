use std::time::Duration;
use std::env;

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_MIN_INTERVAL_MS: u64 = 200;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub google_maps_api_key: Option<SecretString>,
    pub geocode_endpoint: String,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub http_timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct PublicAppConfig {
    pub geocode_endpoint: String,
    pub min_request_interval_ms: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub http_timeout_secs: Option<u64>,
    pub has_google_maps_key: bool,
}

/// Timing knobs shared by the queue and the retry controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineSettings {
    pub min_interval: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(DEFAULT_MIN_INTERVAL_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv_if_applicable();
        Self {
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
            geocode_endpoint: env::var("GEOCODE_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GEOCODE_ENDPOINT.to_string()),
            min_request_interval_ms: parse_u64("GEOCODE_MIN_INTERVAL_MS", DEFAULT_MIN_INTERVAL_MS),
            max_retries: parse_u32("GEOCODE_MAX_RETRIES", DEFAULT_MAX_RETRIES),
            initial_backoff_ms: parse_u64("GEOCODE_INITIAL_BACKOFF_MS", DEFAULT_INITIAL_BACKOFF_MS),
            http_timeout_secs: env::var("GEOCODE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0),
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            min_interval: Duration::from_millis(self.min_request_interval_ms),
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
        }
    }

    pub fn public_profile(&self) -> PublicAppConfig {
        PublicAppConfig {
            geocode_endpoint: self.geocode_endpoint.clone(),
            min_request_interval_ms: self.min_request_interval_ms,
            max_retries: self.max_retries,
            initial_backoff_ms: self.initial_backoff_ms,
            http_timeout_secs: self.http_timeout_secs,
            has_google_maps_key: self.google_maps_api_key.is_some(),
        }
    }
}

fn load_dotenv_if_applicable() {
    if !cfg!(debug_assertions) && !parse_bool("ALLOW_DOTENV", false) {
        debug!("release build without ALLOW_DOTENV; ignoring .env");
        return;
    }

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => debug!(?err, "unable to load .env file"),
    }
}

fn parse_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn parse_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}
