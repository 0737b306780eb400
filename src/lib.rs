mod batch;
mod cache;
mod config;
mod errors;
mod export;
mod geocode;
mod ingestion;
mod models;
mod pipeline;
mod retry;
mod throttle;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use batch::{geocode_rows, BatchProgress, BatchSummary, ProgressObserver};
pub use cache::{normalize_address, GeocodeCache};
pub use config::{AppConfig, PipelineSettings, PublicAppConfig, DEFAULT_GEOCODE_ENDPOINT};
pub use errors::{AppError, AppResult, GeocodeError, GeocodeErrorKind};
pub use export::{
    export_file_name, export_to_dir, group_by_shift, shift_collection_name, status_label,
    write_csv,
};
pub use geocode::{GeocodeLookup, GeocodeResponse, HttpGeocodeClient};
pub use ingestion::{read_csv_rows, rows_from_records};
pub use models::{AddressRow, Coordinates, RowStatus};
pub use pipeline::{GeocodePipeline, Resolution, ResolutionSource};
pub use retry::{Attempt, RetryPolicy};
pub use throttle::RequestQueue;

/// Session state: configuration plus the single shared pipeline.
pub struct AppState {
    config: AppConfig,
    pipeline: Arc<GeocodePipeline>,
}

impl AppState {
    pub fn initialize() -> AppResult<Self> {
        init_tracing();
        let config = AppConfig::from_env();
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let pipeline = Arc::new(GeocodePipeline::new(&config)?);
        info!(
            endpoint = %config.geocode_endpoint,
            min_interval_ms = config.min_request_interval_ms,
            max_retries = config.max_retries,
            "geocoding pipeline ready"
        );
        Ok(Self { config, pipeline })
    }

    pub fn pipeline(&self) -> Arc<GeocodePipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn public_config(&self) -> PublicAppConfig {
        self.config.public_profile()
    }

    pub async fn geocode_batch(
        &self,
        rows: &mut [AddressRow],
        observer: Option<ProgressObserver>,
    ) -> BatchSummary {
        geocode_rows(&self.pipeline, rows, observer).await
    }
}

pub fn init_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    let _ = INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,address_geocoder_lib=debug"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
