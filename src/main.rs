use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use address_geocoder_lib::{
    export_to_dir, read_csv_rows, AppState, BatchProgress, ProgressObserver,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next().map(PathBuf::from) else {
        bail!("usage: address-geocoder <input.csv> [output_dir]");
    };
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let state = AppState::initialize().context("failed to initialize geocoder")?;
    info!(config = %serde_json::to_string(&state.public_config())?, "loaded configuration");

    let file = File::open(&input).with_context(|| format!("cannot open {}", input.display()))?;
    let mut rows = read_csv_rows(file)?;

    let observer: ProgressObserver = Arc::new(|progress: BatchProgress| {
        info!(
            processed = progress.processed,
            total = progress.total,
            failed = progress.failed,
            "geocoding progress"
        );
    });
    let summary = state.geocode_batch(&mut rows, Some(observer)).await;

    let path = export_to_dir(&output_dir, &rows)?;
    info!(path = %path.display(), "{}", summary.completion_message());
    Ok(())
}
