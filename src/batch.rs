use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::GeocodeError;
use crate::models::{AddressRow, RowStatus};
use crate::pipeline::{GeocodePipeline, Resolution, ResolutionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub api_calls: usize,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn completion_message(&self) -> String {
        format!(
            "Processamento concluído! {} de {} endereços processados.",
            self.processed(),
            self.total
        )
    }
}

pub type ProgressObserver = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Geocodes `rows` in order, one at a time, updating each row in place.
///
/// Pending rows end in `success` or `error`; rows that are already terminal
/// are left untouched but still counted. Progress is reported after every
/// row whatever its outcome. The batch always runs to the end.
pub async fn geocode_rows(
    pipeline: &GeocodePipeline,
    rows: &mut [AddressRow],
    observer: Option<ProgressObserver>,
) -> BatchSummary {
    let total = rows.len();
    let mut summary = BatchSummary {
        total,
        ..BatchSummary::default()
    };

    for (idx, row) in rows.iter_mut().enumerate() {
        match row.status {
            RowStatus::Success => summary.succeeded += 1,
            RowStatus::Error => summary.failed += 1,
            RowStatus::Pending => {
                let outcome = pipeline.resolve(&row.raw_address).await;
                record_outcome(idx, row, outcome, &mut summary);
            }
        }

        if let Some(callback) = &observer {
            callback(BatchProgress {
                processed: idx + 1,
                total,
                succeeded: summary.succeeded,
                failed: summary.failed,
            });
        }
    }

    info!(
        total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        cache_hits = summary.cache_hits,
        "geocoding batch finished"
    );
    summary
}

fn record_outcome(
    idx: usize,
    row: &mut AddressRow,
    outcome: Result<Resolution, GeocodeError>,
    summary: &mut BatchSummary,
) {
    match outcome {
        Ok(resolution) => {
            match resolution.source {
                ResolutionSource::Cache => summary.cache_hits += 1,
                ResolutionSource::Api => summary.api_calls += 1,
            }
            row.mark_success(resolution.coordinates);
            summary.succeeded += 1;
        }
        Err(err) => {
            warn!(row = idx, name = %row.name, ?err, "failed to geocode row");
            let message = err.row_message(&row.raw_address);
            row.mark_error(message);
            summary.failed += 1;
        }
    }
}
