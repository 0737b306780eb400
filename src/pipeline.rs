use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::cache::GeocodeCache;
use crate::config::{AppConfig, PipelineSettings};
use crate::errors::{AppResult, GeocodeError};
use crate::geocode::{GeocodeLookup, HttpGeocodeClient};
use crate::models::Coordinates;
use crate::retry::RetryPolicy;
use crate::throttle::RequestQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Cache,
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    pub coordinates: Coordinates,
    pub source: ResolutionSource,
}

/// Owns the per-session cache and request gate.
///
/// Share one instance (behind an `Arc`) between the batch driver and any
/// ad-hoc callers so that every outbound call goes through the same gate.
pub struct GeocodePipeline {
    cache: GeocodeCache,
    queue: RequestQueue,
    retry: RetryPolicy,
    lookup: Arc<dyn GeocodeLookup>,
}

impl GeocodePipeline {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let client = HttpGeocodeClient::new(config)?;
        Ok(Self::with_lookup(
            Arc::new(client),
            config.pipeline_settings(),
        ))
    }

    pub fn with_lookup(lookup: Arc<dyn GeocodeLookup>, settings: PipelineSettings) -> Self {
        Self {
            cache: GeocodeCache::new(),
            queue: RequestQueue::new(settings.min_interval),
            retry: RetryPolicy::from_settings(&settings),
            lookup,
        }
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    pub async fn resolve(&self, address: &str) -> Result<Resolution, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::InvalidRequest("empty address".into()));
        }

        if let Some(coordinates) = self.cache.lookup(address) {
            debug!(address, "geocode cache hit");
            return Ok(Resolution {
                coordinates,
                source: ResolutionSource::Cache,
            });
        }

        let coordinates = self
            .retry
            .run(move |_attempt| self.queue.enqueue(move || self.lookup.resolve(address)))
            .await?;
        self.cache.store(address, coordinates);
        Ok(Resolution {
            coordinates,
            source: ResolutionSource::Api,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;

    /// Lookup double replaying scripted outcomes per address.
    #[derive(Default)]
    pub struct ScriptedLookup {
        scripts: Mutex<HashMap<String, Vec<Result<Coordinates, GeocodeError>>>>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl ScriptedLookup {
        pub fn respond(
            self,
            address: &str,
            mut outcomes: Vec<Result<Coordinates, GeocodeError>>,
        ) -> Self {
            outcomes.reverse();
            self.scripts.lock().insert(address.to_string(), outcomes);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().iter().map(|(address, _)| address.clone()).collect()
        }

        /// Every call with the instant it reached the lookup.
        pub fn timeline(&self) -> Vec<(String, Instant)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl GeocodeLookup for ScriptedLookup {
        async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
            self.calls.lock().push((address.to_string(), Instant::now()));
            self.scripts
                .lock()
                .get_mut(address)
                .and_then(|outcomes| outcomes.pop())
                .unwrap_or(Err(GeocodeError::ZeroResults))
        }
    }

    pub fn fast_settings() -> PipelineSettings {
        PipelineSettings {
            min_interval: std::time::Duration::from_millis(200),
            max_retries: 3,
            initial_backoff: std::time::Duration::from_millis(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{fast_settings, ScriptedLookup};
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn second_resolve_is_served_from_cache() {
        let lookup = Arc::new(
            ScriptedLookup::default().respond("Rua A, 100", vec![Ok(Coordinates::new(1.0, 2.0))]),
        );
        let pipeline = GeocodePipeline::with_lookup(lookup.clone(), fast_settings());

        let first = pipeline.resolve("Rua A, 100").await.unwrap();
        let second = pipeline.resolve("Rua A, 100").await.unwrap();

        assert_eq!(first.source, ResolutionSource::Api);
        assert_eq!(second.source, ResolutionSource::Cache);
        assert_eq!(second.coordinates, Coordinates::new(1.0, 2.0));
        assert_eq!(lookup.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let lookup = Arc::new(ScriptedLookup::default().respond(
            "Rua Z, 1",
            vec![Err(GeocodeError::ZeroResults), Ok(Coordinates::new(5.0, 6.0))],
        ));
        let pipeline = GeocodePipeline::with_lookup(lookup.clone(), fast_settings());

        assert_eq!(
            pipeline.resolve("Rua Z, 1").await,
            Err(GeocodeError::ZeroResults)
        );
        assert!(pipeline.cache().is_empty());

        let retried = pipeline.resolve("Rua Z, 1").await.unwrap();
        assert_eq!(retried.source, ResolutionSource::Api);
        assert_eq!(lookup.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_quota_errors_through_the_queue() {
        let lookup = Arc::new(ScriptedLookup::default().respond(
            "Rua B, 200",
            vec![
                Err(GeocodeError::OverQueryLimit),
                Err(GeocodeError::OverQueryLimit),
                Ok(Coordinates::new(3.0, 4.0)),
            ],
        ));
        let pipeline = GeocodePipeline::with_lookup(lookup.clone(), fast_settings());

        let resolved = pipeline.resolve("Rua B, 200").await.unwrap();
        assert_eq!(resolved.coordinates, Coordinates::new(3.0, 4.0));
        assert_eq!(lookup.calls().len(), 3);
        assert!(pipeline.cache().lookup("rua b, 200").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_and_other_callers_share_the_request_interval() {
        let lookup = Arc::new(
            ScriptedLookup::default()
                .respond(
                    "A",
                    vec![
                        Err(GeocodeError::OverQueryLimit),
                        Err(GeocodeError::OverQueryLimit),
                        Ok(Coordinates::new(1.0, 1.0)),
                    ],
                )
                .respond("B", vec![Ok(Coordinates::new(2.0, 2.0))])
                .respond("C", vec![Ok(Coordinates::new(3.0, 3.0))]),
        );
        let settings = fast_settings();
        let min_interval = settings.min_interval;
        let pipeline = GeocodePipeline::with_lookup(lookup.clone(), settings);

        let (a, b, c) = tokio::join!(
            pipeline.resolve("A"),
            pipeline.resolve("B"),
            pipeline.resolve("C")
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        let timeline = lookup.timeline();
        let order: Vec<&str> = timeline.iter().map(|(address, _)| address.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C", "A", "A"]);
        for pair in timeline.windows(2) {
            let gap = pair[1].1 - pair[0].1;
            assert!(
                gap >= min_interval,
                "{} -> {} only {gap:?} apart",
                pair[0].0,
                pair[1].0
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn blank_addresses_never_reach_the_network() {
        let lookup = Arc::new(ScriptedLookup::default());
        let pipeline = GeocodePipeline::with_lookup(lookup.clone(), fast_settings());

        assert!(matches!(
            pipeline.resolve("   ").await,
            Err(GeocodeError::InvalidRequest(_))
        ));
        assert!(lookup.calls().is_empty());
    }
}
