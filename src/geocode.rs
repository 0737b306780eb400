use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult, GeocodeError};
use crate::models::Coordinates;

/// Single-attempt address resolution. Retries live in the pipeline.
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

pub struct HttpGeocodeClient {
    http: Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpGeocodeClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let api_key = config
            .google_maps_api_key
            .clone()
            .ok_or_else(|| AppError::Config("GOOGLE_MAPS_API_KEY is not set".into()))?;

        let mut builder = Client::builder().user_agent(concat!(
            "address-geocoder/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.http_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: config.geocode_endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl GeocodeLookup for HttpGeocodeClient {
    async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        trace!(address, "issuing geocode request");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;

        let body: GeocodeResponse = response.json().await.map_err(transport)?;
        debug!(address, status = %body.status, results = body.results.len(), "geocode response");
        body.into_coordinates()
    }
}

fn transport(err: reqwest::Error) -> GeocodeError {
    GeocodeError::Transport(err.to_string())
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl GeocodeResponse {
    /// Maps the vendor status to coordinates or a classified error.
    pub fn into_coordinates(self) -> Result<Coordinates, GeocodeError> {
        let detail = self.error_message.unwrap_or_default();
        match self.status.as_str() {
            "OK" => self
                .results
                .into_iter()
                .next()
                .map(|result| {
                    Coordinates::new(result.geometry.location.lat, result.geometry.location.lng)
                })
                .ok_or(GeocodeError::ZeroResults),
            "ZERO_RESULTS" => Err(GeocodeError::ZeroResults),
            "REQUEST_DENIED" => Err(GeocodeError::RequestDenied(detail)),
            "INVALID_REQUEST" => Err(GeocodeError::InvalidRequest(detail)),
            "OVER_QUERY_LIMIT" => Err(GeocodeError::OverQueryLimit),
            // Server-side hiccup; the vendor documents it as safe to retry.
            "UNKNOWN_ERROR" => Err(GeocodeError::Transport(format!(
                "UNKNOWN_ERROR {detail}"
            ))),
            other => Err(GeocodeError::InvalidRequest(format!(
                "unexpected status {other}"
            ))),
        }
    }
}
