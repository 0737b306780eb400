use std::io;

use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Config(String),
    #[error("input has no address rows")]
    EmptyInput,
    #[error("input must contain the columns nome, endereco and turno; found: {found}")]
    MissingColumns { found: String },
}

/// Failure of a single geocoding attempt, classified by the vendor status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("no results for address")]
    ZeroResults,
    #[error("request denied: {0}")]
    RequestDenied(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("query limit exceeded")]
    OverQueryLimit,
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeocodeErrorKind {
    ZeroResults,
    RequestDenied,
    InvalidRequest,
    OverQueryLimit,
    TransportError,
}

impl GeocodeError {
    pub fn kind(&self) -> GeocodeErrorKind {
        match self {
            GeocodeError::ZeroResults => GeocodeErrorKind::ZeroResults,
            GeocodeError::RequestDenied(_) => GeocodeErrorKind::RequestDenied,
            GeocodeError::InvalidRequest(_) => GeocodeErrorKind::InvalidRequest,
            GeocodeError::OverQueryLimit => GeocodeErrorKind::OverQueryLimit,
            GeocodeError::Transport(_) => GeocodeErrorKind::TransportError,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeocodeError::OverQueryLimit | GeocodeError::Transport(_)
        )
    }

    /// Message stored on a failed row.
    pub fn row_message(&self, address: &str) -> String {
        format!(
            "Não foi possível geocodificar o endereço: {address} ({})",
            self.kind().as_status()
        )
    }
}

impl GeocodeErrorKind {
    pub fn as_status(&self) -> &'static str {
        match self {
            GeocodeErrorKind::ZeroResults => "ZERO_RESULTS",
            GeocodeErrorKind::RequestDenied => "REQUEST_DENIED",
            GeocodeErrorKind::InvalidRequest => "INVALID_REQUEST",
            GeocodeErrorKind::OverQueryLimit => "OVER_QUERY_LIMIT",
            GeocodeErrorKind::TransportError => "TRANSPORT_ERROR",
        }
    }
}
