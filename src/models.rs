use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    #[default]
    Pending,
    Success,
    Error,
}

impl RowStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RowStatus::Pending)
    }
}

/// One spreadsheet line as it moves through the geocoding batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRow {
    pub name: String,
    pub raw_address: String,
    pub shift: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: RowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AddressRow {
    pub fn new(
        name: impl Into<String>,
        raw_address: impl Into<String>,
        shift: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            raw_address: raw_address.into(),
            shift: shift.into(),
            service_level: None,
            latitude: None,
            longitude: None,
            status: RowStatus::Pending,
            error_message: None,
        }
    }

    pub fn with_service_level(mut self, service_level: impl Into<String>) -> Self {
        self.service_level = Some(service_level.into());
        self
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Moves a pending row to `success`. Returns false if the row was
    /// already terminal.
    pub fn mark_success(&mut self, coordinates: Coordinates) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.latitude = Some(coordinates.latitude);
        self.longitude = Some(coordinates.longitude);
        self.error_message = None;
        self.status = RowStatus::Success;
        true
    }

    /// Moves a pending row to `error`. Returns false if the row was
    /// already terminal.
    pub fn mark_error(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.latitude = None;
        self.longitude = None;
        self.error_message = Some(message.into());
        self.status = RowStatus::Error;
        true
    }
}
