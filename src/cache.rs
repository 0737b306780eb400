use std::collections::HashMap;

use parking_lot::Mutex;

use crate::models::Coordinates;

/// Session-lifetime map from normalized address to resolved coordinates.
///
/// Entries never expire and nothing is evicted. Batches are small enough
/// that the map stays bounded by the number of distinct addresses seen.
#[derive(Default)]
pub struct GeocodeCache {
    entries: Mutex<HashMap<String, Coordinates>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, address: &str) -> Option<Coordinates> {
        self.entries.lock().get(&normalize_address(address)).copied()
    }

    pub fn store(&self, address: &str, coordinates: Coordinates) {
        self.entries
            .lock()
            .insert(normalize_address(address), coordinates);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Trims, lowercases and collapses whitespace runs to a single space.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
