use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::listing::Accommodation;

/// Aggregate returned by the city overview endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityBundle {
    #[serde(default)]
    pub city: Option<Value>,
    #[serde(default)]
    pub experiences: Vec<Value>,
    #[serde(default)]
    pub accommodations: Vec<Value>,
    #[serde(default)]
    pub transportation: Vec<Value>,
}

impl CityBundle {
    /// Accommodation entries that decode, skipping nulls and foreign shapes.
    pub fn accommodation_records(&self) -> Vec<Accommodation> {
        self.accommodations
            .iter()
            .filter(|v| v.is_object())
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.experiences.is_empty()
            && self.accommodations.is_empty()
            && self.transportation.is_empty()
    }
}
