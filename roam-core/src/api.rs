use async_trait::async_trait;
use roam_shared::{CityBundle, FilterSet, RawTransportResponse, Suggestion, TransportMode};
use serde_json::Value;

/// Failures at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// A body of the wrong shape degrades to an empty result, not an error state.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ApiError::Malformed(_))
    }

    /// Short message suitable for an ephemeral user notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the server. Please try again.".to_string(),
            ApiError::Timeout => "The server took too long to respond. Please try again.".to_string(),
            ApiError::Status { status, .. } if *status >= 500 => {
                "The server ran into a problem. Please try again later.".to_string()
            }
            ApiError::Status { status, .. } => format!("Search failed ({})", status),
            ApiError::Malformed(_) => "Received an unexpected response.".to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Read-only travel search endpoints consumed by the search core.
#[async_trait]
pub trait TravelApi: Send + Sync {
    /// `GET /search/suggestCities?q=`
    async fn suggest_cities(&self, query: &str) -> ApiResult<Vec<Suggestion>>;

    /// `GET /transportation/{mode}?fromCityName=&toCityName=&...`
    async fn search_transportation(
        &self,
        mode: TransportMode,
        filters: &FilterSet,
    ) -> ApiResult<RawTransportResponse>;

    /// `GET /accommodation/search?FromCity=&ToCity=&FromDate=&ToDate=`
    async fn search_accommodations(&self, filters: &FilterSet) -> ApiResult<Vec<Value>>;

    /// `GET /accommodations?cityName=`
    async fn accommodations_in_city(&self, city: &str) -> ApiResult<Vec<Value>>;

    /// `GET /search/city?searchedCityName=&userCity=`
    async fn search_city(&self, searched_city: &str, user_city: Option<&str>) -> ApiResult<CityBundle>;
}
