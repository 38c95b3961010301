use crate::app_config::ApiConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use roam_core::{ApiError, ApiResult, SessionContext, TravelApi};
use roam_shared::{CityBundle, FilterSet, RawTransportResponse, Suggestion, TransportMode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `TravelApi` over JSON/HTTP.
pub struct HttpTravelApi {
    base_url: String,
    client: reqwest::Client,
    session: Option<Arc<SessionContext>>,
}

impl HttpTravelApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidBaseUrl(base_url));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client, session: None })
    }

    pub fn from_config(config: &ApiConfig) -> ClientResult<Self> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    /// Attach the bearer token from `session` to every request when present.
    pub fn with_session(mut self, session: Arc<SessionContext>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(token) = self.session.as_ref().and_then(|s| s.token()) {
            request = request.bearer_auth(token.expose());
        }

        debug!(path = %path, "GET");
        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(path = %path, "response is not JSON: {}", e);
            ApiError::Malformed(e.to_string())
        })
    }

    async fn get_array(&self, path: &str, query: &[(&str, String)]) -> ApiResult<Vec<Value>> {
        match self.get_json(path, query).await? {
            Value::Array(items) => Ok(items),
            other => Err(ApiError::Malformed(format!("expected an array, got {}", kind(&other)))),
        }
    }

    async fn get_object<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        let value = self.get_json(path, query).await?;
        if !value.is_object() {
            return Err(ApiError::Malformed(format!("expected an object, got {}", kind(&value))));
        }
        serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Query string for `/transportation/{mode}`. Unset filters are omitted.
pub fn transport_query(filters: &FilterSet) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(from) = &filters.from_city_name {
        query.push(("fromCityName", from.trim().to_string()));
    }
    if let Some(to) = &filters.to_city_name {
        query.push(("toCityName", to.trim().to_string()));
    }
    if let Some(date) = filters.from_date {
        query.push(("fromDate", date.format(DATE_FORMAT).to_string()));
    }
    if let Some(date) = filters.to_date {
        query.push(("toDate", date.format(DATE_FORMAT).to_string()));
    }
    if let Some(min) = filters.min_price {
        query.push(("minPrice", min.to_string()));
    }
    if let Some(max) = filters.max_price {
        query.push(("maxPrice", max.to_string()));
    }
    if let Some(count) = filters.number_of_travelers {
        query.push(("numberOfTravelers", count.to_string()));
    }
    if let Some(trip) = filters.trip_type {
        query.push(("tripType", trip.as_str().to_string()));
    }
    query
}

/// Query string for `/accommodation/search`.
pub fn accommodation_query(filters: &FilterSet) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(from) = &filters.from_city_name {
        query.push(("FromCity", from.trim().to_string()));
    }
    if let Some(to) = &filters.to_city_name {
        query.push(("ToCity", to.trim().to_string()));
    }
    if let Some(date) = filters.from_date {
        query.push(("FromDate", date.format(DATE_FORMAT).to_string()));
    }
    if let Some(date) = filters.to_date {
        query.push(("ToDate", date.format(DATE_FORMAT).to_string()));
    }
    query
}

#[async_trait]
impl TravelApi for HttpTravelApi {
    async fn suggest_cities(&self, query: &str) -> ApiResult<Vec<Suggestion>> {
        let items = self.get_array("/search/suggestCities", &[("q", query.to_string())]).await?;
        Ok(items
            .into_iter()
            .filter(|item| !item.is_null())
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }

    async fn search_transportation(
        &self,
        mode: TransportMode,
        filters: &FilterSet,
    ) -> ApiResult<RawTransportResponse> {
        let path = format!("/transportation/{}", mode.path_segment());
        self.get_object(&path, &transport_query(filters)).await
    }

    async fn search_accommodations(&self, filters: &FilterSet) -> ApiResult<Vec<Value>> {
        self.get_array("/accommodation/search", &accommodation_query(filters)).await
    }

    async fn accommodations_in_city(&self, city: &str) -> ApiResult<Vec<Value>> {
        self.get_array("/accommodations", &[("cityName", city.to_string())]).await
    }

    async fn search_city(&self, searched_city: &str, user_city: Option<&str>) -> ApiResult<CityBundle> {
        let mut query = vec![("searchedCityName", searched_city.to_string())];
        if let Some(user_city) = user_city {
            query.push(("userCity", user_city.to_string()));
        }
        self.get_object("/search/city", &query).await
    }
}
