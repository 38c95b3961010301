use crate::api::{ApiError, ApiResult, TravelApi};
use async_trait::async_trait;
use parking_lot::Mutex;
use roam_shared::{CityBundle, FilterSet, RawTransportResponse, Suggestion, TransportMode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// A scripted reply, optionally held back until the test releases it.
struct Reply<T> {
    hold: Option<Arc<Notify>>,
    result: ApiResult<T>,
}

/// In-memory `TravelApi` keyed by query / destination, recording every call.
#[derive(Default)]
pub(crate) struct FakeApi {
    calls: Mutex<Vec<String>>,
    suggestions: Mutex<HashMap<String, Reply<Vec<Suggestion>>>>,
    transport: Mutex<HashMap<String, Reply<RawTransportResponse>>>,
    stays: Mutex<HashMap<String, Reply<Vec<Value>>>>,
    cities: Mutex<HashMap<String, Reply<CityBundle>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn on_suggest(&self, query: &str, result: ApiResult<Vec<Suggestion>>) {
        self.suggestions.lock().insert(query.to_string(), Reply { hold: None, result });
    }

    pub fn on_suggest_held(&self, query: &str, result: ApiResult<Vec<Suggestion>>) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        self.suggestions
            .lock()
            .insert(query.to_string(), Reply { hold: Some(hold.clone()), result });
        hold
    }

    pub fn on_transport(&self, destination: &str, result: ApiResult<RawTransportResponse>) {
        self.transport.lock().insert(destination.to_string(), Reply { hold: None, result });
    }

    pub fn on_transport_held(
        &self,
        destination: &str,
        result: ApiResult<RawTransportResponse>,
    ) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        self.transport
            .lock()
            .insert(destination.to_string(), Reply { hold: Some(hold.clone()), result });
        hold
    }

    pub fn on_stays(&self, destination: &str, result: ApiResult<Vec<Value>>) {
        self.stays.lock().insert(destination.to_string(), Reply { hold: None, result });
    }

    pub fn on_city(&self, city: &str, result: ApiResult<CityBundle>) {
        self.cities.lock().insert(city.to_string(), Reply { hold: None, result });
    }

    pub fn on_city_held(&self, city: &str, result: ApiResult<CityBundle>) -> Arc<Notify> {
        let hold = Arc::new(Notify::new());
        self.cities
            .lock()
            .insert(city.to_string(), Reply { hold: Some(hold.clone()), result });
        hold
    }

    async fn answer<T: Clone + Default>(
        table: &Mutex<HashMap<String, Reply<T>>>,
        key: &str,
    ) -> ApiResult<T> {
        let (hold, result) = match table.lock().get(key) {
            Some(reply) => (reply.hold.clone(), reply.result.clone()),
            None => (None, Ok(T::default())),
        };
        if let Some(hold) = hold {
            hold.notified().await;
        }
        result
    }
}

fn destination_key(filters: &FilterSet) -> String {
    filters.to_city_name.clone().unwrap_or_default()
}

#[async_trait]
impl TravelApi for FakeApi {
    async fn suggest_cities(&self, query: &str) -> ApiResult<Vec<Suggestion>> {
        self.calls.lock().push(format!("suggest:{}", query));
        Self::answer(&self.suggestions, query).await
    }

    async fn search_transportation(
        &self,
        mode: TransportMode,
        filters: &FilterSet,
    ) -> ApiResult<RawTransportResponse> {
        let key = destination_key(filters);
        self.calls.lock().push(format!("transport:{}:{}", mode, key));
        Self::answer(&self.transport, &key).await
    }

    async fn search_accommodations(&self, filters: &FilterSet) -> ApiResult<Vec<Value>> {
        let key = destination_key(filters);
        self.calls.lock().push(format!("stays:{}", key));
        Self::answer(&self.stays, &key).await
    }

    async fn accommodations_in_city(&self, city: &str) -> ApiResult<Vec<Value>> {
        self.calls.lock().push(format!("stays-in:{}", city));
        Self::answer(&self.stays, city).await
    }

    async fn search_city(&self, searched_city: &str, _user_city: Option<&str>) -> ApiResult<CityBundle> {
        self.calls.lock().push(format!("city:{}", searched_city));
        Self::answer(&self.cities, searched_city).await
    }
}

pub(crate) fn network_error() -> ApiError {
    ApiError::Network("connection refused".to_string())
}
