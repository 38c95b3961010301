use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use roam_client::{FileSessionStore, HttpTravelApi};
use roam_core::{
    ApiError, CityStaysSource, ListingSearch, MemorySessionStore, SearchPolicy, SessionContext,
    TracingNotifier, TransportSource, TravelApi, TypeAhead, TypeAheadConfig,
};
use roam_shared::{FilterSet, TransportMode, TripType};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

async fn suggest(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let q = params.get("q").cloned().unwrap_or_default();
    match q.as_str() {
        "Broken" => (StatusCode::OK, Json(json!({"unexpected": true}))),
        "Boom" => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "db down"}))),
        _ => (
            StatusCode::OK,
            Json(json!([{"CityName": q}, null, {"CityName": format!("{}, Texas", q)}])),
        ),
    }
}

async fn transportation(
    Path(mode): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    if mode == "trains" {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({
        "onward": [
            {
                "id": 1,
                "provider": format!("{}-carrier", mode),
                "fromCityName": params.get("fromCityName"),
                "toCityName": params.get("toCityName"),
                "auth": auth,
                "query": params,
            },
            null
        ],
        "return": [{"id": 2, "provider": "back"}]
    }))
}

async fn accommodation_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!([{"name": "Harbour Inn", "cityName": params.get("ToCity")}]))
}

async fn accommodations(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!([{"name": "Old Town Suites", "cityName": params.get("cityName")}]))
}

async fn city(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "city": {"name": params.get("searchedCityName"), "from": params.get("userCity")},
        "experiences": [{"title": "Walking tour"}],
        "accommodations": [null, {"name": "Hotel Central"}],
        "transportation": []
    }))
}

async fn spawn_server() -> String {
    let router = Router::new()
        .route("/search/suggestCities", get(suggest))
        .route("/transportation/{mode}", get(transportation))
        .route("/accommodation/search", get(accommodation_search))
        .route("/accommodations", get(accommodations))
        .route("/search/city", get(city));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str) -> HttpTravelApi {
    HttpTravelApi::new(base_url, Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn test_suggestions_keep_server_order_and_drop_nulls() {
    let base = spawn_server().await;
    let api = client(&base);

    let list = api.suggest_cities("Paris").await.unwrap();
    let names: Vec<&str> = list.iter().map(|s| s.display_name()).collect();
    assert_eq!(names, vec!["Paris", "Paris, Texas"]);
}

#[tokio::test]
async fn test_special_characters_round_trip() {
    let base = spawn_server().await;
    let api = client(&base);

    let list = api.suggest_cities("São Paulo & Co?").await.unwrap();
    assert_eq!(list[0].display_name(), "São Paulo & Co?");

    let filters = FilterSet::new().from_city("Paris, France").to_city("Rio de Janeiro");
    let raw = api.search_transportation(TransportMode::Flights, &filters).await.unwrap();
    assert_eq!(raw.onward[0]["fromCityName"], json!("Paris, France"));
    assert_eq!(raw.onward[0]["toCityName"], json!("Rio de Janeiro"));
}

#[tokio::test]
async fn test_non_array_body_is_malformed() {
    let base = spawn_server().await;
    let api = client(&base);

    let err = api.suggest_cities("Broken").await.unwrap_err();
    assert!(err.is_malformed());
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let base = spawn_server().await;
    let api = client(&base);

    match api.suggest_cities("Boom").await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    let api = client("http://127.0.0.1:9");
    let err = api.suggest_cities("Paris").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout));
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let base = spawn_server().await;
    let api = HttpTravelApi::new(base, Duration::from_millis(200)).unwrap();

    let filters = FilterSet::new().from_city("Paris").to_city("Lyon");
    let err = api.search_transportation(TransportMode::Trains, &filters).await.unwrap_err();
    assert_eq!(err, ApiError::Timeout);
}

#[tokio::test]
async fn test_transport_query_parameters_are_sent() {
    let base = spawn_server().await;
    let api = client(&base);

    let filters = FilterSet::new()
        .from_city("Paris")
        .to_city("Rome")
        .travelers(3)
        .trip(TripType::RoundTrip)
        .price_range(Some(10.0), Some(250.5));
    let raw = api.search_transportation(TransportMode::Buses, &filters).await.unwrap();

    let query = &raw.onward[0]["query"];
    assert_eq!(query["numberOfTravelers"], json!("3"));
    assert_eq!(query["tripType"], json!("roundtrip"));
    assert_eq!(query["maxPrice"], json!("250.5"));
    assert!(query.get("fromDate").is_none());
    assert_eq!(raw.return_leg.map(|r| r.len()), Some(1));
}

#[tokio::test]
async fn test_session_token_is_sent_as_bearer() {
    let base = spawn_server().await;
    let session = Arc::new(SessionContext::new(Arc::new(MemorySessionStore::default())));
    let api = client(&base).with_session(session.clone());
    let filters = FilterSet::new().from_city("Paris").to_city("Rome");

    let raw = api.search_transportation(TransportMode::Flights, &filters).await.unwrap();
    assert!(raw.onward[0]["auth"].is_null());

    session.save_token("jwt-xyz").unwrap();
    let raw = api.search_transportation(TransportMode::Flights, &filters).await.unwrap();
    assert_eq!(raw.onward[0]["auth"], json!("Bearer jwt-xyz"));
}

#[tokio::test]
async fn test_file_session_feeds_client() {
    let base = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
    SessionContext::new(store.clone()).save_token("persisted").unwrap();

    let session = Arc::new(SessionContext::new(store));
    session.load().unwrap();
    let api = client(&base).with_session(session);
    let filters = FilterSet::new().from_city("Paris").to_city("Rome");
    let raw = api.search_transportation(TransportMode::Flights, &filters).await.unwrap();
    assert_eq!(raw.onward[0]["auth"], json!("Bearer persisted"));
}

#[tokio::test]
async fn test_accommodation_and_city_endpoints() {
    let base = spawn_server().await;
    let api = client(&base);

    let stays = api
        .search_accommodations(&FilterSet::new().to_city("Bergen"))
        .await
        .unwrap();
    assert_eq!(stays[0]["cityName"], json!("Bergen"));

    let in_city = api.accommodations_in_city("Tallinn").await.unwrap();
    assert_eq!(in_city[0]["name"], json!("Old Town Suites"));

    let bundle = api.search_city("Porto", Some("Lisbon")).await.unwrap();
    assert_eq!(bundle.city.as_ref().unwrap()["from"], json!("Lisbon"));
    assert_eq!(bundle.experiences.len(), 1);
    assert_eq!(bundle.accommodation_records().len(), 1);
}

#[tokio::test]
async fn test_type_ahead_over_http() {
    let base = spawn_server().await;
    let api: Arc<dyn TravelApi> = Arc::new(client(&base));
    let input = TypeAhead::new(
        api,
        TypeAheadConfig {
            debounce: Duration::from_millis(20),
            min_query_len: 3,
            policy: SearchPolicy::SelectedOnly,
        },
    );

    input.set_query("Osl");
    input.set_query("Oslo");
    let state = input.settled().await;
    assert_eq!(state.suggestions.len(), 2);
    assert_eq!(state.suggestions[0].display_name(), "Oslo");

    input.select(0);
    assert_eq!(input.search_term().as_deref(), Some("Oslo"));
}

#[tokio::test]
async fn test_listing_search_over_http() {
    let base = spawn_server().await;
    let api: Arc<dyn TravelApi> = Arc::new(client(&base));
    let search = ListingSearch::new(
        TransportSource::new(api.clone(), TransportMode::Flights),
        Arc::new(TracingNotifier),
    );

    assert!(search.handle_initial_search(FilterSet::new().from_city("Paris").to_city("Rome")));
    let state = search.settled().await;
    assert_eq!(state.results.onward.len(), 1);
    assert_eq!(state.results.onward[0].provider.as_deref(), Some("flights-carrier"));
    assert_eq!(state.results.return_leg.as_ref().map(Vec::len), Some(1));

    let slow = ListingSearch::new(
        TransportSource::new(
            Arc::new(HttpTravelApi::new(base, Duration::from_millis(100)).unwrap()),
            TransportMode::Trains,
        ),
        Arc::new(TracingNotifier),
    );
    slow.update_filters(FilterSet::new().from_city("Paris").to_city("Lyon"));
    slow.handle_search();
    let state = slow.settled().await;
    assert!(state.error.is_some());
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn test_city_stays_listing_over_http() {
    let base = spawn_server().await;
    let api: Arc<dyn TravelApi> = Arc::new(client(&base));
    let search = ListingSearch::new(CityStaysSource::new(api), Arc::new(TracingNotifier));

    search.update_filters(FilterSet::new().from_city("Riga").to_city("Tallinn"));
    search.handle_search();
    let state = search.settled().await;
    assert!(state.error.is_none());
    assert_eq!(state.results.onward.len(), 1);
    assert_eq!(state.results.onward[0].name.as_deref(), Some("Old Town Suites"));
}
