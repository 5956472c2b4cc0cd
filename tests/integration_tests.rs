use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};

use ridebook::autocomplete::AutocompleteField;
use ridebook::config::AppConfig;
use ridebook::errors::AppError;
use ridebook::models::{PassengerDetails, SearchState, SelectedCar, TripType};
use ridebook::otp::{BookingOtpGate, LoginFlow};
use ridebook::services::booking::{list_cities, submit_booking};
use ridebook::services::places::PlacesSource;
use ridebook::services::ApiClient;
use ridebook::storage::{KeyValueStore, MemoryStore, ACCESS_TOKEN_KEY, MOBILE_NUMBER_KEY};
use ridebook::wizard::{load_vehicle_options, BookingWizard, DetailsStep, SearchForm};

// ── Fake backend ──

#[derive(Debug, Clone)]
struct Hit {
    method: &'static str,
    path: &'static str,
    authorization: Option<String>,
    query: HashMap<String, String>,
    body: Value,
}

#[derive(Default)]
struct Backend {
    hits: Mutex<Vec<Hit>>,
    reject_bookings: AtomicBool,
}

impl Backend {
    fn record(
        &self,
        method: &'static str,
        path: &'static str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        body: Value,
    ) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        self.hits.lock().unwrap().push(Hit {
            method,
            path,
            authorization,
            query,
            body,
        });
    }

    fn hits_to(&self, path: &str) -> Vec<Hit> {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.path == path)
            .cloned()
            .collect()
    }
}

type Shared = State<Arc<Backend>>;

async fn cities(State(b): Shared, headers: HeaderMap) -> Json<Value> {
    b.record("GET", "/cities", &headers, HashMap::new(), Value::Null);
    Json(json!({"data": [
        {"id": 7, "name": "Pune", "state": "Maharashtra"},
        {"id": 9, "name": "Mumbai", "state": "Maharashtra"}
    ]}))
}

async fn vehicle_types(State(b): Shared, headers: HeaderMap) -> Json<Value> {
    b.record("GET", "/vehicle-types", &headers, HashMap::new(), Value::Null);
    Json(json!({"status": "ok", "payload": {"page": 1, "entries": [
        {"id": 1, "name": "Sedan", "baseFare": 500, "estimatedRatePerKm": 12,
         "seatingCapacity": 4, "image": "/img/sedan.png"},
        {"id": 2, "name": "SUV", "baseFare": "800", "estimatedRatePerKm": "15"},
        {"name": "Unnamed"}
    ]}}))
}

async fn trip_types(State(b): Shared, headers: HeaderMap) -> Json<Value> {
    b.record("GET", "/trip-types", &headers, HashMap::new(), Value::Null);
    Json(json!([{"id": 11, "name": "ONE WAY"}, {"id": 12, "label": "Round Trip"}]))
}

async fn distance(State(b): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    b.record("POST", "/cities/calculate-distance", &headers, HashMap::new(), body);
    Json(json!({"data": {"optimizedTotalDistanceKm": null, "originalTotalDistanceKm": "10"}}))
}

async fn bookings(State(b): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.record("POST", "/bookings", &headers, HashMap::new(), body);
    if b.reject_bookings.load(Ordering::SeqCst) {
        return (StatusCode::UNPROCESSABLE_ENTITY, "pickup date in the past").into_response();
    }
    (StatusCode::CREATED, [(header::LOCATION, "/bookings/77")], "").into_response()
}

async fn send_otp(State(b): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    b.record("POST", "/auth/send-otp", &headers, HashMap::new(), body);
    Json(json!({"success": true}))
}

async fn verify_otp(State(b): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let accepted = body["otp"] == "4321";
    b.record("POST", "/auth/verify-otp", &headers, HashMap::new(), body);
    if accepted {
        Json(json!({"success": true, "access_token": "tok-1"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Wrong code"})),
        )
            .into_response()
    }
}

async fn login(State(b): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    b.record("POST", "/auth/login", &headers, HashMap::new(), body);
    Json(json!({"data": {"accessToken": "dev-token"}}))
}

async fn check_phone(
    State(b): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let known = query.get("phone").map(String::as_str) == Some("9876543210");
    b.record("GET", "/users/check-phone", &headers, query, Value::Null);
    if known {
        Json(json!({"exists": true, "user": {"name": "Asha", "email": "asha@example.com"}}))
    } else {
        Json(json!({"exists": false}))
    }
}

async fn places(
    State(b): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    b.record("GET", "/places/autocomplete", &headers, query, Value::Null);
    Json(json!({"predictions": [
        {"description": "Pune, Maharashtra, India", "place_id": "ChIJ-pune"}
    ]}))
}

async fn spawn_backend() -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route("/cities", get(cities))
        .route("/vehicle-types", get(vehicle_types))
        .route("/trip-types", get(trip_types))
        .route("/cities/calculate-distance", post(distance))
        .route("/bookings", post(bookings))
        .route("/auth/send-otp", post(send_otp))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/login", post(login))
        .route("/users/check-phone", get(check_phone))
        .route("/places/autocomplete", get(places))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), backend)
}

// ── Helpers ──

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        api_base_url: base_url.to_string(),
        storage_path: ":memory:".to_string(),
        dev_mode: true,
        api_email: String::new(),
        api_password: String::new(),
        booking_test_otp: "1234".to_string(),
        autocomplete_debounce_ms: 10,
        phone_debounce_ms: 10,
        otp_countdown_secs: 60,
    }
}

fn logged_in_client(base_url: &str) -> (ApiClient, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.set(ACCESS_TOKEN_KEY, "tok-9").unwrap();
    let api = ApiClient::from_config(&test_config(base_url), store.clone());
    (api, store)
}

fn pune_to_mumbai() -> SearchForm {
    SearchForm {
        trip_type: TripType::OneWay,
        from_city_name: "Pune, Maharashtra".to_string(),
        to_city_name: "Mumbai, Maharashtra".to_string(),
        pickup_date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
        pickup_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
        return_date: None,
        return_time: None,
    }
}

fn passenger(step: &mut DetailsStep) {
    step.set_pickup_location("FC Road");
    step.set_name("Asha");
    step.set_email("asha@example.com");
    step.set_phone("9876543210");
}

// ── Transport ──

#[tokio::test]
async fn test_requests_carry_stored_bearer_token() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);

    let cities = list_cities(&api).await;
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].name, "Pune");

    let hits = backend.hits_to("/cities");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].method, "GET");
    assert_eq!(hits[0].authorization.as_deref(), Some("Bearer tok-9"));
}

#[tokio::test]
async fn test_dev_credentials_token_is_used_but_not_persisted() {
    let (base, backend) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig {
        api_email: "dev@example.com".to_string(),
        api_password: "secret".to_string(),
        ..test_config(&base)
    };
    let api = ApiClient::from_config(&config, store.clone());

    list_cities(&api).await;

    let logins = backend.hits_to("/auth/login");
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].authorization, None);
    assert_eq!(logins[0].body["identifier"], "dev@example.com");
    assert_eq!(
        backend.hits_to("/cities")[0].authorization.as_deref(),
        Some("Bearer dev-token")
    );
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_dev_credentials_log_in_once_per_client() {
    let (base, backend) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig {
        api_email: "dev@example.com".to_string(),
        api_password: "secret".to_string(),
        ..test_config(&base)
    };
    let api = ApiClient::from_config(&config, store.clone());
    let search = pune_to_mumbai().into_state().unwrap();
    let car = SelectedCar {
        id: Some(1),
        name: "Sedan".to_string(),
        price: 620,
    };
    let details = PassengerDetails {
        pickup_location: "FC Road".to_string(),
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
    };

    submit_booking(&api, &search, &car, &details).await.unwrap();
    list_cities(&api).await;

    assert_eq!(backend.hits_to("/auth/login").len(), 1);
    let posts = backend.hits_to("/bookings");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].authorization.as_deref(), Some("Bearer dev-token"));
    assert!(backend
        .hits_to("/cities")
        .iter()
        .all(|h| h.authorization.as_deref() == Some("Bearer dev-token")));
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
}

// ── Vehicle selection ──

#[tokio::test]
async fn test_vehicle_options_priced_from_distance() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);
    let search = pune_to_mumbai().into_state().unwrap();

    let options = load_vehicle_options(&api, &search).await;

    let priced: Vec<_> = options.iter().map(|o| (o.name.as_str(), o.price)).collect();
    assert_eq!(priced, vec![("Sedan", 620), ("SUV", 950)]);
    assert_eq!(options[0].seats, Some(4));
    assert_eq!(options[0].image_url.as_deref(), Some(format!("{base}/img/sedan.png").as_str()));
    assert_eq!(options[1].image_url, None);

    let distance = backend.hits_to("/cities/calculate-distance");
    assert_eq!(distance.len(), 1);
    assert_eq!(distance[0].body, json!({"cityIds": [7, 9]}));
}

#[tokio::test]
async fn test_unresolved_city_prices_without_distance() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);
    let search = SearchForm {
        to_city_name: "Atlantis".to_string(),
        ..pune_to_mumbai()
    }
    .into_state()
    .unwrap();

    let options = load_vehicle_options(&api, &search).await;

    let prices: Vec<_> = options.iter().map(|o| o.price).collect();
    assert_eq!(prices, vec![500, 800]);
    assert!(backend.hits_to("/cities/calculate-distance").is_empty());
}

// ── Booking ──

#[tokio::test]
async fn test_full_wizard_creates_booking_once() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);
    let config = test_config(&base);

    let mut wizard = BookingWizard::new();
    let search = wizard.submit_search(pune_to_mumbai()).unwrap().clone();
    let options = load_vehicle_options(&api, &search).await;
    wizard.select_car(options[0].to_selected()).unwrap();

    let mut step = DetailsStep::from_config(&config);
    passenger(&mut step);
    step.request_otp().unwrap();
    step.enter_otp("1234");

    let (search, car) = wizard.details_context().unwrap();
    let receipt = step.confirm(&api, search, car).await.unwrap();
    assert_eq!(receipt.id, Some(77));
    assert_eq!(receipt.summary(), "Ref 77 • Sedan • ₹620");

    let again = step.confirm(&api, search, car).await;
    assert!(matches!(again, Err(AppError::InvalidTransition(_))));

    let posts = backend.hits_to("/bookings");
    assert_eq!(posts.len(), 1);
    let payload = &posts[0].body;
    assert_eq!(posts[0].authorization.as_deref(), Some("Bearer tok-9"));
    assert_eq!(payload["fromCityId"], 7);
    assert_eq!(payload["toCityId"], 9);
    assert_eq!(payload["vehicleTypeId"], 1);
    assert_eq!(payload["tripTypeId"], 11);
    assert_eq!(payload["fare"], 620);
    assert_eq!(payload["pickupDate"], "2025-06-16");
    assert_eq!(payload["pickupTime"], "08:30");
    assert_eq!(payload["dropoffLocation"], "Mumbai, Maharashtra");
    assert!(payload.get("returnDate").is_none());

    wizard.restart().unwrap();
    assert!(wizard.car().is_none());
    assert_eq!(wizard.search_form().from_city_name, "Pune, Maharashtra");
}

#[tokio::test]
async fn test_wrong_booking_otp_posts_nothing_until_corrected() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);
    let search = pune_to_mumbai().into_state().unwrap();
    let car = SelectedCar {
        id: Some(2),
        name: "suv".to_string(),
        price: 950,
    };

    let mut step = DetailsStep::new(BookingOtpGate::new("1234", 60), Duration::from_millis(10));
    passenger(&mut step);
    step.request_otp().unwrap();

    step.enter_otp("9999");
    let err = step.confirm(&api, &search, &car).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(step.gate().is_open());
    assert!(backend.hits_to("/bookings").is_empty());

    step.enter_otp(" 1234 ");
    let receipt = step.confirm(&api, &search, &car).await.unwrap();
    assert_eq!(receipt.car_name, "suv");
    assert!(!step.gate().is_open());

    let posts = backend.hits_to("/bookings");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].body["vehicleTypeId"], 2);
}

#[tokio::test]
async fn test_unresolved_city_never_posts_booking() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);
    let search = SearchState {
        to_city_name: "Atlantis".to_string(),
        ..pune_to_mumbai().into_state().unwrap()
    };
    let car = SelectedCar {
        id: Some(1),
        name: "Sedan".to_string(),
        price: 500,
    };
    let details = PassengerDetails {
        pickup_location: "FC Road".to_string(),
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
    };

    let err = submit_booking(&api, &search, &car, &details).await.unwrap_err();
    assert!(matches!(err, AppError::Resolution(_)));
    assert_eq!(
        err.notice().1,
        "Could not resolve city/vehicle/trip type. Please revise your selection."
    );
    assert!(backend.hits_to("/bookings").is_empty());
}

#[tokio::test]
async fn test_rejected_booking_surfaces_body_and_allows_retry() {
    let (base, backend) = spawn_backend().await;
    backend.reject_bookings.store(true, Ordering::SeqCst);
    let (api, _store) = logged_in_client(&base);
    let search = pune_to_mumbai().into_state().unwrap();
    let car = SelectedCar {
        id: Some(1),
        name: "Sedan".to_string(),
        price: 620,
    };

    let mut step = DetailsStep::new(BookingOtpGate::default(), Duration::from_millis(10));
    passenger(&mut step);
    step.request_otp().unwrap();
    step.enter_otp("1234");

    match step.confirm(&api, &search, &car).await {
        Err(AppError::Rejected { status, message }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "pickup date in the past");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(step.receipt().is_none());
    assert!(!step.is_creating());

    backend.reject_bookings.store(false, Ordering::SeqCst);
    step.request_otp().unwrap();
    step.enter_otp("1234");
    assert!(step.confirm(&api, &search, &car).await.is_ok());
    assert_eq!(backend.hits_to("/bookings").len(), 2);
}

// ── Login ──

#[tokio::test]
async fn test_login_flow_clears_rejected_code_and_persists_on_success() {
    let (base, backend) = spawn_backend().await;
    let store = Arc::new(MemoryStore::new());
    let api = ApiClient::from_config(&test_config(&base), store.clone());

    let mut flow = LoginFlow::new(Some("push-1".to_string()), 60);
    flow.set_mobile_number("9876543210").unwrap();
    flow.send_otp(&api).await.unwrap();
    assert!(flow.is_otp_sent());
    assert!(flow.countdown().is_running());
    assert!(flow.set_mobile_number("1111111111").is_err());

    let sent = backend.hits_to("/auth/send-otp");
    assert_eq!(sent[0].body, json!({"mobileNumber": "9876543210", "deviceToken": "push-1"}));
    assert_eq!(sent[0].authorization, None);

    flow.entry_mut().handle_change(0, "1111");
    match flow.verify(&api).await {
        Err(AppError::Rejected { message, .. }) => assert_eq!(message, "Wrong code"),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(flow.entry().code(), "");
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);

    flow.entry_mut().handle_change(0, "4321");
    let outcome = flow.verify(&api).await.unwrap();
    assert!(outcome.token_saved);
    assert!(!flow.countdown().is_running());
    assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("tok-1"));
    assert_eq!(store.get(MOBILE_NUMBER_KEY).unwrap().as_deref(), Some("9876543210"));
    assert_eq!(backend.hits_to("/auth/verify-otp")[1].body["otp"], "4321");
}

#[tokio::test]
async fn test_short_mobile_number_sends_nothing() {
    let (base, backend) = spawn_backend().await;
    let api = ApiClient::from_config(&test_config(&base), Arc::new(MemoryStore::new()));

    let mut flow = LoginFlow::new(None, 60);
    flow.set_mobile_number(" 12345 ").unwrap();
    assert!(matches!(flow.send_otp(&api).await, Err(AppError::Validation(_))));
    assert!(!flow.is_otp_sent());
    assert!(backend.hits_to("/auth/send-otp").is_empty());
}

// ── Details and autocomplete ──

#[tokio::test]
async fn test_phone_lookup_fills_empty_fields_only() {
    let (base, backend) = spawn_backend().await;
    let (api, store) = logged_in_client(&base);
    store.set(MOBILE_NUMBER_KEY, "9876543210").unwrap();

    let mut step = DetailsStep::from_config(&test_config(&base));
    step.set_email("typed@example.com");
    assert!(step.prefill_phone(store.as_ref()));

    assert!(step.pump_lookup(&api).await);
    assert_eq!(step.details().phone, "9876543210");
    assert_eq!(step.details().name, "Asha");
    assert_eq!(step.details().email, "typed@example.com");

    let lookups = backend.hits_to("/users/check-phone");
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].query["phone"], "9876543210");
}

#[tokio::test]
async fn test_autocomplete_burst_issues_one_lookup() {
    let (base, backend) = spawn_backend().await;
    let (api, _store) = logged_in_client(&base);
    let source = PlacesSource::new(Arc::new(api));

    let mut field = AutocompleteField::new("").with_debounce(Duration::from_millis(20));
    for text in ["p", "pu", "pun", "pune"] {
        field.on_change_text(text);
    }
    assert!(field.pump(&source).await);

    let labels: Vec<_> = field.visible_items().iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Pune, Maharashtra, India"]);

    let lookups = backend.hits_to("/places/autocomplete");
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].query["input"], "pune");

    let chosen = field.visible_items()[0].clone();
    field.select(&chosen);
    assert_eq!(field.value(), "Pune, Maharashtra, India");
    assert!(!field.is_open());
}
