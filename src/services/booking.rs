use serde_json::{json, Value};

use super::http::ApiClient;
use super::normalize::{self, as_f64, as_i64};
use crate::errors::AppError;
use crate::format::{to_hhmm, to_ymd};
use crate::models::{
    BookingPayload, BookingReceipt, City, PassengerDetails, SearchState, SelectedCar, TripType,
    TripTypeRecord, VehicleOption, VehicleType,
};

pub async fn list_cities(api: &ApiClient) -> Vec<City> {
    match api.get("/cities", &[]).await {
        Ok(resp) if resp.is_success() => resp
            .json()
            .map(|j| normalize::cities(&j))
            .unwrap_or_default(),
        Ok(resp) => {
            tracing::warn!(status = resp.status.as_u16(), "city list unavailable");
            Vec::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch cities");
            Vec::new()
        }
    }
}

/// Raw `/vehicle-types` body. An empty array stands in for any failure.
pub async fn list_vehicle_types_raw(api: &ApiClient) -> Value {
    match api.get("/vehicle-types", &[]).await {
        Ok(resp) if resp.is_success() => resp.json().unwrap_or_else(|| json!([])),
        Ok(resp) => {
            if resp.status.as_u16() == 401 || resp.status.as_u16() == 403 {
                tracing::warn!(
                    status = resp.status.as_u16(),
                    "vehicle types rejected, is an access token stored?"
                );
            } else {
                tracing::warn!(status = resp.status.as_u16(), "vehicle types unavailable");
            }
            json!([])
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch vehicle types");
            json!([])
        }
    }
}

pub async fn list_vehicle_types(api: &ApiClient) -> Vec<VehicleType> {
    let raw = list_vehicle_types_raw(api).await;
    let types = normalize::vehicle_types(&raw, api.base_url());
    tracing::debug!(count = types.len(), "normalized vehicle types");
    types
}

/// Trip-type records, or `None` when the endpoint could not be used.
pub async fn list_trip_types(api: &ApiClient) -> Option<Vec<TripTypeRecord>> {
    match api.get("/trip-types", &[]).await {
        Ok(resp) if resp.is_success() => resp.json().map(|j| normalize::trip_types(&j)),
        Ok(resp) => {
            tracing::debug!(status = resp.status.as_u16(), "trip types unavailable, using fallback ids");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "trip types unavailable, using fallback ids");
            None
        }
    }
}

/// Road distance between two cities in km. Zero on any failure.
pub async fn calc_distance_km(api: &ApiClient, from_city_id: i64, to_city_id: i64) -> f64 {
    let body = json!({ "cityIds": [from_city_id, to_city_id] });
    let resp = match api.post("/cities/calculate-distance", &body).await {
        Ok(resp) if resp.is_success() => resp,
        Ok(resp) => {
            tracing::warn!(status = resp.status.as_u16(), "distance lookup failed");
            return 0.0;
        }
        Err(e) => {
            tracing::warn!(error = %e, "distance lookup failed");
            return 0.0;
        }
    };

    let Some(j) = resp.json() else {
        return 0.0;
    };
    let root = j.get("data").filter(|d| !d.is_null()).unwrap_or(&j);
    root.get("optimizedTotalDistanceKm")
        .filter(|v| !v.is_null())
        .or_else(|| root.get("originalTotalDistanceKm"))
        .and_then(as_f64)
        .unwrap_or(0.0)
}

/// Resolves a `"City, State"` label. Name and state compare exactly after
/// trimming and lowercasing; a label without a state matches on name alone.
pub fn resolve_city_id(cities: &[City], label: &str) -> Option<i64> {
    let mut parts = label.splitn(2, ',');
    let name = parts.next().unwrap_or("").trim().to_lowercase();
    let state = parts
        .next()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    cities
        .iter()
        .find(|c| {
            c.name.to_lowercase() == name
                && state.as_ref().map_or(true, |s| {
                    c.state.as_deref().unwrap_or("").to_lowercase() == *s
                })
        })
        .map(|c| c.id)
}

pub fn resolve_vehicle_type_id(types: &[VehicleType], name: &str) -> Option<i64> {
    let name = name.to_lowercase();
    types
        .iter()
        .find(|v| v.name.to_lowercase() == name)
        .map(|v| v.id)
}

/// Looks the label up in the backend records, then in the fixed fallback
/// table.
pub fn resolve_trip_type_id(records: Option<&[TripTypeRecord]>, label: &str) -> Option<i64> {
    let found = records.and_then(|records| {
        records
            .iter()
            .find(|t| {
                t.display_name()
                    .map(|n| n.eq_ignore_ascii_case(label))
                    .unwrap_or(false)
            })
            .map(|t| t.id)
    });

    found.or_else(|| TripType::parse(label).map(|t| t.fallback_id()))
}

/// `round(base + distance * rate)`, never negative. A non-finite distance
/// counts as zero.
pub fn compute_fare(base_fare: f64, distance_km: f64, rate_per_km: f64) -> u64 {
    let distance = if distance_km.is_finite() { distance_km } else { 0.0 };
    let fare = (base_fare + distance * rate_per_km).round();
    if fare.is_finite() && fare > 0.0 {
        fare as u64
    } else {
        0
    }
}

pub fn price_vehicles(types: &[VehicleType], distance_km: f64) -> Vec<VehicleOption> {
    types
        .iter()
        .map(|v| VehicleOption {
            id: v.id,
            name: v.name.clone(),
            seats: v.seating_capacity,
            price: compute_fare(v.base_fare, distance_km, v.rate_per_km),
            image_url: v.image_url.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIds {
    pub from_city_id: i64,
    pub to_city_id: i64,
    pub vehicle_type_id: i64,
    pub trip_type_id: i64,
}

pub fn resolve_booking_ids(
    cities: &[City],
    vehicle_types: &[VehicleType],
    trip_types: Option<&[TripTypeRecord]>,
    search: &SearchState,
    car_name: &str,
    trip_type_label: &str,
) -> Result<ResolvedIds, AppError> {
    let from_city_id = resolve_city_id(cities, &search.from_city_name);
    let to_city_id = resolve_city_id(cities, &search.to_city_name);
    let vehicle_type_id = resolve_vehicle_type_id(vehicle_types, car_name);
    let trip_type_id = resolve_trip_type_id(trip_types, trip_type_label);

    match (from_city_id, to_city_id, vehicle_type_id, trip_type_id) {
        (Some(from_city_id), Some(to_city_id), Some(vehicle_type_id), Some(trip_type_id)) => {
            Ok(ResolvedIds {
                from_city_id,
                to_city_id,
                vehicle_type_id,
                trip_type_id,
            })
        }
        _ => {
            let mut missing = Vec::new();
            if from_city_id.is_none() {
                missing.push(format!("from city {:?}", search.from_city_name));
            }
            if to_city_id.is_none() {
                missing.push(format!("to city {:?}", search.to_city_name));
            }
            if vehicle_type_id.is_none() {
                missing.push(format!("vehicle type {car_name:?}"));
            }
            if trip_type_id.is_none() {
                missing.push(format!("trip type {trip_type_label:?}"));
            }
            Err(AppError::Resolution(missing.join(", ")))
        }
    }
}

pub fn build_payload(
    search: &SearchState,
    car: &SelectedCar,
    details: &PassengerDetails,
    ids: ResolvedIds,
) -> BookingPayload {
    let round_trip = search.trip_type == TripType::RoundTrip;
    BookingPayload {
        phone: details.phone.clone(),
        pickup_location: details.pickup_location.clone(),
        dropoff_location: search.to_city_name.clone(),
        pickup_date: to_ymd(search.pickup_date),
        pickup_time: to_hhmm(search.pickup_time),
        return_date: search.return_date.filter(|_| round_trip).map(to_ymd),
        return_time: search.return_time.filter(|_| round_trip).map(to_hhmm),
        from_city_id: ids.from_city_id,
        to_city_id: ids.to_city_id,
        trip_type_id: ids.trip_type_id,
        vehicle_type_id: ids.vehicle_type_id,
        fare: car.price,
        num_persons: 1,
        num_vehicles: 1,
        name: details.name.clone(),
        email: details.email.clone(),
    }
}

/// Created-record id from the response body, else from the trailing segment
/// of the `Location` header.
pub fn extract_created_id(body: Option<&Value>, location: Option<&str>) -> Option<i64> {
    body.and_then(|j| j.get("id"))
        .and_then(as_i64)
        .filter(|id| *id != 0)
        .or_else(|| {
            location
                .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
                .and_then(|last| last.parse::<i64>().ok())
        })
}

/// Resolves every reference id against fresh reference lists and creates the
/// booking. Nothing is posted unless all four ids resolve.
pub async fn submit_booking(
    api: &ApiClient,
    search: &SearchState,
    car: &SelectedCar,
    details: &PassengerDetails,
) -> Result<BookingReceipt, AppError> {
    let (cities, vehicle_types, trip_types) = tokio::join!(
        list_cities(api),
        list_vehicle_types(api),
        list_trip_types(api),
    );

    let ids = resolve_booking_ids(
        &cities,
        &vehicle_types,
        trip_types.as_deref(),
        search,
        &car.name,
        search.trip_type.label(),
    )?;

    let payload = build_payload(search, car, details, ids);
    tracing::info!(
        from_city_id = ids.from_city_id,
        to_city_id = ids.to_city_id,
        vehicle_type_id = ids.vehicle_type_id,
        trip_type_id = ids.trip_type_id,
        fare = payload.fare,
        "creating booking"
    );

    let resp = api.post("/bookings", &payload).await?;
    if !resp.is_success() {
        let message = if resp.body.trim().is_empty() {
            format!("Status {}", resp.status.as_u16())
        } else {
            resp.body.clone()
        };
        return Err(AppError::Rejected {
            status: resp.status.as_u16(),
            message,
        });
    }

    let id = extract_created_id(resp.json().as_ref(), resp.location.as_deref());
    tracing::info!(id = ?id, "booking created");

    Ok(BookingReceipt {
        id,
        car_name: car.name.clone(),
        price: car.price,
    })
}
