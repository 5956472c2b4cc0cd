use serde::{Deserialize, Serialize};

use crate::format::inr;

/// Passenger fields collected by the details step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PassengerDetails {
    pub pickup_location: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Body of `POST /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub phone: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub pickup_date: String,
    pub pickup_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_time: Option<String>,
    pub from_city_id: i64,
    pub to_city_id: i64,
    pub trip_type_id: i64,
    pub vehicle_type_id: i64,
    pub fare: u64,
    pub num_persons: u32,
    pub num_vehicles: u32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub id: Option<i64>,
    pub car_name: String,
    pub price: u64,
}

impl BookingReceipt {
    pub fn summary(&self) -> String {
        let reference = self
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "—".to_string());
        format!("Ref {} • {} • {}", reference, self.car_name, inr(self.price))
    }
}
