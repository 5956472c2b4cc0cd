use serde::{Deserialize, Serialize};

use super::SelectedCar;

/// Vehicle type after normalization of the backend record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleType {
    pub id: i64,
    pub name: String,
    pub base_fare: f64,
    pub rate_per_km: f64,
    pub seating_capacity: Option<u32>,
    pub image_url: Option<String>,
}

/// A priced entry of the vehicle selection list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleOption {
    pub id: i64,
    pub name: String,
    pub seats: Option<u32>,
    pub price: u64,
    pub image_url: Option<String>,
}

impl VehicleOption {
    pub fn to_selected(&self) -> SelectedCar {
        SelectedCar {
            id: Some(self.id),
            name: self.name.clone(),
            price: self.price,
        }
    }
}
