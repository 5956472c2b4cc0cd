use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::format::{hhmm, opt_hhmm};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TripType {
    #[default]
    #[serde(rename = "ONE WAY")]
    OneWay,
    #[serde(rename = "ROUND TRIP")]
    RoundTrip,
    #[serde(rename = "LOCAL")]
    Local,
    #[serde(rename = "AIRPORT")]
    Airport,
}

impl TripType {
    pub const ALL: [TripType; 4] = [
        TripType::OneWay,
        TripType::RoundTrip,
        TripType::Local,
        TripType::Airport,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TripType::OneWay => "ONE WAY",
            TripType::RoundTrip => "ROUND TRIP",
            TripType::Local => "LOCAL",
            TripType::Airport => "AIRPORT",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(label))
    }

    /// Backend id used when the trip-type endpoint is unavailable.
    pub fn fallback_id(&self) -> i64 {
        match self {
            TripType::OneWay => 1,
            TripType::RoundTrip => 2,
            TripType::Local => 3,
            TripType::Airport => 4,
        }
    }
}

/// Snapshot produced by the search step and handed to the later steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    #[serde(rename = "tripTypeLabel")]
    pub trip_type: TripType,
    pub from_city_name: String,
    pub to_city_name: String,
    pub pickup_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub pickup_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    #[serde(default, with = "opt_hhmm", skip_serializing_if = "Option::is_none")]
    pub return_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedCar {
    pub id: Option<i64>,
    pub name: String,
    pub price: u64,
}
