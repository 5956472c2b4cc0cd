use chrono::{Local, NaiveDate, NaiveTime, Timelike};

use crate::errors::AppError;
use crate::models::{SearchState, TripType};

/// Editable step 1 input. Dates and times come from whatever picker the
/// caller uses.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchForm {
    pub trip_type: TripType,
    pub from_city_name: String,
    pub to_city_name: String,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub return_date: Option<NaiveDate>,
    pub return_time: Option<NaiveTime>,
}

impl Default for SearchForm {
    fn default() -> Self {
        let now = Local::now().naive_local();
        Self {
            trip_type: TripType::default(),
            from_city_name: String::new(),
            to_city_name: String::new(),
            pickup_date: now.date(),
            pickup_time: NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
                .unwrap_or(NaiveTime::MIN),
            return_date: None,
            return_time: None,
        }
    }
}

impl SearchForm {
    pub fn from_state(state: &SearchState) -> Self {
        Self {
            trip_type: state.trip_type,
            from_city_name: state.from_city_name.clone(),
            to_city_name: state.to_city_name.clone(),
            pickup_date: state.pickup_date,
            pickup_time: state.pickup_time,
            return_date: state.return_date,
            return_time: state.return_time,
        }
    }

    /// Both city names are required. Return date and time are carried only
    /// for round trips with a chosen return date.
    pub fn into_state(self) -> Result<SearchState, AppError> {
        let from_city_name = self.from_city_name.trim().to_string();
        let to_city_name = self.to_city_name.trim().to_string();
        if from_city_name.is_empty() || to_city_name.is_empty() {
            return Err(AppError::Validation(
                "Please enter both FROM and TO cities.".to_string(),
            ));
        }

        let (return_date, return_time) = match (self.trip_type, self.return_date) {
            (TripType::RoundTrip, Some(date)) => (Some(date), self.return_time),
            _ => (None, None),
        };

        Ok(SearchState {
            trip_type: self.trip_type,
            from_city_name,
            to_city_name,
            pickup_date: self.pickup_date,
            pickup_time: self.pickup_time,
            return_date,
            return_time,
        })
    }
}
