pub mod booking;
pub mod city;
pub mod search;
pub mod suggestion;
pub mod user;
pub mod vehicle;

pub use booking::{BookingPayload, BookingReceipt, PassengerDetails};
pub use city::{City, TripTypeRecord};
pub use search::{SearchState, SelectedCar, TripType};
pub use suggestion::{Suggestion, SuggestionId};
pub use user::PhoneLookup;
pub use vehicle::{VehicleOption, VehicleType};
