pub mod auth;
pub mod booking;
pub mod device;
pub mod http;
pub mod normalize;
pub mod places;
pub mod users;

pub use http::{ApiClient, ApiResponse};
