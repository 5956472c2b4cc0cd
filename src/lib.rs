pub mod autocomplete;
pub mod config;
pub mod debounce;
pub mod errors;
pub mod format;
pub mod models;
pub mod otp;
pub mod services;
pub mod state;
pub mod storage;
pub mod wizard;
