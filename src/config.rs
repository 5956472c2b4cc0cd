use std::env;

use crate::errors::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub storage_path: String,
    pub dev_mode: bool,
    pub api_email: String,
    pub api_password: String,
    pub booking_test_otp: String,
    pub autocomplete_debounce_ms: u64,
    pub phone_debounce_ms: u64,
    pub otp_countdown_secs: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "ridebook.db".to_string()),
            dev_mode: env::var("DEV_MODE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            api_email: env::var("API_EMAIL").unwrap_or_default(),
            api_password: env::var("API_PASSWORD").unwrap_or_default(),
            booking_test_otp: env::var("BOOKING_TEST_OTP").unwrap_or_else(|_| "1234".to_string()),
            autocomplete_debounce_ms: env::var("AUTOCOMPLETE_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(250),
            phone_debounce_ms: env::var("PHONE_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(400),
            otp_countdown_secs: env::var("OTP_COUNTDOWN_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let base = self.api_base_url.to_ascii_lowercase();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "API_BASE_URL must be an http(s) URL, got {:?}",
                self.api_base_url
            )));
        }
        if self.booking_test_otp.trim().is_empty() {
            return Err(AppError::Config("BOOKING_TEST_OTP must not be empty".to_string()));
        }
        Ok(())
    }

    /// Development login credentials, when both halves are configured.
    pub fn dev_credentials(&self) -> Option<(&str, &str)> {
        if self.api_email.is_empty() || self.api_password.is_empty() {
            None
        } else {
            Some((self.api_email.as_str(), self.api_password.as_str()))
        }
    }
}
