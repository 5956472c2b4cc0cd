use super::countdown::Countdown;
use crate::errors::AppError;

pub const DEFAULT_TEST_CODE: &str = "1234";

/// Confirmation step in front of booking creation. The code is checked
/// locally against a fixed test code; no server round trip is made.
pub struct BookingOtpGate {
    expected: String,
    code: String,
    open: bool,
    verified: bool,
    countdown: Countdown,
    countdown_secs: u32,
}

impl BookingOtpGate {
    pub fn new(expected: impl Into<String>, countdown_secs: u32) -> Self {
        Self {
            expected: expected.into(),
            code: String::new(),
            open: false,
            verified: false,
            countdown: Countdown::new(),
            countdown_secs,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_verified(&self) -> bool {
        self.verified
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Opens the modal with an empty code and a fresh countdown.
    pub fn request(&mut self) {
        self.open = true;
        self.code.clear();
        self.verified = false;
        self.countdown.start(self.countdown_secs);
    }

    /// Re-arms an open modal once the countdown has run out.
    pub fn resend(&mut self) -> Result<(), AppError> {
        if !self.open {
            return Err(AppError::InvalidTransition(
                "OTP has not been requested".to_string(),
            ));
        }
        if self.countdown.is_running() {
            return Err(AppError::InvalidTransition(format!(
                "resend available in {}s",
                self.countdown.remaining()
            )));
        }
        self.request();
        Ok(())
    }

    pub fn enter(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn verify(&mut self) -> Result<(), AppError> {
        if !self.open {
            return Err(AppError::InvalidTransition(
                "OTP has not been requested".to_string(),
            ));
        }
        if self.code.trim() != self.expected {
            self.code.clear();
            return Err(AppError::Validation(format!(
                "Invalid OTP. Use {} for testing.",
                self.expected
            )));
        }

        self.verified = true;
        self.open = false;
        self.countdown.stop();
        Ok(())
    }

    pub fn dismiss(&mut self) {
        self.open = false;
        self.code.clear();
        self.countdown.stop();
    }
}

impl Default for BookingOtpGate {
    fn default() -> Self {
        Self::new(DEFAULT_TEST_CODE, 60)
    }
}
