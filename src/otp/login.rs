use super::countdown::Countdown;
use super::entry::{OtpEntry, OTP_LENGTH};
use crate::errors::AppError;
use crate::services::{auth, ApiClient};
use crate::storage::{ACCESS_TOKEN_KEY, MOBILE_NUMBER_KEY};

const MIN_MOBILE_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token_saved: bool,
}

/// Account login by one-time code: enter mobile, request code, enter the
/// digits, verify. The mobile number is locked once a code was sent.
pub struct LoginFlow {
    mobile_number: String,
    device_token: Option<String>,
    otp_sent: bool,
    entry: OtpEntry,
    countdown: Countdown,
    countdown_secs: u32,
}

impl LoginFlow {
    pub fn new(device_token: Option<String>, countdown_secs: u32) -> Self {
        Self {
            mobile_number: String::new(),
            device_token,
            otp_sent: false,
            entry: OtpEntry::new(),
            countdown: Countdown::new(),
            countdown_secs,
        }
    }

    pub fn mobile_number(&self) -> &str {
        &self.mobile_number
    }

    pub fn is_otp_sent(&self) -> bool {
        self.otp_sent
    }

    pub fn entry(&self) -> &OtpEntry {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut OtpEntry {
        &mut self.entry
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn set_mobile_number(&mut self, mobile: impl Into<String>) -> Result<(), AppError> {
        if self.otp_sent {
            return Err(AppError::InvalidTransition(
                "mobile number is locked after the OTP was sent".to_string(),
            ));
        }
        self.mobile_number = mobile.into();
        Ok(())
    }

    pub async fn send_otp(&mut self, api: &ApiClient) -> Result<(), AppError> {
        let mobile = self.mobile_number.trim().to_string();
        if mobile.chars().count() < MIN_MOBILE_CHARS {
            return Err(AppError::Validation(
                "Please enter a valid mobile number.".to_string(),
            ));
        }

        auth::send_otp(api, &mobile, self.device_token.as_deref()).await?;

        self.otp_sent = true;
        self.entry.reset();
        self.countdown.start(self.countdown_secs);
        Ok(())
    }

    /// Verifies the entered digits. Any rejection or transport failure clears
    /// the digits so a rejected code is never left on screen.
    pub async fn verify(&mut self, api: &ApiClient) -> Result<LoginOutcome, AppError> {
        if !self.otp_sent {
            return Err(AppError::InvalidTransition(
                "no OTP has been requested".to_string(),
            ));
        }
        let otp = self.entry.code();
        if otp.len() != OTP_LENGTH {
            return Err(AppError::Validation(format!(
                "Please enter the {OTP_LENGTH}-digit OTP."
            )));
        }

        let mobile = self.mobile_number.trim().to_string();
        let verified = match auth::verify_otp(api, &mobile, &otp, self.device_token.as_deref()).await
        {
            Ok(verified) => verified,
            Err(e) => {
                tracing::warn!(error = %e, "otp verification failed");
                self.entry.reset();
                return Err(e);
            }
        };

        self.countdown.stop();

        let store = api.store();
        let token_saved = match verified.access_token.as_deref() {
            Some(token) => match store.set(ACCESS_TOKEN_KEY, token) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to persist access token");
                    false
                }
            },
            None => false,
        };
        if let Err(e) = store.set(MOBILE_NUMBER_KEY, &mobile) {
            tracing::warn!(error = %e, "failed to persist mobile number");
        }

        tracing::info!(mobile = %mobile, token_saved, "login successful");
        Ok(LoginOutcome { token_saved })
    }

    /// Clears partial input and requests a fresh code.
    pub async fn resend(&mut self, api: &ApiClient) -> Result<(), AppError> {
        self.entry.reset();
        self.send_otp(api).await
    }
}
