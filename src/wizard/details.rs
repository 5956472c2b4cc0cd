use std::time::Duration;

use crate::config::AppConfig;
use crate::debounce::Debouncer;
use crate::errors::AppError;
use crate::models::{BookingReceipt, PassengerDetails, PhoneLookup, SearchState, SelectedCar};
use crate::otp::BookingOtpGate;
use crate::services::booking::submit_booking;
use crate::services::users::check_phone;
use crate::services::ApiClient;
use crate::storage::{read_or_none, KeyValueStore, MOBILE_NUMBER_KEY};

pub const DEFAULT_PHONE_DEBOUNCE: Duration = Duration::from_millis(400);

const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 7..=15;

fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Identifies one phone lookup; stale tickets are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    pub phone: String,
}

/// Step 3: passenger details, the booking OTP gate and the final submission.
pub struct DetailsStep {
    details: PassengerDetails,
    gate: BookingOtpGate,
    lookup_generation: u64,
    phone_debouncer: Debouncer<String>,
    creating: bool,
    receipt: Option<BookingReceipt>,
}

impl DetailsStep {
    pub fn new(gate: BookingOtpGate, phone_debounce: Duration) -> Self {
        Self {
            details: PassengerDetails::default(),
            gate,
            lookup_generation: 0,
            phone_debouncer: Debouncer::new(phone_debounce),
            creating: false,
            receipt: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            BookingOtpGate::new(config.booking_test_otp.clone(), config.otp_countdown_secs),
            Duration::from_millis(config.phone_debounce_ms),
        )
    }

    pub fn details(&self) -> &PassengerDetails {
        &self.details
    }

    pub fn gate(&self) -> &BookingOtpGate {
        &self.gate
    }

    pub fn receipt(&self) -> Option<&BookingReceipt> {
        self.receipt.as_ref()
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn set_pickup_location(&mut self, value: impl Into<String>) {
        self.details.pickup_location = value.into();
    }

    pub fn set_name(&mut self, value: impl Into<String>) {
        self.details.name = value.into();
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.details.email = value.into();
    }

    /// Updates the phone and schedules a debounced customer lookup.
    pub fn set_phone(&mut self, value: impl Into<String>) {
        self.details.phone = value.into();
        self.phone_debouncer.push(self.details.phone.clone());
    }

    /// Fills an empty phone field with the mobile number saved at login.
    pub fn prefill_phone(&mut self, store: &dyn KeyValueStore) -> bool {
        if !self.details.phone.is_empty() {
            return false;
        }
        match read_or_none(store, MOBILE_NUMBER_KEY) {
            Some(mobile) => {
                self.set_phone(mobile);
                true
            }
            None => false,
        }
    }

    /// Starts a lookup for a settled phone value. Phones outside 7 to 15
    /// digits are not looked up.
    pub fn begin_lookup(&mut self, debounced: &str) -> Option<LookupTicket> {
        self.lookup_generation += 1;
        let phone = debounced.trim();
        if !PHONE_DIGITS.contains(&phone_digits(phone).len()) {
            return None;
        }
        Some(LookupTicket {
            generation: self.lookup_generation,
            phone: phone.to_string(),
        })
    }

    /// Fills name and email from a known customer, leaving anything the
    /// user already typed untouched.
    pub fn apply_lookup(&mut self, ticket: &LookupTicket, lookup: PhoneLookup) -> bool {
        if ticket.generation != self.lookup_generation {
            tracing::trace!(phone = %ticket.phone, "discarding superseded phone lookup");
            return false;
        }
        if !lookup.exists {
            return true;
        }

        if self.details.name.trim().is_empty() {
            if let Some(name) = lookup.name.filter(|n| !n.is_empty()) {
                self.details.name = name;
            }
        }
        if self.details.email.trim().is_empty() {
            if let Some(email) = lookup.email.filter(|e| !e.is_empty()) {
                self.details.email = email;
            }
        }
        true
    }

    /// Waits for the next settled phone value and looks it up.
    pub async fn pump_lookup(&mut self, api: &ApiClient) -> bool {
        let Some(debounced) = self.phone_debouncer.recv().await else {
            return false;
        };
        if let Some(ticket) = self.begin_lookup(&debounced) {
            let lookup = check_phone(api, &ticket.phone).await;
            self.apply_lookup(&ticket, lookup);
        }
        true
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let d = &self.details;
        if d.pickup_location.trim().is_empty() {
            return Err(AppError::Validation("Pickup location is required.".to_string()));
        }
        if d.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required.".to_string()));
        }
        if d.email.trim().is_empty() {
            return Err(AppError::Validation("Email is required.".to_string()));
        }
        if !PHONE_DIGITS.contains(&phone_digits(&d.phone).len()) {
            return Err(AppError::Validation(
                "Enter a valid phone number (7-15 digits).".to_string(),
            ));
        }
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        self.receipt.is_none() && !self.creating && self.validate().is_ok()
    }

    /// Opens the OTP modal once the details are complete.
    pub fn request_otp(&mut self) -> Result<(), AppError> {
        self.ensure_not_submitted()?;
        self.validate()?;
        self.gate.request();
        Ok(())
    }

    pub fn enter_otp(&mut self, code: impl Into<String>) {
        self.gate.enter(code);
    }

    pub fn resend_otp(&mut self) -> Result<(), AppError> {
        self.ensure_not_submitted()?;
        self.gate.resend()
    }

    pub fn dismiss_otp(&mut self) {
        self.gate.dismiss();
    }

    /// Verifies the booking OTP and creates the booking. Succeeds at most
    /// once per step; a confirm abandoned mid-flight leaves the step locked.
    pub async fn confirm(
        &mut self,
        api: &ApiClient,
        search: &SearchState,
        car: &SelectedCar,
    ) -> Result<BookingReceipt, AppError> {
        self.ensure_not_submitted()?;
        self.validate()?;
        self.gate.verify()?;

        self.creating = true;
        let result = submit_booking(api, search, car, &self.details).await;
        self.creating = false;

        let receipt = result?;
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    fn ensure_not_submitted(&self) -> Result<(), AppError> {
        if self.creating {
            return Err(AppError::InvalidTransition(
                "booking is already being created".to_string(),
            ));
        }
        if self.receipt.is_some() {
            return Err(AppError::InvalidTransition(
                "booking has already been created".to_string(),
            ));
        }
        Ok(())
    }
}
