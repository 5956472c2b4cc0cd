pub mod confirm;
pub mod countdown;
pub mod entry;
pub mod login;

pub use confirm::BookingOtpGate;
pub use countdown::Countdown;
pub use entry::{OtpEntry, OTP_LENGTH};
pub use login::{LoginFlow, LoginOutcome};
