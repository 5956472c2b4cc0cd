use serde::Serialize;
use serde_json::Value;

use super::http::{ApiClient, ApiResponse};
use super::normalize::non_empty_str;
use crate::errors::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpRequest<'a> {
    mobile_number: &'a str,
    device_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpRequest<'a> {
    mobile_number: &'a str,
    otp: &'a str,
    device_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedLogin {
    pub access_token: Option<String>,
    pub message: Option<String>,
}

fn message_of(data: &Value) -> Option<String> {
    data.get("message")
        .and_then(non_empty_str)
        .map(|s| s.to_string())
}

/// Token under any of the names the backend has used.
fn access_token_of(data: &Value) -> Option<String> {
    ["/access_token", "/accessToken", "/token", "/data/access_token", "/data/accessToken"]
        .iter()
        .find_map(|p| data.pointer(p).and_then(non_empty_str))
        .map(|s| s.to_string())
}

fn rejected(resp: &ApiResponse, data: &Value, fallback: &str) -> AppError {
    AppError::Rejected {
        status: resp.status.as_u16(),
        message: message_of(data).unwrap_or_else(|| fallback.to_string()),
    }
}

pub async fn send_otp(
    api: &ApiClient,
    mobile_number: &str,
    device_token: Option<&str>,
) -> Result<(), AppError> {
    let resp = api
        .post_anonymous(
            "/auth/send-otp",
            &SendOtpRequest {
                mobile_number,
                device_token,
            },
        )
        .await?;

    let data = resp.json().unwrap_or(Value::Null);
    if !resp.is_success() {
        return Err(rejected(&resp, &data, "Failed to send OTP"));
    }

    tracing::info!(mobile = mobile_number, "otp sent");
    Ok(())
}

/// Verifies a login code. A 2xx body can still reject the code through
/// `success`, `valid` or `ok` being `false`.
pub async fn verify_otp(
    api: &ApiClient,
    mobile_number: &str,
    otp: &str,
    device_token: Option<&str>,
) -> Result<VerifiedLogin, AppError> {
    let resp = api
        .post_anonymous(
            "/auth/verify-otp",
            &VerifyOtpRequest {
                mobile_number,
                otp,
                device_token,
            },
        )
        .await?;

    let data = resp.json().unwrap_or(Value::Null);
    tracing::debug!(status = resp.status.as_u16(), "verify-otp response");

    let flagged_false = ["success", "valid", "ok"]
        .iter()
        .any(|k| data.get(*k).and_then(Value::as_bool) == Some(false));

    if !resp.is_success() || flagged_false {
        return Err(rejected(&resp, &data, "Invalid OTP. Please try again."));
    }

    Ok(VerifiedLogin {
        access_token: access_token_of(&data),
        message: message_of(&data),
    })
}

/// Password login, returning the access token.
pub async fn login(api: &ApiClient, identifier: &str, password: &str) -> Result<String, AppError> {
    let resp = api
        .post_anonymous("/auth/login", &LoginRequest { identifier, password })
        .await?;

    let data = resp.json().unwrap_or(Value::Null);
    if !resp.is_success() {
        return Err(rejected(&resp, &data, "Login failed"));
    }

    access_token_of(&data).ok_or_else(|| AppError::Rejected {
        status: resp.status.as_u16(),
        message: "login response carried no access token".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_access_token_locations() {
        assert_eq!(access_token_of(&json!({"access_token": "a"})).as_deref(), Some("a"));
        assert_eq!(access_token_of(&json!({"data": {"accessToken": "b"}})).as_deref(), Some("b"));
        assert_eq!(access_token_of(&json!({"token": ""})), None);
    }

    #[test]
    fn test_request_bodies_are_camel_case() {
        let body = serde_json::to_value(VerifyOtpRequest {
            mobile_number: "9876543210",
            otp: "1234",
            device_token: None,
        })
        .unwrap();
        assert_eq!(body, json!({"mobileNumber": "9876543210", "otp": "1234", "deviceToken": null}));
    }
}
