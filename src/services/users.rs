use serde_json::Value;

use super::http::ApiClient;
use super::normalize::truthy;
use crate::models::PhoneLookup;

/// Looks up an existing customer by phone. Any failure reads as "not found".
pub async fn check_phone(api: &ApiClient, phone: &str) -> PhoneLookup {
    if phone.is_empty() {
        return PhoneLookup::default();
    }

    match api.get("/users/check-phone", &[("phone", phone)]).await {
        Ok(resp) if resp.is_success() => resp
            .json()
            .map(|j| parse_lookup(&j, phone))
            .unwrap_or_default(),
        Ok(resp) => {
            tracing::debug!(status = resp.status.as_u16(), "phone lookup unavailable");
            PhoneLookup::default()
        }
        Err(e) => {
            tracing::debug!(error = %e, "phone lookup failed");
            PhoneLookup::default()
        }
    }
}

/// Fields may sit at the root or under `user`; existence is signalled by the
/// first present of `exists`, `found`, `user`.
pub fn parse_lookup(j: &Value, phone: &str) -> PhoneLookup {
    let field = |key: &str| -> Option<String> {
        j.get(key)
            .filter(|v| !v.is_null())
            .or_else(|| j.get("user").and_then(|u| u.get(key)))
            .and_then(Value::as_str)
            .map(|s| s.to_string())
    };

    let exists = ["exists", "found", "user"]
        .iter()
        .find_map(|k| j.get(*k).filter(|v| !v.is_null()))
        .map(truthy)
        .unwrap_or(false);

    PhoneLookup {
        exists,
        name: field("name"),
        email: field("email"),
        phone: field("phone").or_else(|| Some(phone.to_string())),
    }
}
