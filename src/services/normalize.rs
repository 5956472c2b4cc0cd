//! Response-shape tolerance for the booking backend.
//!
//! The backend wraps list responses inconsistently. Every accepted shape is
//! listed here, in the order it is tried, so a contract change touches only
//! this module:
//!
//! 1. a bare JSON array;
//! 2. an object holding the array under one of [`LIST_KEYS`];
//! 3. for vehicle types, the first of [`VEHICLE_LIST_KEYS`] holding an array,
//!    even an empty one;
//! 4. for vehicle types, the first array found one level deep, then two
//!    levels deep, in the key order of the response.
//!
//! Any other shape is an empty list.

use serde_json::Value;

use crate::models::{City, TripTypeRecord, VehicleType};

pub const LIST_KEYS: &[&str] = &["data", "items", "results"];
pub const VEHICLE_LIST_KEYS: &[&str] = &["data", "items", "results", "rows", "list", "vehicleTypes"];

/// Flat image fields, most specific first.
const IMAGE_FIELDS: &[&str] = &[
    "imageUrl",
    "image_url",
    "image",
    "photoUrl",
    "photo",
    "picture",
    "thumbnail",
    "icon",
    "coverUrl",
    "cover",
];

const EMPTY: &[Value] = &[];

/// Array held by `value` directly or under one of `keys`.
pub fn list_envelope<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = value.as_array() {
        return items;
    }
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(EMPTY)
}

/// Vehicle-type list discovery: a bare array or the first known key holding
/// an array, even an empty one; only then the first array one or two levels
/// into an unlabeled object.
pub fn discover_array(value: &Value) -> &[Value] {
    if let Some(items) = value.as_array() {
        return items;
    }
    let Some(obj) = value.as_object() else {
        return EMPTY;
    };
    if let Some(items) = VEHICLE_LIST_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array))
    {
        return items;
    }

    for v in obj.values() {
        if let Some(items) = v.as_array() {
            return items;
        }
        if let Some(inner) = v.as_object() {
            if let Some(items) = inner.values().find_map(Value::as_array) {
                return items;
            }
        }
    }

    EMPTY
}

/// Number or numeric string.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Loose truthiness: `null`, `false`, `0` and `""` are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Prefixes relative references with the base URL. Absolute http(s) URLs and
/// data URIs pass through.
pub fn absolutize(base_url: &str, raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || raw.starts_with("data:") {
        return raw.to_string();
    }

    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return raw.to_string();
    }
    if raw.starts_with('/') {
        format!("{base}{raw}")
    } else {
        format!("{base}/{raw}")
    }
}

/// First image reference found on a vehicle record, made absolute.
pub fn pick_vehicle_image(record: &Value, base_url: &str) -> Option<String> {
    let direct = IMAGE_FIELDS
        .iter()
        .find_map(|f| record.get(*f).and_then(non_empty_str));

    let nested = || {
        record
            .pointer("/media/url")
            .and_then(non_empty_str)
            .or_else(|| record.pointer("/images/0/url").and_then(non_empty_str))
            .or_else(|| {
                record.pointer("/photos/0").and_then(|p| {
                    non_empty_str(p).or_else(|| p.get("url").and_then(non_empty_str))
                })
            })
            .or_else(|| record.pointer("/asset/url").and_then(non_empty_str))
    };

    direct
        .or_else(nested)
        .map(|raw| absolutize(base_url, raw))
}

/// Normalizes one vehicle record. Records without a usable id or name are
/// dropped rather than producing a partial entry.
pub fn vehicle_type(record: &Value, base_url: &str) -> Option<VehicleType> {
    let id = record.get("id").and_then(as_i64).filter(|id| *id != 0)?;
    let name = match record.get("name")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if name.is_empty() {
        return None;
    }

    Some(VehicleType {
        id,
        name,
        base_fare: record.get("baseFare").and_then(as_f64).unwrap_or(0.0),
        rate_per_km: record
            .get("estimatedRatePerKm")
            .and_then(as_f64)
            .unwrap_or(0.0),
        seating_capacity: record
            .get("seatingCapacity")
            .and_then(as_i64)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0),
        image_url: pick_vehicle_image(record, base_url),
    })
}

pub fn vehicle_types(value: &Value, base_url: &str) -> Vec<VehicleType> {
    discover_array(value)
        .iter()
        .filter_map(|r| vehicle_type(r, base_url))
        .collect()
}

pub fn city(record: &Value) -> Option<City> {
    Some(City {
        id: record.get("id").and_then(as_i64)?,
        name: record.get("name").and_then(Value::as_str)?.to_string(),
        state: record
            .get("state")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
    })
}

pub fn cities(value: &Value) -> Vec<City> {
    list_envelope(value, LIST_KEYS)
        .iter()
        .filter_map(city)
        .collect()
}

pub fn trip_types(value: &Value) -> Vec<TripTypeRecord> {
    list_envelope(value, LIST_KEYS)
        .iter()
        .filter_map(|r| {
            Some(TripTypeRecord {
                id: r.get("id").and_then(as_i64)?,
                name: r.get("name").and_then(Value::as_str).map(|s| s.to_string()),
                label: r.get("label").and_then(Value::as_str).map(|s| s.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://api.example.com/";

    #[test]
    fn test_list_envelope_shapes() {
        let bare = json!([{"id": 1}]);
        let wrapped = json!({"items": [{"id": 1}, {"id": 2}]});
        let other = json!({"payload": [{"id": 1}]});
        assert_eq!(list_envelope(&bare, LIST_KEYS).len(), 1);
        assert_eq!(list_envelope(&wrapped, LIST_KEYS).len(), 2);
        assert!(list_envelope(&other, LIST_KEYS).is_empty());
        assert!(list_envelope(&json!("nope"), LIST_KEYS).is_empty());
    }

    #[test]
    fn test_discover_array_one_and_two_levels() {
        let keyed = json!({"vehicleTypes": [{"id": 1}]});
        let one_level = json!({"status": "ok", "payload": [{"id": 1}, {"id": 2}]});
        let two_levels = json!({"status": "ok", "payload": {"page": 1, "entries": [{"id": 3}]}});
        let three_levels = json!({"a": {"b": {"c": [{"id": 4}]}}});
        let empty_known = json!({"featured": {"vehicles": [{"id": 9, "name": "Promo"}]}, "data": []});

        assert_eq!(discover_array(&keyed).len(), 1);
        assert_eq!(discover_array(&one_level).len(), 2);
        assert_eq!(discover_array(&two_levels)[0]["id"], 3);
        assert!(discover_array(&three_levels).is_empty());
        assert!(discover_array(&empty_known).is_empty());
        assert!(vehicle_types(&empty_known, "").is_empty());
    }

    #[test]
    fn test_vehicle_records_missing_id_or_name_are_excluded() {
        let raw = json!({"data": [
            {"id": 1, "name": "Sedan", "baseFare": 500, "estimatedRatePerKm": 12},
            {"name": "Ghost"},
            {"id": 3},
            {"id": 0, "name": "Zero"},
            {"id": "4", "name": "", "baseFare": 100},
            {"id": "5", "name": "SUV", "baseFare": "800", "estimatedRatePerKm": "15.5", "seatingCapacity": 7}
        ]});

        let types = vehicle_types(&raw, BASE);
        let names: Vec<_> = types.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Sedan", "SUV"]);
        assert_eq!(types[1].id, 5);
        assert_eq!(types[1].base_fare, 800.0);
        assert_eq!(types[1].rate_per_km, 15.5);
        assert_eq!(types[1].seating_capacity, Some(7));
    }

    #[test]
    fn test_image_candidates_in_order() {
        let flat = json!({"photo": "/uploads/a.jpg", "media": {"url": "/uploads/b.jpg"}});
        assert_eq!(
            pick_vehicle_image(&flat, BASE).as_deref(),
            Some("https://api.example.com/uploads/a.jpg")
        );

        let media = json!({"image": "", "media": {"url": "uploads/b.jpg"}});
        assert_eq!(
            pick_vehicle_image(&media, BASE).as_deref(),
            Some("https://api.example.com/uploads/b.jpg")
        );

        let images = json!({"images": [{"url": "HTTPS://cdn.example.com/c.png"}]});
        assert_eq!(
            pick_vehicle_image(&images, BASE).as_deref(),
            Some("HTTPS://cdn.example.com/c.png")
        );

        let photos = json!({"photos": ["data:image/png;base64,AAAA"]});
        assert_eq!(
            pick_vehicle_image(&photos, BASE).as_deref(),
            Some("data:image/png;base64,AAAA")
        );

        let asset = json!({"asset": {"url": "/d.webp"}});
        assert_eq!(
            pick_vehicle_image(&asset, BASE).as_deref(),
            Some("https://api.example.com/d.webp")
        );

        assert_eq!(pick_vehicle_image(&json!({"name": "Sedan"}), BASE), None);
    }

    #[test]
    fn test_absolutize_without_base_returns_raw() {
        assert_eq!(absolutize("", "/a.jpg"), "/a.jpg");
    }

    #[test]
    fn test_cities_and_trip_types() {
        let raw = json!({"results": [
            {"id": 7, "name": "Pune", "state": "Maharashtra"},
            {"id": "8", "name": "Goa"},
            {"name": "Nowhere"}
        ]});
        let cities = cities(&raw);
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[1].id, 8);
        assert_eq!(cities[1].state, None);

        let trips = trip_types(&json!([{"id": 2, "label": "Round Trip"}]));
        assert_eq!(trips[0].display_name(), Some("Round Trip"));
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(truthy(&json!({"name": "A"})));
        assert!(truthy(&json!(true)));
    }
}
