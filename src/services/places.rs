use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::http::ApiClient;
use super::normalize::{as_i64, non_empty_str};
use crate::autocomplete::SuggestionSource;
use crate::models::{City, Suggestion, SuggestionId};

const MIN_QUERY_CHARS: usize = 2;

/// Place suggestions for a free-text query. Short queries and any failure
/// yield an empty list.
pub async fn places_autocomplete(api: &ApiClient, query: &str) -> Vec<Suggestion> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        return Vec::new();
    }

    let resp = match api.get("/places/autocomplete", &[("input", query)]).await {
        Ok(resp) if resp.is_success() => resp,
        Ok(resp) => {
            tracing::debug!(status = resp.status.as_u16(), "places autocomplete unavailable");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "places autocomplete failed");
            return Vec::new();
        }
    };

    resp.json().map(|j| parse_suggestions(&j)).unwrap_or_default()
}

/// Accepted shapes: `{predictions: [{description, place_id}]}`, or a bare
/// array of records carrying `label` or `city`/`state`.
pub fn parse_suggestions(value: &Value) -> Vec<Suggestion> {
    if let Some(predictions) = value.get("predictions").and_then(Value::as_array) {
        return predictions
            .iter()
            .enumerate()
            .filter_map(|(idx, p)| {
                let label = p.get("description").and_then(non_empty_str)?;
                let id = p
                    .get("place_id")
                    .and_then(suggestion_id)
                    .unwrap_or(SuggestionId::Number(idx as i64));
                Some(Suggestion::new(Some(id), label))
            })
            .collect();
    }

    if let Some(records) = value.as_array() {
        return records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| {
                let label = match r.get("label").and_then(Value::as_str) {
                    Some(label) => label.to_string(),
                    None => ["city", "state"]
                        .iter()
                        .filter_map(|k| r.get(*k).and_then(non_empty_str))
                        .collect::<Vec<_>>()
                        .join(", "),
                };
                if label.is_empty() {
                    return None;
                }
                let id = r
                    .get("id")
                    .and_then(suggestion_id)
                    .unwrap_or(SuggestionId::Number(idx as i64));
                Some(Suggestion::new(Some(id), label))
            })
            .collect();
    }

    Vec::new()
}

fn suggestion_id(value: &Value) -> Option<SuggestionId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(SuggestionId::Text(s.clone())),
        other => as_i64(other).map(SuggestionId::Number),
    }
}

/// Suggestions from the backend places endpoint.
pub struct PlacesSource {
    api: Arc<ApiClient>,
}

impl PlacesSource {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl SuggestionSource for PlacesSource {
    async fn fetch(&self, query: &str) -> Vec<Suggestion> {
        places_autocomplete(&self.api, query).await
    }
}

/// Suggestions filtered from an already-loaded city list, labelled
/// `"Name, State"` so they resolve back to the same city.
pub struct CityListSource {
    cities: Vec<City>,
}

impl CityListSource {
    pub fn new(cities: Vec<City>) -> Self {
        Self { cities }
    }
}

#[async_trait]
impl SuggestionSource for CityListSource {
    async fn fetch(&self, query: &str) -> Vec<Suggestion> {
        let needle = query.trim().to_lowercase();
        self.cities
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .map(|c| {
                let label = match c.state.as_deref().filter(|s| !s.is_empty()) {
                    Some(state) => format!("{}, {}", c.name, state),
                    None => c.name.clone(),
                };
                Suggestion::new(Some(SuggestionId::Number(c.id)), label)
            })
            .collect()
    }
}
