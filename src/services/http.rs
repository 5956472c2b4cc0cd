use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::storage::{read_or_none, KeyValueStore, ACCESS_TOKEN_KEY};

const FAILURE_BODY_PREVIEW: usize = 300;

/// A fully-read backend response. The body is kept as text so it can be
/// logged, parsed as JSON, or surfaced verbatim.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parsed body, or `None` when it is empty or not JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Shared HTTP helper for every backend call: absolute URLs from the base,
/// JSON content type, bearer token from storage when one is present.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    store: Arc<dyn KeyValueStore>,
    dev_mode: bool,
    dev_credentials: Option<(String, String)>,
    dev_token: OnceCell<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            store,
            dev_mode: false,
            dev_credentials: None,
            dev_token: OnceCell::new(),
        }
    }

    pub fn from_config(config: &AppConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let mut api = Self::new(config.api_base_url.clone(), store).with_dev_mode(config.dev_mode);
        if let Some((email, password)) = config.dev_credentials() {
            api.dev_credentials = Some((email.to_string(), password.to_string()));
        }
        api
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, AppError> {
        let token = self.bearer_token().await;
        self.send(Method::GET, path, query, None, token.as_deref())
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, AppError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AppError::Transport(format!("failed to encode request body: {e}")))?;
        let token = self.bearer_token().await;
        self.send(Method::POST, path, &[], Some(&body), token.as_deref())
            .await
    }

    /// POST without consulting storage for a token. Used by the login calls
    /// themselves.
    pub async fn post_anonymous<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, AppError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AppError::Transport(format!("failed to encode request body: {e}")))?;
        self.send(Method::POST, path, &[], Some(&body), None).await
    }

    async fn bearer_token(&self) -> Option<String> {
        if let Some(token) = read_or_none(self.store.as_ref(), ACCESS_TOKEN_KEY) {
            return Some(token);
        }

        // Development fallback: a token obtained from configured credentials
        // is kept in memory for this client and never written to storage.
        // Concurrent callers share one login; a failed login is retried.
        let (identifier, password) = self.dev_credentials.as_ref()?;
        let token = self
            .dev_token
            .get_or_try_init(|| super::auth::login(self, identifier, password))
            .await;
        match token {
            Ok(token) => Some(token.clone()),
            Err(e) => {
                tracing::debug!(error = %e, "dev credential login failed, continuing unauthenticated");
                None
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<ApiResponse, AppError> {
        let mut req = self
            .client
            .request(method.clone(), self.url(path))
            .header(CONTENT_TYPE, "application/json");

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;

        let status = resp.status();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await.unwrap_or_default();

        if self.dev_mode && !status.is_success() {
            let preview: String = body.chars().take(FAILURE_BODY_PREVIEW).collect();
            tracing::warn!(
                status = status.as_u16(),
                method = %method,
                path,
                body = %preview,
                "api call failed"
            );
        }

        Ok(ApiResponse {
            status,
            location,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let api = client("https://api.example.com/");
        assert_eq!(api.base_url(), "https://api.example.com");
        assert_eq!(api.url("/cities"), "https://api.example.com/cities");
        assert_eq!(api.url("cities"), "https://api.example.com/cities");
    }

    #[test]
    fn test_response_json_tolerates_garbage() {
        let resp = ApiResponse {
            status: StatusCode::OK,
            location: None,
            body: "<html>oops</html>".to_string(),
        };
        assert!(resp.is_success());
        assert!(resp.json().is_none());
    }
}
