use async_trait::async_trait;

/// Platform push-notification capability. Permission prompts and token
/// retrieval are native concerns; the login flow only needs the token.
#[async_trait]
pub trait PushTokenProvider: Send + Sync {
    async fn request_permission(&self) -> anyhow::Result<bool>;
    async fn device_token(&self) -> anyhow::Result<Option<String>>;
}

/// Provider for environments without push support.
pub struct NoPush;

#[async_trait]
impl PushTokenProvider for NoPush {
    async fn request_permission(&self) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn device_token(&self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Provider returning a fixed token, e.g. one passed on the command line.
pub struct StaticPushToken(pub String);

#[async_trait]
impl PushTokenProvider for StaticPushToken {
    async fn request_permission(&self) -> anyhow::Result<bool> {
        Ok(true)
    }

    async fn device_token(&self) -> anyhow::Result<Option<String>> {
        Ok(Some(self.0.clone()).filter(|t| !t.is_empty()))
    }
}

/// Asks for permission and fetches the device token. Failures are logged and
/// read as "no token"; login proceeds without one.
pub async fn register_device(provider: &dyn PushTokenProvider) -> Option<String> {
    match provider.request_permission().await {
        Ok(true) => {}
        Ok(false) => tracing::debug!("notification permission not granted"),
        Err(e) => tracing::warn!(error = %e, "notification permission request failed"),
    }

    match provider.device_token().await {
        Ok(token) => {
            if token.is_some() {
                tracing::info!("device token registered");
            }
            token
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch device token");
            None
        }
    }
}
