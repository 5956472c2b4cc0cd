use std::sync::Arc;
use std::time::Duration;

use crate::autocomplete::AutocompleteField;
use crate::config::AppConfig;
use crate::otp::LoginFlow;
use crate::services::device::{register_device, PushTokenProvider};
use crate::services::ApiClient;
use crate::storage::{read_or_none, KeyValueStore, ACCESS_TOKEN_KEY};
use crate::wizard::DetailsStep;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn KeyValueStore>,
    pub api: Arc<ApiClient>,
    pub push: Box<dyn PushTokenProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        push: Box<dyn PushTokenProvider>,
    ) -> Self {
        let api = Arc::new(ApiClient::from_config(&config, store.clone()));
        Self {
            config,
            store,
            api,
            push,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        read_or_none(self.store.as_ref(), ACCESS_TOKEN_KEY).is_some()
    }

    /// Login flow carrying this device's push token, if one is available.
    pub async fn login_flow(&self) -> LoginFlow {
        let device_token = register_device(self.push.as_ref()).await;
        LoginFlow::new(device_token, self.config.otp_countdown_secs)
    }

    pub fn city_field(&self, initial: &str) -> AutocompleteField {
        AutocompleteField::new(initial)
            .with_debounce(Duration::from_millis(self.config.autocomplete_debounce_ms))
    }

    pub fn details_step(&self) -> DetailsStep {
        let mut step = DetailsStep::from_config(&self.config);
        step.prefill_phone(self.store.as_ref());
        step
    }
}
