//! Core port implementations backed by the API client

use std::sync::Arc;

use async_trait::async_trait;
use codetrail_core::{ActivityForwarder, Delivery, TokenVerifier};
use codetrail_domain::{ActivityInfo, Credentials, Result};
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;

/// Posts flushed batches and verifies login tokens.
#[derive(Debug, Clone)]
pub struct ApiForwarder {
    client: Arc<ApiClient>,
}

impl ApiForwarder {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActivityForwarder for ApiForwarder {
    #[instrument(skip(self, activity), fields(batch_id = %activity.batch_id, states = activity.states.len(), events = activity.events.len()))]
    async fn forward(&self, activity: &ActivityInfo) -> Delivery {
        let response = self.client.post_activity(activity).await;
        let delivery = response.delivery();
        match &delivery {
            Delivery::Accepted => debug!("Activity accepted"),
            Delivery::Retry(reason) => warn!(reason = %reason, "Activity post failed, will retry"),
            Delivery::Discard(reason) => warn!(reason = %reason, "Activity post rejected"),
        }
        delivery
    }
}

#[async_trait]
impl TokenVerifier for ApiForwarder {
    async fn verify(&self, credentials: &Credentials) -> Result<()> {
        self.client.token_authenticate(credentials).await.into_result()?;
        info!(identity = %credentials.identity(), "Token verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use codetrail_domain::CodetrailError;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiClientConfig;

    fn forwarder_for(server: &MockServer) -> ApiForwarder {
        let config = ApiClientConfig { base_url: server.uri(), ..ApiClientConfig::default() };
        ApiForwarder::new(Arc::new(ApiClient::new(config).expect("api client")))
    }

    fn activity() -> ActivityInfo {
        ActivityInfo {
            instance: "default".into(),
            project_id: Uuid::nil(),
            batch_id: Uuid::now_v7(),
            start_time: "2024-05-01T09:00:00.000".into(),
            end_time: "2024-05-01T09:05:00.000".into(),
            states: Vec::new(),
            events: Vec::new(),
        }
    }

    #[tokio::test]
    async fn server_errors_ask_for_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activity"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let delivery = forwarder_for(&server).forward(&activity()).await;
        assert_eq!(delivery, Delivery::Retry("HTTP 502: Error".into()));
    }

    #[tokio::test]
    async fn bad_request_is_discarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/activity"))
            .respond_with(ResponseTemplate::new(400).insert_header("reason", "Malformed batch"))
            .mount(&server)
            .await;

        let delivery = forwarder_for(&server).forward(&activity()).await;
        assert_eq!(delivery, Delivery::Discard("HTTP 400: Malformed batch".into()));
    }

    #[tokio::test]
    async fn rejected_token_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/account/ada/authorized"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let result = forwarder_for(&server).verify(&Credentials::new("ada", "nope")).await;
        assert!(matches!(result, Err(CodetrailError::Auth(_))));
    }
}
