use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cloud::types::*;
use crate::cloud::CloudService;
use crate::config::ApiConfig;
use crate::constants::api::API_VERSION_HEADER;
use crate::errors::{ProvisionerError, RemoteError, RemoteErrorCode};

/// Cloud control plane client over its JSON/HTTP gateway
pub struct HttpCloudService {
    http_client: Client,
    base_url: Url,
    api_version: String,
    token: String,
}

impl std::fmt::Debug for HttpCloudService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCloudService")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl HttpCloudService {
    pub fn new(config: &ApiConfig, token: String) -> Result<Self, ProvisionerError> {
        let request_timeout = humantime::parse_duration(&config.request_timeout).map_err(|e| {
            ProvisionerError::Config(format!(
                "Invalid request_timeout '{}': {e}",
                config.request_timeout
            ))
        })?;

        Self::with_timeout(&config.endpoint, &config.api_version, token, request_timeout)
    }

    pub fn with_timeout(
        base_url: &str,
        api_version: &str,
        token: String,
        request_timeout: Duration,
    ) -> Result<Self, ProvisionerError> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("apikey-provisioner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProvisionerError::Config(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ProvisionerError::Config(format!("Invalid API endpoint '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ProvisionerError::Config(format!(
                "Invalid API endpoint '{base_url}': not a base URL"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            api_version: api_version.to_string(),
            token,
        })
    }

    /// Endpoint URL with each segment percent-encoded, so ids cannot
    /// escape their path segment
    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::new(
                    RemoteErrorCode::Internal,
                    format!("API endpoint {} cannot carry a path", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header(API_VERSION_HEADER, &self.api_version)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RemoteError> {
        let response = self.authorize(builder).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            let message = Self::error_message(&body).unwrap_or(body);
            return Err(RemoteError::new(
                RemoteErrorCode::from_http_status(status.as_u16()),
                message,
            ));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::new(RemoteErrorCode::Decode, e.to_string()))
    }

    /// Extract `message` from a `{"code": .., "message": ..}` error body
    fn error_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
    }
}

#[async_trait]
impl CloudService for HttpCloudService {
    async fn create_api_key(
        &self,
        request: CreateApiKeyRequest,
    ) -> Result<CreateApiKeyResponse, RemoteError> {
        debug!(operation_id = %request.async_operation_id, "POST /cloud/api-keys");
        let url = self.url(&["cloud", "api-keys"])?;
        self.send(self.http_client.post(url).json(&request)).await
    }

    async fn get_api_key(&self, key_id: &str) -> Result<ApiKey, RemoteError> {
        debug!(key_id = %key_id, "GET /cloud/api-keys/{{id}}");
        let url = self.url(&["cloud", "api-keys", key_id])?;
        let response: GetApiKeyResponse = self.send(self.http_client.get(url)).await?;
        Ok(response.api_key)
    }

    async fn update_api_key(
        &self,
        key_id: &str,
        request: UpdateApiKeyRequest,
    ) -> Result<UpdateApiKeyResponse, RemoteError> {
        debug!(key_id = %key_id, operation_id = %request.async_operation_id, "POST /cloud/api-keys/{{id}}");
        let url = self.url(&["cloud", "api-keys", key_id])?;
        self.send(self.http_client.post(url).json(&request)).await
    }

    async fn delete_api_key(
        &self,
        key_id: &str,
        request: DeleteApiKeyRequest,
    ) -> Result<DeleteApiKeyResponse, RemoteError> {
        debug!(key_id = %key_id, operation_id = %request.async_operation_id, "DELETE /cloud/api-keys/{{id}}");
        let url = self.url(&["cloud", "api-keys", key_id])?;
        self.send(
            self.http_client
                .delete(url)
                .query(&[
                    ("resourceVersion", request.resource_version.as_str()),
                    ("asyncOperationId", request.async_operation_id.as_str()),
                ]),
        )
        .await
    }

    async fn get_async_operation(&self, operation_id: &str) -> Result<AsyncOperation, RemoteError> {
        let url = self.url(&["cloud", "operations", operation_id])?;
        let response: GetAsyncOperationResponse = self.send(self.http_client.get(url)).await?;
        Ok(response.async_operation)
    }

    fn backend_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"code": 5, "message": "api key not found"}"#;
        assert_eq!(
            HttpCloudService::error_message(body).as_deref(),
            Some("api key not found")
        );
        assert!(HttpCloudService::error_message("plain text").is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = HttpCloudService::with_timeout(
            "https://example.invalid/",
            "v1",
            "super-secret".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("https://example.invalid"));
    }

    #[test]
    fn test_ids_are_encoded_as_single_segments() {
        let client = HttpCloudService::with_timeout(
            "https://example.invalid/api/",
            "v1",
            "token".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        let url = client.url(&["cloud", "api-keys", "a/b?c#d"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.invalid/api/cloud/api-keys/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_rejects_invalid_endpoint() {
        let err = HttpCloudService::with_timeout(
            "not a url",
            "v1",
            "token".to_string(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ProvisionerError::Config(_)));
    }
}
