use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::errors::{ProvisionerError, RemoteError};

pub mod http;
pub mod memory;
pub mod types;

pub use http::HttpCloudService;
pub use memory::{InMemoryCloudService, OperationBehavior};
pub use types::*;

/// Remote API key control plane.
///
/// Every mutating call returns an [`AsyncOperation`] that has to be awaited
/// before the change is visible through [`CloudService::get_api_key`].
#[async_trait]
pub trait CloudService: Send + Sync + fmt::Debug {
    async fn create_api_key(
        &self,
        request: CreateApiKeyRequest,
    ) -> Result<CreateApiKeyResponse, RemoteError>;

    async fn get_api_key(&self, key_id: &str) -> Result<ApiKey, RemoteError>;

    async fn update_api_key(
        &self,
        key_id: &str,
        request: UpdateApiKeyRequest,
    ) -> Result<UpdateApiKeyResponse, RemoteError>;

    async fn delete_api_key(
        &self,
        key_id: &str,
        request: DeleteApiKeyRequest,
    ) -> Result<DeleteApiKeyResponse, RemoteError>;

    async fn get_async_operation(&self, operation_id: &str) -> Result<AsyncOperation, RemoteError>;

    /// Short name of the implementation, used in logs
    fn backend_type(&self) -> &'static str;
}

/// Builds a [`CloudService`] from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create(config: &ApiConfig) -> Result<Arc<dyn CloudService>, ProvisionerError> {
        let client: Arc<dyn CloudService> = match config.backend.as_str() {
            "http" => {
                let token = std::env::var(&config.api_key_env).map_err(|_| {
                    ProvisionerError::Config(format!(
                        "Environment variable {} not set",
                        config.api_key_env
                    ))
                })?;
                Arc::new(HttpCloudService::new(config, token)?)
            }
            "memory" => Arc::new(InMemoryCloudService::new()),
            other => {
                return Err(ProvisionerError::Config(format!(
                    "Unknown API backend: {other}. Supported backends: http, memory"
                )));
            }
        };

        tracing::info!("Using {} cloud API backend", client.backend_type());
        Ok(client)
    }
}
