use async_trait::async_trait;

use crate::apikey::ApiKeyResourceModel;
use crate::errors::ProvisionerError;

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;

/// Locally tracked API key records, keyed by a user-chosen name
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<ApiKeyResourceModel>, ProvisionerError>;

    async fn put(&self, name: &str, record: &ApiKeyResourceModel) -> Result<(), ProvisionerError>;

    /// Stop tracking `name`; returns whether anything was removed
    async fn remove(&self, name: &str) -> Result<bool, ProvisionerError>;

    async fn list(&self) -> Result<Vec<String>, ProvisionerError>;

    fn store_type(&self) -> &'static str;
}
