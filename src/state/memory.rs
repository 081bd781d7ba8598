use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::apikey::ApiKeyResourceModel;
use crate::errors::ProvisionerError;
use crate::state::StateStore;

/// Non-persistent state, used with the `memory` API backend and in tests
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: Mutex<BTreeMap<String, ApiKeyResourceModel>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, name: &str) -> Result<Option<ApiKeyResourceModel>, ProvisionerError> {
        Ok(self.records.lock().await.get(name).cloned())
    }

    async fn put(&self, name: &str, record: &ApiKeyResourceModel) -> Result<(), ProvisionerError> {
        self.records
            .lock()
            .await
            .insert(name.to_string(), record.clone());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool, ProvisionerError> {
        Ok(self.records.lock().await.remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>, ProvisionerError> {
        Ok(self.records.lock().await.keys().cloned().collect())
    }

    fn store_type(&self) -> &'static str {
        "memory"
    }
}
