use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::apikey::model::ApiKeyResourceModel;
use crate::cloud::types::{ApiKey, CreateApiKeyRequest, DeleteApiKeyRequest, UpdateApiKeyRequest};
use crate::cloud::CloudService;
use crate::constants::timeouts;
use crate::context::CallContext;
use crate::errors::ProvisionerError;
use crate::operation::{OperationWaiter, PollConfig};
use crate::utils::SecretToken;

/// Default deadline of each lifecycle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for LifecycleTimeouts {
    fn default() -> Self {
        Self {
            create: timeouts::DEFAULT_CREATE,
            read: timeouts::DEFAULT_READ,
            update: timeouts::DEFAULT_UPDATE,
            delete: timeouts::DEFAULT_DELETE,
        }
    }
}

/// Where a key sits in its lifecycle, from this controller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Unknown,
    Creating,
    Present,
    Deleting,
    Absent,
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecyclePhase::Unknown => "unknown",
            LifecyclePhase::Creating => "creating",
            LifecyclePhase::Present => "present",
            LifecyclePhase::Deleting => "deleting",
            LifecyclePhase::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// Result of reconciling a tracked record against the control plane
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Present(ApiKeyResourceModel),
    /// The remote object is gone; stop tracking it
    Absent,
}

/// Fresh idempotency token for one mutating call
pub fn new_idempotency_token() -> String {
    Uuid::new_v4().to_string()
}

fn transition(key_id: &str, from: LifecyclePhase, to: LifecyclePhase) {
    debug!(key_id = %key_id, from = %from, to = %to, "API key lifecycle transition");
}

/// Create/read/update/delete for API keys.
///
/// Each call derives its own deadline from the caller's context and either
/// returns the complete canonical record or an error; there is no partial
/// result.
#[derive(Debug, Clone)]
pub struct ApiKeyResource {
    client: Arc<dyn CloudService>,
    waiter: OperationWaiter,
    timeouts: LifecycleTimeouts,
}

impl ApiKeyResource {
    pub fn new(client: Arc<dyn CloudService>, poll: PollConfig, timeouts: LifecycleTimeouts) -> Self {
        let waiter = OperationWaiter::new(client.clone(), poll);
        Self {
            client,
            waiter,
            timeouts,
        }
    }

    pub fn timeouts(&self) -> &LifecycleTimeouts {
        &self.timeouts
    }

    async fn fetch(
        &self,
        ctx: &CallContext,
        operation: &'static str,
        key_id: &str,
    ) -> Result<ApiKey, ProvisionerError> {
        ctx.run(operation, async {
            self.client
                .get_api_key(key_id)
                .await
                .map_err(|e| ProvisionerError::remote(operation, e))
        })
        .await
    }

    /// Create the key described by `plan` and return the canonical record,
    /// including the one-time token
    pub async fn create(
        &self,
        ctx: &CallContext,
        plan: &ApiKeyResourceModel,
    ) -> Result<ApiKeyResourceModel, ProvisionerError> {
        let timeout = plan.timeouts.create_or(self.timeouts.create)?;
        let spec = plan.to_spec()?;
        let ctx = ctx.with_timeout(timeout);

        let request = CreateApiKeyRequest {
            spec,
            async_operation_id: new_idempotency_token(),
        };
        info!(
            owner_type = %plan.owner_type,
            owner_id = %plan.owner_id,
            display_name = %plan.display_name,
            operation_id = %request.async_operation_id,
            "Creating API key"
        );

        let response = ctx
            .run("create API key", async {
                self.client
                    .create_api_key(request)
                    .await
                    .map_err(|e| ProvisionerError::remote("create API key", e))
            })
            .await?;
        transition(&response.key_id, LifecyclePhase::Unknown, LifecyclePhase::Creating);

        self.waiter
            .await_operation(&ctx, "create API key", response.async_operation)
            .await?;

        let api_key = self
            .fetch(&ctx, "get API key after creation", &response.key_id)
            .await?;

        let mut model = plan.clone();
        model.apply_remote(&api_key)?;
        model.token = Some(SecretToken::new(response.token));

        transition(&api_key.id, LifecyclePhase::Creating, LifecyclePhase::Present);
        info!(key_id = %api_key.id, state = ?model.state, "✅ API key created");
        Ok(model)
    }

    /// Refresh a tracked record from the control plane
    pub async fn read(
        &self,
        ctx: &CallContext,
        state: &ApiKeyResourceModel,
    ) -> Result<ReadOutcome, ProvisionerError> {
        let key_id = state.key_id()?;
        let ctx = ctx.with_timeout(self.timeouts.read);

        match self.fetch(&ctx, "get API key", key_id).await {
            Ok(api_key) => {
                let mut model = state.clone();
                model.apply_remote(&api_key)?;
                Ok(ReadOutcome::Present(model))
            }
            Err(e) if e.is_not_found() => {
                warn!(key_id = %key_id, "API key not found, removing from state");
                transition(key_id, LifecyclePhase::Present, LifecyclePhase::Absent);
                Ok(ReadOutcome::Absent)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply in-place changes (display name, description, disabled).
    ///
    /// Replace-only fields are sent as they are; changing them is the
    /// caller's job (destroy and create).
    pub async fn update(
        &self,
        ctx: &CallContext,
        plan: &ApiKeyResourceModel,
    ) -> Result<ApiKeyResourceModel, ProvisionerError> {
        let key_id = plan.key_id()?;
        let spec = plan.to_spec()?;
        let ctx = ctx.with_timeout(self.timeouts.update);

        let current = self
            .fetch(&ctx, "get current API key status", key_id)
            .await?;

        let request = UpdateApiKeyRequest {
            spec,
            resource_version: current.resource_version,
            async_operation_id: new_idempotency_token(),
        };
        info!(
            key_id = %key_id,
            resource_version = %request.resource_version,
            operation_id = %request.async_operation_id,
            "Updating API key"
        );

        let response = ctx
            .run("update API key", async {
                self.client
                    .update_api_key(key_id, request)
                    .await
                    .map_err(|e| ProvisionerError::remote("update API key", e))
            })
            .await?;

        self.waiter
            .await_operation(&ctx, "update API key", response.async_operation)
            .await?;

        let api_key = self.fetch(&ctx, "get API key after update", key_id).await?;

        let mut model = plan.clone();
        model.apply_remote(&api_key)?;
        info!(key_id = %key_id, "✅ API key updated");
        Ok(model)
    }

    /// Delete the remote key. Already-absent keys count as deleted.
    pub async fn delete(
        &self,
        ctx: &CallContext,
        state: &ApiKeyResourceModel,
    ) -> Result<(), ProvisionerError> {
        let key_id = state.key_id()?;
        let timeout = state.timeouts.delete_or(self.timeouts.delete)?;
        let ctx = ctx.with_timeout(timeout);

        let current = match self.fetch(&ctx, "get current API key status", key_id).await {
            Ok(api_key) => api_key,
            Err(e) if e.is_not_found() => {
                warn!(key_id = %key_id, "API key not found, nothing to delete");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let request = DeleteApiKeyRequest {
            resource_version: current.resource_version,
            async_operation_id: new_idempotency_token(),
        };
        info!(
            key_id = %key_id,
            operation_id = %request.async_operation_id,
            "🗑️  Deleting API key"
        );

        let response = match ctx
            .run("delete API key", async {
                self.client
                    .delete_api_key(key_id, request)
                    .await
                    .map_err(|e| ProvisionerError::remote("delete API key", e))
            })
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                warn!(key_id = %key_id, "API key disappeared before delete, nothing to do");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        transition(key_id, LifecyclePhase::Present, LifecyclePhase::Deleting);

        self.waiter
            .await_operation(&ctx, "delete API key", response.async_operation)
            .await?;

        transition(key_id, LifecyclePhase::Deleting, LifecyclePhase::Absent);
        info!(key_id = %key_id, "✅ API key deleted");
        Ok(())
    }
}
