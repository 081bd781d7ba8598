use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::apikey::enums::{OwnerType, ResourceState};
use crate::cloud::types::*;
use crate::cloud::CloudService;
use crate::errors::{RemoteError, RemoteErrorCode};

/// How async operations registered by the in-memory control plane progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationBehavior {
    /// Fulfilled on the n-th poll; `0` returns an already fulfilled operation
    CompleteAfter(u32),
    /// Failed on the n-th poll
    FailAfter(u32),
    /// Cancelled on the n-th poll
    CancelAfter(u32),
    /// Stays in progress forever
    Stall,
}

impl Default for OperationBehavior {
    fn default() -> Self {
        OperationBehavior::CompleteAfter(1)
    }
}

#[derive(Debug, Clone)]
enum Effect {
    Create { key_id: String },
    Update { key_id: String, spec: ApiKeySpec },
    Delete { key_id: String },
}

#[derive(Debug)]
struct OperationRecord {
    operation: AsyncOperation,
    polls_remaining: Option<u32>,
    outcome: OperationState,
    effect: Effect,
}

#[derive(Debug, Default)]
struct Inner {
    keys: HashMap<String, ApiKey>,
    operations: HashMap<String, OperationRecord>,
    /// Create responses by idempotency token
    created: HashMap<String, CreateApiKeyResponse>,
    behavior: OperationBehavior,
    next_version: u64,
    polls: usize,
}

impl Inner {
    fn next_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }

    fn register(&mut self, id: &str, operation_type: &str, effect: Effect) -> AsyncOperation {
        let (polls_remaining, outcome) = match self.behavior {
            OperationBehavior::CompleteAfter(n) => (Some(n), OperationState::Fulfilled),
            OperationBehavior::FailAfter(n) => (Some(n), OperationState::Failed),
            OperationBehavior::CancelAfter(n) => (Some(n), OperationState::Cancelled),
            OperationBehavior::Stall => (None, OperationState::InProgress),
        };

        let mut record = OperationRecord {
            operation: AsyncOperation {
                id: id.to_string(),
                state: OperationState::Pending,
                operation_type: operation_type.to_string(),
                failure_reason: String::new(),
                started_time: Some(Utc::now()),
                finished_time: None,
            },
            polls_remaining,
            outcome,
            effect,
        };

        if polls_remaining == Some(0) {
            let version = self.next_version();
            settle(&mut self.keys, &mut record, version);
        }

        let operation = record.operation.clone();
        self.operations.insert(id.to_string(), record);
        operation
    }

    fn poll(&mut self, id: &str) -> Option<AsyncOperation> {
        self.polls += 1;
        let version = self.next_version();
        let Inner {
            keys, operations, ..
        } = self;

        let record = operations.get_mut(id)?;
        if !record.operation.state.is_terminal() {
            match record.polls_remaining {
                None => record.operation.state = OperationState::InProgress,
                Some(n) if n <= 1 => settle(keys, record, version),
                Some(n) => {
                    record.polls_remaining = Some(n - 1);
                    record.operation.state = OperationState::InProgress;
                }
            }
        }
        Some(record.operation.clone())
    }

    fn key_mut(&mut self, key_id: &str) -> Result<&mut ApiKey, RemoteError> {
        self.keys
            .get_mut(key_id)
            .ok_or_else(|| RemoteError::not_found(format!("api key {key_id} not found")))
    }
}

/// Move an operation to its terminal state and apply its effect on the keys
fn settle(keys: &mut HashMap<String, ApiKey>, record: &mut OperationRecord, version: String) {
    record.operation.state = record.outcome;
    record.operation.finished_time = Some(Utc::now());
    if record.outcome != OperationState::Fulfilled {
        record.operation.failure_reason = format!("operation {}", record.outcome);
    }

    let fulfilled = record.outcome == OperationState::Fulfilled;
    match &record.effect {
        Effect::Delete { key_id } if fulfilled => {
            keys.remove(key_id);
        }
        effect => {
            let key_id = match effect {
                Effect::Create { key_id } | Effect::Update { key_id, .. } | Effect::Delete { key_id } => key_id,
            };
            let Some(key) = keys.get_mut(key_id) else {
                return;
            };
            let state = match (effect, fulfilled) {
                (Effect::Update { spec, .. }, true) => {
                    key.spec = spec.clone();
                    ResourceState::Active
                }
                (_, true) => ResourceState::Active,
                (Effect::Create { .. }, false) => ResourceState::ActivationFailed,
                (Effect::Update { .. }, false) => ResourceState::UpdateFailed,
                (Effect::Delete { .. }, false) => ResourceState::DeleteFailed,
            };
            key.state = state.as_wire().to_string();
            key.resource_version = version;
            key.last_modified_time = Some(Utc::now());
        }
    }
}

/// In-process control plane.
///
/// Honours idempotency tokens, rejects stale resource versions and never
/// returns a token outside the create response. Used as the `memory` backend
/// and as the test double for the controller.
#[derive(Debug, Default)]
pub struct InMemoryCloudService {
    inner: Mutex<Inner>,
}

impl InMemoryCloudService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: OperationBehavior) -> Self {
        Self {
            inner: Mutex::new(Inner {
                behavior,
                ..Inner::default()
            }),
        }
    }

    /// Change how operations registered from now on progress
    pub async fn set_behavior(&self, behavior: OperationBehavior) {
        self.inner.lock().await.behavior = behavior;
    }

    pub async fn key_count(&self) -> usize {
        self.inner.lock().await.keys.len()
    }

    /// Number of `get_async_operation` calls served
    pub async fn poll_count(&self) -> usize {
        self.inner.lock().await.polls
    }

    /// Remove a key behind the caller's back
    pub async fn remove_key(&self, key_id: &str) -> bool {
        self.inner.lock().await.keys.remove(key_id).is_some()
    }

    fn validate_spec(spec: &ApiKeySpec) -> Result<(), RemoteError> {
        OwnerType::from_wire(&spec.owner_type)
            .map_err(|e| RemoteError::new(RemoteErrorCode::InvalidArgument, e.to_string()))?;
        if spec.owner_id.is_empty() {
            return Err(RemoteError::new(
                RemoteErrorCode::InvalidArgument,
                "owner id is required",
            ));
        }
        if spec.display_name.is_empty() {
            return Err(RemoteError::new(
                RemoteErrorCode::InvalidArgument,
                "display name is required",
            ));
        }
        Ok(())
    }

    fn check_version(key: &ApiKey, resource_version: &str) -> Result<(), RemoteError> {
        if key.resource_version != resource_version {
            return Err(RemoteError::conflict(format!(
                "resource version mismatch for api key {}: expected {}, got {}",
                key.id, key.resource_version, resource_version
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CloudService for InMemoryCloudService {
    async fn create_api_key(
        &self,
        request: CreateApiKeyRequest,
    ) -> Result<CreateApiKeyResponse, RemoteError> {
        let mut inner = self.inner.lock().await;

        if let Some(previous) = inner.created.get(&request.async_operation_id) {
            debug!(operation_id = %request.async_operation_id, "Replaying create for known idempotency token");
            let mut response = previous.clone();
            response.async_operation = inner
                .operations
                .get(&request.async_operation_id)
                .map(|record| record.operation.clone());
            return Ok(response);
        }

        Self::validate_spec(&request.spec)?;

        let key_id = format!("key-{}", Uuid::new_v4().simple());
        let token = format!("tck_{}", Uuid::new_v4().simple());
        let version = inner.next_version();
        let now = Utc::now();

        inner.keys.insert(
            key_id.clone(),
            ApiKey {
                id: key_id.clone(),
                resource_version: version,
                spec: request.spec,
                state: ResourceState::Activating.as_wire().to_string(),
                async_operation_id: request.async_operation_id.clone(),
                created_time: Some(now),
                last_modified_time: Some(now),
            },
        );

        let operation = inner.register(
            &request.async_operation_id,
            "create-api-key",
            Effect::Create {
                key_id: key_id.clone(),
            },
        );

        let response = CreateApiKeyResponse {
            key_id,
            token,
            async_operation: Some(operation),
        };
        inner
            .created
            .insert(request.async_operation_id, response.clone());
        Ok(response)
    }

    async fn get_api_key(&self, key_id: &str) -> Result<ApiKey, RemoteError> {
        let inner = self.inner.lock().await;
        inner
            .keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("api key {key_id} not found")))
    }

    async fn update_api_key(
        &self,
        key_id: &str,
        request: UpdateApiKeyRequest,
    ) -> Result<UpdateApiKeyResponse, RemoteError> {
        let mut inner = self.inner.lock().await;

        if let Some(record) = inner.operations.get(&request.async_operation_id) {
            return Ok(UpdateApiKeyResponse {
                async_operation: Some(record.operation.clone()),
            });
        }

        Self::validate_spec(&request.spec)?;
        let version = inner.next_version();
        let key = inner.key_mut(key_id)?;
        Self::check_version(key, &request.resource_version)?;
        if key.spec.owner_id != request.spec.owner_id
            || key.spec.owner_type != request.spec.owner_type
        {
            return Err(RemoteError::new(
                RemoteErrorCode::InvalidArgument,
                "owner of an api key cannot be changed",
            ));
        }

        key.state = ResourceState::Updating.as_wire().to_string();
        key.resource_version = version;
        key.async_operation_id = request.async_operation_id.clone();

        let operation = inner.register(
            &request.async_operation_id,
            "update-api-key",
            Effect::Update {
                key_id: key_id.to_string(),
                spec: request.spec,
            },
        );

        Ok(UpdateApiKeyResponse {
            async_operation: Some(operation),
        })
    }

    async fn delete_api_key(
        &self,
        key_id: &str,
        request: DeleteApiKeyRequest,
    ) -> Result<DeleteApiKeyResponse, RemoteError> {
        let mut inner = self.inner.lock().await;

        if let Some(record) = inner.operations.get(&request.async_operation_id) {
            return Ok(DeleteApiKeyResponse {
                async_operation: Some(record.operation.clone()),
            });
        }

        let version = inner.next_version();
        let key = inner.key_mut(key_id)?;
        Self::check_version(key, &request.resource_version)?;

        key.state = ResourceState::Deleting.as_wire().to_string();
        key.resource_version = version;
        key.async_operation_id = request.async_operation_id.clone();

        let operation = inner.register(
            &request.async_operation_id,
            "delete-api-key",
            Effect::Delete {
                key_id: key_id.to_string(),
            },
        );

        Ok(DeleteApiKeyResponse {
            async_operation: Some(operation),
        })
    }

    async fn get_async_operation(&self, operation_id: &str) -> Result<AsyncOperation, RemoteError> {
        let mut inner = self.inner.lock().await;
        inner
            .poll(operation_id)
            .ok_or_else(|| RemoteError::not_found(format!("operation {operation_id} not found")))
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}
