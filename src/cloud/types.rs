use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Desired configuration of an API key as the control plane sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeySpec {
    pub owner_id: String,
    /// Wire form, e.g. `OWNER_TYPE_SERVICE_ACCOUNT`
    pub owner_type: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub expiry_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

/// Canonical API key object returned by `GET /cloud/api-keys/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub resource_version: String,
    pub spec: ApiKeySpec,
    /// Wire form, e.g. `RESOURCE_STATE_ACTIVE`
    pub state: String,
    #[serde(default)]
    pub async_operation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

/// Status of a long-running server side operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    #[serde(rename = "STATE_PENDING", alias = "pending")]
    Pending,
    #[serde(rename = "STATE_IN_PROGRESS", alias = "in_progress")]
    InProgress,
    #[serde(rename = "STATE_FULFILLED", alias = "fulfilled")]
    Fulfilled,
    #[serde(rename = "STATE_FAILED", alias = "failed")]
    Failed,
    #[serde(rename = "STATE_CANCELLED", alias = "cancelled")]
    Cancelled,
    #[serde(rename = "STATE_REJECTED", alias = "rejected")]
    Rejected,
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationState::Pending | OperationState::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Pending => "pending",
            OperationState::InProgress => "in_progress",
            OperationState::Fulfilled => "fulfilled",
            OperationState::Failed => "failed",
            OperationState::Cancelled => "cancelled",
            OperationState::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncOperation {
    /// Equal to the idempotency token the caller supplied
    pub id: String,
    pub state: OperationState,
    #[serde(default)]
    pub operation_type: String,
    #[serde(default)]
    pub failure_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    pub spec: ApiKeySpec,
    pub async_operation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyResponse {
    pub key_id: String,
    /// Full secret; only ever present in this response
    pub token: String,
    #[serde(default)]
    pub async_operation: Option<AsyncOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetApiKeyResponse {
    pub api_key: ApiKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    pub spec: ApiKeySpec,
    pub resource_version: String,
    pub async_operation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyResponse {
    #[serde(default)]
    pub async_operation: Option<AsyncOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteApiKeyRequest {
    pub resource_version: String,
    pub async_operation_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteApiKeyResponse {
    #[serde(default)]
    pub async_operation: Option<AsyncOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAsyncOperationResponse {
    pub async_operation: AsyncOperation,
}
