use std::fmt;

use thiserror::Error;

/// Error classes reported by the cloud control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCode {
    NotFound,
    AlreadyExists,
    /// Stale resource version or otherwise conflicting concurrent change
    Conflict,
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    ResourceExhausted,
    Unavailable,
    Internal,
    /// The request never produced a response (connect, TLS, timeout)
    Transport,
    /// The response body could not be decoded
    Decode,
    Unknown,
}

impl RemoteErrorCode {
    /// Map an HTTP status code to an error class
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidArgument,
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 | 412 => Self::Conflict,
            429 => Self::ResourceExhausted,
            502..=504 => Self::Unavailable,
            500..=599 => Self::Internal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::Conflict => "conflict",
            Self::InvalidArgument => "invalid argument",
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission denied",
            Self::ResourceExhausted => "resource exhausted",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
            Self::Transport => "transport",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`CloudService`](crate::cloud::CloudService) call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteError {
    pub code: RemoteErrorCode,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::Conflict, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == RemoteErrorCode::NotFound
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::new(RemoteErrorCode::Decode, err.to_string())
        } else if let Some(status) = err.status() {
            RemoteError::new(RemoteErrorCode::from_http_status(status.as_u16()), err.to_string())
        } else {
            RemoteError::new(RemoteErrorCode::Transport, err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ProvisionerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Unknown {kind} value: '{value}'")]
    UnknownEnumValue { kind: &'static str, value: String },

    #[error("Failed to {operation}: {source}")]
    Remote {
        operation: &'static str,
        #[source]
        source: RemoteError,
    },

    #[error("Async operation {id} ended in state {state}: {reason}")]
    OperationFailed {
        id: String,
        state: String,
        reason: String,
    },

    #[error("Async operation {id} was cancelled")]
    OperationCanceled { id: String },

    #[error("No async operation returned by {0}")]
    MissingOperation(&'static str),

    #[error("Deadline exceeded while waiting to {0}")]
    DeadlineExceeded(String),

    #[error("Cancelled while waiting to {0}")]
    Cancelled(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProvisionerError {
    pub fn remote(operation: &'static str, source: RemoteError) -> Self {
        ProvisionerError::Remote { operation, source }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ProvisionerError::Validation {
            field,
            message: message.into(),
        }
    }

    /// True when the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisionerError::Remote { source, .. } if source.is_not_found())
    }

    /// True when the remote rejected a stale resource version
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ProvisionerError::Remote { source, .. } if source.code == RemoteErrorCode::Conflict
        )
    }
}

impl From<serde_json::Error> for ProvisionerError {
    fn from(err: serde_json::Error) -> Self {
        ProvisionerError::State(err.to_string())
    }
}

impl From<std::io::Error> for ProvisionerError {
    fn from(err: std::io::Error) -> Self {
        ProvisionerError::State(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(RemoteErrorCode::from_http_status(404), RemoteErrorCode::NotFound);
        assert_eq!(RemoteErrorCode::from_http_status(409), RemoteErrorCode::Conflict);
        assert_eq!(RemoteErrorCode::from_http_status(412), RemoteErrorCode::Conflict);
        assert_eq!(RemoteErrorCode::from_http_status(503), RemoteErrorCode::Unavailable);
        assert_eq!(RemoteErrorCode::from_http_status(500), RemoteErrorCode::Internal);
        assert_eq!(RemoteErrorCode::from_http_status(418), RemoteErrorCode::Unknown);
    }

    #[test]
    fn test_remote_error_carries_operation() {
        let err = ProvisionerError::remote("get API key", RemoteError::not_found("key abc"));
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "Failed to get API key: not found: key abc");
    }

    #[test]
    fn test_conflict_detection() {
        let err = ProvisionerError::remote("update API key", RemoteError::conflict("stale"));
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }
}
