use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::apikey::enums::{OwnerType, ResourceState};
use crate::cloud::types::{ApiKey, ApiKeySpec};
use crate::constants::timeouts;
use crate::errors::ProvisionerError;
use crate::utils::SecretToken;

/// Per-record overrides of the lifecycle timeouts (`"10m"`, `"90s"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTimeouts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

impl ResourceTimeouts {
    pub fn create_or(&self, default: Duration) -> Result<Duration, ProvisionerError> {
        parse_timeout("timeouts.create", self.create.as_deref(), default)
    }

    pub fn delete_or(&self, default: Duration) -> Result<Duration, ProvisionerError> {
        parse_timeout("timeouts.delete", self.delete.as_deref(), default)
    }
}

fn parse_timeout(
    field: &'static str,
    value: Option<&str>,
    default: Duration,
) -> Result<Duration, ProvisionerError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    let timeout = humantime::parse_duration(raw)
        .map_err(|e| ProvisionerError::validation(field, format!("'{raw}': {e}")))?;
    if timeout.is_zero() || timeout > timeouts::MAX {
        return Err(ProvisionerError::validation(
            field,
            format!(
                "'{raw}' is out of range (must be above zero and at most {})",
                humantime::format_duration(timeouts::MAX)
            ),
        ));
    }
    Ok(timeout)
}

/// Declarative record of one API key, as tracked locally
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyResourceModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Replace-only
    pub owner_type: String,
    /// Replace-only
    pub owner_id: String,
    pub display_name: String,
    /// Only ever populated from the create response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// RFC 3339, replace-only
    pub expiry_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default)]
    pub timeouts: ResourceTimeouts,
}

impl ApiKeyResourceModel {
    pub fn new(
        owner_type: impl Into<String>,
        owner_id: impl Into<String>,
        display_name: impl Into<String>,
        expiry_time: impl Into<String>,
    ) -> Self {
        Self {
            owner_type: owner_type.into(),
            owner_id: owner_id.into(),
            display_name: display_name.into(),
            expiry_time: expiry_time.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Identifier of the tracked remote object
    pub fn key_id(&self) -> Result<&str, ProvisionerError> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProvisionerError::State("API key record has no id".to_string()))
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    pub fn parse_expiry_time(&self) -> Result<DateTime<Utc>, ProvisionerError> {
        parse_timestamp(&self.expiry_time)
    }

    /// Validate the record and translate it into the outbound spec.
    ///
    /// An empty description and `disabled = false` are treated as unset.
    pub fn to_spec(&self) -> Result<ApiKeySpec, ProvisionerError> {
        if self.display_name.trim().is_empty() {
            return Err(ProvisionerError::validation(
                "display_name",
                "display name must be provided",
            ));
        }
        if self.owner_id.trim().is_empty() {
            return Err(ProvisionerError::validation(
                "owner_id",
                "owner id must be provided",
            ));
        }

        let expiry_time = self.parse_expiry_time()?;
        let owner_type = OwnerType::from_local(&self.owner_type)?;

        Ok(ApiKeySpec {
            owner_id: self.owner_id.clone(),
            owner_type: owner_type.as_wire().to_string(),
            display_name: self.display_name.clone(),
            description: self.description.clone().unwrap_or_default(),
            expiry_time,
            disabled: self.is_disabled(),
        })
    }

    /// Overwrite the record with the canonical remote object.
    ///
    /// Leaves `token` and `timeouts` alone. The description is only set when
    /// the remote value is non-empty. On error the record is unchanged.
    pub fn apply_remote(&mut self, api_key: &ApiKey) -> Result<(), ProvisionerError> {
        let state = ResourceState::from_wire(&api_key.state)?;
        let owner_type = OwnerType::from_wire(&api_key.spec.owner_type)?;

        self.id = Some(api_key.id.clone());
        self.state = Some(state.as_local().to_string());
        self.owner_id = api_key.spec.owner_id.clone();
        self.owner_type = owner_type.as_local().to_string();
        self.display_name = api_key.spec.display_name.clone();
        if !api_key.spec.description.is_empty() {
            self.description = Some(api_key.spec.description.clone());
        }
        self.expiry_time = format_timestamp(&api_key.spec.expiry_time);
        self.disabled = Some(api_key.spec.disabled);

        Ok(())
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ProvisionerError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            ProvisionerError::validation(
                "expiry_time",
                format!("could not parse '{value}' as an RFC 3339 timestamp: {e}"),
            )
        })
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
