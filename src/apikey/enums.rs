//! Translation tables between local record values and control plane wire values.
//!
//! Both directions are exhaustive matches over closed sets; anything outside
//! the table, `*_UNSPECIFIED` included, is rejected instead of defaulted.

use std::fmt;

use crate::errors::ProvisionerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerType {
    User,
    ServiceAccount,
}

impl OwnerType {
    pub const ALL: [OwnerType; 2] = [OwnerType::User, OwnerType::ServiceAccount];

    pub fn as_local(&self) -> &'static str {
        match self {
            OwnerType::User => "user",
            OwnerType::ServiceAccount => "service-account",
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            OwnerType::User => "OWNER_TYPE_USER",
            OwnerType::ServiceAccount => "OWNER_TYPE_SERVICE_ACCOUNT",
        }
    }

    pub fn from_local(value: &str) -> Result<Self, ProvisionerError> {
        match value {
            "user" => Ok(OwnerType::User),
            "service-account" => Ok(OwnerType::ServiceAccount),
            other => Err(ProvisionerError::UnknownEnumValue {
                kind: "owner type",
                value: other.to_string(),
            }),
        }
    }

    pub fn from_wire(value: &str) -> Result<Self, ProvisionerError> {
        match value {
            "OWNER_TYPE_USER" => Ok(OwnerType::User),
            "OWNER_TYPE_SERVICE_ACCOUNT" => Ok(OwnerType::ServiceAccount),
            other => Err(ProvisionerError::UnknownEnumValue {
                kind: "owner type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_local())
    }
}

/// Lifecycle state of the remote API key object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Activating,
    ActivationFailed,
    Active,
    Updating,
    UpdateFailed,
    Deleting,
    DeleteFailed,
    Deleted,
    Suspended,
    Expired,
}

impl ResourceState {
    pub const ALL: [ResourceState; 10] = [
        ResourceState::Activating,
        ResourceState::ActivationFailed,
        ResourceState::Active,
        ResourceState::Updating,
        ResourceState::UpdateFailed,
        ResourceState::Deleting,
        ResourceState::DeleteFailed,
        ResourceState::Deleted,
        ResourceState::Suspended,
        ResourceState::Expired,
    ];

    pub fn as_local(&self) -> &'static str {
        match self {
            ResourceState::Activating => "activating",
            ResourceState::ActivationFailed => "activation-failed",
            ResourceState::Active => "active",
            ResourceState::Updating => "updating",
            ResourceState::UpdateFailed => "update-failed",
            ResourceState::Deleting => "deleting",
            ResourceState::DeleteFailed => "delete-failed",
            ResourceState::Deleted => "deleted",
            ResourceState::Suspended => "suspended",
            ResourceState::Expired => "expired",
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            ResourceState::Activating => "RESOURCE_STATE_ACTIVATING",
            ResourceState::ActivationFailed => "RESOURCE_STATE_ACTIVATION_FAILED",
            ResourceState::Active => "RESOURCE_STATE_ACTIVE",
            ResourceState::Updating => "RESOURCE_STATE_UPDATING",
            ResourceState::UpdateFailed => "RESOURCE_STATE_UPDATE_FAILED",
            ResourceState::Deleting => "RESOURCE_STATE_DELETING",
            ResourceState::DeleteFailed => "RESOURCE_STATE_DELETE_FAILED",
            ResourceState::Deleted => "RESOURCE_STATE_DELETED",
            ResourceState::Suspended => "RESOURCE_STATE_SUSPENDED",
            ResourceState::Expired => "RESOURCE_STATE_EXPIRED",
        }
    }

    pub fn from_local(value: &str) -> Result<Self, ProvisionerError> {
        match value {
            "activating" => Ok(ResourceState::Activating),
            "activation-failed" => Ok(ResourceState::ActivationFailed),
            "active" => Ok(ResourceState::Active),
            "updating" => Ok(ResourceState::Updating),
            "update-failed" => Ok(ResourceState::UpdateFailed),
            "deleting" => Ok(ResourceState::Deleting),
            "delete-failed" => Ok(ResourceState::DeleteFailed),
            "deleted" => Ok(ResourceState::Deleted),
            "suspended" => Ok(ResourceState::Suspended),
            "expired" => Ok(ResourceState::Expired),
            other => Err(ProvisionerError::UnknownEnumValue {
                kind: "resource state",
                value: other.to_string(),
            }),
        }
    }

    pub fn from_wire(value: &str) -> Result<Self, ProvisionerError> {
        match value {
            "RESOURCE_STATE_ACTIVATING" => Ok(ResourceState::Activating),
            "RESOURCE_STATE_ACTIVATION_FAILED" => Ok(ResourceState::ActivationFailed),
            "RESOURCE_STATE_ACTIVE" => Ok(ResourceState::Active),
            "RESOURCE_STATE_UPDATING" => Ok(ResourceState::Updating),
            "RESOURCE_STATE_UPDATE_FAILED" => Ok(ResourceState::UpdateFailed),
            "RESOURCE_STATE_DELETING" => Ok(ResourceState::Deleting),
            "RESOURCE_STATE_DELETE_FAILED" => Ok(ResourceState::DeleteFailed),
            "RESOURCE_STATE_DELETED" => Ok(ResourceState::Deleted),
            "RESOURCE_STATE_SUSPENDED" => Ok(ResourceState::Suspended),
            "RESOURCE_STATE_EXPIRED" => Ok(ResourceState::Expired),
            other => Err(ProvisionerError::UnknownEnumValue {
                kind: "resource state",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_owner_type_round_trips_both_directions() {
        for owner in OwnerType::ALL {
            assert_eq!(OwnerType::from_wire(owner.as_wire()).unwrap(), owner);
            assert_eq!(OwnerType::from_local(owner.as_local()).unwrap(), owner);
        }
    }

    #[test]
    fn test_resource_state_round_trips_both_directions() {
        for state in ResourceState::ALL {
            assert_eq!(ResourceState::from_wire(state.as_wire()).unwrap(), state);
            assert_eq!(ResourceState::from_local(state.as_local()).unwrap(), state);
        }
    }

    #[test]
    fn test_tables_are_injective() {
        let wire: HashSet<_> = ResourceState::ALL.iter().map(|s| s.as_wire()).collect();
        let local: HashSet<_> = ResourceState::ALL.iter().map(|s| s.as_local()).collect();
        assert_eq!(wire.len(), ResourceState::ALL.len());
        assert_eq!(local.len(), ResourceState::ALL.len());

        let wire: HashSet<_> = OwnerType::ALL.iter().map(|o| o.as_wire()).collect();
        assert_eq!(wire.len(), OwnerType::ALL.len());
    }

    #[test]
    fn test_unspecified_values_are_errors() {
        assert!(OwnerType::from_wire("OWNER_TYPE_UNSPECIFIED").is_err());
        assert!(ResourceState::from_wire("RESOURCE_STATE_UNSPECIFIED").is_err());
    }

    #[test]
    fn test_unknown_values_are_errors() {
        let err = OwnerType::from_local("robot").unwrap_err();
        assert_eq!(err.to_string(), "Unknown owner type value: 'robot'");

        assert!(OwnerType::from_local("SERVICE-ACCOUNT").is_err());
        assert!(ResourceState::from_local("ACTIVE").is_err());
        assert!(ResourceState::from_wire("active").is_err());
    }
}
