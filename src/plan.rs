use std::fmt;

use crate::apikey::model::{parse_timestamp, ApiKeyResourceModel};

/// What has to happen to bring a tracked key in line with the desired record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create,
    /// In-place change of the listed mutable fields
    Update { fields: Vec<&'static str> },
    /// Destroy then create, because of the listed replace-only fields
    Replace { fields: Vec<&'static str> },
    NoOp,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Create => write!(f, "create"),
            PlannedAction::Update { fields } => write!(f, "update ({})", fields.join(", ")),
            PlannedAction::Replace { fields } => write!(f, "replace ({})", fields.join(", ")),
            PlannedAction::NoOp => write!(f, "no changes"),
        }
    }
}

/// Compare timestamps by instant when both parse, textually otherwise
fn same_instant(a: &str, b: &str) -> bool {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn plan(prior: Option<&ApiKeyResourceModel>, desired: &ApiKeyResourceModel) -> PlannedAction {
    let Some(prior) = prior else {
        return PlannedAction::Create;
    };

    let mut replace = Vec::new();
    if prior.owner_type != desired.owner_type {
        replace.push("owner_type");
    }
    if prior.owner_id != desired.owner_id {
        replace.push("owner_id");
    }
    if !same_instant(&prior.expiry_time, &desired.expiry_time) {
        replace.push("expiry_time");
    }
    if !replace.is_empty() {
        return PlannedAction::Replace { fields: replace };
    }

    let mut update = Vec::new();
    if prior.display_name != desired.display_name {
        update.push("display_name");
    }
    if prior.description.as_deref().unwrap_or_default()
        != desired.description.as_deref().unwrap_or_default()
    {
        update.push("description");
    }
    if prior.is_disabled() != desired.is_disabled() {
        update.push("disabled");
    }

    if update.is_empty() {
        PlannedAction::NoOp
    } else {
        PlannedAction::Update { fields: update }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked() -> ApiKeyResourceModel {
        let mut model =
            ApiKeyResourceModel::new("service-account", "sa-1", "ci-key", "2030-01-01T00:00:00Z");
        model.id = Some("key-1".to_string());
        model.state = Some("active".to_string());
        model.disabled = Some(false);
        model
    }

    fn desired() -> ApiKeyResourceModel {
        ApiKeyResourceModel::new("service-account", "sa-1", "ci-key", "2030-01-01T00:00:00Z")
    }

    #[test]
    fn test_nothing_tracked_means_create() {
        assert_eq!(plan(None, &desired()), PlannedAction::Create);
    }

    #[test]
    fn test_identical_is_noop() {
        assert_eq!(plan(Some(&tracked()), &desired()), PlannedAction::NoOp);
    }

    #[test]
    fn test_equivalent_timestamp_is_noop() {
        let mut wanted = desired();
        wanted.expiry_time = "2030-01-01T01:00:00+01:00".to_string();
        assert_eq!(plan(Some(&tracked()), &wanted), PlannedAction::NoOp);
    }

    #[test]
    fn test_replace_only_fields_force_replacement() {
        let mut wanted = desired();
        wanted.owner_id = "sa-2".to_string();
        wanted.expiry_time = "2031-01-01T00:00:00Z".to_string();
        wanted.display_name = "other".to_string();

        assert_eq!(
            plan(Some(&tracked()), &wanted),
            PlannedAction::Replace {
                fields: vec!["owner_id", "expiry_time"]
            }
        );
    }

    #[test]
    fn test_mutable_fields_update_in_place() {
        let mut wanted = desired();
        wanted.display_name = "renamed".to_string();
        wanted.disabled = Some(true);

        assert_eq!(
            plan(Some(&tracked()), &wanted),
            PlannedAction::Update {
                fields: vec!["display_name", "disabled"]
            }
        );
    }

    #[test]
    fn test_empty_description_equals_unset() {
        let mut wanted = desired();
        wanted.description = Some(String::new());
        assert_eq!(plan(Some(&tracked()), &wanted), PlannedAction::NoOp);
    }

    #[test]
    fn test_display() {
        let action = PlannedAction::Update {
            fields: vec!["display_name", "description"],
        };
        assert_eq!(action.to_string(), "update (display_name, description)");
    }
}
