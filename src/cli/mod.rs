use clap::{Args, Parser, Subcommand};

use crate::apikey::{ApiKeyResourceModel, OwnerType};

#[derive(Parser)]
#[command(name = "apikey-provisioner")]
#[command(about = "Declarative provisioning of cloud API keys")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand; they override the config file
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, env = "APIKEY_CONFIG", global = true)]
    pub config: Option<String>,

    /// Cloud API endpoint
    #[arg(long, env = "APIKEY_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// API backend: "http" or "memory"
    #[arg(long, env = "APIKEY_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Path of the local state file
    #[arg(long, env = "APIKEY_STATE_PATH", global = true)]
    pub state_path: Option<String>,

    /// Log level
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update the API key tracked under a name
    Apply(ApplyArgs),
    /// Refresh and print a tracked API key
    Show(ShowArgs),
    /// Delete a tracked API key
    Destroy(DestroyArgs),
    /// List tracked API key names
    List,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Local name of the key (like "ci", "laptop", etc.)
    pub name: String,

    /// Owner type: "user" or "service-account"
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(OwnerType::ALL.map(|t| t.as_local())))]
    pub owner_type: String,

    /// Id of the owning user or service account
    #[arg(long)]
    pub owner_id: String,

    #[arg(long)]
    pub display_name: String,

    /// Expiry time (RFC 3339, e.g. 2030-01-01T00:00:00Z)
    #[arg(long)]
    pub expiry_time: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Create the key disabled
    #[arg(long)]
    pub disabled: bool,

    /// Create timeout override (e.g. "10m")
    #[arg(long)]
    pub create_timeout: Option<String>,

    /// Delete timeout override, also used when the key is replaced
    #[arg(long)]
    pub delete_timeout: Option<String>,
}

impl ApplyArgs {
    /// Desired record described by the arguments
    pub fn to_model(&self) -> ApiKeyResourceModel {
        let mut model = ApiKeyResourceModel::new(
            self.owner_type.clone(),
            self.owner_id.clone(),
            self.display_name.clone(),
            self.expiry_time.clone(),
        )
        .with_disabled(self.disabled);
        model.description = self.description.clone();
        model.timeouts.create = self.create_timeout.clone();
        model.timeouts.delete = self.delete_timeout.clone();
        model
    }
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    pub name: String,

    /// Print the secret token instead of redacting it
    #[arg(long)]
    pub reveal_token: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DestroyArgs {
    pub name: String,

    /// Confirm deletion
    #[arg(long)]
    pub confirm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "apikey-provisioner",
            "--backend",
            "memory",
            "apply",
            "ci",
            "--owner-type",
            "service-account",
            "--owner-id",
            "sa-1",
            "--display-name",
            "ci-key",
            "--expiry-time",
            "2030-01-01T00:00:00Z",
            "--disabled",
            "--create-timeout",
            "10m",
        ])
        .unwrap();

        assert_eq!(cli.global.backend.as_deref(), Some("memory"));
        let Commands::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        let model = args.to_model();
        assert_eq!(model.owner_type, "service-account");
        assert_eq!(model.disabled, Some(true));
        assert_eq!(model.description, None);
        assert_eq!(model.timeouts.create.as_deref(), Some("10m"));
        assert!(model.id.is_none());
    }

    #[test]
    fn test_rejects_unknown_owner_type() {
        let result = Cli::try_parse_from([
            "apikey-provisioner",
            "apply",
            "ci",
            "--owner-type",
            "robot",
            "--owner-id",
            "sa-1",
            "--display-name",
            "ci-key",
            "--expiry-time",
            "2030-01-01T00:00:00Z",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "apikey-provisioner",
            "destroy",
            "ci",
            "--confirm",
            "--state-path",
            "/tmp/keys.json",
        ])
        .unwrap();

        assert_eq!(cli.global.state_path.as_deref(), Some("/tmp/keys.json"));
        assert!(matches!(cli.command, Commands::Destroy(DestroyArgs { confirm: true, .. })));
    }
}
