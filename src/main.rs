use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use apikey_provisioner::{
    ApiKeyResource, ApiKeyResourceModel, ApplyArgs, CallContext, Cli, ClientFactory, Commands,
    Config, DestroyArgs, FileStateStore, MemoryStateStore, PlannedAction, Reconciler, ShowArgs,
    StateStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.global)?;

    // Initialize logging; stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Validate configuration
    config.validate()?;

    info!("apikey-provisioner v{}", env!("CARGO_PKG_VERSION"));
    info!("📊 Configuration loaded:");
    info!("  API backend: {}", config.api.backend);
    if config.api.backend == "http" {
        info!("  Endpoint: {} (api version {})", config.api.endpoint, config.api.api_version);
    }

    let reconciler = build_reconciler(&config)?;

    // Ctrl-C aborts whatever call is in flight
    let cancel = CancellationToken::new();
    let ctx = CallContext::with_cancellation(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️  Interrupted, cancelling in-flight operation");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Apply(args) => apply(&reconciler, &ctx, args).await,
        Commands::Show(args) => show(&reconciler, &ctx, args).await,
        Commands::Destroy(args) => destroy(&reconciler, &ctx, args).await,
        Commands::List => list(&reconciler).await,
    }
}

fn build_reconciler(config: &Config) -> Result<Reconciler> {
    let client = ClientFactory::create(&config.api)?;
    let resource = ApiKeyResource::new(
        client,
        config.poll_config()?,
        config.lifecycle_timeouts()?,
    );

    // Keys created against the in-memory backend die with the process
    let store: Arc<dyn StateStore> = if config.api.backend == "memory" {
        Arc::new(MemoryStateStore::new())
    } else {
        info!("  State file: {}", config.state.path);
        Arc::new(FileStateStore::new(&config.state.path))
    };

    Ok(Reconciler::new(resource, store))
}

async fn apply(reconciler: &Reconciler, ctx: &CallContext, args: ApplyArgs) -> Result<()> {
    let desired = args.to_model();
    let outcome = reconciler.apply(ctx, &args.name, &desired).await?;

    info!("✅ '{}': {}", args.name, outcome.action);
    if outcome.record.token.is_some() && outcome.action != PlannedAction::NoOp {
        info!("🔑 Token stored in state; use 'show {} --reveal-token' to read it", args.name);
    }
    print_record(&outcome.record, false)
}

async fn show(reconciler: &Reconciler, ctx: &CallContext, args: ShowArgs) -> Result<()> {
    let Some(record) = reconciler.refresh(ctx, &args.name).await? else {
        bail!(
            "No API key tracked as '{}' (never applied, or deleted remotely)",
            args.name
        );
    };

    if args.reveal_token {
        warn!("⚠️  Printing secret token to stdout");
    }
    print_record(&record, args.reveal_token)
}

async fn destroy(reconciler: &Reconciler, ctx: &CallContext, args: DestroyArgs) -> Result<()> {
    if !args.confirm {
        bail!("Refusing to destroy '{}' without --confirm", args.name);
    }

    if reconciler.destroy(ctx, &args.name).await? {
        info!("✅ API key '{}' destroyed", args.name);
    } else {
        info!("Nothing tracked as '{}'", args.name);
    }
    Ok(())
}

async fn list(reconciler: &Reconciler) -> Result<()> {
    let names = reconciler.list().await?;
    if names.is_empty() {
        info!("📂 No API keys tracked in {} state", reconciler.store().store_type());
        return Ok(());
    }

    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn print_record(record: &ApiKeyResourceModel, reveal_token: bool) -> Result<()> {
    let mut value = serde_json::to_value(record)?;
    if !reveal_token {
        if let Some(token) = value.get_mut("token") {
            *token = serde_json::Value::String("[REDACTED]".to_string());
        }
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
