pub mod apikey;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod operation;
pub mod plan;
pub mod reconciler;
pub mod state;
pub mod utils;

pub use apikey::{ApiKeyResource, ApiKeyResourceModel, ReadOutcome};
pub use cloud::{ClientFactory, CloudService};
pub use config::Config;
pub use context::CallContext;
pub use errors::ProvisionerError;
pub use operation::{OperationWaiter, PollConfig};
pub use plan::PlannedAction;
pub use reconciler::{ApplyOutcome, Reconciler};
pub use state::{FileStateStore, MemoryStateStore, StateStore};

// Re-export CLI types for main.rs
pub use cli::*;
