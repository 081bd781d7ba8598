use std::sync::Arc;

use tracing::{info, warn};

use crate::apikey::{ApiKeyResource, ApiKeyResourceModel, ReadOutcome};
use crate::context::CallContext;
use crate::errors::ProvisionerError;
use crate::plan::{plan, PlannedAction};
use crate::state::StateStore;

/// What `apply` did and the record it left in the store
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub action: PlannedAction,
    pub record: ApiKeyResourceModel,
}

/// Drives the resource controller from locally tracked records.
///
/// The store is only written after the remote side has settled, so a failed
/// call never leaves a half-applied record behind.
pub struct Reconciler {
    resource: ApiKeyResource,
    store: Arc<dyn StateStore>,
}

impl Reconciler {
    pub fn new(resource: ApiKeyResource, store: Arc<dyn StateStore>) -> Self {
        Self { resource, store }
    }

    /// Bring the key tracked as `name` in line with `desired`
    pub async fn apply(
        &self,
        ctx: &CallContext,
        name: &str,
        desired: &ApiKeyResourceModel,
    ) -> Result<ApplyOutcome, ProvisionerError> {
        let prior = self.refresh(ctx, name).await?;
        let action = plan(prior.as_ref(), desired);
        info!(name = %name, action = %action, "Planned API key change");

        let record = match (&action, prior) {
            (PlannedAction::Create, _) => self.resource.create(ctx, desired).await?,
            (PlannedAction::NoOp, Some(mut prior)) => {
                prior.timeouts = desired.timeouts.clone();
                prior
            }
            (PlannedAction::Update { .. }, Some(prior)) => {
                let mut next = desired.clone();
                next.id = prior.id;
                next.state = prior.state;
                next.token = prior.token;
                self.resource.update(ctx, &next).await?
            }
            (PlannedAction::Replace { fields }, Some(prior)) => {
                info!(name = %name, fields = ?fields, "Replacing API key");
                let mut doomed = prior;
                doomed.timeouts = desired.timeouts.clone();
                self.resource.delete(ctx, &doomed).await?;
                // The old key is gone whatever happens next
                self.store.remove(name).await?;
                self.resource.create(ctx, desired).await?
            }
            (_, None) => {
                return Err(ProvisionerError::Internal(format!(
                    "planned '{action}' for '{name}' without a tracked record"
                )))
            }
        };

        self.store.put(name, &record).await?;
        Ok(ApplyOutcome { action, record })
    }

    /// Re-read the tracked record; a vanished remote key stops being tracked
    pub async fn refresh(
        &self,
        ctx: &CallContext,
        name: &str,
    ) -> Result<Option<ApiKeyResourceModel>, ProvisionerError> {
        let Some(tracked) = self.store.get(name).await? else {
            return Ok(None);
        };

        match self.resource.read(ctx, &tracked).await? {
            ReadOutcome::Present(record) => {
                if record != tracked {
                    self.store.put(name, &record).await?;
                }
                Ok(Some(record))
            }
            ReadOutcome::Absent => {
                warn!(name = %name, "Tracked API key no longer exists remotely");
                self.store.remove(name).await?;
                Ok(None)
            }
        }
    }

    /// Delete the remote key and forget it. Returns false when nothing was tracked.
    pub async fn destroy(&self, ctx: &CallContext, name: &str) -> Result<bool, ProvisionerError> {
        let Some(tracked) = self.store.get(name).await? else {
            warn!(name = %name, "No tracked API key with this name");
            return Ok(false);
        };

        self.resource.delete(ctx, &tracked).await?;
        self.store.remove(name).await?;
        info!(name = %name, "🗑️  Stopped tracking API key");
        Ok(true)
    }

    pub async fn list(&self) -> Result<Vec<String>, ProvisionerError> {
        self.store.list().await
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }
}
