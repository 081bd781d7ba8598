use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cloud::types::{AsyncOperation, OperationState};
use crate::cloud::CloudService;
use crate::constants::poll;
use crate::context::CallContext;
use crate::errors::ProvisionerError;

/// Backoff between polls of an async operation
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: poll::INITIAL_INTERVAL,
            max_interval: poll::MAX_INTERVAL,
            multiplier: poll::MULTIPLIER,
        }
    }
}

impl PollConfig {
    /// Constant interval, mostly useful in tests
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        // Overflowing or non-finite products saturate at the cap
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

/// Polls an async operation until it reaches a terminal state.
///
/// The deadline and cancellation of the supplied [`CallContext`] bound the
/// whole loop; nothing outside the waiter is mutated.
#[derive(Debug, Clone)]
pub struct OperationWaiter {
    client: Arc<dyn CloudService>,
    poll: PollConfig,
}

impl OperationWaiter {
    pub fn new(client: Arc<dyn CloudService>, poll: PollConfig) -> Self {
        Self { client, poll }
    }

    /// Wait for `operation` to be fulfilled.
    ///
    /// `what` names the lifecycle step ("create API key") and ends up in
    /// deadline and cancellation errors.
    pub async fn await_operation(
        &self,
        ctx: &CallContext,
        what: &'static str,
        operation: Option<AsyncOperation>,
    ) -> Result<AsyncOperation, ProvisionerError> {
        let mut operation = operation.ok_or(ProvisionerError::MissingOperation(what))?;
        let mut interval = self.poll.initial_interval;
        let mut polls = 0u32;

        loop {
            match operation.state {
                OperationState::Fulfilled => {
                    debug!(operation_id = %operation.id, polls, "Async operation fulfilled");
                    return Ok(operation);
                }
                OperationState::Failed | OperationState::Rejected => {
                    warn!(
                        operation_id = %operation.id,
                        state = %operation.state,
                        reason = %operation.failure_reason,
                        "Async operation failed"
                    );
                    let reason = if operation.failure_reason.is_empty() {
                        "no failure reason reported".to_string()
                    } else {
                        operation.failure_reason
                    };
                    return Err(ProvisionerError::OperationFailed {
                        id: operation.id,
                        state: operation.state.to_string(),
                        reason,
                    });
                }
                OperationState::Cancelled => {
                    warn!(operation_id = %operation.id, "Async operation cancelled");
                    return Err(ProvisionerError::OperationCanceled { id: operation.id });
                }
                OperationState::Pending | OperationState::InProgress => {}
            }

            debug!(
                operation_id = %operation.id,
                state = %operation.state,
                delay_ms = interval.as_millis() as u64,
                "Waiting for async operation"
            );
            ctx.sleep(what, interval).await?;

            let operation_id = operation.id.clone();
            operation = ctx
                .run(what, async {
                    self.client
                        .get_async_operation(&operation_id)
                        .await
                        .map_err(|e| ProvisionerError::remote("get async operation", e))
                })
                .await?;
            polls += 1;
            interval = self.poll.next_interval(interval);
        }
    }
}
