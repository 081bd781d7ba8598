use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::ProvisionerError;

/// Deadline and cancellation scope for one lifecycle call.
///
/// Every remote request and every poll of an async operation runs through
/// [`CallContext::run`] or [`CallContext::sleep`], so a single deadline bounds
/// the whole call and cancelling the token aborts it promptly.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    /// Root context without a deadline
    pub fn background() -> Self {
        Self {
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Root context driven by an existing cancellation token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            deadline: None,
            cancel,
        }
    }

    /// Child context that expires after `timeout` or at the parent's deadline,
    /// whichever comes first. A timeout too large to represent leaves the
    /// parent's deadline in place.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(candidate)) => Some(parent.min(candidate)),
            (parent, None) => parent,
            (None, candidate) => candidate,
        };

        Self {
            deadline,
            cancel: self.cancel.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (`None` when unbounded)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `future` until it completes, the deadline passes, or the context
    /// is cancelled
    pub async fn run<F, T>(&self, what: &str, future: F) -> Result<T, ProvisionerError>
    where
        F: Future<Output = Result<T, ProvisionerError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ProvisionerError::Cancelled(what.to_string()));
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProvisionerError::Cancelled(what.to_string())),
            _ = Self::expired(self.deadline) => Err(ProvisionerError::DeadlineExceeded(what.to_string())),
            result = future => result,
        }
    }

    /// Sleep for `duration`, returning early with an error on deadline or
    /// cancellation
    pub async fn sleep(&self, what: &str, duration: Duration) -> Result<(), ProvisionerError> {
        self.run(what, async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }

    async fn expired(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_within_deadline() {
        let ctx = CallContext::background().with_timeout(Duration::from_secs(5));
        let value = ctx.run("compute", async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_hits_deadline() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(20));
        let result: Result<(), _> = ctx
            .run("hang", async {
                std::future::pending::<()>().await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ProvisionerError::DeadlineExceeded(what)) if what == "hang"));
    }

    #[tokio::test]
    async fn test_child_keeps_earlier_parent_deadline() {
        let parent = CallContext::background().with_timeout(Duration::from_millis(50));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
        assert!(child.remaining().unwrap() <= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_child() {
        let parent = CallContext::background();
        let child = parent.with_timeout(Duration::from_secs(60));

        let waiter = tokio::spawn(async move { child.sleep("wait", Duration::from_secs(30)).await });
        parent.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ProvisionerError::Cancelled(_))));
    }

    #[tokio::test]
    async fn test_background_has_no_deadline() {
        let ctx = CallContext::background();
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_keeps_parent_deadline() {
        let unbounded = CallContext::background().with_timeout(Duration::MAX);
        assert!(unbounded.deadline().is_none());

        let parent = CallContext::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::MAX);
        assert_eq!(child.deadline(), parent.deadline());
    }
}
