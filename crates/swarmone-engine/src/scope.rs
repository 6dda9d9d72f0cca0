//! Request deadlines and bounded calls.

use std::future::Future;
use std::time::Duration;

use swarmone_core::SwarmError;
use tokio::time::Instant;

/// Deadline shared by every call made on behalf of one request.
///
/// Child budgets derived from a scope can only shrink the window, never
/// extend it. Cancellation is by dropping: when the future driving a request
/// is dropped, every in-flight runner and judge call goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionScope {
    deadline: Option<Instant>,
}

impl ExecutionScope {
    /// A scope with no overall deadline.
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// A scope ending `timeout` from now; zero means unbounded.
    pub fn with_timeout(timeout: Duration) -> Self {
        if timeout.is_zero() {
            Self::unbounded()
        } else {
            Self::with_deadline(Instant::now() + timeout)
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, saturating at zero.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Budget for a child call limited to `limit`; a zero limit inherits the
    /// parent deadline only.
    pub fn child_budget(&self, limit: Duration) -> Option<Duration> {
        let limit = (!limit.is_zero()).then_some(limit);
        match (limit, self.remaining()) {
            (Some(l), Some(r)) => Some(l.min(r)),
            (l, r) => l.or(r),
        }
    }
}

impl Default for ExecutionScope {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Awaits `fut`, failing with [`SwarmError::Timeout`] once `budget` elapses.
pub(crate) async fn bounded<T, F>(budget: Option<Duration>, what: &str, fut: F) -> Result<T, SwarmError>
where
    F: Future<Output = Result<T, SwarmError>>,
{
    match budget {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| SwarmError::Timeout {
                what: what.to_string(),
                after,
            })?,
        None => fut.await,
    }
}
