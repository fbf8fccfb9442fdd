//! Deadline enforcement.
//!
//! # Responsibilities
//! - Represent an absolute expiry for one operation
//! - Derive child deadlines for nested operations
//! - Abort an in-flight future when its deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's clock so a paused runtime drives expiry in tests
//! - Expiry drops the wrapped future; cancellation only flows downward
//! - Child budgets are fixed policy values, not slices of the parent

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

/// A deadline ran out before the guarded operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {}ms exceeded", .budget.as_millis())]
pub struct DeadlineExceeded {
    /// Budget the operation was granted when the deadline was created.
    pub budget: Duration,
}

/// How a nested operation's deadline relates to its parent's.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildDeadlinePolicy {
    /// The child gets `now + budget` regardless of how much time the parent has left.
    #[default]
    Independent,
    /// The child gets `min(now + budget, parent expiry)`.
    Clamped,
}

/// An absolute point in time by which an operation must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Option<Instant>,
    budget: Option<Duration>,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Some(Instant::now() + budget),
            budget: Some(budget),
        }
    }

    /// A deadline that never expires.
    pub fn unbounded() -> Self {
        Self {
            expires_at: None,
            budget: None,
        }
    }

    /// Time left before expiry. `None` for an unbounded deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    /// Derive the deadline of a nested operation.
    pub fn child(&self, budget: Duration, policy: ChildDeadlinePolicy) -> Self {
        let own = Self::after(budget);
        match (policy, self.expires_at, own.expires_at) {
            (ChildDeadlinePolicy::Clamped, Some(parent), Some(child)) if parent < child => Self {
                expires_at: Some(parent),
                budget: Some(budget),
            },
            _ => own,
        }
    }

    /// The error reported when this deadline has run out.
    pub fn exceeded(&self) -> DeadlineExceeded {
        DeadlineExceeded {
            budget: self.budget.unwrap_or_default(),
        }
    }

    /// Drive `future` to completion unless the deadline passes first.
    ///
    /// On expiry the future is dropped, which aborts whatever I/O it had in flight.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        match self.expires_at {
            Some(at) => tokio::time::timeout_at(at, future)
                .await
                .map_err(|_| self.exceeded()),
            None => Ok(future.await),
        }
    }
}
