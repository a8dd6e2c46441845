//! Engine configuration: concurrency cap, retry policy, dispatch spacing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Predicate deciding whether a failed attempt is put back in the queue.
pub type ShouldRetry<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Canonical retry policy.
///
/// `count` is the number of whole-batch retry rounds, `interval` the backoff
/// slept before each of them, and `should_retry` the per-item eligibility
/// check applied to every failure (unset retries everything).
pub struct RetryPolicy<E> {
    pub count: u32,
    pub interval: Duration,
    pub should_retry: Option<ShouldRetry<E>>,
}

impl<E> RetryPolicy<E> {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            interval: Duration::ZERO,
            should_retry: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_should_retry<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    pub fn is_retryable(&self, error: &E) -> bool {
        self.should_retry
            .as_ref()
            .map_or(true, |predicate| predicate(error))
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            interval: self.interval,
            should_retry: self.should_retry.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("count", &self.count)
            .field("interval", &self.interval)
            .field("should_retry", &self.should_retry.is_some())
            .finish()
    }
}

/// Retry setting as callers spell it: a bare round count or a full policy.
pub enum RetryOption<E> {
    Count(u32),
    Policy(RetryPolicy<E>),
}

impl<E> RetryOption<E> {
    pub fn into_policy(self) -> RetryPolicy<E> {
        match self {
            RetryOption::Count(count) => RetryPolicy::new(count),
            RetryOption::Policy(policy) => policy,
        }
    }
}

impl<E> From<u32> for RetryOption<E> {
    fn from(count: u32) -> Self {
        RetryOption::Count(count)
    }
}

impl<E> From<RetryPolicy<E>> for RetryOption<E> {
    fn from(policy: RetryPolicy<E>) -> Self {
        RetryOption::Policy(policy)
    }
}

/// Configuration for [`crate::batch::parallel`].
pub struct ParallelConfig<E> {
    /// Maximum outstanding attempts; `None` means unbounded.
    pub limit: Option<usize>,
    pub retry: RetryPolicy<E>,
    /// Minimum spacing between two attempt starts.
    pub dispatch_interval: Duration,
}

impl<E> ParallelConfig<E> {
    pub fn new() -> Self {
        Self {
            limit: None,
            retry: RetryPolicy::default(),
            dispatch_interval: Duration::ZERO,
        }
    }

    /// Cap concurrent attempts. Zero removes the cap.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = if limit == 0 { None } else { Some(limit) };
        self
    }

    pub fn with_retry(mut self, retry: impl Into<RetryOption<E>>) -> Self {
        self.retry = retry.into().into_policy();
        self
    }

    pub fn with_should_retry<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retry = self.retry.with_should_retry(predicate);
        self
    }

    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    pub(crate) fn has_capacity(&self, in_flight: usize) -> bool {
        match self.limit {
            Some(limit) if limit > 0 => in_flight < limit,
            _ => true,
        }
    }
}

impl<E> Default for ParallelConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ParallelConfig<E> {
    fn clone(&self) -> Self {
        Self {
            limit: self.limit,
            retry: self.retry.clone(),
            dispatch_interval: self.dispatch_interval,
        }
    }
}

impl<E> fmt::Debug for ParallelConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelConfig")
            .field("limit", &self.limit)
            .field("retry", &self.retry)
            .field("dispatch_interval", &self.dispatch_interval)
            .finish()
    }
}
