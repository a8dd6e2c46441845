//! Admission loop and round controller.
//!
//! One coordinating routine owns every piece of mutable state. Outstanding
//! attempts live in a [`FuturesUnordered`] pool and hand their outcome back as
//! `(index, result)` values, so no state is shared with executor futures.

use std::fmt;
use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::clock::DispatchClock;
use super::config::{ParallelConfig, RetryPolicy};
use super::descriptor::AttemptRecord;
use super::queue::WorkQueue;

/// Mutable scheduling state for one call.
#[derive(Debug)]
pub(crate) struct BatchState {
    pub in_flight: usize,
    pub paused: bool,
    pub rounds_completed: u32,
    pub clock: DispatchClock,
}

/// What the round controller decided once nothing was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoundDecision {
    Retry { backoff: Duration },
    Finish,
}

impl BatchState {
    pub fn new(dispatch_interval: Duration) -> Self {
        Self {
            in_flight: 0,
            paused: false,
            rounds_completed: 0,
            clock: DispatchClock::new(dispatch_interval),
        }
    }

    /// Only meaningful when `in_flight == 0`.
    pub fn next_round<E>(&self, queue: &WorkQueue, retry: &RetryPolicy<E>) -> RoundDecision {
        if self.paused && !queue.is_empty() && self.rounds_completed < retry.count {
            RoundDecision::Retry {
                backoff: retry.interval,
            }
        } else {
            RoundDecision::Finish
        }
    }

    pub fn begin_round(&mut self) {
        self.paused = false;
        self.rounds_completed += 1;
    }
}

/// Run every round to completion and return the per-request records, in input order.
pub(crate) async fn drive<R, T, E, F, Fut>(
    requests: &[R],
    executor: &F,
    config: &ParallelConfig<E>,
) -> (Vec<AttemptRecord<T, E>>, BatchState)
where
    F: Fn(&R, usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut records: Vec<AttemptRecord<T, E>> =
        requests.iter().map(|_| AttemptRecord::new()).collect();
    let mut queue = WorkQueue::with_len(requests.len());
    let mut state = BatchState::new(config.dispatch_interval);
    let mut pool = FuturesUnordered::new();

    loop {
        while !state.paused && config.has_capacity(state.in_flight) {
            let Some(index) = queue.take_front() else {
                break;
            };
            let wait = state.clock.reserve(Instant::now());
            state.in_flight += 1;
            debug!(
                index,
                wait_ms = wait.as_millis() as u64,
                in_flight = state.in_flight,
                "dispatching request"
            );
            pool.push(attempt(executor, &requests[index], index, wait));
        }

        if let Some((index, outcome)) = pool.next().await {
            state.in_flight -= 1;
            let record = &mut records[index];
            match outcome {
                Ok(value) => {
                    record.record_success(value);
                    debug!(index, attempt = record.attempts, "request succeeded");
                }
                Err(error) => {
                    let retryable = config.retry.is_retryable(&error);
                    warn!(
                        index,
                        attempt = record.attempts + 1,
                        retryable,
                        error = %error,
                        "request attempt failed"
                    );
                    record.record_failure(error);
                    if retryable {
                        queue.push_front(index);
                    }
                    // Stop admitting for the rest of this round; in-flight work still finishes.
                    state.paused = true;
                }
            }
            continue;
        }

        match state.next_round(&queue, &config.retry) {
            RoundDecision::Retry { backoff } => {
                info!(
                    round = state.rounds_completed + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    queued = queue.len(),
                    "starting retry round"
                );
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
                state.begin_round();
            }
            RoundDecision::Finish => break,
        }
    }

    (records, state)
}

async fn attempt<R, T, E, F, Fut>(
    executor: &F,
    request: &R,
    index: usize,
    wait: Duration,
) -> (usize, Result<T, E>)
where
    F: Fn(&R, usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
    (index, executor(request, index).await)
}
