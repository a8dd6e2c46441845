//! 批量执行模块：在并发上限内执行一组异步请求，支持单项重试与整批重试轮次。
//!
//! # Batch Execution Module
//!
//! Runs a fixed collection of independent async requests under a concurrency
//! cap, retries failures in whole-batch rounds, and reduces the outcomes to
//! either the ordered results or one [`AggregateError`].
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`parallel`] | Bounded-concurrency execution with retry rounds |
//! | [`batch`] | [`parallel`] with a concurrency cap of 1 |
//! | [`ParallelConfig`] | Concurrency cap, retry policy, dispatch spacing |
//! | [`RetryPolicy`] / [`RetryOption`] | Retry rounds, backoff and per-item predicate |
//! | [`BatchSettings`] | Serializable settings (YAML/JSON/env) |
//! | [`AggregateError`] | Every failed request plus every unprocessed payload |
//!
//! ## Retry model
//!
//! - A failed attempt stops new admissions for the rest of the round. Attempts
//!   already running finish normally.
//! - If the retry predicate accepts the error, the request goes back to the
//!   front of the queue.
//! - When the round drains and retry rounds remain, the engine sleeps the
//!   round backoff and resumes with whatever is still queued.
//!
//! ## Example
//!
//! ```rust
//! use batchwise::batch::{parallel, ParallelConfig};
//!
//! # tokio_test::block_on(async {
//! let config = ParallelConfig::<String>::new().with_limit(2).with_retry(1u32);
//! let results = parallel(
//!     vec![5, 6, 7],
//!     |req: &i32, index: usize| {
//!         let req = *req;
//!         async move { Ok::<_, String>((req, index)) }
//!     },
//!     config,
//! )
//! .await
//! .unwrap();
//! assert_eq!(results, vec![(5, 0), (6, 1), (7, 2)]);
//! # });
//! ```
//!
//! The executor receives a shared reference to the request. The returned
//! future must not borrow it, so copy or clone what the attempt needs first.

mod aggregate;
mod clock;
mod config;
mod descriptor;
mod queue;
mod scheduler;
mod settings;

pub use aggregate::{aggregate, format_attempt_errors, AggregateError, RequestError};
pub use clock::DispatchClock;
pub use config::{ParallelConfig, RetryOption, RetryPolicy, ShouldRetry};
pub use descriptor::{AttemptRecord, RequestDescriptor};
pub use queue::WorkQueue;
pub use settings::{
    BatchSettings, RetrySettings, ENV_DISPATCH_INTERVAL_MS, ENV_LIMIT, ENV_RETRY_COUNT,
    ENV_RETRY_INTERVAL_MS,
};

use std::fmt;
use std::future::Future;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Execute every request with bounded concurrency and round-based retry.
///
/// Resolves with one result per request, in input order, or with an
/// [`AggregateError`] once the retry rounds are exhausted while failures remain.
pub async fn parallel<R, T, E, F, Fut>(
    requests: impl IntoIterator<Item = R>,
    executor: F,
    config: ParallelConfig<E>,
) -> Result<Vec<T>, AggregateError<R, E>>
where
    R: fmt::Debug,
    E: fmt::Debug + fmt::Display,
    F: Fn(&R, usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let requests: Vec<R> = requests.into_iter().collect();
    let batch_id = Uuid::new_v4();
    let span = info_span!(
        "batchwise.parallel",
        %batch_id,
        requests = requests.len(),
        limit = ?config.limit
    );

    async move {
        let (records, state) = scheduler::drive(&requests, &executor, &config).await;

        let succeeded = records.iter().filter(|r| r.succeeded).count();
        let failed = records
            .iter()
            .filter(|r| !r.attempt_errors.is_empty())
            .count();
        info!(
            succeeded,
            failed,
            unprocessed = records.len() - succeeded,
            rounds = state.rounds_completed,
            "batch finished"
        );

        let descriptors = requests
            .into_iter()
            .zip(records)
            .enumerate()
            .map(|(index, (request, record))| RequestDescriptor::from_record(index, request, record))
            .collect();
        aggregate(descriptors)
    }
    .instrument(span)
    .await
}

/// Strictly sequential [`parallel`]: at most one attempt outstanding.
pub async fn batch<R, T, E, F, Fut>(
    requests: impl IntoIterator<Item = R>,
    executor: F,
    config: ParallelConfig<E>,
) -> Result<Vec<T>, AggregateError<R, E>>
where
    R: fmt::Debug,
    E: fmt::Debug + fmt::Display,
    F: Fn(&R, usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    parallel(requests, executor, config.with_limit(1)).await
}
