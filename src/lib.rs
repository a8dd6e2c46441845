//! # batchwise
//!
//! 在并发上限内批量执行异步请求，支持单项重试、整批重试轮次和有序结果聚合。
//!
//! Bounded-concurrency execution of async request batches with per-item and
//! whole-round retry.
//!
//! ## Overview
//!
//! The crate is a generic scheduling primitive. Callers hand over a fixed
//! collection of requests and an executor (`Fn(&R, usize) -> Future<Output = Result<T, E>>`);
//! the engine admits work under a concurrency cap, retries failures in rounds
//! with backoff, and resolves with either every result in input order or an
//! [`AggregateError`] describing each failed and each unprocessed request.
//!
//! It performs no I/O itself and does not interpret request payloads.
//!
//! ## Quick Start
//!
//! ```rust
//! use batchwise::{batch, ParallelConfig};
//!
//! # tokio_test::block_on(async {
//! let err = batch(
//!     vec![5],
//!     |_req: &i32, _index: usize| async { Err::<(), _>("unavailable".to_string()) },
//!     ParallelConfig::new(),
//! )
//! .await
//! .unwrap_err();
//!
//! assert_eq!(err.errors[0].errors, vec!["unavailable".to_string()]);
//! assert_eq!(err.unprocessed_requests, vec![5]);
//! # });
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`batch`] | Scheduling engine, configuration, aggregation |
//! | [`error`] | Configuration error type |
//! | [`utils`] | Async helpers |

pub mod batch;
pub mod error;
pub mod utils;

// Re-export main types for convenience
pub use batch::{
    batch, parallel, AggregateError, BatchSettings, ParallelConfig, RequestError, RetryOption,
    RetryPolicy,
};
pub use error::{Error, ErrorContext};
pub use utils::delay;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
