//! Flaky Requests Example
//!
//! Runs seven requests against a simulated backend that rejects two calls out
//! of every five, first sequentially with retry rounds and then in parallel
//! with a concurrency cap.
//!
//! Settings come from an inline YAML document and can be overridden with the
//! `BATCHWISE_*` environment variables.
//!
//! Usage:
//!   RUST_LOG=batchwise=debug cargo run --example flaky_requests

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use batchwise::{batch, parallel, AggregateError, BatchSettings};

const SETTINGS_YAML: &str = r#"
dispatch_interval: 10
retry:
  count: 2
  interval: 100
"#;

const REQUESTS: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

#[derive(Debug, Clone)]
struct BackendError(String);

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend that fails the 3rd and 4th call of every five.
#[derive(Clone, Default)]
struct FlakyBackend {
    calls: Arc<AtomicU64>,
}

impl FlakyBackend {
    fn get_something(&self, req: &str, index: usize) -> impl std::future::Future<Output = Result<u64, BackendError>> {
        let req = req.to_string();
        let calls = self.calls.clone();
        let latency = Duration::from_millis(40 + (index as u64 * 17) % 60);
        async move {
            tokio::time::sleep(latency).await;
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n % 5 == 3 || n % 5 == 4 {
                println!("  {} => cannot get something", req);
                Err(BackendError("cannot get something".to_string()))
            } else {
                println!("  {} => {}", req, n);
                Ok(n)
            }
        }
    }
}

fn report(outcome: Result<Vec<u64>, AggregateError<&str, BackendError>>) {
    match outcome {
        Ok(results) => println!("Results: {:?}\n", results),
        Err(e) => {
            println!("Error: {}", e);
            for err in e.errors() {
                println!("  request #{}: {}", err.index, err);
            }
            println!("Unprocessed: {:?}\n", e.unprocessed_requests());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_target(false)
        .try_init();

    let settings = BatchSettings::from_yaml_str(SETTINGS_YAML)?.with_env_overrides()?;
    println!("Settings: {:?}\n", settings);

    let backend = FlakyBackend::default();

    println!("--- Sequential batch with retry rounds ---\n");
    let outcome = batch(
        REQUESTS,
        |req: &&str, index: usize| backend.get_something(req, index),
        settings.clone().into_config(),
    )
    .await;
    report(outcome);

    println!("--- Parallel, limit 3, no retry ---\n");
    let outcome = parallel(
        REQUESTS,
        |req: &&str, index: usize| backend.get_something(req, index),
        BatchSettings {
            limit: Some(3),
            retry: None,
            ..settings
        }
        .into_config(),
    )
    .await;
    report(outcome);

    Ok(())
}
