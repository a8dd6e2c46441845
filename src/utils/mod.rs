//! Small async helpers.

use std::time::Duration;

/// Sleep for `ms` milliseconds.
pub async fn delay(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
