//! Bounded retry with exponential backoff for store calls.

use semdex_core::StoreError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 200;

/// Run a store operation, retrying transient failures up to three attempts
/// with doubling delays. Non-transient errors (misconfiguration) are
/// returned immediately.
pub(crate) async fn with_retry<T, F, Fut>(op: &str, mut f: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(e);
                }
                let delay = Duration::from_millis(BASE_BACKOFF_MS << (attempt - 1));
                warn!(
                    "{op} failed (attempt {attempt}/{MAX_ATTEMPTS}), retrying in {}ms: {e}",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
