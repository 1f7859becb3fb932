use std::future::Future;

use domain::bus::RetryPolicy;
use tokio::time::sleep;

/// Re-invoke `op` until it yields `Some`, at most `policy.attempts()` times,
/// sleeping `policy.delay()` between attempts.
pub async fn try_until_some<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let attempts = policy.attempts();
    for attempt in 1..=attempts {
        if let Some(out) = op().await {
            return Some(out);
        }
        if attempt < attempts {
            tracing::debug!(
                operation = %label,
                attempt,
                attempts,
                "Operation unavailable, retrying"
            );
            sleep(policy.delay()).await;
        }
    }
    None
}
