//! Bounded readiness polling.

use std::time::Instant;

use tracing::{info, warn};

use crate::{VectorStore, config::ReadinessPolicy};

/// Polls `store` until it reports healthy or `policy.timeout` elapses.
///
/// Returns `false` on timeout instead of failing; transport errors are
/// logged and retried within the window.
pub async fn wait_ready(store: &dyn VectorStore, policy: &ReadinessPolicy) -> bool {
    let started = Instant::now();
    let mut attempt = 0u32;
    info!(
        index = %store.index_name(),
        timeout_secs = policy.timeout.as_secs(),
        "waiting for vector store"
    );

    while started.elapsed() < policy.timeout {
        attempt += 1;
        let remaining = policy.timeout.saturating_sub(started.elapsed());

        match tokio::time::timeout(remaining, store.ping()).await {
            Ok(Ok(true)) => {
                info!(
                    attempt,
                    waited_ms = started.elapsed().as_millis(),
                    "vector store is available"
                );
                return true;
            }
            Ok(Ok(false)) => warn!(attempt, "vector store is up but not healthy yet"),
            Ok(Err(err)) => warn!(attempt, error = %err, "vector store ping failed, retrying"),
            Err(_) => warn!(attempt, "vector store ping timed out"),
        }

        let remaining = policy.timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        tokio::time::sleep(policy.poll_interval.min(remaining)).await;
    }

    warn!(
        attempts = attempt,
        timeout_secs = policy.timeout.as_secs(),
        "vector store not available before timeout"
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::config::IndexSchema;
    use std::{sync::Arc, time::Duration};

    fn policy(timeout_ms: u64, interval_ms: u64) -> ReadinessPolicy {
        ReadinessPolicy {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(interval_ms),
        }
    }

    #[tokio::test]
    async fn healthy_store_is_ready_on_first_ping() {
        let store = InMemoryStore::new("docs", IndexSchema::default());
        assert!(wait_ready(&store, &policy(1_000, 10)).await);
        assert_eq!(store.ping_count(), 1);
    }

    #[tokio::test]
    async fn unreachable_store_times_out_after_retries() {
        let store = InMemoryStore::new("docs", IndexSchema::default());
        store.set_reachable(false);
        let started = Instant::now();
        assert!(!wait_ready(&store, &policy(120, 20)).await);
        assert!(started.elapsed() >= Duration::from_millis(120));
        assert!(store.ping_count() >= 2);
    }

    #[tokio::test]
    async fn store_recovering_within_the_window_is_ready() {
        let store = Arc::new(InMemoryStore::new("docs", IndexSchema::default()));
        store.set_reachable(false);

        let flip = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flip.set_reachable(true);
        });

        assert!(wait_ready(store.as_ref(), &policy(2_000, 10)).await);
        assert!(store.ping_count() >= 2);
    }

    #[tokio::test]
    async fn zero_timeout_never_pings() {
        let store = InMemoryStore::new("docs", IndexSchema::default());
        assert!(!wait_ready(&store, &policy(0, 10)).await);
        assert_eq!(store.ping_count(), 0);
    }
}
