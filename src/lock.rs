use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::store::{KvStore, StoreError};

/// Result of one acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// Another execution already holds the key; nothing was modified.
    Held { holder: String },
}

/// Store-backed lock with expiry.
///
/// `try_acquire` is the linearization point: whichever caller's write the
/// store applies first wins, and every other caller observes the winner's
/// holder id until release or TTL expiry. The TTL is a safety net against a
/// crashed holder, not the expected hold duration; attempts normally release
/// explicitly within seconds.
pub struct DistributedLock {
    store: Arc<dyn KvStore>,
}

impl DistributedLock {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn try_acquire(
        &self,
        key: &str,
        holder_id: &str,
        ttl: Duration,
    ) -> Result<AcquireOutcome, StoreError> {
        match self.store.put_if_absent(key, holder_id, ttl).await? {
            None => {
                debug!(key, holder_id, "lock acquired");
                Ok(AcquireOutcome::Acquired)
            }
            Some(holder) => {
                debug!(key, conflicting = %holder, "lock held by another execution");
                Ok(AcquireOutcome::Held { holder })
            }
        }
    }

    pub async fn current_holder(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.store.get(key).await
    }

    /// Best-effort bulk release. Failures are logged and swallowed: cleanup
    /// never overrides an attempt's primary result, and an unreleased entry
    /// expires by TTL anyway. Releasing an already-expired key is a no-op.
    pub async fn release_all(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        if let Err(err) = self.store.delete(keys).await {
            warn!(error = %err, ?keys, "failed to release uniqueness locks; entries will expire by TTL");
        }
    }
}
