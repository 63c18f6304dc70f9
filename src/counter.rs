use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::error::GuardError;
use crate::store::KvStore;

/// Persistent failure counter for one WorkIdentity's reschedule chain.
///
/// Keyed independently of the lock, so the count survives across reschedules
/// while the lock comes and goes. Increment is read-modify-write without a
/// compare-and-swap: the lock itself guarantees one in-flight attempt per
/// WorkIdentity, so each counter has a single writer at a time.
pub struct ErrorCounter {
    store: Arc<dyn KvStore>,
}

impl ErrorCounter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Current count; 0 when absent.
    pub async fn get(&self, key: &str) -> Result<u32, GuardError> {
        match self.store.get(key).await? {
            None => Ok(0),
            Some(raw) => raw.parse().map_err(|_| {
                // Counter keys are written by this system only; garbage here
                // is a logic bug or a namespace intrusion.
                GuardError::Internal(format!(
                    "error counter {key:?} holds non-numeric value {raw:?}"
                ))
            }),
        }
    }

    /// Read the current value and write `value + 1` with a fresh expiry.
    pub async fn increment(&self, key: &str, ttl: Duration) -> Result<u32, GuardError> {
        let next = self.get(key).await? + 1;
        self.store.put(key, &next.to_string(), ttl).await?;
        Ok(next)
    }

    /// Best-effort removal; a no-op when the key is absent. Failures are
    /// logged and swallowed, the entry expires by TTL regardless.
    pub async fn delete(&self, key: &str) {
        let keys = [key.to_string()];
        if let Err(err) = self.store.delete(&keys).await {
            warn!(error = %err, key, "failed to delete error counter; entry will expire by TTL");
        }
    }
}
