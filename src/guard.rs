//! The run-once orchestrator.
//!
//! One attempt moves through: key built, lock raced, then either the wrapped
//! operation runs under the lock, or the conflict policy decides what the
//! loser does. Cleanup releases everything the attempt acquired on every exit
//! path, success, failure, or conflict alike; the one exception is an error
//! counter a pending reschedule still needs.

use std::collections::HashSet;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::args::{ArgValue, CanonicalArg, canonical_string, canonicalize_args};
use crate::backoff::{counter_ttl, retry_delay_secs};
use crate::counter::ErrorCounter;
use crate::error::{GuardError, RunError};
use crate::keys::{error_count_key, uniqueness_key};
use crate::lock::{AcquireOutcome, DistributedLock};
use crate::queue::DelayedInvoker;
use crate::settings::GuardConfig;
use crate::store::KvStore;

/// What the loser of the lock race does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Fail immediately with `NotUnique`.
    Fail,
    /// Drop the attempt silently; the caller gets a "not run" sentinel.
    Ignore,
    /// Hand the work back to the queue substrate with cubic backoff, up to
    /// the retry budget.
    Reschedule,
    /// Surface the conflict as a value instead of an error.
    Return,
}

impl OnConflict {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnConflict::Fail => "fail",
            OnConflict::Ignore => "ignore",
            OnConflict::Reschedule => "reschedule",
            OnConflict::Return => "return",
        }
    }
}

impl FromStr for OnConflict {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, GuardError> {
        match s {
            "fail" => Ok(OnConflict::Fail),
            "ignore" => Ok(OnConflict::Ignore),
            "reschedule" => Ok(OnConflict::Reschedule),
            "return" => Ok(OnConflict::Return),
            other => Err(GuardError::InvalidPolicy(other.to_string())),
        }
    }
}

/// One unit of work presented to the guard.
///
/// `args` is the full invocation argument list; it is what gets canonicalized
/// and replayed when the attempt is rescheduled. `unique_args`, when present
/// and non-empty, scopes the uniqueness identity to a subset of the caller's
/// own arguments; otherwise the full list is the identity.
#[derive(Debug, Clone, Copy)]
pub struct WorkUnit<'a> {
    pub operation: &'a str,
    pub args: &'a [ArgValue],
    pub unique_args: Option<&'a [ArgValue]>,
}

impl<'a> WorkUnit<'a> {
    pub fn new(operation: &'a str, args: &'a [ArgValue]) -> Self {
        Self {
            operation,
            args,
            unique_args: None,
        }
    }

    fn identity_args(&self) -> &'a [ArgValue] {
        match self.unique_args {
            Some(unique) if !unique.is_empty() => unique,
            _ => self.args,
        }
    }
}

/// How a single claim inside an attempt resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// This attempt holds the lock and must run the work.
    Acquired,
    /// Conflict under the `ignore` policy; the work does not run.
    Skipped,
    /// Conflict under the `return` policy, surfaced as a value.
    Conflict { holder: String, exhausted: bool },
    /// Conflict under the `reschedule` policy; the queue substrate now owns
    /// the retry.
    Rescheduled { delay_secs: u64 },
}

/// Result of a full guarded run.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardOutcome<T> {
    /// The wrapped operation ran; its value passes through unchanged.
    Completed(T),
    Skipped,
    Conflict { holder: String, exhausted: bool },
    Rescheduled { delay_secs: u64 },
}

/// Wraps execution attempts of units of work so that only one execution of a
/// logically-identical unit is in flight at a time across every process
/// sharing the store.
pub struct UniquenessGuard {
    lock: DistributedLock,
    counter: ErrorCounter,
    queue: Arc<dyn DelayedInvoker>,
    prefix: String,
    lock_ttl: Duration,
    max_retries: u32,
}

impl UniquenessGuard {
    pub fn new(
        store: Arc<dyn KvStore>,
        queue: Arc<dyn DelayedInvoker>,
        config: &GuardConfig,
    ) -> Self {
        Self {
            lock: DistributedLock::new(store.clone()),
            counter: ErrorCounter::new(store),
            queue,
            prefix: config.key_prefix.clone(),
            lock_ttl: Duration::from_secs(config.lock_ttl_secs),
            max_retries: config.max_retries,
        }
    }

    /// Begin an attempt with a fresh holder id. Callers that need re-entrant
    /// claims (several identities guarded inside one execution) drive the
    /// [`Attempt`] directly and must call [`Attempt::finish`] on every exit
    /// path; everyone else uses [`UniquenessGuard::run`].
    pub fn attempt(&self) -> Attempt<'_> {
        Attempt {
            guard: self,
            holder_id: Uuid::new_v4().to_string(),
            lock_keys: Vec::new(),
            counter_keys: Vec::new(),
            preserved: HashSet::new(),
        }
    }

    /// Wrap one execution of `op` in the run-once guard.
    ///
    /// When the lock is won, `op` runs and its result or error passes
    /// through unchanged. On a conflict, `policy` decides the outcome. In
    /// every case the attempt releases what it acquired before returning.
    #[tracing::instrument(level = "debug", skip(self, work, op), fields(operation = work.operation, policy = policy.as_str()))]
    pub async fn run<F, Fut, T, E>(
        &self,
        work: WorkUnit<'_>,
        policy: OnConflict,
        op: F,
    ) -> Result<GuardOutcome<T>, RunError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        let mut attempt = self.attempt();
        let claim = match attempt.claim(work, policy).await {
            Ok(claim) => claim,
            Err(err) => {
                attempt.finish().await;
                return Err(RunError::Guard(err));
            }
        };
        match claim {
            ClaimOutcome::Acquired => {
                let result = op().await;
                attempt.finish().await;
                match result {
                    Ok(value) => Ok(GuardOutcome::Completed(value)),
                    Err(err) => Err(RunError::Operation(err)),
                }
            }
            ClaimOutcome::Skipped => {
                attempt.finish().await;
                Ok(GuardOutcome::Skipped)
            }
            ClaimOutcome::Conflict { holder, exhausted } => {
                attempt.finish().await;
                Ok(GuardOutcome::Conflict { holder, exhausted })
            }
            ClaimOutcome::Rescheduled { delay_secs } => {
                attempt.finish().await;
                Ok(GuardOutcome::Rescheduled { delay_secs })
            }
        }
    }
}

/// State scoped to one invocation: the lock keys this attempt acquired, the
/// counter keys to clear on completion, and the counters a pending
/// reschedule must outlive. Discarded when the attempt finishes.
pub struct Attempt<'g> {
    guard: &'g UniquenessGuard,
    holder_id: String,
    lock_keys: Vec<String>,
    counter_keys: Vec<String>,
    preserved: HashSet<String>,
}

impl Attempt<'_> {
    /// Id stored in any lock entry this attempt creates.
    pub fn holder_id(&self) -> &str {
        &self.holder_id
    }

    /// Race for the lock on `work`'s identity; on conflict, resolve per
    /// `policy`. May be called more than once per attempt with distinct
    /// identities; claiming an identity this attempt already holds is a
    /// programmer error.
    pub async fn claim(
        &mut self,
        work: WorkUnit<'_>,
        policy: OnConflict,
    ) -> Result<ClaimOutcome, GuardError> {
        let identity = canonicalize_args(work.identity_args());
        let lock_key = uniqueness_key(&self.guard.prefix, work.operation, &identity);
        if self.lock_keys.contains(&lock_key) {
            return Err(GuardError::DuplicateKey { key: lock_key });
        }

        // Registered up front: the counter for this identity is cleared in
        // cleanup whether or not the lock was won, unless a reschedule
        // preserves it below.
        let counter_key = error_count_key(&self.guard.prefix, work.operation, &identity);
        if !self.counter_keys.contains(&counter_key) {
            self.counter_keys.push(counter_key.clone());
        }

        match self
            .guard
            .lock
            .try_acquire(&lock_key, &self.holder_id, self.guard.lock_ttl)
            .await?
        {
            AcquireOutcome::Acquired => {
                self.lock_keys.push(lock_key);
                Ok(ClaimOutcome::Acquired)
            }
            AcquireOutcome::Held { holder } => {
                self.on_conflict(work, policy, &identity, &counter_key, holder)
                    .await
            }
        }
    }

    async fn on_conflict(
        &mut self,
        work: WorkUnit<'_>,
        policy: OnConflict,
        identity: &[CanonicalArg],
        counter_key: &str,
        holder: String,
    ) -> Result<ClaimOutcome, GuardError> {
        match policy {
            OnConflict::Ignore => {
                debug!(operation = work.operation, conflicting = %holder, "conflict ignored");
                Ok(ClaimOutcome::Skipped)
            }
            OnConflict::Fail => Err(self.not_unique(work, identity, holder, false)),
            OnConflict::Return => Ok(ClaimOutcome::Conflict {
                holder,
                exhausted: false,
            }),
            OnConflict::Reschedule => {
                let count = self.guard.counter.get(counter_key).await?;
                if count >= self.guard.max_retries {
                    return Err(self.not_unique(work, identity, holder, true));
                }
                // Both the delay and the refreshed counter TTL derive from
                // the pre-increment count, so the counter outlives the retry
                // it just scheduled.
                let delay_secs = retry_delay_secs(count);
                self.guard
                    .counter
                    .increment(counter_key, counter_ttl(count))
                    .await?;
                let replay = canonicalize_args(work.args);
                info!(
                    operation = work.operation,
                    conflicting = %holder,
                    delay_secs,
                    attempt = count + 1,
                    "rescheduling: a similar execution is already running"
                );
                self.guard
                    .queue
                    .delayed_invoke(work.operation, &replay, delay_secs)
                    .await?;
                self.preserved.insert(counter_key.to_string());
                Ok(ClaimOutcome::Rescheduled { delay_secs })
            }
        }
    }

    fn not_unique(
        &self,
        work: WorkUnit<'_>,
        identity: &[CanonicalArg],
        holder: String,
        exhausted: bool,
    ) -> GuardError {
        let mut message = format!(
            "operation {} with uniqueness args {} is not unique, a similar execution is already running: {}.",
            work.operation,
            canonical_string(identity),
            holder
        );
        if exhausted {
            message.push_str(&format!(
                " The operation has been retried {} times.",
                self.guard.max_retries
            ));
        }
        GuardError::NotUnique {
            holder,
            exhausted,
            message,
        }
    }

    /// Release every lock this attempt acquired and clear the counters no
    /// pending reschedule still needs. Best-effort; runs on every exit path.
    pub async fn finish(self) {
        self.guard.lock.release_all(&self.lock_keys).await;
        for key in &self.counter_keys {
            if !self.preserved.contains(key) {
                self.guard.counter.delete(key).await;
            }
        }
    }
}
