use thiserror::Error;

use crate::queue::QueueError;
use crate::store::StoreError;

/// Failures the guard itself can produce.
///
/// `NotUnique` is the only variant whose propagation is policy-controlled;
/// everything else always surfaces to the caller synchronously and is never
/// retried or swallowed.
#[derive(Debug, Error)]
pub enum GuardError {
    /// An unrecognized conflict-policy name was parsed at the string
    /// boundary. The policy enum itself is closed, so this cannot occur once
    /// an [`OnConflict`](crate::guard::OnConflict) value exists.
    #[error("on_error must be one of fail, ignore, reschedule, return, but was {0:?}")]
    InvalidPolicy(String),

    /// The same WorkIdentity was claimed twice within one attempt.
    #[error("a uniqueness key {key:?} is already registered in this attempt")]
    DuplicateKey { key: String },

    /// An argument has no canonical form safe to persist and replay.
    #[error("cannot canonicalize argument for rescheduling: {0}")]
    UnsupportedArgument(String),

    /// A conflicting execution already holds the uniqueness key.
    #[error("{message}")]
    NotUnique {
        /// Id of the execution currently holding the lock.
        holder: String,
        /// True when a reschedule chain has used up its retry budget.
        exhausted: bool,
        message: String,
    },

    /// The shared store was unreachable or answered abnormally. Distinct
    /// from `NotUnique`: nothing is known about uniqueness in this case.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Handing a re-invocation to the queue substrate failed.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A key owned exclusively by this system held a value it could not have
    /// written. Indicates a logic bug or namespace intrusion, not a
    /// recoverable condition.
    #[error("invariant violated: {0}")]
    Internal(String),
}

impl GuardError {
    pub fn is_not_unique(&self) -> bool {
        matches!(self, GuardError::NotUnique { .. })
    }
}

/// Error type of a full guarded run: either the guard failed, or the wrapped
/// operation itself failed. Operation failures pass through unchanged; the
/// guard never masks them.
#[derive(Debug, Error)]
pub enum RunError<E>
where
    E: std::error::Error,
{
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Operation(E),
}
