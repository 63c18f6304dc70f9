//! Queue substrate boundary.
//!
//! The guard does not dispatch work itself; on the reschedule path it hands
//! the canonicalized invocation to whatever substrate runs units of work
//! asynchronously. At-least-once semantics are acceptable: a duplicate
//! re-invocation simply loses the lock race if one is still in flight.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::args::CanonicalArg;

#[derive(Debug, Error, Clone)]
pub enum QueueError {
    #[error("delayed invocation failed: {0}")]
    Dispatch(String),
}

/// "Run this operation again with these arguments, no sooner than
/// `delay_secs` from now."
#[async_trait]
pub trait DelayedInvoker: Send + Sync {
    async fn delayed_invoke(
        &self,
        operation: &str,
        args: &[CanonicalArg],
        delay_secs: u64,
    ) -> Result<(), QueueError>;
}

/// One recorded re-invocation request.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayedCall {
    pub operation: String,
    pub args: Vec<CanonicalArg>,
    pub delay_secs: u64,
}

/// Recording invoker for tests and single-process setups.
pub struct MockDelayedInvoker {
    calls: Mutex<Vec<DelayedCall>>,
}

impl Default for MockDelayedInvoker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDelayedInvoker {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Everything recorded so far, in dispatch order.
    pub fn calls(&self) -> Vec<DelayedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl DelayedInvoker for MockDelayedInvoker {
    async fn delayed_invoke(
        &self,
        operation: &str,
        args: &[CanonicalArg],
        delay_secs: u64,
    ) -> Result<(), QueueError> {
        self.calls.lock().unwrap().push(DelayedCall {
            operation: operation.to_string(),
            args: args.to_vec(),
            delay_secs,
        });
        Ok(())
    }
}
