//! `solo` — a distributed run-once guard.
//!
//! Many independent worker processes agree, through a shared key-value store,
//! that only one execution of a logically-identical unit of work may be in
//! flight at a time. The loser of the race does what its conflict policy
//! says: fail immediately, silently drop, requeue with cubic backoff up to a
//! budget, or receive the conflict as a value.
//!
//! The entry point is [`guard::UniquenessGuard`]. The store and queue
//! substrates are abstract seams ([`store::KvStore`],
//! [`queue::DelayedInvoker`]); [`store::MemoryStore`] and
//! [`queue::MockDelayedInvoker`] back single-process use and tests.

pub mod args;
pub mod backoff;
pub mod counter;
pub mod error;
pub mod guard;
pub mod keys;
pub mod lock;
pub mod queue;
pub mod settings;
pub mod store;
pub mod trace;

pub use solo_macros::test;
