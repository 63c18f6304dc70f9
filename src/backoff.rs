use std::time::Duration;

/// Reschedule budget for one WorkIdentity's conflict chain. The attempt
/// after the budget is spent fails as exhausted instead of requeueing.
pub const MAX_RETRIES: u32 = 10;

pub const THIRTY_DAYS_SECS: u64 = 60 * 60 * 24 * 30;

/// Lock expiry. A crashed holder cannot block others past this; live
/// attempts release explicitly within seconds.
pub const LOCK_TTL: Duration = Duration::from_secs(THIRTY_DAYS_SECS);

/// Seconds before a rescheduled attempt runs again: cubic in the number of
/// failures so far, with a floor of 5 seconds at zero.
pub fn retry_delay_secs(error_count: u32) -> u64 {
    (error_count as u64).pow(3) + 5
}

/// Counter expiry: the delay it is about to schedule plus the 30 day safety
/// net, so a counter always outlives the retry derived from it.
pub fn counter_ttl(error_count: u32) -> Duration {
    Duration::from_secs(retry_delay_secs(error_count) + THIRTY_DAYS_SECS)
}
