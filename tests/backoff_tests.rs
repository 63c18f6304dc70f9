use std::time::Duration;

use solo::backoff::{LOCK_TTL, MAX_RETRIES, THIRTY_DAYS_SECS, counter_ttl, retry_delay_secs};

#[test]
fn delay_is_cubic_with_floor_of_five() {
    assert_eq!(retry_delay_secs(0), 5);
    assert_eq!(retry_delay_secs(1), 6);
    assert_eq!(retry_delay_secs(2), 13);
    assert_eq!(retry_delay_secs(10), 1005);
}

#[test]
fn counter_outlives_the_retry_it_schedules() {
    assert_eq!(
        counter_ttl(0),
        Duration::from_secs(5 + THIRTY_DAYS_SECS)
    );
    assert_eq!(
        counter_ttl(3),
        Duration::from_secs(32 + THIRTY_DAYS_SECS)
    );
}

#[test]
fn pinned_constants() {
    assert_eq!(MAX_RETRIES, 10);
    assert_eq!(THIRTY_DAYS_SECS, 2_592_000);
    assert_eq!(LOCK_TTL, Duration::from_secs(2_592_000));
}
