use engagement_sim::config::QuotaConfig;
use engagement_sim::quota::{day_key, PostingQuotaGuard};
use engagement_sim::DailyPostCount;

// 2024-01-01T00:00:00Z; IST is 5h30m ahead.
const JAN_1_UTC_MIDNIGHT: i64 = 1_704_067_200_000;
// 2024-01-01T18:30:00Z is exactly midnight Jan 2 in IST.
const IST_JAN_2_MIDNIGHT: i64 = JAN_1_UTC_MIDNIGHT + (18 * 3600 + 1800) * 1000;

fn guard() -> PostingQuotaGuard {
    PostingQuotaGuard::new(QuotaConfig::default())
}

fn daily(count: u32, date: &str) -> DailyPostCount {
    DailyPostCount {
        count,
        date: date.to_string(),
    }
}

#[test]
fn day_key_uses_the_fixed_offset_not_utc() {
    assert_eq!(day_key(JAN_1_UTC_MIDNIGHT), "2024-01-01");
    assert_eq!(day_key(IST_JAN_2_MIDNIGHT - 1), "2024-01-01");
    assert_eq!(day_key(IST_JAN_2_MIDNIGHT), "2024-01-02");
    // Late UTC evening already belongs to the next IST day.
    assert_eq!(day_key(JAN_1_UTC_MIDNIGHT - 1), "2024-01-01");
}

#[test]
fn stale_day_counts_as_zero() {
    let guard = guard();
    let stored = daily(2, "2024-01-01");
    let now = IST_JAN_2_MIDNIGHT + 3_600_000;

    assert_eq!(guard.effective_count(Some(&stored), now), 0);
    assert!(guard.can_post(Some(&stored), now));
}

#[test]
fn limit_is_two_per_day_key() {
    let guard = guard();
    let now = JAN_1_UTC_MIDNIGHT + 3_600_000;

    assert!(guard.can_post(None, now));
    let first = guard.record_post(None, now);
    assert_eq!(first, daily(1, "2024-01-01"));
    assert!(guard.can_post(Some(&first), now));
    let second = guard.record_post(Some(&first), now);
    assert_eq!(second.count, 2);
    assert!(!guard.can_post(Some(&second), now));
}

#[test]
fn deleting_a_post_created_today_gives_the_slot_back() {
    let guard = guard();
    let now = JAN_1_UTC_MIDNIGHT + 7_200_000;
    let stored = daily(2, "2024-01-01");

    let updated = guard
        .record_deletion(Some(&stored), now - 3_600_000, now)
        .expect("same-day deletion decrements");
    assert_eq!(updated, daily(1, "2024-01-01"));
}

#[test]
fn deleting_yesterdays_post_leaves_today_alone() {
    let guard = guard();
    let now = IST_JAN_2_MIDNIGHT + 3_600_000;
    let stored = daily(1, "2024-01-02");
    let created_yesterday = JAN_1_UTC_MIDNIGHT + 3_600_000;

    assert!(guard
        .record_deletion(Some(&stored), created_yesterday, now)
        .is_none());
}

#[test]
fn deletion_with_a_stale_stored_key_is_ignored() {
    let guard = guard();
    let now = IST_JAN_2_MIDNIGHT + 3_600_000;
    let stored = daily(2, "2024-01-01");

    assert!(guard
        .record_deletion(Some(&stored), now - 60_000, now)
        .is_none());
}

#[test]
fn deletion_count_floors_at_zero() {
    let guard = guard();
    let now = JAN_1_UTC_MIDNIGHT + 3_600_000;
    let stored = daily(0, "2024-01-01");

    let updated = guard
        .record_deletion(Some(&stored), now, now)
        .expect("same-day deletion applies");
    assert_eq!(updated.count, 0);
}

#[test]
fn stale_day_reset_rolls_the_counter_over() {
    let guard = guard();
    let now = IST_JAN_2_MIDNIGHT + 60_000;

    let reset = guard
        .stale_day_reset(Some(&daily(2, "2024-01-01")), now)
        .expect("stale counter resets");
    assert_eq!(reset, daily(0, "2024-01-02"));

    assert!(guard
        .stale_day_reset(Some(&daily(1, "2024-01-02")), now)
        .is_none());
}
