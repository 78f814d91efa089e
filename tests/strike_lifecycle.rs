use std::collections::BTreeMap;

use engagement_sim::config::StrikeConfig;
use engagement_sim::copyright::{
    ClaimAction, ClaimStatus, CopyrightClaim, CopyrightStrike, StrikePolicy, StrikeStatus,
};
use engagement_sim::{MediaKind, Post};

const HOUR_MS: i64 = 3_600_000;

fn policy() -> StrikePolicy {
    StrikePolicy::new(StrikeConfig::default())
}

fn strike(id: &str, status: StrikeStatus, expires_at: i64) -> CopyrightStrike {
    CopyrightStrike {
        strike_id: id.to_string(),
        claimant_id: "claimant".to_string(),
        claimant_name: "Claimant".to_string(),
        post_id: "post".to_string(),
        post_content: "copied content".to_string(),
        media_url: None,
        received_at: expires_at - 48 * HOUR_MS,
        expires_at,
        status,
    }
}

fn strikes(entries: Vec<CopyrightStrike>) -> BTreeMap<String, CopyrightStrike> {
    entries
        .into_iter()
        .map(|strike| (strike.strike_id.clone(), strike))
        .collect()
}

#[test]
fn active_strikes_expire_below_the_threshold() {
    let policy = policy();
    let now = 100 * HOUR_MS;
    let set = strikes(vec![
        strike("s1", StrikeStatus::Active, now - HOUR_MS),
        strike("s2", StrikeStatus::Active, now + HOUR_MS),
    ]);

    assert_eq!(policy.due_expirations(&set, now), vec!["s1".to_string()]);
}

#[test]
fn three_active_strikes_never_expire() {
    let policy = policy();
    let now = 100 * HOUR_MS;
    let set = strikes(vec![
        strike("s1", StrikeStatus::Active, now - 3 * HOUR_MS),
        strike("s2", StrikeStatus::Active, now - 2 * HOUR_MS),
        strike("s3", StrikeStatus::Active, now - HOUR_MS),
    ]);

    assert!(policy.is_lockout(&set));
    assert!(policy.due_expirations(&set, now).is_empty());
}

#[test]
fn retraction_reopens_expiry_evaluation() {
    let policy = policy();
    let now = 100 * HOUR_MS;
    let mut set = strikes(vec![
        strike("s1", StrikeStatus::Active, now - 3 * HOUR_MS),
        strike("s2", StrikeStatus::Active, now - 2 * HOUR_MS),
        strike("s3", StrikeStatus::Active, now - HOUR_MS),
    ]);

    set.get_mut("s2").expect("strike exists").status = StrikeStatus::Retracted;

    assert_eq!(policy.active_count(&set), 2);
    assert!(!policy.is_lockout(&set));
    let due = policy.due_expirations(&set, now);
    assert_eq!(due.len(), 2);
    assert!(due.contains(&"s1".to_string()));
    assert!(due.contains(&"s3".to_string()));
}

#[test]
fn terminal_strikes_are_not_counted_or_expired() {
    let policy = policy();
    let now = 100 * HOUR_MS;
    let set = strikes(vec![
        strike("s1", StrikeStatus::Expired, now - 3 * HOUR_MS),
        strike("s2", StrikeStatus::Retracted, now - 2 * HOUR_MS),
        strike("s3", StrikeStatus::Active, now + HOUR_MS),
    ]);

    assert_eq!(policy.active_count(&set), 1);
    assert!(policy.due_expirations(&set, now).is_empty());
}

#[test]
fn issued_strikes_open_a_48_hour_window() {
    let policy = policy();
    let now = 500 * HOUR_MS;
    let claim = CopyrightClaim {
        id: "claim-1".to_string(),
        claimant_id: "claimant".to_string(),
        claimant_name: "Claimant".to_string(),
        accused_user_id: "accused".to_string(),
        accused_username: "Accused".to_string(),
        post_id: "post-1".to_string(),
        action: ClaimAction::StrikeOnly,
        original_content_url: "https://example.com/original".to_string(),
        date: now - HOUR_MS,
        status: ClaimStatus::Approved,
    };
    let post = Post {
        id: "post-1".to_string(),
        author_id: "accused".to_string(),
        author_name: "Accused".to_string(),
        content: "copied content".to_string(),
        media: MediaKind::None,
        media_url: None,
        likes: BTreeMap::new(),
        comments: BTreeMap::new(),
        views: 10,
        created_at: 0,
        growth: None,
        is_copyrighted: false,
    };

    let issued = policy.issue(&claim, &post, now);
    assert_eq!(issued.strike_id, "claim-1");
    assert_eq!(issued.status, StrikeStatus::Active);
    assert_eq!(issued.received_at, now);
    assert_eq!(issued.expires_at, now + 48 * HOUR_MS);
    assert_eq!(issued.post_content, "copied content");
}

#[test]
fn claim_status_transitions_are_monotonic() {
    assert!(ClaimStatus::Pending.can_become(ClaimStatus::Approved));
    assert!(ClaimStatus::Pending.can_become(ClaimStatus::Rejected));
    assert!(ClaimStatus::Approved.can_become(ClaimStatus::Retracted));

    assert!(!ClaimStatus::Pending.can_become(ClaimStatus::Retracted));
    assert!(!ClaimStatus::Rejected.can_become(ClaimStatus::Approved));
    assert!(!ClaimStatus::Retracted.can_become(ClaimStatus::Approved));
    assert!(!ClaimStatus::Approved.can_become(ClaimStatus::Rejected));
}

#[test]
fn strike_status_has_no_way_out_of_terminal_states() {
    assert!(StrikeStatus::Active.can_become(StrikeStatus::Expired));
    assert!(StrikeStatus::Active.can_become(StrikeStatus::Retracted));

    assert!(!StrikeStatus::Expired.can_become(StrikeStatus::Active));
    assert!(!StrikeStatus::Expired.can_become(StrikeStatus::Retracted));
    assert!(!StrikeStatus::Retracted.can_become(StrikeStatus::Expired));
}

#[test]
fn claim_actions_map_to_their_effects() {
    assert!(ClaimAction::StrikeOnly.issues_strike());
    assert!(ClaimAction::DeleteAndStrike.issues_strike());
    assert!(!ClaimAction::DeleteOnly.issues_strike());

    assert!(ClaimAction::DeleteOnly.deletes_post());
    assert!(ClaimAction::DeleteAndStrike.deletes_post());
    assert!(!ClaimAction::StrikeOnly.deletes_post());
}
