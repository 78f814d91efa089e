use std::collections::BTreeMap;

use engagement_sim::config::RevenueConfig;
use engagement_sim::revenue::RevenueCalculator;
use engagement_sim::{MediaKind, Post, User, Withdrawal, WithdrawalStatus};

fn calculator() -> RevenueCalculator {
    RevenueCalculator::new(RevenueConfig::default())
}

fn post(author: &str, views: u64, media: MediaKind, is_copyrighted: bool) -> Post {
    Post {
        id: format!("post-{}", views),
        author_id: author.to_string(),
        author_name: author.to_string(),
        content: "hello".to_string(),
        media,
        media_url: None,
        likes: BTreeMap::new(),
        comments: BTreeMap::new(),
        views,
        created_at: 0,
        growth: None,
        is_copyrighted,
    }
}

fn withdrawal(id: &str, total: f64, status: WithdrawalStatus) -> Withdrawal {
    Withdrawal {
        withdrawal_id: id.to_string(),
        user_id: "author".to_string(),
        username: "author".to_string(),
        amount: total,
        fee: 0.0,
        total_deducted: total,
        redeem_code: None,
        timestamp: 0,
        status,
    }
}

#[test]
fn rates_per_media_kind_at_one_unit_of_views() {
    let calc = calculator();
    assert!((calc.post_revenue(1250, MediaKind::Video, false, true) - 25.0).abs() < 1e-6);
    assert!((calc.post_revenue(1250, MediaKind::Image, false, true) - 15.0).abs() < 1e-6);
    assert!((calc.post_revenue(1250, MediaKind::None, false, true) - 10.0).abs() < 1e-6);
}

#[test]
fn copyrighted_posts_earn_nothing() {
    let calc = calculator();
    assert!(calc.post_revenue(1_000_000, MediaKind::Video, true, true).abs() < 1e-6);
}

#[test]
fn unmonetized_authors_earn_nothing() {
    let calc = calculator();
    assert!(calc.post_revenue(1_000_000, MediaKind::Video, false, false).abs() < 1e-6);
}

#[test]
fn revenue_keeps_fractional_precision() {
    let calc = calculator();
    assert!((calc.post_revenue(100, MediaKind::None, false, true) - 0.8).abs() < 1e-9);
}

#[test]
fn aggregate_sums_posts_and_skips_copyrighted() {
    let calc = calculator();
    let posts = vec![
        post("author", 1250, MediaKind::Video, false),
        post("author", 1250, MediaKind::None, false),
        post("author", 1250, MediaKind::Image, true),
    ];

    let total = calc.aggregate_revenue(posts.iter(), true);
    assert!((total - 35.0).abs() < 1e-6);
}

#[test]
fn available_balance_subtracts_all_withdrawals_and_may_go_negative() {
    let calc = calculator();
    let posts = vec![post("author", 1250, MediaKind::None, false)];
    let mut user = User::new("author".to_string(), "author".to_string());
    user.is_monetized = true;
    user.withdrawals.insert(
        "w1".to_string(),
        withdrawal("w1", 6.0, WithdrawalStatus::Cleared),
    );
    user.withdrawals.insert(
        "w2".to_string(),
        withdrawal("w2", 7.0, WithdrawalStatus::Pending),
    );

    let balance = calc.available_balance(posts.iter(), &user);
    assert!((balance - (10.0 - 13.0)).abs() < 1e-6);
}

#[test]
fn account_eligibility_boundaries() {
    let calc = calculator();
    assert!(calc.account_eligible(2000, 25));
    assert!(!calc.account_eligible(1999, 25));
    assert!(!calc.account_eligible(2000, 24));
}

#[test]
fn post_eligibility_requires_strictly_more_views() {
    let calc = calculator();
    assert!(!calc.post_eligible(1000, 10));
    assert!(calc.post_eligible(1001, 10));
    assert!(!calc.post_eligible(1001, 9));
}
