use rand::rngs::StdRng;
use rand::SeedableRng;

use engagement_sim::engagement::{GrowthPlan, ViewStage, MAX_DURATION_HOURS, MIN_DURATION_HOURS};

#[test]
fn roll_buckets_match_reference_distribution() {
    assert_eq!(ViewStage::from_roll(0.0), ViewStage::E);
    assert_eq!(ViewStage::from_roll(0.039), ViewStage::E);
    assert_eq!(ViewStage::from_roll(0.04), ViewStage::D);
    assert_eq!(ViewStage::from_roll(0.219), ViewStage::D);
    assert_eq!(ViewStage::from_roll(0.22), ViewStage::B);
    assert_eq!(ViewStage::from_roll(0.369), ViewStage::B);
    assert_eq!(ViewStage::from_roll(0.37), ViewStage::A);
    assert_eq!(ViewStage::from_roll(0.469), ViewStage::A);
    assert_eq!(ViewStage::from_roll(0.47), ViewStage::C);
    assert_eq!(ViewStage::from_roll(0.999), ViewStage::C);
}

#[test]
fn target_ranges_per_stage() {
    assert_eq!(ViewStage::A.target_range(), (1, 5));
    assert_eq!(ViewStage::B.target_range(), (10, 28));
    assert_eq!(ViewStage::C.target_range(), (28, 78));
    assert_eq!(ViewStage::D.target_range(), (78, 150));
    assert_eq!(ViewStage::E.target_range(), (150, 1500));
}

#[test]
fn viral_rolls_draw_targets_in_range() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let plan = GrowthPlan::with_roll(0.01, &mut rng, 0);
        assert_eq!(plan.view_stage, ViewStage::E);
        assert!(plan.target_views >= 150 && plan.target_views <= 1500);
        assert!(plan.target_completed_in >= MIN_DURATION_HOURS);
        assert!(plan.target_completed_in <= MAX_DURATION_HOURS);
        assert!(!plan.final_view_boost_applied);
    }
}

#[test]
fn every_draw_stays_within_its_stage_range() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..500 {
        let plan = GrowthPlan::assign(&mut rng, 123);
        let (low, high) = plan.view_stage.target_range();
        assert!(plan.target_views >= low && plan.target_views <= high);
        assert_eq!(plan.stage_assigned_at, 123);
    }
}
