use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_DURATION_HOURS: i64 = 1;
pub const MAX_DURATION_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewStage {
    A,
    B,
    C,
    D,
    E,
}

impl ViewStage {
    // Bucket boundaries are half-open: a roll of exactly 0.04 lands in D.
    pub fn from_roll(roll: f64) -> Self {
        if roll < 0.04 {
            ViewStage::E
        } else if roll < 0.22 {
            ViewStage::D
        } else if roll < 0.37 {
            ViewStage::B
        } else if roll < 0.47 {
            ViewStage::A
        } else {
            ViewStage::C
        }
    }

    pub fn target_range(self) -> (u64, u64) {
        match self {
            ViewStage::A => (1, 5),
            ViewStage::B => (10, 28),
            ViewStage::C => (28, 78),
            ViewStage::D => (78, 150),
            ViewStage::E => (150, 1500),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewStage::A => "A",
            ViewStage::B => "B",
            ViewStage::C => "C",
            ViewStage::D => "D",
            ViewStage::E => "E",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPlan {
    pub view_stage: ViewStage,
    pub target_views: u64,
    pub stage_assigned_at: i64,
    pub target_completed_in: i64,
    #[serde(default)]
    pub final_view_boost_applied: bool,
}

impl GrowthPlan {
    pub fn assign(rng: &mut impl Rng, now_ms: i64) -> Self {
        let roll = rng.gen::<f64>();
        Self::with_roll(roll, rng, now_ms)
    }

    pub fn with_roll(roll: f64, rng: &mut impl Rng, now_ms: i64) -> Self {
        let stage = ViewStage::from_roll(roll);
        let (low, high) = stage.target_range();
        Self {
            view_stage: stage,
            target_views: rng.gen_range(low..=high),
            stage_assigned_at: now_ms,
            target_completed_in: rng.gen_range(MIN_DURATION_HOURS..=MAX_DURATION_HOURS),
            final_view_boost_applied: false,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.target_completed_in * 3_600_000
    }
}
