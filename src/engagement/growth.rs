use rand::Rng;

use crate::engagement::GrowthPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewAdvance {
    pub views: u64,
    pub boost_applied: bool,
}

// Views only ever move up: during growth they track elapsed progress capped at
// the target, after the duration they catch up to the target exactly once and
// then receive a single 2-3 view boost. Returns None when nothing changes.
pub fn advance_views(
    plan: &GrowthPlan,
    current_views: u64,
    now_ms: i64,
    rng: &mut impl Rng,
) -> Option<ViewAdvance> {
    let duration = plan.duration_ms();
    if duration <= 0 {
        return None;
    }
    let elapsed = now_ms - plan.stage_assigned_at;

    if elapsed < duration {
        let progress = elapsed as f64 / duration as f64;
        let expected = (progress * plan.target_views as f64).floor() as u64;
        let next = current_views.max(expected.min(plan.target_views));
        if next > current_views {
            return Some(ViewAdvance {
                views: next,
                boost_applied: false,
            });
        }
        return None;
    }

    if current_views < plan.target_views {
        return Some(ViewAdvance {
            views: plan.target_views,
            boost_applied: false,
        });
    }

    if !plan.final_view_boost_applied {
        return Some(ViewAdvance {
            views: current_views + rng.gen_range(2..=3),
            boost_applied: true,
        });
    }

    None
}
