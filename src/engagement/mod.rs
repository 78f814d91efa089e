pub mod growth;
pub mod stage;

pub use growth::{advance_views, ViewAdvance};
pub use stage::{GrowthPlan, ViewStage, MAX_DURATION_HOURS, MIN_DURATION_HOURS};
