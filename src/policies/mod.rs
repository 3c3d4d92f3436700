mod carry_over;
mod reset_daily;

use crate::rules::BreakCarryConfig;

pub use carry_over::CarryOverPolicy;
pub use reset_daily::ResetDailyPolicy;

/// Decides how much unbroken driving a new day inherits from the previous one.
pub trait BreakPolicy {
    fn carry_into_day(&self, boundary: &DayBoundary) -> f64;
}

pub struct DayBoundary {
    /// Index of the day about to start.
    pub day_index: usize,
    pub driving_since_break: f64,
}

pub fn build_break_policy(config: BreakCarryConfig) -> Box<dyn BreakPolicy> {
    match config {
        BreakCarryConfig::ResetDaily => Box::new(ResetDailyPolicy),
        BreakCarryConfig::CarryOver => Box::new(CarryOverPolicy),
    }
}
