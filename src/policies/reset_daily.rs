use crate::policies::{BreakPolicy, DayBoundary};

#[derive(Default)]
pub struct ResetDailyPolicy;

impl BreakPolicy for ResetDailyPolicy {
    fn carry_into_day(&self, _boundary: &DayBoundary) -> f64 {
        0.0
    }
}
