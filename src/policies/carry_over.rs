use crate::policies::{BreakPolicy, DayBoundary};

/// Overnight rest does not clear the break counter; only a break event does.
#[derive(Default)]
pub struct CarryOverPolicy;

impl BreakPolicy for CarryOverPolicy {
    fn carry_into_day(&self, boundary: &DayBoundary) -> f64 {
        if boundary.day_index == 0 {
            return 0.0;
        }
        boundary.driving_since_break
    }
}
