use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::TIME_EPSILON;
use crate::error::{InvalidInput, Result};

/// Regulatory constants and policy choices that drive a simulation run.
///
/// Defaults follow the US property-carrying limits. Every field may be
/// omitted from a config file, in which case the default is used.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RuleSet {
    pub max_driving_hours_per_day: f64,
    pub on_duty_window_hours: f64,
    pub break_after_driving_hours: f64,
    pub break_duration_hours: f64,
    pub pickup_dropoff_hours: f64,
    pub fuel_stop_hours: f64,
    pub fuel_range_miles: f64,
    pub off_duty_rest_hours: f64,
    pub cycle_max_hours: f64,
    pub cycle_days: u32,
    /// Upper bound on a single drive event.
    pub chunk_hours: f64,
    pub break_carry: BreakCarryConfig,
    pub duty_window: DutyWindowConfig,
    pub cycle_limit: CycleLimitConfig,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            max_driving_hours_per_day: 11.0,
            on_duty_window_hours: 14.0,
            break_after_driving_hours: 8.0,
            break_duration_hours: 0.5,
            pickup_dropoff_hours: 1.0,
            fuel_stop_hours: 0.5,
            fuel_range_miles: 1000.0,
            off_duty_rest_hours: 10.0,
            cycle_max_hours: 70.0,
            cycle_days: 8,
            chunk_hours: 1.0,
            break_carry: BreakCarryConfig::default(),
            duty_window: DutyWindowConfig::default(),
            cycle_limit: CycleLimitConfig::default(),
        }
    }
}

impl RuleSet {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_driving_hours_per_day", self.max_driving_hours_per_day),
            ("on_duty_window_hours", self.on_duty_window_hours),
            ("break_after_driving_hours", self.break_after_driving_hours),
            ("fuel_range_miles", self.fuel_range_miles),
            ("cycle_max_hours", self.cycle_max_hours),
            ("chunk_hours", self.chunk_hours),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(rules_error(format!("{} must be > 0 (got {})", name, value)));
            }
        }

        let non_negative = [
            ("break_duration_hours", self.break_duration_hours),
            ("pickup_dropoff_hours", self.pickup_dropoff_hours),
            ("fuel_stop_hours", self.fuel_stop_hours),
            ("off_duty_rest_hours", self.off_duty_rest_hours),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(rules_error(format!(
                    "{} must be >= 0 (got {})",
                    name, value
                )));
            }
        }

        // Limits that size a drive chunk must leave room for at least one.
        let budgets = [
            ("max_driving_hours_per_day", self.max_driving_hours_per_day),
            ("break_after_driving_hours", self.break_after_driving_hours),
            ("chunk_hours", self.chunk_hours),
        ];
        for (name, value) in budgets {
            if value <= TIME_EPSILON {
                return Err(rules_error(format!(
                    "{} must exceed {:e}h (got {})",
                    name, TIME_EPSILON, value
                )));
            }
        }

        if self.cycle_days == 0 {
            return Err(rules_error("cycle_days must be > 0".to_string()));
        }

        if matches!(self.duty_window, DutyWindowConfig::Enforce)
            && self.on_duty_window_hours - self.pickup_dropoff_hours <= TIME_EPSILON
        {
            return Err(rules_error(format!(
                "on_duty_window_hours ({}) must exceed pickup_dropoff_hours ({}) when enforced",
                self.on_duty_window_hours, self.pickup_dropoff_hours
            )));
        }

        Ok(())
    }
}

fn rules_error(message: String) -> crate::error::Error {
    InvalidInput::Rules(message).into()
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BreakCarryConfig {
    #[default]
    ResetDaily,
    CarryOver,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DutyWindowConfig {
    #[default]
    Ignore,
    Enforce,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CycleLimitConfig {
    Ignore,
    #[default]
    Flag,
    Reject,
}

impl fmt::Display for BreakCarryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BreakCarryConfig::ResetDaily => "reset-daily",
            BreakCarryConfig::CarryOver => "carry-over",
        };
        f.write_str(label)
    }
}

impl fmt::Display for DutyWindowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DutyWindowConfig::Ignore => "ignore",
            DutyWindowConfig::Enforce => "enforce",
        };
        f.write_str(label)
    }
}

impl fmt::Display for CycleLimitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleLimitConfig::Ignore => "ignore",
            CycleLimitConfig::Flag => "flag",
            CycleLimitConfig::Reject => "reject",
        };
        f.write_str(label)
    }
}
