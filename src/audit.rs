use std::fmt;

use crate::engine::{DISTANCE_EPSILON, MARKER_TOLERANCE};
use crate::events::EventKind;
use crate::rules::RuleSet;
use crate::state::DutyLog;

const HOURS_TOLERANCE: f64 = 1e-3;
const TIMELINE_TOLERANCE: f64 = 1e-9;

/// A rule a finished duty log fails to honor.
#[derive(Clone, Debug, PartialEq)]
pub enum Violation {
    MissingPickup,
    MissingDropoff,
    MissingSleep { day: usize },
    TimelineGap { day: usize, event: usize },
    DailyDrivingCap { day: usize, hours: f64 },
    MissingBreak { day: usize, hours: f64 },
    /// Unbroken driving that only exceeds the threshold when the previous
    /// day's tail is counted.
    CrossDayUnbrokenDriving { day: usize, hours: f64 },
    OnDutyWindow { day: usize, hours: f64 },
    MissedFuelMarker { marker: f64 },
    UnexpectedFuelStop { miles: f64 },
    DistanceMismatch { expected: f64, driven: f64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingPickup => write!(f, "log does not start with a pickup"),
            Violation::MissingDropoff => write!(f, "log does not end with a dropoff"),
            Violation::MissingSleep { day } => {
                write!(f, "day {} does not close with off-duty rest", day + 1)
            }
            Violation::TimelineGap { day, event } => {
                write!(f, "day {} event {} does not start where the previous ended", day + 1, event + 1)
            }
            Violation::DailyDrivingCap { day, hours } => {
                write!(f, "day {} drives {:.2}h over the daily cap", day + 1, hours)
            }
            Violation::MissingBreak { day, hours } => {
                write!(f, "day {} drives {:.2}h without a break", day + 1, hours)
            }
            Violation::CrossDayUnbrokenDriving { day, hours } => write!(
                f,
                "day {} reaches {:.2}h unbroken driving counting the previous day",
                day + 1,
                hours
            ),
            Violation::OnDutyWindow { day, hours } => {
                write!(f, "day {} drives after {:.2}h on duty", day + 1, hours)
            }
            Violation::MissedFuelMarker { marker } => {
                write!(f, "no fuel stop at mile {:.1}", marker)
            }
            Violation::UnexpectedFuelStop { miles } => {
                write!(f, "fuel stop at mile {:.1} matches no marker", miles)
            }
            Violation::DistanceMismatch { expected, driven } => write!(
                f,
                "driven {:.3} mi does not cover {:.3} mi",
                driven, expected
            ),
        }
    }
}

/// Checks a duty log against the rule set independently of how it was built.
pub fn audit(log: &DutyLog, rules: &RuleSet) -> Vec<Violation> {
    let mut findings = Vec::new();
    check_bracketing(log, &mut findings);
    check_timeline(log, &mut findings);

    let mut unbroken = 0.0;
    let mut miles = 0.0;
    let mut next_marker = 0usize;

    for day in &log.days {
        let driving = day.driving_hours();
        if driving > rules.max_driving_hours_per_day + HOURS_TOLERANCE {
            findings.push(Violation::DailyDrivingCap {
                day: day.index,
                hours: driving,
            });
        }

        let mut since_break = 0.0;
        let mut on_duty = 0.0;
        let mut break_flagged = false;
        let mut carry_flagged = false;
        let mut window_flagged = false;

        for event in &day.events {
            if event.kind.is_on_duty() {
                on_duty += event.duration_hours;
            }
            match event.kind {
                EventKind::Drive => {
                    since_break += event.duration_hours;
                    unbroken += event.duration_hours;
                    miles += event.miles;

                    let threshold = rules.break_after_driving_hours + HOURS_TOLERANCE;
                    if since_break > threshold && !break_flagged {
                        findings.push(Violation::MissingBreak {
                            day: day.index,
                            hours: since_break,
                        });
                        break_flagged = true;
                    } else if unbroken > threshold && !carry_flagged && !break_flagged {
                        findings.push(Violation::CrossDayUnbrokenDriving {
                            day: day.index,
                            hours: unbroken,
                        });
                        carry_flagged = true;
                    }

                    if on_duty > rules.on_duty_window_hours + HOURS_TOLERANCE && !window_flagged {
                        findings.push(Violation::OnDutyWindow {
                            day: day.index,
                            hours: on_duty,
                        });
                        window_flagged = true;
                    }
                }
                EventKind::Break => {
                    if event.duration_hours + HOURS_TOLERANCE >= rules.break_duration_hours {
                        since_break = 0.0;
                        unbroken = 0.0;
                    }
                }
                EventKind::Fuel => {
                    skip_passed_markers(log, &mut next_marker, miles, &mut findings);
                    match log.fuel_markers.get(next_marker) {
                        Some(&marker) if (miles - marker).abs() <= MARKER_TOLERANCE => {
                            next_marker += 1;
                        }
                        _ => findings.push(Violation::UnexpectedFuelStop { miles }),
                    }
                }
                _ => {}
            }
        }
    }

    skip_passed_markers(log, &mut next_marker, f64::INFINITY, &mut findings);

    if (miles - log.summary.distance_miles).abs() > DISTANCE_EPSILON {
        findings.push(Violation::DistanceMismatch {
            expected: log.summary.distance_miles,
            driven: miles,
        });
    }

    findings
}

fn skip_passed_markers(
    log: &DutyLog,
    next_marker: &mut usize,
    miles: f64,
    findings: &mut Vec<Violation>,
) {
    while let Some(&marker) = log.fuel_markers.get(*next_marker) {
        if marker >= miles - MARKER_TOLERANCE {
            break;
        }
        findings.push(Violation::MissedFuelMarker { marker });
        *next_marker += 1;
    }
}

fn check_bracketing(log: &DutyLog, findings: &mut Vec<Violation>) {
    if log.first_event().map(|event| event.kind) != Some(EventKind::Pickup) {
        findings.push(Violation::MissingPickup);
    }
    if log.last_event().map(|event| event.kind) != Some(EventKind::Dropoff) {
        findings.push(Violation::MissingDropoff);
    }

    let last_idx = log.days.len().saturating_sub(1);
    for (idx, day) in log.days.iter().enumerate() {
        let closing = if idx == last_idx {
            day.events
                .iter()
                .rev()
                .find(|event| event.kind != EventKind::Dropoff)
        } else {
            day.events.last()
        };
        if closing.map(|event| event.kind) != Some(EventKind::Sleep) {
            findings.push(Violation::MissingSleep { day: day.index });
        }
    }
}

fn check_timeline(log: &DutyLog, findings: &mut Vec<Violation>) {
    let mut previous_end: Option<f64> = None;
    for day in &log.days {
        for (idx, event) in day.events.iter().enumerate() {
            if let Some(end) = previous_end {
                if (event.start_hours - end).abs() > TIMELINE_TOLERANCE {
                    findings.push(Violation::TimelineGap {
                        day: day.index,
                        event: idx,
                    });
                }
            }
            previous_end = Some(event.end_hours());
        }
    }
}
