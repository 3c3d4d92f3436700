use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::events::{DutyEvent, EventKind, FUEL_STOP_LABEL, REST_BREAK_LABEL, SLEEP_LABEL};
use crate::policies::{build_break_policy, BreakPolicy, DayBoundary};
use crate::rules::{CycleLimitConfig, DutyWindowConfig, RuleSet};
use crate::state::{CycleReport, Day, DayState, DutyLog, TripSummary};
use crate::trip::TripRequest;

/// Distance within which the trip counts as complete.
pub const DISTANCE_EPSILON: f64 = 0.001;
pub const TIME_EPSILON: f64 = 1e-6;
/// A chunk ending this close to a marker triggers the fuel stop.
pub const MARKER_TOLERANCE: f64 = 0.05;
const MIN_DRIVING_HOURS: f64 = 0.1;
const MIN_SPEED_MPH: f64 = 1e-6;

pub struct DutyCycleSimulator {
    pub rules: RuleSet,
    pub break_policy: Box<dyn BreakPolicy>,
}

/// Trip-wide progress shared by every day of a run.
struct TripCursor<'a> {
    total_miles: f64,
    avg_speed_mph: f64,
    markers: &'a [f64],
    next_marker: usize,
    clock: f64,
    miles_done: f64,
    driving_since_break: f64,
}

impl TripCursor<'_> {
    fn remaining_miles(&self) -> f64 {
        self.total_miles - self.miles_done
    }

    fn is_complete(&self) -> bool {
        self.miles_done >= self.total_miles - DISTANCE_EPSILON
    }

    /// Sizes the next drive chunk from a time budget, then trims it so it
    /// neither passes the next fuel marker nor the end of the trip.
    fn next_chunk(&self, max_hours: f64) -> (f64, f64) {
        let speed = self.avg_speed_mph.max(MIN_SPEED_MPH);
        let mut hours = max_hours;
        let mut miles = hours * speed;

        if let Some(&marker) = self.markers.get(self.next_marker) {
            if self.miles_done + miles >= marker - DISTANCE_EPSILON {
                miles = marker - self.miles_done;
                hours = miles / speed;
            }
        }

        let remaining = self.remaining_miles();
        if miles >= remaining - DISTANCE_EPSILON {
            miles = remaining;
            hours = miles / speed;
        }

        (hours, miles)
    }

    fn consume_marker(&mut self) -> bool {
        match self.markers.get(self.next_marker) {
            Some(&marker) if (self.miles_done - marker).abs() <= MARKER_TOLERANCE => {
                self.next_marker += 1;
                true
            }
            _ => false,
        }
    }

    fn push(&mut self, day: &mut Day, event: DutyEvent) {
        trace!(
            day = day.index,
            kind = %event.kind,
            start = event.start_hours,
            duration = event.duration_hours,
            miles = event.miles,
            "event"
        );
        self.clock = event.end_hours();
        day.events.push(event);
    }
}

impl DutyCycleSimulator {
    pub fn new(rules: RuleSet) -> Self {
        let break_policy = build_break_policy(rules.break_carry);
        Self {
            rules,
            break_policy,
        }
    }

    pub fn with_policy(rules: RuleSet, break_policy: Box<dyn BreakPolicy>) -> Self {
        Self {
            rules,
            break_policy,
        }
    }

    pub fn run(&self, request: &TripRequest) -> Result<DutyLog> {
        self.rules.validate()?;
        request.validate()?;
        self.plan(request)
    }

    fn plan(&self, request: &TripRequest) -> Result<DutyLog> {
        let origin = request
            .origin()
            .map(|waypoint| waypoint.name.clone())
            .unwrap_or_default();
        let destination = request
            .destination()
            .map(|waypoint| waypoint.name.clone())
            .unwrap_or_default();

        let markers = fuel_markers(request.total_distance_miles, self.rules.fuel_range_miles);
        let avg_speed_mph =
            request.total_distance_miles / request.total_driving_hours.max(MIN_DRIVING_HOURS);
        let mut cursor = TripCursor {
            total_miles: request.total_distance_miles,
            avg_speed_mph,
            markers: &markers,
            next_marker: 0,
            clock: 0.0,
            miles_done: 0.0,
            driving_since_break: 0.0,
        };

        let mut days = Vec::new();
        loop {
            let miles_before = cursor.miles_done;
            let day = self.plan_day(&mut cursor, days.len(), &origin);
            debug!(
                day = day.index,
                driving_hours = day.driving_hours(),
                on_duty_hours = day.on_duty_hours(),
                miles = day.miles(),
                miles_done = cursor.miles_done,
                "day planned"
            );
            let index = day.index;
            days.push(day);
            if cursor.is_complete() {
                break;
            }
            if cursor.miles_done <= miles_before {
                return Err(Error::NoProgress {
                    day: index + 1,
                    remaining: cursor.remaining_miles(),
                });
            }
        }

        let dropoff = DutyEvent::new(
            EventKind::Dropoff,
            cursor.clock,
            self.rules.pickup_dropoff_hours,
        )
        .at(destination.clone());
        if let Some(last) = days.last_mut() {
            cursor.push(last, dropoff);
        }

        let summary = summarize(&days, request.total_distance_miles, avg_speed_mph);
        let cycle = self.check_cycle(request.cycle_hours_used, summary.on_duty_hours)?;

        info!(
            origin = %origin,
            destination = %destination,
            days = summary.days,
            miles = summary.driven_miles,
            fuel_stops = summary.fuel_stops,
            breaks = summary.breaks,
            "duty log planned"
        );

        Ok(DutyLog {
            origin,
            destination,
            cycle_hours_used: request.cycle_hours_used,
            fuel_markers: markers,
            days,
            summary,
            cycle,
        })
    }

    fn plan_day(&self, cursor: &mut TripCursor, index: usize, origin: &str) -> Day {
        let rules = &self.rules;
        let mut day = Day::new(index);
        let boundary = DayBoundary {
            day_index: index,
            driving_since_break: cursor.driving_since_break,
        };
        let carried = self
            .break_policy
            .carry_into_day(&boundary)
            .max(0.0)
            .min(rules.break_after_driving_hours);
        let mut state = DayState {
            driving_since_break: carried,
            ..DayState::default()
        };

        if index == 0 {
            let pickup = DutyEvent::new(EventKind::Pickup, cursor.clock, rules.pickup_dropoff_hours)
                .at(origin);
            cursor.push(&mut day, pickup);
            state.on_duty_hours += rules.pickup_dropoff_hours;
        }

        while !cursor.is_complete()
            && state.driving_hours < rules.max_driving_hours_per_day - TIME_EPSILON
            && self.window_remaining(&state) > TIME_EPSILON
        {
            let budget = rules
                .chunk_hours
                .min(rules.max_driving_hours_per_day - state.driving_hours)
                .min(rules.break_after_driving_hours - state.driving_since_break)
                .min(self.window_remaining(&state));
            // A break already due leaves no budget; take it before driving.
            if budget > TIME_EPSILON {
                let (hours, miles) = cursor.next_chunk(budget);

                cursor.push(&mut day, DutyEvent::drive(cursor.clock, hours, miles));
                cursor.miles_done += miles;
                state.driving_hours += hours;
                state.on_duty_hours += hours;
                state.driving_since_break += hours;

                if cursor.consume_marker() {
                    let fuel =
                        DutyEvent::new(EventKind::Fuel, cursor.clock, rules.fuel_stop_hours)
                            .at(FUEL_STOP_LABEL);
                    cursor.push(&mut day, fuel);
                    state.on_duty_hours += rules.fuel_stop_hours;
                }
            }

            if state.driving_since_break >= rules.break_after_driving_hours - TIME_EPSILON {
                let rest = DutyEvent::new(EventKind::Break, cursor.clock, rules.break_duration_hours)
                    .at(REST_BREAK_LABEL);
                cursor.push(&mut day, rest);
                state.on_duty_hours += rules.break_duration_hours;
                state.driving_since_break = 0.0;
            }
        }

        cursor.driving_since_break = state.driving_since_break;
        let sleep = DutyEvent::new(EventKind::Sleep, cursor.clock, rules.off_duty_rest_hours)
            .at(SLEEP_LABEL);
        cursor.push(&mut day, sleep);
        day
    }

    fn window_remaining(&self, state: &DayState) -> f64 {
        match self.rules.duty_window {
            DutyWindowConfig::Ignore => f64::INFINITY,
            DutyWindowConfig::Enforce => self.rules.on_duty_window_hours - state.on_duty_hours,
        }
    }

    fn check_cycle(&self, hours_used: f64, trip_on_duty_hours: f64) -> Result<Option<CycleReport>> {
        if matches!(self.rules.cycle_limit, CycleLimitConfig::Ignore) {
            return Ok(None);
        }

        let projected_hours = hours_used + trip_on_duty_hours;
        let exceeded = projected_hours > self.rules.cycle_max_hours + TIME_EPSILON;
        if exceeded {
            if matches!(self.rules.cycle_limit, CycleLimitConfig::Reject) {
                return Err(Error::CycleLimitExceeded {
                    projected: projected_hours,
                    max: self.rules.cycle_max_hours,
                });
            }
            warn!(
                projected_hours,
                max_hours = self.rules.cycle_max_hours,
                "trip exceeds the duty cycle limit"
            );
        }

        Ok(Some(CycleReport {
            hours_used,
            trip_on_duty_hours,
            projected_hours,
            max_hours: self.rules.cycle_max_hours,
            cycle_days: self.rules.cycle_days,
            exceeded,
        }))
    }
}

pub fn simulate(request: &TripRequest, rules: &RuleSet) -> Result<DutyLog> {
    DutyCycleSimulator::new(rules.clone()).run(request)
}

/// Every multiple of `range_miles` strictly below `total_miles`.
pub fn fuel_markers(total_miles: f64, range_miles: f64) -> Vec<f64> {
    if !total_miles.is_finite() || !range_miles.is_finite() || range_miles <= 0.0 {
        return Vec::new();
    }
    let mut markers = Vec::new();
    let mut step = 1u64;
    loop {
        let next = range_miles * step as f64;
        if next >= total_miles {
            break;
        }
        markers.push(round_to(next, 1));
        step += 1;
    }
    markers
}

fn summarize(days: &[Day], distance_miles: f64, average_speed_mph: f64) -> TripSummary {
    let mut summary = TripSummary {
        distance_miles,
        driven_miles: 0.0,
        driving_hours: 0.0,
        average_speed_mph: round_to(average_speed_mph, 2),
        on_duty_hours: 0.0,
        off_duty_hours: 0.0,
        elapsed_hours: 0.0,
        fuel_stops: 0,
        breaks: 0,
        days: days.len(),
    };

    for event in days.iter().flat_map(|day| day.events.iter()) {
        summary.driven_miles += event.miles;
        match event.kind {
            EventKind::Drive => summary.driving_hours += event.duration_hours,
            EventKind::Fuel => summary.fuel_stops += 1,
            EventKind::Break => summary.breaks += 1,
            _ => {}
        }
        if event.kind.is_on_duty() {
            summary.on_duty_hours += event.duration_hours;
        } else {
            summary.off_duty_hours += event.duration_hours;
        }
        summary.elapsed_hours = event.end_hours();
    }

    debug_assert!((summary.driven_miles - distance_miles).abs() <= DISTANCE_EPSILON);
    summary
}

pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    if decimals == 0 {
        return value.round();
    }
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::BreakCarryConfig;
    use crate::trip::Waypoint;

    fn waypoints() -> Vec<Waypoint> {
        vec![
            Waypoint::named("Start"),
            Waypoint::named("PickupPoint"),
            Waypoint::named("DropoffPoint"),
        ]
    }

    fn request(miles: f64, hours: f64, cycle_used: f64) -> TripRequest {
        TripRequest::new(miles, hours, waypoints(), cycle_used)
    }

    fn kinds(day: &Day) -> Vec<EventKind> {
        day.events.iter().map(|event| event.kind).collect()
    }

    #[test]
    fn fuel_markers_stop_short_of_trip_end() {
        assert_eq!(fuel_markers(2200.0, 1000.0), vec![1000.0, 2000.0]);
        assert_eq!(fuel_markers(2000.0, 1000.0), vec![1000.0]);
        assert!(fuel_markers(550.0, 1000.0).is_empty());
        assert_eq!(fuel_markers(2500.0, 750.0), vec![750.0, 1500.0, 2250.0]);
        assert_eq!(fuel_markers(70.0, 33.33), vec![33.3, 66.7]);
    }

    #[test]
    fn fuel_markers_reject_degenerate_ranges() {
        assert!(fuel_markers(500.0, 0.0).is_empty());
        assert!(fuel_markers(f64::INFINITY, 100.0).is_empty());
    }

    #[test]
    fn single_day_trip_matches_expected_sequence() {
        let log = simulate(&request(550.0, 10.0, 5.0), &RuleSet::default()).unwrap();
        assert_eq!(log.days.len(), 1);

        let mut expected = vec![EventKind::Pickup];
        expected.extend(std::iter::repeat(EventKind::Drive).take(8));
        expected.push(EventKind::Break);
        expected.extend(std::iter::repeat(EventKind::Drive).take(2));
        expected.push(EventKind::Sleep);
        expected.push(EventKind::Dropoff);
        assert_eq!(kinds(&log.days[0]), expected);

        let day = &log.days[0];
        assert_eq!(day.events[0].location.as_deref(), Some("Start"));
        assert_eq!(day.events[9].start_hours, 9.0);
        assert_eq!(day.events[12].start_hours, 11.5);
        assert_eq!(day.events[13].start_hours, 21.5);
        assert_eq!(day.events[13].location.as_deref(), Some("DropoffPoint"));
        assert_eq!(log.summary.driving_hours, 10.0);
        assert_eq!(log.summary.driven_miles, 550.0);
        assert_eq!(log.summary.on_duty_hours, 12.5);
        assert_eq!(log.summary.off_duty_hours, 10.0);
        assert_eq!(log.summary.elapsed_hours, 22.5);
        assert_eq!(log.summary.fuel_stops, 0);
        assert!(log.fuel_markers.is_empty());
    }

    #[test]
    fn multi_day_trip_fuels_at_each_marker() {
        let log = simulate(&request(2200.0, 24.0, 0.0), &RuleSet::default()).unwrap();
        assert_eq!(log.days.len(), 3);
        assert_eq!(log.fuel_markers, vec![1000.0, 2000.0]);
        assert_eq!(log.summary.fuel_stops, 2);

        let breaks: Vec<usize> = log.days.iter().map(|day| day.count(EventKind::Break)).collect();
        assert_eq!(breaks, vec![1, 1, 0]);

        let mut miles = 0.0;
        let mut fuel_at = Vec::new();
        for event in log.events() {
            miles += event.miles;
            if event.kind == EventKind::Fuel {
                fuel_at.push(miles);
            }
        }
        assert_eq!(fuel_at.len(), 2);
        assert!((fuel_at[0] - 1000.0).abs() < MARKER_TOLERANCE);
        assert!((fuel_at[1] - 2000.0).abs() < MARKER_TOLERANCE);
        assert!((miles - 2200.0).abs() < DISTANCE_EPSILON);

        for day in &log.days {
            assert!(day.driving_hours() <= 11.0 + 1e-3);
        }
    }

    #[test]
    fn carry_over_policy_breaks_earlier_on_following_days() {
        let rules = RuleSet {
            break_carry: BreakCarryConfig::CarryOver,
            ..RuleSet::default()
        };
        let log = simulate(&request(2200.0, 24.0, 0.0), &rules).unwrap();
        let breaks: Vec<usize> = log.days.iter().map(|day| day.count(EventKind::Break)).collect();
        assert_eq!(breaks, vec![1, 1, 1]);

        let day_two = &log.days[1];
        let driving_before_break: f64 = day_two
            .events
            .iter()
            .take_while(|event| event.kind != EventKind::Break)
            .filter(|event| event.kind == EventKind::Drive)
            .map(|event| event.duration_hours)
            .sum();
        assert!((driving_before_break - 5.0).abs() < 1e-6);
    }

    #[test]
    fn final_chunk_never_overshoots_total() {
        let log = simulate(&request(100.0, 1.5, 0.0), &RuleSet::default()).unwrap();
        let drives: Vec<&DutyEvent> = log
            .events()
            .filter(|event| event.kind == EventKind::Drive)
            .collect();
        assert_eq!(drives.len(), 2);
        assert!((drives[1].duration_hours - 0.5).abs() < 1e-9);
        assert!((log.summary.driven_miles - 100.0).abs() < DISTANCE_EPSILON);
    }

    #[test]
    fn enforced_window_stops_driving_when_window_closes() {
        let rules = RuleSet {
            duty_window: DutyWindowConfig::Enforce,
            on_duty_window_hours: 10.0,
            ..RuleSet::default()
        };
        let log = simulate(&request(1100.0, 20.0, 0.0), &rules).unwrap();
        assert!((log.days[0].driving_hours() - 8.5).abs() < 1e-6);
        for day in &log.days {
            let mut on_duty = 0.0;
            for event in &day.events {
                if event.kind == EventKind::Drive {
                    on_duty += event.duration_hours;
                    assert!(on_duty <= 10.0 + 1e-3);
                } else if event.kind.is_on_duty() {
                    on_duty += event.duration_hours;
                }
            }
        }
    }

    #[test]
    fn ignored_window_matches_reference_allocation() {
        let log = simulate(&request(1100.0, 20.0, 0.0), &RuleSet::default()).unwrap();
        assert!((log.days[0].driving_hours() - 11.0).abs() < 1e-6);
    }

    #[test]
    fn cycle_limit_is_flagged_by_default() {
        let log = simulate(&request(550.0, 10.0, 65.0), &RuleSet::default()).unwrap();
        let cycle = log.cycle.expect("cycle report");
        assert_eq!(cycle.trip_on_duty_hours, 12.5);
        assert_eq!(cycle.projected_hours, 77.5);
        assert!(cycle.exceeded);

        let log = simulate(&request(550.0, 10.0, 5.0), &RuleSet::default()).unwrap();
        assert!(!log.cycle.expect("cycle report").exceeded);
    }

    #[test]
    fn cycle_limit_reject_returns_error() {
        let rules = RuleSet {
            cycle_limit: CycleLimitConfig::Reject,
            ..RuleSet::default()
        };
        let err = simulate(&request(550.0, 10.0, 65.0), &rules).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cycle limit exceeded: 77.50h projected against 70.00h maximum"
        );
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn cycle_limit_ignore_omits_report() {
        let rules = RuleSet {
            cycle_limit: CycleLimitConfig::Ignore,
            ..RuleSet::default()
        };
        let log = simulate(&request(550.0, 10.0, 65.0), &rules).unwrap();
        assert!(log.cycle.is_none());
    }

    #[test]
    fn near_zero_distance_closes_single_day() {
        let log = simulate(&request(0.0005, 0.001, 0.0), &RuleSet::default()).unwrap();
        assert_eq!(log.days.len(), 1);
        assert_eq!(
            kinds(&log.days[0]),
            vec![EventKind::Pickup, EventKind::Sleep, EventKind::Dropoff]
        );
    }

    #[test]
    fn tiny_duration_is_guarded() {
        let log = simulate(&request(50.0, 0.01, 0.0), &RuleSet::default()).unwrap();
        assert!((log.summary.driven_miles - 50.0).abs() < DISTANCE_EPSILON);
        assert_eq!(log.summary.average_speed_mph, 500.0);
    }

    #[test]
    fn invalid_inputs_are_rejected_before_simulating() {
        let rules = RuleSet::default();
        assert!(simulate(&request(0.0, 10.0, 0.0), &rules)
            .unwrap_err()
            .is_invalid_input());
        assert!(simulate(&request(100.0, 0.0, 0.0), &rules)
            .unwrap_err()
            .is_invalid_input());
        let no_stops = TripRequest::new(100.0, 2.0, Vec::new(), 0.0);
        assert!(simulate(&no_stops, &rules).unwrap_err().is_invalid_input());
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let rules = RuleSet {
            fuel_range_miles: 0.0,
            ..RuleSet::default()
        };
        assert!(simulate(&request(100.0, 2.0, 0.0), &rules)
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn rules_that_cannot_drive_are_rejected() {
        let capped = RuleSet {
            max_driving_hours_per_day: 1e-7,
            ..RuleSet::default()
        };
        let windowed = RuleSet {
            duty_window: DutyWindowConfig::Enforce,
            on_duty_window_hours: 5e-7,
            pickup_dropoff_hours: 0.0,
            ..RuleSet::default()
        };
        for rules in [capped, windowed] {
            assert!(simulate(&request(100.0, 2.0, 0.0), &rules)
                .unwrap_err()
                .is_invalid_input());
        }
    }

    #[test]
    fn stalled_day_ends_the_run() {
        let simulator = DutyCycleSimulator::new(RuleSet {
            max_driving_hours_per_day: 1e-7,
            ..RuleSet::default()
        });
        let err = simulator.plan(&request(100.0, 2.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::NoProgress { day: 1, .. }));
        assert_eq!(
            err.to_string(),
            "day 1 covered no distance with 100.000 mi left to drive"
        );
    }

    struct AlwaysDue;

    impl BreakPolicy for AlwaysDue {
        fn carry_into_day(&self, _boundary: &DayBoundary) -> f64 {
            100.0
        }
    }

    #[test]
    fn carried_driving_is_capped_at_the_break_threshold() {
        let simulator = DutyCycleSimulator::with_policy(RuleSet::default(), Box::new(AlwaysDue));
        let log = simulator.run(&request(550.0, 10.0, 0.0)).unwrap();

        let day = &log.days[0];
        assert_eq!(day.events[1].kind, EventKind::Break);
        assert_eq!(day.events[1].start_hours, 1.0);
        assert_eq!(log.summary.breaks, 2);
        assert!(log
            .events()
            .filter(|event| event.kind == EventKind::Drive)
            .all(|event| event.duration_hours > 0.0));
        assert!((log.summary.driven_miles - 550.0).abs() < DISTANCE_EPSILON);
    }

    #[test]
    fn simulation_is_deterministic() {
        let rules = RuleSet::default();
        let trip = request(3456.7, 61.3, 12.0);
        let a = serde_json::to_string(&simulate(&trip, &rules).unwrap()).unwrap();
        let b = serde_json::to_string(&simulate(&trip, &rules).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn round_to_handles_decimals() {
        assert_eq!(round_to(1.26, 1), 1.3);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
