use serde::{Deserialize, Serialize};

use crate::events::{DutyEvent, EventKind};

/// Counters the allocator tracks while building a single day.
#[derive(Clone, Debug, Default)]
pub struct DayState {
    pub driving_hours: f64,
    pub on_duty_hours: f64,
    pub driving_since_break: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Day {
    pub index: usize,
    pub events: Vec<DutyEvent>,
}

impl Day {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            events: Vec::new(),
        }
    }

    pub fn driving_hours(&self) -> f64 {
        self.hours_where(|kind| kind == EventKind::Drive)
    }

    pub fn on_duty_hours(&self) -> f64 {
        self.hours_where(|kind| kind.is_on_duty())
    }

    pub fn miles(&self) -> f64 {
        self.events.iter().map(|event| event.miles).sum()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    fn hours_where(&self, pred: impl Fn(EventKind) -> bool) -> f64 {
        self.events
            .iter()
            .filter(|event| pred(event.kind))
            .map(|event| event.duration_hours)
            .sum()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TripSummary {
    pub distance_miles: f64,
    pub driven_miles: f64,
    pub driving_hours: f64,
    pub average_speed_mph: f64,
    pub on_duty_hours: f64,
    pub off_duty_hours: f64,
    pub elapsed_hours: f64,
    pub fuel_stops: usize,
    pub breaks: usize,
    pub days: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CycleReport {
    pub hours_used: f64,
    pub trip_on_duty_hours: f64,
    pub projected_hours: f64,
    pub max_hours: f64,
    pub cycle_days: u32,
    pub exceeded: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DutyLog {
    pub origin: String,
    pub destination: String,
    pub cycle_hours_used: f64,
    pub fuel_markers: Vec<f64>,
    pub days: Vec<Day>,
    pub summary: TripSummary,
    pub cycle: Option<CycleReport>,
}

impl DutyLog {
    pub fn events(&self) -> impl Iterator<Item = &DutyEvent> {
        self.days.iter().flat_map(|day| day.events.iter())
    }

    pub fn first_event(&self) -> Option<&DutyEvent> {
        self.events().next()
    }

    pub fn last_event(&self) -> Option<&DutyEvent> {
        self.days.last().and_then(|day| day.events.last())
    }
}
