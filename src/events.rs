use serde::{Deserialize, Serialize};
use std::fmt;

pub const FUEL_STOP_LABEL: &str = "fuel_stop";
pub const REST_BREAK_LABEL: &str = "rest_break";
pub const SLEEP_LABEL: &str = "off_duty_sleep";

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pickup,
    Drive,
    Fuel,
    Break,
    Sleep,
    Dropoff,
}

impl EventKind {
    /// Whether time spent in this event counts against on-duty limits.
    pub fn is_on_duty(&self) -> bool {
        !matches!(self, EventKind::Sleep)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Pickup => "pickup",
            EventKind::Drive => "drive",
            EventKind::Fuel => "fuel",
            EventKind::Break => "break",
            EventKind::Sleep => "sleep",
            EventKind::Dropoff => "dropoff",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DutyEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub start_hours: f64,
    pub duration_hours: f64,
    pub miles: f64,
    pub location: Option<String>,
}

impl DutyEvent {
    pub fn new(kind: EventKind, start_hours: f64, duration_hours: f64) -> Self {
        Self {
            kind,
            start_hours,
            duration_hours,
            miles: 0.0,
            location: None,
        }
    }

    pub fn drive(start_hours: f64, duration_hours: f64, miles: f64) -> Self {
        Self {
            miles,
            ..Self::new(EventKind::Drive, start_hours, duration_hours)
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn end_hours(&self) -> f64 {
        self.start_hours + self.duration_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sleep_is_off_duty() {
        assert!(EventKind::Drive.is_on_duty());
        assert!(EventKind::Break.is_on_duty());
        assert!(EventKind::Fuel.is_on_duty());
        assert!(!EventKind::Sleep.is_on_duty());
    }

    #[test]
    fn serializes_kind_as_type() {
        let event = DutyEvent::new(EventKind::Fuel, 3.0, 0.5).at(FUEL_STOP_LABEL);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"fuel","start_hours":3.0,"duration_hours":0.5,"miles":0.0,"location":"fuel_stop"}"#
        );
    }

    #[test]
    fn drive_events_carry_miles() {
        let event = DutyEvent::drive(1.0, 0.5, 27.5);
        assert_eq!(event.kind, EventKind::Drive);
        assert_eq!(event.miles, 27.5);
        assert_eq!(event.location, None);
        assert_eq!(event.end_hours(), 1.5);
    }
}
