use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::audit::Violation;
use crate::error::{Error, Result};
use crate::events::{DutyEvent, EventKind};
use crate::rules::RuleSet;
use crate::state::{CycleReport, Day, DutyLog, TripSummary};

pub trait Formatter {
    fn write(&self, log: &DutyLog) -> Result<String>;
}

pub struct HumanFormatter {
    pub start_date: Option<NaiveDate>,
}

pub struct SummaryFormatter;

pub struct JsonFormatter {
    pub start_date: Option<NaiveDate>,
}

impl Formatter for HumanFormatter {
    fn write(&self, log: &DutyLog) -> Result<String> {
        let mut out = String::new();
        write_trip(&mut out, log);
        for day in &log.days {
            let header = match day_date(self.start_date, day) {
                Some(date) => format!("Day {} ({}):\n", day.index + 1, date),
                None => format!("Day {}:\n", day.index + 1),
            };
            out.push_str(&header);
            for event in &day.events {
                out.push_str(&event_line(event));
                out.push('\n');
            }
        }
        write_summary(&mut out, log);
        Ok(out)
    }
}

impl Formatter for SummaryFormatter {
    fn write(&self, log: &DutyLog) -> Result<String> {
        let mut out = String::new();
        write_trip(&mut out, log);
        write_summary(&mut out, log);
        Ok(out)
    }
}

#[derive(Serialize)]
struct LogSheet<'a> {
    origin: &'a str,
    destination: &'a str,
    cycle_hours_used: f64,
    fuel_markers: &'a [f64],
    days: Vec<SheetDay<'a>>,
    summary: &'a TripSummary,
    cycle: Option<&'a CycleReport>,
}

#[derive(Serialize)]
struct SheetDay<'a> {
    day: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    events: &'a [DutyEvent],
}

impl Formatter for JsonFormatter {
    fn write(&self, log: &DutyLog) -> Result<String> {
        let sheet = LogSheet {
            origin: &log.origin,
            destination: &log.destination,
            cycle_hours_used: log.cycle_hours_used,
            fuel_markers: &log.fuel_markers,
            days: log
                .days
                .iter()
                .map(|day| SheetDay {
                    day: day.index + 1,
                    date: day_date(self.start_date, day).map(|date| date.to_string()),
                    events: &day.events,
                })
                .collect(),
            summary: &log.summary,
            cycle: log.cycle.as_ref(),
        };
        let mut json = serde_json::to_string_pretty(&sheet).map_err(render_error)?;
        json.push('\n');
        Ok(json)
    }
}

fn day_date(start: Option<NaiveDate>, day: &Day) -> Option<NaiveDate> {
    start.and_then(|date| date.checked_add_days(Days::new(day.index as u64)))
}

fn event_line(event: &DutyEvent) -> String {
    let mut line = format!(
        "  {:.2} +{:.2}h {}",
        event.start_hours, event.duration_hours, event.kind
    );
    if event.kind == EventKind::Drive {
        line.push_str(&format!(" {:.1} mi", event.miles));
    }
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    line
}

fn write_trip(out: &mut String, log: &DutyLog) {
    let markers = if log.fuel_markers.is_empty() {
        "none".to_string()
    } else {
        log.fuel_markers
            .iter()
            .map(|marker| format!("{:.1}", marker))
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push_str("Trip:\n");
    out.push_str(&format!("origin: {}\n", log.origin));
    out.push_str(&format!("destination: {}\n", log.destination));
    out.push_str(&format!("distance_miles: {:.1}\n", log.summary.distance_miles));
    out.push_str(&format!(
        "average_speed_mph: {:.2}\n",
        log.summary.average_speed_mph
    ));
    out.push_str(&format!("fuel_markers: {}\n", markers));
}

fn write_summary(out: &mut String, log: &DutyLog) {
    let summary = &log.summary;
    out.push_str("Summary:\n");
    out.push_str(&format!("days: {}\n", summary.days));
    out.push_str(&format!("driving_hours: {:.2}\n", summary.driving_hours));
    out.push_str(&format!("on_duty_hours: {:.2}\n", summary.on_duty_hours));
    out.push_str(&format!("off_duty_hours: {:.2}\n", summary.off_duty_hours));
    out.push_str(&format!("elapsed_hours: {:.2}\n", summary.elapsed_hours));
    out.push_str(&format!("fuel_stops: {}\n", summary.fuel_stops));
    out.push_str(&format!("breaks: {}\n", summary.breaks));
    if let Some(cycle) = &log.cycle {
        out.push_str(&format!(
            "cycle: {:.2}/{:.2}h ({})\n",
            cycle.projected_hours,
            cycle.max_hours,
            if cycle.exceeded { "exceeded" } else { "ok" }
        ));
    }
}

pub fn render_audit(findings: &[Violation]) -> String {
    if findings.is_empty() {
        return "Audit: no violations\n".to_string();
    }
    let mut out = format!("Audit: {} violation(s)\n", findings.len());
    for finding in findings {
        out.push_str(&format!("- {}\n", finding));
    }
    out
}

pub fn render_rules(rules: &RuleSet) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "max_driving_hours_per_day: {:.2}\n",
        rules.max_driving_hours_per_day
    ));
    out.push_str(&format!(
        "on_duty_window_hours: {:.2}\n",
        rules.on_duty_window_hours
    ));
    out.push_str(&format!(
        "break_after_driving_hours: {:.2}\n",
        rules.break_after_driving_hours
    ));
    out.push_str(&format!(
        "break_duration_hours: {:.2}\n",
        rules.break_duration_hours
    ));
    out.push_str(&format!(
        "pickup_dropoff_hours: {:.2}\n",
        rules.pickup_dropoff_hours
    ));
    out.push_str(&format!("fuel_stop_hours: {:.2}\n", rules.fuel_stop_hours));
    out.push_str(&format!("fuel_range_miles: {:.1}\n", rules.fuel_range_miles));
    out.push_str(&format!(
        "off_duty_rest_hours: {:.2}\n",
        rules.off_duty_rest_hours
    ));
    out.push_str(&format!("cycle_max_hours: {:.2}\n", rules.cycle_max_hours));
    out.push_str(&format!("cycle_days: {}\n", rules.cycle_days));
    out.push_str(&format!("chunk_hours: {:.2}\n", rules.chunk_hours));
    out.push_str(&format!("break_carry: {}\n", rules.break_carry));
    out.push_str(&format!("duty_window: {}\n", rules.duty_window));
    out.push_str(&format!("cycle_limit: {}\n", rules.cycle_limit));
    out
}

pub fn render_policies() -> String {
    concat!(
        "break-policy: reset-daily, carry-over\n",
        "duty-window: ignore, enforce\n",
        "cycle-limit: ignore, flag, reject\n",
    )
    .to_string()
}

fn render_error(err: impl std::fmt::Display) -> Error {
    Error::Output(err.to_string())
}
