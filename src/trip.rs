use serde::{Deserialize, Serialize};

use crate::error::{InvalidInput, Result};

pub const METERS_PER_MILE: f64 = 1609.34;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidInput::InvalidCoordinates(format!("{},{}", lat, lon)).into());
        }
        Ok(Self { lat, lon })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Waypoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_start_miles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_from_start_hours: Option<f64>,
}

impl Waypoint {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            coordinates: None,
            distance_from_start_miles: None,
            duration_from_start_hours: None,
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}

/// Router output as handed over by a routing collaborator.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RouteSummary {
    pub fn distance_miles(&self) -> f64 {
        self.distance_meters / METERS_PER_MILE
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_seconds / SECONDS_PER_HOUR
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TripRequest {
    pub total_distance_miles: f64,
    pub total_driving_hours: f64,
    pub waypoints: Vec<Waypoint>,
    pub cycle_hours_used: f64,
}

impl TripRequest {
    pub fn new(
        total_distance_miles: f64,
        total_driving_hours: f64,
        waypoints: Vec<Waypoint>,
        cycle_hours_used: f64,
    ) -> Self {
        Self {
            total_distance_miles,
            total_driving_hours,
            waypoints,
            cycle_hours_used,
        }
    }

    /// Builds a request from router totals, stamping the first waypoint with
    /// the trip origin and the last with the route totals.
    pub fn from_route(
        route: RouteSummary,
        mut waypoints: Vec<Waypoint>,
        cycle_hours_used: f64,
    ) -> Self {
        let miles = route.distance_miles();
        let hours = route.duration_hours();
        if waypoints.len() >= 2 {
            let last = waypoints.len() - 1;
            waypoints[0].distance_from_start_miles = Some(0.0);
            waypoints[0].duration_from_start_hours = Some(0.0);
            waypoints[last].distance_from_start_miles = Some(miles);
            waypoints[last].duration_from_start_hours = Some(hours);
        }
        Self::new(miles, hours, waypoints, cycle_hours_used)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.total_distance_miles.is_finite() || self.total_distance_miles <= 0.0 {
            return Err(InvalidInput::NonPositiveDistance(self.total_distance_miles).into());
        }
        if !self.total_driving_hours.is_finite() || self.total_driving_hours <= 0.0 {
            return Err(InvalidInput::NonPositiveDuration(self.total_driving_hours).into());
        }
        if !self.cycle_hours_used.is_finite() || self.cycle_hours_used < 0.0 {
            return Err(InvalidInput::NegativeCycleHours(self.cycle_hours_used).into());
        }
        if self.waypoints.len() < 2 {
            return Err(InvalidInput::MissingWaypoints(self.waypoints.len()).into());
        }
        for (idx, waypoint) in self.waypoints.iter().enumerate() {
            if waypoint.name.trim().is_empty() {
                return Err(InvalidInput::EmptyWaypointName(idx + 1).into());
            }
        }
        Ok(())
    }

    pub fn origin(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn destination(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }
}

/// Parses a literal `lat,lon` pair.
pub fn parse_coordinates(input: &str) -> Result<Coordinates> {
    let invalid = || InvalidInput::InvalidCoordinates(input.trim().to_string());

    let mut parts = input.split(',');
    let lat_str = parts.next().unwrap_or("").trim();
    let lon_str = parts.next().unwrap_or("").trim();
    if parts.next().is_some() {
        return Err(invalid().into());
    }

    let lat: f64 = lat_str.parse().map_err(|_| invalid())?;
    let lon: f64 = lon_str.parse().map_err(|_| invalid())?;
    Coordinates::new(lat, lon).map_err(|_| invalid().into())
}

/// Parses `name` or `name@lat,lon`.
pub fn parse_waypoint(input: &str) -> Result<Waypoint> {
    let trimmed = input.trim();
    let (name, coords) = match trimmed.split_once('@') {
        Some((name, coords)) => (name.trim(), Some(coords)),
        None => (trimmed, None),
    };
    if name.is_empty() {
        return Err(InvalidInput::InvalidWaypoint(trimmed.to_string()).into());
    }

    let waypoint = Waypoint::named(name);
    match coords {
        Some(coords) => Ok(waypoint.with_coordinates(parse_coordinates(coords)?)),
        None => Ok(waypoint),
    }
}
