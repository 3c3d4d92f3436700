use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidInput, Result};
use crate::rules::RuleSet;
use crate::trip::{Coordinates, RouteSummary, TripRequest, Waypoint};

/// On-disk description of a trip to plan.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TripConfig {
    pub totals: TripTotals,
    pub waypoints: Vec<WaypointConfig>,
    #[serde(default)]
    pub cycle_hours_used: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub rules: RuleSet,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TripTotals {
    Miles {
        distance_miles: f64,
        driving_hours: f64,
    },
    Route {
        distance_meters: f64,
        duration_seconds: f64,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WaypointConfig {
    pub name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl WaypointConfig {
    pub fn to_waypoint(&self) -> Result<Waypoint> {
        let waypoint = Waypoint::named(self.name.trim());
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Ok(waypoint.with_coordinates(Coordinates::new(lat, lon)?)),
            (None, None) => Ok(waypoint),
            _ => Err(InvalidInput::InvalidCoordinates(self.name.clone()).into()),
        }
    }
}

impl TripConfig {
    pub fn to_request(&self) -> Result<TripRequest> {
        let waypoints = self
            .waypoints
            .iter()
            .map(WaypointConfig::to_waypoint)
            .collect::<Result<Vec<_>>>()?;

        Ok(match self.totals {
            TripTotals::Miles {
                distance_miles,
                driving_hours,
            } => TripRequest::new(distance_miles, driving_hours, waypoints, self.cycle_hours_used),
            TripTotals::Route {
                distance_meters,
                duration_seconds,
            } => TripRequest::from_route(
                RouteSummary {
                    distance_meters,
                    duration_seconds,
                },
                waypoints,
                self.cycle_hours_used,
            ),
        })
    }
}
