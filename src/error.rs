use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("cycle limit exceeded: {projected:.2}h projected against {max:.2}h maximum")]
    CycleLimitExceeded { projected: f64, max: f64 },
    #[error("day {day} covered no distance with {remaining:.3} mi left to drive")]
    NoProgress { day: usize, remaining: f64 },
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("failed to render output: {0}")]
    Output(String),
    #[error("{0}")]
    Cli(String),
}

/// Rejections raised before any simulation work begins.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    #[error("total distance must be > 0 (got {0})")]
    NonPositiveDistance(f64),
    #[error("total driving duration must be > 0 (got {0}h)")]
    NonPositiveDuration(f64),
    #[error("cycle hours used must be >= 0 (got {0}h)")]
    NegativeCycleHours(f64),
    #[error("at least two waypoints are required (got {0})")]
    MissingWaypoints(usize),
    #[error("waypoint {0} must have a name")]
    EmptyWaypointName(usize),
    #[error("invalid waypoint '{0}': expected name[@lat,lon]")]
    InvalidWaypoint(String),
    #[error("invalid coordinates '{0}': expected lat,lon within range")]
    InvalidCoordinates(String),
    #[error("invalid rule set: {0}")]
    Rules(String),
}

impl Error {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
