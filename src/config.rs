use chrono::NaiveDate;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::TripConfig;
use crate::rules::{BreakCarryConfig, CycleLimitConfig, DutyWindowConfig, RuleSet};
use crate::trip::{parse_waypoint, RouteSummary, TripRequest};

#[derive(Parser, Debug)]
#[command(
    name = "hos-plan",
    about = "Plan an hours-of-service compliant duty log for a single trip"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate the trip and print its duty log.
    Plan(PlanArgs),
    /// Simulate the trip and check the log against the rule set.
    Audit(PlanArgs),
    /// Print the effective rule set.
    ShowRules(RulesArgs),
    /// Print the supported policy values.
    ListPolicies,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(
        long,
        conflicts_with_all = ["distance_miles", "driving_hours", "route_meters", "route_seconds", "waypoints"]
    )]
    pub config: Option<PathBuf>,
    #[arg(long, requires = "driving_hours", conflicts_with_all = ["route_meters", "route_seconds"])]
    pub distance_miles: Option<f64>,
    #[arg(long, requires = "distance_miles")]
    pub driving_hours: Option<f64>,
    #[arg(long, requires = "route_seconds")]
    pub route_meters: Option<f64>,
    #[arg(long, requires = "route_meters")]
    pub route_seconds: Option<f64>,
    #[arg(long = "waypoint", help = "Waypoint as name or name@lat,lon; repeat in trip order")]
    pub waypoints: Vec<String>,
    #[arg(long, help = "Hours already used in the current duty cycle")]
    pub cycle_used: Option<f64>,
    #[arg(long, help = "Calendar date of the first day (YYYY-MM-DD)")]
    pub start_date: Option<NaiveDate>,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
    #[command(flatten)]
    pub rules: RulesArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RulesArgs {
    #[arg(long = "rules", help = "Rule set file (.toml or .json)")]
    pub rules_file: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub break_policy: Option<BreakPolicyArg>,
    #[arg(long, value_enum)]
    pub duty_window: Option<DutyWindowArg>,
    #[arg(long, value_enum)]
    pub cycle_limit: Option<CycleLimitArg>,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BreakPolicyArg {
    ResetDaily,
    CarryOver,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DutyWindowArg {
    Ignore,
    Enforce,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CycleLimitArg {
    Ignore,
    Flag,
    Reject,
}

impl From<BreakPolicyArg> for BreakCarryConfig {
    fn from(value: BreakPolicyArg) -> Self {
        match value {
            BreakPolicyArg::ResetDaily => BreakCarryConfig::ResetDaily,
            BreakPolicyArg::CarryOver => BreakCarryConfig::CarryOver,
        }
    }
}

impl From<DutyWindowArg> for DutyWindowConfig {
    fn from(value: DutyWindowArg) -> Self {
        match value {
            DutyWindowArg::Ignore => DutyWindowConfig::Ignore,
            DutyWindowArg::Enforce => DutyWindowConfig::Enforce,
        }
    }
}

impl From<CycleLimitArg> for CycleLimitConfig {
    fn from(value: CycleLimitArg) -> Self {
        match value {
            CycleLimitArg::Ignore => CycleLimitConfig::Ignore,
            CycleLimitArg::Flag => CycleLimitConfig::Flag,
            CycleLimitArg::Reject => CycleLimitConfig::Reject,
        }
    }
}

/// Everything the binary needs to run one simulation.
#[derive(Clone, Debug)]
pub struct Plan {
    pub request: TripRequest,
    pub rules: RuleSet,
    pub start_date: Option<NaiveDate>,
    pub format: FormatArg,
}

pub fn parse_args() -> Result<Cli> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => Err(Error::Cli(err.to_string().trim_end().to_string())),
    }
}

pub fn build_plan(args: PlanArgs) -> Result<Plan> {
    let (request, file_rules, file_date) = match &args.config {
        Some(path) => {
            let config: TripConfig = load_file(path, "trip file")?;
            let mut request = config.to_request()?;
            if let Some(cycle_used) = args.cycle_used {
                request.cycle_hours_used = cycle_used;
            }
            (request, config.rules, config.start_date)
        }
        None => (request_from_flags(&args)?, RuleSet::default(), None),
    };

    let rules = build_rules(&args.rules, file_rules)?;

    Ok(Plan {
        request,
        rules,
        start_date: args.start_date.or(file_date),
        format: args.format,
    })
}

/// Resolves the rule set for a run. A `--rules` file replaces `base`
/// outright, with omitted fields taking their defaults; policy flags then
/// override whichever set was chosen.
pub fn build_rules(args: &RulesArgs, base: RuleSet) -> Result<RuleSet> {
    let mut rules = match &args.rules_file {
        Some(path) => load_file(path, "rules file")?,
        None => base,
    };
    if let Some(policy) = args.break_policy {
        rules.break_carry = policy.into();
    }
    if let Some(window) = args.duty_window {
        rules.duty_window = window.into();
    }
    if let Some(limit) = args.cycle_limit {
        rules.cycle_limit = limit.into();
    }
    Ok(rules)
}

fn request_from_flags(args: &PlanArgs) -> Result<TripRequest> {
    let waypoints = args
        .waypoints
        .iter()
        .map(String::as_str)
        .map(parse_waypoint)
        .collect::<Result<Vec<_>>>()?;
    let cycle_used = args.cycle_used.unwrap_or(0.0);

    match (
        args.distance_miles,
        args.driving_hours,
        args.route_meters,
        args.route_seconds,
    ) {
        (Some(miles), Some(hours), _, _) => Ok(TripRequest::new(miles, hours, waypoints, cycle_used)),
        (_, _, Some(distance_meters), Some(duration_seconds)) => Ok(TripRequest::from_route(
            RouteSummary {
                distance_meters,
                duration_seconds,
            },
            waypoints,
            cycle_used,
        )),
        _ => Err(Error::Cli(
            "trip totals required: --distance-miles/--driving-hours, --route-meters/--route-seconds or --config"
                .to_string(),
        )),
    }
}

/// Reads a trip or rules file, decoding it by extension. `what` names the
/// file in error messages.
pub fn load_file<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let syntax = match path.extension().and_then(|value| value.to_str()) {
        Some(ext @ ("toml" | "json")) => ext,
        Some(other) => return Err(Error::UnsupportedConfigFormat(other.to_string())),
        None => return Err(Error::UnsupportedConfigFormat("unknown".to_string())),
    };
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "cannot read {} '{}': {}",
            what,
            path.display(),
            err
        ))
    })?;

    let parsed: std::result::Result<T, String> = if syntax == "toml" {
        toml::from_str(&contents).map_err(|err| err.to_string())
    } else {
        serde_json::from_str(&contents).map_err(|err| err.to_string())
    };
    parsed.map_err(|err| {
        Error::ConfigParse(format!(
            "{} '{}' is not valid {}: {}",
            what,
            path.display(),
            syntax.to_uppercase(),
            err
        ))
    })
}
