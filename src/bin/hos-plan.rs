use chrono::NaiveDate;
use hos_planner::audit::audit;
use hos_planner::config::{self, Command, FormatArg};
use hos_planner::engine;
use hos_planner::error::Result;
use hos_planner::output::{
    render_audit, render_policies, render_rules, Formatter, HumanFormatter, JsonFormatter,
    SummaryFormatter,
};
use hos_planner::rules::RuleSet;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = config::parse_args()?;

    match cli.command {
        Command::Plan(args) => {
            let plan = config::build_plan(args)?;
            let log = engine::simulate(&plan.request, &plan.rules)?;
            let formatter = formatter_for(&plan.format, plan.start_date);
            print!("{}", formatter.write(&log)?);
        }
        Command::Audit(args) => {
            let plan = config::build_plan(args)?;
            let log = engine::simulate(&plan.request, &plan.rules)?;
            print!("{}", render_audit(&audit(&log, &plan.rules)));
        }
        Command::ShowRules(args) => {
            let rules = config::build_rules(&args, RuleSet::default())?;
            rules.validate()?;
            print!("{}", render_rules(&rules));
        }
        Command::ListPolicies => print!("{}", render_policies()),
    }

    Ok(())
}

fn formatter_for(format: &FormatArg, start_date: Option<NaiveDate>) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter { start_date }),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter { start_date }),
    }
}
