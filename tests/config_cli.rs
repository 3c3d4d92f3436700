use predicates::prelude::*;
use predicates::str::{contains, diff};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_config(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be available")
        .as_nanos();
    path.push(format!("hos-trip-{}.{}", nanos, extension));
    fs::write(&path, contents).expect("config write should succeed");
    path
}

#[test]
fn toml_trip_file_summary_runs() {
    let config = r#"
cycle_hours_used = 5.0
waypoints = [
  { name = "Start" },
  { name = "PickupPoint", lat = 41.88, lon = -87.63 },
  { name = "DropoffPoint" },
]

[totals]
distance_miles = 550.0
driving_hours = 10.0
"#;
    let path = write_temp_config(config, "toml");

    let expected = concat!(
        "Trip:\n",
        "origin: Start\n",
        "destination: DropoffPoint\n",
        "distance_miles: 550.0\n",
        "average_speed_mph: 55.00\n",
        "fuel_markers: none\n",
        "Summary:\n",
        "days: 1\n",
        "driving_hours: 10.00\n",
        "on_duty_hours: 12.50\n",
        "off_duty_hours: 10.00\n",
        "elapsed_hours: 22.50\n",
        "fuel_stops: 0\n",
        "breaks: 1\n",
        "cycle: 17.50/70.00h (ok)\n",
    );
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hos-plan");
    cmd.args([
        "plan",
        "--config",
        path.to_str().unwrap(),
        "--format",
        "summary",
    ]);
    cmd.assert().success().stdout(diff(expected));
}

#[test]
fn json_trip_file_with_route_totals_and_rules() {
    let config = r#"{
  "totals": { "distance_meters": 885137.0, "duration_seconds": 36000.0 },
  "waypoints": [{ "name": "Yard" }, { "name": "Dock" }],
  "start_date": "2026-07-01",
  "rules": { "cycle_limit": "ignore" }
}"#;
    let path = write_temp_config(config, "json");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hos-plan");
    cmd.args(["plan", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(contains("Day 1 (2026-07-01):\n"))
        .stdout(contains("  0.00 +1.00h pickup @ Yard\n"))
        .stdout(contains("cycle:").not());
}

#[test]
fn rules_file_overrides_defaults() {
    let rules = r#"
max_driving_hours_per_day = 10.0
break_after_driving_hours = 6.0
"#;
    let path = write_temp_config(rules, "toml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hos-plan");
    cmd.args(["show-rules", "--rules", path.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(contains("max_driving_hours_per_day: 10.00\n"))
        .stdout(contains("break_after_driving_hours: 6.00\n"))
        .stdout(contains("fuel_range_miles: 1000.0\n"));
}

#[test]
fn unsupported_extension_fails() {
    let path = write_temp_config("totals: {}", "yaml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hos-plan");
    cmd.args(["plan", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: unsupported config format 'yaml'"));
}

#[test]
fn malformed_toml_fails() {
    let path = write_temp_config("totals = [", "toml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("hos-plan");
    cmd.args(["plan", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(contains("is not valid TOML"));
}
