use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gas_control::ControlPanel;
use gas_core::kpi::zone_snapshot;
use gas_core::report::write_report_csv;
use gas_core::{simulate, AxisSpec, RunReport, Scenario};
use gas_scenario::{default_scenario, load_scenario, save_scenario, set_axis};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "gas_cli", about = "Gas balance and ventilation staging CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a scenario across its time axis and print the staging summary.
    Run {
        /// Scenario JSON file. Defaults to the built-in reference plant.
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Override the axis horizon in hours.
        #[arg(long)]
        horizon_hours: Option<f64>,
        /// Override the axis step in hours.
        #[arg(long)]
        step_hours: Option<f64>,
        /// Export every series sample to a CSV file.
        #[arg(long)]
        csv_out: Option<PathBuf>,
        /// Print zone snapshots at this process day after the run.
        #[arg(long)]
        day: Option<f64>,
        /// Only print the closing summary line.
        #[arg(long)]
        quiet: bool,
    },
    /// Validate a scenario file without running it.
    Check { scenario: PathBuf },
    /// Write the reference scenario to a file as an editing starting point.
    Init {
        path: PathBuf,
        /// Replace the file if it already exists.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn run(
    scenario_path: Option<PathBuf>,
    horizon_hours: Option<f64>,
    step_hours: Option<f64>,
    csv_out: Option<PathBuf>,
    day: Option<f64>,
    quiet: bool,
) -> Result<()> {
    let mut scenario = match scenario_path {
        Some(path) => load_scenario(&path)?,
        None => default_scenario(),
    };
    if horizon_hours.is_some() || step_hours.is_some() {
        let axis = AxisSpec {
            horizon_hours: horizon_hours.unwrap_or(scenario.axis.horizon_hours),
            step_hours: step_hours.unwrap_or(scenario.axis.step_hours),
        };
        set_axis(&mut scenario, axis).context("applying axis flags")?;
    }

    let mut panel = ControlPanel::default();
    let report = simulate(&scenario, &mut panel);

    if !quiet {
        print_zones(&report);
        print_series_summaries(&report);
        print_stage_distribution(&report);
    }
    println!(
        "Simulated {} zones x {} gases: {} samples over {} h at {} h steps.",
        scenario.zones.len(),
        scenario.gases.len(),
        report.sample_count,
        scenario.axis.horizon_hours,
        scenario.axis.step_hours,
    );

    if let Some(path) = csv_out {
        write_report_csv(&path, &report)
            .with_context(|| format!("writing series CSV: {}", path.display()))?;
        println!("Series written to {}", path.display());
    }

    if let Some(at_day) = day {
        if !at_day.is_finite() || at_day < 0.0 {
            bail!("snapshot day must be finite and non-negative, got {at_day}");
        }
        print_snapshots(&scenario, at_day);
    }

    Ok(())
}

fn print_zones(report: &RunReport) {
    for zone in &report.zones {
        println!(
            "{} ({}): volume={:.1} m3  fan capacity={:.0} m3/h  substrate={:.0} kg  start day={:.1}{}",
            zone.id,
            zone.name,
            zone.volume_m3,
            zone.max_airflow_m3_h,
            zone.substrate_kg,
            zone.process_day,
            if zone.override_active {
                "  [manual override]"
            } else {
                ""
            },
        );
    }
    println!("{}", "-".repeat(80));
}

fn print_series_summaries(report: &RunReport) {
    for series in &report.series {
        match &series.peak {
            Some(peak) => println!(
                "{}/{}: peak {:.1} ppm at t={:.1} h (sample {}, rate {:.4} g/kg/h)",
                series.zone,
                series.gas,
                peak.concentration_ppm,
                peak.time_hours,
                peak.sample_index,
                peak.emission_rate_g_kg_h,
            ),
            None => println!("{}/{}: no defined readings", series.zone, series.gas),
        }
        if series.undefined_samples > 0 || series.flagged_samples > 0 {
            println!(
                "    undefined readings: {}  beyond model support: {}",
                series.undefined_samples, series.flagged_samples,
            );
        }
    }
    println!("{}", "-".repeat(80));
}

/// How many samples each zone spent at each governing stage. Every gas track
/// of a zone repeats the governing values, so the first track suffices.
fn print_stage_distribution(report: &RunReport) {
    for zone in &report.zones {
        let Some(series) = report.series.iter().find(|s| s.zone == zone.id) else {
            continue;
        };
        let mut counts: Vec<usize> = Vec::new();
        for sample in &series.samples {
            if sample.stage_rank >= counts.len() {
                counts.resize(sample.stage_rank + 1, 0);
            }
            counts[sample.stage_rank] += 1;
        }
        let rendered: Vec<String> = counts
            .iter()
            .enumerate()
            .map(|(rank, n)| format!("stage {rank}: {n}"))
            .collect();
        println!("{} staging: {}", zone.id, rendered.join("  "));
    }
    println!("{}", "-".repeat(80));
}

fn print_snapshots(scenario: &Scenario, at_day: f64) {
    let mut panel = ControlPanel::default();
    println!("{}", "-".repeat(80));
    for zone in &scenario.zones {
        let snap = zone_snapshot(zone, &scenario.gases, Some(at_day), &mut panel);
        println!(
            "{} at day {:.2}: stage {} at {:.0}% fan = {:.0} m3/h ({:.1} ACH), surface factor {:.2}{}",
            snap.zone,
            snap.process_day,
            snap.governing.stage_rank,
            snap.governing.fan_power_pct,
            snap.airflow_m3_h,
            snap.air_changes_per_hour,
            snap.micro_climate_factor,
            if snap.beyond_model_support {
                "  [beyond model support]"
            } else {
                ""
            },
        );
        for reading in &snap.readings {
            let room = reading
                .concentration_ppm
                .map_or_else(|| "undefined".to_string(), |c| format!("{c:.1} ppm"));
            let surface = reading
                .micro_climate_ppm
                .map_or_else(|| "undefined".to_string(), |c| format!("{c:.1} ppm"));
            println!(
                "    {}: {} in the room, {} at the surface, {:.4} g/kg/h ({:.3} kg/h)",
                reading.name, room, surface, reading.emission_rate_g_kg_h, reading.production_kg_h,
            );
        }
    }
}

// ---------------------------------------------------------------------------
// check / init
// ---------------------------------------------------------------------------

fn check(path: &Path) -> Result<()> {
    let scenario = load_scenario(path)?;
    println!(
        "{}: OK ({} zones, {} gases)",
        path.display(),
        scenario.zones.len(),
        scenario.gases.len(),
    );
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (pass --force to replace it)",
            path.display()
        );
    }
    save_scenario(path, &default_scenario())?;
    println!("Reference scenario written to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            horizon_hours,
            step_hours,
            csv_out,
            day,
            quiet,
        } => run(scenario, horizon_hours, step_hours, csv_out, day, quiet),
        Commands::Check { scenario } => check(&scenario),
        Commands::Init { path, force } => init(&path, force),
    }
}
