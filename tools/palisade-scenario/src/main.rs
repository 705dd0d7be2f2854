//! palisade-scenario: run engagement scenarios through the decision layer.
//!
//! Usage:
//!   palisade-scenario run scenarios/layered_defense.json --ticks 30 --dt 5
//!   palisade-scenario validate scenarios/layered_defense.json

mod driver;
mod logging;
mod scenario;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::driver::Driver;
use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "palisade-scenario", version, about = "PALISADE engagement scenario driver")]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "debug", "palisade_engage=debug").
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assess, allocate, and disseminate for a number of ticks.
    Run {
        scenario: PathBuf,
        #[arg(long, default_value_t = 1)]
        ticks: u32,
        /// Seconds between ticks.
        #[arg(long, default_value_t = 1.0)]
        dt: f64,
    },
    /// Load and validate a scenario without running it.
    Validate { scenario: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    match cli.command {
        Command::Run {
            scenario,
            ticks,
            dt,
        } => cmd_run(&scenario, ticks, dt),
        Command::Validate { scenario } => cmd_validate(&scenario),
    }
}

fn cmd_run(path: &Path, ticks: u32, dt: f64) -> Result<()> {
    anyhow::ensure!(dt > 0.0, "--dt must be positive, got {dt}");
    let scenario = Scenario::load(path)?;
    let name = scenario.name.clone();
    let mut driver = Driver::new(scenario)?;
    let reports = driver.run(ticks, dt)?;

    let committed: usize = reports.iter().map(|r| r.committed.len()).sum();
    let cancelled: usize = reports.iter().map(|r| r.cancelled.len()).sum();
    let excluded: usize = reports.iter().map(|r| r.excluded.len()).sum();
    let kills: usize = reports.iter().map(|r| r.kills.len()).sum();
    let envelopes: usize = reports.iter().map(|r| r.envelopes.len()).sum();
    info!(
        scenario = %name,
        ticks,
        committed,
        cancelled,
        excluded,
        kills,
        envelopes,
        remaining_threats = driver.threats().len(),
        active_assignments = driver.book().active().count(),
        "scenario complete"
    );
    println!(
        "{name}: {ticks} ticks, {committed} assignments, {cancelled} cancelled, {kills} kills, {envelopes} messages routed"
    );
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let world = scenario.build()?;
    println!(
        "{}: {} assets, {} threats, {} weapon table rows",
        scenario.name,
        world.assets.len(),
        world.threats.len(),
        world.table.rows().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests;
