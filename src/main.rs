use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use biosim::{config::init_tracing, report::ReportWriter, scenario::ScenarioLoader, Engine};

#[derive(Debug, Parser)]
#[command(author, version, about = "Island population dynamics runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/rossumoya.yaml")]
    scenario: PathBuf,

    /// Number of years to simulate (uses scenario default when omitted)
    #[arg(long)]
    years: Option<u64>,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override report interval in years
    #[arg(long)]
    report_interval: Option<u64>,

    /// Directory for year reports
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    init_tracing(&scenario.logging);

    let mut world = scenario
        .build_world()
        .with_context(|| format!("Scenario '{}' is invalid", scenario.name))?;
    let years = scenario.years(cli.years);
    let seed = cli.seed.unwrap_or(scenario.seed);
    let writer = ReportWriter::new(
        cli.report_dir
            .unwrap_or_else(|| scenario.report.output_dir.clone()),
        cli.report_interval
            .unwrap_or(scenario.report.interval_years),
    );

    info!(
        scenario = %scenario.name,
        seed,
        years,
        animals = world.total_animals(),
        "starting simulation"
    );

    let mut engine = Engine::new(seed);
    let mut write_result = Ok(());
    let years = i64::try_from(years).context("year count too large")?;
    let report = engine.run_with_hook(&mut world, years, |report| {
        if write_result.is_ok() {
            write_result = writer.maybe_write(&scenario.name, report).map(|_| ());
        }
    })?;
    write_result?;

    info!(year = report.year, total = report.total, "simulation finished");
    println!(
        "Scenario '{}' completed after {} years. Population: {}",
        scenario.name,
        report.year,
        report
            .per_species
            .iter()
            .map(|(species, count)| format!("{species}={count}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
