use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use liftoff_orchestrator::DEFAULT_MISSION;
use liftoff_runner::{
    build_orchestrator, init_tracing, render_run_report_as_tree, Rocketfile, RunnerConfig,
    DEFAULT_ROCKETFILE,
};
use std::path::PathBuf;
use tracing::info;

/// Runs a mission from a rocketfile against a target.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Target to run against; `local` runs everything on this machine
    #[arg(required_unless_present = "list")]
    target: Option<String>,

    /// Mission to run
    #[arg(default_value = DEFAULT_MISSION)]
    mission: String,

    /// Path to the rocketfile
    #[arg(short, long, default_value = DEFAULT_ROCKETFILE)]
    file: PathBuf,

    /// Print the run report as JSON instead of a tree
    #[arg(long)]
    json: bool,

    /// Exit with an error if any command failed on any host
    #[arg(long)]
    strict: bool,

    /// List registered targets and missions, then exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let config = RunnerConfig::from_env();
    config.validate()?;

    let mut orchestrator = build_orchestrator(&config);
    Rocketfile::load(&cli.file)?.install(&mut orchestrator)?;

    if cli.list {
        let registry = orchestrator.registry();
        println!("Targets:");
        for name in registry.target_names() {
            let hosts = registry.target(name).map_or(0, <[_]>::len);
            println!("  {name} ({hosts} hosts)");
        }
        println!("Missions:");
        for name in registry.mission_names() {
            println!("  {name}");
        }
        return Ok(());
    }

    let target = cli
        .target
        .context("A target is required unless --list is given")?;
    info!(target = %target, mission = %cli.mission, file = %cli.file.display(), "Launching");

    let report = orchestrator.run(&target, &cli.mission).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_run_report_as_tree(&report)?);
    }

    if cli.strict && !report.succeeded() {
        let failed: Vec<String> = report
            .failed_commands()
            .iter()
            .map(|c| format!("#{} `{}` on {}", c.index + 1, c.command, c.failed_hosts().join(", ")))
            .collect();
        anyhow::bail!("{} command(s) failed: {}", failed.len(), failed.join("; "));
    }

    Ok(())
}
