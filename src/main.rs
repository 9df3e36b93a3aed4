//! AMR fleet dispatch simulator CLI.
//!
//! `run` executes a single simulation (baseline or GA dispatch) and prints
//! its metrics; `compare` runs both modes on the same seed/scale and diffs
//! them; `serve` starts the dashboard HTTP+WS server; `validate` checks a
//! scenario override for the §7 "jobs without robots" inconsistency without
//! running anything.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use amr_core::TopicBus;
use amr_dispatcher::Dispatcher;
use amr_metrics::{render_text, RunMetrics};
use amr_scenario::{scenario_hash, JobOverride, Mode, RobotOverride, RunContext, Scale};
use amr_simulator::Runner;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "amr-fleet")]
#[command(author = "AMR Fleet Team")]
#[command(version = "0.1.0")]
#[command(about = "Deterministic AMR fleet dispatch simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation and print its metrics.
    Run {
        /// Dispatch policy: "baseline" or "ga"
        #[arg(long, default_value = "baseline")]
        mode: String,

        /// Deterministic seed for scenario generation and the GA
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Named scale: mini, small, demo, large
        #[arg(long, default_value = "mini")]
        scale: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Override the run's max_sim_seconds
        #[arg(long)]
        max_sim_seconds: Option<f64>,

        /// Scenario override file (YAML: robots/jobs), mutually exclusive with the generator
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
    /// Run baseline and GA back-to-back on the same seed/scale and diff the metrics.
    Compare {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value = "mini")]
        scale: String,
    },
    /// Start the dashboard HTTP+WebSocket server.
    Serve {
        #[arg(long, env = "AMR_SERVER_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(long, env = "AMR_SERVER_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Validate a scenario override without running a simulation.
    Validate {
        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value = "mini")]
        scale: String,

        #[arg(long)]
        scenario: Option<PathBuf>,
    },
}

/// Overrides loaded from a user-supplied YAML file (spec.md §6 `run.started`
/// optional `robots`/`jobs` payload).
#[derive(Debug, Deserialize)]
struct ScenarioOverrideFile {
    #[serde(default)]
    robots: Option<Vec<RobotOverride>>,
    #[serde(default)]
    jobs: Option<Vec<JobOverride>>,
}

fn load_overrides(path: &PathBuf) -> Result<ScenarioOverrideFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading scenario override file {}", path.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing scenario override file {}", path.display()))
}

fn parse_mode(raw: &str) -> Result<Mode> {
    match raw {
        "baseline" => Ok(Mode::Baseline),
        "ga" => Ok(Mode::Ga),
        other => Err(anyhow!("unknown mode '{other}', expected 'baseline' or 'ga'")),
    }
}

fn parse_scale(raw: &str) -> Result<Scale> {
    raw.parse::<Scale>().map_err(|err| anyhow!(err.to_string()))
}

fn build_context(run_id: &str, mode: Mode, seed: u64, scale: Scale, overrides: Option<ScenarioOverrideFile>) -> RunContext {
    let mut ctx = RunContext::new(run_id.to_string(), mode, seed, scale);
    if let Some(overrides) = overrides {
        ctx.robots_override = overrides.robots;
        ctx.jobs_override = overrides.jobs;
    }
    ctx
}

/// Spawns a dispatcher + simulator pair over a fresh bus and blocks until
/// `run.completed`, returning its metrics.
async fn run_to_completion(ctx: RunContext) -> Result<RunMetrics> {
    let scenario = ctx
        .resolve_scenario()
        .map_err(|err| anyhow!("scenario rejected: {err}"))?;
    tracing::info!(
        run_id = %ctx.run_id,
        mode = ctx.mode.as_str(),
        scale = ctx.scale.as_str(),
        scenario_hash = %scenario_hash(&scenario),
        "starting run"
    );

    let bus = Arc::new(TopicBus::new());
    let mut completed_rx = bus.subscribe(&["run.completed"]);

    let dispatcher = Dispatcher::new(
        ctx.run_id.clone(),
        ctx.mode,
        ctx.seed,
        ctx.scale.as_str().to_string(),
        ctx.config,
        bus.clone(),
    );
    tokio::spawn(dispatcher.run());

    let runner = Runner::new(ctx.clone(), bus.clone());
    tokio::spawn(runner.run());

    let envelope = completed_rx
        .recv()
        .await
        .ok_or_else(|| anyhow!("run.completed was never published"))?;

    if let Some(failure) = envelope.payload.get("failure").and_then(|v| v.as_str()) {
        return Err(anyhow!("run rejected: {failure}"));
    }

    let metrics: RunMetrics = serde_json::from_value(
        envelope
            .payload
            .get("metrics")
            .cloned()
            .ok_or_else(|| anyhow!("run.completed payload missing metrics"))?,
    )?;
    Ok(metrics)
}

async fn cmd_run(
    mode: String,
    seed: u64,
    scale: String,
    output: String,
    max_sim_seconds: Option<f64>,
    scenario: Option<PathBuf>,
) -> Result<()> {
    let mode = parse_mode(&mode)?;
    let scale = parse_scale(&scale)?;
    let overrides = scenario.as_ref().map(load_overrides).transpose()?;
    let mut ctx = build_context("run-local", mode, seed, scale, overrides);
    if let Some(max_sim_seconds) = max_sim_seconds {
        ctx.config.max_sim_seconds = max_sim_seconds;
    }

    let metrics = run_to_completion(ctx).await?;

    match output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&metrics)?),
        _ => print!("{}", render_text("run-local", mode.as_str(), &metrics)),
    }
    Ok(())
}

async fn cmd_compare(seed: u64, scale: String) -> Result<()> {
    let scale = parse_scale(&scale)?;

    let baseline_ctx = build_context("compare-baseline", Mode::Baseline, seed, scale, None);
    let ga_ctx = build_context("compare-ga", Mode::Ga, seed, scale, None);

    let baseline_scenario = baseline_ctx
        .resolve_scenario()
        .map_err(|err| anyhow!("scenario rejected: {err}"))?;
    let ga_scenario = ga_ctx
        .resolve_scenario()
        .map_err(|err| anyhow!("scenario rejected: {err}"))?;
    let hashes_match = scenario_hash(&baseline_scenario) == scenario_hash(&ga_scenario);

    let baseline_metrics = run_to_completion(baseline_ctx).await?;
    let ga_metrics = run_to_completion(ga_ctx).await?;

    println!("scenario_hash_equal: {hashes_match}");
    print!("{}", render_text("compare-baseline", "baseline", &baseline_metrics));
    print!("{}", render_text("compare-ga", "ga", &ga_metrics));
    println!(
        "diff: on_time_rate {:+.3}, total_distance {:+.2}, max_lateness {:+.2}",
        ga_metrics.on_time_rate - baseline_metrics.on_time_rate,
        ga_metrics.total_distance - baseline_metrics.total_distance,
        ga_metrics.max_lateness - baseline_metrics.max_lateness,
    );
    Ok(())
}

async fn cmd_serve(host: String, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid server address {host}:{port}"))?;
    amr_server::serve(addr).await
}

fn cmd_validate(seed: u64, scale: String, scenario: Option<PathBuf>) -> Result<()> {
    let scale = parse_scale(&scale)?;
    let overrides = scenario.as_ref().map(load_overrides).transpose()?;
    let ctx = build_context("validate", Mode::Baseline, seed, scale, overrides);

    match ctx.resolve_scenario() {
        Ok(scenario) => {
            println!(
                "scenario valid: {} robots, {} jobs, hash {}",
                scenario.robots.len(),
                scenario.jobs.len(),
                scenario_hash(&scenario)
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("scenario invalid: {err}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { mode, seed, scale, output, max_sim_seconds, scenario } => {
            cmd_run(mode, seed, scale, output, max_sim_seconds, scenario).await
        }
        Commands::Compare { seed, scale } => cmd_compare(seed, scale).await,
        Commands::Serve { host, port } => cmd_serve(host, port).await,
        Commands::Validate { seed, scale, scenario } => cmd_validate(seed, scale, scenario),
    }
}
