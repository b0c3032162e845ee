//! Precog civic coordination demo CLI
//!
//! Runs the four civic reference agents through one coordination run, or
//! validates a configuration file.
//!
//! Usage:
//!   cargo run -p demo -- run
//!   cargo run -p demo -- run --budget 250000 --rain-probability 0.8 --json
//!   cargo run -p demo -- run --config config/precog.toml --seed 42
//!   cargo run -p demo -- check-config --config config/precog.toml

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use precog_config::PrecogConfig;
use precog_contracts::{
    coordination::CoordinationResult,
    error::{CoordinationError, PrecogResult},
    report::PhaseResult,
};
use precog_journal::InMemoryRunJournal;
use precog_ref_city::{city_scenario, CityDataSource, CityRun, SeededCityData, StaticCityData};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Precog: Detect → Predict → Prevent → Optimize → Broadcast over city data.
#[derive(Parser)]
#[command(
    name = "precog",
    about = "Precog civic agent coordination demo",
    long_about = "Runs the civic reference agents through the five-phase coordination\n\
                  pipeline and reports the budget-optimal strategy selection."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one coordination run.
    Run {
        /// TOML configuration file. Defaults to the built-in configuration.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "San Francisco")]
        location: String,
        #[arg(long, default_value_t = 0.3)]
        rain_probability: f64,
        /// Override `coordination.total_budget`.
        #[arg(long)]
        budget: Option<f64>,
        /// Draw city data from a seeded generator instead of the fixtures.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Parse and validate a configuration file and print the effective settings.
    CheckConfig {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-agent call logs.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            config,
            location,
            rain_probability,
            budget,
            seed,
            json,
        } => run(RunArgs {
            config,
            location,
            rain_probability,
            budget,
            seed,
            json,
        }),
        Command::CheckConfig { config } => check_config(config),
    };

    if let Err(e) = result {
        eprintln!("precog: {}", e);
        std::process::exit(1);
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

struct RunArgs {
    config: Option<PathBuf>,
    location: String,
    rain_probability: f64,
    budget: Option<f64>,
    seed: Option<u64>,
    json: bool,
}

fn load_config(path: Option<&PathBuf>) -> PrecogResult<PrecogConfig> {
    match path {
        Some(path) => PrecogConfig::from_file(path),
        None => PrecogConfig::builtin(),
    }
}

fn run(args: RunArgs) -> PrecogResult<()> {
    if !(0.0..=1.0).contains(&args.rain_probability) {
        return Err(CoordinationError::ConfigError {
            reason: format!("--rain-probability must be in [0, 1], got {}", args.rain_probability),
        });
    }

    let mut config = load_config(args.config.as_ref())?;
    if let Some(budget) = args.budget {
        config = config.with_total_budget(budget)?;
    }

    let data: Arc<dyn CityDataSource> = match args.seed {
        Some(seed) => Arc::new(SeededCityData::new(seed)),
        None => Arc::new(StaticCityData),
    };

    let scenario = city_scenario(args.location, args.rain_probability);
    let journal = InMemoryRunJournal::new();
    info!(
        location = %scenario.location,
        budget = config.settings().total_budget,
        seeded = args.seed.is_some(),
        "starting coordination run"
    );

    let outcome = precog_ref_city::run(&config, data, &scenario, Box::new(journal.clone()));

    match &outcome {
        Ok(run) if args.json => print_json(&run.result)?,
        Ok(run) => print_summary(&scenario.location, run),
        Err(_) => {}
    }
    print_journal(&journal);

    outcome.map(|_| ())
}

fn check_config(path: Option<PathBuf>) -> PrecogResult<()> {
    let config = load_config(path.as_ref())?;
    let source = path
        .as_ref()
        .map_or_else(|| "built-in configuration".to_string(), |p| p.display().to_string());

    println!("{}: OK", source);
    println!();
    let settings = config.settings();
    println!("  total_budget           {:>14.2}", settings.total_budget);
    println!("  base_strategy_cost     {:>14.2}", settings.base_strategy_cost);
    println!("  base_strategy_benefit  {:>14.2}", settings.base_strategy_benefit);
    println!("  parallel_agents        {:>14}", settings.parallel_agents);
    match settings.agent_timeout_ms {
        Some(ms) => println!("  agent_timeout_ms       {:>14}", ms),
        None => println!("  agent_timeout_ms       {:>14}", "none"),
    }

    println!();
    println!("  Agent thresholds:");
    for (id, agent) in &config.document().agents {
        println!("    {:<18} {:.2}", id, agent.threshold);
    }

    println!();
    println!("  Funding programs:");
    for program in config.funding() {
        println!(
            "    {:<42} {:>14.0}  p={:.2}  x{:.2}  due {}",
            program.program, program.amount, program.probability, program.roi_multiplier, program.deadline
        );
    }
    let funding = config.funding_simulator();
    println!(
        "    total {:.0}, mean multiplier {:.3}",
        funding.total_potential_funding(),
        funding.average_roi_multiplier()
    );
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_json(result: &CoordinationResult) -> PrecogResult<()> {
    let text = serde_json::to_string_pretty(result).map_err(|e| CoordinationError::StateMachine {
        reason: format!("failed to encode result: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}

fn print_phase(result: &PhaseResult) {
    println!("  {}:", result.phase);
    for outcome in &result.outcomes {
        let strategies = outcome.report.strategies().len();
        if strategies > 0 {
            println!(
                "    {:<18} confidence {:.2}  strategies {}",
                outcome.agent,
                outcome.report.confidence(),
                strategies
            );
        } else {
            println!("    {:<18} confidence {:.2}", outcome.agent, outcome.report.confidence());
        }
    }
}

fn print_summary(location: &str, run: &CityRun) {
    let result = &run.result;
    let opt = &result.optimization;

    println!();
    println!("Precog coordination run: {}", location);
    println!("=================================");
    println!();

    print_phase(&result.detection);
    print_phase(&result.prediction);
    print_phase(&result.prevention);

    println!("  optimize:");
    println!(
        "    funding            {} programs, mean multiplier {:.3}",
        opt.funding.opportunities.len(),
        opt.funding.average_roi_multiplier
    );
    println!(
        "    candidates         {}  selected {}  ({:?})",
        opt.roi_calculations.len(),
        opt.result.selected.len(),
        opt.result.status
    );
    for calc in &opt.result.selected {
        println!(
            "      {:<16} {:<22} {:<20} cost {:>10.0}  benefit {:>12.2}",
            calc.agent,
            calc.strategy,
            calc.target.as_deref().unwrap_or("-"),
            calc.cost,
            calc.benefit
        );
    }
    println!(
        "    total cost {:.0} of {:.0}, total benefit {:.2}, ROI {:.4}",
        opt.result.total_cost, opt.result.budget, opt.result.total_benefit, result.total_roi
    );

    print_phase(&result.broadcast);

    println!();
    println!("  Agent status:");
    println!("    {:<18} {:>10} {:>10}  met", "agent", "confidence", "threshold");
    for status in &run.status {
        println!(
            "    {:<18} {:>10.2} {:>10.2}  {}",
            status.agent_id,
            status.confidence,
            status.threshold,
            if status.threshold_met { "yes" } else { "no" }
        );
    }
}

fn print_journal(journal: &InMemoryRunJournal) {
    let log = journal.export_log();
    println!();
    println!(
        "  Journal: {} transitions, integrity {}",
        log.entries.len(),
        if journal.verify_integrity() { "VERIFIED" } else { "BROKEN" }
    );
    for entry in &log.entries {
        let t = &entry.transition;
        match &t.detail {
            Some(detail) => println!("    #{} {} -> {} ({})", entry.sequence, t.from, t.to, detail),
            None => println!("    #{} {} -> {}", entry.sequence, t.from, t.to),
        }
    }
    if !log.terminal_hash.is_empty() {
        println!("    terminal hash {}", log.terminal_hash);
    }
}
