use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use graha_config::{load_engine_settings, read_rule_definitions, EngineSettings};
use graha_rules::timeaware::{
    aspects_to_natal, scan_transit_windows, summarize, summarize_timeaware, TransitSnapshot,
};
use graha_rules::{Chart, RuleEngine};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Evaluate JSON astrology rules against precomputed charts")]
struct Args {
    /// Config file (default: configs/graha.toml or ../../configs/graha.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rules directory override.
    #[arg(long, global = true)]
    rules_dir: Option<PathBuf>,

    /// Number of rules/days to keep in summaries.
    #[arg(long, global = true)]
    top_n: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the rules directory and report diagnostics.
    Reload,
    /// List the ids of the rules that load.
    List,
    /// Evaluate one rule, or every rule, against a chart.
    Evaluate {
        /// Chart JSON (ascendant + planets).
        #[arg(long)]
        chart: PathBuf,
        #[arg(long)]
        rule: Option<String>,
    },
    /// Evaluate every rule and print a ranked summary.
    Predict {
        #[arg(long)]
        chart: PathBuf,
    },
    /// Adjust rule scores with a transit snapshot.
    Timeaware {
        #[arg(long)]
        chart: PathBuf,
        /// Transit snapshot JSON (optional `when` + planets).
        #[arg(long)]
        transit: PathBuf,
        /// Orb for transit-to-natal aspects (default from config).
        #[arg(long)]
        orb: Option<f64>,
    },
    /// Score a run of daily transit snapshots.
    Windows {
        #[arg(long)]
        chart: PathBuf,
        /// JSON array of snapshots, one per day starting at --start.
        #[arg(long)]
        transits: PathBuf,
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        orb: Option<f64>,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Could not read {} {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {} JSON in {}", what, path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_engine(settings: &EngineSettings) -> anyhow::Result<RuleEngine> {
    let definitions = read_rule_definitions(&settings.rules_dir)?;
    let engine = RuleEngine::new(settings.default_orb_deg);
    let summary = engine.reload(&definitions);
    for diag in &summary.errors {
        warn!("{}: {}", diag.source, diag.message);
    }
    Ok(engine)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = load_engine_settings(args.config.as_deref())?;
    if let Some(dir) = args.rules_dir {
        settings.rules_dir = dir;
    }
    if let Some(n) = args.top_n {
        settings.top_n = n;
    }

    match args.command {
        Command::Reload => {
            let definitions = read_rule_definitions(&settings.rules_dir)?;
            let engine = RuleEngine::new(settings.default_orb_deg);
            print_json(&engine.reload(&definitions))
        }
        Command::List => print_json(&load_engine(&settings)?.list_loaded()),
        Command::Evaluate { chart, rule } => {
            let engine = load_engine(&settings)?;
            let chart: Chart = read_json(&chart, "chart")?;
            match rule {
                Some(id) => print_json(&engine.evaluate_one(&chart, &id)?),
                None => print_json(&engine.evaluate_all(&chart)),
            }
        }
        Command::Predict { chart } => {
            let engine = load_engine(&settings)?;
            let chart: Chart = read_json(&chart, "chart")?;
            let report = engine.evaluate_all(&chart);
            print_json(&summarize(&report.verdicts, settings.top_n))
        }
        Command::Timeaware { chart, transit, orb } => {
            let engine = load_engine(&settings)?;
            let chart: Chart = read_json(&chart, "chart")?;
            let snapshot: TransitSnapshot = read_json(&transit, "transit snapshot")?;
            let orb = orb.unwrap_or(settings.transit_orb_deg);
            let report = engine.evaluate_all(&chart);
            print_json(&serde_json::json!({
                "aspects": aspects_to_natal(&chart, &snapshot, orb),
                "summary": summarize_timeaware(&report.verdicts, &chart, &snapshot, orb, settings.top_n),
                "failures": report.failures,
            }))
        }
        Command::Windows {
            chart,
            transits,
            start,
            orb,
        } => {
            let chart: Chart = read_json(&chart, "chart")?;
            let snapshots: Vec<TransitSnapshot> = read_json(&transits, "transit snapshots")?;
            if snapshots.is_empty() {
                anyhow::bail!("{} holds no snapshots", transits.display());
            }
            let orb = orb.unwrap_or(settings.transit_orb_deg);
            print_json(&scan_transit_windows(&chart, start, &snapshots, orb, settings.top_n))
        }
    }
}
