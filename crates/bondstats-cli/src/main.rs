use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use bondstats_core::StudyConfig;
use bondstats_engine::{
    AggregationStore, CompletenessWarning, ExtremeCase, compare_policies, compute_stats,
    ingest_into, report,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reduce channel-bonding simulator logs into comparative, load-indexed statistics"
)]
struct Args {
    /// Simulator log file, one `;`-separated record per line.
    input: PathBuf,

    /// Directory the delimited reports are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Study configuration in TOML; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a machine-readable summary of the run as JSON.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

/// Machine-readable recap of one run, for scripting around the reports.
#[derive(Debug, Serialize)]
struct StudySummary {
    records_ingested: usize,
    completeness_warnings: Vec<CompletenessWarning>,
    extreme_case: Option<ExtremeCase>,
    reports: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cfg = load_config(args.config.as_deref())?;
    info!(
        policies = cfg.policies.len(),
        loads = cfg.traffic_loads.len(),
        scenarios = cfg.num_scenarios,
        "study configuration loaded"
    );

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open input file {}", args.input.display()))?;
    let mut store = AggregationStore::new(&cfg);
    let records_ingested = ingest_into(BufReader::new(file), &mut store)
        .with_context(|| format!("Failed to ingest {}", args.input.display()))?;
    info!(records_ingested, "ingestion complete");

    let completeness_warnings = store.completeness(&cfg);
    if !completeness_warnings.is_empty() {
        warn!(
            cells = completeness_warnings.len(),
            "some (policy, load) cells deviate from the expected sample count; \
             their averages are flagged as incomplete"
        );
    }

    let stats = compute_stats(&store, &cfg);
    let comparison = compare_policies(&store, &cfg);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create output directory {}", args.out_dir.display()))?;

    let mut reports = Vec::new();
    reports.push(write_report(&args.out_dir, "averages.csv", |w| {
        report::write_averages(w, &stats, &cfg)
    })?);
    reports.push(write_report(&args.out_dir, "delay_comparison.csv", |w| {
        report::write_delay_comparison(w, &comparison, &cfg)
    })?);
    reports.push(write_report(&args.out_dir, "delay_comparison_success.csv", |w| {
        report::write_success_delay_comparison(w, &comparison, &cfg)
    })?);
    reports.push(write_report(&args.out_dir, "load_accomplishment.csv", |w| {
        report::write_load_accomplishment(w, &stats, &cfg)
    })?);
    reports.push(write_report(&args.out_dir, "success_delay.csv", |w| {
        report::write_success_delay(w, &stats, &cfg)
    })?);

    if let Some(path) = &args.summary_json {
        let summary = StudySummary {
            records_ingested,
            completeness_warnings,
            extreme_case: comparison.extreme,
            reports: reports.clone(),
        };
        let data =
            serde_json::to_vec_pretty(&summary).context("Failed to serialize study summary")?;
        fs::write(path, &data)
            .with_context(|| format!("Failed to write summary file {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    info!("all reports written");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<StudyConfig> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")?
        }
        None => StudyConfig::default(),
    };
    cfg.validate().context("Invalid study configuration")?;
    Ok(cfg)
}

fn write_report<F>(out_dir: &Path, name: &str, emit: F) -> Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let path = out_dir.join(name);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    emit(&mut writer).with_context(|| format!("Failed to write report {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush report {}", path.display()))?;
    info!(report = name, "report written");
    Ok(path)
}
