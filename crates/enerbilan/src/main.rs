use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use enerbilan_core::{
    balance, geo,
    loader::load_required,
    pipeline::{self, StageOutcome},
    values::{coerce_f64, coerce_i64, text_values},
    PipelineConfig,
};
use polars::prelude::DataFrame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Regional energy balance pipeline", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct GlobalArgs {
    /// TOML file overriding the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the raw input files
    #[arg(long, global = true)]
    raw_dir: Option<PathBuf>,
    /// Directory receiving the processed outputs
    #[arg(long, global = true)]
    processed_dir: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean the raw files and build the balance table
    Run,
    /// Write the regional GeoJSON from the monthly raw file and the annual detail output
    Geojson,
    /// Print the persisted balance table
    Show(ShowArgs),
}

#[derive(Args, Debug, Default)]
struct ShowArgs {
    /// Only show rows for this year
    #[arg(long)]
    year: Option<i64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.json_logs);

    let config = resolve_config(&cli.global)?;

    match cli.command {
        Command::Run => handle_run(&config),
        Command::Geojson => handle_geojson(&config),
        Command::Show(args) => handle_show(&config, args),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(global: &GlobalArgs) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let mut config = match &global.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.apply_env();

    if let Some(dir) = &global.raw_dir {
        config.raw_dir = dir.clone();
    }
    if let Some(dir) = &global.processed_dir {
        config.processed_dir = dir.clone();
    }
    Ok(config)
}

fn handle_run(config: &PipelineConfig) -> Result<()> {
    let report = pipeline::run(config).context("energy balance pipeline failed")?;

    for stage in &report.stages {
        match &stage.outcome {
            StageOutcome::Written { path, rows } => {
                println!("  {:?}: {} rows -> {}", stage.stage, rows, path.display());
            }
            StageOutcome::Skipped { reason } => {
                println!("  {:?}: skipped ({})", stage.stage, reason);
            }
        }
    }
    println!(
        "Balance: {} region-years matched, {} dropped",
        report.balance.matched,
        report.balance.dropped()
    );

    if report.is_complete() {
        info!("all stages completed");
    } else {
        warn!("pipeline completed with skipped stages");
    }
    Ok(())
}

fn handle_geojson(config: &PipelineConfig) -> Result<()> {
    let export = geo::export_regions(config).context("GeoJSON export failed")?;
    println!(
        "Wrote {} regions to {} ({} without a usable shape)",
        export.features,
        export.path.display(),
        export.skipped
    );
    Ok(())
}

fn handle_show(config: &PipelineConfig, args: ShowArgs) -> Result<()> {
    let options = config.load_options(&[balance::REGION_CODE, balance::REGION_NAME], true)?;
    let df = load_required(&config.balance_output(), &options)
        .context("balance table not found; run `enerbilan run` first")?;

    let table = balance_table(&df, args.year)?;
    println!("{table}");
    Ok(())
}

fn balance_table(df: &DataFrame, year: Option<i64>) -> Result<Table> {
    let years = coerce_i64(df.column(balance::YEAR)?)?;
    let codes = text_values(df.column(balance::REGION_CODE)?)?;
    let names = text_values(df.column(balance::REGION_NAME)?)?;
    let consumption = coerce_f64(df.column(balance::CONSUMPTION_TOTAL)?)?;
    let production = coerce_f64(df.column(balance::PRODUCTION_TOTAL)?)?;
    let ratios = coerce_f64(df.column(balance::COVERAGE_RATIO)?)?;
    let statuses = text_values(df.column(balance::STATUS)?)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Year",
        "Region",
        "Name",
        "Consumption (MWh)",
        "Production (MWh)",
        "Coverage (%)",
        "Status",
    ]);

    for idx in 0..df.height() {
        if year.is_some() && years[idx] != year {
            continue;
        }
        table.add_row(vec![
            display(years[idx]),
            codes[idx].clone().unwrap_or_default(),
            names[idx].clone().unwrap_or_default(),
            display_mwh(consumption[idx]),
            display_mwh(production[idx]),
            ratios[idx].map(|r| format!("{r:.2}")).unwrap_or_else(|| "n/a".to_string()),
            statuses[idx].clone().unwrap_or_default(),
        ]);
    }
    Ok(table)
}

fn display<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn display_mwh(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.0}")).unwrap_or_default()
}
