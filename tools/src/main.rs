//! dataset-gen: headless runner for the merchant-month dataset.
//!
//! Usage:
//!   dataset-gen
//!   dataset-gen --seed 7 --merchants 2000 --out merchants.csv
//!   dataset-gen --config generator.json --db run.db --clean

use anyhow::Result;
use merchant_sim_core::{
    config::GeneratorConfig,
    dataset::DatasetSummary,
    export::{CsvExporter, Exporter, SqliteExporter},
    pipeline::DatasetPipeline,
    store::DatasetStore,
};
use std::env;
use uuid::Uuid;

const DEFAULT_OUT: &str = "saas_merchant_month_dataset.csv";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let clean = args.iter().any(|a| a == "--clean");
    let out = string_arg(&args, "--out").unwrap_or(DEFAULT_OUT);
    let db = string_arg(&args, "--db");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::standard(),
    };
    config.merchant_count = parse_arg(&args, "--merchants", config.merchant_count);

    let run_id = format!("run-{seed}-{}", Uuid::new_v4().simple());
    log::info!(
        "run {run_id}: seed={seed} merchants={} clean={clean}",
        config.merchant_count
    );

    let mut pipeline = DatasetPipeline::build(run_id, seed, config)?;
    let dataset = pipeline.run(!clean)?;

    let mut exporters: Vec<Box<dyn Exporter>> = vec![Box::new(CsvExporter::new(out))];
    if let Some(path) = db {
        exporters.push(Box::new(SqliteExporter::new(DatasetStore::open(path)?)?));
    }
    for exporter in &mut exporters {
        let written = exporter.export(&pipeline, &dataset)?;
        log::debug!("{} exporter wrote {written} rows", exporter.name());
    }

    println!("Dataset saved: {out}");
    println!("Rows: {}", dataset.len());
    print_summary(&pipeline, &dataset.summary());
    Ok(())
}

fn print_summary(pipeline: &DatasetPipeline, summary: &DatasetSummary) {
    println!();
    println!("=== RUN SUMMARY ===");
    println!("  run_id:            {}", pipeline.run_id);
    println!("  seed:              {}", pipeline.seed());
    println!("  months:            {}", pipeline.calendar().len());
    println!("  merchants:         {}", summary.merchants);
    println!("  rows:              {}", summary.rows);
    println!("  active rows:       {}", summary.active_rows);
    println!("  churned merchants: {}", summary.churned_merchants);
    println!("  closing MRR:       {:.2}", summary.closing_mrr);
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
