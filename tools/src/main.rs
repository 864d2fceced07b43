//! claims-runner: headless pipeline runner for the claims analytics core.
//!
//! Usage:
//!   claims-runner --input claims.csv
//!   claims-runner --input claims.tsv --tsv --states MH,KA --channels Agent
//!   claims-runner --input claims.csv --from 2023-01-01 --to 2023-12-31 --pretty

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use claims_core::{
    ingest::ParseWarning, DashboardBundle, FilterCriteria, FilterOptions, InputFormat,
    PipelineConfig, Session, TableSchema,
};
use std::env;

/// Everything a rendering layer needs from one run: the snapshot summary,
/// the widget options, and the assembled bundle.
#[derive(serde::Serialize)]
struct RunnerOutput {
    record_count: usize,
    warnings: Vec<ParseWarning>,
    options: FilterOptions,
    generation: u64,
    bundle: DashboardBundle,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let Some(input) = flag_value(&args, "--input") else {
        bail!("--input <file> is required");
    };
    let format = if args.iter().any(|a| a == "--tsv") {
        InputFormat::Tsv
    } else {
        InputFormat::Csv
    };
    let pretty = args.iter().any(|a| a == "--pretty");

    let config = match flag_value(&args, "--config") {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let criteria = FilterCriteria::unrestricted()
        .with_states(list_flag(&args, "--states"))
        .with_channels(list_flag(&args, "--channels"))
        .with_date_range(
            date_flag(&args, "--from")?,
            date_flag(&args, "--to")?,
        );

    let bytes = std::fs::read(input).with_context(|| format!("Failed to read {input}"))?;
    let mut session = Session::from_bytes(&bytes, format, &TableSchema::default(), config)?;

    log::info!(
        "Loaded {} records, {} parse warnings",
        session.records().len(),
        session.warnings().len()
    );

    let update = session.submit(&criteria);
    let output = RunnerOutput {
        record_count: session.records().len(),
        warnings: session.warnings().to_vec(),
        options: session.options(),
        generation: update.generation,
        bundle: update.bundle,
    };

    let json = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{json}");

    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Comma-separated list flag; absent flag means an empty (wildcard) set.
fn list_flag(args: &[String], flag: &str) -> Vec<String> {
    flag_value(args, flag)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn date_flag(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    match flag_value(args, flag) {
        None => Ok(None),
        Some(v) => {
            let date = NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got {v:?}"))?;
            Ok(Some(date))
        }
    }
}
