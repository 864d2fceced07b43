//! Ingestion and normalization — raw delimited bytes to typed claim records.
//!
//! This module:
//!   1. Validates the header row against the required-column schema
//!   2. Parses every row into a [`ClaimRecord`], coercing date cells
//!   3. Records a [`ParseWarning`] for each unparseable non-empty cell
//!   4. Derives the dropdown options the filter widgets are seeded with
//!
//! Missing a required column is the only fatal failure; a bad date in a row
//! makes that field missing, never fails the ingestion.

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    record::ClaimRecord,
    types::Category,
};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ── Input format ─────────────────────────────────────────────────────────────

/// Declared format of the uploaded bytes. Spreadsheet workbooks are converted
/// to delimited text by the upload layer before they reach the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Csv,
    Tsv,
    Delimited(u8),
}

impl InputFormat {
    fn delimiter(self) -> u8 {
        match self {
            InputFormat::Csv => b',',
            InputFormat::Tsv => b'\t',
            InputFormat::Delimited(d) => d,
        }
    }
}

// ── Schema ───────────────────────────────────────────────────────────────────

/// Canonical header names of the nine required columns. `Default` matches the
/// production export; a deployment with renamed headers overrides fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub policy_id: String,
    pub state: String,
    pub city: String,
    pub postcode: String,
    pub channel: String,
    pub policy_start: String,
    pub death_date: String,
    pub intimation_date: String,
    pub fraud_category: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            policy_id: "Dummy Policy No".into(),
            state: "CORRESPONDENCESTATE".into(),
            city: "CORRESPONDENCECITY".into(),
            postcode: "CORRESPONDENCEPOSTCODE".into(),
            channel: "CHANNEL".into(),
            policy_start: "POLICYRISKCOMMENCEMENTDATE".into(),
            death_date: "Date of Death".into(),
            intimation_date: "INTIMATIONDATE".into(),
            fraud_category: "Fraud Category".into(),
        }
    }
}

impl TableSchema {
    fn required(&self) -> [&str; 9] {
        [
            &self.policy_id,
            &self.state,
            &self.city,
            &self.postcode,
            &self.channel,
            &self.policy_start,
            &self.death_date,
            &self.intimation_date,
            &self.fraud_category,
        ]
    }
}

// ── Results ──────────────────────────────────────────────────────────────────

/// A non-fatal per-cell failure: the field became missing, the row survived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    /// 1-based data-row number (header row excluded).
    pub row: usize,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Ingestion {
    pub records: Vec<ClaimRecord>,
    pub warnings: Vec<ParseWarning>,
}

/// Distinct values and date bounds the filter widgets are populated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub states: Vec<Category>,
    pub channels: Vec<Category>,
    pub start_date_min: Option<NaiveDate>,
    pub start_date_max: Option<NaiveDate>,
}

// ── Ingestion ────────────────────────────────────────────────────────────────

/// Parse raw delimited bytes into normalized claim records.
///
/// Fails with [`PipelineError::Schema`] naming every missing required column;
/// otherwise returns all rows, with per-cell date failures downgraded to
/// [`ParseWarning`]s.
pub fn ingest(
    bytes: &[u8],
    format: InputFormat,
    schema: &TableSchema,
    config: &PipelineConfig,
) -> PipelineResult<Ingestion> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let column_index = |name: &str| headers.iter().position(|h| h.trim() == name);

    let mut missing: Vec<String> = Vec::new();
    for name in schema.required() {
        if column_index(name).is_none() {
            missing.push(name.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    // Indices are present after the check above.
    let idx = ColumnIndices {
        policy_id: column_index(&schema.policy_id).unwrap_or_default(),
        state: column_index(&schema.state).unwrap_or_default(),
        city: column_index(&schema.city).unwrap_or_default(),
        postcode: column_index(&schema.postcode).unwrap_or_default(),
        channel: column_index(&schema.channel).unwrap_or_default(),
        policy_start: column_index(&schema.policy_start).unwrap_or_default(),
        death_date: column_index(&schema.death_date).unwrap_or_default(),
        intimation_date: column_index(&schema.intimation_date).unwrap_or_default(),
        fraud_category: column_index(&schema.fraud_category).unwrap_or_default(),
    };

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (row_number, row) in reader.records().enumerate() {
        let row = row?;
        let row_number = row_number + 1;

        let cell = |i: usize| row.get(i).unwrap_or("");
        let policy_start = parse_date_cell(
            cell(idx.policy_start),
            row_number,
            &schema.policy_start,
            config,
            &mut warnings,
        );
        let death_date = parse_date_cell(
            cell(idx.death_date),
            row_number,
            &schema.death_date,
            config,
            &mut warnings,
        );
        let intimation_date = parse_date_cell(
            cell(idx.intimation_date),
            row_number,
            &schema.intimation_date,
            config,
            &mut warnings,
        );

        records.push(ClaimRecord::new(
            cell(idx.policy_id).trim().to_string(),
            non_empty(cell(idx.state)),
            non_empty(cell(idx.city)),
            non_empty(cell(idx.postcode)),
            non_empty(cell(idx.channel)),
            policy_start,
            death_date,
            intimation_date,
            non_empty(cell(idx.fraud_category)),
        ));
    }

    info!(
        "Ingested {} claim records ({} parse warnings)",
        records.len(),
        warnings.len()
    );

    Ok(Ingestion { records, warnings })
}

struct ColumnIndices {
    policy_id: usize,
    state: usize,
    city: usize,
    postcode: usize,
    channel: usize,
    policy_start: usize,
    death_date: usize,
    intimation_date: usize,
    fraud_category: usize,
}

/// Derive the filter-widget options from a normalized record set: sorted
/// distinct states and channels plus the policy-start date bounds.
pub fn filter_options(records: &[ClaimRecord]) -> FilterOptions {
    let states: BTreeSet<Category> = records.iter().filter_map(|r| r.state.clone()).collect();
    let channels: BTreeSet<Category> = records.iter().filter_map(|r| r.channel.clone()).collect();
    let start_dates = records.iter().filter_map(|r| r.policy_start);

    FilterOptions {
        states: states.into_iter().collect(),
        channels: channels.into_iter().collect(),
        start_date_min: start_dates.clone().min(),
        start_date_max: start_dates.max(),
    }
}

// ── Cell parsing ─────────────────────────────────────────────────────────────

/// Markers treated as an empty cell rather than a parse failure.
fn is_missing_marker(value: &str) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("na")
        || value.eq_ignore_ascii_case("n/a")
        || value.eq_ignore_ascii_case("null")
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("nat")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if is_missing_marker(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Tolerant date parse: empty/NA cells are silently missing, unparseable
/// non-empty cells are missing plus a warning.
fn parse_date_cell(
    value: &str,
    row: usize,
    column: &str,
    config: &PipelineConfig,
    warnings: &mut Vec<ParseWarning>,
) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if is_missing_marker(trimmed) {
        return None;
    }
    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    warn!("Row {row}: unparseable {column} value {trimmed:?}; treating as missing");
    warnings.push(ParseWarning {
        row,
        column: column.to_string(),
        value: trimmed.to_string(),
    });
    None
}
