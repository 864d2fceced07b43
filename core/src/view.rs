//! The view assembler — aggregation output reshaped into the exact structures
//! the rendering layer consumes. No computation happens here beyond renaming,
//! label formatting, and table-row flattening.

use crate::{
    aggregate::{
        self, channel_radar, count_by, count_by_pair, kpi_summary, monthly_fraud_trend,
        state_channel_crosstab, top_n_pairs, CategoryCount, Histogram, KpiSummary, MonthlyPoint,
    },
    config::PipelineConfig,
    record::ClaimRecord,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ── Chart-ready shapes ───────────────────────────────────────────────────────

/// One (label, value) point of a bar/pie-style chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

/// One (x, series, value) triple of a grouped/stacked chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedPoint {
    pub x: String,
    pub series: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBar {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: u64,
}

/// One node of the two-level state → city treemap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreemapNode {
    pub state: String,
    pub city: String,
    pub count: u64,
}

/// One (x, y) point of the day-delta relationship scatter, keyed by channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: i64,
    pub y: i64,
    pub series: String,
}

/// One closed radar trace: a channel with its normalized metric spokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarTrace {
    pub channel: String,
    pub metrics: Vec<RadarMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarMetric {
    pub label: String,
    pub normalized: f64,
}

// ── Table schema ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Display name.
    pub name: String,
    /// Key into each row object.
    pub id: String,
    /// Hint for right-alignment / numeric formatting.
    pub numeric: bool,
}

// ── The bundle ───────────────────────────────────────────────────────────────

/// Everything the rendering layer needs for one filter state, serializable as
/// a single JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardBundle {
    pub kpis: KpiSummary,
    /// State → city claim counts (treemap).
    pub treemap: Vec<TreemapNode>,
    /// Claim counts per channel (bar).
    pub channel_counts: LabeledSeries,
    /// Claim counts per state (bar).
    pub state_counts: LabeledSeries,
    /// Fraud-only postcode/city ranking, top-N (horizontal bar).
    pub fraud_hotspots: LabeledSeries,
    /// State × channel counts over the top states (stacked bar).
    pub state_channel: Vec<StackedPoint>,
    pub policy_to_death_hist: Vec<HistogramBar>,
    pub death_to_intimation_hist: Vec<HistogramBar>,
    /// Monthly totals, fraud counts and rates, chronological.
    pub monthly_trend: Vec<MonthlyPoint>,
    /// Top-channel normalized profiles (radar).
    pub radar: Vec<RadarTrace>,
    /// Day-delta relationship per channel; rows with any missing part dropped.
    pub scatter: Vec<ScatterPoint>,
    pub table_columns: Vec<TableColumn>,
    pub table_rows: Vec<Map<String, Value>>,
}

impl DashboardBundle {
    /// Assemble every view from an already-filtered record set.
    pub fn build(records: &[ClaimRecord], config: &PipelineConfig) -> Self {
        let fraud_only: Vec<&ClaimRecord> = records
            .iter()
            .filter(|r| r.is_fraud(&config.no_fraud_sentinel))
            .collect();

        let hotspots = top_n_pairs(
            count_by_pair(fraud_only.iter().copied(), |r| {
                Some((r.postcode.clone()?, r.city.clone()?))
            }),
            config.top_hotspots,
        );

        Self {
            kpis: kpi_summary(records, config),
            treemap: count_by_pair(records, |r| Some((r.state.clone()?, r.city.clone()?)))
                .into_iter()
                .map(|pair| TreemapNode {
                    state: pair.primary,
                    city: pair.secondary,
                    count: pair.count,
                })
                .collect(),
            channel_counts: labeled_series(
                "Claims by Channel",
                count_by(records, |r| r.channel.clone()),
            ),
            state_counts: labeled_series(
                "Claims by State",
                count_by(records, |r| r.state.clone()),
            ),
            fraud_hotspots: LabeledSeries {
                name: "Top Fraud Hotspots".into(),
                points: hotspots
                    .into_iter()
                    .map(|pair| SeriesPoint {
                        // "CITY (POSTCODE)"
                        label: format!("{} ({})", pair.secondary, pair.primary),
                        value: pair.count,
                    })
                    .collect(),
            },
            state_channel: state_channel_crosstab(records, config.top_states)
                .cells
                .into_iter()
                .map(|cell| StackedPoint {
                    x: cell.state,
                    series: cell.channel,
                    value: cell.count,
                })
                .collect(),
            policy_to_death_hist: histogram_bars(aggregate::histogram(
                records.iter().filter_map(|r| r.policy_to_death_days),
                config.histogram_bins,
            )),
            death_to_intimation_hist: histogram_bars(aggregate::histogram(
                records.iter().filter_map(|r| r.death_to_intimation_days),
                config.histogram_bins,
            )),
            monthly_trend: monthly_fraud_trend(records, &config.no_fraud_sentinel),
            radar: channel_radar(records, config.top_radar_channels)
                .into_iter()
                .map(|profile| RadarTrace {
                    channel: profile.channel,
                    metrics: vec![
                        RadarMetric {
                            label: "Policy to Death".into(),
                            normalized: profile.policy_to_death_norm,
                        },
                        RadarMetric {
                            label: "Death to Intimation".into(),
                            normalized: profile.death_to_intimation_norm,
                        },
                        RadarMetric {
                            label: "Count".into(),
                            normalized: profile.count_norm,
                        },
                    ],
                })
                .collect(),
            scatter: records
                .iter()
                .filter_map(|r| {
                    Some(ScatterPoint {
                        x: r.policy_to_death_days?,
                        y: r.death_to_intimation_days?,
                        series: r.channel.clone()?,
                    })
                })
                .collect(),
            table_columns: table_columns(),
            table_rows: records.iter().map(table_row).collect(),
        }
    }
}

fn labeled_series(name: &str, counts: Vec<CategoryCount>) -> LabeledSeries {
    LabeledSeries {
        name: name.into(),
        points: counts
            .into_iter()
            .map(|c| SeriesPoint {
                label: c.label,
                value: c.count,
            })
            .collect(),
    }
}

fn histogram_bars(histogram: Histogram) -> Vec<HistogramBar> {
    histogram
        .bins
        .into_iter()
        .map(|bin| HistogramBar {
            bucket_start: bin.start,
            bucket_end: bin.end,
            count: bin.count,
        })
        .collect()
}

// ── Table assembly ───────────────────────────────────────────────────────────

fn table_columns() -> Vec<TableColumn> {
    let column = |name: &str, id: &str, numeric: bool| TableColumn {
        name: name.into(),
        id: id.into(),
        numeric,
    };
    vec![
        column("Policy Number", "policy_id", false),
        column("State", "state", false),
        column("City", "city", false),
        column("Postcode", "postcode", false),
        column("Channel", "channel", false),
        column("Policy Start", "policy_start", false),
        column("Death Date", "death_date", false),
        column("Intimation Date", "intimation_date", false),
        column("Policy to Death Days", "policy_to_death_days", true),
        column("Death to Intimation Days", "death_to_intimation_days", true),
        column("Fraud Category", "fraud_category", false),
    ]
}

fn table_row(record: &ClaimRecord) -> Map<String, Value> {
    let date = |d: Option<NaiveDate>| match d {
        Some(d) => json!(d.format("%Y-%m-%d").to_string()),
        None => Value::Null,
    };
    let text = |s: &Option<String>| match s {
        Some(s) => json!(s),
        None => Value::Null,
    };

    let mut row = Map::new();
    row.insert("policy_id".into(), json!(record.policy_id));
    row.insert("state".into(), text(&record.state));
    row.insert("city".into(), text(&record.city));
    row.insert("postcode".into(), text(&record.postcode));
    row.insert("channel".into(), text(&record.channel));
    row.insert("policy_start".into(), date(record.policy_start));
    row.insert("death_date".into(), date(record.death_date));
    row.insert("intimation_date".into(), date(record.intimation_date));
    row.insert(
        "policy_to_death_days".into(),
        record.policy_to_death_days.map_or(Value::Null, |v| json!(v)),
    );
    row.insert(
        "death_to_intimation_days".into(),
        record
            .death_to_intimation_days
            .map_or(Value::Null, |v| json!(v)),
    );
    row.insert("fraud_category".into(), text(&record.fraud_category));
    row
}
