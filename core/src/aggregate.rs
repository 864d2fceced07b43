//! The aggregation engine — every named view reduces to the parameterized
//! primitives here: group-count, top-N, cross-tab, histogram, monthly trend,
//! normalized channel profiles, and the KPI summary.
//!
//! Every function is total over empty input: zero records produce a
//! structurally valid empty result, and every rate guards its denominator.

use crate::{
    config::PipelineConfig,
    record::ClaimRecord,
    types::DayCount,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ── Category counts ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: u64,
}

/// Group-count one categorical key in first-seen order. Records whose key is
/// missing are skipped, not counted under a placeholder.
pub fn count_by<'a, I, F>(records: I, key: F) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a ClaimRecord>,
    F: Fn(&ClaimRecord) -> Option<String>,
{
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let Some(label) = key(record) else { continue };
        match index.get(&label) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert(label.clone(), counts.len());
                counts.push(CategoryCount { label, count: 1 });
            }
        }
    }
    counts
}

/// Keep the `n` largest groups by count. The sort is stable, so ties keep
/// first-seen order and the operation is idempotent.
pub fn top_n(mut counts: Vec<CategoryCount>, n: usize) -> Vec<CategoryCount> {
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

// ── Pair counts ──────────────────────────────────────────────────────────────

/// A count grouped by two categorical fields (state × city, postcode × city).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairCount {
    pub primary: String,
    pub secondary: String,
    pub count: u64,
}

/// Group-count a two-field key in first-seen order; records with either field
/// missing are skipped.
pub fn count_by_pair<'a, I, F>(records: I, key: F) -> Vec<PairCount>
where
    I: IntoIterator<Item = &'a ClaimRecord>,
    F: Fn(&ClaimRecord) -> Option<(String, String)>,
{
    let mut counts: Vec<PairCount> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let Some((primary, secondary)) = key(record) else {
            continue;
        };
        match index.get(&(primary.clone(), secondary.clone())) {
            Some(&slot) => counts[slot].count += 1,
            None => {
                index.insert((primary.clone(), secondary.clone()), counts.len());
                counts.push(PairCount {
                    primary,
                    secondary,
                    count: 1,
                });
            }
        }
    }
    counts
}

/// Top-N over pair counts; stable like [`top_n`], hence idempotent.
pub fn top_n_pairs(mut counts: Vec<PairCount>, n: usize) -> Vec<PairCount> {
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

// ── State × channel cross-tab ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTabCell {
    pub state: String,
    pub channel: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTab {
    /// Kept states, ordered by total count descending.
    pub states: Vec<String>,
    /// All channels present in the filtered set, sorted by name.
    pub channels: Vec<String>,
    /// One cell per kept state × channel, zero counts included.
    pub cells: Vec<CrossTabCell>,
}

/// Count (state, channel) pairs, restricted to the top-`top_states` states by
/// their total across all channels. Channels within a kept state are never
/// truncated.
pub fn state_channel_crosstab(records: &[ClaimRecord], top_states: usize) -> CrossTab {
    let state_totals = top_n(count_by(records, |r| r.state.clone()), top_states);
    let states: Vec<String> = state_totals.into_iter().map(|c| c.label).collect();

    let channels: BTreeSet<String> = records.iter().filter_map(|r| r.channel.clone()).collect();
    let channels: Vec<String> = channels.into_iter().collect();

    let mut pair_counts: HashMap<(&str, &str), u64> = HashMap::new();
    for record in records {
        if let (Some(state), Some(channel)) = (&record.state, &record.channel) {
            *pair_counts.entry((state, channel)).or_insert(0) += 1;
        }
    }

    let mut cells = Vec::with_capacity(states.len() * channels.len());
    for state in &states {
        for channel in &channels {
            let count = pair_counts
                .get(&(state.as_str(), channel.as_str()))
                .copied()
                .unwrap_or(0);
            cells.push(CrossTabCell {
                state: state.clone(),
                channel: channel.clone(),
                count,
            });
        }
    }

    CrossTab {
        states,
        channels,
        cells,
    }
}

// ── Histogram ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Partition values into `bin_count` equal-width bins over [min, max]. Nulls
/// never reach this function; callers pass only present values. No values
/// (or a zero bin count) yields no bins; `min == max` yields a single bin
/// holding everything.
pub fn histogram<I: IntoIterator<Item = DayCount>>(values: I, bin_count: usize) -> Histogram {
    let values: Vec<f64> = values.into_iter().map(|v| v as f64).collect();
    if values.is_empty() || bin_count == 0 {
        return Histogram { bins: Vec::new() };
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return Histogram {
            bins: vec![HistogramBin {
                start: min,
                end: max,
                count: values.len() as u64,
            }],
        };
    }

    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for value in values {
        let slot = (((value - min) / width) as usize).min(bin_count - 1);
        bins[slot].count += 1;
    }

    Histogram { bins }
}

// ── Monthly fraud trend ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// First day of the month; the chronological sort key.
    pub month: NaiveDate,
    /// Display form, `YYYY-MM`.
    pub label: String,
    pub total_claims: u64,
    pub fraud_claims: u64,
    /// Percentage; exactly 0.0 for a bucket with no claims.
    pub fraud_rate: f64,
}

/// Group by death-month bucket, chronologically ordered. Records without a
/// death date have no bucket and are skipped.
pub fn monthly_fraud_trend(records: &[ClaimRecord], no_fraud_sentinel: &str) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for record in records {
        let Some(month) = record.death_month else { continue };
        let entry = buckets.entry(month).or_insert((0, 0));
        entry.0 += 1;
        if record.is_fraud(no_fraud_sentinel) {
            entry.1 += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(month, (total, fraud))| MonthlyPoint {
            month,
            label: month.format("%Y-%m").to_string(),
            total_claims: total,
            fraud_claims: fraud,
            fraud_rate: if total > 0 {
                fraud as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

// ── Channel radar profiles ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub channel: String,
    /// Raw metric means; 0.0 when the channel has no non-null values.
    pub avg_policy_to_death: f64,
    pub avg_death_to_intimation: f64,
    pub count: u64,
    /// Min-max normalized across all channels present, before top-K cut.
    pub policy_to_death_norm: f64,
    pub death_to_intimation_norm: f64,
    pub count_norm: f64,
}

/// Midpoint used when a metric is constant across channels, so normalization
/// never divides by zero.
pub const NORMALIZED_MIDPOINT: f64 = 0.5;

/// Per-channel metric means plus count, each metric min-max normalized across
/// every channel present; only the top-`top_k` channels by raw count are
/// retained, descending.
pub fn channel_radar(records: &[ClaimRecord], top_k: usize) -> Vec<ChannelProfile> {
    struct Accumulator {
        channel: String,
        count: u64,
        policy_to_death: Vec<DayCount>,
        death_to_intimation: Vec<DayCount>,
    }

    let mut groups: Vec<Accumulator> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let Some(channel) = &record.channel else { continue };
        let slot = *index.entry(channel.clone()).or_insert_with(|| {
            groups.push(Accumulator {
                channel: channel.clone(),
                count: 0,
                policy_to_death: Vec::new(),
                death_to_intimation: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].count += 1;
        if let Some(days) = record.policy_to_death_days {
            groups[slot].policy_to_death.push(days);
        }
        if let Some(days) = record.death_to_intimation_days {
            groups[slot].death_to_intimation.push(days);
        }
    }

    let raw_mean = |values: &[DayCount]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<DayCount>() as f64 / values.len() as f64
        }
    };

    let avg_policy: Vec<f64> = groups.iter().map(|g| raw_mean(&g.policy_to_death)).collect();
    let avg_intimation: Vec<f64> = groups
        .iter()
        .map(|g| raw_mean(&g.death_to_intimation))
        .collect();
    let counts: Vec<f64> = groups.iter().map(|g| g.count as f64).collect();

    let policy_norm = min_max_normalize(&avg_policy);
    let intimation_norm = min_max_normalize(&avg_intimation);
    let count_norm = min_max_normalize(&counts);

    let mut profiles: Vec<ChannelProfile> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| ChannelProfile {
            channel: g.channel.clone(),
            avg_policy_to_death: avg_policy[i],
            avg_death_to_intimation: avg_intimation[i],
            count: g.count,
            policy_to_death_norm: policy_norm[i],
            death_to_intimation_norm: intimation_norm[i],
            count_norm: count_norm[i],
        })
        .collect();

    profiles.sort_by(|a, b| b.count.cmp(&a.count));
    profiles.truncate(top_k);
    profiles
}

/// (value − min) / (max − min) per element; every element maps to
/// [`NORMALIZED_MIDPOINT`] when max equals min.
fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|&v| {
            if max > min {
                (v - min) / (max - min)
            } else {
                NORMALIZED_MIDPOINT
            }
        })
        .collect()
}

// ── KPI summary ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_claims: u64,
    pub fraud_claims: u64,
    /// Percentage, rounded; exactly 0.0 when there are no claims.
    pub fraud_rate: f64,
    /// `None` when no record has both dates — distinct from a zero-day mean.
    pub avg_policy_to_death_days: Option<f64>,
    pub avg_death_to_intimation_days: Option<f64>,
}

/// Overall fraud rate as a rounded percentage; 0.0 when `records` is empty.
pub fn fraud_rate(records: &[ClaimRecord], no_fraud_sentinel: &str, decimals: u32) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let fraud = records
        .iter()
        .filter(|r| r.is_fraud(no_fraud_sentinel))
        .count();
    round_to(fraud as f64 / records.len() as f64 * 100.0, decimals)
}

pub fn kpi_summary(records: &[ClaimRecord], config: &PipelineConfig) -> KpiSummary {
    let fraud_claims = records
        .iter()
        .filter(|r| r.is_fraud(&config.no_fraud_sentinel))
        .count() as u64;

    KpiSummary {
        total_claims: records.len() as u64,
        fraud_claims,
        fraud_rate: fraud_rate(records, &config.no_fraud_sentinel, config.rate_decimals),
        avg_policy_to_death_days: mean(
            records.iter().filter_map(|r| r.policy_to_death_days),
            config.mean_decimals,
        ),
        avg_death_to_intimation_days: mean(
            records.iter().filter_map(|r| r.death_to_intimation_days),
            config.mean_decimals,
        ),
    }
}

fn mean<I: Iterator<Item = DayCount>>(values: I, decimals: u32) -> Option<f64> {
    let mut sum: i64 = 0;
    let mut n: u64 = 0;
    for value in values {
        sum += value;
        n += 1;
    }
    if n == 0 {
        None
    } else {
        Some(round_to(sum as f64 / n as f64, decimals))
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
