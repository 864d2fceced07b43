use chrono::NaiveDate;
use claims_core::{
    aggregate::{
        count_by, count_by_pair, fraud_rate, histogram, kpi_summary, state_channel_crosstab,
        top_n, CategoryCount,
    },
    record::ClaimRecord,
    PipelineConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn record(
    state: &str,
    channel: &str,
    start: Option<&str>,
    death: Option<&str>,
    intimation: Option<&str>,
    fraud: Option<&str>,
) -> ClaimRecord {
    ClaimRecord::new(
        "P-1".into(),
        Some(state.into()),
        Some("Mumbai".into()),
        Some("400001".into()),
        Some(channel.into()),
        start.map(date),
        death.map(date),
        intimation.map(date),
        fraud.map(String::from),
    )
}

fn counts(pairs: &[(&str, u64)]) -> Vec<CategoryCount> {
    pairs
        .iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count: *count,
        })
        .collect()
}

// ── Category counts ──────────────────────────────────────────────────────────

/// The worked scenario: two MH records count as {"MH": 2} and an overall
/// fraud rate of 50.0%.
#[test]
fn scenario_counts_and_fraud_rate() {
    let records = vec![
        record(
            "MH",
            "Agent",
            Some("2023-01-01"),
            Some("2023-06-01"),
            Some("2023-06-10"),
            None,
        ),
        record("MH", "Direct", Some("2023-02-01"), None, None, Some("Fraudulent")),
    ];

    assert_eq!(records[0].policy_to_death_days, Some(151));
    assert_eq!(records[0].death_to_intimation_days, Some(9));
    assert_eq!(records[1].policy_to_death_days, None);
    assert_eq!(records[1].death_to_intimation_days, None);

    let by_state = count_by(&records, |r| r.state.clone());
    assert_eq!(by_state, counts(&[("MH", 2)]));

    assert_eq!(fraud_rate(&records, "No Fraud", 2), 50.0);
}

/// Groups come back in first-seen order, and a missing key skips the record.
#[test]
fn count_by_is_first_seen_ordered() {
    let mut records = vec![
        record("KA", "Agent", None, None, None, None),
        record("MH", "Agent", None, None, None, None),
        record("KA", "Direct", None, None, None, None),
    ];
    records.push(ClaimRecord::new(
        "P-x".into(),
        None,
        None,
        None,
        Some("Agent".into()),
        None,
        None,
        None,
        None,
    ));

    let by_state = count_by(&records, |r| r.state.clone());
    assert_eq!(by_state, counts(&[("KA", 2), ("MH", 1)]));
}

/// The sentinel category is not fraud; any other present category is.
#[test]
fn fraud_flag_uses_the_explicit_sentinel() {
    let records = vec![
        record("MH", "Agent", None, None, None, Some("No Fraud")),
        record("MH", "Agent", None, None, None, Some("Document Forgery")),
        record("MH", "Agent", None, None, None, None),
    ];

    assert!(!records[0].is_fraud("No Fraud"));
    assert!(records[1].is_fraud("No Fraud"));
    assert!(!records[2].is_fraud("No Fraud"));
    assert_eq!(fraud_rate(&records, "No Fraud", 2), 33.33);
}

// ── Top-N ────────────────────────────────────────────────────────────────────

/// Top-N twice is Top-N once.
#[test]
fn top_n_is_idempotent() {
    let input = counts(&[("A", 3), ("B", 9), ("C", 1), ("D", 9), ("E", 5)]);

    let once = top_n(input.clone(), 3);
    let twice = top_n(once.clone(), 3);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 3);
}

/// Ties keep first-seen order; fewer groups than N returns them all.
#[test]
fn top_n_ties_are_stable_and_short_input_is_kept() {
    let input = counts(&[("A", 2), ("B", 5), ("C", 2)]);

    let ranked = top_n(input.clone(), 10);
    assert_eq!(ranked, counts(&[("B", 5), ("A", 2), ("C", 2)]));
}

// ── Cross-tab ────────────────────────────────────────────────────────────────

/// Only the top states survive, but channels inside a kept state are never
/// truncated, and absent combinations appear as zero cells.
#[test]
fn crosstab_restricts_states_not_channels() {
    let mut records = Vec::new();
    for _ in 0..5 {
        records.push(record("MH", "Agent", None, None, None, None));
    }
    for _ in 0..3 {
        records.push(record("MH", "Direct", None, None, None, None));
    }
    for _ in 0..4 {
        records.push(record("KA", "Online", None, None, None, None));
    }
    records.push(record("TN", "Agent", None, None, None, None));

    let crosstab = state_channel_crosstab(&records, 2);

    // MH (8) and KA (4) beat TN (1).
    assert_eq!(crosstab.states, vec!["MH".to_string(), "KA".to_string()]);
    assert_eq!(
        crosstab.channels,
        vec!["Agent".to_string(), "Direct".to_string(), "Online".to_string()]
    );
    assert_eq!(crosstab.cells.len(), 6);

    let cell = |state: &str, channel: &str| {
        crosstab
            .cells
            .iter()
            .find(|c| c.state == state && c.channel == channel)
            .map(|c| c.count)
            .unwrap()
    };
    assert_eq!(cell("MH", "Agent"), 5);
    assert_eq!(cell("MH", "Direct"), 3);
    assert_eq!(cell("MH", "Online"), 0);
    assert_eq!(cell("KA", "Online"), 4);
}

/// An empty input produces an empty, well-formed cross-tab.
#[test]
fn crosstab_of_nothing_is_empty_not_an_error() {
    let crosstab = state_channel_crosstab(&[], 10);
    assert!(crosstab.states.is_empty());
    assert!(crosstab.channels.is_empty());
    assert!(crosstab.cells.is_empty());
}

// ── Pair counts ──────────────────────────────────────────────────────────────

/// Pair grouping skips records missing either field.
#[test]
fn count_by_pair_requires_both_fields() {
    let records = vec![
        record("MH", "Agent", None, None, None, None),
        record("MH", "Agent", None, None, None, None),
        ClaimRecord::new(
            "P-x".into(),
            Some("MH".into()),
            None,
            Some("400001".into()),
            None,
            None,
            None,
            None,
            None,
        ),
    ];

    let pairs = count_by_pair(&records, |r| Some((r.state.clone()?, r.city.clone()?)));
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].primary, "MH");
    assert_eq!(pairs[0].secondary, "Mumbai");
    assert_eq!(pairs[0].count, 2);
}

// ── Histogram ────────────────────────────────────────────────────────────────

/// Empty input yields no bins; it never raises.
#[test]
fn histogram_of_nothing_is_empty() {
    let result = histogram(std::iter::empty(), 30);
    assert!(result.is_empty());
}

/// All-equal values collapse to a single bin holding everything.
#[test]
fn histogram_with_constant_values_is_one_bin() {
    let result = histogram([7, 7, 7, 7].into_iter(), 30);

    assert_eq!(result.bins.len(), 1);
    assert_eq!(result.bins[0].start, 7.0);
    assert_eq!(result.bins[0].end, 7.0);
    assert_eq!(result.bins[0].count, 4);
}

/// Equal-width bins span [min, max]; the max value lands in the last bin.
#[test]
fn histogram_bins_span_min_to_max() {
    let result = histogram([0, 5, 10, 10, 20].into_iter(), 4);

    assert_eq!(result.bins.len(), 4);
    assert_eq!(result.bins[0].start, 0.0);
    assert_eq!(result.bins[3].end, 20.0);

    let total: u64 = result.bins.iter().map(|b| b.count).sum();
    assert_eq!(total, 5, "Every value must land in exactly one bin");
    assert_eq!(result.bins[0].count, 1); // 0
    assert_eq!(result.bins[1].count, 1); // 5
    assert_eq!(result.bins[2].count, 2); // 10, 10
    assert_eq!(result.bins[3].count, 1); // 20
}

// ── KPI summary ──────────────────────────────────────────────────────────────

/// Empty input produces zeros and absent means — never an error or NaN.
#[test]
fn kpi_summary_of_nothing_is_well_formed() {
    let summary = kpi_summary(&[], &PipelineConfig::default());

    assert_eq!(summary.total_claims, 0);
    assert_eq!(summary.fraud_claims, 0);
    assert_eq!(summary.fraud_rate, 0.0);
    assert_eq!(summary.avg_policy_to_death_days, None);
    assert_eq!(summary.avg_death_to_intimation_days, None);
}

/// Means cover only records where the day count exists; a null never counts
/// as zero.
#[test]
fn kpi_means_exclude_missing_day_counts() {
    let records = vec![
        record(
            "MH",
            "Agent",
            Some("2023-01-01"),
            Some("2023-01-11"),
            Some("2023-01-13"),
            Some("Fraudulent"),
        ),
        record("MH", "Direct", Some("2023-02-01"), None, None, None),
        record(
            "KA",
            "Agent",
            Some("2023-01-01"),
            Some("2023-01-21"),
            None,
            None,
        ),
    ];

    let summary = kpi_summary(&records, &PipelineConfig::default());
    assert_eq!(summary.total_claims, 3);
    assert_eq!(summary.fraud_claims, 1);
    assert_eq!(summary.fraud_rate, 33.33);
    // (10 + 20) / 2, not (10 + 0 + 20) / 3.
    assert_eq!(summary.avg_policy_to_death_days, Some(15.0));
    assert_eq!(summary.avg_death_to_intimation_days, Some(2.0));
}
