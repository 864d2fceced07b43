use chrono::NaiveDate;
use claims_core::{record::ClaimRecord, DashboardBundle, PipelineConfig};
use serde_json::Value;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn sample() -> Vec<ClaimRecord> {
    vec![
        ClaimRecord::new(
            "P-1".into(),
            Some("MH".into()),
            Some("Mumbai".into()),
            Some("400001".into()),
            Some("Agent".into()),
            Some(date("2023-01-01")),
            Some(date("2023-06-01")),
            Some(date("2023-06-10")),
            Some("Document Forgery".into()),
        ),
        ClaimRecord::new(
            "P-2".into(),
            Some("MH".into()),
            Some("Pune".into()),
            Some("411001".into()),
            Some("Direct".into()),
            Some(date("2023-02-01")),
            None,
            None,
            None,
        ),
        ClaimRecord::new(
            "P-3".into(),
            Some("KA".into()),
            Some("Bengaluru".into()),
            Some("560001".into()),
            Some("Agent".into()),
            Some(date("2023-03-01")),
            Some(date("2023-07-15")),
            Some(date("2023-07-20")),
            Some("No Fraud".into()),
        ),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// An empty filtered set assembles a complete, well-formed bundle with zero
/// counts and empty series — the "no data" contract.
#[test]
fn empty_input_builds_an_empty_bundle() {
    let bundle = DashboardBundle::build(&[], &PipelineConfig::default());

    assert_eq!(bundle.kpis.total_claims, 0);
    assert_eq!(bundle.kpis.fraud_rate, 0.0);
    assert!(bundle.treemap.is_empty());
    assert!(bundle.channel_counts.points.is_empty());
    assert!(bundle.state_counts.points.is_empty());
    assert!(bundle.fraud_hotspots.points.is_empty());
    assert!(bundle.state_channel.is_empty());
    assert!(bundle.policy_to_death_hist.is_empty());
    assert!(bundle.death_to_intimation_hist.is_empty());
    assert!(bundle.monthly_trend.is_empty());
    assert!(bundle.radar.is_empty());
    assert!(bundle.scatter.is_empty());
    assert!(bundle.table_rows.is_empty());
    // The column schema is part of the contract even with no rows.
    assert!(!bundle.table_columns.is_empty());
}

/// The hotspot ranking covers fraud-flagged records only and labels groups
/// as "CITY (POSTCODE)".
#[test]
fn hotspots_are_fraud_only_with_city_postcode_labels() {
    let bundle = DashboardBundle::build(&sample(), &PipelineConfig::default());

    // P-3 is "No Fraud" and P-2 has no category; only P-1 qualifies.
    assert_eq!(bundle.fraud_hotspots.points.len(), 1);
    assert_eq!(bundle.fraud_hotspots.points[0].label, "Mumbai (400001)");
    assert_eq!(bundle.fraud_hotspots.points[0].value, 1);
}

/// Bar series carry (label, value) points in first-seen order.
#[test]
fn bar_series_reshape_category_counts() {
    let bundle = DashboardBundle::build(&sample(), &PipelineConfig::default());

    let channels: Vec<(&str, u64)> = bundle
        .channel_counts
        .points
        .iter()
        .map(|p| (p.label.as_str(), p.value))
        .collect();
    assert_eq!(channels, vec![("Agent", 2), ("Direct", 1)]);

    let states: Vec<(&str, u64)> = bundle
        .state_counts
        .points
        .iter()
        .map(|p| (p.label.as_str(), p.value))
        .collect();
    assert_eq!(states, vec![("MH", 2), ("KA", 1)]);
}

/// The stacked view flattens cross-tab cells into (x, series, value)
/// triples, zero cells included.
#[test]
fn stacked_view_covers_every_state_channel_cell() {
    let bundle = DashboardBundle::build(&sample(), &PipelineConfig::default());

    // 2 states × 2 channels.
    assert_eq!(bundle.state_channel.len(), 4);
    let ka_direct = bundle
        .state_channel
        .iter()
        .find(|p| p.x == "KA" && p.series == "Direct")
        .unwrap();
    assert_eq!(ka_direct.value, 0, "Absent combinations appear as zero cells");
}

/// Scatter points exist only for records with both day deltas and a channel.
#[test]
fn scatter_drops_rows_with_missing_parts() {
    let bundle = DashboardBundle::build(&sample(), &PipelineConfig::default());

    assert_eq!(bundle.scatter.len(), 2);
    let agent = &bundle.scatter[0];
    assert_eq!(agent.x, 151);
    assert_eq!(agent.y, 9);
    assert_eq!(agent.series, "Agent");
}

/// Table rows render dates as YYYY-MM-DD and missing values as JSON null,
/// keyed by the declared column ids.
#[test]
fn table_rows_follow_the_column_schema() {
    let bundle = DashboardBundle::build(&sample(), &PipelineConfig::default());

    assert_eq!(bundle.table_rows.len(), 3);
    let ids: Vec<&str> = bundle.table_columns.iter().map(|c| c.id.as_str()).collect();
    for row in &bundle.table_rows {
        for id in &ids {
            assert!(row.contains_key(*id), "Row missing column id {id}");
        }
    }

    let first = &bundle.table_rows[0];
    assert_eq!(first["policy_start"], Value::String("2023-01-01".into()));
    assert_eq!(first["policy_to_death_days"], Value::from(151));

    let second = &bundle.table_rows[1];
    assert_eq!(second["death_date"], Value::Null);
    assert_eq!(second["policy_to_death_days"], Value::Null);

    let numeric: Vec<&str> = bundle
        .table_columns
        .iter()
        .filter(|c| c.numeric)
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(
        numeric,
        vec!["policy_to_death_days", "death_to_intimation_days"]
    );
}

/// The whole bundle serializes to one JSON document and round-trips.
#[test]
fn bundle_serializes_as_one_document() {
    let bundle = DashboardBundle::build(&sample(), &PipelineConfig::default());

    let json = serde_json::to_string(&bundle).unwrap();
    let back: DashboardBundle = serde_json::from_str(&json).unwrap();
    assert_eq!(back, bundle);
}
