//! Pipeline configuration — the tunable constants behind every view.
//!
//! Defaults reproduce the production dashboard: top-10 rankings, 30-bin
//! histograms, top-5 radar channels, "No Fraud" sentinel. A deployment can
//! override any of them from a JSON file via [`PipelineConfig::load`].

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of states kept in the state × channel cross-tab.
    pub top_states: usize,
    /// Number of postcode/city groups kept in the fraud hotspot ranking.
    pub top_hotspots: usize,
    /// Number of channels retained in the radar profile view.
    pub top_radar_channels: usize,
    /// Equal-width bin count for the day-delta histograms.
    pub histogram_bins: usize,
    /// Fraud category value that means "reviewed, not fraud".
    pub no_fraud_sentinel: String,
    /// Decimal places for fraud-rate percentages.
    pub rate_decimals: u32,
    /// Decimal places for KPI day-count means.
    pub mean_decimals: u32,
    /// Date formats tried in order when parsing date cells.
    pub date_formats: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_states: 10,
            top_hotspots: 10,
            top_radar_channels: 5,
            histogram_bins: 30,
            no_fraud_sentinel: "No Fraud".into(),
            rate_decimals: 2,
            mean_decimals: 1,
            date_formats: vec![
                "%Y-%m-%d".into(),
                "%Y-%m-%d %H:%M:%S".into(),
                "%d/%m/%Y".into(),
                "%d-%m-%Y".into(),
                "%m/%d/%Y".into(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Load overrides from a JSON file. Unspecified fields keep their
    /// defaults via `#[serde(default)]`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {path}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config {path}"))?;
        Ok(config)
    }
}
