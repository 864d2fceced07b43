//! A dashboard session — one immutable record snapshot plus a generation
//! counter for last-write-wins view updates.
//!
//! RULES:
//!   - The snapshot is never mutated after ingestion; a schema or data change
//!     means building a fresh session from a fresh ingestion.
//!   - Every `submit` recomputes the full bundle from scratch against the
//!     snapshot; there is no incremental update and no cached aggregate.
//!   - Each submit gets a strictly increasing generation number. A consumer
//!     holding an update checks `is_stale` and drops superseded bundles, so
//!     overlapping submissions converge to the most recent criteria.

use crate::{
    config::PipelineConfig,
    error::PipelineResult,
    filter::FilterCriteria,
    ingest::{self, FilterOptions, InputFormat, Ingestion, ParseWarning, TableSchema},
    record::ClaimRecord,
    view::DashboardBundle,
};
use serde::{Deserialize, Serialize};

/// Generation number of a submitted filter change.
pub type Generation = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewUpdate {
    pub generation: Generation,
    pub bundle: DashboardBundle,
}

#[derive(Debug)]
pub struct Session {
    records: Vec<ClaimRecord>,
    config: PipelineConfig,
    warnings: Vec<ParseWarning>,
    latest_generation: Generation,
}

impl Session {
    pub fn new(records: Vec<ClaimRecord>, config: PipelineConfig) -> Self {
        Self {
            records,
            config,
            warnings: Vec::new(),
            latest_generation: 0,
        }
    }

    /// Ingest raw bytes and open a session over the result in one step.
    pub fn from_bytes(
        bytes: &[u8],
        format: InputFormat,
        schema: &TableSchema,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        let Ingestion { records, warnings } = ingest::ingest(bytes, format, schema, &config)?;
        Ok(Self {
            records,
            config,
            warnings,
            latest_generation: 0,
        })
    }

    pub fn records(&self) -> &[ClaimRecord] {
        &self.records
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Options for populating the filter widgets, derived from the snapshot.
    pub fn options(&self) -> FilterOptions {
        ingest::filter_options(&self.records)
    }

    /// Run filter → aggregate → assemble for one set of criteria. The
    /// returned generation supersedes every earlier one.
    pub fn submit(&mut self, criteria: &FilterCriteria) -> ViewUpdate {
        self.latest_generation += 1;
        let filtered = criteria.apply(&self.records);
        ViewUpdate {
            generation: self.latest_generation,
            bundle: DashboardBundle::build(&filtered, &self.config),
        }
    }

    pub fn latest_generation(&self) -> Generation {
        self.latest_generation
    }

    /// Whether an update has been superseded by a later `submit`.
    pub fn is_stale(&self, generation: Generation) -> bool {
        generation < self.latest_generation
    }
}
