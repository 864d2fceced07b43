//! claims-core — the insurance-claims analytics pipeline.
//!
//! PIPELINE (fixed order, every stage pure):
//!   1. Ingestion     — delimited bytes → normalized [`record::ClaimRecord`]s
//!   2. Filter engine — [`filter::FilterCriteria`] → filtered subset
//!   3. Aggregation   — the named summaries every chart is built from
//!   4. View assembly — [`view::DashboardBundle`], the full rendering contract
//!
//! A [`session::Session`] owns one immutable snapshot and replays stages 2–4
//! on every filter change. Nothing is persisted and nothing is shared between
//! sessions.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod record;
pub mod session;
pub mod types;
pub mod view;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use filter::FilterCriteria;
pub use ingest::{ingest, FilterOptions, InputFormat, TableSchema};
pub use record::ClaimRecord;
pub use session::Session;
pub use view::DashboardBundle;
