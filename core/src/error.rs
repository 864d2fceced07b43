use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Required columns missing from input: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Delimited input error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
