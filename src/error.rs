use thiserror::Error;

/// key: cost-error -> engine boundary failures
///
/// Unknown pipeline types and VM sizes are deliberately not represented here:
/// they resolve through documented fallback defaults and never surface as errors.
#[derive(Debug, Error)]
pub enum CostError {
    #[error("billing provider unavailable: {0}")]
    AdapterUnavailable(#[source] anyhow::Error),
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type CostResult<T> = Result<T, CostError>;
