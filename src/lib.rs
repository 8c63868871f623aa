pub mod config;
pub mod cost;
pub mod error;

pub use cost::{
    CostEstimator, GenomicsWorkload, ReconciliationOutcome, ReconciliationService, ResourceTagger,
};
pub use error::{CostError, CostResult};
