pub mod adapters;
pub mod estimator;
pub mod models;
pub mod pricing;
pub mod reconciliation;
pub mod scheduler;
pub mod tagging;

pub use adapters::{
    BillingQueryAdapter, PoolConfig, PoolConfigLookup, ResourceInventory, StaticBillingAdapter,
    TaggableResource,
};
pub use estimator::CostEstimator;
pub use models::{
    CostLineItem, CostRecord, GenomicsWorkload, ReconciliationOutcome, ReconciliationReport,
};
pub use pricing::{classify_resource, PricingTable};
pub use reconciliation::{ReconciliationService, SweepSummary};
pub use scheduler::{spawn as spawn_cost_scheduler, SchedulerHandle};
pub use tagging::{attribution_tags, ResourceTagger};
