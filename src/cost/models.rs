use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// key: cost-models -> workloads,line-items,attribution-records
///
/// One executed pipeline run needing cost attribution. Created by the job
/// intake path; this engine only ever writes `estimated_cost` (once, at
/// creation) and `actual_cost`/`cost_last_updated` (at reconciliation).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GenomicsWorkload {
    pub id: Uuid,
    pub job_id: String,
    pub sample_id: String,
    pub project_name: String,
    pub user_email: String,
    pub pipeline_type: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resource_group: String,
    pub batch_pool_id: Option<String>,
    pub estimated_runtime_hours: Option<f64>,
    pub estimated_cost: f64,
    pub actual_cost: f64,
    pub cost_last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenomicsWorkload {
    /// Completed but not yet stamped with provider-reported costs.
    pub fn is_unreconciled(&self) -> bool {
        self.completed_at.is_some() && self.cost_last_updated.is_none()
    }
}

/// key: cost-line-item -> one dated provider cost row
///
/// Ephemeral: fetched from the billing provider, attributed, and turned into
/// persisted [`CostRecord`]s. Attribution tag values the provider did not set
/// are carried as empty strings, never as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLineItem {
    pub resource_id: String,
    pub service_name: String,
    pub cost_amount: f64,
    pub currency: String,
    pub usage_date: DateTime<Utc>,
    pub sample_id: String,
    pub project_name: String,
    pub user_email: String,
    pub raw_tags: serde_json::Value,
}

/// key: cost-record -> persisted itemized attribution
///
/// Append-only; written exclusively by the reconciliation service, inside the
/// same transaction that stamps the owning workload.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CostRecord {
    pub id: Uuid,
    pub workload_id: Uuid,
    pub resource_id: String,
    pub resource_type: String,
    pub service_name: String,
    pub cost_amount: f64,
    pub currency: String,
    pub billing_period: String,
    pub usage_date: DateTime<Utc>,
    pub sample_id: String,
    pub project_name: String,
    pub user_email: String,
    pub provider_tags: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// key: reconciliation-outcome -> transient per-workload report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReconciliationOutcome {
    /// The workload has no `completed_at` yet; nothing was queried or written.
    JobNotCompleted,
    Reconciled(ReconciliationReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub workload_id: Uuid,
    pub estimated_cost: f64,
    pub actual_cost: f64,
    /// `(1 - |actual - estimated| / estimated) * 100`, unclamped: a wildly
    /// wrong estimate yields a negative score. `0.0` when the estimate was 0.
    pub accuracy_percentage: f64,
    pub cost_variance: f64,
    pub records_persisted: usize,
}
