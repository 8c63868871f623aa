use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::time;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config;
use crate::error::{CostError, CostResult};

use super::adapters::BillingQueryAdapter;
use super::models::{CostLineItem, GenomicsWorkload, ReconciliationOutcome, ReconciliationReport};
use super::pricing::classify_resource;

/// key: cost-reconciliation -> delayed actual-cost settlement
///
/// Replaces a workload's pre-execution estimate with provider-reported spend
/// once the billing data has had time to land, persisting one itemized
/// attribution record per matching line item. All writes for one workload
/// happen in a single transaction: a failed attempt leaves the workload
/// unreconciled and is retried on the next sweep.
pub struct ReconciliationService {
    pool: PgPool,
    adapter: Arc<dyn BillingQueryAdapter>,
    query_timeout: StdDuration,
    start_buffer: Duration,
    end_buffer: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub examined: usize,
    pub reconciled: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ReconciliationService {
    pub fn new(pool: PgPool, adapter: Arc<dyn BillingQueryAdapter>) -> Self {
        Self {
            pool,
            adapter,
            query_timeout: StdDuration::from_secs(*config::BILLING_QUERY_TIMEOUT_SECS),
            start_buffer: Duration::hours(*config::BILLING_WINDOW_START_BUFFER_HOURS),
            end_buffer: Duration::days(*config::BILLING_WINDOW_END_BUFFER_DAYS),
        }
    }

    /// Reconciles one workload against provider billing data.
    pub async fn reconcile(
        &self,
        workload: &GenomicsWorkload,
    ) -> CostResult<ReconciliationOutcome> {
        let Some(completed_at) = workload.completed_at else {
            return Ok(ReconciliationOutcome::JobNotCompleted);
        };

        let (start, end) = query_window(
            workload.started_at,
            completed_at,
            self.start_buffer,
            self.end_buffer,
        );

        let line_items = match time::timeout(
            self.query_timeout,
            self.adapter
                .query_costs(start, end, Some(&workload.resource_group)),
        )
        .await
        {
            Ok(Ok(items)) => items,
            Ok(Err(err)) => return Err(CostError::AdapterUnavailable(err)),
            Err(_) => {
                return Err(CostError::AdapterUnavailable(anyhow!(
                    "billing query timed out after {:?}",
                    self.query_timeout
                )))
            }
        };

        // Exact-match attribution only; untagged line items are never guessed at.
        let attributed: Vec<&CostLineItem> = line_items
            .iter()
            .filter(|item| !item.sample_id.is_empty() && item.sample_id == workload.sample_id)
            .collect();

        let actual_cost: f64 = attributed.iter().map(|item| item.cost_amount).sum();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        // A retried reconciliation replaces the workload's itemization rather
        // than appending a second copy, keeping sum(records) == actual_cost.
        sqlx::query("DELETE FROM cost_records WHERE workload_id = $1")
            .bind(workload.id)
            .execute(&mut tx)
            .await?;

        for item in &attributed {
            sqlx::query(
                r#"
                INSERT INTO cost_records (
                    id,
                    workload_id,
                    resource_id,
                    resource_type,
                    service_name,
                    cost_amount,
                    currency,
                    billing_period,
                    usage_date,
                    sample_id,
                    project_name,
                    user_email,
                    provider_tags
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(workload.id)
            .bind(&item.resource_id)
            .bind(classify_resource(&item.resource_id))
            .bind(&item.service_name)
            .bind(item.cost_amount)
            .bind(&item.currency)
            .bind(item.usage_date.date_naive().format("%Y-%m-%d").to_string())
            .bind(item.usage_date)
            .bind(&item.sample_id)
            .bind(&item.project_name)
            .bind(&item.user_email)
            .bind(&item.raw_tags)
            .execute(&mut tx)
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE genomics_workloads
            SET actual_cost = $1, cost_last_updated = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(actual_cost)
        .bind(now)
        .bind(workload.id)
        .execute(&mut tx)
        .await?;

        tx.commit().await?;

        let report = ReconciliationReport {
            workload_id: workload.id,
            estimated_cost: workload.estimated_cost,
            actual_cost,
            accuracy_percentage: accuracy_percentage(workload.estimated_cost, actual_cost),
            cost_variance: actual_cost - workload.estimated_cost,
            records_persisted: attributed.len(),
        };

        info!(
            workload_id = %workload.id,
            job_id = %workload.job_id,
            actual_cost,
            estimated_cost = workload.estimated_cost,
            accuracy = report.accuracy_percentage,
            records = report.records_persisted,
            "workload reconciled"
        );

        Ok(ReconciliationOutcome::Reconciled(report))
    }

    /// One pass over every completed-but-unreconciled workload. Per-workload
    /// failures are logged and left for the next sweep; only a failure to
    /// load the candidate set aborts the pass.
    pub async fn sweep(&self) -> anyhow::Result<SweepSummary> {
        let candidates = sqlx::query_as::<_, GenomicsWorkload>(
            r#"
            SELECT * FROM genomics_workloads
            WHERE completed_at IS NOT NULL AND cost_last_updated IS NULL
            ORDER BY completed_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut summary = SweepSummary {
            examined: candidates.len(),
            ..SweepSummary::default()
        };

        for workload in &candidates {
            match self.reconcile(workload).await {
                Ok(ReconciliationOutcome::Reconciled(_)) => summary.reconciled += 1,
                Ok(ReconciliationOutcome::JobNotCompleted) => summary.skipped += 1,
                Err(err) => {
                    summary.failed += 1;
                    warn!(
                        ?err,
                        workload_id = %workload.id,
                        job_id = %workload.job_id,
                        "reconciliation attempt failed, will retry next sweep"
                    );
                }
            }
        }

        info!(
            examined = summary.examined,
            reconciled = summary.reconciled,
            failed = summary.failed,
            "reconciliation sweep finished"
        );
        Ok(summary)
    }
}

/// Billing query window for one workload: pad the start for provisioning lag
/// and the end for the provider's billing-data latency.
pub fn query_window(
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    start_buffer: Duration,
    end_buffer: Duration,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (started_at - start_buffer, completed_at + end_buffer)
}

/// Unclamped estimate accuracy. An actual cost far above the estimate drives
/// the score negative; a zero estimate scores 0 to avoid dividing by it.
pub fn accuracy_percentage(estimated: f64, actual: f64) -> f64 {
    if estimated > 0.0 {
        (1.0 - (actual - estimated).abs() / estimated) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn window_uses_default_buffers() {
        let started = Utc.with_ymd_and_hms(2024, 1, 10, 8, 30, 0).unwrap();
        let completed = Utc.with_ymd_and_hms(2024, 1, 11, 20, 0, 0).unwrap();
        let (start, end) = query_window(started, completed, Duration::hours(1), Duration::days(2));
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 10, 7, 30, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 1, 13, 20, 0, 0).unwrap());
    }

    #[test]
    fn reference_accuracy_figures() {
        let accuracy = accuracy_percentage(89.32, 92.18);
        assert!((accuracy - 96.80).abs() < 0.01);
        let variance = 92.18f64 - 89.32f64;
        assert!((variance - 2.86).abs() < 1e-6);
    }

    #[test]
    fn zero_estimate_scores_zero() {
        assert_eq!(accuracy_percentage(0.0, 57.5), 0.0);
    }

    #[test]
    fn wildly_wrong_estimate_goes_negative() {
        // actual is 3x the estimate: 1 - 2.0 = -1.0 -> -100%
        let accuracy = accuracy_percentage(10.0, 30.0);
        assert!((accuracy - (-100.0)).abs() < 1e-9);
    }
}
