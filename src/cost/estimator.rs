use std::sync::Arc;

use tracing::warn;

use super::adapters::PoolConfigLookup;
use super::models::GenomicsWorkload;
use super::pricing::PricingTable;

/// Hot-tier retention window; the remainder of a notional annual horizon is
/// billed at the cool-tier rate.
const HOT_RETENTION_DAYS: f64 = 30.0;
const COOL_RETENTION_DAYS: f64 = 335.0;

/// key: cost-estimator -> pre-execution heuristic estimate
///
/// Estimation never fails outward: the compute term tries live pool sizing
/// and degrades to flat-rate pricing on any lookup failure, so workload
/// creation is never blocked on a provider round trip gone wrong.
pub struct CostEstimator {
    pricing: PricingTable,
    pools: Arc<dyn PoolConfigLookup>,
}

impl CostEstimator {
    pub fn new(pricing: PricingTable, pools: Arc<dyn PoolConfigLookup>) -> Self {
        Self { pricing, pools }
    }

    /// Sum of compute, storage, and network terms, rounded to currency
    /// precision.
    pub async fn estimate(&self, workload: &GenomicsWorkload) -> f64 {
        let mut estimated = 0.0;

        if let Some(runtime_hours) = workload.estimated_runtime_hours {
            estimated += self
                .compute_cost(workload.batch_pool_id.as_deref(), runtime_hours)
                .await;
        }

        estimated += self.storage_cost(&workload.pipeline_type);
        estimated += self.network_cost(&workload.pipeline_type);

        round_currency(estimated)
    }

    async fn compute_cost(&self, pool_id: Option<&str>, runtime_hours: f64) -> f64 {
        let Some(pool_id) = pool_id else {
            return runtime_hours * self.pricing.default_vm_rate();
        };

        match self.pools.get_pool(pool_id).await {
            Ok(pool) => {
                let dedicated = pool.dedicated_nodes as f64
                    * runtime_hours
                    * self.pricing.rate_for(&pool.vm_size, false);
                let low_priority = pool.low_priority_nodes as f64
                    * runtime_hours
                    * self.pricing.rate_for(&pool.vm_size, true);
                dedicated + low_priority
            }
            Err(err) => {
                warn!(?err, %pool_id, "pool lookup failed, falling back to flat-rate compute estimate");
                runtime_hours * self.pricing.default_vm_rate()
            }
        }
    }

    fn storage_cost(&self, pipeline_type: &str) -> f64 {
        let gb = self.pricing.storage_volume_gb(pipeline_type);
        let hot = gb * self.pricing.storage_hot_rate_per_gb_day * HOT_RETENTION_DAYS;
        let cool = gb * self.pricing.storage_cool_rate_per_gb_day * COOL_RETENTION_DAYS;
        hot + cool
    }

    fn network_cost(&self, pipeline_type: &str) -> f64 {
        self.pricing.network_volume_gb(pipeline_type) * self.pricing.network_rate_per_gb
    }
}

/// Round to two decimals, half away from zero.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::super::adapters::PoolConfig;
    use super::*;

    struct FixedPool(PoolConfig);

    #[async_trait]
    impl PoolConfigLookup for FixedPool {
        async fn get_pool(&self, _pool_id: &str) -> Result<PoolConfig> {
            Ok(self.0.clone())
        }
    }

    struct FailingPool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PoolConfigLookup for FailingPool {
        async fn get_pool(&self, _pool_id: &str) -> Result<PoolConfig> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("batch management endpoint unreachable"))
        }
    }

    fn workload(pipeline_type: &str, runtime: Option<f64>, pool: Option<&str>) -> GenomicsWorkload {
        let now = Utc::now();
        GenomicsWorkload {
            id: Uuid::new_v4(),
            job_id: "nf-run-1".into(),
            sample_id: "S001".into(),
            project_name: "glioma-cohort".into(),
            user_email: "analyst@example.org".into(),
            pipeline_type: pipeline_type.into(),
            status: "running".into(),
            started_at: now,
            completed_at: None,
            resource_group: "rg-genomics".into(),
            batch_pool_id: pool.map(str::to_string),
            estimated_runtime_hours: runtime,
            estimated_cost: 0.0,
            actual_cost: 0.0,
            cost_last_updated: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn estimator_with(pools: Arc<dyn PoolConfigLookup>) -> CostEstimator {
        CostEstimator::new(PricingTable::default(), pools)
    }

    #[tokio::test]
    async fn reference_estimate_without_pool() {
        let estimator = estimator_with(Arc::new(FixedPool(PoolConfig {
            vm_size: "Standard_D2s_v3".into(),
            dedicated_nodes: 0,
            low_priority_nodes: 0,
        })));
        // 10h at the flat default rate, default 100 GB storage and 25 GB egress.
        let workload = workload("nanopore-cdna", Some(10.0), None);
        let total = estimator.estimate(&workload).await;

        let compute: f64 = 10.0 * 0.096;
        let storage: f64 = 100.0 * 0.0184 * 30.0 + 100.0 * 0.01 * 335.0;
        let network: f64 = 25.0 * 0.087;
        assert!((compute - 0.96).abs() < 1e-9);
        assert!((storage - 390.2).abs() < 1e-9);
        assert!((network - 2.175).abs() < 1e-9);
        assert!((total - 393.34).abs() < 0.01);
    }

    #[tokio::test]
    async fn pool_sizing_drives_compute_term() {
        let estimator = estimator_with(Arc::new(FixedPool(PoolConfig {
            vm_size: "Standard_D4s_v3".into(),
            dedicated_nodes: 2,
            low_priority_nodes: 5,
        })));
        let workload = workload("WGS", Some(4.0), Some("pool-gatk"));
        let total = estimator.estimate(&workload).await;

        let compute = 2.0 * 4.0 * 0.192 + 5.0 * 4.0 * 0.192 * 0.2;
        let storage = 200.0 * 0.0184 * 30.0 + 200.0 * 0.01 * 335.0;
        let network = 50.0 * 0.087;
        assert!((total - round_currency(compute + storage + network)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pool_lookup_failure_degrades_to_flat_rate() {
        let pools = Arc::new(FailingPool {
            calls: AtomicUsize::new(0),
        });
        let estimator = estimator_with(pools.clone());
        let with_pool = workload("RNA-seq", Some(6.0), Some("pool-salmon"));
        let without_pool = workload("RNA-seq", Some(6.0), None);

        let degraded = estimator.estimate(&with_pool).await;
        let flat = estimator.estimate(&without_pool).await;

        assert_eq!(pools.calls.load(Ordering::SeqCst), 1);
        assert_eq!(degraded, flat);
    }

    #[tokio::test]
    async fn missing_runtime_zeroes_the_compute_term() {
        let estimator = estimator_with(Arc::new(FixedPool(PoolConfig {
            vm_size: "Standard_D2s_v3".into(),
            dedicated_nodes: 8,
            low_priority_nodes: 0,
        })));
        let workload = workload("ChIP-seq", None, Some("pool-macs2"));
        let total = estimator.estimate(&workload).await;

        let storage = 20.0 * 0.0184 * 30.0 + 20.0 * 0.01 * 335.0;
        let network = 10.0 * 0.087;
        assert!((total - round_currency(storage + network)).abs() < 1e-9);
    }

    #[test]
    fn currency_rounding_is_half_away_from_zero() {
        assert_eq!(round_currency(2.8600000000000003), 2.86);
        assert_eq!(round_currency(0.125), 0.13);
        assert_eq!(round_currency(-0.125), -0.13);
    }
}
