use std::collections::HashMap;

use crate::config;

/// Ordered substring rules mapping a provider resource id to a coarse
/// category. First match wins; unmatched ids classify as `Other`.
const RESOURCE_TYPE_RULES: &[(&str, &str)] = &[
    ("/batchAccounts/", "Batch"),
    ("/storageAccounts/", "Storage"),
    ("/networkInterfaces/", "Network"),
    ("/virtualMachines/", "Compute"),
];

pub fn classify_resource(resource_id: &str) -> &'static str {
    RESOURCE_TYPE_RULES
        .iter()
        .find(|(needle, _)| resource_id.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or("Other")
}

/// key: pricing-table -> immutable per-unit rates and volume heuristics
///
/// Injected into the estimator at construction; tests override it wholesale
/// instead of poking globals. Rates are simplified heuristics, not a live
/// pricing API.
#[derive(Debug, Clone)]
pub struct PricingTable {
    vm_rates: HashMap<String, f64>,
    default_vm_rate: f64,
    low_priority_discount: f64,
    pub storage_hot_rate_per_gb_day: f64,
    pub storage_cool_rate_per_gb_day: f64,
    pub network_rate_per_gb: f64,
    storage_volumes_gb: HashMap<String, f64>,
    default_storage_volume_gb: f64,
    network_volumes_gb: HashMap<String, f64>,
    default_network_volume_gb: f64,
}

impl PricingTable {
    /// Builds the table from the reference VM sizes and pipeline-type volume
    /// heuristics, with the scalar rates taken from env-overridable settings.
    pub fn from_env() -> Self {
        Self::with_rates(
            *config::DEFAULT_VM_RATE_PER_HOUR,
            *config::LOW_PRIORITY_DISCOUNT,
            *config::STORAGE_HOT_RATE_PER_GB_DAY,
            *config::STORAGE_COOL_RATE_PER_GB_DAY,
            *config::NETWORK_RATE_PER_GB,
        )
    }

    pub fn with_rates(
        default_vm_rate: f64,
        low_priority_discount: f64,
        storage_hot_rate_per_gb_day: f64,
        storage_cool_rate_per_gb_day: f64,
        network_rate_per_gb: f64,
    ) -> Self {
        let vm_rates = HashMap::from([
            ("Standard_D2s_v3".to_string(), 0.096),
            ("Standard_D4s_v3".to_string(), 0.192),
            ("Standard_D8s_v3".to_string(), 0.384),
            ("Standard_D16s_v3".to_string(), 0.768),
            ("Standard_F4s_v2".to_string(), 0.169),
            ("Standard_F8s_v2".to_string(), 0.338),
            ("Standard_F16s_v2".to_string(), 0.676),
        ]);

        // Typical data footprints per pipeline type, in GB.
        let storage_volumes_gb = HashMap::from([
            ("WGS".to_string(), 200.0),
            ("RNA-seq".to_string(), 50.0),
            ("ChIP-seq".to_string(), 20.0),
            ("ATAC-seq".to_string(), 15.0),
        ]);
        let network_volumes_gb = HashMap::from([
            ("WGS".to_string(), 50.0),
            ("RNA-seq".to_string(), 20.0),
            ("ChIP-seq".to_string(), 10.0),
            ("ATAC-seq".to_string(), 8.0),
        ]);

        Self {
            vm_rates,
            default_vm_rate,
            low_priority_discount,
            storage_hot_rate_per_gb_day,
            storage_cool_rate_per_gb_day,
            network_rate_per_gb,
            storage_volumes_gb,
            default_storage_volume_gb: 100.0,
            network_volumes_gb,
            default_network_volume_gb: 25.0,
        }
    }

    /// Hourly rate for a VM size. Unknown sizes fall back to the default
    /// rate; the low-priority discount applies to the resolved base either way.
    pub fn rate_for(&self, vm_size: &str, low_priority: bool) -> f64 {
        let base = self
            .vm_rates
            .get(vm_size)
            .copied()
            .unwrap_or(self.default_vm_rate);
        if low_priority {
            base * self.low_priority_discount
        } else {
            base
        }
    }

    pub fn default_vm_rate(&self) -> f64 {
        self.default_vm_rate
    }

    pub fn storage_volume_gb(&self, pipeline_type: &str) -> f64 {
        self.storage_volumes_gb
            .get(pipeline_type)
            .copied()
            .unwrap_or(self.default_storage_volume_gb)
    }

    pub fn network_volume_gb(&self, pipeline_type: &str) -> f64 {
        self.network_volumes_gb
            .get(pipeline_type)
            .copied()
            .unwrap_or(self.default_network_volume_gb)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_rates(0.096, 0.2, 0.0184, 0.01, 0.087)
    }
}
