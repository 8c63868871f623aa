use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use super::adapters::ResourceInventory;
use super::models::GenomicsWorkload;

/// Constant marker identifying tags this engine owns.
const MANAGED_BY_TAG: &str = "genomecost";

/// key: cost-tagging -> attribution tag fan-out
///
/// Stamps every resource in a workload's scope with the attribution tuple so
/// later billing queries can group provider spend back to the workload. This
/// is fire-and-forget setup, not part of the cost computation itself.
pub struct ResourceTagger {
    inventory: Arc<dyn ResourceInventory>,
}

impl ResourceTagger {
    pub fn new(inventory: Arc<dyn ResourceInventory>) -> Self {
        Self { inventory }
    }

    /// Merges the attribution tags into every resource in `resource_group`,
    /// preserving pre-existing keys. Per-resource failures are logged and
    /// skipped. Returns the count of resources actually updated, so callers
    /// can treat `> 0` as "attribution is in place".
    pub async fn tag_workload_resources(
        &self,
        workload: &GenomicsWorkload,
        resource_group: &str,
    ) -> usize {
        let tags = attribution_tags(workload);

        let resources = match self.inventory.list_resources(resource_group).await {
            Ok(resources) => resources,
            Err(err) => {
                error!(?err, %resource_group, "failed to enumerate resources for tagging");
                return 0;
            }
        };

        let mut tagged = 0usize;
        for resource in resources {
            let mut merged = resource.tags.clone();
            for (key, value) in &tags {
                merged.insert(key.clone(), value.clone());
            }

            match self.inventory.update_tags(&resource.id, &merged).await {
                Ok(()) => tagged += 1,
                Err(err) => {
                    warn!(?err, resource_id = %resource.id, "failed to tag resource, skipping");
                }
            }
        }

        info!(
            %resource_group,
            job_id = %workload.job_id,
            tagged,
            "attribution tags applied"
        );
        tagged
    }
}

/// The tag set billing queries group by. Keys match what the billing query
/// adapter reads back.
pub fn attribution_tags(workload: &GenomicsWorkload) -> HashMap<String, String> {
    HashMap::from([
        ("sample_id".to_string(), workload.sample_id.clone()),
        ("project".to_string(), workload.project_name.clone()),
        ("workflow_type".to_string(), workload.pipeline_type.clone()),
        ("user".to_string(), workload.user_email.clone()),
        ("job_id".to_string(), workload.job_id.clone()),
        ("created_by".to_string(), MANAGED_BY_TAG.to_string()),
    ])
}
