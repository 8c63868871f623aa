use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::config;

use super::reconciliation::ReconciliationService;

/// key: cost-sweep-scheduler -> serialized recurring reconciliation
///
/// One spawned task owns the sweep loop, so sweeps never overlap and no
/// per-workload locking is needed. A clean sweep waits the full interval; a
/// failed one retries sooner, keeping the process degraded-but-live instead
/// of crashing.
pub fn spawn(service: Arc<ReconciliationService>) -> SchedulerHandle {
    spawn_with_intervals(
        service,
        StdDuration::from_secs(*config::COST_SWEEP_INTERVAL_SECS),
        StdDuration::from_secs(*config::COST_SWEEP_RETRY_SECS),
    )
}

pub fn spawn_with_intervals(
    service: Arc<ReconciliationService>,
    interval: StdDuration,
    retry_interval: StdDuration,
) -> SchedulerHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        loop {
            // First sweep runs immediately so a restarted daemon catches up.
            let delay = match service.sweep().await {
                Ok(summary) => {
                    debug!(
                        reconciled = summary.reconciled,
                        failed = summary.failed,
                        "sweep tick complete"
                    );
                    interval
                }
                Err(err) => {
                    warn!(?err, "reconciliation sweep failed, retrying sooner");
                    retry_interval
                }
            };

            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = shutdown_rx.changed() => {
                    info!("reconciliation scheduler stopping");
                    break;
                }
            }
        }
    });

    SchedulerHandle { shutdown_tx, task }
}

/// Stop hook for the sweep loop. Shutdown is observed between sweeps; an
/// in-flight reconciliation finishes (or rolls back) its transaction first.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
