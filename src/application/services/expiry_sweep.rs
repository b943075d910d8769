//! Background task that periodically expires overdue executions.
//!
//! Runs in a tokio::spawn loop, promoting running executions past
//! `max_duration` plus the grace window to `Expired` so the reconciler
//! can pick them up.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::application::services::reconciler::ReconciliationService;
use crate::shared::retry::{retry_with_backoff, RetryConfig};
use crate::shared::shutdown::ShutdownSignal;

/// Start the execution expiry background task.
///
/// The task checks every `check_interval_secs` for running executions past
/// their maximum duration plus the grace window and marks them expired.
pub fn start_expiry_sweep(
    reconciler: Arc<ReconciliationService>,
    shutdown: ShutdownSignal,
    check_interval_secs: u64,
) {
    tokio::spawn(async move {
        info!(
            check_interval = check_interval_secs,
            "Execution expiry sweep started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(check_interval_secs));

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = sweep_once(&reconciler).await {
                        warn!(error = %e, "Execution expiry sweep error");
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("Execution expiry sweep shutting down");
                    break;
                }
            }
        }
    });
}

async fn sweep_once(
    reconciler: &Arc<ReconciliationService>,
) -> Result<(), crate::shared::errors::DomainError> {
    let promoted = retry_with_backoff(
        RetryConfig::default(),
        || reconciler.expire_overdue(Utc::now()),
        |err| err.is_transient(),
        "expire_overdue",
    )
    .await?;

    if promoted > 0 {
        info!(count = promoted, "Expired overdue executions");
    } else {
        debug!("No overdue executions");
    }
    Ok(())
}
