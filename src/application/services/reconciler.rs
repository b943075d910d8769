//! Reconciliation of expired executions
//!
//! Executions whose device never confirmed a clean finish are promoted to
//! `Expired` and later resolved by an operator: billed at the worst-case
//! price (no real end time is known) or discarded without billing.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::events::{Event, EventBus};
use crate::application::services::execution::ExecutionService;
use crate::domain::{
    DomainError, DomainResult, Execution, ExecutionState, RepositoryProvider,
};

/// Outcome of a `finish_all` batch. Failures never block the other
/// executions; each one is billed independently.
#[derive(Debug, Default)]
pub struct ReconciliationReport {
    pub billed: Vec<(Uuid, Decimal)>,
    pub failures: Vec<(Uuid, DomainError)>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ReconciliationService {
    repos: Arc<dyn RepositoryProvider>,
    execution: Arc<ExecutionService>,
    events: EventBus,
    grace_period: Duration,
}

impl ReconciliationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        execution: Arc<ExecutionService>,
        events: EventBus,
        grace_period: Duration,
    ) -> Self {
        Self {
            repos,
            execution,
            events,
            grace_period,
        }
    }

    /// Promote overdue running executions to `Expired`. Returns the number
    /// of executions promoted. Called by the periodic sweep and by `scan`.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let running = self.repos.executions().find_running().await?;
        let mut promoted = 0;

        for execution in running {
            let program = match self.repos.programs().find_by_id(execution.program_id).await? {
                Some(p) => p,
                None => {
                    warn!(
                        execution_id = %execution.id,
                        program_id = execution.program_id,
                        "Running execution references missing program"
                    );
                    continue;
                }
            };
            if !execution.is_expired(&program, now, self.grace_period) {
                continue;
            }
            let swapped = self
                .repos
                .executions()
                .transition_state(
                    execution.id,
                    ExecutionState::Running,
                    ExecutionState::Expired,
                    None,
                    None,
                )
                .await?;
            if swapped {
                promoted += 1;
                info!(execution_id = %execution.id, "Execution expired");
                self.events.publish(Event::ExecutionExpired {
                    execution_id: execution.id,
                });
            }
        }

        Ok(promoted)
    }

    /// Expired executions that have no ledger entry yet, optionally
    /// restricted to one user. Overdue running executions are promoted
    /// first so a fresh scan never misses them.
    pub async fn scan(&self, user_id: Option<Uuid>) -> DomainResult<Vec<Execution>> {
        self.expire_overdue(Utc::now()).await?;

        let expired = self.repos.executions().find_expired(user_id).await?;
        let mut unbilled = Vec::with_capacity(expired.len());
        for execution in expired {
            if self
                .repos
                .ledger()
                .find_by_execution(execution.id)
                .await?
                .is_none()
            {
                unbilled.push(execution);
            }
        }
        Ok(unbilled)
    }

    /// Bill one expired execution at its worst-case price: the program's
    /// maximum duration stands in for the unknown real end time.
    pub async fn finish_one(&self, execution_id: Uuid) -> DomainResult<Decimal> {
        let execution = self
            .repos
            .executions()
            .find_by_id(execution_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Execution",
                field: "id",
                value: execution_id.to_string(),
            })?;

        if execution.state != ExecutionState::Expired {
            return Err(DomainError::InvalidState(format!(
                "execution {} is {}, only expired executions can be reconciled",
                execution_id, execution.state
            )));
        }

        let program = self
            .repos
            .programs()
            .find_by_id(execution.program_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Program",
                field: "id",
                value: execution.program_id.to_string(),
            })?;

        let price = self
            .execution
            .finish(execution_id, execution.billing_deadline(&program))
            .await?;
        info!(
            execution_id = %execution_id,
            price = %price,
            "Expired execution billed at worst case"
        );
        Ok(price)
    }

    /// Bill a batch of expired executions independently, collecting
    /// failures instead of aborting.
    pub async fn finish_all(&self, execution_ids: &[Uuid]) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();
        for &id in execution_ids {
            match self.finish_one(id).await {
                Ok(price) => report.billed.push((id, price)),
                Err(err) => {
                    warn!(execution_id = %id, error = %err, "Reconciliation billing failed");
                    report.failures.push((id, err));
                }
            }
        }
        report
    }

    /// Discard an expired execution without billing (operator judgment,
    /// e.g. a known false trigger).
    pub async fn delete(&self, execution_id: Uuid) -> DomainResult<()> {
        let execution = self
            .repos
            .executions()
            .find_by_id(execution_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Execution",
                field: "id",
                value: execution_id.to_string(),
            })?;

        match execution.state {
            ExecutionState::Expired => {}
            ExecutionState::Deleted => return Ok(()),
            state => {
                return Err(DomainError::InvalidState(format!(
                    "execution {} is {} and cannot be discarded",
                    execution_id, state
                )))
            }
        }

        let swapped = self
            .repos
            .executions()
            .transition_state(
                execution_id,
                ExecutionState::Expired,
                ExecutionState::Deleted,
                None,
                None,
            )
            .await?;
        if !swapped {
            return Err(DomainError::InvalidState(format!(
                "execution {} changed state during delete",
                execution_id
            )));
        }

        info!(execution_id = %execution_id, "Expired execution discarded");
        self.events.publish(Event::ExecutionDeleted { execution_id });
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────
