//! Execution lifecycle service
//!
//! Owns the start/finish/auto-end transitions of metered program runs.
//! Finishing computes the base price, applies the user group discount and
//! posts the charge to the credit ledger. The state transition is a
//! compare-and-swap on the stored state; the ledger post is idempotent on
//! the execution id, so the pair is retryable without double-charging.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::events::{Event, EventBus};
use crate::application::services::credit::CreditService;
use crate::domain::{
    Device, DomainError, DomainResult, Execution, ExecutionState, Program, RepositoryProvider,
    User, UserGroup,
};

pub struct ExecutionService {
    repos: Arc<dyn RepositoryProvider>,
    credit: Arc<CreditService>,
    events: EventBus,
    /// Operational grace window past max duration before a run counts as expired
    grace_period: Duration,
}

impl ExecutionService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        credit: Arc<CreditService>,
        events: EventBus,
        grace_period: Duration,
    ) -> Self {
        Self {
            repos,
            credit,
            events,
            grace_period,
        }
    }

    /// Start a program on a device for a user.
    pub async fn start(
        &self,
        device_id: i32,
        program_id: i32,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Execution> {
        let device = self.load_device(device_id).await?;
        if !device.enabled {
            return Err(DomainError::Validation(format!(
                "device {} is disabled",
                device.display_name()
            )));
        }

        let program = self.load_program(program_id).await?;
        program.validate()?;
        if !program.enabled {
            return Err(DomainError::Validation(format!(
                "program {} is disabled",
                program.name
            )));
        }

        let user = self.load_user(user_id).await?;
        if !user.enabled {
            return Err(DomainError::Validation(format!(
                "user {} is blocked",
                user.name
            )));
        }
        if !program.is_authorized(user.group_id) {
            return Err(DomainError::Forbidden(format!(
                "group {} is not authorized for program {}",
                user.group_id, program.name
            )));
        }

        if let Some(running) = self
            .repos
            .executions()
            .find_running_for_device(device_id)
            .await?
        {
            return Err(DomainError::Conflict(format!(
                "device {} already runs execution {}",
                device.display_name(),
                running.id
            )));
        }

        let execution = self
            .repos
            .executions()
            .save(Execution::new(device_id, program_id, user_id, now))
            .await?;

        info!(
            execution_id = %execution.id,
            device = device.display_name().as_str(),
            program = program.name.as_str(),
            user = user.name.as_str(),
            "Execution started"
        );
        self.events.publish(Event::ExecutionStarted {
            execution_id: execution.id,
            device_id,
            user_id,
        });
        Ok(execution)
    }

    /// Finish an execution and bill it.
    ///
    /// Idempotent: finishing an already finished execution returns its
    /// stored price (re-issuing the idempotent ledger post first, so a
    /// finish that crashed between state write and ledger append is
    /// repaired by retrying). Concurrent finishes race on the state CAS;
    /// losers return the winner's price.
    pub async fn finish(&self, execution_id: Uuid, now: DateTime<Utc>) -> DomainResult<Decimal> {
        let execution = self.load_execution(execution_id).await?;

        match execution.state {
            ExecutionState::Finished => return self.settle_finished(execution).await,
            ExecutionState::Deleted => {
                return Err(DomainError::InvalidState(format!(
                    "execution {} was deleted and cannot be finished",
                    execution_id
                )))
            }
            ExecutionState::Running | ExecutionState::Expired => {}
        }

        let program = self.load_program(execution.program_id).await?;
        let user = self.load_user(execution.user_id).await?;
        let group = self.load_group(user.group_id).await?;

        let base = program.base_price(execution.elapsed(now))?;
        let price = group.apply_discount(base);

        let swapped = self
            .repos
            .executions()
            .transition_state(
                execution_id,
                execution.state,
                ExecutionState::Finished,
                Some(now),
                Some(price),
            )
            .await?;

        if !swapped {
            // Lost the race; the winner's price stands
            warn!(execution_id = %execution_id, "Concurrent finish, returning stored price");
            let current = self.load_execution(execution_id).await?;
            if current.is_finished() {
                return self.settle_finished(current).await;
            }
            return Err(DomainError::InvalidState(format!(
                "execution {} changed to {} during finish",
                execution_id, current.state
            )));
        }

        let mut finished = execution;
        finished.state = ExecutionState::Finished;
        finished.end_date = Some(now);
        finished.price = Some(price);

        self.credit.charge_execution(&finished).await?;

        info!(
            execution_id = %execution_id,
            program = program.name.as_str(),
            user = user.name.as_str(),
            base_price = %base,
            price = %price,
            "Execution finished"
        );
        self.events.publish(Event::ExecutionFinished {
            execution_id,
            user_id: finished.user_id,
            price,
        });
        Ok(price)
    }

    /// Consume a device-telemetry auto-end trigger (power below threshold
    /// for the device's wait time). Ignored unless the program allows
    /// auto-end and the earliest auto-end point has passed; returns the
    /// price when the trigger actually finished the execution.
    pub async fn auto_end_signal(
        &self,
        execution_id: Uuid,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<Decimal>> {
        let execution = self.load_execution(execution_id).await?;
        if !execution.is_running() {
            return Ok(None);
        }

        let program = self.load_program(execution.program_id).await?;
        if !program.auto_end {
            return Ok(None);
        }
        if execution.elapsed(now) < program.earliest_auto_end {
            info!(
                execution_id = %execution_id,
                program = program.name.as_str(),
                "Auto-end signal before earliest auto-end, ignored"
            );
            return Ok(None);
        }

        let price = self.finish(execution_id, now).await?;
        Ok(Some(price))
    }

    /// Whether a running execution has outlived its program plus the
    /// operational grace window.
    pub async fn is_expired(
        &self,
        execution: &Execution,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        if !execution.is_running() {
            return Ok(false);
        }
        let program = self.load_program(execution.program_id).await?;
        Ok(execution.is_expired(&program, now, self.grace_period))
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Re-issue the idempotent charge and return the stored price.
    async fn settle_finished(&self, execution: Execution) -> DomainResult<Decimal> {
        let entry = self.credit.charge_execution(&execution).await?;
        Ok(-entry.amount)
    }

    async fn load_execution(&self, id: Uuid) -> DomainResult<Execution> {
        self.repos
            .executions()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Execution",
                field: "id",
                value: id.to_string(),
            })
    }

    async fn load_program(&self, id: i32) -> DomainResult<Program> {
        self.repos
            .programs()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Program",
                field: "id",
                value: id.to_string(),
            })
    }

    async fn load_device(&self, id: i32) -> DomainResult<Device> {
        self.repos
            .devices()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "Device",
                field: "id",
                value: id.to_string(),
            })
    }

    async fn load_user(&self, id: Uuid) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: id.to_string(),
            })
    }

    async fn load_group(&self, id: i32) -> DomainResult<UserGroup> {
        self.repos
            .groups()
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "UserGroup",
                field: "id",
                value: id.to_string(),
            })
    }
}

// ── Tests ──────────────────────────────────────────────────────
