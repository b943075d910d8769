//! Execution repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::model::{Execution, ExecutionState};
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Execution>>;

    /// The running execution on a device, if any. A device hosts at most one.
    async fn find_running_for_device(&self, device_id: i32) -> DomainResult<Option<Execution>>;

    async fn find_running(&self) -> DomainResult<Vec<Execution>>;

    /// Executions in `Expired` state, optionally restricted to one user.
    async fn find_expired(&self, user_id: Option<Uuid>) -> DomainResult<Vec<Execution>>;

    async fn save(&self, execution: Execution) -> DomainResult<Execution>;

    /// Conditional state transition: applies `to` (and, when given, end date
    /// and price) only if the stored state still equals `from`. Returns
    /// whether the transition happened. This is the compare-and-swap that
    /// guarantees at-most-one billing per execution.
    async fn transition_state(
        &self,
        id: Uuid,
        from: ExecutionState,
        to: ExecutionState,
        end_date: Option<DateTime<Utc>>,
        price: Option<Decimal>,
    ) -> DomainResult<bool>;
}
