//! Ledger repository interface

use async_trait::async_trait;
use uuid::Uuid;

use super::model::CreditAccountingEntry;
use crate::shared::errors::DomainResult;

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Durable append. Returns the stored entry.
    async fn append(&self, entry: CreditAccountingEntry) -> DomainResult<CreditAccountingEntry>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<CreditAccountingEntry>>;

    /// The charge entry for an execution, if one was already posted.
    /// Backs the idempotence guard on `charge_execution`.
    async fn find_by_execution(
        &self,
        execution_id: Uuid,
    ) -> DomainResult<Option<CreditAccountingEntry>>;

    /// All non-deleted entries of a user, in insertion order.
    async fn find_for_user(&self, user_id: Uuid) -> DomainResult<Vec<CreditAccountingEntry>>;

    /// Soft delete. The entry stays in the log but is excluded from
    /// balance derivation.
    async fn mark_deleted(&self, id: Uuid) -> DomainResult<()>;
}
