//! Credit ledger service
//!
//! Appends signed accounting entries and derives user balances from the
//! entry log. The log is the source of truth; the balance cache is a pure
//! memoization invalidated on every append or delete for that user.
//! Payouts and charges for the same user are serialized through a per-user
//! lock so concurrent operations never both pass a stale balance check.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::application::events::{Event, EventBus};
use crate::domain::{
    CreditAccountingEntry, DomainError, DomainResult, Execution, RepositoryProvider, User,
};

pub struct CreditService {
    repos: Arc<dyn RepositoryProvider>,
    events: EventBus,
    balance_cache: DashMap<Uuid, Decimal>,
    user_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl CreditService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: EventBus) -> Self {
        Self {
            repos,
            events,
            balance_cache: DashMap::new(),
            user_locks: DashMap::new(),
        }
    }

    /// Record a positive entry (top-up or refund).
    pub async fn inpayment(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
    ) -> DomainResult<CreditAccountingEntry> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "inpayment amount must be positive, got {}",
                amount
            )));
        }
        let user = self.load_user(user_id).await?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let entry = self
            .repos
            .ledger()
            .append(CreditAccountingEntry::inpayment(
                user_id,
                amount,
                description,
            ))
            .await?;
        let balance = self.refresh_balance(user_id).await?;

        info!(
            user = user.name.as_str(),
            amount = %amount,
            balance = %balance,
            "Inpayment recorded"
        );
        self.events.publish(Event::CreditChanged { user_id, balance });
        Ok(entry)
    }

    /// Record a negative entry, rejecting amounts above the current balance.
    pub async fn payout(
        &self,
        user_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
    ) -> DomainResult<CreditAccountingEntry> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "payout amount must be positive, got {}",
                amount
            )));
        }
        let user = self.load_user(user_id).await?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        // Balance check and append are atomic under the per-user lock
        let available = self.compute_balance(user_id).await?;
        if amount > available {
            return Err(DomainError::NotEnoughCredit {
                required: amount,
                available,
            });
        }

        let entry = self
            .repos
            .ledger()
            .append(CreditAccountingEntry::payout(user_id, amount, description))
            .await?;
        let balance = self.refresh_balance(user_id).await?;

        info!(
            user = user.name.as_str(),
            amount = %amount,
            balance = %balance,
            "Payout recorded"
        );
        self.events.publish(Event::CreditChanged { user_id, balance });
        Ok(entry)
    }

    /// Post the charge for a finished execution.
    ///
    /// Idempotent on the execution id: if a charge entry already exists it
    /// is returned unchanged, so a crashed or raced finish can be retried
    /// without double-charging. Charges may drive the balance negative;
    /// only payouts are gated on available credit.
    pub async fn charge_execution(
        &self,
        execution: &Execution,
    ) -> DomainResult<CreditAccountingEntry> {
        let price = execution.price.ok_or_else(|| {
            DomainError::InvalidState(format!("execution {} has no price to charge", execution.id))
        })?;

        let lock = self.user_lock(execution.user_id);
        let _guard = lock.lock().await;

        if let Some(existing) = self.repos.ledger().find_by_execution(execution.id).await? {
            return Ok(existing);
        }

        let entry = self
            .repos
            .ledger()
            .append(CreditAccountingEntry::charge(
                execution.user_id,
                price,
                format!("Charge for execution {}", execution.id),
                execution.id,
            ))
            .await?;
        let balance = self.refresh_balance(execution.user_id).await?;

        info!(
            execution_id = %execution.id,
            user_id = %execution.user_id,
            price = %price,
            balance = %balance,
            "Execution charged"
        );
        self.events.publish(Event::CreditChanged {
            user_id: execution.user_id,
            balance,
        });
        Ok(entry)
    }

    /// Current balance: the sum of the user's non-deleted entries.
    pub async fn balance(&self, user_id: Uuid) -> DomainResult<Decimal> {
        self.load_user(user_id).await?;
        if let Some(cached) = self.balance_cache.get(&user_id) {
            return Ok(*cached);
        }
        self.refresh_balance(user_id).await
    }

    /// A user's non-deleted ledger entries in insertion order, for display.
    pub async fn entries(&self, user_id: Uuid) -> DomainResult<Vec<CreditAccountingEntry>> {
        self.load_user(user_id).await?;
        self.repos.ledger().find_for_user(user_id).await
    }

    /// Soft-delete an execution-linked entry (admin operation).
    pub async fn delete_entry(&self, entry_id: Uuid) -> DomainResult<()> {
        let entry = self
            .repos
            .ledger()
            .find_by_id(entry_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "CreditAccountingEntry",
                field: "id",
                value: entry_id.to_string(),
            })?;

        if entry.execution_id.is_none() {
            return Err(DomainError::InvalidState(format!(
                "entry {} is not linked to an execution and cannot be deleted",
                entry_id
            )));
        }

        let lock = self.user_lock(entry.user_id);
        let _guard = lock.lock().await;

        self.repos.ledger().mark_deleted(entry_id).await?;
        let balance = self.refresh_balance(entry.user_id).await?;

        info!(
            entry_id = %entry_id,
            user_id = %entry.user_id,
            balance = %balance,
            "Ledger entry deleted"
        );
        self.events.publish(Event::CreditChanged {
            user_id: entry.user_id,
            balance,
        });
        Ok(())
    }

    fn user_lock(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_user(&self, user_id: Uuid) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: user_id.to_string(),
            })
    }

    async fn compute_balance(&self, user_id: Uuid) -> DomainResult<Decimal> {
        let entries = self.repos.ledger().find_for_user(user_id).await?;
        Ok(entries.iter().map(|e| e.amount).sum())
    }

    /// Recompute from the log and re-memoize.
    async fn refresh_balance(&self, user_id: Uuid) -> DomainResult<Decimal> {
        let balance = self.compute_balance(user_id).await?;
        self.balance_cache.insert(user_id, balance);
        Ok(balance)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::application::events::create_event_bus;
    use crate::domain::ExecutionState;
    use crate::infrastructure::storage::memory::InMemoryStorage;

    async fn setup() -> (Arc<InMemoryStorage>, CreditService, Uuid) {
        let storage = Arc::new(InMemoryStorage::new());
        let user = User::new("Ada", 1);
        let user_id = user.id;
        storage.users().save(user).await.unwrap();
        let service = CreditService::new(storage.clone(), create_event_bus(8));
        (storage, service, user_id)
    }

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[tokio::test]
    async fn inpayment_increases_balance() {
        let (_, service, user) = setup().await;
        service.inpayment(user, dec(1000), "topup").await.unwrap();
        assert_eq!(service.balance(user).await.unwrap(), dec(1000));
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let (_, service, user) = setup().await;
        assert!(matches!(
            service.inpayment(user, Decimal::ZERO, "zero").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            service.payout(user, dec(-100), "negative").await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn balance_is_the_sum_of_entries() {
        // Entries +10.00, -3.50, -0.70 -> balance 5.80
        let (_, service, user) = setup().await;
        service.inpayment(user, dec(1000), "topup").await.unwrap();
        service.payout(user, dec(350), "partial payout").await.unwrap();

        let mut execution = Execution::new(1, 1, user, Utc::now());
        execution.state = ExecutionState::Finished;
        execution.price = Some(dec(70));
        service.charge_execution(&execution).await.unwrap();

        assert_eq!(service.balance(user).await.unwrap(), dec(580));

        // Payout above balance is rejected and the balance is unchanged
        let err = service.payout(user, dec(600), "too much").await.unwrap_err();
        assert!(matches!(err, DomainError::NotEnoughCredit { .. }));
        assert_eq!(service.balance(user).await.unwrap(), dec(580));
        assert_eq!(service.entries(user).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn charge_execution_is_idempotent() {
        let (_, service, user) = setup().await;
        let mut execution = Execution::new(1, 1, user, Utc::now());
        execution.state = ExecutionState::Finished;
        execution.price = Some(dec(70));

        let first = service.charge_execution(&execution).await.unwrap();
        let second = service.charge_execution(&execution).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(service.balance(user).await.unwrap(), dec(-70));
        assert_eq!(service.entries(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn charge_without_price_is_invalid() {
        let (_, service, user) = setup().await;
        let execution = Execution::new(1, 1, user, Utc::now());
        assert!(matches!(
            service.charge_execution(&execution).await,
            Err(DomainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn delete_entry_restores_balance() {
        let (_, service, user) = setup().await;
        service.inpayment(user, dec(1000), "topup").await.unwrap();

        let mut execution = Execution::new(1, 1, user, Utc::now());
        execution.state = ExecutionState::Finished;
        execution.price = Some(dec(70));
        let charge = service.charge_execution(&execution).await.unwrap();
        assert_eq!(service.balance(user).await.unwrap(), dec(930));

        service.delete_entry(charge.id).await.unwrap();
        assert_eq!(service.balance(user).await.unwrap(), dec(1000));
    }

    #[tokio::test]
    async fn only_execution_entries_can_be_deleted() {
        let (_, service, user) = setup().await;
        let topup = service.inpayment(user, dec(1000), "topup").await.unwrap();
        assert!(matches!(
            service.delete_entry(topup.id).await,
            Err(DomainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (_, service, _) = setup().await;
        let stranger = Uuid::new_v4();
        assert!(matches!(
            service.balance(stranger).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_payouts_never_overdraw() {
        let (_, service, user) = setup().await;
        let service = Arc::new(service);
        service.inpayment(user, dec(1000), "topup").await.unwrap();

        // Two 6.00 payouts against 10.00: exactly one must succeed
        let a = {
            let s = service.clone();
            tokio::spawn(async move { s.payout(user, dec(600), "a").await })
        };
        let b = {
            let s = service.clone();
            tokio::spawn(async move { s.payout(user, dec(600), "b").await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert_eq!(service.balance(user).await.unwrap(), dec(400));
    }
}
