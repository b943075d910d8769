//! Credit accounting entry (one immutable ledger transaction)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// One signed transaction against a user's credit balance.
///
/// Entries are append-only. Positive amounts are inpayments or refunds,
/// negative amounts are payouts or execution charges. Entries are never
/// mutated, only soft-deleted by an administrator.
#[derive(Debug, Clone)]
pub struct CreditAccountingEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: DateTime<Utc>,
    pub amount: Decimal,
    pub description: String,
    /// Set for execution charges; the idempotence key for billing
    pub execution_id: Option<Uuid>,
    pub deleted: bool,
}

impl CreditAccountingEntry {
    pub fn inpayment(user_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self::new(user_id, amount, description, None)
    }

    pub fn payout(user_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self::new(user_id, -amount, description, None)
    }

    pub fn charge(
        user_id: Uuid,
        price: Decimal,
        description: impl Into<String>,
        execution_id: Uuid,
    ) -> Self {
        Self::new(user_id, -price, description, Some(execution_id))
    }

    fn new(
        user_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
        execution_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date: Utc::now(),
            amount,
            description: description.into(),
            execution_id,
            deleted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payout_and_charge_are_negative() {
        let user = Uuid::new_v4();
        let inpayment = CreditAccountingEntry::inpayment(user, Decimal::new(1000, 2), "topup");
        let payout = CreditAccountingEntry::payout(user, Decimal::new(350, 2), "refund");
        let charge =
            CreditAccountingEntry::charge(user, Decimal::new(70, 2), "wash", Uuid::new_v4());

        assert_eq!(inpayment.amount, Decimal::new(1000, 2));
        assert_eq!(payout.amount, Decimal::new(-350, 2));
        assert_eq!(charge.amount, Decimal::new(-70, 2));
        assert!(charge.execution_id.is_some());
        assert!(payout.execution_id.is_none());
        assert!(!charge.deleted);
    }
}
