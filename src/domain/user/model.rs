//! User and user group domain entities

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::money::round_currency;
use crate::shared::errors::{DomainError, DomainResult};

/// Discount policy of a user group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discount {
    /// No discount
    None,
    /// Fixed amount off the base price, floored at zero
    Fix(Decimal),
    /// Fractional discount in [0, 1)
    Factor(Decimal),
}

/// Group of users sharing program authorizations and a discount policy
#[derive(Debug, Clone)]
pub struct UserGroup {
    pub id: i32,
    pub name: String,
    pub discount: Discount,
}

impl UserGroup {
    pub fn validate(&self) -> DomainResult<()> {
        match self.discount {
            Discount::None => Ok(()),
            Discount::Fix(amount) if amount >= Decimal::ZERO => Ok(()),
            Discount::Fix(amount) => Err(DomainError::Validation(format!(
                "group {}: negative fix discount {}",
                self.id, amount
            ))),
            Discount::Factor(f) if f >= Decimal::ZERO && f < Decimal::ONE => Ok(()),
            Discount::Factor(f) => Err(DomainError::Validation(format!(
                "group {}: factor discount {} outside [0, 1)",
                self.id, f
            ))),
        }
    }

    /// Apply the group's discount to a base price.
    ///
    /// Called exactly once per charge, on the undiscounted base price.
    pub fn apply_discount(&self, base_price: Decimal) -> Decimal {
        let discounted = match self.discount {
            Discount::None => base_price,
            Discount::Fix(amount) => (base_price - amount).max(Decimal::ZERO),
            Discount::Factor(f) => base_price * (Decimal::ONE - f),
        };
        round_currency(discounted)
    }
}

/// A laundry user. Credit is never stored here; it is derived from the
/// user's ledger entries (see `CreditService::balance`).
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub group_id: i32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, group_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            group_id,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn group(discount: Discount) -> UserGroup {
        UserGroup {
            id: 1,
            name: "Tenants".into(),
            discount,
        }
    }

    #[test]
    fn no_discount_is_identity() {
        let g = group(Discount::None);
        assert_eq!(g.apply_discount(Decimal::new(70, 2)), Decimal::new(70, 2));
    }

    #[test]
    fn factor_discount_rounds_half_up() {
        // 0.70 * 0.90 = 0.63
        let g = group(Discount::Factor(Decimal::new(10, 2)));
        assert_eq!(g.apply_discount(Decimal::new(70, 2)), Decimal::new(63, 2));
        // 0.25 * 0.50 = 0.125 -> 0.13
        let half = group(Discount::Factor(Decimal::new(50, 2)));
        assert_eq!(
            half.apply_discount(Decimal::new(25, 2)),
            Decimal::new(13, 2)
        );
    }

    #[test]
    fn fix_discount_floors_at_zero() {
        let g = group(Discount::Fix(Decimal::new(100, 2)));
        assert_eq!(g.apply_discount(Decimal::new(250, 2)), Decimal::new(150, 2));
        assert_eq!(g.apply_discount(Decimal::new(70, 2)), Decimal::ZERO);
    }

    #[test]
    fn factor_outside_range_fails_validation() {
        assert!(group(Discount::Factor(Decimal::ONE)).validate().is_err());
        assert!(group(Discount::Factor(Decimal::new(-10, 2)))
            .validate()
            .is_err());
        assert!(group(Discount::Factor(Decimal::new(99, 2)))
            .validate()
            .is_ok());
    }

    #[test]
    fn negative_fix_fails_validation() {
        assert!(group(Discount::Fix(Decimal::new(-50, 2))).validate().is_err());
        assert!(group(Discount::Fix(Decimal::ZERO)).validate().is_ok());
    }

    #[test]
    fn new_user_is_enabled() {
        let user = User::new("Ada", 1);
        assert!(user.enabled);
        assert_eq!(user.group_id, 1);
    }
}
