use rust_decimal::Decimal;
use thiserror::Error;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not enough credit: required {required}, available {available}")]
    NotEnoughCredit {
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Whether this error is likely transient (e.g. storage I/O blip)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Storage(_))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::Validation("bad amount".into()).is_transient());
        assert!(!DomainError::NotFound {
            entity: "User",
            field: "id",
            value: "42".into(),
        }
        .is_transient());
    }

    #[test]
    fn not_enough_credit_message_carries_amounts() {
        let err = DomainError::NotEnoughCredit {
            required: Decimal::new(600, 2),
            available: Decimal::new(580, 2),
        };
        let msg = err.to_string();
        assert!(msg.contains("6.00"));
        assert!(msg.contains("5.80"));
    }
}
