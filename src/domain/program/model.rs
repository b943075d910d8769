//! Program domain entity (washing/drying tariff)

use chrono::Duration;
use rust_decimal::Decimal;

use crate::domain::money::round_currency;
use crate::shared::errors::{DomainError, DomainResult};

/// Tariff type of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramType {
    /// Flat price once past the free duration
    Fixed,
    /// Flagfall plus a rate per started billing unit
    Dynamic,
}

impl std::fmt::Display for ProgramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "Fixed"),
            Self::Dynamic => write!(f, "Dynamic"),
        }
    }
}

/// Billing unit for dynamic programs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    /// Length of one billing unit in seconds.
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3600,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seconds => write!(f, "Seconds"),
            Self::Minutes => write!(f, "Minutes"),
            Self::Hours => write!(f, "Hours"),
        }
    }
}

/// Washing or drying program offered on a device
#[derive(Debug, Clone)]
pub struct Program {
    pub id: i32,
    pub name: String,
    pub program_type: ProgramType,
    /// Base charge applied once the session is billable
    pub flagfall: Decimal,
    /// Charge per started billing unit (dynamic programs only)
    pub rate: Decimal,
    /// Billing unit (dynamic programs only)
    pub time_unit: Option<TimeUnit>,
    /// Hard cap on billable duration
    pub max_duration: Duration,
    /// Grace window during which no charge accrues
    pub free_duration: Duration,
    /// Whether sustained low power draw may end the session
    pub auto_end: bool,
    /// Minimum elapsed time before auto-end is permitted
    pub earliest_auto_end: Duration,
    pub enabled: bool,
    /// User groups allowed to run this program
    pub authorized_groups: Vec<i32>,
}

impl Program {
    /// Check the program's own invariants.
    pub fn validate(&self) -> DomainResult<()> {
        if self.free_duration > self.max_duration {
            return Err(DomainError::Validation(format!(
                "program {}: free duration exceeds max duration",
                self.id
            )));
        }
        if self.program_type == ProgramType::Dynamic && self.time_unit.is_none() {
            return Err(DomainError::InvalidTariff(format!(
                "dynamic program {} has no billing time unit",
                self.id
            )));
        }
        Ok(())
    }

    pub fn is_authorized(&self, group_id: i32) -> bool {
        self.authorized_groups.contains(&group_id)
    }

    /// Compute the undiscounted price for a session of the given length.
    ///
    /// Elapsed time is clamped to `max_duration`; anything within
    /// `free_duration` is free regardless of program type. Dynamic programs
    /// bill the flagfall plus the rate for every started billing unit past
    /// the free duration. The result is rounded half-up to 2 decimal places;
    /// period counts are never rounded on the way.
    pub fn base_price(&self, elapsed: Duration) -> DomainResult<Decimal> {
        if elapsed < Duration::zero() {
            return Err(DomainError::Validation(format!(
                "negative elapsed time for program {}",
                self.id
            )));
        }

        let effective = elapsed.min(self.max_duration);
        if effective <= self.free_duration {
            return Ok(Decimal::ZERO);
        }

        let price = match self.program_type {
            ProgramType::Fixed => self.flagfall,
            ProgramType::Dynamic => {
                let unit = self.time_unit.ok_or_else(|| {
                    DomainError::InvalidTariff(format!(
                        "dynamic program {} has no billing time unit",
                        self.id
                    ))
                })?;
                let billed_secs = (effective - self.free_duration).num_seconds();
                let unit_secs = unit.seconds();
                // Ceiling division: every started unit is billed in full
                let periods = (billed_secs + unit_secs - 1) / unit_secs;
                self.flagfall + self.rate * Decimal::from(periods)
            }
        };

        Ok(round_currency(price))
    }

    /// Worst-case price, i.e. the price at `max_duration`.
    ///
    /// Used when billing an expired execution whose real end is unknown.
    pub fn max_price(&self) -> DomainResult<Decimal> {
        self.base_price(self.max_duration)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_program() -> Program {
        Program {
            id: 1,
            name: "Standard wash".into(),
            program_type: ProgramType::Fixed,
            flagfall: Decimal::new(250, 2), // 2.50
            rate: Decimal::ZERO,
            time_unit: None,
            max_duration: Duration::minutes(90),
            free_duration: Duration::minutes(3),
            auto_end: true,
            earliest_auto_end: Duration::minutes(20),
            enabled: true,
            authorized_groups: vec![1],
        }
    }

    fn dynamic_program() -> Program {
        Program {
            id: 2,
            name: "Dryer".into(),
            program_type: ProgramType::Dynamic,
            flagfall: Decimal::new(50, 2), // 0.50
            rate: Decimal::new(10, 2),     // 0.10 per unit
            time_unit: Some(TimeUnit::Minutes),
            max_duration: Duration::minutes(60),
            free_duration: Duration::minutes(5),
            auto_end: true,
            earliest_auto_end: Duration::minutes(10),
            enabled: true,
            authorized_groups: vec![1, 2],
        }
    }

    #[test]
    fn fixed_price_is_flagfall_past_free_duration() {
        let p = fixed_program();
        assert_eq!(
            p.base_price(Duration::minutes(4)).unwrap(),
            Decimal::new(250, 2)
        );
        assert_eq!(
            p.base_price(Duration::minutes(90)).unwrap(),
            Decimal::new(250, 2)
        );
    }

    #[test]
    fn free_duration_costs_nothing() {
        let p = fixed_program();
        assert_eq!(p.base_price(Duration::zero()).unwrap(), Decimal::ZERO);
        assert_eq!(
            p.base_price(Duration::minutes(3)).unwrap(),
            Decimal::ZERO
        );
        let d = dynamic_program();
        assert_eq!(
            d.base_price(Duration::minutes(5)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn dynamic_price_bills_started_units() {
        let p = dynamic_program();
        // 7 min elapsed, 5 free -> 2 billed minutes -> 2 periods
        // 0.50 + 0.10 * 2 = 0.70
        assert_eq!(
            p.base_price(Duration::minutes(7)).unwrap(),
            Decimal::new(70, 2)
        );
        // 6 min 1 s elapsed -> 61 billed seconds -> 2 started minutes
        assert_eq!(
            p.base_price(Duration::minutes(6) + Duration::seconds(1))
                .unwrap(),
            Decimal::new(70, 2)
        );
    }

    #[test]
    fn dynamic_price_is_monotonic_and_capped() {
        let p = dynamic_program();
        let mut last = Decimal::ZERO;
        for minutes in 0..=70 {
            let price = p.base_price(Duration::minutes(minutes)).unwrap();
            assert!(price >= last, "price decreased at {} min", minutes);
            last = price;
        }
        // Constant for elapsed >= max_duration
        let max = p.base_price(Duration::minutes(60)).unwrap();
        assert_eq!(p.base_price(Duration::minutes(61)).unwrap(), max);
        assert_eq!(p.base_price(Duration::hours(10)).unwrap(), max);
        assert_eq!(p.max_price().unwrap(), max);
    }

    #[test]
    fn dynamic_with_hour_unit() {
        let mut p = dynamic_program();
        p.time_unit = Some(TimeUnit::Hours);
        // 20 billed minutes -> 1 started hour
        assert_eq!(
            p.base_price(Duration::minutes(25)).unwrap(),
            Decimal::new(60, 2)
        );
    }

    #[test]
    fn dynamic_without_time_unit_is_invalid_tariff() {
        let mut p = dynamic_program();
        p.time_unit = None;
        assert!(matches!(
            p.base_price(Duration::minutes(10)),
            Err(DomainError::InvalidTariff(_))
        ));
        assert!(matches!(p.validate(), Err(DomainError::InvalidTariff(_))));
    }

    #[test]
    fn negative_elapsed_is_rejected() {
        let p = fixed_program();
        assert!(matches!(
            p.base_price(Duration::seconds(-1)),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn free_duration_above_max_fails_validation() {
        let mut p = fixed_program();
        p.free_duration = Duration::minutes(120);
        assert!(matches!(p.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn group_authorization() {
        let p = dynamic_program();
        assert!(p.is_authorized(1));
        assert!(p.is_authorized(2));
        assert!(!p.is_authorized(3));
    }

    #[test]
    fn time_unit_lengths() {
        assert_eq!(TimeUnit::Seconds.seconds(), 1);
        assert_eq!(TimeUnit::Minutes.seconds(), 60);
        assert_eq!(TimeUnit::Hours.seconds(), 3600);
    }
}
