//! Currency rounding and formatting

use rust_decimal::{Decimal, RoundingStrategy};

/// Round a monetary amount to 2 decimal places, half-up.
///
/// Applied exactly once, at the end of a price computation. Intermediate
/// values (billing period counts, pre-discount sums) are never rounded.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a monetary amount for log output and operator displays.
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {}", round_currency(amount), currency)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rounds_half_up() {
        assert_eq!(
            round_currency(Decimal::from_str("0.625").unwrap()),
            Decimal::from_str("0.63").unwrap()
        );
        assert_eq!(
            round_currency(Decimal::from_str("0.624").unwrap()),
            Decimal::from_str("0.62").unwrap()
        );
    }

    #[test]
    fn leaves_two_decimal_values_unchanged() {
        let v = Decimal::new(70, 2); // 0.70
        assert_eq!(round_currency(v), v);
    }

    #[test]
    fn formats_with_currency_code() {
        assert_eq!(format_currency(Decimal::new(580, 2), "EUR"), "5.80 EUR");
    }
}
