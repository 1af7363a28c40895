//! Discount arithmetic over minor currency units.
//!
//! All amounts are integers in the smallest currency unit. Percentage
//! discounts floor rather than round, so a fractional unit never discounts
//! more than the stated percentage.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

use crate::vouchers::VoucherDiscount;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Floored percentage of a minor-unit amount.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows
/// or cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: u64) -> Result<u64, DiscountError> {
    let minor = Decimal::from_u64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_u64()
        .ok_or(DiscountError::PercentConversion)
}

/// Discount amount granted by `discount` against `subtotal`.
///
/// Fixed discounts use their amount as-is; percentage discounts floor and
/// then apply the optional cap. Either way the result is clamped to
/// `subtotal`, so the payable total can never go negative — even when a
/// percent over 100 is mistakenly supplied.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if percentage arithmetic
/// overflows.
pub fn discount_amount(discount: &VoucherDiscount, subtotal: u64) -> Result<u64, DiscountError> {
    let raw = match discount {
        VoucherDiscount::Fixed { amount } => *amount,
        VoucherDiscount::Percent {
            percent,
            max_amount,
        } => {
            let percent = Percentage::from(f64::from(*percent) / 100.0);
            let raw = percent_of_minor(&percent, subtotal)?;

            match max_amount {
                Some(cap) => raw.min(*cap),
                None => raw,
            }
        }
    };

    Ok(raw.min(subtotal))
}

/// Payable total after applying `discount_amount` to `subtotal`, floored at
/// zero.
#[must_use]
pub fn final_total(subtotal: u64, discount_amount: u64) -> u64 {
    subtotal.saturating_sub(discount_amount)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn fixed_discount_reduces_subtotal() -> TestResult {
        let discount = VoucherDiscount::Fixed { amount: 50_000 };

        let amount = discount_amount(&discount, 200_000)?;

        assert_eq!(amount, 50_000);
        assert_eq!(final_total(200_000, amount), 150_000);

        Ok(())
    }

    #[test]
    fn fixed_discount_clamps_to_subtotal() -> TestResult {
        let discount = VoucherDiscount::Fixed { amount: 50_000 };

        let amount = discount_amount(&discount, 30_000)?;

        assert_eq!(amount, 30_000);
        assert_eq!(final_total(30_000, amount), 0);

        Ok(())
    }

    #[test]
    fn percentage_discount_applies_cap() -> TestResult {
        let discount = VoucherDiscount::Percent {
            percent: 10,
            max_amount: Some(30_000),
        };

        let amount = discount_amount(&discount, 500_000)?;

        assert_eq!(amount, 30_000);
        assert_eq!(final_total(500_000, amount), 470_000);

        Ok(())
    }

    #[test]
    fn percentage_discount_without_cap() -> TestResult {
        let discount = VoucherDiscount::Percent {
            percent: 50,
            max_amount: None,
        };

        let amount = discount_amount(&discount, 1_000)?;

        assert_eq!(amount, 500);
        assert_eq!(final_total(1_000, amount), 500);

        Ok(())
    }

    #[test]
    fn percentage_discount_floors_fractional_units() -> TestResult {
        // 15% of 999 is 149.85; flooring gives 149, never 150.
        let discount = VoucherDiscount::Percent {
            percent: 15,
            max_amount: None,
        };

        assert_eq!(discount_amount(&discount, 999)?, 149);

        Ok(())
    }

    #[test]
    fn percent_over_one_hundred_clamps_to_subtotal() -> TestResult {
        let discount = VoucherDiscount::Percent {
            percent: 150,
            max_amount: None,
        };

        let amount = discount_amount(&discount, 10_000)?;

        assert_eq!(amount, 10_000);
        assert_eq!(final_total(10_000, amount), 0);

        Ok(())
    }

    #[test]
    fn zero_subtotal_discounts_to_zero() -> TestResult {
        let fixed = VoucherDiscount::Fixed { amount: 50_000 };
        let percent = VoucherDiscount::Percent {
            percent: 10,
            max_amount: None,
        };

        assert_eq!(discount_amount(&fixed, 0)?, 0);
        assert_eq!(discount_amount(&percent, 0)?, 0);

        Ok(())
    }

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        let percent = Percentage::from(0.25);

        assert_eq!(percent_of_minor(&percent, 200)?, 50);

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() -> TestResult {
        let percent = Percentage::try_from("100000000000000000000")?;
        let result = percent_of_minor(&percent, u64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));

        Ok(())
    }
}
