use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::campaign::DiscountModel;

/// Cashback can never pay out more than this share of the cart (30 %).
pub const CASHBACK_CART_SHARE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Currency value of one reward point (0.01).
pub const POINT_VALUE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const MONEY_SCALE: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsOutcome {
    pub final_amount: Decimal,
    pub savings_amount: Decimal,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalculatorError {
    #[error("cart amount must be positive, got {cart_amount}")]
    NonPositiveCart { cart_amount: Decimal },
    #[error("computed savings {savings} is negative")]
    NegativeSavings { savings: Decimal },
    #[error("computed savings {savings} exceeds cart amount {cart_amount}")]
    SavingsExceedCart { savings: Decimal, cart_amount: Decimal },
    #[error("computed final amount {final_amount} is negative")]
    NegativeFinalAmount { final_amount: Decimal },
    #[error("pricing a cart of {cart_amount} overflowed the decimal range")]
    Overflow { cart_amount: Decimal },
}

/// Prices one discount model against a cart.
///
/// Only percentage discounts reduce the amount charged; cashback, points and
/// installments are settled outside the transaction, so their final amount
/// equals the cart.
pub fn calculate(
    discount: &DiscountModel,
    cart_amount: Decimal,
) -> Result<SavingsOutcome, CalculatorError> {
    if cart_amount <= Decimal::ZERO {
        return Err(CalculatorError::NonPositiveCart { cart_amount });
    }

    let overflow = || CalculatorError::Overflow { cart_amount };
    let (savings, deducted) = match discount {
        DiscountModel::Percentage { rate, max_discount } => {
            let raw = rate
                .checked_div(Decimal::ONE_HUNDRED)
                .and_then(|share| cart_amount.checked_mul(share))
                .ok_or_else(overflow)?;
            let capped = match max_discount {
                Some(cap) if raw > *cap => *cap,
                _ => raw,
            };
            (round_money(capped), true)
        }
        DiscountModel::Cashback { amount, .. } => {
            let ceiling = cart_amount.checked_mul(CASHBACK_CART_SHARE).ok_or_else(overflow)?;
            (round_money((*amount).min(ceiling)), false)
        }
        DiscountModel::Points { points } => {
            (round_money(points.checked_mul(POINT_VALUE).ok_or_else(overflow)?), false)
        }
        DiscountModel::Installment { .. } => (Decimal::ZERO, false),
    };

    check_savings(cart_amount, savings)?;
    let final_amount = if deducted {
        cart_amount.checked_sub(savings).ok_or_else(overflow)?
    } else {
        cart_amount
    };
    if final_amount < Decimal::ZERO {
        return Err(CalculatorError::NegativeFinalAmount { final_amount });
    }

    Ok(SavingsOutcome { final_amount, savings_amount: savings })
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn check_savings(cart_amount: Decimal, savings: Decimal) -> Result<(), CalculatorError> {
    if savings < Decimal::ZERO {
        return Err(CalculatorError::NegativeSavings { savings });
    }
    if savings > cart_amount {
        return Err(CalculatorError::SavingsExceedCart { savings, cart_amount });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{calculate, CalculatorError, CASHBACK_CART_SHARE, POINT_VALUE};
    use crate::domain::campaign::DiscountModel;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn percentage(rate: i64, cap: Option<i64>) -> DiscountModel {
        DiscountModel::Percentage { rate: dec(rate), max_discount: cap.map(dec) }
    }

    #[test]
    fn constants_hold_expected_values() {
        assert_eq!(CASHBACK_CART_SHARE, Decimal::new(3, 1));
        assert_eq!(POINT_VALUE, Decimal::new(1, 2));
    }

    #[test]
    fn percentage_below_cap_is_deducted_from_cart() {
        let outcome = calculate(&percentage(10, Some(50)), dec(200)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(20));
        assert_eq!(outcome.final_amount, dec(180));
    }

    #[test]
    fn percentage_is_clamped_to_max_discount() {
        let outcome = calculate(&percentage(10, Some(50)), dec(1000)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(50));
        assert_eq!(outcome.final_amount, dec(950));
    }

    #[test]
    fn percentage_without_cap_is_uncapped() {
        let outcome = calculate(&percentage(15, None), dec(1000)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(150));
        assert_eq!(outcome.final_amount, dec(850));
    }

    #[test]
    fn percentage_rounds_to_cents() {
        let discount =
            DiscountModel::Percentage { rate: Decimal::new(125, 1), max_discount: None };
        let outcome = calculate(&discount, Decimal::new(9999, 2)).expect("valid outcome");
        // 99.99 * 12.5 % = 12.49875
        assert_eq!(outcome.savings_amount, Decimal::new(1250, 2));
        assert_eq!(outcome.final_amount, Decimal::new(8749, 2));
    }

    #[test]
    fn cashback_under_ceiling_keeps_cart_unchanged() {
        let discount = DiscountModel::Cashback { amount: dec(30), max_discount: None };
        let outcome = calculate(&discount, dec(200)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(30));
        assert_eq!(outcome.final_amount, dec(200));
    }

    #[test]
    fn cashback_is_bounded_by_thirty_percent_of_cart() {
        let discount = DiscountModel::Cashback { amount: dec(100), max_discount: None };
        let outcome = calculate(&discount, dec(200)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(60));
        assert_eq!(outcome.final_amount, dec(200));
    }

    #[test]
    fn cashback_ignores_configured_max_discount() {
        let discount = DiscountModel::Cashback { amount: dec(40), max_discount: Some(dec(5)) };
        let outcome = calculate(&discount, dec(200)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(40));
    }

    #[test]
    fn points_convert_at_one_cent_each() {
        let discount = DiscountModel::Points { points: dec(1500) };
        let outcome = calculate(&discount, dec(300)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(15));
        assert_eq!(outcome.final_amount, dec(300));
    }

    #[test]
    fn installment_has_no_direct_savings() {
        let discount = DiscountModel::Installment { installments: dec(6) };
        let outcome = calculate(&discount, dec(300)).expect("valid outcome");
        assert_eq!(outcome.savings_amount, Decimal::ZERO);
        assert_eq!(outcome.final_amount, dec(300));
    }

    #[test]
    fn uncapped_percentage_above_hundred_violates_invariant() {
        let error = calculate(&percentage(150, None), dec(100)).expect_err("must fail");
        assert!(matches!(error, CalculatorError::SavingsExceedCart { .. }));
    }

    #[test]
    fn points_worth_more_than_cart_violate_invariant() {
        let discount = DiscountModel::Points { points: dec(100_000) };
        let error = calculate(&discount, dec(500)).expect_err("must fail");
        assert_eq!(
            error,
            CalculatorError::SavingsExceedCart { savings: dec(1000), cart_amount: dec(500) }
        );
    }

    #[test]
    fn negative_discount_values_are_rejected() {
        let discount = DiscountModel::Cashback { amount: dec(-5), max_discount: None };
        let error = calculate(&discount, dec(100)).expect_err("must fail");
        assert!(matches!(error, CalculatorError::NegativeSavings { .. }));
    }

    #[test]
    fn non_positive_cart_is_rejected() {
        let error = calculate(&percentage(10, None), Decimal::ZERO).expect_err("must fail");
        assert!(matches!(error, CalculatorError::NonPositiveCart { .. }));
    }

    #[test]
    fn largest_cart_is_priced_without_overflow() {
        let outcome = calculate(&percentage(10, Some(100)), Decimal::MAX).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(100));
        assert_eq!(outcome.final_amount, Decimal::MAX - dec(100));

        let cashback = DiscountModel::Cashback { amount: dec(40), max_discount: None };
        let outcome = calculate(&cashback, Decimal::MAX).expect("valid outcome");
        assert_eq!(outcome.savings_amount, dec(40));
        assert_eq!(outcome.final_amount, Decimal::MAX);
    }

    #[test]
    fn overflowing_percentage_is_an_error() {
        let error = calculate(&percentage(150, None), Decimal::MAX).expect_err("must fail");
        assert_eq!(error, CalculatorError::Overflow { cart_amount: Decimal::MAX });
    }

    #[test]
    fn negative_rate_on_largest_cart_is_negative_savings() {
        let error = calculate(&percentage(-10, None), Decimal::MAX).expect_err("must fail");
        assert!(matches!(error, CalculatorError::NegativeSavings { .. }));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let discount = percentage(7, Some(40));
        let first = calculate(&discount, Decimal::new(33333, 2)).expect("valid outcome");
        let second = calculate(&discount, Decimal::new(33333, 2)).expect("valid outcome");
        assert_eq!(first, second);
    }
}
