//! General functions related to finance.
use crate::units::{Dimensionless, Mass, Money, MoneyPerMass};

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualize capital costs over the lifetime of a technology.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let factor = (Dimensionless(1.0) + discount_rate).powi(lifetime.try_into().unwrap_or(i32::MAX));
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the annual cost of an overnight capital investment
pub fn annual_capital_cost(capital_cost: Money, lifetime: u32, discount_rate: Dimensionless) -> Money {
    let crf = capital_recovery_factor(lifetime, discount_rate);
    capital_cost * crf
}

/// Levelised cost of hydrogen: annual cost spread over the hydrogen output.
///
/// Zero output gives a cost of zero rather than dividing by zero.
pub fn levelised_cost(cost: Money, output: Mass) -> MoneyPerMass {
    if output <= Mass(0.0) {
        return MoneyPerMass(0.0);
    }

    cost / output
}

/// Number of years of revenue needed to recover a cost.
///
/// Infinite if there is no (positive) revenue.
pub fn payback_period(cost: Money, annual_revenue: Money) -> f64 {
    if annual_revenue <= Money(0.0) {
        return f64::INFINITY;
    }

    (cost / annual_revenue).value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0.05, 0.0)] // Edge case: lifetime==0
    #[case(10, 0.0, 0.1)] // Other edge case: discount_rate==0
    #[case(10, 0.05, 0.1295045749654567)]
    #[case(5, 0.03, 0.2183545714005762)]
    fn test_capital_recovery_factor(
        #[case] lifetime: u32,
        #[case] discount_rate: f64,
        #[case] expected: f64,
    ) {
        let result = capital_recovery_factor(lifetime, Dimensionless(discount_rate));
        assert_approx_eq!(f64, result.0, expected, epsilon = 1e-10);
    }

    #[rstest]
    #[case(1000.0, 10, 0.05, 129.5045749654567)]
    #[case(500.0, 5, 0.03, 109.17728570028798)]
    #[case(1000.0, 0, 0.05, 0.0)] // Zero lifetime
    #[case(2000.0, 20, 0.0, 100.0)] // Zero discount rate
    fn test_annual_capital_cost(
        #[case] capital_cost: f64,
        #[case] lifetime: u32,
        #[case] discount_rate: f64,
        #[case] expected: f64,
    ) {
        let result = annual_capital_cost(Money(capital_cost), lifetime, Dimensionless(discount_rate));
        assert_approx_eq!(Money, result, Money(expected), epsilon = 1e-8);
    }

    #[rstest]
    #[case(1000.0, 200.0, 5.0)]
    #[case(1000.0, 0.0, 0.0)] // No output
    #[case(0.0, 200.0, 0.0)]
    fn test_levelised_cost(#[case] cost: f64, #[case] output: f64, #[case] expected: f64) {
        assert_approx_eq!(
            MoneyPerMass,
            levelised_cost(Money(cost), Mass(output)),
            MoneyPerMass(expected)
        );
    }

    #[rstest]
    #[case(1000.0, 250.0, 4.0)]
    #[case(1000.0, 0.0, f64::INFINITY)]
    #[case(1000.0, -10.0, f64::INFINITY)]
    fn test_payback_period(#[case] cost: f64, #[case] revenue: f64, #[case] expected: f64) {
        assert_eq!(payback_period(Money(cost), Money(revenue)), expected);
    }
}
