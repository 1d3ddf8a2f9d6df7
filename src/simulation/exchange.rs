//! The price-parity rule deciding whether electricity may be exchanged with the neighbouring region.
use crate::units::{Dimensionless, MoneyPerEnergy};

/// Relative difference between the local and neighbouring electricity prices.
///
/// The difference is taken relative to the larger positive price, so the result does not depend
/// on which region is regarded as local. If neither price is positive the regions are treated as
/// fully exchangeable and the difference is zero.
pub fn relative_price_difference(
    local: MoneyPerEnergy,
    neighbour: MoneyPerEnergy,
) -> Dimensionless {
    let zero = MoneyPerEnergy(0.0);
    let divisor = match (local > zero, neighbour > zero) {
        (true, true) => local.max(neighbour),
        (true, false) => local,
        (false, true) => neighbour,
        (false, false) => return Dimensionless(0.0),
    };

    (local - neighbour).abs() / divisor
}

/// Whether exchange is permitted for an hour with the given prices
pub fn exchange_permitted(
    local: MoneyPerEnergy,
    neighbour: MoneyPerEnergy,
    tolerance: Dimensionless,
) -> bool {
    relative_price_difference(local, neighbour) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    const TOLERANCE: Dimensionless = Dimensionless(0.2);

    #[rstest]
    #[case(100.0, 80.0, 0.2)]
    #[case(80.0, 100.0, 0.2)]
    #[case(50.0, -10.0, 1.2)]
    #[case(-10.0, 50.0, 1.2)]
    #[case(0.0, 0.0, 0.0)]
    #[case(-5.0, -20.0, 0.0)]
    #[case(40.0, 40.0, 0.0)]
    fn test_relative_price_difference(
        #[case] local: f64,
        #[case] neighbour: f64,
        #[case] expected: f64,
    ) {
        assert_approx_eq!(
            Dimensionless,
            relative_price_difference(MoneyPerEnergy(local), MoneyPerEnergy(neighbour)),
            Dimensionless(expected)
        );
    }

    #[rstest]
    #[case(100.0, 85.0, true)]
    #[case(100.0, 70.0, false)]
    #[case(0.0, 0.0, true)]
    #[case(10.0, 0.0, false)]
    fn test_exchange_permitted(#[case] local: f64, #[case] neighbour: f64, #[case] expected: bool) {
        assert_eq!(
            exchange_permitted(MoneyPerEnergy(local), MoneyPerEnergy(neighbour), TOLERANCE),
            expected
        );
    }

    #[test]
    fn test_exchange_permitted_symmetric() {
        let prices = [-20.0, 0.0, 1.0, 10.0, 45.0, 50.0, 55.0, 62.5, 100.0, 250.0];
        for &a in &prices {
            for &b in &prices {
                let (a, b) = (MoneyPerEnergy(a), MoneyPerEnergy(b));
                assert_eq!(
                    exchange_permitted(a, b, TOLERANCE),
                    exchange_permitted(b, a, TOLERANCE),
                    "Gate is not symmetric for prices {a} and {b}"
                );
            }
        }
    }
}
