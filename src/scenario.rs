//! Scenarios are the alternative projections of the power system (e.g. "NT", "GA", "DE") for which
//! installed capacities and hourly series are provided.
use crate::id::define_id_type;
use crate::units::{Capacity, Energy, MoneyPerEnergy, MoneyPerMass};
use indexmap::IndexMap;

define_id_type! {ScenarioID}

/// Installed capacities for one scenario and year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstalledCapacity {
    /// Electrolyser capacity
    pub electrolyser: Capacity,
    /// Fuel cell capacity
    pub fuel_cell: Capacity,
    /// Capacity of the interconnector with the neighbouring region
    pub exchange: Capacity,
}

/// Installed capacities, keyed by scenario and year
pub type InstalledCapacityMap = IndexMap<(ScenarioID, u32), InstalledCapacity>;

/// Fuel cell and storage capacities precomputed for a given selling threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCapacity {
    /// Fuel cell capacity
    pub fuel_cell: Capacity,
    /// Storage capacity, as the energy content of the stored hydrogen
    pub storage: Energy,
}

/// Precomputed capacities, keyed by scenario, year and [`threshold_key`]
pub type ThresholdCapacityMap = IndexMap<(ScenarioID, u32, i64), ThresholdCapacity>;

/// The key used to look up a selling threshold in a [`ThresholdCapacityMap`].
///
/// Thresholds are matched after rounding to two decimal places.
#[allow(clippy::cast_possible_truncation)]
pub fn threshold_key(threshold: MoneyPerEnergy) -> i64 {
    (threshold.value() * 100.0).round() as i64
}

/// A selling threshold to simulate
#[derive(Debug, Clone, PartialEq)]
pub struct SellingThreshold {
    /// Name of the threshold (e.g. "p75")
    pub label: String,
    /// Price above which stored hydrogen is converted back to electricity
    pub value: MoneyPerEnergy,
}

/// The selling thresholds to simulate, keyed by scenario and year
pub type SellingThresholdMap = IndexMap<(ScenarioID, u32), Vec<SellingThreshold>>;

/// Hydrogen sale prices, keyed by year
pub type HydrogenPriceMap = IndexMap<u32, MoneyPerMass>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(120.0, 12000)]
    #[case(120.004, 12000)]
    #[case(120.006, 12001)]
    #[case(0.0, 0)]
    #[case(-5.5, -550)]
    fn test_threshold_key(#[case] threshold: f64, #[case] expected: i64) {
        assert_eq!(threshold_key(MoneyPerEnergy(threshold)), expected);
    }
}
