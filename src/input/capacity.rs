//! Code for reading installed and precomputed threshold capacities from CSV files.
use super::*;
use crate::id::IDCollection;
use crate::scenario::{
    InstalledCapacity, InstalledCapacityMap, ScenarioID, ThresholdCapacity, ThresholdCapacityMap,
    threshold_key,
};
use crate::units::{Capacity, Energy, MoneyPerEnergy};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const INSTALLED_CAPACITIES_FILE_NAME: &str = "installed_capacities.csv";
const THRESHOLD_CAPACITIES_FILE_NAME: &str = "threshold_capacities.csv";

/// A row of the installed capacities CSV file (capacities in MW)
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct InstalledCapacityRaw {
    scenario_id: String,
    year: u32,
    electrolyser_capacity: f64,
    fuel_cell_capacity: f64,
    exchange_capacity: f64,
}

/// A row of the threshold capacities CSV file
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct ThresholdCapacityRaw {
    scenario_id: String,
    year: u32,
    threshold: f64,
    /// Fuel cell capacity in MW
    fuel_cell_capacity: f64,
    /// Storage capacity in MWh of hydrogen
    storage_capacity: f64,
}

/// Check that a capacity value is a finite, non-negative number
fn check_capacity(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite, non-negative number"
    );

    Ok(())
}

/// Check that the year of a row is one of the model's years
fn check_year(year: u32, years: &[u32]) -> Result<()> {
    ensure!(
        years.binary_search(&year).is_ok(),
        "Year {year} is not one of the model's years"
    );

    Ok(())
}

/// Read installed capacities from the installed capacities CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenario_ids` - The recognised scenarios
/// * `years` - The years being simulated
pub fn read_installed_capacities(
    model_dir: &Path,
    scenario_ids: &IndexSet<ScenarioID>,
    years: &[u32],
) -> Result<InstalledCapacityMap> {
    let file_path = model_dir.join(INSTALLED_CAPACITIES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_installed_capacities_from_iter(iter, scenario_ids, years)
        .with_context(|| input_err_msg(&file_path))
}

fn read_installed_capacities_from_iter<I>(
    iter: I,
    scenario_ids: &IndexSet<ScenarioID>,
    years: &[u32],
) -> Result<InstalledCapacityMap>
where
    I: Iterator<Item = InstalledCapacityRaw>,
{
    let mut map = InstalledCapacityMap::new();
    for raw in iter {
        let scenario_id = scenario_ids.get_id_by_str(raw.scenario_id.trim())?;
        check_year(raw.year, years)?;
        check_capacity("electrolyser_capacity", raw.electrolyser_capacity)?;
        check_capacity("fuel_cell_capacity", raw.fuel_cell_capacity)?;
        check_capacity("exchange_capacity", raw.exchange_capacity)?;

        let capacity = InstalledCapacity {
            electrolyser: Capacity::from_megawatts(raw.electrolyser_capacity),
            fuel_cell: Capacity::from_megawatts(raw.fuel_cell_capacity),
            exchange: Capacity::from_megawatts(raw.exchange_capacity),
        };
        ensure!(
            map.insert((scenario_id.clone(), raw.year), capacity)
                .is_none(),
            "Duplicate installed capacities for scenario {scenario_id} in {}",
            raw.year
        );
    }

    Ok(map)
}

/// Read precomputed fuel cell and storage capacities for selling thresholds.
///
/// This file is optional. If it is absent, an empty map is returned and only storage
/// configurations with a fixed capacity can be simulated.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenario_ids` - The recognised scenarios
/// * `years` - The years being simulated
pub fn read_threshold_capacities(
    model_dir: &Path,
    scenario_ids: &IndexSet<ScenarioID>,
    years: &[u32],
) -> Result<ThresholdCapacityMap> {
    let file_path = model_dir.join(THRESHOLD_CAPACITIES_FILE_NAME);
    let iter = read_csv_optional(&file_path)?;
    read_threshold_capacities_from_iter(iter, scenario_ids, years)
        .with_context(|| input_err_msg(&file_path))
}

fn read_threshold_capacities_from_iter<I>(
    iter: I,
    scenario_ids: &IndexSet<ScenarioID>,
    years: &[u32],
) -> Result<ThresholdCapacityMap>
where
    I: Iterator<Item = ThresholdCapacityRaw>,
{
    let mut map = ThresholdCapacityMap::new();
    for raw in iter {
        let scenario_id = scenario_ids.get_id_by_str(raw.scenario_id.trim())?;
        check_year(raw.year, years)?;
        ensure!(raw.threshold.is_finite(), "Threshold must be a finite number");
        check_capacity("fuel_cell_capacity", raw.fuel_cell_capacity)?;
        check_capacity("storage_capacity", raw.storage_capacity)?;

        let key = threshold_key(MoneyPerEnergy(raw.threshold));
        let capacity = ThresholdCapacity {
            fuel_cell: Capacity::from_megawatts(raw.fuel_cell_capacity),
            storage: Energy::from_megawatt_hours(raw.storage_capacity),
        };
        ensure!(
            map.insert((scenario_id.clone(), raw.year, key), capacity)
                .is_none(),
            "Duplicate threshold capacities for scenario {scenario_id} in {} at threshold {:.2}",
            raw.year,
            raw.threshold
        );
    }

    Ok(map)
}
