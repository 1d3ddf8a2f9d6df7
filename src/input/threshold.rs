//! Code for reading the selling thresholds to simulate.
use super::*;
use crate::id::IDCollection;
use crate::scenario::{ScenarioID, SellingThreshold, SellingThresholdMap};
use crate::units::MoneyPerEnergy;
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const THRESHOLDS_FILE_NAME: &str = "thresholds.csv";

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct SellingThresholdRaw {
    scenario_id: String,
    year: u32,
    label: String,
    value: f64,
}

/// Read the selling thresholds CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenario_ids` - The recognised scenarios
/// * `years` - The years being simulated
///
/// # Returns
///
/// The thresholds for each scenario and year, in file order.
pub fn read_selling_thresholds(
    model_dir: &Path,
    scenario_ids: &IndexSet<ScenarioID>,
    years: &[u32],
) -> Result<SellingThresholdMap> {
    let file_path = model_dir.join(THRESHOLDS_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_selling_thresholds_from_iter(iter, scenario_ids, years)
        .with_context(|| input_err_msg(&file_path))
}

fn read_selling_thresholds_from_iter<I>(
    iter: I,
    scenario_ids: &IndexSet<ScenarioID>,
    years: &[u32],
) -> Result<SellingThresholdMap>
where
    I: Iterator<Item = SellingThresholdRaw>,
{
    let mut map = SellingThresholdMap::new();
    for raw in iter {
        let scenario_id = scenario_ids.get_id_by_str(raw.scenario_id.trim())?;
        ensure!(
            years.binary_search(&raw.year).is_ok(),
            "Year {} is not one of the model's years",
            raw.year
        );
        ensure!(!raw.label.is_empty(), "Threshold label cannot be empty");
        ensure!(
            raw.value.is_finite() && raw.value >= 0.0,
            "Threshold {} must be a finite, non-negative number",
            raw.label
        );

        let thresholds = map.entry((scenario_id.clone(), raw.year)).or_default();
        ensure!(
            thresholds.iter().all(|t: &SellingThreshold| t.label != raw.label),
            "Duplicate threshold {} for scenario {scenario_id} in {}",
            raw.label,
            raw.year
        );
        thresholds.push(SellingThreshold {
            label: raw.label,
            value: MoneyPerEnergy(raw.value),
        });
    }

    Ok(map)
}
