//! Code for reading hydrogen sale prices.
use super::*;
use crate::scenario::HydrogenPriceMap;
use crate::units::MoneyPerMass;
use serde::Deserialize;
use std::path::Path;

const HYDROGEN_PRICES_FILE_NAME: &str = "hydrogen_prices.csv";

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct HydrogenPriceRaw {
    year: u32,
    price: f64,
}

/// Read the hydrogen sale price for each year.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - The years being simulated
pub fn read_hydrogen_prices(model_dir: &Path, years: &[u32]) -> Result<HydrogenPriceMap> {
    let file_path = model_dir.join(HYDROGEN_PRICES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_hydrogen_prices_from_iter(iter, years).with_context(|| input_err_msg(&file_path))
}

fn read_hydrogen_prices_from_iter<I>(iter: I, years: &[u32]) -> Result<HydrogenPriceMap>
where
    I: Iterator<Item = HydrogenPriceRaw>,
{
    let mut map = HydrogenPriceMap::new();
    for raw in iter {
        ensure!(
            years.binary_search(&raw.year).is_ok(),
            "Year {} is not one of the model's years",
            raw.year
        );
        ensure!(
            raw.price.is_finite() && raw.price >= 0.0,
            "Hydrogen price must be a finite, non-negative number"
        );
        ensure!(
            map.insert(raw.year, MoneyPerMass(raw.price)).is_none(),
            "Duplicate hydrogen price for {}",
            raw.year
        );
    }

    Ok(map)
}
