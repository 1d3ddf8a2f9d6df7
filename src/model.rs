//! The model represents the static input data provided by the user.
use crate::scenario::{
    HydrogenPriceMap, InstalledCapacityMap, ScenarioID, SellingThresholdMap, ThresholdCapacityMap,
};
use crate::technology::TechnologyParameterMap;
use indexmap::IndexSet;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::{
    DispatchParameters, ModelParameters, StorageConfiguration, StorageMediumSelection,
    StorageTier, TechnologySelection,
};

/// The lookup tables from which run parameters are resolved.
///
/// These are loaded once and never modified, so they can be shared freely between runs.
#[derive(Debug, PartialEq)]
pub struct LookupTables {
    /// Technology parameters, keyed by technology and year
    pub technologies: TechnologyParameterMap,
    /// Installed capacities, keyed by scenario and year
    pub installed_capacities: InstalledCapacityMap,
    /// Precomputed fuel cell and storage capacities for given selling thresholds
    pub threshold_capacities: ThresholdCapacityMap,
    /// The selling thresholds to simulate for each scenario and year
    pub selling_thresholds: SellingThresholdMap,
    /// Hydrogen sale price for each year
    pub hydrogen_prices: HydrogenPriceMap,
}

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_dir: PathBuf,
    /// The recognised scenarios
    pub scenario_ids: IndexSet<ScenarioID>,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Tables of technology, capacity and price data
    pub lookups: LookupTables,
}

impl Model {
    /// Iterate over the model's years
    pub fn iter_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.parameters.years.iter().copied()
    }
}
