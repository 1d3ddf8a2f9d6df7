//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::id::IDCollection;
use crate::input::{
    deserialise_proportion, deserialise_proportion_nonzero, input_err_msg, is_sorted_and_unique,
    read_toml,
};
use crate::scenario::ScenarioID;
use crate::technology::{TechnologyID, TechnologyParameterMap};
use crate::units::{Dimensionless, EnergyPerMass, Mass, MoneyPerMass};
use anyhow::{Context, Result, ensure};
use chrono::Weekday;
use indexmap::IndexSet;
use log::warn;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_hydrogen_lhv, EnergyPerMass, 33.33);
define_unit_param_default!(default_exchange_price_tolerance, Dimensionless, 0.2);
define_unit_param_default!(default_start_selling_fraction, Dimensionless, 0.8);
define_unit_param_default!(default_stop_selling_fraction, Dimensionless, 0.2);
define_unit_param_default!(default_export_capacity_factor, Dimensionless, 0.7);
define_unit_param_default!(default_export_loss_fraction, Dimensionless, 0.05);
define_unit_param_default!(default_export_cost, MoneyPerMass, 0.2);
define_unit_param_default!(default_cavern_share, Dimensionless, 1.0);
define_param_default!(default_selling_window_start, u32, 8);
define_param_default!(default_selling_window_end, u32, 17);
define_param_default!(default_non_selling_days, Vec<Weekday>, vec![Weekday::Sun]);
define_param_default!(default_true, bool, true);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The recognised scenario identifiers (e.g. "NT", "GA", "DE")
    pub scenarios: Vec<String>,
    /// The years to simulate
    pub years: Vec<u32>,
    /// Discount rate used to annualise capital costs.
    ///
    /// Zero means capital costs are spread evenly over the technology's lifetime.
    #[serde(default)]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub discount_rate: Dimensionless,
    /// Options for the hourly dispatch
    #[serde(default)]
    pub dispatch: DispatchParameters,
    /// Which technologies make up the system
    pub technologies: TechnologySelection,
    /// The storage configurations to simulate for every scenario, year and threshold
    pub storage_configurations: Vec<StorageConfiguration>,
}

/// Options controlling the hourly dispatch
#[derive(Debug, Deserialize, PartialEq)]
pub struct DispatchParameters {
    /// Lower heating value of hydrogen
    #[serde(default = "default_hydrogen_lhv")]
    pub hydrogen_lhv: EnergyPerMass,
    /// Maximum relative price difference at which cross-border exchange is allowed
    #[serde(default = "default_exchange_price_tolerance")]
    pub exchange_price_tolerance: Dimensionless,
    /// Storage fill level (fraction of capacity) at which hydrogen selling starts
    #[serde(default = "default_start_selling_fraction")]
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub start_selling_fraction: Dimensionless,
    /// Storage fill level (fraction of capacity) at which hydrogen selling stops
    #[serde(default = "default_stop_selling_fraction")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub stop_selling_fraction: Dimensionless,
    /// First hour of the day (inclusive) in which hydrogen may be sold
    #[serde(default = "default_selling_window_start")]
    pub selling_window_start: u32,
    /// Last hour of the day (inclusive) in which hydrogen may be sold
    #[serde(default = "default_selling_window_end")]
    pub selling_window_end: u32,
    /// Days of the week on which no hydrogen is sold
    #[serde(default = "default_non_selling_days")]
    pub non_selling_days: Vec<Weekday>,
    /// Fraction of the exchange capacity available for hydrogen export
    #[serde(default = "default_export_capacity_factor")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub export_capacity_factor: Dimensionless,
    /// Fraction of exported hydrogen lost in transport
    #[serde(default = "default_export_loss_fraction")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub export_loss_fraction: Dimensionless,
    /// Cost of exporting one kg of hydrogen
    #[serde(default = "default_export_cost")]
    pub export_cost: MoneyPerMass,
    /// Whether stored hydrogen may be sold
    #[serde(default = "default_true")]
    pub selling_enabled: bool,
    /// Whether electricity may be exchanged with the neighbouring region
    #[serde(default = "default_true")]
    pub exchange_enabled: bool,
    /// Whether hourly production and fuel cell output are limited by the installed capacities
    #[serde(default)]
    pub converter_limits_enabled: bool,
}

impl Default for DispatchParameters {
    fn default() -> Self {
        Self {
            hydrogen_lhv: default_hydrogen_lhv(),
            exchange_price_tolerance: default_exchange_price_tolerance(),
            start_selling_fraction: default_start_selling_fraction(),
            stop_selling_fraction: default_stop_selling_fraction(),
            selling_window_start: default_selling_window_start(),
            selling_window_end: default_selling_window_end(),
            non_selling_days: default_non_selling_days(),
            export_capacity_factor: default_export_capacity_factor(),
            export_loss_fraction: default_export_loss_fraction(),
            export_cost: default_export_cost(),
            selling_enabled: true,
            exchange_enabled: true,
            converter_limits_enabled: false,
        }
    }
}

/// The technologies making up the hydrogen system
#[derive(Debug, Deserialize, PartialEq)]
pub struct TechnologySelection {
    /// Electrolyser technology
    pub electrolyser: TechnologyID,
    /// Fuel cell technology
    pub fuel_cell: TechnologyID,
    /// Technologies for the cavern-type storage medium
    pub cavern: StorageMediumSelection,
    /// Technologies for the tank-type storage medium
    pub tank: StorageMediumSelection,
}

/// The technologies used by one storage medium
#[derive(Debug, Deserialize, PartialEq)]
pub struct StorageMediumSelection {
    /// Compressor needed to store hydrogen in this medium, if any
    #[serde(default)]
    pub compressor: Option<TechnologyID>,
    /// Storage technologies, ordered by increasing capacity bound
    pub storage: Vec<StorageTier>,
}

/// A storage technology which applies up to a maximum storage capacity
#[derive(Debug, Deserialize, PartialEq)]
pub struct StorageTier {
    /// The storage technology
    pub technology: TechnologyID,
    /// Largest storage capacity (in tonnes) for which this technology is used
    #[serde(default)]
    pub max_capacity_tonnes: Option<f64>,
}

impl StorageMediumSelection {
    /// The storage technology to use for a medium of the given capacity
    pub fn storage_technology_for(&self, capacity: Mass) -> Option<&TechnologyID> {
        self.storage
            .iter()
            .find(|tier| {
                tier.max_capacity_tonnes
                    .is_none_or(|max| capacity <= Mass::from_tonnes(max))
            })
            .map(|tier| &tier.technology)
    }

    /// Iterate over every technology referenced by this medium
    fn iter_technologies(&self) -> impl Iterator<Item = &TechnologyID> {
        self.compressor
            .iter()
            .chain(self.storage.iter().map(|tier| &tier.technology))
    }
}

/// How storage is sized and split for a run
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct StorageConfiguration {
    /// Total storage capacity in tonnes.
    ///
    /// If omitted, storage and fuel cell capacities are taken from `threshold_capacities.csv`.
    #[serde(default)]
    pub capacity_tonnes: Option<f64>,
    /// Share of the storage capacity provided by the cavern-type medium (the rest is tanks)
    #[serde(default = "default_cavern_share")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub cavern_share: Dimensionless,
}

/// Check that the `years` parameter is valid
fn check_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`years` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`years` must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the selling hysteresis bounds are valid
fn check_selling_bounds(start: Dimensionless, stop: Dimensionless) -> Result<()> {
    ensure!(
        stop < start,
        "stop_selling_fraction must be less than start_selling_fraction"
    );

    Ok(())
}

/// Check that the selling window is valid
fn check_selling_window(start: u32, end: u32) -> Result<()> {
    ensure!(
        start <= end && end < 24,
        "Selling window must be a range of hours within a day (got {start} to {end})"
    );

    Ok(())
}

/// Check that a parameter is a finite number greater than zero
fn check_positive(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && value > 0.0,
        "{name} must be a finite number greater than zero"
    );

    Ok(())
}

/// Check that the storage configurations are valid
fn check_storage_configurations(configurations: &[StorageConfiguration]) -> Result<()> {
    ensure!(
        !configurations.is_empty(),
        "At least one storage configuration must be provided"
    );

    for configuration in configurations {
        if let Some(capacity) = configuration.capacity_tonnes {
            check_positive("capacity_tonnes", capacity)?;
        }
    }

    Ok(())
}

/// Check that a storage medium has at least one storage technology and sensible tiers
fn check_storage_medium(name: &str, medium: &StorageMediumSelection) -> Result<()> {
    ensure!(
        !medium.storage.is_empty(),
        "Storage medium {name} must have at least one storage technology"
    );

    let bounds = medium
        .storage
        .iter()
        .map(|tier| tier.max_capacity_tonnes.unwrap_or(f64::INFINITY));
    ensure!(
        is_sorted_and_unique(bounds),
        "Storage tiers for {name} must be ordered by increasing max_capacity_tonnes"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The set of recognised scenario IDs
    pub fn scenario_ids(&self) -> Result<IndexSet<ScenarioID>> {
        ensure!(!self.scenarios.is_empty(), "`scenarios` is empty");

        let ids: IndexSet<ScenarioID> = self
            .scenarios
            .iter()
            .map(|s| ScenarioID::new(s.trim()))
            .collect();
        ensure!(
            ids.len() == self.scenarios.len(),
            "`scenarios` contains duplicate values"
        );

        Ok(ids)
    }

    /// Check that every technology referenced in `model.toml` has parameters for every year
    pub fn check_technologies_present(&self, technologies: &TechnologyParameterMap) -> Result<()> {
        let selection = &self.technologies;
        let ids: IndexSet<&TechnologyID> = [&selection.electrolyser, &selection.fuel_cell]
            .into_iter()
            .chain(selection.cavern.iter_technologies())
            .chain(selection.tank.iter_technologies())
            .collect();

        let known: IndexSet<TechnologyID> = technologies.keys().map(|(id, _)| id.clone()).collect();
        for id in ids {
            known
                .get_id_by_str(&id.0)
                .with_context(|| format!("No parameters provided for technology {id}"))?;
            for year in &self.years {
                if !technologies.contains_key(&(id.clone(), *year)) {
                    // Not fatal: runs for this year will fail when resolving their parameters
                    warn!("Technology {id} has no parameters for year {year}");
                }
            }
        }

        Ok(())
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // years
        check_years(&self.years)?;

        // scenarios
        self.scenario_ids()?;

        // discount_rate already validated with deserialise_proportion

        // dispatch
        let dispatch = &self.dispatch;
        check_positive("hydrogen_lhv", dispatch.hydrogen_lhv.value())?;
        ensure!(
            dispatch.exchange_price_tolerance >= Dimensionless(0.0),
            "exchange_price_tolerance cannot be negative"
        );
        check_selling_bounds(
            dispatch.start_selling_fraction,
            dispatch.stop_selling_fraction,
        )?;
        check_selling_window(dispatch.selling_window_start, dispatch.selling_window_end)?;
        ensure!(
            dispatch.export_cost.is_finite() && dispatch.export_cost >= MoneyPerMass(0.0),
            "export_cost must be a finite, non-negative number"
        );
        if !dispatch.selling_enabled && !dispatch.exchange_enabled {
            warn!("Both hydrogen selling and electricity exchange are disabled");
        }

        // technologies
        check_storage_medium("cavern", &self.technologies.cavern)?;
        check_storage_medium("tank", &self.technologies.tank)?;

        // storage_configurations
        check_storage_configurations(&self.storage_configurations)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const MINIMAL_MODEL_TOML: &str = r#"
scenarios = ["NT", "DE"]
years = [2030, 2040]

[technologies]
electrolyser = "electrolyser"
fuel_cell = "fuel_cell"

[technologies.cavern]
compressor = "compressor"
storage = [
    { technology = "cavern_small", max_capacity_tonnes = 3000.0 },
    { technology = "cavern_large" },
]

[technologies.tank]
storage = [{ technology = "tank" }]

[[storage_configurations]]
capacity_tonnes = 1000.0
"#;

    #[test]
    fn test_check_years() {
        // Valid
        assert!(check_years(&[1]).is_ok());
        assert!(check_years(&[1, 2]).is_ok());

        // Invalid
        assert!(check_years(&[]).is_err());
        assert!(check_years(&[1, 1]).is_err());
        assert!(check_years(&[2, 1]).is_err());
    }

    #[rstest]
    #[case(8, 17, true)]
    #[case(0, 23, true)]
    #[case(12, 12, true)]
    #[case(17, 8, false)]
    #[case(8, 24, false)]
    fn test_check_selling_window(#[case] start: u32, #[case] end: u32, #[case] valid: bool) {
        assert_eq!(check_selling_window(start, end).is_ok(), valid);
    }

    #[test]
    fn test_check_selling_bounds() {
        assert!(check_selling_bounds(Dimensionless(0.8), Dimensionless(0.2)).is_ok());
        assert_error!(
            check_selling_bounds(Dimensionless(0.2), Dimensionless(0.2)),
            "stop_selling_fraction must be less than start_selling_fraction"
        );
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            write!(file, "{MINIMAL_MODEL_TOML}").unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.years, [2030, 2040]);
        assert_eq!(model_params.dispatch, DispatchParameters::default());
        assert_eq!(model_params.discount_rate, Dimensionless(0.0));
        assert_eq!(
            model_params.storage_configurations,
            [StorageConfiguration {
                capacity_tonnes: Some(1000.0),
                cavern_share: Dimensionless(1.0)
            }]
        );
        assert_eq!(model_params.scenario_ids().unwrap().len(), 2);
    }

    #[test]
    fn test_model_params_dispatch_overrides() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            write!(
                file,
                "{MINIMAL_MODEL_TOML}
[dispatch]
selling_enabled = false
converter_limits_enabled = true
non_selling_days = [\"Sat\", \"Sun\"]
"
            )
            .unwrap();
        }

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert!(!model_params.dispatch.selling_enabled);
        assert!(model_params.dispatch.exchange_enabled);
        assert!(model_params.dispatch.converter_limits_enabled);
        assert_eq!(
            model_params.dispatch.non_selling_days,
            [Weekday::Sat, Weekday::Sun]
        );
    }

    #[test]
    fn test_storage_technology_for() {
        let medium = StorageMediumSelection {
            compressor: None,
            storage: vec![
                StorageTier {
                    technology: "small".into(),
                    max_capacity_tonnes: Some(3000.0),
                },
                StorageTier {
                    technology: "large".into(),
                    max_capacity_tonnes: None,
                },
            ],
        };

        assert_eq!(
            medium.storage_technology_for(Mass::from_tonnes(3000.0)),
            Some(&"small".into())
        );
        assert_eq!(
            medium.storage_technology_for(Mass::from_tonnes(3500.0)),
            Some(&"large".into())
        );
    }

    #[test]
    fn test_check_storage_medium_unordered_tiers() {
        let medium = StorageMediumSelection {
            compressor: None,
            storage: vec![
                StorageTier {
                    technology: "large".into(),
                    max_capacity_tonnes: None,
                },
                StorageTier {
                    technology: "small".into(),
                    max_capacity_tonnes: Some(3000.0),
                },
            ],
        };

        assert_error!(
            check_storage_medium("cavern", &medium),
            "Storage tiers for cavern must be ordered by increasing max_capacity_tonnes"
        );
    }

    #[rstest]
    #[case(1.0, true)]
    #[case(1e-10, true)]
    #[case(0.0, false)]
    #[case(-1.0, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_check_positive(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(check_positive("value", value).is_ok(), expected_valid);
    }
}
