//! Fixtures for tests
use crate::model::{
    DispatchParameters, LookupTables, Model, ModelParameters, StorageConfiguration,
    StorageMediumSelection, StorageTier, TechnologySelection,
};
use crate::scenario::{InstalledCapacity, SellingThreshold, ThresholdCapacity, threshold_key};
use crate::simulation::RunSpec;
use crate::technology::{TechnologyParameter, TechnologyParameterMap};
use crate::units::{Capacity, Dimensionless, Energy, EnergyPerMass, MoneyPerEnergy, MoneyPerMass};
use indexmap::{IndexSet, indexmap};
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

fn technology(
    efficiency: f64,
    capital_cost: f64,
    lifetime: u32,
    specific_consumption: Option<f64>,
) -> TechnologyParameter {
    TechnologyParameter {
        efficiency: Dimensionless(efficiency),
        capital_cost,
        fixed_operating_cost: capital_cost / 50.0,
        lifetime,
        specific_consumption: specific_consumption.map(EnergyPerMass),
    }
}

#[fixture]
pub fn technology_parameters() -> TechnologyParameterMap {
    [
        ("electrolyser", technology(0.7, 1000.0, 20, Some(50.0))),
        ("compressor", technology(0.8, 500.0, 20, Some(5.0))),
        ("cavern_small", technology(0.9, 2.0, 40, None)),
        ("cavern_large", technology(0.9, 1.0, 40, None)),
        ("tank", technology(0.95, 10.0, 20, None)),
        ("fuel_cell", technology(0.5, 1500.0, 15, None)),
    ]
    .into_iter()
    .map(|(id, parameter)| ((id.into(), 2030), parameter))
    .collect()
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        scenarios: vec!["NT".into()],
        years: vec![2030],
        discount_rate: Dimensionless(0.0),
        dispatch: DispatchParameters::default(),
        technologies: TechnologySelection {
            electrolyser: "electrolyser".into(),
            fuel_cell: "fuel_cell".into(),
            cavern: StorageMediumSelection {
                compressor: Some("compressor".into()),
                storage: vec![
                    StorageTier {
                        technology: "cavern_small".into(),
                        max_capacity_tonnes: Some(3000.0),
                    },
                    StorageTier {
                        technology: "cavern_large".into(),
                        max_capacity_tonnes: None,
                    },
                ],
            },
            tank: StorageMediumSelection {
                compressor: None,
                storage: vec![StorageTier {
                    technology: "tank".into(),
                    max_capacity_tonnes: None,
                }],
            },
        },
        storage_configurations: vec![storage_configuration()],
    }
}

#[fixture]
pub fn selling_threshold() -> SellingThreshold {
    SellingThreshold {
        label: "p75".into(),
        value: MoneyPerEnergy(120.0),
    }
}

#[fixture]
pub fn storage_configuration() -> StorageConfiguration {
    StorageConfiguration {
        capacity_tonnes: Some(1000.0),
        cavern_share: Dimensionless(1.0),
    }
}

/// A model with a single scenario and year, whose data are held in memory
#[fixture]
pub fn model(
    model_parameters: ModelParameters,
    technology_parameters: TechnologyParameterMap,
    selling_threshold: SellingThreshold,
) -> Model {
    let lookups = LookupTables {
        technologies: technology_parameters,
        installed_capacities: indexmap! {
            ("NT".into(), 2030) => InstalledCapacity {
                electrolyser: Capacity::from_megawatts(100.0),
                fuel_cell: Capacity::from_megawatts(50.0),
                exchange: Capacity::from_megawatts(10.0),
            }
        },
        threshold_capacities: indexmap! {
            ("NT".into(), 2030, threshold_key(selling_threshold.value)) => ThresholdCapacity {
                fuel_cell: Capacity::from_megawatts(20.0),
                storage: Energy::from_megawatt_hours(3333.0),
            }
        },
        selling_thresholds: indexmap! {
            ("NT".into(), 2030) => vec![selling_threshold]
        },
        hydrogen_prices: indexmap! { 2030 => MoneyPerMass(5.0) },
    };

    Model {
        model_dir: PathBuf::from("nonexistent"),
        scenario_ids: IndexSet::from(["NT".into()]),
        parameters: model_parameters,
        lookups,
    }
}

#[fixture]
pub fn run_spec(
    selling_threshold: SellingThreshold,
    storage_configuration: StorageConfiguration,
) -> RunSpec {
    RunSpec {
        scenario: "NT".into(),
        year: 2030,
        threshold: selling_threshold,
        storage_index: 0,
        storage: storage_configuration,
    }
}
