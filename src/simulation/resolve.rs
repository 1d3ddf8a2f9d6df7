//! Resolution of the constants for a single run from the model's lookup tables.
use super::RunSpec;
use super::dispatch::{DispatchConfig, DispatchOptions};
use super::storage::{MediumKind, StorageMedium};
use crate::finance::annual_capital_cost;
use crate::model::{Model, StorageMediumSelection};
use crate::scenario::{ScenarioID, threshold_key};
use crate::technology::{TechnologyID, TechnologyParameter};
use crate::units::{Capacity, Dimensionless, EnergyPerMass, Mass, Money};
use thiserror::Error;

/// Why the parameters for a run could not be resolved
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    /// The scenario is not one of the model's scenarios
    #[error("Unknown scenario {0}")]
    UnknownScenario(String),
    /// Some of the data needed for the run is missing
    #[error("Configuration not found: {0}")]
    ConfigurationNotFound(String),
    /// The data for the run is present but cannot be simulated
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// The annualised costs of one component of the system
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCost {
    /// The technology used
    pub technology: TechnologyID,
    /// Installed capacity (kW for converters, kg for storage)
    pub capacity: f64,
    /// Overnight capital cost
    pub capital_cost: Money,
    /// Capital cost spread over one year of the technology's lifetime
    pub annual_capital_cost: Money,
    /// Fixed operating cost for one year
    pub annual_operating_cost: Money,
}

impl ComponentCost {
    fn new(
        technology: &TechnologyID,
        parameter: &TechnologyParameter,
        capacity: f64,
        discount_rate: Dimensionless,
    ) -> Self {
        let capital_cost = Money(parameter.capital_cost * capacity);
        Self {
            technology: technology.clone(),
            capacity,
            capital_cost,
            annual_capital_cost: annual_capital_cost(
                capital_cost,
                parameter.lifetime,
                discount_rate,
            ),
            annual_operating_cost: Money(parameter.fixed_operating_cost * capacity),
        }
    }
}

/// The constants for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    /// The scenario simulated
    pub scenario_id: ScenarioID,
    /// The year simulated
    pub year: u32,
    /// Total storage capacity
    pub storage_capacity: Mass,
    /// Fraction of the overall round trip (electricity to hydrogen and back) which is recovered
    pub combined_efficiency: Dimensionless,
    /// Inputs for the dispatch engine
    pub dispatch: DispatchConfig,
    /// Costs of the electrolyser, compressors, storage media and fuel cell
    pub costs: Vec<ComponentCost>,
    /// Overnight capital cost of the storage media
    pub storage_capital_cost: Money,
}

impl RunParameters {
    /// Annualised capital cost of the whole system
    pub fn annual_capital_cost(&self) -> Money {
        self.costs.iter().map(|cost| cost.annual_capital_cost).sum()
    }

    /// Annual fixed operating cost of the whole system
    pub fn annual_operating_cost(&self) -> Money {
        self.costs.iter().map(|cost| cost.annual_operating_cost).sum()
    }
}

/// Look up the parameters of a technology for a year
pub(super) fn technology<'a>(
    model: &'a Model,
    id: &TechnologyID,
    year: u32,
) -> Result<&'a TechnologyParameter, ResolveError> {
    model
        .lookups
        .technologies
        .get(&(id.clone(), year))
        .ok_or_else(|| {
            ResolveError::ConfigurationNotFound(format!("no parameters for {id} in {year}"))
        })
}

/// The specific consumption of a technology, which must be present
fn specific_consumption(
    id: &TechnologyID,
    parameter: &TechnologyParameter,
) -> Result<EnergyPerMass, ResolveError> {
    parameter.specific_consumption.ok_or_else(|| {
        ResolveError::InvalidConfiguration(format!("{id} has no specific consumption"))
    })
}

/// A storage medium along with the technologies it uses
struct ResolvedMedium<'a> {
    medium: StorageMedium,
    share: Dimensionless,
    storage: (&'a TechnologyID, &'a TechnologyParameter),
    compressor: Option<(&'a TechnologyID, &'a TechnologyParameter, EnergyPerMass)>,
}

/// Resolve the technologies used by a storage medium with the given capacity
fn resolve_medium<'a>(
    model: &'a Model,
    year: u32,
    kind: MediumKind,
    selection: &'a StorageMediumSelection,
    capacity: Mass,
    share: Dimensionless,
    electrolyser_consumption: EnergyPerMass,
) -> Result<ResolvedMedium<'a>, ResolveError> {
    let storage_id = selection.storage_technology_for(capacity).ok_or_else(|| {
        ResolveError::ConfigurationNotFound(format!(
            "no {kind} storage technology for a capacity of {} t",
            capacity.value() / 1000.0
        ))
    })?;
    let storage = technology(model, storage_id, year)?;

    let compressor = selection
        .compressor
        .as_ref()
        .map(|id| -> Result<_, ResolveError> {
            let parameter = technology(model, id, year)?;
            Ok((id, parameter, specific_consumption(id, parameter)?))
        })
        .transpose()?;

    let (compression_efficiency, compressor_consumption) = compressor
        .map_or((Dimensionless(1.0), EnergyPerMass(0.0)), |(_, parameter, sc)| {
            (parameter.efficiency, sc)
        });

    Ok(ResolvedMedium {
        medium: StorageMedium {
            kind,
            capacity,
            round_trip_efficiency: storage.efficiency,
            compression_efficiency,
            specific_consumption: electrolyser_consumption + compressor_consumption,
        },
        share,
        storage: (storage_id, storage),
        compressor,
    })
}

/// Resolve the constants for a run.
///
/// # Arguments
///
/// * `model` - The model, whose lookup tables are read
/// * `spec` - Identifies the run
///
/// # Returns
///
/// The [`RunParameters`] or a [`ResolveError`] if the lookup tables lack something the run needs.
pub fn resolve_run_parameters(model: &Model, spec: &RunSpec) -> Result<RunParameters, ResolveError> {
    let scenario_id = model
        .scenario_ids
        .get(spec.scenario.as_str())
        .ok_or_else(|| ResolveError::UnknownScenario(spec.scenario.clone()))?
        .clone();
    let year = spec.year;
    let parameters = &model.parameters;
    let lookups = &model.lookups;
    let lhv = parameters.dispatch.hydrogen_lhv;

    let installed = lookups
        .installed_capacities
        .get(&(scenario_id.clone(), year))
        .ok_or_else(|| {
            ResolveError::ConfigurationNotFound(format!(
                "no installed capacities for {scenario_id} in {year}"
            ))
        })?;
    let hydrogen_price = *lookups.hydrogen_prices.get(&year).ok_or_else(|| {
        ResolveError::ConfigurationNotFound(format!("no hydrogen price for {year}"))
    })?;

    // Storage and fuel cell are either sized explicitly or precomputed for the threshold
    let (storage_capacity, fuel_cell_capacity) = match spec.storage.capacity_tonnes {
        Some(tonnes) => (Mass::from_tonnes(tonnes), installed.fuel_cell),
        None => {
            let key = (scenario_id.clone(), year, threshold_key(spec.threshold.value));
            let precomputed = lookups.threshold_capacities.get(&key).ok_or_else(|| {
                ResolveError::ConfigurationNotFound(format!(
                    "no precomputed capacities for {scenario_id} in {year} at threshold {:.2}",
                    spec.threshold.value.value()
                ))
            })?;
            (precomputed.storage / lhv, precomputed.fuel_cell)
        }
    };
    if storage_capacity <= Mass(0.0) {
        return Err(ResolveError::InvalidConfiguration(
            "storage capacity must be greater than zero".into(),
        ));
    }

    // Converters
    let selection = &parameters.technologies;
    let electrolyser = technology(model, &selection.electrolyser, year)?;
    let electrolyser_consumption = specific_consumption(&selection.electrolyser, electrolyser)?;
    let fuel_cell = technology(model, &selection.fuel_cell, year)?;

    // Storage media with a non-zero share of the capacity
    let cavern_share = spec.storage.cavern_share;
    let media = [
        (MediumKind::Cavern, &selection.cavern, cavern_share),
        (MediumKind::Tank, &selection.tank, Dimensionless(1.0) - cavern_share),
    ]
    .into_iter()
    .filter(|(_, _, share)| *share > Dimensionless(0.0))
    .map(|(kind, medium_selection, share)| {
        resolve_medium(
            model,
            year,
            kind,
            medium_selection,
            storage_capacity * share,
            share,
            electrolyser_consumption,
        )
    })
    .collect::<Result<Vec<_>, _>>()?;

    // Combined efficiency, with storage and compression weighted by capacity share
    let storage_efficiency: Dimensionless = media
        .iter()
        .map(|m| m.share * m.medium.round_trip_efficiency)
        .sum();
    let compression_efficiency: Dimensionless = media
        .iter()
        .map(|m| m.share * m.medium.compression_efficiency)
        .sum();
    let combined_efficiency = fuel_cell.efficiency
        * storage_efficiency
        * compression_efficiency
        * (lhv / electrolyser_consumption);

    // Costs
    let discount_rate = parameters.discount_rate;
    let electrolyser_kw = installed.electrolyser;
    let mut costs = vec![ComponentCost::new(
        &selection.electrolyser,
        electrolyser,
        electrolyser_kw.value(),
        discount_rate,
    )];
    for m in &media {
        if let Some((id, parameter, consumption)) = m.compressor {
            let compressor_kw: Capacity =
                electrolyser_kw * (consumption / electrolyser_consumption) * m.share;
            costs.push(ComponentCost::new(
                id,
                parameter,
                compressor_kw.value(),
                discount_rate,
            ));
        }
    }
    let mut storage_capital_cost = Money(0.0);
    for m in &media {
        let (id, parameter) = m.storage;
        let cost = ComponentCost::new(id, parameter, m.medium.capacity.value(), discount_rate);
        storage_capital_cost += cost.capital_cost;
        costs.push(cost);
    }
    costs.push(ComponentCost::new(
        &selection.fuel_cell,
        fuel_cell,
        fuel_cell_capacity.value(),
        discount_rate,
    ));

    let dispatch_parameters = &parameters.dispatch;
    let dispatch = DispatchConfig {
        media: media.into_iter().map(|m| m.medium).collect(),
        selling_threshold: spec.threshold.value,
        buying_threshold: spec.threshold.value * combined_efficiency,
        fuel_cell_efficiency: fuel_cell.efficiency,
        hydrogen_lhv: lhv,
        start_selling_level: storage_capacity * dispatch_parameters.start_selling_fraction,
        stop_selling_level: storage_capacity * dispatch_parameters.stop_selling_fraction,
        max_export_mass: installed.exchange.hourly_energy()
            * dispatch_parameters.export_capacity_factor
            / lhv,
        export_loss_fraction: dispatch_parameters.export_loss_fraction,
        export_cost: dispatch_parameters.export_cost,
        hydrogen_price,
        electrolyser_power: installed.electrolyser.hourly_energy(),
        fuel_cell_power: fuel_cell_capacity.hourly_energy(),
        options: DispatchOptions {
            selling_enabled: dispatch_parameters.selling_enabled,
            exchange_enabled: dispatch_parameters.exchange_enabled,
            exchange_price_tolerance: dispatch_parameters.exchange_price_tolerance,
            converter_limits_enabled: dispatch_parameters.converter_limits_enabled,
        },
    };

    Ok(RunParameters {
        scenario_id,
        year,
        storage_capacity,
        combined_efficiency,
        dispatch,
        costs,
        storage_capital_cost,
    })
}
