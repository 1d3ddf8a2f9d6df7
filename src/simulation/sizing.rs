//! Estimates of the converter capacity a scenario-year calls for, from its hourly balances alone.
//!
//! Surplus left after exporting to the neighbouring region sizes the electrolysers. Deficits,
//! scaled up by the fuel cell efficiency, size the fuel cells.
use super::HourInput;
use super::dispatch::MIN_BALANCE;
use super::exchange::exchange_permitted;
use super::resolve::{ResolveError, technology};
use crate::model::{DispatchParameters, Model};
use crate::scenario::ScenarioID;
use crate::units::{Dimensionless, Energy};
use serde::Serialize;

/// kWh in one MWh, for expressing hourly energy as power in MW
const KWH_PER_MWH: f64 = 1000.0;

/// Converter capacities estimated for one scenario and year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingRecord {
    /// Scenario simulated
    pub scenario_id: ScenarioID,
    /// Year simulated
    pub year: u32,
    /// Largest surplus left after exports (MW)
    pub max_surplus_mw: f64,
    /// Mean surplus left after exports, over the hours with a surplus (MW)
    pub mean_surplus_mw: f64,
    /// Largest deficit (MW)
    pub max_deficit_mw: f64,
    /// Mean deficit over all hours (MW)
    pub mean_deficit_mw: f64,
    /// Fuel cell capacity needed to cover the largest deficit (MW)
    pub fuel_cell_max_mw: f64,
    /// Fuel cell capacity needed to cover the mean deficit (MW)
    pub fuel_cell_mean_mw: f64,
}

/// Surplus remaining in an hour once the neighbouring region's deficit has been covered.
///
/// Remainders below the surplus threshold count as zero.
fn residual_surplus(hour: &HourInput, dispatch: &DispatchParameters) -> Energy {
    if hour.local_balance < MIN_BALANCE {
        return Energy(0.0);
    }

    let mut surplus = hour.local_balance;
    if dispatch.exchange_enabled
        && hour.neighbour_balance < -MIN_BALANCE
        && exchange_permitted(
            hour.local_price,
            hour.neighbour_price,
            dispatch.exchange_price_tolerance,
        )
    {
        surplus -= surplus.min(-hour.neighbour_balance);
    }

    if surplus < MIN_BALANCE {
        Energy(0.0)
    } else {
        surplus
    }
}

/// Hourly energy expressed as power in MW
fn megawatts(energy: Energy) -> f64 {
    energy.value() / KWH_PER_MWH
}

/// Mean of some hourly energies as power in MW, or zero if there are none
fn mean_megawatts(total: Energy, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }

    megawatts(total) / count as f64
}

/// Estimate converter capacities from an hourly series.
///
/// # Arguments
///
/// * `scenario_id` - The scenario the series belongs to
/// * `year` - The year the series covers
/// * `hours` - The hourly series
/// * `dispatch` - Dispatch options, for the exchange rule
/// * `fuel_cell_efficiency` - Efficiency of the fuel cells
pub fn estimate_converter_sizes(
    scenario_id: &ScenarioID,
    year: u32,
    hours: &[HourInput],
    dispatch: &DispatchParameters,
    fuel_cell_efficiency: Dimensionless,
) -> SizingRecord {
    let surpluses: Vec<Energy> = hours
        .iter()
        .map(|hour| residual_surplus(hour, dispatch))
        .filter(|surplus| *surplus > Energy(0.0))
        .collect();
    let deficits: Vec<Energy> = hours
        .iter()
        .map(|hour| (-hour.local_balance).max(Energy(0.0)))
        .collect();

    let max_surplus = surpluses.iter().copied().fold(Energy(0.0), Energy::max);
    let max_deficit = deficits.iter().copied().fold(Energy(0.0), Energy::max);
    let mean_deficit = mean_megawatts(deficits.iter().sum(), deficits.len());

    SizingRecord {
        scenario_id: scenario_id.clone(),
        year,
        max_surplus_mw: megawatts(max_surplus),
        mean_surplus_mw: mean_megawatts(surpluses.iter().sum(), surpluses.len()),
        max_deficit_mw: megawatts(max_deficit),
        mean_deficit_mw: mean_deficit,
        fuel_cell_max_mw: megawatts(max_deficit / fuel_cell_efficiency),
        fuel_cell_mean_mw: mean_deficit / fuel_cell_efficiency.value(),
    }
}

/// Estimate converter capacities for a scenario and year of the model.
///
/// Fails if the model has no parameters for its fuel cell in that year.
pub fn size_converters(
    model: &Model,
    scenario_id: &ScenarioID,
    year: u32,
    hours: &[HourInput],
) -> Result<SizingRecord, ResolveError> {
    let fuel_cell = technology(model, &model.parameters.technologies.fuel_cell, year)?;

    Ok(estimate_converter_sizes(
        scenario_id,
        year,
        hours,
        &model.parameters.dispatch,
        fuel_cell.efficiency,
    ))
}
