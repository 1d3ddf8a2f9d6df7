//! The hourly dispatch of the hydrogen system.
//!
//! Each hour is processed by [`step`], which maps the hour's inputs and the current
//! [`SimulationState`] to the hour's outputs and the next state. Hours must be processed in
//! chronological order because the storage level and the selling latch carry over between hours.
use super::exchange::exchange_permitted;
use super::storage::{StorageMedium, draw_proportionally, produce, total_level, withdraw};
use crate::units::{
    Dimensionless, Energy, EnergyPerMass, Mass, Money, MoneyPerEnergy, MoneyPerMass,
};
use chrono::NaiveDateTime;

/// Smallest imbalance (in either direction) regarded as a surplus or deficit
pub(super) const MIN_BALANCE: Energy = Energy(1.0);

/// The inputs for one hour
#[derive(Debug, Clone, PartialEq)]
pub struct HourInput {
    /// Start of the hour
    pub timestamp: NaiveDateTime,
    /// Local generation minus demand (positive for a surplus)
    pub local_balance: Energy,
    /// Generation minus demand in the neighbouring region
    pub neighbour_balance: Energy,
    /// Local marginal electricity price
    pub local_price: MoneyPerEnergy,
    /// Marginal electricity price in the neighbouring region
    pub neighbour_price: MoneyPerEnergy,
    /// Whether the hour is inside the daily hydrogen selling window
    pub in_selling_window: bool,
    /// Whether the hour falls on a day when no hydrogen is sold
    pub is_non_selling_day: bool,
}

/// Which optional behaviours of the engine are switched on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOptions {
    /// Whether stored hydrogen may be sold
    pub selling_enabled: bool,
    /// Whether electricity may be exchanged with the neighbouring region
    pub exchange_enabled: bool,
    /// Maximum relative price difference at which exchange is permitted
    pub exchange_price_tolerance: Dimensionless,
    /// Whether production and fuel cell output are limited by the installed converter power
    pub converter_limits_enabled: bool,
}

/// Everything the dispatch engine needs to know about a run
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// The storage media, sharing the flows in and out of storage
    pub media: Vec<StorageMedium>,
    /// Local price at or above which stored hydrogen covers deficits
    pub selling_threshold: MoneyPerEnergy,
    /// Local price at or below which surplus electricity is turned into hydrogen
    pub buying_threshold: MoneyPerEnergy,
    /// Fuel cell efficiency
    pub fuel_cell_efficiency: Dimensionless,
    /// Lower heating value of hydrogen
    pub hydrogen_lhv: EnergyPerMass,
    /// Total storage level at or above which the selling latch is set
    pub start_selling_level: Mass,
    /// Total storage level at or below which the selling latch is cleared
    pub stop_selling_level: Mass,
    /// Maximum hydrogen withdrawn for export in one hour
    pub max_export_mass: Mass,
    /// Fraction of exported hydrogen lost in transport
    pub export_loss_fraction: Dimensionless,
    /// Cost of exporting one kg of hydrogen
    pub export_cost: MoneyPerMass,
    /// Sale price of hydrogen
    pub hydrogen_price: MoneyPerMass,
    /// Most electricity the electrolysers can take in one hour
    pub electrolyser_power: Energy,
    /// Most electricity the fuel cells can deliver in one hour
    pub fuel_cell_power: Energy,
    /// Optional behaviours
    pub options: DispatchOptions,
}

/// Running totals kept over a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulators {
    /// Hydrogen produced
    pub produced: Mass,
    /// Hydrogen withdrawn for the fuel cell
    pub converted: Mass,
    /// Hydrogen delivered to buyers
    pub sold: Mass,
    /// Deficit energy in hours where the system acted
    pub deficit: Energy,
    /// Net revenue from hydrogen sales
    pub revenue: Money,
}

/// The state carried from one hour to the next
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    /// Hydrogen stored in each medium
    pub levels: Vec<Mass>,
    /// Whether hydrogen is currently being sold
    pub selling: bool,
    /// Running totals
    pub totals: Accumulators,
}

impl SimulationState {
    /// The state at the start of a run: empty storage and no selling
    pub fn new(num_media: usize) -> Self {
        Self {
            levels: vec![Mass(0.0); num_media],
            selling: false,
            totals: Accumulators::default(),
        }
    }

    /// Total hydrogen stored
    pub fn storage_level(&self) -> Mass {
        total_level(&self.levels)
    }
}

/// The outputs for one hour
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HourOutput {
    /// Start of the hour
    pub timestamp: NaiveDateTime,
    /// Whether the prices allowed exchange with the neighbouring region
    pub exchange_permitted: bool,
    /// Hydrogen produced
    pub hydrogen_produced: Mass,
    /// Hydrogen withdrawn from storage for the fuel cell
    pub hydrogen_converted: Mass,
    /// Hydrogen withdrawn from storage for sale
    pub hydrogen_withdrawn_for_sale: Mass,
    /// Hydrogen delivered to buyers, after export losses
    pub hydrogen_sold: Mass,
    /// Electricity used to produce hydrogen
    pub electricity_used: Energy,
    /// Electricity exported to cover the neighbouring region's deficit
    pub electricity_exported: Energy,
    /// Electricity imported to cover the local deficit
    pub electricity_imported: Energy,
    /// Electricity generated from stored hydrogen
    pub electricity_from_hydrogen: Energy,
    /// Surplus which could not be stored, for lack of room or electrolyser power
    pub electricity_curtailed: Energy,
    /// Deficit addressed by the system
    pub deficit: Energy,
    /// Whether the hour had a surplus
    pub surplus: bool,
    /// Cost of the electricity used for production
    pub production_cost: Money,
    /// Cost of exporting the hydrogen sold
    pub export_cost: Money,
    /// Net revenue from hydrogen sales
    pub revenue: Money,
    /// Hydrogen stored in each medium at the end of the hour
    pub storage_levels: Vec<Mass>,
    /// Whether the selling latch is set at the end of the hour
    pub selling: bool,
}

impl HourOutput {
    /// Total hydrogen stored at the end of the hour
    pub fn storage_level(&self) -> Mass {
        total_level(&self.storage_levels)
    }

    /// Deficit covered by imports and hydrogen together
    pub fn electricity_recovered(&self) -> Energy {
        self.electricity_imported + self.electricity_from_hydrogen
    }
}

/// Simulate one hour.
///
/// # Arguments
///
/// * `config` - The run's dispatch configuration
/// * `hour` - Inputs for this hour
/// * `state` - State at the end of the previous hour
///
/// # Returns
///
/// The outputs for this hour and the state at the end of it.
pub fn step(
    config: &DispatchConfig,
    hour: &HourInput,
    state: SimulationState,
) -> (HourOutput, SimulationState) {
    let SimulationState {
        mut levels,
        mut selling,
        mut totals,
    } = state;

    let mut output = HourOutput {
        timestamp: hour.timestamp,
        exchange_permitted: config.options.exchange_enabled
            && exchange_permitted(
                hour.local_price,
                hour.neighbour_price,
                config.options.exchange_price_tolerance,
            ),
        surplus: hour.local_balance >= MIN_BALANCE,
        ..Default::default()
    };

    if output.surplus {
        handle_surplus(config, hour, &mut levels, &mut output);
        if total_level(&levels) >= config.start_selling_level {
            selling = true;
        }
    } else if hour.local_price >= config.selling_threshold {
        handle_deficit(config, hour, &mut levels, &mut output);
        if total_level(&levels) <= config.stop_selling_level {
            selling = false;
        }
    }

    if config.options.selling_enabled
        && selling
        && !hour.is_non_selling_day
        && total_level(&levels) >= config.stop_selling_level
    {
        let floor_reached = if hour.in_selling_window {
            sell_hydrogen(config, &mut levels, &mut output)
        } else {
            false
        };
        if floor_reached || total_level(&levels) <= config.stop_selling_level {
            selling = false;
        }
    }

    totals.produced += output.hydrogen_produced;
    totals.converted += output.hydrogen_converted;
    totals.sold += output.hydrogen_sold;
    totals.deficit += output.deficit;
    totals.revenue += output.revenue;

    output.storage_levels.clone_from(&levels);
    output.selling = selling;

    (
        output,
        SimulationState {
            levels,
            selling,
            totals,
        },
    )
}

/// Export to the neighbour and store the remaining surplus as hydrogen, if electricity is cheap
fn handle_surplus(
    config: &DispatchConfig,
    hour: &HourInput,
    levels: &mut [Mass],
    output: &mut HourOutput,
) {
    if hour.local_price > config.buying_threshold {
        return;
    }

    let mut surplus = hour.local_balance;
    if output.exchange_permitted && hour.neighbour_balance < -MIN_BALANCE {
        let exported = surplus.min(-hour.neighbour_balance);
        surplus -= exported;
        output.electricity_exported = exported;
    }

    if surplus < MIN_BALANCE {
        return;
    }

    // Surplus beyond the electrolyser power is curtailed
    let mut over_capacity = Energy(0.0);
    if config.options.converter_limits_enabled && surplus > config.electrolyser_power {
        over_capacity = surplus - config.electrolyser_power;
        surplus = config.electrolyser_power;
    }

    let production = produce(surplus, &config.media, levels);
    for ((level, produced), medium) in levels.iter_mut().zip(&production.produced).zip(&config.media)
    {
        *level = (*level + *produced).min(medium.capacity);
    }

    output.hydrogen_produced = production.produced.iter().sum();
    output.electricity_used = production.electricity_used;
    output.electricity_curtailed = production.curtailed + over_capacity;
    output.production_cost = production.electricity_used * hour.local_price;
}

/// Cover a deficit with imports and stored hydrogen
fn handle_deficit(
    config: &DispatchConfig,
    hour: &HourInput,
    levels: &mut [Mass],
    output: &mut HourOutput,
) {
    let deficit = (-hour.local_balance).max(Energy(0.0));
    let neighbour_surplus = hour.neighbour_balance.max(Energy(0.0));
    let can_import = output.exchange_permitted && neighbour_surplus > Energy(0.0);
    output.deficit = deficit;

    let mut remaining = deficit;
    let mut imported = Energy(0.0);
    if can_import && hour.neighbour_price < config.buying_threshold {
        imported = neighbour_surplus.min(remaining);
        remaining -= imported;
    }

    if remaining > Energy(0.0) {
        let convertible = if config.options.converter_limits_enabled {
            remaining.min(config.fuel_cell_power)
        } else {
            remaining
        };
        let energy_per_kg = config.fuel_cell_efficiency * config.hydrogen_lhv;
        let withdrawal = withdraw(convertible / energy_per_kg, &config.media, levels);
        for (level, withdrawn) in levels.iter_mut().zip(&withdrawal.withdrawn) {
            *level = (*level - *withdrawn).max(Mass(0.0));
        }

        let recovered = (withdrawal.delivered * energy_per_kg).min(convertible);
        output.hydrogen_converted = withdrawal.withdrawn.iter().sum();
        output.electricity_from_hydrogen = recovered;

        // Fall back on importing whatever hydrogen could not cover
        let residual = remaining - recovered;
        if residual > Energy(0.0) && imported == Energy(0.0) && can_import {
            imported = neighbour_surplus.min(residual);
        }
    }

    output.electricity_imported = imported;
}

/// Sell hydrogen down towards the stop-selling level.
///
/// Returns whether the stop-selling level was reached.
fn sell_hydrogen(config: &DispatchConfig, levels: &mut [Mass], output: &mut HourOutput) -> bool {
    let available = total_level(levels) - config.stop_selling_level;
    let quantity = config.max_export_mass.min(available);
    if quantity <= Mass(0.0) {
        return available <= Mass(0.0);
    }

    let draws = draw_proportionally(quantity, levels);
    for (level, drawn) in levels.iter_mut().zip(draws) {
        *level = (*level - drawn).max(Mass(0.0));
    }

    let sold = quantity * (Dimensionless(1.0) - config.export_loss_fraction);
    let export_cost = sold * config.export_cost;
    output.hydrogen_withdrawn_for_sale = quantity;
    output.hydrogen_sold = sold;
    output.export_cost = export_cost;
    output.revenue = sold * config.hydrogen_price - export_cost;

    quantity >= available
}

/// Simulate a series of hours, starting with empty storage.
///
/// # Arguments
///
/// * `config` - The run's dispatch configuration
/// * `hours` - The hourly inputs, in chronological order
///
/// # Returns
///
/// The outputs for every hour and the state at the end of the last one.
pub fn run_dispatch(
    config: &DispatchConfig,
    hours: &[HourInput],
) -> (Vec<HourOutput>, SimulationState) {
    let mut state = SimulationState::new(config.media.len());
    let mut outputs = Vec::with_capacity(hours.len());
    for hour in hours {
        let (output, next) = step(config, hour, state);
        outputs.push(output);
        state = next;
    }

    (outputs, state)
}
