//! Reduction of a run's hourly outputs into a single summary record.
use super::RunSpec;
use super::dispatch::HourOutput;
use super::resolve::RunParameters;
use crate::finance::{levelised_cost, payback_period};
use crate::scenario::ScenarioID;
use crate::units::{Dimensionless, Energy, Mass, Money, MoneyPerEnergy, MoneyPerMass};
use serde::Serialize;

/// The results of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    /// Scenario simulated
    pub scenario_id: ScenarioID,
    /// Year simulated
    pub year: u32,
    /// Name of the selling threshold
    pub threshold_label: String,
    /// Price at or above which stored hydrogen covers deficits
    pub selling_threshold: MoneyPerEnergy,
    /// Price at or below which hydrogen is produced
    pub buying_threshold: MoneyPerEnergy,
    /// Index of the storage configuration in `model.toml`
    pub storage_index: usize,
    /// Total storage capacity in tonnes
    pub storage_capacity_tonnes: f64,
    /// Share of the storage provided by the cavern-type medium
    pub cavern_share: Dimensionless,
    /// Round-trip efficiency of the whole system
    pub combined_efficiency: Dimensionless,
    /// Hydrogen produced
    pub hydrogen_produced: Mass,
    /// Hydrogen converted back to electricity
    pub hydrogen_converted: Mass,
    /// Hydrogen withdrawn from storage for sale
    pub hydrogen_withdrawn_for_sale: Mass,
    /// Hydrogen delivered to buyers
    pub hydrogen_sold: Mass,
    /// Electricity used to produce hydrogen
    pub electricity_used: Energy,
    /// Deficit covered by imports and hydrogen
    pub electricity_recovered: Energy,
    /// Deficit covered by hydrogen
    pub electricity_from_hydrogen: Energy,
    /// Electricity imported to cover deficits
    pub electricity_imported: Energy,
    /// Electricity exported to the neighbouring region
    pub electricity_exported: Energy,
    /// Surplus which could not be stored
    pub electricity_curtailed: Energy,
    /// Deficit in hours where the system acted
    pub total_deficit: Energy,
    /// Cost of the electricity used to produce hydrogen
    pub electricity_cost: Money,
    /// Cost of exporting hydrogen
    pub export_cost: Money,
    /// Net revenue from hydrogen sales
    pub revenue: Money,
    /// Annualised capital cost of the system
    pub annual_capital_cost: Money,
    /// Annual fixed operating cost of the system
    pub annual_operating_cost: Money,
    /// Overnight capital cost of the storage
    pub storage_capital_cost: Money,
    /// Sale price of hydrogen
    pub hydrogen_price: MoneyPerMass,
    /// Revenue minus all costs
    pub profit: Money,
    /// Percentage of the deficit covered by imports and hydrogen
    pub flexibility_index: f64,
    /// Percentage of the deficit covered by hydrogen
    pub hydrogen_flexibility_index: f64,
    /// Annual cost per kg of hydrogen produced
    pub lcoh_standard: MoneyPerMass,
    /// Annual cost net of revenue per kg of hydrogen produced
    pub lcoh_net: MoneyPerMass,
    /// Annual cost per kg of hydrogen converted back to electricity
    pub lcoh_p2g2p: MoneyPerMass,
    /// Years of revenue needed to pay for the storage
    pub storage_payback_years: f64,
    /// Years of revenue needed to pay for a year of running the whole system
    pub system_payback_years: f64,
    /// Mean storage level as a percentage of capacity
    pub storage_utilisation: f64,
    /// Highest total storage level at the end of any hour
    pub peak_storage_level: Mass,
    /// Longest run of consecutive surplus hours
    pub longest_surplus_streak_hours: usize,
}

/// A quantity as a percentage of a total, or zero if the total is zero
fn percentage(part: Energy, total: Energy) -> f64 {
    if total <= Energy(0.0) {
        return 0.0;
    }

    (part / total).value() * 100.0
}

/// The length of the longest run of consecutive surplus hours
fn longest_surplus_streak(hours: &[HourOutput]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for hour in hours {
        if hour.surplus {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    longest
}

/// Summarise a completed run.
///
/// # Arguments
///
/// * `spec` - Identifies the run
/// * `params` - The run's resolved parameters
/// * `hours` - The outputs of every hour of the run
pub fn summarise(spec: &RunSpec, params: &RunParameters, hours: &[HourOutput]) -> SummaryRecord {
    macro_rules! total {
        ($field:ident) => {
            hours.iter().map(|hour| hour.$field).sum()
        };
    }

    let hydrogen_produced: Mass = total!(hydrogen_produced);
    let hydrogen_converted: Mass = total!(hydrogen_converted);
    let electricity_from_hydrogen: Energy = total!(electricity_from_hydrogen);
    let electricity_imported: Energy = total!(electricity_imported);
    let total_deficit: Energy = total!(deficit);
    let electricity_cost: Money = total!(production_cost);
    let export_cost: Money = total!(export_cost);
    let revenue: Money = total!(revenue);
    let electricity_recovered = electricity_imported + electricity_from_hydrogen;

    let annual_capital_cost = params.annual_capital_cost();
    let annual_operating_cost = params.annual_operating_cost();
    let annual_cost = annual_capital_cost + annual_operating_cost + electricity_cost;

    let storage_utilisation = if hours.is_empty() {
        0.0
    } else {
        let total_level: Mass = hours.iter().map(HourOutput::storage_level).sum();
        (total_level / params.storage_capacity).value() / hours.len() as f64 * 100.0
    };

    SummaryRecord {
        scenario_id: params.scenario_id.clone(),
        year: params.year,
        threshold_label: spec.threshold.label.clone(),
        selling_threshold: params.dispatch.selling_threshold,
        buying_threshold: params.dispatch.buying_threshold,
        storage_index: spec.storage_index,
        storage_capacity_tonnes: params.storage_capacity.value() / 1000.0,
        cavern_share: spec.storage.cavern_share,
        combined_efficiency: params.combined_efficiency,
        hydrogen_produced,
        hydrogen_converted,
        hydrogen_withdrawn_for_sale: total!(hydrogen_withdrawn_for_sale),
        hydrogen_sold: total!(hydrogen_sold),
        electricity_used: total!(electricity_used),
        electricity_recovered,
        electricity_from_hydrogen,
        electricity_imported,
        electricity_exported: total!(electricity_exported),
        electricity_curtailed: total!(electricity_curtailed),
        total_deficit,
        electricity_cost,
        export_cost,
        revenue,
        annual_capital_cost,
        annual_operating_cost,
        storage_capital_cost: params.storage_capital_cost,
        hydrogen_price: params.dispatch.hydrogen_price,
        profit: revenue - (annual_cost + export_cost),
        flexibility_index: percentage(electricity_recovered, total_deficit),
        hydrogen_flexibility_index: percentage(electricity_from_hydrogen, total_deficit),
        lcoh_standard: levelised_cost(annual_cost, hydrogen_produced),
        lcoh_net: levelised_cost(annual_cost - revenue, hydrogen_produced).max(MoneyPerMass(0.0)),
        lcoh_p2g2p: levelised_cost(annual_cost, hydrogen_converted),
        storage_payback_years: payback_period(params.storage_capital_cost, revenue),
        system_payback_years: payback_period(annual_cost, revenue),
        storage_utilisation,
        peak_storage_level: hours
            .iter()
            .map(HourOutput::storage_level)
            .fold(Mass(0.0), Mass::max),
        longest_surplus_streak_hours: longest_surplus_streak(hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model, run_spec};
    use crate::model::Model;
    use crate::simulation::resolve::resolve_run_parameters;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn params(model: Model, run_spec: RunSpec) -> RunParameters {
        resolve_run_parameters(&model, &run_spec).unwrap()
    }

    fn hour_with(f: impl FnOnce(&mut HourOutput)) -> HourOutput {
        let mut hour = HourOutput {
            storage_levels: vec![Mass(0.0)],
            ..Default::default()
        };
        f(&mut hour);
        hour
    }

    #[rstest]
    fn test_summarise_no_deficits(run_spec: RunSpec, params: RunParameters) {
        let hours = [
            hour_with(|hour| {
                hour.hydrogen_produced = Mass(100.0);
                hour.electricity_used = Energy(5000.0);
                hour.production_cost = Money(100.0);
                hour.storage_levels = vec![Mass(100.0)];
            }),
            hour_with(|hour| hour.storage_levels = vec![Mass(100.0)]),
        ];
        let summary = summarise(&run_spec, &params, &hours);

        assert_eq!(summary.total_deficit, Energy(0.0));
        assert_eq!(summary.flexibility_index, 0.0);
        assert_eq!(summary.hydrogen_flexibility_index, 0.0);
        assert!(summary.lcoh_standard.is_finite());
        assert!(summary.lcoh_standard > MoneyPerMass(0.0));
        assert_eq!(summary.lcoh_p2g2p, MoneyPerMass(0.0));
        assert_eq!(summary.storage_payback_years, f64::INFINITY);
        assert_eq!(summary.system_payback_years, f64::INFINITY);
        assert_approx_eq!(f64, summary.storage_utilisation, 0.01);
    }

    #[rstest]
    fn test_summarise_totals_and_metrics(run_spec: RunSpec, params: RunParameters) {
        let hours = [
            hour_with(|hour| {
                hour.hydrogen_produced = Mass(1000.0);
                hour.production_cost = Money(500.0);
            }),
            hour_with(|hour| {
                hour.deficit = Energy(200.0);
                hour.electricity_imported = Energy(50.0);
                hour.electricity_from_hydrogen = Energy(100.0);
                hour.hydrogen_converted = Mass(10.0);
            }),
            hour_with(|hour| {
                hour.hydrogen_withdrawn_for_sale = Mass(100.0);
                hour.hydrogen_sold = Mass(95.0);
                hour.export_cost = Money(19.0);
                hour.revenue = Money(1_000_000.0);
            }),
        ];
        let summary = summarise(&run_spec, &params, &hours);

        assert_approx_eq!(f64, summary.flexibility_index, 75.0);
        assert_approx_eq!(f64, summary.hydrogen_flexibility_index, 50.0);
        assert_eq!(summary.electricity_recovered, Energy(150.0));
        assert_eq!(summary.hydrogen_sold, Mass(95.0));

        let annual_cost =
            params.annual_capital_cost() + params.annual_operating_cost() + Money(500.0);
        assert_approx_eq!(MoneyPerMass, summary.lcoh_standard, annual_cost / Mass(1000.0));
        assert_approx_eq!(MoneyPerMass, summary.lcoh_p2g2p, annual_cost / Mass(10.0));
        assert_approx_eq!(
            Money,
            summary.profit,
            Money(1_000_000.0) - annual_cost - Money(19.0)
        );
        assert_approx_eq!(
            f64,
            summary.storage_payback_years,
            params.storage_capital_cost.value() / 1_000_000.0
        );
    }

    #[rstest]
    fn test_summarise_net_lcoh_floored(run_spec: RunSpec, params: RunParameters) {
        let hours = [hour_with(|hour| {
            hour.hydrogen_produced = Mass(1.0);
            hour.revenue = Money(1e12);
        })];
        let summary = summarise(&run_spec, &params, &hours);
        assert_eq!(summary.lcoh_net, MoneyPerMass(0.0));
        assert!(summary.profit > Money(0.0));
    }

    #[rstest]
    fn test_summarise_storage_sizing(run_spec: RunSpec, params: RunParameters) {
        let surplus_hour = |level: f64| {
            hour_with(|hour| {
                hour.surplus = true;
                hour.storage_levels = vec![Mass(level)];
            })
        };
        let deficit_hour = |level: f64| hour_with(|hour| hour.storage_levels = vec![Mass(level)]);
        let hours = [
            surplus_hour(10.0),
            surplus_hour(20.0),
            deficit_hour(15.0),
            surplus_hour(25.0),
            surplus_hour(40.0),
            surplus_hour(60.0),
            deficit_hour(30.0),
            surplus_hour(35.0),
        ];
        let summary = summarise(&run_spec, &params, &hours);
        assert_eq!(summary.peak_storage_level, Mass(60.0));
        assert_eq!(summary.longest_surplus_streak_hours, 3);
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&[false, false], 0)]
    #[case(&[true, true], 2)]
    #[case(&[false, true, true, false, true], 2)]
    fn test_longest_surplus_streak(#[case] surpluses: &[bool], #[case] expected: usize) {
        let hours: Vec<_> = surpluses
            .iter()
            .map(|surplus| hour_with(|hour| hour.surplus = *surplus))
            .collect();
        assert_eq!(longest_surplus_streak(&hours), expected);
    }

    #[rstest]
    fn test_summarise_empty(run_spec: RunSpec, params: RunParameters) {
        let summary = summarise(&run_spec, &params, &[]);
        assert_eq!(summary.storage_utilisation, 0.0);
        assert_eq!(summary.lcoh_standard, MoneyPerMass(0.0));
        assert_eq!(summary.peak_storage_level, Mass(0.0));
        assert_eq!(summary.longest_surplus_streak_hours, 0);
    }
}
