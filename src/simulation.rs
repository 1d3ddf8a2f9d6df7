//! Functionality for running the hydrogen storage simulation.
use crate::input::hourly::read_hourly_series;
use crate::model::{Model, StorageConfiguration};
use crate::output::DataWriter;
use crate::scenario::{ScenarioID, SellingThreshold};
use anyhow::Result;
use log::{debug, error, info};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;

pub mod dispatch;
pub use dispatch::{HourInput, HourOutput};
pub mod exchange;
pub mod resolve;
use resolve::{ResolveError, resolve_run_parameters};
pub mod sizing;
use sizing::size_converters;
pub mod storage;
pub mod summary;
use summary::{SummaryRecord, summarise};

/// Identifies a single run: one combination of scenario, year, threshold and storage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSpec {
    /// The scenario to simulate
    pub scenario: String,
    /// The year to simulate
    pub year: u32,
    /// The selling threshold
    pub threshold: SellingThreshold,
    /// Index of the storage configuration in `model.toml`
    pub storage_index: usize,
    /// How storage is sized and split
    pub storage: StorageConfiguration,
}

impl fmt::Display for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (threshold {}, storage configuration {})",
            self.scenario, self.year, self.threshold.label, self.storage_index
        )
    }
}

/// The results of a completed run
struct RunOutcome {
    summary: SummaryRecord,
    media_kinds: Vec<storage::MediumKind>,
    hours: Option<Vec<HourOutput>>,
}

/// Enumerate the runs for one scenario and year, in threshold then storage order
fn runs_for(model: &Model, scenario_id: &ScenarioID, year: u32) -> Vec<RunSpec> {
    let Some(thresholds) = model
        .lookups
        .selling_thresholds
        .get(&(scenario_id.clone(), year))
    else {
        return Vec::new();
    };

    let configurations = &model.parameters.storage_configurations;
    thresholds
        .iter()
        .flat_map(|threshold| {
            configurations
                .iter()
                .enumerate()
                .map(move |(storage_index, storage)| RunSpec {
                    scenario: scenario_id.to_string(),
                    year,
                    threshold: threshold.clone(),
                    storage_index,
                    storage: storage.clone(),
                })
        })
        .collect()
}

/// Enumerate every run of the model.
///
/// Runs are ordered by scenario, year, threshold and storage configuration. Scenario-year pairs
/// without selling thresholds contribute no runs.
pub fn enumerate_runs(model: &Model) -> Vec<RunSpec> {
    model
        .scenario_ids
        .iter()
        .flat_map(|scenario_id| {
            model
                .iter_years()
                .flat_map(move |year| runs_for(model, scenario_id, year))
        })
        .collect()
}

/// Load the hourly series shared by every run of a scenario and year.
///
/// A missing or malformed file is reported as a [`ResolveError`], so that it fails only the runs
/// which need it.
fn load_hours(
    model: &Model,
    scenario_id: &ScenarioID,
    year: u32,
) -> Result<Vec<HourInput>, ResolveError> {
    match read_hourly_series(&model.model_dir, scenario_id, year, &model.parameters.dispatch) {
        Ok(Some(hours)) => Ok(hours),
        Ok(None) => Err(ResolveError::ConfigurationNotFound(format!(
            "no hourly data for {scenario_id} in {year}"
        ))),
        Err(err) => Err(ResolveError::InvalidConfiguration(format!("{err:#}"))),
    }
}

/// Resolve, dispatch and summarise one run
fn simulate(
    model: &Model,
    spec: &RunSpec,
    hours: &Result<Vec<HourInput>, ResolveError>,
    keep_hours: bool,
) -> Result<RunOutcome, ResolveError> {
    debug!("Starting run: {spec}");
    let params = resolve_run_parameters(model, spec)?;
    let hours = hours.as_ref().map_err(Clone::clone)?;
    let (outputs, _) = dispatch::run_dispatch(&params.dispatch, hours);

    Ok(RunOutcome {
        summary: summarise(spec, &params, &outputs),
        media_kinds: params.dispatch.media.iter().map(|m| m.kind).collect(),
        hours: keep_hours.then_some(outputs),
    })
}

/// Run the simulation.
///
/// Runs for the same scenario and year share one hourly series and are simulated in parallel.
/// Runs which fail are logged and left out of the results.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write the hourly outputs of every run
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    let mut writer = DataWriter::create(output_path, debug_model)?;
    let (mut succeeded, mut failed) = (0, 0);

    for scenario_id in &model.scenario_ids {
        for year in model.iter_years() {
            let runs = runs_for(model, scenario_id, year);
            if runs.is_empty() {
                continue;
            }

            info!("Simulating {} runs for {scenario_id} in {year}", runs.len());
            let hours = load_hours(model, scenario_id, year);
            if let Ok(hours) = &hours {
                match size_converters(model, scenario_id, year, hours) {
                    Ok(sizing) => writer.write_sizing(&sizing)?,
                    Err(err) => error!("Sizing for {scenario_id} in {year} failed: {err}"),
                }
            }

            let outcomes: Vec<_> = runs
                .par_iter()
                .map(|spec| simulate(model, spec, &hours, debug_model))
                .collect();

            for (spec, outcome) in runs.iter().zip(outcomes) {
                match outcome {
                    Ok(outcome) => {
                        writer.write_summary(&outcome.summary)?;
                        if let Some(hours) = &outcome.hours {
                            writer.write_hourly(spec, &outcome.media_kinds, hours)?;
                        }
                        succeeded += 1;
                    }
                    Err(err) => {
                        error!("Run {spec} failed: {err}");
                        failed += 1;
                    }
                }
            }
        }
    }

    writer.flush()?;
    info!("Completed {succeeded} runs ({failed} failed)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{model, run_spec};
    use crate::input::hourly::HOURLY_DIR_NAME;
    use crate::units::{Dimensionless, MoneyPerEnergy};
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    const HOURLY_HEADER: &str = "timestamp,local_balance,neighbour_balance,local_price,neighbour_price";

    /// Write an hourly series file for NT in 2030 into a model folder
    fn write_hourly_file(model_dir: &Path, rows: &[&str]) {
        let dir = model_dir.join(HOURLY_DIR_NAME);
        fs::create_dir_all(&dir).unwrap();
        let contents = std::iter::once(HOURLY_HEADER)
            .chain(rows.iter().copied())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(dir.join("NT_2030.csv"), contents + "\n").unwrap();
    }

    #[rstest]
    fn test_enumerate_runs(model: Model, run_spec: RunSpec) {
        assert_eq!(enumerate_runs(&model), vec![run_spec]);
    }

    #[rstest]
    fn test_enumerate_runs_order(mut model: Model) {
        model
            .parameters
            .storage_configurations
            .push(StorageConfiguration {
                capacity_tonnes: None,
                cavern_share: Dimensionless(0.5),
            });
        model.lookups.selling_thresholds[0].push(SellingThreshold {
            label: "p90".into(),
            value: MoneyPerEnergy(150.0),
        });

        let runs = enumerate_runs(&model);
        let ids: Vec<_> = runs
            .iter()
            .map(|spec| (spec.threshold.label.as_str(), spec.storage_index))
            .collect();
        assert_eq!(ids, [("p75", 0), ("p75", 1), ("p90", 0), ("p90", 1)]);
    }

    #[rstest]
    fn test_enumerate_runs_skips_missing_thresholds(mut model: Model) {
        model.lookups.selling_thresholds.clear();
        assert!(enumerate_runs(&model).is_empty());
    }

    #[rstest]
    fn test_load_hours(mut model: Model) {
        let dir = tempdir().unwrap();
        write_hourly_file(
            dir.path(),
            &["2030-01-01 00:00,10,0,20,20", "2030-01-01 01:00,-5,0,150,150"],
        );
        model.model_dir = dir.path().to_path_buf();

        let hours = load_hours(&model, &"NT".into(), 2030).unwrap();
        assert_eq!(hours.len(), 2);
    }

    #[rstest]
    fn test_load_hours_missing(model: Model) {
        assert_eq!(
            load_hours(&model, &"NT".into(), 2030),
            Err(ResolveError::ConfigurationNotFound(
                "no hourly data for NT in 2030".into()
            ))
        );
    }

    #[rstest]
    fn test_load_hours_malformed(mut model: Model) {
        let dir = tempdir().unwrap();
        write_hourly_file(
            dir.path(),
            &["2030-01-01 00:00,10,0,20,20", "2030-01-01 02:00,-5,0,150,150"],
        );
        model.model_dir = dir.path().to_path_buf();

        let Err(ResolveError::InvalidConfiguration(msg)) = load_hours(&model, &"NT".into(), 2030)
        else {
            panic!("Expected an invalid configuration error");
        };
        assert!(msg.contains("consecutive hours"));
    }

    #[rstest]
    fn test_run_malformed_hours(mut model: Model) {
        let model_dir = tempdir().unwrap();
        write_hourly_file(model_dir.path(), &["not a timestamp,10,0,20,20"]);
        model.model_dir = model_dir.path().to_path_buf();
        let output_dir = tempdir().unwrap();

        // The failed runs are left out but the batch completes
        run(&model, output_dir.path(), false).unwrap();
        let summary = fs::read_to_string(output_dir.path().join("summary.csv")).unwrap();
        assert_eq!(summary, "");
        let sizing = fs::read_to_string(output_dir.path().join("sizing.csv")).unwrap();
        assert_eq!(sizing, "");
    }

    #[rstest]
    fn test_simulate_missing_hours(model: Model, run_spec: RunSpec) {
        let hours = Err(ResolveError::ConfigurationNotFound("no hourly data".into()));
        assert!(matches!(
            simulate(&model, &run_spec, &hours, false),
            Err(ResolveError::ConfigurationNotFound(_))
        ));
    }

    #[rstest]
    fn test_simulate(model: Model, run_spec: RunSpec) {
        let hours = Ok(vec![
            dispatch::tests::hour(10_000.0, 10.0),
            dispatch::tests::hour(-5_000.0, 200.0),
        ]);
        let outcome = simulate(&model, &run_spec, &hours, true).unwrap();
        assert_eq!(outcome.summary.scenario_id, ScenarioID::from("NT"));
        assert_eq!(outcome.media_kinds, [storage::MediumKind::Cavern]);
        assert_eq!(outcome.hours.unwrap().len(), 2);
    }
}
