//! The module responsible for writing output data to disk.
use crate::simulation::HourOutput;
use crate::simulation::RunSpec;
use crate::simulation::storage::MediumKind;
use crate::simulation::sizing::SizingRecord;
use crate::simulation::summary::SummaryRecord;
use crate::units::{Energy, Mass, Money};
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "h2flex_results";

/// The output file name for the run summaries
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for the converter sizing estimates
const SIZING_FILE_NAME: &str = "sizing.csv";

/// The folder for per-run hourly outputs
const HOURLY_DIRECTORY_NAME: &str = "hourly";

/// Format of timestamps in hourly output files
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model specified at `model_dir`.
///
/// # Arguments
///
/// * `output_dir` - The folder to create
/// * `allow_overwrite` - Whether an existing, non-empty folder may be replaced
///
/// # Returns
///
/// Whether an existing folder was overwritten, or an error if it is not empty and overwriting is not
/// allowed.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // Empty folder
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// The name of the hourly output file for a run
fn hourly_file_name(spec: &RunSpec) -> String {
    format!(
        "{}_{}_{}_{}.csv",
        spec.scenario, spec.year, spec.threshold.label, spec.storage_index
    )
}

/// Represents a row in an hourly output file
#[derive(Serialize, Debug, PartialEq)]
struct HourlyRow {
    timestamp: String,
    exchange_permitted: bool,
    hydrogen_produced: Mass,
    hydrogen_converted: Mass,
    hydrogen_withdrawn_for_sale: Mass,
    hydrogen_sold: Mass,
    electricity_used: Energy,
    electricity_exported: Energy,
    electricity_imported: Energy,
    electricity_from_hydrogen: Energy,
    electricity_curtailed: Energy,
    deficit: Energy,
    surplus: bool,
    production_cost: Money,
    export_cost: Money,
    revenue: Money,
    cavern_storage: Mass,
    tank_storage: Mass,
    selling: bool,
}

impl HourlyRow {
    /// Create a new [`HourlyRow`]
    fn new(hour: &HourOutput, media_kinds: &[MediumKind]) -> Self {
        let level_of = |kind: MediumKind| -> Mass {
            media_kinds
                .iter()
                .zip(&hour.storage_levels)
                .filter(|(k, _)| **k == kind)
                .map(|(_, level)| *level)
                .sum()
        };

        Self {
            timestamp: hour.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            exchange_permitted: hour.exchange_permitted,
            hydrogen_produced: hour.hydrogen_produced,
            hydrogen_converted: hour.hydrogen_converted,
            hydrogen_withdrawn_for_sale: hour.hydrogen_withdrawn_for_sale,
            hydrogen_sold: hour.hydrogen_sold,
            electricity_used: hour.electricity_used,
            electricity_exported: hour.electricity_exported,
            electricity_imported: hour.electricity_imported,
            electricity_from_hydrogen: hour.electricity_from_hydrogen,
            electricity_curtailed: hour.electricity_curtailed,
            deficit: hour.deficit,
            surplus: hour.surplus,
            production_cost: hour.production_cost,
            export_cost: hour.export_cost,
            revenue: hour.revenue,
            cavern_storage: level_of(MediumKind::Cavern),
            tank_storage: level_of(MediumKind::Tank),
            selling: hour.selling,
        }
    }
}

/// An object for writing simulation results to file
pub struct DataWriter {
    summary_writer: csv::Writer<File>,
    sizing_writer: csv::Writer<File>,
    hourly_dir: Option<PathBuf>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_hourly` - Whether to also write the hourly outputs of each run
    pub fn create(output_path: &Path, save_hourly: bool) -> Result<Self> {
        let new_writer = |file_name: &str| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(&file_path)
                .with_context(|| format!("Could not create {}", file_path.display()))
        };
        let summary_writer = new_writer(SUMMARY_FILE_NAME)?;
        let sizing_writer = new_writer(SIZING_FILE_NAME)?;

        let hourly_dir = if save_hourly {
            let dir = output_path.join(HOURLY_DIRECTORY_NAME);
            fs::create_dir_all(&dir)?;
            Some(dir)
        } else {
            None
        };

        Ok(Self {
            summary_writer,
            sizing_writer,
            hourly_dir,
        })
    }

    /// Write the summary of one run
    pub fn write_summary(&mut self, summary: &SummaryRecord) -> Result<()> {
        self.summary_writer.serialize(summary)?;
        Ok(())
    }

    /// Write the converter sizing estimates for one scenario and year
    pub fn write_sizing(&mut self, sizing: &SizingRecord) -> Result<()> {
        self.sizing_writer.serialize(sizing)?;
        Ok(())
    }

    /// Write the hourly outputs of one run to their own file.
    ///
    /// Does nothing unless the writer was created with `save_hourly`.
    ///
    /// # Arguments
    ///
    /// * `spec` - The run, used to name the file
    /// * `media_kinds` - The kind of each storage medium, in the order of the storage levels
    /// * `hours` - The run's hourly outputs
    pub fn write_hourly(
        &mut self,
        spec: &RunSpec,
        media_kinds: &[MediumKind],
        hours: &[HourOutput],
    ) -> Result<()> {
        let Some(hourly_dir) = &self.hourly_dir else {
            return Ok(());
        };

        let mut writer = csv::Writer::from_path(hourly_dir.join(hourly_file_name(spec)))?;
        for hour in hours {
            writer.serialize(HourlyRow::new(hour, media_kinds))?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.summary_writer.flush()?;
        self.sizing_writer.flush()?;
        Ok(())
    }
}
