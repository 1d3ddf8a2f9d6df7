//! Code for reading the hourly electricity balance and price series for a scenario and year.
use super::*;
use crate::model::DispatchParameters;
use crate::scenario::ScenarioID;
use crate::simulation::HourInput;
use crate::units::{Energy, MoneyPerEnergy};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The folder within the model directory which contains the hourly series
pub const HOURLY_DIR_NAME: &str = "hourly";

/// Format of the timestamp column
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A row of an hourly series CSV file (balances in MW, prices in €/MWh)
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct HourRaw {
    timestamp: String,
    local_balance: f64,
    neighbour_balance: f64,
    local_price: f64,
    neighbour_price: f64,
}

/// The path to the hourly series file for a scenario and year
pub fn hourly_series_path(model_dir: &Path, scenario_id: &ScenarioID, year: u32) -> PathBuf {
    model_dir
        .join(HOURLY_DIR_NAME)
        .join(format!("{scenario_id}_{year}.csv"))
}

/// Read the hourly series for a scenario and year.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `scenario_id` - The scenario
/// * `year` - The simulated year
/// * `dispatch` - Dispatch options, used to derive the selling window and non-selling day flags
///
/// # Returns
///
/// The hours in chronological order, `None` if the file does not exist or an error if it is
/// malformed.
pub fn read_hourly_series(
    model_dir: &Path,
    scenario_id: &ScenarioID,
    year: u32,
    dispatch: &DispatchParameters,
) -> Result<Option<Vec<HourInput>>> {
    let file_path = hourly_series_path(model_dir, scenario_id, year);
    if !file_path.is_file() {
        return Ok(None);
    }

    let iter = read_csv(&file_path)?;
    let hours = read_hourly_series_from_iter(iter, year, dispatch)
        .with_context(|| input_err_msg(&file_path))?;

    let expected = hours_in_year(year);
    if hours.len() != expected {
        warn!(
            "{} covers {} hours rather than a full year ({expected} hours)",
            file_path.display(),
            hours.len()
        );
    }

    Ok(Some(hours))
}

/// Number of hours in a calendar year
fn hours_in_year(year: u32) -> usize {
    let leap = i32::try_from(year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, 2, 29))
        .is_some();
    if leap { 366 * 24 } else { 365 * 24 }
}

fn read_hourly_series_from_iter<I>(
    iter: I,
    year: u32,
    dispatch: &DispatchParameters,
) -> Result<Vec<HourInput>>
where
    I: Iterator<Item = HourRaw>,
{
    let mut hours: Vec<HourInput> = Vec::new();
    for raw in iter {
        let timestamp = NaiveDateTime::parse_from_str(&raw.timestamp, TIMESTAMP_FORMAT)
            .with_context(|| format!("Invalid timestamp: {}", raw.timestamp))?;
        ensure!(
            timestamp.year() == i32::try_from(year)?,
            "Timestamp {timestamp} is not in {year}"
        );
        ensure!(
            timestamp.minute() == 0,
            "Timestamp {timestamp} is not on the hour"
        );
        if let Some(previous) = hours.last() {
            ensure!(
                timestamp - previous.timestamp == TimeDelta::hours(1),
                "Hourly series must be consecutive hours in order: {} is followed by {timestamp}",
                previous.timestamp
            );
        }
        ensure!(
            [
                raw.local_balance,
                raw.neighbour_balance,
                raw.local_price,
                raw.neighbour_price
            ]
            .iter()
            .all(|value| value.is_finite()),
            "Non-finite value in hour {timestamp}"
        );

        hours.push(HourInput {
            timestamp,
            local_balance: Energy::from_megawatt_hours(raw.local_balance),
            neighbour_balance: Energy::from_megawatt_hours(raw.neighbour_balance),
            local_price: MoneyPerEnergy(raw.local_price),
            neighbour_price: MoneyPerEnergy(raw.neighbour_price),
            in_selling_window: (dispatch.selling_window_start..=dispatch.selling_window_end)
                .contains(&timestamp.hour()),
            is_non_selling_day: dispatch.non_selling_days.contains(&timestamp.weekday()),
        });
    }

    ensure!(!hours.is_empty(), "Hourly series is empty");

    Ok(hours)
}
