//! Code for reading technology parameters from a CSV file.
use super::*;
use crate::technology::{TechnologyID, TechnologyParameter, TechnologyParameterMap};
use crate::units::EnergyPerMass;
use serde::Deserialize;
use std::path::Path;

const TECHNOLOGIES_FILE_NAME: &str = "technologies.csv";

/// A row of the technologies CSV file
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct TechnologyParameterRaw {
    technology_id: String,
    year: u32,
    efficiency: Option<f64>,
    capital_cost: f64,
    fixed_operating_cost: f64,
    lifetime: u32,
    specific_consumption: Option<f64>,
}

impl TechnologyParameterRaw {
    /// Validate the row and convert it into a [`TechnologyParameter`]
    fn into_parameter(self) -> Result<TechnologyParameter> {
        // A blank efficiency means the technology is lossless
        let efficiency = self.efficiency.unwrap_or(1.0);
        ensure!(
            efficiency > 0.0 && efficiency <= 1.0,
            "Efficiency must be in the range (0, 1]"
        );
        ensure!(
            self.capital_cost.is_finite() && self.capital_cost >= 0.0,
            "capital_cost must be a finite, non-negative number"
        );
        ensure!(
            self.fixed_operating_cost.is_finite() && self.fixed_operating_cost >= 0.0,
            "fixed_operating_cost must be a finite, non-negative number"
        );
        ensure!(self.lifetime > 0, "Lifetime must be greater than zero");
        if let Some(consumption) = self.specific_consumption {
            ensure!(
                consumption.is_finite() && consumption > 0.0,
                "specific_consumption must be a finite number greater than zero"
            );
        }

        Ok(TechnologyParameter {
            efficiency: Dimensionless(efficiency),
            capital_cost: self.capital_cost,
            fixed_operating_cost: self.fixed_operating_cost,
            lifetime: self.lifetime,
            specific_consumption: self.specific_consumption.map(EnergyPerMass),
        })
    }
}

/// Read technology parameters from the technologies CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `years` - The years being simulated
///
/// # Returns
///
/// Parameters keyed by technology ID and year, or an error.
pub fn read_technology_parameters(model_dir: &Path, years: &[u32]) -> Result<TechnologyParameterMap> {
    let file_path = model_dir.join(TECHNOLOGIES_FILE_NAME);
    let iter = read_csv(&file_path)?;
    read_technology_parameters_from_iter(iter, years).with_context(|| input_err_msg(&file_path))
}

fn read_technology_parameters_from_iter<I>(iter: I, years: &[u32]) -> Result<TechnologyParameterMap>
where
    I: Iterator<Item = TechnologyParameterRaw>,
{
    let mut map = TechnologyParameterMap::new();
    for raw in iter {
        ensure!(
            years.binary_search(&raw.year).is_ok(),
            "Year {} is not one of the model's years",
            raw.year
        );

        let id = TechnologyID::new(raw.technology_id.trim());
        let year = raw.year;
        let parameter = raw
            .into_parameter()
            .with_context(|| format!("Invalid parameters for technology {id} in {year}"))?;
        ensure!(
            map.insert((id.clone(), year), parameter).is_none(),
            "Duplicate entries for technology {id} in {year}"
        );
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn raw() -> TechnologyParameterRaw {
        TechnologyParameterRaw {
            technology_id: "electrolyser".into(),
            year: 2030,
            efficiency: Some(0.7),
            capital_cost: 1000.0,
            fixed_operating_cost: 20.0,
            lifetime: 20,
            specific_consumption: Some(55.0),
        }
    }

    #[rstest]
    fn test_read_technology_parameters_from_iter(raw: TechnologyParameterRaw) {
        let map = read_technology_parameters_from_iter([raw].into_iter(), &[2030]).unwrap();
        assert_eq!(
            map[&("electrolyser".into(), 2030)],
            TechnologyParameter {
                efficiency: Dimensionless(0.7),
                capital_cost: 1000.0,
                fixed_operating_cost: 20.0,
                lifetime: 20,
                specific_consumption: Some(EnergyPerMass(55.0)),
            }
        );
    }

    #[rstest]
    fn test_read_technology_parameters_default_efficiency(mut raw: TechnologyParameterRaw) {
        raw.efficiency = None;
        let map = read_technology_parameters_from_iter([raw].into_iter(), &[2030]).unwrap();
        assert_eq!(
            map[&("electrolyser".into(), 2030)].efficiency,
            Dimensionless(1.0)
        );
    }

    #[rstest]
    fn test_read_technology_parameters_bad_year(raw: TechnologyParameterRaw) {
        assert_error!(
            read_technology_parameters_from_iter([raw].into_iter(), &[2040]),
            "Year 2030 is not one of the model's years"
        );
    }

    #[rstest]
    fn test_read_technology_parameters_duplicate(raw: TechnologyParameterRaw) {
        assert_error!(
            read_technology_parameters_from_iter([raw.clone(), raw].into_iter(), &[2030]),
            "Duplicate entries for technology electrolyser in 2030"
        );
    }

    #[rstest]
    #[case(Some(0.0))]
    #[case(Some(1.5))]
    #[case(Some(-0.1))]
    fn test_read_technology_parameters_bad_efficiency(
        mut raw: TechnologyParameterRaw,
        #[case] efficiency: Option<f64>,
    ) {
        raw.efficiency = efficiency;
        assert!(read_technology_parameters_from_iter([raw].into_iter(), &[2030]).is_err());
    }

    #[test]
    fn test_read_technology_parameters_file() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(TECHNOLOGIES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "technology_id,year,efficiency,capital_cost,fixed_operating_cost,lifetime,specific_consumption
electrolyser,2030,,1000,20,20,55
tank,2030,0.95,500,5,30,"
            )
            .unwrap();
        }

        let map = read_technology_parameters(dir.path(), &[2030]).unwrap();
        assert_eq!(map.len(), 2);
        let tank = &map[&("tank".into(), 2030)];
        assert_eq!(tank.efficiency, Dimensionless(0.95));
        assert_eq!(tank.specific_consumption, None);
    }
}
