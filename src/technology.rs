//! Technologies are the physical components of the hydrogen system: electrolysers, compressors,
//! storage media and fuel cells.
use crate::id::define_id_type;
use crate::units::{Dimensionless, EnergyPerMass};
use indexmap::IndexMap;

define_id_type! {TechnologyID}

/// Techno-economic parameters for a technology in a given year.
///
/// Costs are per unit of the technology's capacity: kW for converters (electrolysers, compressors
/// and fuel cells) and kg of hydrogen for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyParameter {
    /// Conversion or round-trip efficiency
    pub efficiency: Dimensionless,
    /// Overnight capital cost per unit of capacity
    pub capital_cost: f64,
    /// Fixed operating cost per unit of capacity per year
    pub fixed_operating_cost: f64,
    /// Economic lifetime in years
    pub lifetime: u32,
    /// Electricity consumed per kg of hydrogen (electrolysers and compressors)
    pub specific_consumption: Option<EnergyPerMass>,
}

/// Technology parameters, keyed by technology and year
pub type TechnologyParameterMap = IndexMap<(TechnologyID, u32), TechnologyParameter>;
