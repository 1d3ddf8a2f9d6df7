//! Simulation of hydrogen storage as a source of flexibility for an electricity system.
//!
//! Surplus electricity is converted to hydrogen and stored, then either converted back to cover
//! deficits or sold, hour by hour, for every combination of scenario, year, selling threshold and
//! storage configuration in a model.
#![warn(missing_docs)]
pub mod cli;
pub mod finance;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod technology;
pub mod units;

#[cfg(test)]
mod fixture;
