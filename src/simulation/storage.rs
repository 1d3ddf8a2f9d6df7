//! Moving hydrogen into and out of the storage media.
//!
//! Each function here is a pure mapping from an amount to move and the current levels of the media
//! to the amounts moved per medium. The same code handles a single medium and several media sharing
//! the flow.
use crate::units::{Dimensionless, Energy, EnergyPerMass, Mass};
use serde::Serialize;
use std::fmt;

/// The kinds of storage medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumKind {
    /// Large-scale geological storage (e.g. salt caverns)
    Cavern,
    /// Pressurised tanks
    Tank,
}

impl fmt::Display for MediumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediumKind::Cavern => write!(f, "cavern"),
            MediumKind::Tank => write!(f, "tank"),
        }
    }
}

/// The fixed characteristics of one storage medium for a run
#[derive(Debug, Clone, PartialEq)]
pub struct StorageMedium {
    /// What kind of medium this is
    pub kind: MediumKind,
    /// Maximum amount of hydrogen stored
    pub capacity: Mass,
    /// Fraction of the stored hydrogen which is recovered on withdrawal
    pub round_trip_efficiency: Dimensionless,
    /// Efficiency of the compressor filling this medium (1 if there is none)
    pub compression_efficiency: Dimensionless,
    /// Electricity needed to produce and store one kg of hydrogen (electrolysis plus compression)
    pub specific_consumption: EnergyPerMass,
}

/// How full a storage medium is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saturation {
    /// Nothing stored
    Empty,
    /// Some hydrogen stored and some headroom left
    Partial,
    /// No headroom left
    Full,
}

impl Saturation {
    /// The saturation of a medium with the given level
    pub fn of(level: Mass, capacity: Mass) -> Self {
        if level >= capacity {
            Saturation::Full
        } else if level <= Mass(0.0) {
            Saturation::Empty
        } else {
            Saturation::Partial
        }
    }
}

/// The result of storing surplus electricity as hydrogen
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    /// Hydrogen added to each medium
    pub produced: Vec<Mass>,
    /// Electricity consumed
    pub electricity_used: Energy,
    /// Surplus electricity which could not be stored because the media filled up
    pub curtailed: Energy,
}

/// The result of withdrawing hydrogen for the fuel cell
#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    /// Hydrogen taken from each medium
    pub withdrawn: Vec<Mass>,
    /// Hydrogen reaching the fuel cell after storage losses
    pub delivered: Mass,
}

/// Total hydrogen stored across the media
pub fn total_level(levels: &[Mass]) -> Mass {
    levels.iter().sum()
}

/// Total capacity of the media
pub fn total_capacity(media: &[StorageMedium]) -> Mass {
    media.iter().map(|medium| medium.capacity).sum()
}

/// Convert surplus electricity into stored hydrogen.
///
/// The energy is first split between the media in proportion to their capacity and each medium
/// takes as much of its share as its headroom allows. Energy a medium could not take is then
/// offered to the media which still have headroom, in order. Whatever is left after that is
/// curtailed.
pub fn produce(surplus: Energy, media: &[StorageMedium], levels: &[Mass]) -> Production {
    debug_assert_eq!(media.len(), levels.len());

    let capacity = total_capacity(media);
    let mut produced = vec![Mass(0.0); media.len()];
    let mut electricity_used = Energy(0.0);
    let mut unallocated = Energy(0.0);

    for (i, (medium, level)) in media.iter().zip(levels).enumerate() {
        let share = surplus * (medium.capacity / capacity);
        match Saturation::of(*level, medium.capacity) {
            Saturation::Full => unallocated += share,
            Saturation::Empty | Saturation::Partial => {
                let (mass, used) = store(share, medium, *level);
                produced[i] = mass;
                electricity_used += used;
                unallocated += share - used;
            }
        }
    }

    for (i, (medium, level)) in media.iter().zip(levels).enumerate() {
        if unallocated <= Energy(0.0) {
            break;
        }
        let level = *level + produced[i];
        if Saturation::of(level, medium.capacity) == Saturation::Full {
            continue;
        }

        let (mass, used) = store(unallocated, medium, level);
        produced[i] += mass;
        electricity_used += used;
        unallocated -= used;
    }

    Production {
        produced,
        electricity_used,
        curtailed: unallocated.max(Energy(0.0)),
    }
}

/// Store as much hydrogen as `energy` allows in a medium, clipped to its headroom.
///
/// Returns the mass stored and the electricity used. When clipped, only the electricity needed for
/// the clipped mass is used.
fn store(energy: Energy, medium: &StorageMedium, level: Mass) -> (Mass, Energy) {
    let headroom = (medium.capacity - level).max(Mass(0.0));
    let mass = energy / medium.specific_consumption;
    if mass > headroom {
        (headroom, headroom * medium.specific_consumption)
    } else {
        (mass, energy)
    }
}

/// Withdraw hydrogen from storage so that `needed` reaches the fuel cell.
///
/// Each medium contributes in proportion to its share of the hydrogen currently stored, losing a
/// fraction according to its round-trip efficiency. If a medium runs dry, the others make up the
/// difference as far as their stock allows.
pub fn withdraw(needed: Mass, media: &[StorageMedium], levels: &[Mass]) -> Withdrawal {
    debug_assert_eq!(media.len(), levels.len());

    let mut withdrawn = vec![Mass(0.0); media.len()];
    let stock = total_level(levels);
    if stock <= Mass(0.0) || needed <= Mass(0.0) {
        return Withdrawal {
            withdrawn,
            delivered: Mass(0.0),
        };
    }

    let deliverable: Mass = media
        .iter()
        .zip(levels)
        .map(|(medium, level)| *level * medium.round_trip_efficiency)
        .sum();
    let target = needed.min(deliverable);

    let mut delivered = Mass(0.0);
    for (i, (medium, level)) in media.iter().zip(levels).enumerate() {
        if Saturation::of(*level, medium.capacity) == Saturation::Empty {
            continue;
        }
        let part = target * (*level / stock);
        let mass = (part / medium.round_trip_efficiency).min(*level);
        withdrawn[i] = mass;
        delivered += mass * medium.round_trip_efficiency;
    }

    for (i, (medium, level)) in media.iter().zip(levels).enumerate() {
        let shortfall = target - delivered;
        if shortfall <= Mass(0.0) {
            break;
        }
        let remaining = *level - withdrawn[i];
        if remaining <= Mass(0.0) {
            continue;
        }
        let mass = (shortfall / medium.round_trip_efficiency).min(remaining);
        withdrawn[i] += mass;
        delivered += mass * medium.round_trip_efficiency;
    }

    Withdrawal {
        withdrawn,
        delivered,
    }
}

/// Take `amount` of hydrogen from the media in proportion to their stock, with no losses.
///
/// `amount` must not exceed the total stock.
pub fn draw_proportionally(amount: Mass, levels: &[Mass]) -> Vec<Mass> {
    let stock = total_level(levels);
    if stock <= Mass(0.0) {
        return vec![Mass(0.0); levels.len()];
    }

    levels
        .iter()
        .map(|level| (amount * (*level / stock)).min(*level))
        .collect()
}
