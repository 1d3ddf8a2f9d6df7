//! This module defines various unit types and their conversions.
//!
//! Energy is tracked in kWh and hydrogen in kg, while electricity prices are quoted per MWh as on
//! the wholesale market. The conversion between the two happens in exactly one place: the
//! multiplication of [`Energy`] by [`MoneyPerEnergy`].
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{AddAssign, Div, Mul, SubAssign};

/// Number of kWh in one MWh
const KWH_PER_MWH: f64 = 1000.0;

macro_rules! unit_struct {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::Neg,
            derive_more::Display,
        )]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            /// Create a new instance of the unit type from a f64 value.
            pub const fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub const fn value(self) -> f64 {
                self.0
            }

            /// The smaller of two quantities
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }

            /// The larger of two quantities
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// The absolute value of the quantity
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            /// Whether the quantity is neither infinite nor NaN
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> Sum<&'a $name> for $name {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl float_cmp::ApproxEq for $name {
            type Margin = float_cmp::F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                <f64 as float_cmp::ApproxEq>::approx_eq(self.0, other.0, margin)
            }
        }
    };
}

/// Arithmetic shared by every dimensioned quantity (everything apart from [`Dimensionless`])
macro_rules! dimensioned {
    ($name:ident) => {
        impl Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

unit_struct!(Dimensionless, "A dimensionless quantity (efficiency, share, fraction).");

impl Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    /// Raise to an integer power
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }
}

// Base quantities
unit_struct!(Energy, "Electrical energy in kWh.");
unit_struct!(Mass, "Hydrogen mass in kg.");
unit_struct!(Money, "An amount of money in €.");
unit_struct!(Capacity, "Installed power capacity in kW.");

// Derived quantities
unit_struct!(EnergyPerMass, "Specific energy in kWh/kg (consumption or heating value).");
unit_struct!(MoneyPerEnergy, "Electricity price in €/MWh.");
unit_struct!(MoneyPerMass, "Hydrogen-related price in €/kg.");

dimensioned!(Energy);
dimensioned!(Mass);
dimensioned!(Money);
dimensioned!(Capacity);
dimensioned!(EnergyPerMass);
dimensioned!(MoneyPerEnergy);
dimensioned!(MoneyPerMass);

// Division rules
impl_div!(Energy, EnergyPerMass, Mass);
impl_div!(Money, Mass, MoneyPerMass);

// Multiplication rules
impl_mul!(Mass, EnergyPerMass, Energy);
impl_mul!(Mass, MoneyPerMass, Money);

impl Mul<MoneyPerEnergy> for Energy {
    type Output = Money;

    fn mul(self, rhs: MoneyPerEnergy) -> Money {
        Money(self.0 * rhs.0 / KWH_PER_MWH)
    }
}

impl Capacity {
    /// Create a capacity from a value in MW
    pub fn from_megawatts(mw: f64) -> Self {
        Self(mw * KWH_PER_MWH)
    }

    /// The energy delivered by running at this capacity for one hour
    pub fn hourly_energy(self) -> Energy {
        Energy(self.0)
    }
}

impl Energy {
    /// Create an energy quantity from a value in MWh
    pub fn from_megawatt_hours(mwh: f64) -> Self {
        Self(mwh * KWH_PER_MWH)
    }
}

impl Mass {
    /// Create a mass from a value in tonnes
    pub fn from_tonnes(tonnes: f64) -> Self {
        Self(tonnes * 1000.0)
    }
}
