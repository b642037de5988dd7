//! Commission rate value object, stored in basis points.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Share of an order total paid to a staff member, in basis points
/// (1/100 of a percent). `1250` means 12.5 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionRate(u16);

impl CommissionRate {
    pub const ZERO: Self = Self(0);
    pub const MAX_BASIS_POINTS: u16 = 10_000;

    /// Creates a rate, returning error if above 100 %.
    pub fn from_basis_points(bp: u16) -> Result<Self, ValidationError> {
        if bp > Self::MAX_BASIS_POINTS {
            return Err(ValidationError::out_of_range(
                "commission_rate",
                0,
                i64::from(Self::MAX_BASIS_POINTS),
                i64::from(bp),
            ));
        }
        Ok(Self(bp))
    }

    /// Creates a rate from a whole percentage (0-100).
    pub fn from_percent(pct: u8) -> Result<Self, ValidationError> {
        Self::from_basis_points(u16::from(pct) * 100)
    }

    pub fn basis_points(&self) -> u16 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Applies the rate to an amount in minor units, rounding half away from zero.
    pub fn apply(&self, amount_minor: i64) -> i64 {
        let scaled = i128::from(amount_minor) * i128::from(self.0);
        let divisor = i128::from(Self::MAX_BASIS_POINTS);
        let rounded = if scaled >= 0 {
            (scaled + divisor / 2) / divisor
        } else {
            (scaled - divisor / 2) / divisor
        };
        rounded as i64
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for CommissionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}
