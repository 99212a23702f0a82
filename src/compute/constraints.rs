//! Perimeter and proximity checks for a finished layout.
//!
//! The checker only reports which constraint is violated somewhere, not by
//! how much. The search does not call it; generators enforce bounds and
//! separation directly.

use std::fmt;

use crate::schema::{FarmBoundary, TurbineLayout};

/// Minimum turbine spacing in rotor diameters.
pub const PROXIMITY_DIAMETERS: f64 = 4.0;

/// Outcome of [`validate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintReport {
    /// Some turbine is outside the farm or closer than the clearance to its edge.
    pub perimeter_violated: bool,
    /// Some pair of turbines is closer than four rotor diameters.
    pub proximity_violated: bool,
}

impl ConstraintReport {
    /// True when neither constraint is violated.
    pub fn is_satisfied(&self) -> bool {
        !self.perimeter_violated && !self.proximity_violated
    }
}

impl fmt::Display for ConstraintReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.perimeter_violated, self.proximity_violated) {
            (true, true) => write!(
                f,
                "Somewhere both perimeter constraint and proximity constraint are violated"
            ),
            (true, false) => write!(f, "Somewhere perimeter constraint is violated"),
            (false, true) => write!(f, "Somewhere proximity constraint is violated"),
            (false, false) => write!(f, "Both perimeter and proximity constraints are satisfied"),
        }
    }
}

/// Check the perimeter and proximity constraints of `layout`.
pub fn validate(layout: &TurbineLayout, boundary: &FarmBoundary, turbine_diameter: f64) -> ConstraintReport {
    let perimeter_violated = layout
        .positions()
        .iter()
        .any(|&[x, y]| !boundary.contains(x, y) || boundary.distance_to_edge(x, y) < boundary.clearance);

    let min_distance = PROXIMITY_DIAMETERS * turbine_diameter;
    let proximity_violated = layout.min_spacing().is_some_and(|d| d < min_distance);

    ConstraintReport {
        perimeter_violated,
        proximity_violated,
    }
}
