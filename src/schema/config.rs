//! Configuration types for the wind farm and its turbines.

use serde::{Deserialize, Serialize};

/// Number of turbines in every layout.
pub const TURBINE_COUNT: usize = 50;

fn default_diameter() -> f64 {
    100.0
}

fn default_min_separation() -> f64 {
    400.0
}

fn default_max_placement_attempts() -> usize {
    10_000
}

/// Top-level farm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Turbine model installed on every site.
    #[serde(default)]
    pub turbine: TurbineSpec,
    /// Farm perimeter and clearance.
    #[serde(default)]
    pub boundary: FarmBoundary,
    /// Minimum distance between two turbines enforced by the generators (m).
    #[serde(default = "default_min_separation")]
    pub min_separation: f64,
    /// Maximum samples drawn for a single turbine before giving up.
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: usize,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            turbine: TurbineSpec::default(),
            boundary: FarmBoundary::default(),
            min_separation: default_min_separation(),
            max_placement_attempts: default_max_placement_attempts(),
        }
    }
}

/// Turbine specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbineSpec {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Rotor diameter (m).
    #[serde(default = "default_diameter")]
    pub diameter: f64,
    /// Hub height (m). Informational only.
    #[serde(default)]
    pub hub_height: f64,
    /// Rated power (MW). Informational only.
    #[serde(default)]
    pub rated_power: f64,
}

impl TurbineSpec {
    /// Rotor radius (m).
    #[inline]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }
}

impl Default for TurbineSpec {
    fn default() -> Self {
        Self {
            name: "Anon Type".to_string(),
            diameter: default_diameter(),
            hub_height: 100.0,
            rated_power: 3.0,
        }
    }
}

/// Rectangular farm perimeter anchored at the origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FarmBoundary {
    /// Extent along x (m).
    pub width: f64,
    /// Extent along y (m).
    pub height: f64,
    /// Required distance between a turbine and the perimeter (m).
    pub clearance: f64,
}

impl Default for FarmBoundary {
    fn default() -> Self {
        Self {
            width: 4000.0,
            height: 4000.0,
            clearance: 50.0,
        }
    }
}

impl FarmBoundary {
    /// Open box in which generators place turbines: `(min, max)` per axis.
    #[inline]
    pub fn placement_box(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.clearance, self.width - self.clearance),
            (self.clearance, self.height - self.clearance),
        )
    }

    /// True if `(x, y)` lies strictly inside the placement box.
    #[inline]
    pub fn admits(&self, x: f64, y: f64) -> bool {
        let ((x_min, x_max), (y_min, y_max)) = self.placement_box();
        x > x_min && x < x_max && y > y_min && y < y_max
    }

    /// True if `(x, y)` lies strictly inside the perimeter.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > 0.0 && x < self.width && y > 0.0 && y < self.height
    }

    /// Distance from `(x, y)` to the nearest edge of the perimeter.
    pub fn distance_to_edge(&self, x: f64, y: f64) -> f64 {
        if self.contains(x, y) {
            return x.min(self.width - x).min(y).min(self.height - y);
        }
        // Outside: distance to the closest point of the rectangle outline.
        let dx = (0.0 - x).max(x - self.width).max(0.0);
        let dy = (0.0 - y).max(y - self.height).max(0.0);
        if dx == 0.0 && dy == 0.0 {
            // On the outline itself.
            0.0
        } else {
            (dx * dx + dy * dy).sqrt()
        }
    }
}

impl FarmConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.turbine.diameter > 0.0) {
            return Err(ConfigError::InvalidDiameter(self.turbine.diameter));
        }
        let b = &self.boundary;
        if !(b.width > 0.0 && b.height > 0.0 && b.clearance >= 0.0)
            || 2.0 * b.clearance >= b.width.min(b.height)
        {
            return Err(ConfigError::InvalidBoundary);
        }
        if !(self.min_separation >= 0.0) {
            return Err(ConfigError::InvalidSeparation(self.min_separation));
        }
        if self.max_placement_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("max_placement_attempts"));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Rotor diameter must be positive, got {0}")]
    InvalidDiameter(f64),
    #[error("Farm boundary must be positive and wider than twice the clearance")]
    InvalidBoundary,
    #[error("Minimum separation must be non-negative, got {0}")]
    InvalidSeparation(f64),
    #[error("Attempt cap `{0}` must be non-zero")]
    ZeroAttempts(&'static str),
    #[error("Population size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("Tournament size {tournament} must be between 1 and the population size {population}")]
    InvalidTournament { tournament: usize, population: usize },
    #[error("Offspring fraction must lie in [0, 1), got {0}")]
    InvalidOffspringFraction(f64),
    #[error("Retained count {retained} exceeds population size {population}")]
    InvalidRetained { retained: usize, population: usize },
    #[error("Bounds ({0}, {1}) must satisfy low < high")]
    InvalidBounds(f64, f64),
    #[error("Mutation step must be positive, got {0}")]
    InvalidMutationStep(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FarmConfig::default().validate().is_ok());
    }

    #[test]
    fn test_placement_box() {
        let boundary = FarmBoundary::default();
        assert!(boundary.admits(2000.0, 2000.0));
        assert!(!boundary.admits(50.0, 2000.0));
        assert!(!boundary.admits(2000.0, 3950.0));
        assert!(boundary.admits(50.001, 3949.999));
    }

    #[test]
    fn test_distance_to_edge() {
        let boundary = FarmBoundary::default();
        assert!((boundary.distance_to_edge(100.0, 2000.0) - 100.0).abs() < 1e-9);
        assert!((boundary.distance_to_edge(2000.0, 3990.0) - 10.0).abs() < 1e-9);
        assert!((boundary.distance_to_edge(-3.0, -4.0) - 5.0).abs() < 1e-9);
        assert_eq!(boundary.distance_to_edge(0.0, 1000.0), 0.0);
    }

    #[test]
    fn test_invalid_boundary() {
        let config = FarmConfig {
            boundary: FarmBoundary {
                width: 80.0,
                height: 4000.0,
                clearance: 50.0,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBoundary)));
    }
}
