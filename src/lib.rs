//! Skate Dynamics - energy-conserving 2D body dynamics
//!
//! Core modules:
//! - `sim`: Deterministic single-body simulation (state, motion modes, track queries, stepper)
//! - `settings`: Engine tuning (tolerances, history size, retry budget)
//! - `error`: Crate error type

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{DynamicsError, Result};
pub use settings::EngineSettings;

use glam::DVec2;

/// Engine configuration constants
pub mod consts {
    /// Default body mass (kg)
    pub const DEFAULT_MASS: f64 = 75.0;
    /// Default body extent (m)
    pub const DEFAULT_WIDTH: f64 = 1.3;
    pub const DEFAULT_HEIGHT: f64 = 1.8;

    /// Earth gravity along +y (y points up, so it is negative)
    pub const EARTH_GRAVITY: f64 = -9.8;

    /// Number of collision snapshots retained per body
    pub const HISTORY_CAPACITY: usize = 100;
    /// Coarse samples used to locate the closest point on a track
    pub const TRAVERSAL_SAMPLES: usize = 100;

    /// Largest per-tick change in total energy accepted without a retry (J)
    pub const ENERGY_TOLERANCE: f64 = 1e-6;
    /// Largest center-of-mass displacement accepted by a frame conversion (m)
    pub const FRAME_TOLERANCE: f64 = 1e-6;
    /// Below this speed the facing flag is left alone (m/s)
    pub const FACING_SPEED_THRESHOLD: f64 = 0.01;
    /// Rollback-and-retry attempts after a conservation violation
    pub const MAX_RETRIES: u8 = 1;

    /// Fraction of the body height counted as "feet"
    pub const FEET_FRACTION: f64 = 0.6;
}

/// Wrap an angle into [0, 2π)
///
/// Non-finite input has no meaningful orientation and maps to 0.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        log::warn!("non-finite angle {angle} wrapped to 0");
        return 0.0;
    }
    angle.rem_euclid(std::f64::consts::TAU)
}

/// Unit vector pointing along `angle`
#[inline]
pub fn unit_at(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Left-hand perpendicular (counter-clockwise quarter turn)
#[inline]
pub fn left_normal(v: DVec2) -> DVec2 {
    DVec2::new(-v.y, v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn test_wrap_angle() {
        assert!((wrap_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((wrap_angle(3.0 * TAU + 1.0) - 1.0).abs() < 1e-9);
        assert_eq!(wrap_angle(0.25), 0.25);
    }

    #[test]
    fn test_wrap_angle_huge_and_non_finite() {
        let wrapped = wrap_angle(1e17);
        assert!((0.0..TAU).contains(&wrapped));
        assert!((0.0..=TAU).contains(&wrap_angle(-1e300)));
        assert_eq!(wrap_angle(f64::INFINITY), 0.0);
        assert_eq!(wrap_angle(f64::NAN), 0.0);
    }
}
