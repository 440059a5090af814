//! Kinematic state of the simulated body
//!
//! Everything the stepper must be able to roll back lives here. The state is
//! a plain value: `clone()` yields a fully independent copy, including the
//! boxed potential-energy provider.

use std::fmt;

use glam::DVec2;

use crate::consts::*;
use crate::error::{DynamicsError, Result};
use crate::wrap_angle;

/// Potential-energy model plugged into a body
///
/// Supplies the potential energy of a state and the local gravity used by
/// free fall. Gravity is signed along +y, so a downward pull is negative.
pub trait PotentialEnergy: fmt::Debug + Send + Sync {
    fn potential_energy(&self, state: &KinematicState) -> f64;

    fn gravity(&self) -> f64;

    /// Independent copy for rollback snapshots
    fn box_clone(&self) -> Box<dyn PotentialEnergy>;
}

impl Clone for Box<dyn PotentialEnergy> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Uniform field: `PE = -m * g * (y_cm - reference_height)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformGravity {
    pub gravity: f64,
    pub reference_height: f64,
}

impl UniformGravity {
    pub fn new(gravity: f64, reference_height: f64) -> Self {
        Self {
            gravity,
            reference_height,
        }
    }

    pub fn earth() -> Self {
        Self::new(EARTH_GRAVITY, 0.0)
    }
}

impl Default for UniformGravity {
    fn default() -> Self {
        Self::earth()
    }
}

impl PotentialEnergy for UniformGravity {
    fn potential_energy(&self, state: &KinematicState) -> f64 {
        -state.mass() * self.gravity * (state.center_of_mass().y - self.reference_height)
    }

    fn gravity(&self) -> f64 {
        self.gravity
    }

    fn box_clone(&self) -> Box<dyn PotentialEnergy> {
        Box::new(*self)
    }
}

/// Which rotation currently carries the body's orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frame {
    /// Rotation about the center of mass (airborne)
    #[default]
    FreeFall,
    /// Rotation about the attachment point (riding a track)
    Track,
}

/// Development checks applied on every rotation change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryChecks {
    /// Panic if both rotations are non-zero at once
    pub debug_angles: bool,
    /// Largest center-of-mass shift a frame conversion may cause before logging
    pub frame_tolerance: f64,
}

impl Default for GeometryChecks {
    fn default() -> Self {
        Self {
            debug_angles: false,
            frame_tolerance: FRAME_TOLERANCE,
        }
    }
}

/// The dynamic body at one instant
#[derive(Debug, Clone)]
pub struct KinematicState {
    /// Attachment point ("feet"), the body's reference position
    pub(crate) attachment: DVec2,
    pub(crate) velocity: DVec2,
    pub(crate) acceleration: DVec2,
    mass: f64,
    /// Rotation about the attachment point (track frame)
    pub(crate) attachment_rotation: f64,
    /// Rotation about the center of mass (free-fall frame)
    pub(crate) cm_rotation: f64,
    /// Free-fall spin (rad/s)
    pub(crate) angular_velocity: f64,
    thermal_energy: f64,
    thrust: DVec2,
    friction_coefficient: f64,
    restitution: f64,
    pub(crate) facing_right: bool,
    width: f64,
    height: f64,
    stored_total_energy: f64,
    pub(crate) frame: Frame,
    pub(crate) checks: GeometryChecks,
    potential: Box<dyn PotentialEnergy>,
}

impl KinematicState {
    /// Body at rest with its attachment point at the origin
    pub fn new(
        width: f64,
        height: f64,
        mass: f64,
        potential: Box<dyn PotentialEnergy>,
    ) -> Result<Self> {
        check_mass(mass)?;
        Ok(Self::build(width, height, mass, potential))
    }

    /// Default-sized 75 kg body
    pub fn with_potential(potential: Box<dyn PotentialEnergy>) -> Self {
        Self::build(DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_MASS, potential)
    }

    fn build(width: f64, height: f64, mass: f64, potential: Box<dyn PotentialEnergy>) -> Self {
        let mut state = Self {
            attachment: DVec2::ZERO,
            velocity: DVec2::ZERO,
            acceleration: DVec2::ZERO,
            mass,
            attachment_rotation: 0.0,
            cm_rotation: 0.0,
            angular_velocity: 0.0,
            thermal_energy: 0.0,
            thrust: DVec2::ZERO,
            friction_coefficient: 0.0,
            restitution: 1.0,
            facing_right: false,
            width,
            height,
            stored_total_energy: 0.0,
            frame: Frame::FreeFall,
            checks: GeometryChecks::default(),
            potential,
        };
        state.stored_total_energy = state.total_energy();
        state
    }

    // === Kinematics ===

    pub fn attachment_point(&self) -> DVec2 {
        self.attachment
    }

    pub fn set_attachment_point(&mut self, point: DVec2) {
        self.attachment = point;
    }

    pub fn translate(&mut self, delta: DVec2) {
        self.attachment += delta;
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: DVec2) {
        self.velocity = velocity;
    }

    pub fn acceleration(&self) -> DVec2 {
        self.acceleration
    }

    pub fn set_acceleration(&mut self, acceleration: DVec2) {
        self.acceleration = acceleration;
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        check_mass(mass)?;
        self.mass = mass;
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    // === Rotation ===

    pub fn attachment_rotation(&self) -> f64 {
        self.attachment_rotation
    }

    pub fn set_attachment_rotation(&mut self, angle: f64) {
        self.attachment_rotation = angle;
        self.check_angles();
    }

    /// Rotate about the attachment point, keeping the angle in [0, 2π]
    pub fn rotate_about_attachment_point(&mut self, delta: f64) {
        self.attachment_rotation = wrap_angle(self.attachment_rotation + delta);
        self.check_angles();
    }

    pub fn cm_rotation(&self) -> f64 {
        self.cm_rotation
    }

    pub fn set_cm_rotation(&mut self, angle: f64) {
        self.cm_rotation = angle;
        self.check_angles();
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, omega: f64) {
        self.angular_velocity = omega;
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn is_free_fall_frame(&self) -> bool {
        self.frame == Frame::FreeFall
    }

    /// Fatal in development builds that opt in; a body is never in both frames
    pub(crate) fn check_angles(&self) {
        if self.checks.debug_angles && self.cm_rotation != 0.0 && self.attachment_rotation != 0.0 {
            panic!(
                "rotation angles inconsistent: attachment={}, cm={}",
                self.attachment_rotation, self.cm_rotation
            );
        }
    }

    pub fn checks(&self) -> GeometryChecks {
        self.checks
    }

    pub fn set_checks(&mut self, checks: GeometryChecks) {
        self.checks = checks;
    }

    // === Control ===

    pub fn thrust(&self) -> DVec2 {
        self.thrust
    }

    /// Returns true if the thrust actually changed
    pub fn set_thrust(&mut self, thrust: DVec2) -> bool {
        if self.thrust == thrust {
            return false;
        }
        self.thrust = thrust;
        true
    }

    pub fn has_thrust(&self) -> bool {
        self.thrust.length() > 0.0
    }

    pub fn is_facing_right(&self) -> bool {
        self.facing_right
    }

    pub fn friction_coefficient(&self) -> f64 {
        self.friction_coefficient
    }

    pub fn set_friction_coefficient(&mut self, value: f64) {
        self.friction_coefficient = value;
    }

    pub fn coefficient_of_restitution(&self) -> f64 {
        self.restitution
    }

    pub fn set_coefficient_of_restitution(&mut self, value: f64) {
        self.restitution = value;
    }

    // === Energy ===

    pub fn potential(&self) -> &dyn PotentialEnergy {
        self.potential.as_ref()
    }

    pub fn set_potential(&mut self, potential: Box<dyn PotentialEnergy>) {
        self.potential = potential;
    }

    pub fn gravity(&self) -> f64 {
        self.potential.gravity()
    }

    /// Weight vector `(0, m * g)`
    pub fn gravity_force(&self) -> DVec2 {
        DVec2::new(0.0, self.gravity() * self.mass)
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn potential_energy(&self) -> f64 {
        self.potential.potential_energy(self)
    }

    pub fn mechanical_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }

    pub fn thermal_energy(&self) -> f64 {
        self.thermal_energy
    }

    pub fn total_energy(&self) -> f64 {
        self.mechanical_energy() + self.thermal_energy
    }

    /// Friction converts kinetic energy to heat; heat never decreases here
    pub fn add_thermal_energy(&mut self, delta: f64) {
        if !(delta >= 0.0) {
            log::debug!("ignoring negative heat {delta} J");
            return;
        }
        self.thermal_energy += delta;
    }

    pub fn set_thermal_energy(&mut self, value: f64) {
        if !(value >= 0.0) {
            log::debug!("negative thermal energy {value} J clamped to 0");
            self.thermal_energy = 0.0;
            return;
        }
        self.thermal_energy = value;
    }

    pub fn clear_heat(&mut self) {
        self.thermal_energy = 0.0;
    }

    pub fn stored_total_energy(&self) -> f64 {
        self.stored_total_energy
    }

    /// Re-baseline the committed energy to the current total
    pub fn store_total_energy(&mut self) {
        self.stored_total_energy = self.total_energy();
    }

    pub fn energy_difference_abs(&self, other: &KinematicState) -> f64 {
        (other.total_energy() - self.total_energy()).abs()
    }
}

fn check_mass(mass: f64) -> Result<()> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(DynamicsError::InvalidMass(mass))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth_state() -> KinematicState {
        KinematicState::with_potential(Box::new(UniformGravity::earth()))
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let pe = Box::new(UniformGravity::earth());
        assert!(matches!(
            KinematicState::new(1.0, 1.0, 0.0, pe.clone()),
            Err(DynamicsError::InvalidMass(_))
        ));
        let mut state = earth_state();
        assert!(state.set_mass(f64::NAN).is_err());
        assert!(state.set_mass(-2.0).is_err());
        assert_eq!(state.mass(), DEFAULT_MASS);
    }

    #[test]
    fn test_energy_bookkeeping() {
        let mut state = earth_state();
        // Center of mass sits half a body above the feet
        let pe0 = state.potential_energy();
        assert!((pe0 - DEFAULT_MASS * 9.8 * DEFAULT_HEIGHT / 2.0).abs() < 1e-9);

        state.set_velocity(DVec2::new(3.0, 4.0));
        assert!((state.kinetic_energy() - 0.5 * DEFAULT_MASS * 25.0).abs() < 1e-9);

        state.add_thermal_energy(10.0);
        state.add_thermal_energy(-5.0);
        assert_eq!(state.thermal_energy(), 10.0);
        assert!((state.total_energy() - (state.mechanical_energy() + 10.0)).abs() < 1e-9);

        state.clear_heat();
        assert_eq!(state.thermal_energy(), 0.0);
    }

    #[test]
    fn test_negative_heat_is_rejected() {
        let mut state = earth_state();
        state.set_thermal_energy(4.0);
        state.add_thermal_energy(-1.0);
        assert_eq!(state.thermal_energy(), 4.0);
        state.set_thermal_energy(-3.0);
        assert_eq!(state.thermal_energy(), 0.0);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut state = earth_state();
        state.set_velocity(DVec2::new(1.0, 0.0));
        let copy = state.clone();
        state.set_velocity(DVec2::new(5.0, 0.0));
        state.translate(DVec2::new(0.0, 3.0));
        assert_eq!(copy.velocity(), DVec2::new(1.0, 0.0));
        assert_eq!(copy.attachment_point(), DVec2::ZERO);
        assert!(copy.energy_difference_abs(&state) > 0.0);
    }

    #[test]
    fn test_thrust_change_detection() {
        let mut state = earth_state();
        assert!(!state.set_thrust(DVec2::ZERO));
        assert!(state.set_thrust(DVec2::new(5.0, 0.0)));
        assert!(!state.set_thrust(DVec2::new(5.0, 0.0)));
        assert!(state.has_thrust());
    }

    #[test]
    fn test_rotation_wraps() {
        let mut state = earth_state();
        state.rotate_about_attachment_point(-0.5);
        assert!((state.attachment_rotation() - (std::f64::consts::TAU - 0.5)).abs() < 1e-12);

        // Huge spins still land in range instead of looping forever
        state.rotate_about_attachment_point(1e17);
        assert!((0.0..std::f64::consts::TAU).contains(&state.attachment_rotation()));
    }

    #[test]
    #[should_panic(expected = "rotation angles inconsistent")]
    fn test_debug_angles_is_fatal() {
        let mut state = earth_state();
        state.set_checks(GeometryChecks {
            debug_angles: true,
            ..GeometryChecks::default()
        });
        state.set_attachment_rotation(0.3);
        state.set_cm_rotation(0.2);
    }
}
