//! Motion modes
//!
//! Exactly one mode drives the body at a time. Mode switches are decided by
//! the surrounding simulation (user grabs the body, body lands on a track,
//! body leaves every track); a mode only advances the state it is given.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::state::KinematicState;
use super::track::{TrackCurve, TrackHandle, TrackId};

/// Host-supplied behavior for riding a track
///
/// Force, friction and departure rules along a track belong to the host.
/// The engine only calls these hooks and copies the value for rollback.
pub trait TrackDynamics: fmt::Debug + Send + Sync {
    /// Called once when the body attaches to `track`
    fn init(&mut self, _state: &mut KinematicState, _track: &dyn TrackCurve) {}

    /// Advance the body along `track` by `dt`
    fn advance(&mut self, state: &mut KinematicState, track: &dyn TrackCurve, dt: f64);

    /// True once the body has left the track; the body falls back to free fall
    fn has_departed(&self) -> bool {
        false
    }

    fn box_clone(&self) -> Box<dyn TrackDynamics>;
}

impl Clone for Box<dyn TrackDynamics> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Apply a force held constant over `dt`.
///
/// `x += v·dt + ½·a·dt²`, `v += a·dt`. Exact for uniform fields, so a body
/// under gravity alone keeps its total energy to rounding error.
pub fn integrate_force(state: &mut KinematicState, force: DVec2, dt: f64) {
    let accel = force / state.mass();
    state.attachment += state.velocity * dt + accel * (0.5 * dt * dt);
    state.velocity += accel * dt;
    state.acceleration = accel;
}

/// Airborne: uniform gravity plus free spin about the center of mass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FreeFall;

impl FreeFall {
    pub fn init(&mut self, state: &mut KinematicState) {
        state.convert_to_free_fall();
    }

    pub fn advance(&mut self, state: &mut KinematicState, dt: f64) {
        let force = state.gravity_force();
        integrate_force(state, force, dt);
        if state.angular_velocity != 0.0 {
            let angle = state.cm_rotation + state.angular_velocity * dt;
            state.set_cm_rotation(angle);
        }
    }
}

/// Held by the user: position and velocity are written directly by input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserControlled;

impl UserControlled {
    pub fn init(&mut self, state: &mut KinematicState) {
        state.set_angular_velocity(0.0);
    }

    pub fn advance(&mut self, _state: &mut KinematicState, _dt: f64) {}
}

/// Riding a track, driven by host dynamics
#[derive(Debug, Clone)]
pub struct TrackConstrained {
    track: TrackHandle,
    dynamics: Box<dyn TrackDynamics>,
}

impl TrackConstrained {
    pub fn new(track: TrackHandle, dynamics: Box<dyn TrackDynamics>) -> Self {
        Self { track, dynamics }
    }

    pub fn track(&self) -> &TrackHandle {
        &self.track
    }

    /// Swap the track without re-initializing
    pub fn set_track(&mut self, track: TrackHandle) {
        self.track = track;
    }

    pub fn dynamics(&self) -> &dyn TrackDynamics {
        self.dynamics.as_ref()
    }

    pub fn init(&mut self, state: &mut KinematicState) {
        state.convert_to_track_frame();
        self.dynamics.init(state, self.track.as_ref());
    }

    pub fn advance(&mut self, state: &mut KinematicState, dt: f64) {
        self.dynamics.advance(state, self.track.as_ref(), dt);
    }
}

/// Variant tag, for queries and samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    FreeFall,
    UserControlled,
    TrackConstrained,
}

/// The active motion mode
#[derive(Debug, Clone)]
pub enum MotionMode {
    FreeFall(FreeFall),
    UserControlled(UserControlled),
    TrackConstrained(TrackConstrained),
}

impl Default for MotionMode {
    fn default() -> Self {
        MotionMode::FreeFall(FreeFall)
    }
}

impl MotionMode {
    pub fn track(track: TrackHandle, dynamics: Box<dyn TrackDynamics>) -> Self {
        MotionMode::TrackConstrained(TrackConstrained::new(track, dynamics))
    }

    /// Called exactly once when the mode becomes active
    pub fn init(&mut self, state: &mut KinematicState) {
        match self {
            MotionMode::FreeFall(m) => m.init(state),
            MotionMode::UserControlled(m) => m.init(state),
            MotionMode::TrackConstrained(m) => m.init(state),
        }
    }

    pub fn advance(&mut self, state: &mut KinematicState, dt: f64) {
        match self {
            MotionMode::FreeFall(m) => m.advance(state, dt),
            MotionMode::UserControlled(m) => m.advance(state, dt),
            MotionMode::TrackConstrained(m) => m.advance(state, dt),
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            MotionMode::FreeFall(_) => ModeKind::FreeFall,
            MotionMode::UserControlled(_) => ModeKind::UserControlled,
            MotionMode::TrackConstrained(_) => ModeKind::TrackConstrained,
        }
    }

    pub fn current_track(&self) -> Option<&TrackHandle> {
        match self {
            MotionMode::TrackConstrained(m) => Some(m.track()),
            _ => None,
        }
    }

    pub fn track_id(&self) -> Option<TrackId> {
        self.current_track().map(|t| t.id())
    }

    /// Host dynamics signalled that the body left its track
    pub fn has_departed(&self) -> bool {
        match self {
            MotionMode::TrackConstrained(m) => m.dynamics.has_departed(),
            _ => false,
        }
    }

    /// The track reports it is being manipulated by the user
    pub fn track_is_user_controlled(&self) -> bool {
        self.current_track().is_some_and(|t| t.is_user_controlled())
    }
}
