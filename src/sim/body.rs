//! The simulated body
//!
//! Owns the kinematic state, the active motion mode, the collision history
//! and the observer list. All mutation of one body goes through here and is
//! expected to be serialized by the caller.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::collision::CollisionSnapshot;
use super::history::HistoryBuffer;
use super::mode::{FreeFall, ModeKind, MotionMode, TrackDynamics, UserControlled};
use super::state::{GeometryChecks, KinematicState, PotentialEnergy};
use super::track::{TrackHandle, TrackId};
use crate::error::Result;
use crate::settings::EngineSettings;

/// Observer of body events consumed by the rendering layer
pub trait BodyListener {
    /// Fired only when the thrust vector actually changes
    fn thrust_changed(&mut self, _thrust: DVec2) {}

    /// Fired once per [`Body::notify_observers`] call
    fn repaint_requested(&mut self) {}
}

/// Handle returned by [`Body::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Track the body last fell off, and when (simulated seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastFall {
    pub track: TrackId,
    pub time: f64,
}

/// Plain-data view of a body, for logs and JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSample {
    pub tick: u64,
    pub time: f64,
    pub mode: ModeKind,
    pub user_controlled: bool,
    pub attachment: DVec2,
    pub center_of_mass: DVec2,
    pub velocity: DVec2,
    pub attachment_rotation: f64,
    pub cm_rotation: f64,
    pub facing_right: bool,
    pub kinetic: f64,
    pub potential: f64,
    pub thermal: f64,
    pub total: f64,
    pub track_contacts: usize,
}

/// Pre-step copy used for rollback
#[derive(Debug, Clone)]
pub(crate) struct Rollback {
    state: KinematicState,
    mode: MotionMode,
}

pub struct Body {
    pub(crate) state: KinematicState,
    pub(crate) mode: MotionMode,
    pub(crate) history: HistoryBuffer<CollisionSnapshot>,
    pub(crate) settings: EngineSettings,
    listeners: Vec<(ListenerId, Box<dyn BodyListener>)>,
    next_listener: u64,
    pub(crate) last_fall: Option<LastFall>,
    pub(crate) time: f64,
    pub(crate) time_ticks: u64,
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("history_len", &self.history.len())
            .field("listeners", &self.listeners.len())
            .field("last_fall", &self.last_fall)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

impl Body {
    /// Spawn a body in free fall
    pub fn new(state: KinematicState, settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        let body = Self::assemble(state, settings);
        body.state.check_angles();
        Ok(body)
    }

    /// Default-sized body with default settings
    pub fn with_potential(potential: Box<dyn PotentialEnergy>) -> Self {
        Self::assemble(
            KinematicState::with_potential(potential),
            EngineSettings::default(),
        )
    }

    fn assemble(mut state: KinematicState, settings: EngineSettings) -> Self {
        state.set_checks(GeometryChecks {
            debug_angles: settings.debug_angles,
            frame_tolerance: settings.frame_tolerance,
        });
        // A supplied state may still be in the track frame
        let mut mode = MotionMode::default();
        mode.init(&mut state);
        Self {
            state,
            mode,
            history: HistoryBuffer::new(settings.history_capacity),
            settings,
            listeners: Vec::new(),
            next_listener: 0,
            last_fall: None,
            time: 0.0,
            time_ticks: 0,
        }
    }

    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Direct manipulation (dragging, editing); energy changes here are user-driven
    pub fn state_mut(&mut self) -> &mut KinematicState {
        &mut self.state
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn mode(&self) -> &MotionMode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    /// Simulated seconds since spawn
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub(crate) fn rollback_point(&self) -> Rollback {
        Rollback {
            state: self.state.clone(),
            mode: self.mode.clone(),
        }
    }

    pub(crate) fn restore(&mut self, rollback: Rollback) {
        self.state = rollback.state;
        self.mode = rollback.mode;
    }

    // === Mode queries ===

    /// Held by the user, thrusting, or riding a track the user is manipulating
    pub fn is_user_controlled(&self) -> bool {
        matches!(self.mode, MotionMode::UserControlled(_))
            || self.state.has_thrust()
            || self.mode.track_is_user_controlled()
    }

    /// Falling and not user-controlled
    pub fn is_free_fall_mode(&self) -> bool {
        self.mode.kind() == ModeKind::FreeFall && !self.is_user_controlled()
    }

    /// Riding a track and not user-controlled
    pub fn is_track_mode(&self) -> bool {
        self.mode.kind() == ModeKind::TrackConstrained && !self.is_user_controlled()
    }

    pub fn current_track(&self) -> Option<&TrackHandle> {
        self.mode.current_track()
    }

    /// Riding any of `tracks`
    pub fn is_on_track(&self, tracks: &[TrackId]) -> bool {
        self.mode.track_id().is_some_and(|id| tracks.contains(&id))
    }

    // === Mode switching ===

    fn set_mode(&mut self, mode: MotionMode) {
        log::debug!("mode {:?} -> {:?}", self.mode.kind(), mode.kind());
        self.mode = mode;
        self.mode.init(&mut self.state);
    }

    pub fn set_user_controlled(&mut self, user_controlled: bool) {
        if user_controlled {
            self.set_mode(MotionMode::UserControlled(UserControlled));
        } else {
            self.state.set_angular_velocity(0.0);
            self.set_mode(MotionMode::FreeFall(FreeFall));
        }
    }

    pub fn set_free_fall_mode(&mut self) {
        self.set_mode(MotionMode::FreeFall(FreeFall));
    }

    /// Attach to `track`; a no-op when already riding the same track.
    ///
    /// The stored-energy baseline is re-committed only when the track changes.
    pub fn set_track_mode(&mut self, track: TrackHandle, dynamics: Box<dyn TrackDynamics>) {
        if self.mode.track_id() == Some(track.id()) {
            return;
        }
        self.state.store_total_energy();
        self.set_mode(MotionMode::track(track, dynamics));
    }

    /// Hand over to another track while staying track-constrained
    pub fn stay_on_new_track(&mut self, track: TrackHandle) {
        if let MotionMode::TrackConstrained(mode) = &mut self.mode {
            mode.set_track(track);
        }
    }

    /// The host removed a track from its registry
    pub fn track_removed(&mut self, id: TrackId) {
        if self.mode.track_id() == Some(id) {
            self.set_free_fall_mode();
        }
    }

    pub fn set_free_fall_rotational_velocity(&mut self, omega: f64) {
        self.state.set_angular_velocity(omega);
    }

    pub fn reset_mode(&mut self) {
        self.state.set_angular_velocity(0.0);
    }

    pub fn last_fall(&self) -> Option<LastFall> {
        self.last_fall
    }

    pub fn set_last_fall(&mut self, track: TrackId, time: f64) {
        self.last_fall = Some(LastFall { track, time });
    }

    // === Control ===

    pub fn set_thrust(&mut self, thrust: DVec2) {
        if self.state.set_thrust(thrust) {
            for (_, listener) in &mut self.listeners {
                listener.thrust_changed(thrust);
            }
        }
    }

    /// |total energy - committed baseline|
    pub fn stored_energy_drift(&self) -> f64 {
        (self.state.total_energy() - self.state.stored_total_energy()).abs()
    }

    // === Observers ===

    pub fn subscribe(&mut self, listener: Box<dyn BodyListener>) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn notify_observers(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener.repaint_requested();
        }
    }

    // === History ===

    pub fn history(&self) -> &HistoryBuffer<CollisionSnapshot> {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_collision_history(&mut self) {
        self.history.clear();
    }

    /// Snapshot recorded by the latest tick
    pub fn collision_state(&self) -> Option<&CollisionSnapshot> {
        self.history.most_recent()
    }

    /// Snapshot `i` ticks before the latest
    pub fn collision_state_from_end(&self, i: usize) -> Option<&CollisionSnapshot> {
        self.history.from_end(i)
    }

    pub fn sample(&self) -> StateSample {
        let state = &self.state;
        StateSample {
            tick: self.time_ticks,
            time: self.time,
            mode: self.mode.kind(),
            user_controlled: self.is_user_controlled(),
            attachment: state.attachment_point(),
            center_of_mass: state.center_of_mass(),
            velocity: state.velocity(),
            attachment_rotation: state.attachment_rotation(),
            cm_rotation: state.cm_rotation(),
            facing_right: state.is_facing_right(),
            kinetic: state.kinetic_energy(),
            potential: state.potential_energy(),
            thermal: state.thermal_energy(),
            total: state.total_energy(),
            track_contacts: self.collision_state().map_or(0, |s| s.track_count()),
        }
    }
}
