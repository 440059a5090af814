//! Conservation-checked simulation tick
//!
//! One call advances one body by `dt`: record a collision snapshot, let the
//! active mode advance the state, then compare total energy before and
//! after. A drift beyond tolerance on a body nobody is steering rolls the
//! state back and retries once; a second violation is logged and kept.

use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{CollisionPredicate, build_snapshot};
use super::mode::ModeKind;
use super::track::TrackHandle;
use crate::error::Result;
use crate::unit_at;

/// What a tick sees of the surrounding simulation
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    /// Active tracks in registry order
    pub tracks: &'a [TrackHandle],
    pub collision: &'a dyn CollisionPredicate,
}

impl<'a> Environment<'a> {
    pub fn new(tracks: &'a [TrackHandle], collision: &'a dyn CollisionPredicate) -> Self {
        Self { tracks, collision }
    }
}

/// How the energy check of a tick went
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Drift within tolerance on the first attempt
    Conserved { drift: f64 },
    /// User input was steering the body; drift is not checked
    UserDriven { drift: f64 },
    /// First attempt violated, the retry passed
    Recovered { first_drift: f64, drift: f64 },
    /// Retries exhausted; the last attempt was kept anyway
    Unresolved { first_drift: f64, drift: f64 },
}

impl StepOutcome {
    /// Drift of the attempt that was kept
    pub fn drift(&self) -> f64 {
        match *self {
            StepOutcome::Conserved { drift }
            | StepOutcome::UserDriven { drift }
            | StepOutcome::Recovered { drift, .. }
            | StepOutcome::Unresolved { drift, .. } => drift,
        }
    }

    pub fn retried(&self) -> bool {
        matches!(
            self,
            StepOutcome::Recovered { .. } | StepOutcome::Unresolved { .. }
        )
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, StepOutcome::Unresolved { .. })
    }

    /// Fold the outcome of a retry into the violation that caused it
    fn after_violation(self, first_drift: f64) -> Self {
        match self {
            StepOutcome::Conserved { drift } | StepOutcome::Recovered { drift, .. } => {
                StepOutcome::Recovered { first_drift, drift }
            }
            StepOutcome::Unresolved { drift, .. } => StepOutcome::Unresolved { first_drift, drift },
            user @ StepOutcome::UserDriven { .. } => user,
        }
    }
}

impl Body {
    /// Advance the body by one fixed timestep.
    ///
    /// Errors only come from collaborators (a degenerate track); a
    /// conservation violation never aborts the tick.
    pub fn step(&mut self, env: &Environment<'_>, dt: f64) -> Result<StepOutcome> {
        let outcome = self.step_checked(env, dt, self.settings.max_retries)?;

        self.time += dt;
        self.time_ticks += 1;

        if self.mode.has_departed() {
            if let Some(id) = self.mode.track_id() {
                log::debug!("left track {id} at t={:.3}", self.time);
                self.set_last_fall(id, self.time);
            }
            self.set_free_fall_mode();
        }

        Ok(outcome)
    }

    fn step_checked(
        &mut self,
        env: &Environment<'_>,
        dt: f64,
        retries_left: u8,
    ) -> Result<StepOutcome> {
        let rollback = self.rollback_point();
        self.record_collision_state(env)?;

        // User actions may change energy arbitrarily; keep the baseline with them
        if self.is_user_controlled() {
            self.state.store_total_energy();
        }

        let e_initial = self.state.total_energy();
        self.mode.advance(&mut self.state, dt);
        let e_final = self.state.total_energy();
        let drift = (e_final - e_initial).abs();

        let outcome = if self.is_user_controlled() {
            StepOutcome::UserDriven { drift }
        } else if drift > self.settings.energy_tolerance {
            log::warn!(
                "energy drift {drift:e} J in {:?} mode (tick {})",
                self.mode.kind(),
                self.time_ticks
            );
            if retries_left > 0 {
                self.restore(rollback);
                self.step_checked(env, dt, retries_left - 1)?
                    .after_violation(drift)
            } else {
                log::warn!("energy drift persisted after retry; keeping result");
                StepOutcome::Unresolved {
                    first_drift: drift,
                    drift,
                }
            }
        } else {
            StepOutcome::Conserved { drift }
        };

        self.update_facing();
        Ok(outcome)
    }

    /// Record where the body sits against every active track
    pub fn record_collision_state(&mut self, env: &Environment<'_>) -> Result<()> {
        let snapshot = build_snapshot(
            &self.state,
            &self.mode,
            env.tracks,
            env.collision,
            self.settings.traversal_samples,
        )?;
        log::trace!("collision snapshot: {} tracks", snapshot.track_count());
        self.history.push(snapshot);
        Ok(())
    }

    fn update_facing(&mut self) {
        if self.state.speed() <= self.settings.facing_speed_threshold {
            return;
        }
        if self.mode.kind() == ModeKind::FreeFall || self.is_user_controlled() {
            return;
        }
        let tangent = unit_at(self.state.attachment_rotation());
        self.state.facing_right = self.state.velocity().dot(tangent) > 0.0;
    }
}
