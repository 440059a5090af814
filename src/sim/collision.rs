//! Collision snapshots against the active tracks
//!
//! Once per tick the body records which tracks it overlaps and where it sits
//! on each of them. Overlap itself is decided by a host predicate, since it
//! depends on track shape and body bounds.

use super::mode::{ModeKind, MotionMode};
use super::state::KinematicState;
use super::track::{TrackCurve, TrackHandle, TrackId};
use super::traversal::{TraversalState, traverse};
use crate::consts::TRAVERSAL_SAMPLES;
use crate::error::Result;

/// Decides whether a body currently overlaps a track
pub trait CollisionPredicate {
    fn is_colliding(&self, track: &dyn TrackCurve, state: &KinematicState) -> bool;
}

impl<F> CollisionPredicate for F
where
    F: Fn(&dyn TrackCurve, &KinematicState) -> bool,
{
    fn is_colliding(&self, track: &dyn TrackCurve, state: &KinematicState) -> bool {
        self(track, state)
    }
}

/// Treats the body as a disc of half its height around the center of mass.
///
/// Overlap when the closest sampled curve point is within that radius plus
/// `margin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityPredicate {
    pub margin: f64,
    pub samples: usize,
}

impl Default for ProximityPredicate {
    fn default() -> Self {
        Self {
            margin: 0.0,
            samples: TRAVERSAL_SAMPLES,
        }
    }
}

impl ProximityPredicate {
    pub fn with_margin(margin: f64) -> Self {
        Self {
            margin,
            ..Self::default()
        }
    }
}

impl CollisionPredicate for ProximityPredicate {
    fn is_colliding(&self, track: &dyn TrackCurve, state: &KinematicState) -> bool {
        let length = track.length();
        if !(length.is_finite() && length > 0.0) {
            return false;
        }
        let center = state.center_of_mass();
        let s = track.dist_along_curve(center, 0.0, length, self.samples);
        let reach = state.height() / 2.0 + self.margin;
        track.evaluate(s).distance(center) <= reach
    }
}

/// The body at one instant plus every track it overlapped
#[derive(Debug, Clone)]
pub struct CollisionSnapshot {
    state: KinematicState,
    mode: MotionMode,
    /// In registry order, not sorted by distance
    traversals: Vec<TraversalState>,
}

impl CollisionSnapshot {
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    pub fn mode(&self) -> &MotionMode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn track_count(&self) -> usize {
        self.traversals.len()
    }

    pub fn track(&self, i: usize) -> Option<TrackId> {
        self.traversals.get(i).map(|t| t.track)
    }

    pub fn traversal_state(&self, i: usize) -> Option<&TraversalState> {
        self.traversals.get(i)
    }

    pub fn traversal_state_for(&self, id: TrackId) -> Option<&TraversalState> {
        self.traversals.iter().find(|t| t.track == id)
    }

    pub fn contains_track(&self, id: TrackId) -> bool {
        self.traversal_state_for(id).is_some()
    }

    pub fn traversals(&self) -> &[TraversalState] {
        &self.traversals
    }
}

/// Record the body against every track the predicate says it overlaps.
pub fn build_snapshot(
    state: &KinematicState,
    mode: &MotionMode,
    tracks: &[TrackHandle],
    predicate: &dyn CollisionPredicate,
    samples: usize,
) -> Result<CollisionSnapshot> {
    let center = state.center_of_mass();
    let mut traversals = Vec::new();
    for track in tracks {
        if predicate.is_colliding(track.as_ref(), state) {
            traversals.push(traverse(center, track.as_ref(), samples)?);
        }
    }
    Ok(CollisionSnapshot {
        state: state.clone(),
        mode: mode.clone(),
        traversals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::UniformGravity;
    use crate::sim::track::{ArcTrack, LineTrack};
    use glam::DVec2;
    use std::sync::Arc;

    fn body_at(x: f64, y: f64) -> KinematicState {
        let mut state = KinematicState::with_potential(Box::new(UniformGravity::earth()));
        state.set_attachment_point(DVec2::new(x, y));
        state
    }

    fn tracks() -> Vec<TrackHandle> {
        vec![
            Arc::new(LineTrack::new(1, DVec2::new(-5.0, 0.0), DVec2::new(5.0, 0.0))) as TrackHandle,
            Arc::new(LineTrack::new(2, DVec2::new(-5.0, 1.5), DVec2::new(5.0, 1.5))) as TrackHandle,
            Arc::new(LineTrack::new(3, DVec2::new(-5.0, 40.0), DVec2::new(5.0, 40.0))) as TrackHandle,
        ]
    }

    #[test]
    fn test_proximity_predicate() {
        let near = body_at(0.0, -0.5);
        let far = body_at(0.0, 20.0);
        let line = LineTrack::new(1, DVec2::new(-5.0, 0.0), DVec2::new(5.0, 0.0));
        let predicate = ProximityPredicate::default();
        assert!(predicate.is_colliding(&line, &near));
        assert!(!predicate.is_colliding(&line, &far));
        // Samples straddle x = 0, so the closest sampled point is slightly off-center
        assert!(ProximityPredicate::with_margin(21.0).is_colliding(&line, &far));
        assert!(!ProximityPredicate::with_margin(19.0).is_colliding(&line, &far));
    }

    #[test]
    fn test_snapshot_records_two_overlapping_tracks() {
        // Center of mass at y = 0.9: between the lines at 0 and 1.5
        let state = body_at(0.0, 0.0);
        let snapshot = build_snapshot(
            &state,
            &MotionMode::default(),
            &tracks(),
            &ProximityPredicate::with_margin(0.1),
            100,
        )
        .unwrap();

        assert_eq!(snapshot.track_count(), 2);
        assert_eq!(snapshot.track(0), Some(TrackId(1)));
        assert_eq!(snapshot.track(1), Some(TrackId(2)));
        assert!(snapshot.traversal_state_for(TrackId(1)).unwrap().is_top());
        assert!(!snapshot.traversal_state_for(TrackId(2)).unwrap().is_top());
        assert!(!snapshot.contains_track(TrackId(3)));
        assert_eq!(snapshot.mode_kind(), ModeKind::FreeFall);
    }

    #[test]
    fn test_snapshot_keeps_registry_order() {
        let state = body_at(0.0, 0.0);
        let mut reversed = tracks();
        reversed.reverse();
        let snapshot = build_snapshot(
            &state,
            &MotionMode::default(),
            &reversed,
            &ProximityPredicate::with_margin(0.1),
            100,
        )
        .unwrap();
        let ids: Vec<_> = snapshot.traversals().iter().map(|t| t.track).collect();
        assert_eq!(ids, vec![TrackId(2), TrackId(1)]);
    }

    #[test]
    fn test_closure_predicate_and_state_copy() {
        let mut state = body_at(0.0, 0.0);
        let everything = |_: &dyn TrackCurve, _: &KinematicState| true;
        let snapshot =
            build_snapshot(&state, &MotionMode::default(), &tracks(), &everything, 100).unwrap();
        assert_eq!(snapshot.track_count(), 3);

        state.translate(DVec2::new(3.0, 0.0));
        assert_eq!(snapshot.state().attachment_point(), DVec2::ZERO);
    }

    #[test]
    fn test_degenerate_track_propagates() {
        let state = body_at(0.0, 0.0);
        let tracks: Vec<TrackHandle> = vec![
            Arc::new(ArcTrack::bowl(1, DVec2::new(0.0, 5.0), 5.0)) as TrackHandle,
            Arc::new(LineTrack::new(2, DVec2::ZERO, DVec2::ZERO)) as TrackHandle,
        ];
        let all = |_: &dyn TrackCurve, _: &KinematicState| true;
        assert!(build_snapshot(&state, &MotionMode::default(), &tracks, &all, 100).is_err());
    }
}
