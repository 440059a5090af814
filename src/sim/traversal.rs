//! Track traversal query
//!
//! Locates the body's closest point on a track and which side of the track
//! the body is on. Pure: neither the body nor the track is touched.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::track::{TrackCurve, TrackId};
use crate::error::{DynamicsError, Result};

/// Where a body sits relative to one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraversalState {
    /// Center of mass is on the normal side of the curve
    pub top: bool,
    /// Arc length of the closest point
    pub arc_length: f64,
    /// Closest point on the curve
    pub closest_point: DVec2,
    pub track: TrackId,
}

impl TraversalState {
    pub fn is_top(&self) -> bool {
        self.top
    }
}

/// Run the traversal query for a center of mass against one track.
///
/// The closest parameter comes from the curve's coarse search over its full
/// length with `samples` samples. `top` holds when the offset from the curve
/// point to the center of mass has a non-negative projection on the normal.
pub fn traverse(
    center_of_mass: DVec2,
    track: &dyn TrackCurve,
    samples: usize,
) -> Result<TraversalState> {
    let length = track.length();
    if !(length.is_finite() && length > 0.0) {
        return Err(DynamicsError::DegenerateTrack {
            id: track.id(),
            length,
        });
    }

    let arc_length = track.dist_along_curve(center_of_mass, 0.0, length, samples);
    let closest_point = track.evaluate(arc_length);
    let offset = center_of_mass - closest_point;
    let top = track.unit_normal(arc_length).dot(offset) >= 0.0;

    Ok(TraversalState {
        top,
        arc_length,
        closest_point,
        track: track.id(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::track::{ArcTrack, LineTrack};
    use proptest::prelude::*;

    #[test]
    fn test_above_and_below_a_line() {
        let line = LineTrack::new(1, DVec2::new(-5.0, 0.0), DVec2::new(5.0, 0.0));
        let above = traverse(DVec2::new(1.0, 0.9), &line, 100).unwrap();
        assert!(above.is_top());
        assert_eq!(above.track, TrackId(1));
        assert!(above.closest_point.y.abs() < 1e-12);
        assert!((above.closest_point.x - 1.0).abs() < 0.06);

        let below = traverse(DVec2::new(1.0, -0.9), &line, 100).unwrap();
        assert!(!below.is_top());
    }

    #[test]
    fn test_on_the_curve_counts_as_top() {
        let line = LineTrack::new(1, DVec2::new(0.0, 0.0), DVec2::new(9.9, 0.0));
        let state = traverse(DVec2::new(0.0, 0.0), &line, 100).unwrap();
        assert!(state.is_top());
        assert_eq!(state.arc_length, 0.0);
    }

    #[test]
    fn test_inside_bowl_is_top() {
        let bowl = ArcTrack::bowl(4, DVec2::new(0.0, 10.0), 10.0);
        let inside = traverse(DVec2::new(0.0, 1.0), &bowl, 100).unwrap();
        assert!(inside.is_top());
        assert!((inside.arc_length - bowl.length() / 2.0).abs() < bowl.length() / 99.0);

        let outside = traverse(DVec2::new(0.0, -1.0), &bowl, 100).unwrap();
        assert!(!outside.is_top());
    }

    #[test]
    fn test_zero_length_track_is_an_error() {
        let point = LineTrack::new(9, DVec2::ONE, DVec2::ONE);
        let err = traverse(DVec2::ZERO, &point, 100).unwrap_err();
        assert!(matches!(err, DynamicsError::DegenerateTrack { id: TrackId(9), .. }));
    }

    proptest! {
        #[test]
        fn prop_traversal_is_deterministic(x in -20.0f64..20.0, y in -5.0f64..25.0) {
            let bowl = ArcTrack::bowl(4, DVec2::new(0.0, 10.0), 10.0);
            let p = DVec2::new(x, y);
            let a = traverse(p, &bowl, 100).unwrap();
            let b = traverse(p, &bowl, 100).unwrap();
            prop_assert_eq!(a.top, b.top);
            prop_assert_eq!(a.arc_length, b.arc_length);
            prop_assert_eq!(a, b);
        }
    }
}
