//! Track curves the body can ride along
//!
//! A track is a parametric curve addressed by arc length. The engine only
//! needs the [`TrackCurve`] contract; `LineTrack` and `ArcTrack` are simple
//! reference shapes for hosts, tests and the demo.

use std::fmt;
use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{left_normal, unit_at};

/// Stable identity of a track, usable as a map/set key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared, read-only handle to a track owned by the host's registry
pub type TrackHandle = Arc<dyn TrackCurve>;

/// A curve parameterized by arc length.
///
/// Implementations must be pure: none of these calls may change what a later
/// call returns, except `is_user_controlled` which reflects host input.
pub trait TrackCurve: fmt::Debug + Send + Sync {
    fn id(&self) -> TrackId;

    /// Total arc length
    fn length(&self) -> f64;

    /// Point at arc length `s`
    fn evaluate(&self, s: f64) -> DVec2;

    /// Unit normal at arc length `s`; the side it points to is "top"
    fn unit_normal(&self, s: f64) -> DVec2;

    /// Coarse closest-point search over `[lo, hi]`.
    ///
    /// Samples `samples` evenly spaced parameters (at least two) and returns
    /// the one whose point lies nearest `point`. Ties keep the earliest sample.
    fn dist_along_curve(&self, point: DVec2, lo: f64, hi: f64, samples: usize) -> f64 {
        let samples = samples.max(2);
        let step = (hi - lo) / (samples - 1) as f64;
        let mut best = lo;
        let mut best_dist = f64::INFINITY;
        for i in 0..samples {
            let s = lo + step * i as f64;
            let dist = self.evaluate(s).distance_squared(point);
            if dist < best_dist {
                best_dist = dist;
                best = s;
            }
        }
        best
    }

    /// Whether the user is currently dragging or reshaping this track
    fn is_user_controlled(&self) -> bool {
        false
    }
}

/// Clamp an arc length into `[0, length]`; a negative or NaN length gives 0
#[inline]
fn clamp_to_length(s: f64, length: f64) -> f64 {
    s.min(length).max(0.0)
}

/// Straight track segment from `start` to `end`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineTrack {
    pub id: TrackId,
    pub start: DVec2,
    pub end: DVec2,
    /// Host-driven manipulation flag
    #[serde(default)]
    pub user_controlled: bool,
}

impl LineTrack {
    pub fn new(id: u32, start: DVec2, end: DVec2) -> Self {
        Self {
            id: TrackId(id),
            start,
            end,
            user_controlled: false,
        }
    }

    /// Unit direction from start to end
    #[inline]
    pub fn direction(&self) -> DVec2 {
        (self.end - self.start).normalize_or_zero()
    }
}

impl TrackCurve for LineTrack {
    fn id(&self) -> TrackId {
        self.id
    }

    fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    fn evaluate(&self, s: f64) -> DVec2 {
        self.start + self.direction() * clamp_to_length(s, self.length())
    }

    fn unit_normal(&self, _s: f64) -> DVec2 {
        left_normal(self.direction())
    }

    fn is_user_controlled(&self) -> bool {
        self.user_controlled
    }
}

/// Circular arc traversed counter-clockwise from `theta_start`
///
/// The normal points toward the circle's center, so a bowl (an arc through
/// the bottom of the circle) has its "top" side inside the bowl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcTrack {
    pub id: TrackId,
    pub center: DVec2,
    pub radius: f64,
    /// Start angle (radians)
    pub theta_start: f64,
    /// Counter-clockwise angular extent (radians, > 0)
    pub span: f64,
    #[serde(default)]
    pub user_controlled: bool,
}

impl ArcTrack {
    /// Arc from `theta_start` counter-clockwise to `theta_end` (handles wraparound)
    pub fn new(id: u32, center: DVec2, radius: f64, theta_start: f64, theta_end: f64) -> Self {
        let mut span = theta_end - theta_start;
        if span <= 0.0 {
            span += std::f64::consts::TAU;
        }
        Self {
            id: TrackId(id),
            center,
            radius,
            theta_start,
            span,
            user_controlled: false,
        }
    }

    /// Half-pipe: the lower half of a circle, from the left rim to the right rim
    pub fn bowl(id: u32, center: DVec2, radius: f64) -> Self {
        use std::f64::consts::PI;
        Self::new(id, center, radius, PI, 2.0 * PI)
    }

    /// Angle at arc length `s`
    #[inline]
    pub fn angle_at(&self, s: f64) -> f64 {
        self.theta_start + clamp_to_length(s, self.length()) / self.radius
    }
}

impl TrackCurve for ArcTrack {
    fn id(&self) -> TrackId {
        self.id
    }

    fn length(&self) -> f64 {
        self.radius * self.span
    }

    fn evaluate(&self, s: f64) -> DVec2 {
        self.center + unit_at(self.angle_at(s)) * self.radius
    }

    fn unit_normal(&self, s: f64) -> DVec2 {
        -unit_at(self.angle_at(s))
    }

    fn is_user_controlled(&self) -> bool {
        self.user_controlled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_line_geometry() {
        let line = LineTrack::new(1, DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0));
        assert!((line.length() - 10.0).abs() < 1e-12);
        assert!(line.evaluate(4.0).distance(DVec2::new(4.0, 0.0)) < 1e-12);
        // Left of a left-to-right line is up
        assert!(line.unit_normal(2.0).distance(DVec2::Y) < 1e-12);
        // Evaluation clamps to the segment
        assert!(line.evaluate(-3.0).distance(DVec2::ZERO) < 1e-12);
    }

    #[test]
    fn test_malformed_arc_does_not_panic() {
        let arc = ArcTrack::new(6, DVec2::ZERO, -2.0, 0.0, PI);
        assert!(arc.length() < 0.0);
        let p = arc.evaluate(0.5);
        assert!(p.distance(DVec2::new(-2.0, 0.0)) < 1e-12);
        let err = crate::sim::traversal::traverse(DVec2::ONE, &arc, 100).unwrap_err();
        assert!(matches!(
            err,
            crate::DynamicsError::DegenerateTrack { id: TrackId(6), .. }
        ));
    }

    #[test]
    fn test_line_coarse_search() {
        let line = LineTrack::new(1, DVec2::new(0.0, 0.0), DVec2::new(9.9, 0.0));
        let s = line.dist_along_curve(DVec2::new(3.0, 5.0), 0.0, line.length(), 100);
        assert!((s - 3.0).abs() < 0.1 + 1e-9);
    }

    #[test]
    fn test_bowl_normal_points_inward() {
        let bowl = ArcTrack::bowl(2, DVec2::new(0.0, 10.0), 10.0);
        assert!((bowl.length() - 10.0 * PI).abs() < 1e-9);
        // Midpoint is the bottom of the bowl
        let mid = bowl.length() / 2.0;
        assert!(bowl.evaluate(mid).distance(DVec2::new(0.0, 0.0)) < 1e-9);
        assert!(bowl.unit_normal(mid).distance(DVec2::Y) < 1e-9);
    }

    #[test]
    fn test_arc_span_wraparound() {
        let arc = ArcTrack::new(3, DVec2::ZERO, 1.0, PI * 0.9, -PI * 0.9);
        assert!((arc.span - 0.2 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_coarse_search_is_repeatable() {
        let bowl = ArcTrack::bowl(2, DVec2::new(0.0, 10.0), 10.0);
        let p = DVec2::new(3.0, 1.5);
        let a = bowl.dist_along_curve(p, 0.0, bowl.length(), 100);
        let b = bowl.dist_along_curve(p, 0.0, bowl.length(), 100);
        assert_eq!(a, b);
    }
}
