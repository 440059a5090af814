//! Deterministic body simulation
//!
//! Everything that moves a body lives here. The module is pure:
//! - Fixed timestep supplied by the caller
//! - Tracks and overlap tests come from the host
//! - Stable iteration order (track registry order)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod frame;
pub mod history;
pub mod mode;
pub mod state;
pub mod tick;
pub mod track;
pub mod traversal;

pub use body::{Body, BodyListener, LastFall, ListenerId, StateSample};
pub use collision::{CollisionPredicate, CollisionSnapshot, ProximityPredicate, build_snapshot};
pub use history::HistoryBuffer;
pub use mode::{
    FreeFall, ModeKind, MotionMode, TrackConstrained, TrackDynamics, UserControlled,
    integrate_force,
};
pub use state::{Frame, GeometryChecks, KinematicState, PotentialEnergy, UniformGravity};
pub use tick::{Environment, StepOutcome};
pub use track::{ArcTrack, LineTrack, TrackCurve, TrackHandle, TrackId};
pub use traversal::{TraversalState, traverse};
