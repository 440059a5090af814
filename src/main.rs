//! Skate Dynamics demo
//!
//! Drops a body into a bowl and prints one JSON state sample per line.
//!
//! Usage: `skate-dynamics [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::sync::Arc;

    use glam::DVec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use skate_dynamics::sim::{
        ArcTrack, Body, Environment, KinematicState, LineTrack, ProximityPredicate, TrackCurve,
        TrackDynamics, TrackHandle, TrackId, UniformGravity,
    };
    use skate_dynamics::{EngineSettings, Result};

    const DT: f64 = 1.0 / 100.0;
    const TICKS: u64 = 1500;
    const SAMPLE_EVERY: u64 = 10;
    const BOWL: TrackId = TrackId(1);

    /// Frictionless slide along a curve.
    ///
    /// Speed comes from the mechanical energy at the start of each advance,
    /// so a slide never gains or loses energy. Leaving either end of the
    /// curve counts as departure.
    #[derive(Debug, Clone, Default)]
    struct Slide {
        s: f64,
        forward: bool,
        departed: bool,
    }

    impl Slide {
        fn place(state: &mut KinematicState, track: &dyn TrackCurve, s: f64) {
            let n = track.unit_normal(s);
            state.set_attachment_point(track.evaluate(s));
            state.set_attachment_rotation((-n.x).atan2(n.y));
        }
    }

    impl TrackDynamics for Slide {
        fn init(&mut self, state: &mut KinematicState, track: &dyn TrackCurve) {
            let before = state.total_energy();
            let length = track.length();
            self.s = track.dist_along_curve(state.center_of_mass(), 0.0, length, 100);

            // Landing keeps the tangential part of the velocity; the rest is heat
            let n = track.unit_normal(self.s);
            let tangent = DVec2::new(n.y, -n.x);
            let along = state.velocity().dot(tangent);
            self.forward = along >= 0.0;
            Self::place(state, track, self.s);
            state.set_velocity(tangent * along);
            state.add_thermal_energy(before - state.total_energy());
        }

        fn advance(&mut self, state: &mut KinematicState, track: &dyn TrackCurve, dt: f64) {
            let mechanical = state.mechanical_energy();
            let speed = state.speed();
            let step = if self.forward { speed * dt } else { -speed * dt };
            let next = self.s + step;
            if next < 0.0 || next > track.length() {
                self.departed = true;
                return;
            }

            let previous = (state.attachment_point(), state.attachment_rotation());
            Self::place(state, track, next);
            let v_squared = 2.0 * (mechanical - state.potential_energy()) / state.mass();
            if v_squared < 0.0 {
                // Not enough energy to get there: turn around in place
                state.set_attachment_point(previous.0);
                state.set_attachment_rotation(previous.1);
                state.set_velocity(DVec2::ZERO);
                self.forward = !self.forward;
                return;
            }

            self.s = next;
            let n = track.unit_normal(next);
            let tangent = DVec2::new(n.y, -n.x);
            let sign = if self.forward { 1.0 } else { -1.0 };
            state.set_velocity(tangent * sign * v_squared.sqrt());
        }

        fn has_departed(&self) -> bool {
            self.departed
        }

        fn box_clone(&self) -> Box<dyn TrackDynamics> {
            Box::new(self.clone())
        }
    }

    pub fn run() -> Result<()> {
        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(path) => EngineSettings::load(path)?,
            None => EngineSettings::default(),
        };
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(7u64);
        log::info!("seed {seed}, settings {settings:?}");

        let bowl: TrackHandle = Arc::new(ArcTrack::bowl(BOWL.0, DVec2::new(0.0, 8.0), 8.0));
        let tracks = vec![
            bowl.clone(),
            Arc::new(LineTrack::new(2, DVec2::new(8.0, 8.0), DVec2::new(20.0, 8.0))) as TrackHandle,
        ];
        let predicate = ProximityPredicate::with_margin(0.2);
        let env = Environment::new(&tracks, &predicate);

        let mut rng = Pcg32::seed_from_u64(seed);
        let state = KinematicState::with_potential(Box::new(UniformGravity::earth()));
        let mut body = Body::new(state, settings)?;
        body.state_mut()
            .set_attachment_point(DVec2::new(rng.random_range(-4.0..-2.0), 6.0));
        body.state_mut()
            .set_velocity(DVec2::new(rng.random_range(0.0..2.0), 0.0));
        body.set_free_fall_rotational_velocity(rng.random_range(-1.0..1.0));
        body.state_mut().store_total_energy();

        let mut violations = 0;
        for tick in 0..TICKS {
            let outcome = body.step(&env, DT)?;
            if outcome.is_unresolved() {
                violations += 1;
            }

            // Landing: falling body overlapping the inside of the bowl
            let landed = body.is_free_fall_mode()
                && body.state().velocity().y <= 0.0
                && body
                    .collision_state()
                    .and_then(|c| c.traversal_state_for(BOWL))
                    .is_some_and(|t| t.is_top());
            if landed {
                body.set_free_fall_rotational_velocity(0.0);
                body.set_track_mode(bowl.clone(), Box::new(Slide::default()));
            }

            if tick % SAMPLE_EVERY == 0 {
                body.notify_observers();
                println!("{}", serde_json::to_string(&body.sample())?);
            }
        }

        log::info!(
            "done: {} ticks, {violations} unresolved, drift from baseline {:.3e} J",
            body.time_ticks(),
            body.stored_energy_drift()
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Skate Dynamics demo starting...");

    if let Err(e) = demo::run() {
        log::error!("demo failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the wasm surface; there is no demo loop here
}
