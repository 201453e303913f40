//! Per-frame swimming forces.
//!
//! Each frame, after the physics world has advanced, every fish gets:
//!
//! 1. buoyancy slightly stronger than gravity,
//! 2. a step along its path,
//! 3. a thrust toward the (wobbling) path point,
//! 4. isotropic velocity damping,
//! 5. a small random kick if the damped speed is below the stall speed.
//!
//! Forces are integrated by the next physics sub-step; the damping and the
//! kick change velocity immediately.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::curve::{wrap_unit, ParametricCurve};
use crate::error::FrameError;
use crate::fish::FishAgent;
use crate::physics::PhysicsWorld;

/// Coefficients of the swimming model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionParams {
    /// Buoyancy as a multiple of weight. Above 1 the fish drift upward.
    pub buoyancy_factor: f32,
    /// Path parameter advanced per second at speed 1.
    pub traversal_rate: f32,
    /// Height of the vertical target wobble.
    pub wobble_amplitude: f32,
    /// Angular frequency of the wobble, radians per second.
    pub wobble_frequency: f32,
    /// Wobble phase offset between consecutive fish.
    pub wobble_phase_step: f32,
    /// Thrust per unit of speed.
    pub thrust_gain: f32,
    /// Velocity multiplier applied every frame.
    pub damping: f32,
    /// Speed under which a fish counts as stalled.
    pub stall_speed: f32,
    /// Each kick component is drawn from `[-nudge_strength, nudge_strength]`.
    pub nudge_strength: f32,
}

impl Default for LocomotionParams {
    fn default() -> Self {
        Self {
            buoyancy_factor: 1.05,
            traversal_rate: 0.2,
            wobble_amplitude: 0.5,
            wobble_frequency: 2.0,
            wobble_phase_step: 0.5,
            thrust_gain: 10.0,
            damping: 0.96,
            stall_speed: 0.1,
            nudge_strength: 0.25,
        }
    }
}

/// What one locomotion step did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepReport {
    /// Body position the step worked from.
    pub position: Vec3,
    /// Body velocity before damping.
    pub velocity: Vec3,
    /// Wobbled path point the fish steered toward.
    pub target: Vec3,
    /// Thrust applied, zero if the fish was already on its target.
    pub thrust: Vec3,
    /// Anti-stall impulse, if one fired.
    pub nudge: Option<Vec3>,
}

impl StepReport {
    fn idle(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            target: position,
            thrust: Vec3::ZERO,
            nudge: None,
        }
    }
}

/// Vertical offset added to every fish's target, phase-shifted per fish.
#[inline]
pub fn wobble(params: &LocomotionParams, elapsed: f32, index: usize) -> f32 {
    (elapsed * params.wobble_frequency + index as f32 * params.wobble_phase_step).sin()
        * params.wobble_amplitude
}

/// Run one frame of locomotion for `agent`.
///
/// `gravity` is the signed vertical gravity from the live tuning; only its
/// magnitude matters. A zero `delta` (paused clock) leaves the fish and its
/// body untouched.
pub fn step<R: Rng + ?Sized>(
    agent: &mut FishAgent,
    world: &mut PhysicsWorld,
    elapsed: f32,
    delta: f32,
    gravity: f32,
    params: &LocomotionParams,
    rng: &mut R,
) -> Result<StepReport, FrameError> {
    let (position, velocity, mass) = match (
        world.position(agent.body),
        world.velocity(agent.body),
        world.mass(agent.body),
    ) {
        (Some(p), Some(v), Some(m)) => (p, v, m),
        _ => return Err(FrameError::MissingBody),
    };
    if !position.is_finite() || !velocity.is_finite() {
        return Err(FrameError::NonFinite {
            position: position.to_array(),
            velocity: velocity.to_array(),
        });
    }

    if delta <= 0.0 {
        return Ok(StepReport::idle(position, velocity));
    }

    let buoyancy = mass * gravity.abs() * params.buoyancy_factor;
    world.apply_force(agent.body, Vec3::Y * buoyancy, position);

    agent.t = wrap_unit(agent.t + delta * agent.speed * params.traversal_rate);

    let mut target = agent.curve.point(agent.t);
    target.y += wobble(params, elapsed, agent.index);

    let thrust = match (target - position).try_normalize() {
        Some(direction) => direction * agent.speed * params.thrust_gain,
        None => Vec3::ZERO,
    };
    if thrust != Vec3::ZERO {
        world.apply_force(agent.body, thrust, position);
    }

    let damped = velocity * params.damping;
    world.set_velocity(agent.body, damped);

    let nudge = if damped.length() < params.stall_speed {
        let s = params.nudge_strength;
        let impulse = Vec3::new(
            rng.gen_range(-s..=s),
            rng.gen_range(-s..=s),
            rng.gen_range(-s..=s),
        );
        world.apply_impulse(agent.body, impulse, position);
        tracing::trace!(fish = agent.index, ?impulse, "stalled, nudging");
        Some(impulse)
    } else {
        None
    };

    Ok(StepReport {
        position,
        velocity,
        target,
        thrust,
        nudge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, Fixed, PathGenerator};
    use crate::physics::Material;
    use crate::scene::{AnimationState, ModelKind, SceneNode};
    use crate::tank::Tank;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;
    const GRAVITY: f32 = -9.82;

    fn fish_at(world: &mut PhysicsWorld, position: Vec3, curve: Curve) -> FishAgent {
        let body = world.add_fish_body(position, 0.5, 1.0, Material::default());
        // Settle so mass properties are in place before impulses.
        world.step(DT, Vec3::ZERO);
        FishAgent {
            index: 0,
            name: "test".into(),
            body,
            radius: 0.5,
            t: 0.0,
            speed: 1.0,
            curve,
            node: SceneNode::new(ModelKind::Fish).with_position(position),
            animation: AnimationState::default(),
        }
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::X * 5.0)));
        world.set_velocity(fish.body, Vec3::new(1.0, 0.0, 0.0));
        fish.t = 0.4;

        let report = step(&mut fish, &mut world, 3.0, 0.0, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();

        assert_eq!(report.nudge, None);
        assert_eq!(fish.t, 0.4);
        assert_eq!(world.position(fish.body), Some(Vec3::ZERO));
        assert_eq!(world.velocity(fish.body), Some(Vec3::new(1.0, 0.0, 0.0)));

        // No force was banked either: a zero-gravity step leaves velocity alone.
        world.step(DT, Vec3::ZERO);
        let v = world.velocity(fish.body).unwrap();
        assert!((v - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5, "v = {:?}", v);
    }

    #[test]
    fn test_path_parameter_wraps() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        fish.t = 0.99;
        step(&mut fish, &mut world, 0.0, 1.0, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        assert!((fish.t - 0.19).abs() < 1e-5, "t = {}", fish.t);

        for _ in 0..500 {
            step(&mut fish, &mut world, 0.0, 0.37, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
            assert!((0.0..1.0).contains(&fish.t));
        }
    }

    #[test]
    fn test_speed_change_applies_next_step() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        fish.set_speed(2.5);
        step(&mut fish, &mut world, 0.0, 0.1, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        assert!((fish.t - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_thrust_points_at_target() {
        let mut world = PhysicsWorld::default();
        // Elapsed chosen so the wobble is zero: sin(0) at index 0.
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::new(0.0, 0.0, -4.0))));
        world.set_velocity(fish.body, Vec3::new(0.0, 0.0, -1.0));
        let report = step(&mut fish, &mut world, 0.0, DT, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        assert!((report.thrust - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);
        assert_eq!(report.target, Vec3::new(0.0, 0.0, -4.0));
    }

    #[test]
    fn test_on_target_skips_thrust() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        world.set_velocity(fish.body, Vec3::new(1.0, 0.0, 0.0));
        let report = step(&mut fish, &mut world, 0.0, DT, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        assert_eq!(report.target, Vec3::ZERO);
        assert_eq!(report.thrust, Vec3::ZERO);
    }

    #[test]
    fn test_damping_scales_velocity() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        world.set_velocity(fish.body, Vec3::new(2.0, 0.0, 0.0));
        step(&mut fish, &mut world, 0.0, DT, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        let v = world.velocity(fish.body).unwrap();
        assert!((v.x - 1.92).abs() < 1e-5);
    }

    #[test]
    fn test_damping_decays_until_nudged() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        world.set_velocity(fish.body, Vec3::new(1.0, 0.0, 0.0));
        let params = LocomotionParams::default();
        let mut rng = rng();

        let mut last = 1.0;
        let mut nudged = false;
        for _ in 0..200 {
            let report = step(&mut fish, &mut world, 0.0, DT, 0.0, &params, &mut rng).unwrap();
            let speed = world.velocity(fish.body).unwrap().length();
            if report.nudge.is_some() {
                assert!(report.velocity.length() * params.damping < params.stall_speed);
                nudged = true;
                break;
            }
            assert!(speed < last, "speed {} did not drop below {}", speed, last);
            last = speed;
        }
        assert!(nudged, "damping never reached the stall threshold");
        assert!(world.velocity(fish.body).unwrap().length() > 0.0);
    }

    #[test]
    fn test_nudge_only_when_stalled() {
        let params = LocomotionParams::default();
        // Checked after damping: 0.104 * 0.96 is just under the threshold.
        for (speed, expect) in [(0.0, true), (0.05, true), (0.1, true), (0.104, true), (0.105, false), (0.5, false)] {
            let mut world = PhysicsWorld::default();
            let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::Y * 3.0)));
            world.set_velocity(fish.body, Vec3::new(speed, 0.0, 0.0));
            let report = step(&mut fish, &mut world, 0.0, DT, GRAVITY, &params, &mut rng()).unwrap();
            assert_eq!(report.nudge.is_some(), expect, "speed {}", speed);
            if let Some(impulse) = report.nudge {
                assert!(impulse.abs().max_element() <= params.nudge_strength);
            }
        }
    }

    #[test]
    fn test_body_at_rest_gets_kicked() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        world.set_velocity(fish.body, Vec3::ZERO);
        let report = step(&mut fish, &mut world, 0.0, DT, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        let impulse = report.nudge.expect("resting fish must be nudged");
        assert!(impulse.length() > 0.0);
        assert!(world.velocity(fish.body).unwrap().length() > 0.0);
    }

    #[test]
    fn test_buoyancy_beats_gravity() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        world.set_velocity(fish.body, Vec3::ZERO);
        let params = LocomotionParams {
            nudge_strength: 0.0,
            ..Default::default()
        };
        step(&mut fish, &mut world, 0.0, DT, GRAVITY, &params, &mut rng()).unwrap();
        world.step(DT, Vec3::new(0.0, GRAVITY, 0.0));
        assert!(world.velocity(fish.body).unwrap().y > 0.0);
    }

    #[test]
    fn test_buoyancy_scales_with_body_mass() {
        let mut world = PhysicsWorld::default();
        let body = world.add_fish_body(Vec3::ZERO, 0.5, 4.0, Material::default());
        world.step(DT, Vec3::ZERO);
        let mut fish = fish_at(&mut world, Vec3::new(10.0, 0.0, 0.0), Curve::Fixed(Fixed(Vec3::ZERO)));
        fish.body = body;
        world.set_velocity(body, Vec3::ZERO);
        let params = LocomotionParams {
            nudge_strength: 0.0,
            ..Default::default()
        };
        step(&mut fish, &mut world, 0.0, DT, GRAVITY, &params, &mut rng()).unwrap();
        world.step(DT, Vec3::new(0.0, GRAVITY, 0.0));
        // Net upward acceleration is 0.05 g whatever the mass.
        let vy = world.velocity(body).unwrap().y;
        assert!((vy - 0.05 * 9.82 * DT).abs() < 1e-3, "vy = {}", vy);
    }

    #[test]
    fn test_wobble_phase_per_fish() {
        let params = LocomotionParams::default();
        assert_eq!(wobble(&params, 0.0, 0), 0.0);
        let a = wobble(&params, 1.0, 0);
        let b = wobble(&params, 1.0, 1);
        assert!((a - (2.0f32).sin() * 0.5).abs() < 1e-6);
        assert!((b - (2.5f32).sin() * 0.5).abs() < 1e-6);
        assert!(wobble(&params, 123.4, 3).abs() <= 0.5);
    }

    #[test]
    fn test_missing_body_is_frame_error() {
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, Vec3::ZERO, Curve::Fixed(Fixed(Vec3::ZERO)));
        world.remove_body(fish.body);
        let err = step(&mut fish, &mut world, 0.0, DT, GRAVITY, &LocomotionParams::default(), &mut rng());
        assert_eq!(err, Err(FrameError::MissingBody));
    }

    #[test]
    fn test_follows_generated_path() {
        let tank = Tank::default();
        let path = PathGenerator::new(3).generate(&tank, 0);
        let start = path.point(0.0);
        let mut world = PhysicsWorld::default();
        let mut fish = fish_at(&mut world, start, Curve::Swim(path));
        world.set_velocity(fish.body, Vec3::ZERO);
        let report = step(&mut fish, &mut world, 0.0, DT, GRAVITY, &LocomotionParams::default(), &mut rng()).unwrap();
        assert!(report.thrust.length() > 9.99 && report.thrust.length() < 10.01);
    }
}
