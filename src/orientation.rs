//! Visual heading of each fish.
//!
//! The rigid body never rotates. Instead the scene node is turned a fraction
//! of the way toward a point slightly ahead on the fish's path every frame,
//! which gives smooth, lagging turns.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::curve::{wrap_unit, ParametricCurve};
use crate::fish::FishAgent;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationParams {
    /// How far ahead on the path to aim, in path-parameter units.
    pub look_ahead: f32,
    /// Fraction of the remaining turn taken per frame.
    pub turn_blend: f32,
}

impl Default for OrientationParams {
    fn default() -> Self {
        Self {
            look_ahead: 0.05,
            turn_blend: 0.1,
        }
    }
}

/// Rotation that points the local −Z axis from `eye` at `target`, with local
/// +Y as close to `up` as possible.
///
/// Degenerate inputs fall back gracefully: coincident points keep the −Z
/// default, and a direction parallel to `up` picks another reference axis.
pub fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    let mut z = eye - target;
    if z.length_squared() == 0.0 {
        z.z = 1.0;
    }
    let z = z.normalize();

    let mut x = up.cross(z);
    if x.length_squared() == 0.0 {
        // up and z are parallel, nudge z off-axis
        let tweak = if up.z.abs() == 1.0 {
            Vec3::new(z.x + 1e-4, z.y, z.z)
        } else {
            Vec3::new(z.x, z.y, z.z + 1e-4)
        };
        x = up.cross(tweak.normalize());
    }
    let x = x.normalize();
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Turn `agent` toward a point `look_ahead` further along its path.
///
/// `position` is the body's current position. Returns the new rotation,
/// which is also written to the agent's scene node.
pub fn step(agent: &mut FishAgent, position: Vec3, params: &OrientationParams) -> Quat {
    let ahead = agent.curve.point(wrap_unit(agent.t + params.look_ahead));
    let desired = look_rotation(position, ahead, agent.node.up);
    let current = agent.node.rotation;
    let rotation = current.slerp(desired, params.turn_blend).normalize();
    agent.node.rotation = rotation;
    rotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{Curve, Fixed};
    use crate::scene::{AnimationState, ModelKind, SceneNode};
    use rapier3d::prelude::RigidBodyHandle;

    fn agent(target: Vec3) -> FishAgent {
        FishAgent {
            index: 0,
            name: "test".into(),
            body: RigidBodyHandle::invalid(),
            radius: 0.5,
            t: 0.0,
            speed: 1.0,
            curve: Curve::Fixed(Fixed(target)),
            node: SceneNode::new(ModelKind::Fish),
            animation: AnimationState::default(),
        }
    }

    fn forward(q: Quat) -> Vec3 {
        q * Vec3::NEG_Z
    }

    #[test]
    fn test_look_rotation_faces_target() {
        let targets = [
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(-2.0, 1.0, 4.0),
            Vec3::new(1.0, -7.0, 0.5),
        ];
        for target in targets {
            let q = look_rotation(Vec3::ZERO, target, Vec3::Y);
            let f = forward(q);
            assert!((f - target.normalize()).length() < 1e-4, "{:?} vs {:?}", f, target);
            // Local up stays on the world-up side.
            assert!((q * Vec3::Y).y >= 0.0);
        }
    }

    #[test]
    fn test_look_rotation_identity_for_neg_z() {
        let q = look_rotation(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        assert!(q.angle_between(Quat::IDENTITY) < 1e-4);
    }

    #[test]
    fn test_look_rotation_degenerate_inputs() {
        let same = look_rotation(Vec3::ONE, Vec3::ONE, Vec3::Y);
        assert!(same.is_finite());
        assert!((same.length() - 1.0).abs() < 1e-4);

        let straight_up = look_rotation(Vec3::ZERO, Vec3::Y * 3.0, Vec3::Y);
        assert!(straight_up.is_finite());
        assert!((forward(straight_up) - Vec3::Y).length() < 1e-2);
    }

    #[test]
    fn test_turn_converges_without_overshoot() {
        let mut fish = agent(Vec3::new(10.0, 0.0, 0.0));
        let desired = look_rotation(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::Y);

        let mut last = fish.node.rotation.angle_between(desired);
        for _ in 0..200 {
            step(&mut fish, Vec3::ZERO, &OrientationParams::default());
            let remaining = fish.node.rotation.angle_between(desired);
            assert!(remaining <= last + 1e-5, "{} > {}", remaining, last);
            last = remaining;
        }
        assert!(last < 1e-3, "still {} rad away", last);
        assert!((fish.node.rotation.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_one_step_turns_a_tenth() {
        let mut fish = agent(Vec3::new(10.0, 0.0, 0.0));
        let desired = look_rotation(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::Y);
        let start = fish.node.rotation.angle_between(desired);
        step(&mut fish, Vec3::ZERO, &OrientationParams::default());
        let turned = Quat::IDENTITY.angle_between(fish.node.rotation);
        assert!((turned - start * 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_looks_ahead_on_path() {
        let fish = agent(Vec3::ZERO);
        let params = OrientationParams::default();
        assert_eq!(params.look_ahead, 0.05);
        assert_eq!(fish.curve.point(wrap_unit(0.98 + params.look_ahead)), Vec3::ZERO);
    }
}
