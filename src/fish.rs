//! Fish agents.

use glam::Vec3;
use rapier3d::prelude::RigidBodyHandle;

use crate::curve::{Curve, ParametricCurve};
use crate::scene::{AnimationState, SceneNode};

/// Lowest speed the tuning panel allows.
pub const MIN_SPEED: f32 = 0.1;
/// Highest speed the tuning panel allows.
pub const MAX_SPEED: f32 = 5.0;

/// One simulated fish: a physics body chasing a point along its own curve.
#[derive(Clone, Debug)]
pub struct FishAgent {
    /// Position in the roster. Also shifts the vertical wobble phase.
    pub index: usize,
    /// Display name for the tuning panel.
    pub name: String,
    /// Rigid body in the physics world. Its mass drives buoyancy.
    pub body: RigidBodyHandle,
    /// Collider radius.
    pub radius: f32,
    /// Progress along `curve`, in `[0, 1)`.
    pub t: f32,
    /// Path-traversal rate and thrust. Live-tunable.
    pub speed: f32,
    pub curve: Curve,
    pub node: SceneNode,
    pub animation: AnimationState,
}

impl FishAgent {
    /// Point the fish is currently chasing, before the wobble offset.
    pub fn path_point(&self) -> Vec3 {
        self.curve.point(self.t)
    }

    /// Set speed from an external tuning surface. Takes effect next step.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// Set the uniform visual scale.
    pub fn set_scale(&mut self, scale: f32) {
        self.node.scale = scale.max(0.0);
    }
}
