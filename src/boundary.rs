//! Tank walls.
//!
//! Six static half-spaces, one per face, each with its normal pointing into
//! the tank. Fish bounce off them with the shared water contact material.

use glam::Vec3;
use rapier3d::prelude::ColliderHandle;

use crate::physics::{Material, PhysicsWorld};
use crate::tank::Tank;

/// One wall of the tank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryPlane {
    pub name: &'static str,
    /// Unit normal pointing into the tank.
    pub normal: Vec3,
    /// A point on the plane.
    pub point: Vec3,
    pub collider: ColliderHandle,
}

impl BoundaryPlane {
    /// Signed distance from the plane, positive inside the tank.
    pub fn distance(&self, point: Vec3) -> f32 {
        (point - self.point).dot(self.normal)
    }
}

/// The six walls of a tank.
#[derive(Clone, Debug)]
pub struct Boundary {
    planes: [BoundaryPlane; 6],
}

impl Boundary {
    /// Add the walls of `tank` to `world`.
    pub fn build(tank: &Tank, world: &mut PhysicsWorld) -> Self {
        let half = tank.half_extents();
        let faces = [
            ("floor", Vec3::Y, Vec3::new(0.0, -half.y, 0.0)),
            ("ceiling", Vec3::NEG_Y, Vec3::new(0.0, half.y, 0.0)),
            ("left", Vec3::X, Vec3::new(-half.x, 0.0, 0.0)),
            ("right", Vec3::NEG_X, Vec3::new(half.x, 0.0, 0.0)),
            ("back", Vec3::Z, Vec3::new(0.0, 0.0, -half.z)),
            ("front", Vec3::NEG_Z, Vec3::new(0.0, 0.0, half.z)),
        ];

        let planes = faces.map(|(name, normal, point)| BoundaryPlane {
            name,
            normal,
            point,
            collider: world.add_static_plane(normal, point, Material::WATER_CONTACT),
        });

        tracing::debug!(?half, "built tank boundary");
        Self { planes }
    }

    pub fn planes(&self) -> &[BoundaryPlane; 6] {
        &self.planes
    }

    /// Whether `point` is inside every wall.
    pub fn contains(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance(point) > 0.0)
    }
}
