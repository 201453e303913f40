//! Rigid-body physics world.
//!
//! A thin wrapper over `rapier3d` that speaks `glam` types and adds a
//! fixed-timestep accumulator. Forces added with [`PhysicsWorld::apply_force`]
//! act on the next internal sub-step only and are then cleared.

use glam::{Quat, Vec3};
use rapier3d::na::Unit;
use rapier3d::prelude::*;

/// Collision group of every fish. Fish do not collide with each other.
pub const FISH_GROUP: Group = Group::GROUP_2;
/// Collision group of the tank walls and static props.
pub const STATIC_GROUP: Group = Group::GROUP_1;

/// Contact material shared by fish and walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Material {
    /// Frictionless, slightly bouncy. Fish slide along walls instead of sticking.
    pub const WATER_CONTACT: Material = Material {
        friction: 0.0,
        restitution: 0.2,
    };
}

impl Default for Material {
    fn default() -> Self {
        Self::WATER_CONTACT
    }
}

/// Collider shape for static props.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StaticShape {
    /// Box with the given half extents.
    Cuboid(Vec3),
    Ball(f32),
}

/// Fixed-timestep accumulator with a sub-step cap.
///
/// Real elapsed time is banked and spent in whole `fixed_dt` steps. When a
/// frame needs more than `max_substeps`, the leftover is dropped so a long
/// stall cannot cause a spiral of catch-up work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedStep {
    pub fixed_dt: f32,
    pub max_substeps: u32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(fixed_dt: f32, max_substeps: u32) -> Self {
        Self {
            fixed_dt,
            max_substeps,
            accumulator: 0.0,
        }
    }

    /// Bank `delta` seconds and return how many fixed steps to run now.
    pub fn advance(&mut self, delta: f32) -> u32 {
        if delta.is_nan() || delta <= 0.0 || self.fixed_dt <= 0.0 {
            return 0;
        }

        self.accumulator += delta;
        let mut substeps = 0;
        while self.accumulator >= self.fixed_dt && substeps < self.max_substeps {
            self.accumulator -= self.fixed_dt;
            substeps += 1;
        }
        self.accumulator %= self.fixed_dt;
        substeps
    }

    /// Seconds banked but not yet simulated.
    #[inline]
    pub fn pending(&self) -> f32 {
        self.accumulator
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(1.0 / 60.0, 3)
    }
}

/// Rigid-body world: bodies, colliders and the rapier pipeline.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    stepper: FixedStep,
}

impl PhysicsWorld {
    pub fn new(stepper: FixedStep) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = stepper.fixed_dt;

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            stepper,
        }
    }

    /// Add a dynamic sphere in the fish collision group.
    ///
    /// Rotation is locked; fish orientation is purely visual. CCD is on so
    /// a fast fish cannot slip past a wall between two sub-steps.
    pub fn add_fish_body(
        &mut self,
        position: Vec3,
        radius: f32,
        mass: f32,
        material: Material,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(to_vector(position))
            .lock_rotations()
            .can_sleep(false)
            .ccd_enabled(true)
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .mass(mass)
            .friction(material.friction)
            .restitution(material.restitution)
            .collision_groups(InteractionGroups::new(
                FISH_GROUP,
                Group::ALL.difference(FISH_GROUP),
            ))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        handle
    }

    /// Add an infinite static plane. `normal` points into the free space.
    pub fn add_static_plane(&mut self, normal: Vec3, point: Vec3, material: Material) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Unit::new_normalize(to_vector(normal)))
            .translation(to_vector(point))
            .friction(material.friction)
            .restitution(material.restitution)
            .collision_groups(InteractionGroups::new(STATIC_GROUP, Group::ALL))
            .build();
        self.colliders.insert(collider)
    }

    /// Add a fixed body with one collider.
    pub fn add_static_body(
        &mut self,
        shape: StaticShape,
        position: Vec3,
        rotation: Quat,
        material: Material,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(to_vector(position))
            .rotation(to_vector(rotation.to_scaled_axis()))
            .build();
        let handle = self.bodies.insert(body);

        let builder = match shape {
            StaticShape::Cuboid(half) => ColliderBuilder::cuboid(half.x, half.y, half.z),
            StaticShape::Ball(radius) => ColliderBuilder::ball(radius),
        };
        let collider = builder
            .friction(material.friction)
            .restitution(material.restitution)
            .collision_groups(InteractionGroups::new(STATIC_GROUP, Group::ALL))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Advance by `delta` seconds of real time using the fixed sub-step.
    ///
    /// Returns the number of sub-steps run. `gravity` is read on every call
    /// so live changes apply immediately.
    pub fn step(&mut self, delta: f32, gravity: Vec3) -> u32 {
        let substeps = self.stepper.advance(delta);
        let gravity = to_vector(gravity);
        for _ in 0..substeps {
            self.pipeline.step(
                &gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
            self.clear_forces();
        }
        substeps
    }

    fn clear_forces(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            if body.is_dynamic() {
                body.reset_forces(false);
            }
        }
    }

    /// Add a continuous force at a world-space point.
    pub fn apply_force(&mut self, handle: RigidBodyHandle, force: Vec3, point: Vec3) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.add_force_at_point(to_vector(force), to_point(point), true);
                true
            }
            None => false,
        }
    }

    /// Apply an instantaneous impulse at a world-space point.
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3, point: Vec3) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.apply_impulse_at_point(to_vector(impulse), to_point(point), true);
                true
            }
            None => false,
        }
    }

    pub fn position(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| from_vector(b.translation()))
    }

    /// Mass of a body in kg, as the solver sees it.
    pub fn mass(&self, handle: RigidBodyHandle) -> Option<f32> {
        self.bodies.get(handle).map(|b| b.mass())
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| from_vector(b.linvel()))
    }

    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.set_linvel(to_vector(velocity), true);
                true
            }
            None => false,
        }
    }

    /// Move a body without simulating the path in between.
    pub fn set_position(&mut self, handle: RigidBodyHandle, position: Vec3) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.set_translation(to_vector(position), true);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    /// Remove a body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    #[inline]
    pub fn fixed_dt(&self) -> f32 {
        self.stepper.fixed_dt
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(FixedStep::default())
    }
}

#[inline]
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

#[inline]
fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

#[inline]
fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_fixed_step_counts() {
        let mut stepper = FixedStep::default();
        assert_eq!(stepper.advance(0.0), 0);
        assert_eq!(stepper.advance(DT * 0.5), 0);
        assert_eq!(stepper.advance(DT * 0.6), 1);
        assert!(stepper.pending() < DT);
    }

    #[test]
    fn test_fixed_step_caps_catch_up() {
        let mut stepper = FixedStep::default();
        assert_eq!(stepper.advance(1.0), 3);
        // The backlog beyond the cap is dropped, not carried forward.
        assert!(stepper.pending() < DT);
        assert!(stepper.advance(DT * 0.01) <= 1);
    }

    #[test]
    fn test_fixed_step_ignores_negative_delta() {
        let mut stepper = FixedStep::default();
        assert_eq!(stepper.advance(-1.0), 0);
        assert_eq!(stepper.advance(f32::NAN), 0);
        assert_eq!(stepper.pending(), 0.0);
    }

    #[test]
    fn test_gravity_pulls_body_down() {
        let mut world = PhysicsWorld::default();
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 1.0, Material::default());
        world.step(DT, Vec3::new(0.0, -9.82, 0.0));
        let v = world.velocity(fish).unwrap();
        assert!(v.y < 0.0);
    }

    #[test]
    fn test_force_acts_for_one_substep() {
        let mut world = PhysicsWorld::default();
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 1.0, Material::default());
        world.apply_force(fish, Vec3::new(60.0, 0.0, 0.0), Vec3::ZERO);
        world.step(DT * 2.0, Vec3::ZERO);
        let v = world.velocity(fish).unwrap();
        // 60 N on 1 kg for 1/60 s, then cleared.
        assert!((v.x - 1.0).abs() < 0.05, "vx = {}", v.x);
    }

    #[test]
    fn test_impulse_changes_velocity_immediately() {
        let mut world = PhysicsWorld::default();
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 2.0, Material::default());
        world.step(DT, Vec3::ZERO);
        assert!(world.apply_impulse(fish, Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO));
        let v = world.velocity(fish).unwrap();
        assert!((v.z - 0.5).abs() < 1e-4, "vz = {}", v.z);
    }

    #[test]
    fn test_fish_do_not_collide_with_each_other() {
        let mut world = PhysicsWorld::default();
        let a = world.add_fish_body(Vec3::ZERO, 1.0, 1.0, Material::default());
        let b = world.add_fish_body(Vec3::new(0.5, 0.0, 0.0), 1.0, 1.0, Material::default());
        for _ in 0..10 {
            world.step(DT, Vec3::ZERO);
        }
        assert_eq!(world.velocity(a), Some(Vec3::ZERO));
        assert_eq!(world.velocity(b), Some(Vec3::ZERO));
    }

    #[test]
    fn test_plane_stops_falling_body() {
        let mut world = PhysicsWorld::default();
        world.add_static_plane(Vec3::Y, Vec3::new(0.0, -5.0, 0.0), Material::default());
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 1.0, Material::default());
        for _ in 0..300 {
            world.step(DT, Vec3::new(0.0, -9.82, 0.0));
        }
        let p = world.position(fish).unwrap();
        assert!(p.y > -5.0, "fell through floor: {:?}", p);
    }

    #[test]
    fn test_fish_mass_comes_from_collider() {
        let mut world = PhysicsWorld::default();
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 2.5, Material::default());
        let mass = world.mass(fish).unwrap();
        assert!((mass - 2.5).abs() < 1e-4, "mass = {}", mass);
    }

    #[test]
    fn test_fast_fish_does_not_sink_into_plane() {
        let mut world = PhysicsWorld::default();
        world.add_static_plane(Vec3::Y, Vec3::new(0.0, -2.0, 0.0), Material::default());
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 1.0, Material::default());
        world.set_velocity(fish, Vec3::new(0.0, -40.0, 0.0));
        for frame in 0..60 {
            world.step(DT, Vec3::ZERO);
            let p = world.position(fish).unwrap();
            assert!(p.y > -1.6, "frame {}: centre at {}", frame, p.y);
        }
    }

    #[test]
    fn test_missing_body() {
        let mut world = PhysicsWorld::default();
        let fish = world.add_fish_body(Vec3::ZERO, 0.5, 1.0, Material::default());
        assert!(world.remove_body(fish));
        assert!(!world.contains(fish));
        assert_eq!(world.position(fish), None);
        assert_eq!(world.mass(fish), None);
        assert!(!world.apply_force(fish, Vec3::X, Vec3::ZERO));
    }
}
