//! The simulation: tank, walls, fish and props, advanced one frame at a time.

use std::f32::consts::TAU;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rapier3d::prelude::RigidBodyHandle;

use crate::boundary::Boundary;
use crate::config::{AquariumConfig, FishConfig, PropConfig, Tuning};
use crate::curve::{Curve, ParametricCurve, PathGenerator};
use crate::fish::{FishAgent, MAX_SPEED, MIN_SPEED};
use crate::locomotion::{self, LocomotionParams};
use crate::orientation::{self, OrientationParams};
use crate::physics::{FixedStep, Material, PhysicsWorld, StaticShape};
use crate::scene::{hex_to_rgb, AnimationState, ModelKind, ModelLoader, SceneNode};
use crate::tank::Tank;

/// A static scene element. Has a body only if it was configured with a
/// supported collider.
#[derive(Clone, Debug)]
pub struct Prop {
    pub name: String,
    pub node: SceneNode,
    pub body: Option<RigidBodyHandle>,
}

/// What happened during one [`Aquarium::frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Physics sub-steps run.
    pub substeps: u32,
    /// Fish updated successfully.
    pub updated: usize,
    /// Fish skipped because of a [`FrameError`](crate::error::FrameError).
    pub skipped: usize,
    /// Anti-stall impulses applied.
    pub nudges: usize,
}

/// Owns everything that gets simulated.
pub struct Aquarium {
    tank: Tank,
    boundary: Boundary,
    world: PhysicsWorld,
    paths: PathGenerator,
    fish: Vec<FishAgent>,
    props: Vec<Prop>,
    locomotion: LocomotionParams,
    orientation: OrientationParams,
    rng: SmallRng,
}

impl Aquarium {
    /// An empty tank with walls and nothing in it.
    pub fn new(tank: Tank, seed: u64) -> Self {
        let mut world = PhysicsWorld::new(FixedStep::default());
        let boundary = Boundary::build(&tank, &mut world);
        Self {
            tank,
            boundary,
            world,
            paths: PathGenerator::new(seed),
            fish: Vec::new(),
            props: Vec::new(),
            locomotion: LocomotionParams::default(),
            orientation: OrientationParams::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Build a full scene. Entries whose model cannot be resolved are
    /// logged and left out.
    pub fn from_config(config: &AquariumConfig, loader: &mut dyn ModelLoader) -> Self {
        let mut aquarium = Self::new(config.tank, config.seed);
        aquarium.locomotion = config.locomotion;
        aquarium.orientation = config.orientation;

        for fish in &config.fish {
            match loader.load(&fish.model) {
                Ok(kind) => {
                    aquarium.spawn_fish(kind, fish);
                }
                Err(e) => tracing::warn!(error = %e, "skipping fish"),
            }
        }

        for prop in &config.props {
            match loader.load(&prop.model) {
                Ok(kind) => aquarium.add_prop(kind, prop),
                Err(e) => tracing::warn!(prop = %prop.name, error = %e, "skipping prop"),
            }
        }

        tracing::info!(
            fish = aquarium.fish.len(),
            props = aquarium.props.len(),
            bodies = aquarium.world.body_count(),
            "aquarium ready"
        );
        aquarium
    }

    /// Add a fish on a freshly generated path, starting at the path's
    /// beginning. Returns its index.
    pub fn spawn_fish(&mut self, kind: ModelKind, config: &FishConfig) -> usize {
        let index = self.fish.len();
        let curve = Curve::Swim(self.paths.generate(&self.tank, index));
        let position = curve.point(0.0);

        let body = self
            .world
            .add_fish_body(position, config.radius, config.mass, Material::WATER_CONTACT);
        let node = SceneNode::new(kind)
            .with_position(position)
            .with_scale(config.scale)
            .with_tint(hex_to_rgb(config.color));

        let speed = config.speed.clamp(MIN_SPEED, MAX_SPEED);
        self.fish.push(FishAgent {
            index,
            name: format!("Fish {}", index + 1),
            body,
            radius: config.radius,
            t: 0.0,
            speed,
            curve,
            node,
            animation: AnimationState::new(self.rng.gen_range(0.0..TAU)),
        });
        tracing::debug!(index, ?kind, speed, "spawned fish");
        index
    }

    /// Add a static prop. Unsupported collider shapes leave it visual only.
    pub fn add_prop(&mut self, kind: ModelKind, config: &PropConfig) {
        let position = config.position_vec();
        let rotation = config.rotation_quat();

        let shape = config.collider.as_ref().and_then(|c| match c.shape.as_str() {
            "box" => Some(StaticShape::Cuboid(Vec3::from_array(c.size) * 0.5)),
            "sphere" => Some(StaticShape::Ball(c.size[0] * 0.5)),
            other => {
                tracing::warn!(prop = %config.name, shape = other, "unknown collider shape, prop is visual only");
                None
            }
        });
        let body = shape.map(|shape| {
            self.world
                .add_static_body(shape, position, rotation, Material::WATER_CONTACT)
        });

        let node = SceneNode::new(kind)
            .with_position(position)
            .with_rotation(rotation)
            .with_scale(config.scale)
            .with_tint(hex_to_rgb(config.color));

        self.props.push(Prop {
            name: config.name.clone(),
            node,
            body,
        });
    }

    /// Advance the simulation by one rendered frame.
    ///
    /// Physics runs first, then every fish is steered, turned and synced to
    /// its body in roster order. A fish that fails is logged and skipped; the
    /// rest of the frame still runs.
    pub fn frame(&mut self, tuning: &Tuning, elapsed: f32, delta: f32) -> FrameReport {
        let mut report = FrameReport {
            substeps: self.world.step(delta, tuning.physics.gravity_vec()),
            ..Default::default()
        };

        for agent in &mut self.fish {
            agent.animation.advance(delta, agent.speed);

            let step = locomotion::step(
                agent,
                &mut self.world,
                elapsed,
                delta,
                tuning.physics.gravity,
                &self.locomotion,
                &mut self.rng,
            );
            match step {
                Ok(step) => {
                    agent.node.position = step.position;
                    if delta > 0.0 {
                        orientation::step(agent, step.position, &self.orientation);
                    }
                    if step.nudge.is_some() {
                        report.nudges += 1;
                    }
                    report.updated += 1;
                }
                Err(e) => {
                    tracing::warn!(fish = agent.index, error = %e, "skipping fish this frame");
                    report.skipped += 1;
                }
            }
        }

        for prop in &mut self.props {
            if let Some(position) = prop.body.and_then(|b| self.world.position(b)) {
                prop.node.position = position;
            }
        }

        report
    }

    pub fn tank(&self) -> &Tank {
        &self.tank
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn fish(&self) -> &[FishAgent] {
        &self.fish
    }

    /// Mutable access for live tuning of speed and scale.
    pub fn fish_mut(&mut self) -> &mut [FishAgent] {
        &mut self.fish
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    pub fn locomotion_mut(&mut self) -> &mut LocomotionParams {
        &mut self.locomotion
    }

    pub fn orientation_mut(&mut self) -> &mut OrientationParams {
        &mut self.orientation
    }

    /// Every visible node, fish first.
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.fish
            .iter()
            .map(|f| &f.node)
            .chain(self.props.iter().map(|p| &p.node))
    }

    /// Nodes paired with their swim phase, `None` for props.
    pub fn drawables(&self) -> impl Iterator<Item = (&SceneNode, Option<f32>)> {
        self.fish
            .iter()
            .map(|f| (&f.node, Some(f.animation.phase)))
            .chain(self.props.iter().map(|p| (&p.node, None)))
    }
}
