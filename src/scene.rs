//! Renderer-facing scene description.
//!
//! Every visible entity owns one [`SceneNode`]. The simulation writes node
//! transforms; the viewer only reads them.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// Built-in mesh shapes the viewer knows how to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Slim, fast-looking fish.
    Fish,
    /// Deep-bodied reef fish.
    Grouper,
    /// Flat slab for the tank floor.
    Seabed,
    /// Tall bulky plant.
    Plant,
    /// Kelp cluster.
    Kelp,
    /// Floating flower disc.
    Lotus,
}

impl ModelKind {
    pub const ALL: [ModelKind; 6] = [
        ModelKind::Fish,
        ModelKind::Grouper,
        ModelKind::Seabed,
        ModelKind::Plant,
        ModelKind::Kelp,
        ModelKind::Lotus,
    ];

    /// Whether instances of this kind get a swim-cycle tail sway.
    pub fn is_swimmer(self) -> bool {
        matches!(self, ModelKind::Fish | ModelKind::Grouper)
    }
}

/// Resolves a model path from the configuration into something drawable.
///
/// Loading is a one-time bulk operation before the frame loop starts.
pub trait ModelLoader {
    fn load(&mut self, path: &str) -> Result<ModelKind, AssetError>;
}

/// Maps model file names onto the built-in procedural meshes.
///
/// The file stem decides the shape, so `models/CoralGrouper.glb` and
/// `grouper` both resolve to [`ModelKind::Grouper`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinModels;

impl ModelLoader for BuiltinModels {
    fn load(&mut self, path: &str) -> Result<ModelKind, AssetError> {
        let stem = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(path)
            .to_ascii_lowercase();

        let kind = if stem.contains("grouper") {
            ModelKind::Grouper
        } else if stem.contains("fish") {
            ModelKind::Fish
        } else if stem.contains("bed") {
            ModelKind::Seabed
        } else if stem.contains("lotus") {
            ModelKind::Lotus
        } else if stem.contains("tree") || stem.contains("kelp") {
            ModelKind::Kelp
        } else if stem.contains("plant") {
            ModelKind::Plant
        } else {
            return Err(AssetError::UnknownModel(path.to_string()));
        };
        Ok(kind)
    }
}

/// Transform and appearance of one visible entity.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneNode {
    pub model: ModelKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    /// Reference "up" used when aiming the node.
    pub up: Vec3,
    /// Linear RGB tint.
    pub tint: Vec3,
}

impl SceneNode {
    pub fn new(model: ModelKind) -> Self {
        Self {
            model,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
            up: Vec3::Y,
            tint: Vec3::ONE,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_tint(mut self, tint: Vec3) -> Self {
        self.tint = tint;
        self
    }

    /// Local-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }
}

/// Swim-cycle playback for one fish.
///
/// The renderer turns `phase` into a tail sway; nothing in the simulation
/// reads it back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    /// Cycle position in radians, kept in `[0, TAU)`.
    pub phase: f32,
    /// Cycles per second at speed 1.
    pub rate: f32,
}

impl AnimationState {
    pub fn new(phase: f32) -> Self {
        Self { phase, rate: 1.5 }
    }

    /// Advance playback. Faster fish beat their tails faster.
    pub fn advance(&mut self, delta: f32, speed: f32) {
        let step = delta * self.rate * speed.max(0.0) * std::f32::consts::TAU;
        self.phase = (self.phase + step).rem_euclid(std::f32::consts::TAU);
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Convert a packed `0xRRGGBB` colour into linear RGB.
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    Vec3::new(channel(16), channel(8), channel(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_models_resolve_by_stem() {
        let mut loader = BuiltinModels;
        assert_eq!(loader.load("./models/fish.glb"), Ok(ModelKind::Fish));
        assert_eq!(loader.load("./models/CoralGrouper.glb"), Ok(ModelKind::Grouper));
        assert_eq!(loader.load("./models/see_bed.glb"), Ok(ModelKind::Seabed));
        assert_eq!(loader.load("./models/lotus_flower.glb"), Ok(ModelKind::Lotus));
        assert_eq!(loader.load("./models/monster_plant.glb"), Ok(ModelKind::Plant));
        assert_eq!(loader.load("./models/Trees.glb"), Ok(ModelKind::Kelp));
    }

    #[test]
    fn test_unknown_model_is_an_error() {
        let mut loader = BuiltinModels;
        assert_eq!(
            loader.load("./models/submarine.glb"),
            Err(AssetError::UnknownModel("./models/submarine.glb".into()))
        );
    }

    #[test]
    fn test_animation_wraps() {
        let mut anim = AnimationState::new(6.0);
        anim.advance(1.0, 1.0);
        assert!(anim.phase >= 0.0 && anim.phase < std::f32::consts::TAU);

        let before = anim.phase;
        anim.advance(0.0, 3.0);
        assert_eq!(anim.phase, before);
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb(0xff0000), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(hex_to_rgb(0x0000ff), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_node_matrix() {
        let node = SceneNode::new(ModelKind::Fish)
            .with_position(Vec3::new(1.0, 2.0, 3.0))
            .with_scale(2.0);
        let p = node.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }
}
