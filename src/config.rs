//! Aquarium configuration.
//!
//! An [`AquariumConfig`] describes everything needed to build a scene: the
//! tank, the fish roster, static props and the initial [`Tuning`]. It can be
//! saved to and loaded from JSON. Every section except `tank` is optional
//! and falls back to the built-in defaults.

use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locomotion::LocomotionParams;
use crate::orientation::OrientationParams;
use crate::tank::Tank;

/// Complete aquarium description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AquariumConfig {
    pub tank: Tank,
    #[serde(default)]
    pub fish: Vec<FishConfig>,
    #[serde(default)]
    pub props: Vec<PropConfig>,
    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub locomotion: LocomotionParams,
    #[serde(default)]
    pub orientation: OrientationParams,
    /// Seed for swim paths and anti-stall nudges.
    #[serde(default)]
    pub seed: u64,
}

impl Default for AquariumConfig {
    fn default() -> Self {
        let tank = Tank::default();
        Self {
            fish: default_roster(),
            props: default_props(&tank),
            tank,
            tuning: Tuning::default(),
            locomotion: LocomotionParams::default(),
            orientation: OrientationParams::default(),
            seed: 0,
        }
    }
}

impl AquariumConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse and validate a configuration. Tank errors surface as
    /// [`ConfigError::Json`] since the tank validates while deserializing.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fish roster for values the physics cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, fish) in self.fish.iter().enumerate() {
            let reason = if !(fish.mass.is_finite() && fish.mass > 0.0) {
                Some("mass must be positive")
            } else if !(fish.radius.is_finite() && fish.radius > 0.0) {
                Some("radius must be positive")
            } else if !(fish.speed.is_finite() && fish.speed > 0.0) {
                Some("speed must be positive")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(ConfigError::InvalidFish { index, reason });
            }
        }
        Ok(())
    }
}

/// One fish in the roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FishConfig {
    pub model: String,
    #[serde(default = "default_one")]
    pub scale: f32,
    #[serde(default = "default_one")]
    pub speed: f32,
    /// Packed `0xRRGGBB` tint.
    #[serde(default = "default_tint")]
    pub color: u32,
    /// Collider radius.
    #[serde(default = "default_one")]
    pub radius: f32,
    #[serde(default = "default_one")]
    pub mass: f32,
}

impl FishConfig {
    pub fn new(model: &str, scale: f32, speed: f32, color: u32) -> Self {
        Self {
            model: model.into(),
            scale,
            speed,
            color,
            radius: 1.0,
            mass: 1.0,
        }
    }
}

/// A static scene element: seabed, plants, flowers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropConfig {
    pub name: String,
    pub model: String,
    #[serde(default = "default_one")]
    pub scale: f32,
    #[serde(default)]
    pub position: [f32; 3],
    /// XYZ Euler angles in radians.
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "default_tint")]
    pub color: u32,
    /// Optional physics collider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider: Option<ColliderConfig>,
}

impl PropConfig {
    pub fn rotation_quat(&self) -> Quat {
        let [x, y, z] = self.rotation;
        Quat::from_euler(EulerRot::XYZ, x, y, z)
    }

    pub fn position_vec(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Collider attached to a prop.
///
/// `shape` is kept as a string so files with unsupported shapes still load;
/// those props become visual only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColliderConfig {
    /// `"box"` or `"sphere"`.
    pub shape: String,
    /// Full box size, or sphere diameter in `x`.
    pub size: [f32; 3],
}

/// Live-tunable global settings. Read by the step loop and the renderer
/// every frame; written by the tuning panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub lighting: Lighting,
    pub post: PostProcess,
    pub paused: bool,
    pub time_scale: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            physics: PhysicsTuning::default(),
            lighting: Lighting::default(),
            post: PostProcess::default(),
            paused: false,
            time_scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Vertical gravity, m/s².
    pub gravity: f32,
    /// Exposed for tuning but not used by the swimming forces, which derive
    /// buoyancy from gravity.
    pub buoyancy: f32,
}

impl PhysicsTuning {
    pub fn gravity_vec(&self) -> Vec3 {
        Vec3::new(0.0, self.gravity, 0.0)
    }
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            gravity: -9.82,
            buoyancy: 15.0,
        }
    }
}

/// A colour plus an intensity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightColor {
    pub color: u32,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    pub ambient: LightColor,
    pub directional: LightColor,
    pub directional_position: [f32; 3],
    pub spot: LightColor,
    pub spot_position: [f32; 3],
    /// Cone half-angle in radians.
    pub spot_angle: f32,
    /// Fraction of the cone that fades out, 0 to 1.
    pub spot_penumbra: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: LightColor {
                color: 0xffffff,
                intensity: 0.3,
            },
            directional: LightColor {
                color: 0xffffff,
                intensity: 0.2,
            },
            directional_position: [0.0, 20.0, 10.0],
            spot: LightColor {
                color: 0xffffff,
                intensity: 1.0,
            },
            spot_position: [0.0, 30.0, 0.0],
            spot_angle: PI / 8.0,
            spot_penumbra: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcess {
    pub bloom_strength: f32,
    pub bloom_threshold: f32,
    pub bloom_radius: f32,
    pub vignette: f32,
    /// Clear colour, `0xRRGGBB`.
    pub background: u32,
}

impl Default for PostProcess {
    fn default() -> Self {
        Self {
            bloom_strength: 0.4,
            bloom_threshold: 0.85,
            bloom_radius: 0.4,
            vignette: 0.3,
            background: 0x001144,
        }
    }
}

fn default_one() -> f32 {
    1.0
}

fn default_tint() -> u32 {
    0xffffff
}

/// The built-in school: three small fish and two groupers.
pub fn default_roster() -> Vec<FishConfig> {
    vec![
        FishConfig::new("./models/fish.glb", 1.3, 0.6, 0xffa500),
        FishConfig::new("./models/fish.glb", 1.3, 0.7, 0x0000ff),
        FishConfig::new("./models/fish.glb", 1.3, 2.0, 0xff0000),
        FishConfig::new("./models/CoralGrouper.glb", 1.3, 0.8, 0xff4500),
        FishConfig::new("./models/CoralGrouper.glb", 1.3, 1.2, 0xda70d6),
    ]
}

/// The built-in decoration, placed relative to the tank's floor and surface.
pub fn default_props(tank: &Tank) -> Vec<PropConfig> {
    let half_y = tank.half_extents().y;
    let prop = |name: &str, model: &str, scale: f32, position: [f32; 3], rotation: [f32; 3], color: u32| {
        PropConfig {
            name: name.into(),
            model: model.into(),
            scale,
            position,
            rotation,
            color,
            collider: None,
        }
    };

    vec![
        prop("see_bed", "./models/see_bed.glb", 1.0, [0.0, -half_y, 0.0], [0.0; 3], 0xc2b280),
        prop("lotus_a", "./models/lotus_flower.glb", 2.0, [5.0, half_y - 1.0, 10.0], [-PI / 2.0, 0.0, 0.0], 0xff69b4),
        prop("lotus_b", "./models/lotus_flower.glb", 1.5, [-8.0, half_y - 0.8, -12.0], [-PI / 2.0, PI / 3.0, 0.0], 0x8a2be2),
        PropConfig {
            collider: Some(ColliderConfig {
                shape: "box".into(),
                size: [8.0, 14.0, 8.0],
            }),
            ..prop("monster_plant", "./models/monster_plant.glb", 15.0, [0.0, -half_y + 7.0, 0.0], [0.0, PI / 4.0, 0.0], 0x8b0000)
        },
        prop("kelp_cluster_a", "./models/Trees.glb", 12.0, [18.0, -half_y, -20.0], [0.0, PI / 6.0, 0.0], 0x2e8b57),
        prop("kelp_cluster_b", "./models/Trees.glb", 10.0, [-15.0, -half_y, 15.0], [0.0, -PI / 5.0, 0.0], 0x3cb371),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let config = AquariumConfig::default();
        assert_eq!(config.fish.len(), 5);
        let speeds: Vec<f32> = config.fish.iter().map(|f| f.speed).collect();
        assert_eq!(speeds, vec![0.6, 0.7, 2.0, 0.8, 1.2]);
        assert!(config.fish.iter().all(|f| f.scale == 1.3));
        assert_eq!(config.props.len(), 6);
        assert_eq!(
            config.props.iter().filter(|p| p.collider.is_some()).count(),
            1
        );
    }

    #[test]
    fn test_default_tuning() {
        let tuning = Tuning::default();
        assert_eq!(tuning.physics.gravity, -9.82);
        assert_eq!(tuning.physics.buoyancy, 15.0);
        assert_eq!(tuning.lighting.spot_angle, PI / 8.0);
        assert_eq!(tuning.post.background, 0x001144);
        assert!(!tuning.paused);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AquariumConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let loaded = AquariumConfig::from_json(&json).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{
            "tank": { "extents": [30.0, 20.0, 30.0] },
            "fish": [ { "model": "fish.glb" } ]
        }"#;
        let config = AquariumConfig::from_json(json).unwrap();
        assert_eq!(config.fish.len(), 1);
        assert_eq!(config.fish[0].speed, 1.0);
        assert_eq!(config.fish[0].color, 0xffffff);
        assert!(config.props.is_empty());
        assert_eq!(config.tuning, Tuning::default());
        assert_eq!(config.locomotion, LocomotionParams::default());
    }

    #[test]
    fn test_invalid_tank_rejected() {
        let json = r#"{ "tank": { "extents": [30.0, 0.0, 30.0] } }"#;
        assert!(matches!(
            AquariumConfig::from_json(json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_fish_rejected() {
        let json = r#"{
            "tank": { "extents": [30.0, 20.0, 30.0] },
            "fish": [ { "model": "fish.glb" }, { "model": "fish.glb", "mass": 0.0 } ]
        }"#;
        assert!(matches!(
            AquariumConfig::from_json(json),
            Err(ConfigError::InvalidFish { index: 1, .. })
        ));
    }

    #[test]
    fn test_non_positive_speed_rejected() {
        for speed in [0.0, -1.0, f32::NAN] {
            let mut config = AquariumConfig::default();
            config.fish[2].speed = speed;
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidFish { index: 2, .. })),
                "speed {} accepted",
                speed
            );
        }

        let mut config = AquariumConfig::default();
        config.fish[2].speed = 0.05;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("aquarium-config-{}.json", std::process::id()));
        let mut config = AquariumConfig::default();
        config.seed = 1234;
        config.save(&path).unwrap();
        let loaded = AquariumConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_prop_rotation() {
        let props = default_props(&Tank::default());
        let lotus = &props[1];
        let up = lotus.rotation_quat() * Vec3::Y;
        // Rotated -90° about X: local up now faces -Z.
        assert!((up - Vec3::NEG_Z).length() < 1e-5, "{:?}", up);
    }
}
