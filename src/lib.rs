//! # Aquarium
//!
//! A physics-driven 3D aquarium. Each fish is a rigid body that chases a
//! point moving along its own closed swim path, so motion stays smooth and
//! physically plausible while the fish never leaves the tank.
//!
//! ## Quick Start
//!
//! ```ignore
//! use aquarium::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AquariumConfig::default();
//!     let aquarium = Aquarium::from_config(&config, &mut BuiltinModels);
//!     aquarium::run(aquarium, config.tuning)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Headless stepping
//!
//! The simulation does not need a window. Drive it with a [`time::Clock`]
//! or with fixed deltas:
//!
//! ```ignore
//! let mut aquarium = Aquarium::from_config(&config, &mut BuiltinModels);
//! let dt = 1.0 / 60.0;
//! for frame in 1..=300 {
//!     aquarium.frame(&config.tuning, frame as f32 * dt, dt);
//! }
//! ```
//!
//! ## Frame order
//!
//! Every frame runs, in order:
//!
//! 1. the physics world steps on a fixed 1/60 s timestep with catch-up,
//! 2. each fish gets buoyancy, wobble, path-following thrust and damping
//!    ([`locomotion`]),
//! 3. each fish turns toward where its path goes next ([`orientation`]),
//! 4. scene nodes are synced to their bodies.
//!
//! The tank is closed by six static planes ([`boundary`]) and every swim
//! path is generated inside the tank's safe region ([`curve`]).

mod app;
pub mod aquarium;
pub mod boundary;
pub mod config;
pub mod curve;
pub mod error;
pub mod fish;
pub mod gpu;
pub mod locomotion;
pub mod orientation;
pub mod physics;
pub mod scene;
pub mod tank;
pub mod time;
#[cfg(feature = "egui")]
mod ui;

pub use app::run;
pub use aquarium::{Aquarium, FrameReport, Prop};
pub use config::{AquariumConfig, FishConfig, PropConfig, Tuning};
pub use error::{AssetError, ConfigError, FrameError, GpuError, TankError, ViewerError};
pub use glam::{Quat, Vec3};
pub use tank::Tank;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::aquarium::{Aquarium, FrameReport};
    pub use crate::boundary::Boundary;
    pub use crate::config::{AquariumConfig, FishConfig, PropConfig, Tuning};
    pub use crate::curve::{Curve, ParametricCurve, PathGenerator};
    pub use crate::fish::FishAgent;
    pub use crate::locomotion::LocomotionParams;
    pub use crate::orientation::OrientationParams;
    pub use crate::physics::PhysicsWorld;
    pub use crate::scene::{BuiltinModels, ModelKind, ModelLoader, SceneNode};
    pub use crate::tank::Tank;
    pub use crate::time::Clock;
    pub use crate::{Quat, Vec3};
    #[cfg(feature = "egui")]
    pub use egui;
}
