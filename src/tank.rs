//! Tank volume.
//!
//! The tank is an axis-aligned box centred at the origin. Swim paths are
//! generated inside the *safe* box, which is the tank shrunk by a margin on
//! every side.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::curve::VERTICAL_ENVELOPE;
use crate::error::TankError;

/// Default tank extents (width, height, depth).
pub const DEFAULT_EXTENTS: Vec3 = Vec3::new(42.0, 25.0, 55.0);

/// Default inset between the tank walls and the swim paths.
pub const DEFAULT_MARGIN: f32 = 2.0;

/// Validated tank dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TankConfig", into = "TankConfig")]
pub struct Tank {
    extents: Vec3,
    margin: f32,
}

/// Serialized form of [`Tank`], validated on load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TankConfig {
    pub extents: [f32; 3],
    #[serde(default = "default_margin")]
    pub margin: f32,
}

fn default_margin() -> f32 {
    DEFAULT_MARGIN
}

impl Tank {
    /// Create a tank, checking that paths generated inside it stay inside it.
    pub fn new(extents: Vec3, margin: f32) -> Result<Self, TankError> {
        if !extents.is_finite() || extents.min_element() <= 0.0 {
            return Err(TankError::InvalidExtents(extents.to_array()));
        }

        let half = extents * 0.5;
        let min_half_extent = half.min_element();
        if !margin.is_finite() || margin < 0.0 || margin >= min_half_extent {
            return Err(TankError::InvalidMargin {
                margin,
                min_half_extent,
            });
        }

        // Vertical excursion reaches VERTICAL_ENVELOPE * (half.y - margin).
        // Staying below half.y needs margin > half.y * (E - 1) / E.
        let required = half.y * (VERTICAL_ENVELOPE - 1.0) / VERTICAL_ENVELOPE;
        if margin <= required {
            return Err(TankError::MarginTooSmall { margin, required });
        }

        Ok(Self { extents, margin })
    }

    /// Full extents (width, height, depth).
    #[inline]
    pub fn extents(&self) -> Vec3 {
        self.extents
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Half extents; the walls sit at `±half_extents()`.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        self.extents * 0.5
    }

    /// Half extents minus the safety margin.
    #[inline]
    pub fn safe_half_extents(&self) -> Vec3 {
        self.half_extents() - Vec3::splat(self.margin)
    }

    /// Whether `point` lies strictly inside the tank walls.
    pub fn contains(&self, point: Vec3) -> bool {
        point.abs().cmplt(self.half_extents()).all()
    }

    /// Whether a sphere of `radius` centred at `point` fits inside the walls,
    /// allowing `tolerance` of penetration.
    pub fn contains_sphere(&self, point: Vec3, radius: f32, tolerance: f32) -> bool {
        let limit = self.half_extents() - Vec3::splat(radius - tolerance);
        point.abs().cmple(limit).all()
    }
}

impl Default for Tank {
    fn default() -> Self {
        Self {
            extents: DEFAULT_EXTENTS,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl TryFrom<TankConfig> for Tank {
    type Error = TankError;

    fn try_from(config: TankConfig) -> Result<Self, Self::Error> {
        Tank::new(Vec3::from_array(config.extents), config.margin)
    }
}

impl From<Tank> for TankConfig {
    fn from(tank: Tank) -> Self {
        Self {
            extents: tank.extents.to_array(),
            margin: tank.margin,
        }
    }
}
