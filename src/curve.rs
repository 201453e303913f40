//! Closed swim paths.
//!
//! Each fish follows its own [`SwimPath`], a looping Lissajous-style curve
//! randomized inside the tank's safe box. The locomotion and orientation
//! controllers only ever call [`ParametricCurve::point`].

use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::tank::Tank;

/// Fraction of the safe half-extent used for the x and z radii.
pub const RADIUS_XZ_RANGE: RangeInclusive<f32> = 0.3..=0.8;
/// Fraction of the safe half-height used for the vertical amplitude.
pub const RADIUS_Y_RANGE: RangeInclusive<f32> = 0.3..=0.7;
/// Uniform path scale.
pub const SCALE_RANGE: RangeInclusive<f32> = 0.8..=1.0;
/// Fraction of the safe half-height used for the vertical centre.
pub const Y_OFFSET_RANGE: RangeInclusive<f32> = -0.8..=0.8;
/// Horizontal angular frequency.
pub const FREQ_XZ_RANGE: RangeInclusive<f32> = 0.7..=1.3;
/// Vertical angular frequency.
pub const FREQ_Y_RANGE: RangeInclusive<f32> = 0.8..=2.0;
/// Fraction of the safe half-extent used for the horizontal centre.
pub const OFFSET_XZ_RANGE: RangeInclusive<f32> = -0.2..=0.2;

/// Flattens the vertical bob relative to the horizontal loop.
pub const VERTICAL_DAMPING: f32 = 0.4;

/// Largest |y| of any path, as a multiple of the safe half-height.
pub const VERTICAL_ENVELOPE: f32 = 0.7 * VERTICAL_DAMPING + 0.8;

/// A looping path parameterized over `t` in `[0, 1)`.
///
/// Implementations must be periodic with period 1: `point(t) == point(t + 1)`.
/// Periodic does not mean continuous at the seam. A [`SwimPath`] with a
/// non-integer frequency has `point(1 - ε)` away from `point(0)`, so the
/// target jumps once per lap and the fish's thrust absorbs it.
pub trait ParametricCurve {
    /// Point on the curve at parameter `t`.
    fn point(&self, t: f32) -> Vec3;
}

/// Randomized looping swim path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwimPath {
    pub scale: f32,
    pub y_offset: f32,
    pub freq_xz: f32,
    pub freq_y: f32,
    pub radius: Vec3,
    pub offset_x: f32,
    pub offset_z: f32,
}

impl ParametricCurve for SwimPath {
    fn point(&self, t: f32) -> Vec3 {
        let angle = TAU * wrap_unit(t);
        let xz = angle * self.freq_xz;
        Vec3::new(
            xz.sin() * self.radius.x * self.scale + self.offset_x,
            (angle * self.freq_y).sin() * self.radius.y * VERTICAL_DAMPING + self.y_offset,
            xz.cos() * self.radius.z * self.scale + self.offset_z,
        )
    }
}

/// A curve that stays at one point. Useful for parking a fish.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fixed(pub Vec3);

impl ParametricCurve for Fixed {
    fn point(&self, _t: f32) -> Vec3 {
        self.0
    }
}

/// Any curve a fish can follow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Curve {
    Swim(SwimPath),
    Fixed(Fixed),
}

impl ParametricCurve for Curve {
    fn point(&self, t: f32) -> Vec3 {
        match self {
            Curve::Swim(path) => path.point(t),
            Curve::Fixed(fixed) => fixed.point(t),
        }
    }
}

impl From<SwimPath> for Curve {
    fn from(path: SwimPath) -> Self {
        Curve::Swim(path)
    }
}

impl From<Fixed> for Curve {
    fn from(fixed: Fixed) -> Self {
        Curve::Fixed(fixed)
    }
}

/// Produces one [`SwimPath`] per fish.
///
/// Paths are reproducible: the same seed and index give the same path.
#[derive(Clone, Copy, Debug)]
pub struct PathGenerator {
    seed: u64,
}

impl PathGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generate the path for fish `index` inside `tank`.
    pub fn generate(&self, tank: &Tank, index: usize) -> SwimPath {
        let stream = (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = SmallRng::seed_from_u64(self.seed ^ stream);
        let safe = tank.safe_half_extents();

        let path = SwimPath {
            radius: Vec3::new(
                rng.gen_range(RADIUS_XZ_RANGE) * safe.x,
                rng.gen_range(RADIUS_Y_RANGE) * safe.y,
                rng.gen_range(RADIUS_XZ_RANGE) * safe.z,
            ),
            scale: rng.gen_range(SCALE_RANGE),
            y_offset: rng.gen_range(Y_OFFSET_RANGE) * safe.y,
            freq_xz: rng.gen_range(FREQ_XZ_RANGE),
            freq_y: rng.gen_range(FREQ_Y_RANGE),
            offset_x: rng.gen_range(OFFSET_XZ_RANGE) * safe.x,
            offset_z: rng.gen_range(OFFSET_XZ_RANGE) * safe.z,
        };

        tracing::debug!(index, ?path, "generated swim path");
        path
    }
}

/// Wrap a path parameter into `[0, 1)`.
#[inline]
pub fn wrap_unit(t: f32) -> f32 {
    let wrapped = t.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
