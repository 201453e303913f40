//! Orbit camera around the tank centre.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

/// Closest the camera may zoom in.
pub const MIN_DISTANCE: f32 = 10.0;
/// Farthest the camera may zoom out.
pub const MAX_DISTANCE: f32 = 200.0;
/// Starting eye position.
pub const START_POSITION: Vec3 = Vec3::new(0.0, 40.0, 70.0);

/// Keeps the camera off the poles where the view basis flips.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Orbit camera with damped rotation and zoom.
///
/// Input adds to a pending delta; each [`update`](Self::update) applies a
/// `damping` fraction of it and keeps the rest, so motion eases out after
/// the mouse stops.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub damping: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl OrbitCamera {
    /// Camera at `eye` looking at the origin.
    pub fn looking_from(eye: Vec3, aspect: f32) -> Self {
        let distance = eye.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let pitch = if eye.length() > 0.0 {
            (eye.y / eye.length()).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT)
        } else {
            0.0
        };
        Self {
            yaw: eye.x.atan2(eye.z),
            pitch,
            distance,
            target: Vec3::ZERO,
            fov_y: 60f32.to_radians(),
            aspect,
            damping: 0.05,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect.max(1e-3), 0.1, 5000.0)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Queue a rotation, in radians.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.pending_yaw += yaw;
        self.pending_pitch += pitch;
    }

    /// Queue a zoom. Positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_zoom += steps;
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Apply part of the queued motion. Call once per frame.
    pub fn update(&mut self) {
        let k = self.damping.clamp(0.0, 1.0);
        let (yaw, pitch, zoom) = if k > 0.0 {
            (self.pending_yaw * k, self.pending_pitch * k, self.pending_zoom * k)
        } else {
            (self.pending_yaw, self.pending_pitch, self.pending_zoom)
        };

        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.distance = (self.distance * (1.0 - zoom * 0.1)).clamp(MIN_DISTANCE, MAX_DISTANCE);

        self.pending_yaw -= yaw;
        self.pending_pitch -= pitch;
        self.pending_zoom -= zoom;
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_from(START_POSITION, 16.0 / 9.0)
    }
}
