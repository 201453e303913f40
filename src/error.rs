//! Error types for the aquarium.
//!
//! Startup errors (configuration, GPU, window) are fatal. Asset and per-frame
//! errors are reported and the affected entity is skipped, so the frame loop
//! never stops because of a single fish.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Invalid tank dimensions.
#[derive(Debug, Clone, PartialEq)]
pub enum TankError {
    /// An extent is zero, negative or not finite.
    InvalidExtents([f32; 3]),
    /// Margin is negative or leaves no room on some axis.
    InvalidMargin { margin: f32, min_half_extent: f32 },
    /// Margin is too small to contain the vertical bob of a swim path.
    MarginTooSmall { margin: f32, required: f32 },
}

impl fmt::Display for TankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TankError::InvalidExtents(e) => {
                write!(f, "Tank extents must be finite and positive, got {:?}", e)
            }
            TankError::InvalidMargin { margin, min_half_extent } => write!(
                f,
                "Safety margin {} must be non-negative and smaller than the smallest half extent {}",
                margin, min_half_extent
            ),
            TankError::MarginTooSmall { margin, required } => write!(
                f,
                "Safety margin {} cannot contain vertical path excursion, need more than {}",
                margin, required
            ),
        }
    }
}

impl std::error::Error for TankError {}

/// A model could not be resolved by the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetError {
    /// No model is registered for this path.
    UnknownModel(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::UnknownModel(path) => write!(f, "Unknown model '{}'", path),
        }
    }
}

impl std::error::Error for AssetError {}

/// Errors that can occur while loading or saving a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write the file.
    Io(std::io::Error),
    /// Malformed JSON.
    Json(serde_json::Error),
    /// A fish entry has unusable physical properties.
    InvalidFish { index: usize, reason: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access config file: {}", e),
            ConfigError::Json(e) => write!(f, "Invalid config JSON: {}", e),
            ConfigError::InvalidFish { index, reason } => {
                write!(f, "Invalid fish entry {}: {}", index, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::InvalidFish { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}


/// A single agent failed to update this frame.
///
/// The step loop logs these and skips the agent until the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// The agent's rigid body is no longer in the physics world.
    MissingBody,
    /// Position or velocity contains NaN or infinity.
    NonFinite { position: [f32; 3], velocity: [f32; 3] },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::MissingBody => write!(f, "Rigid body missing from physics world"),
            FrameError::NonFinite { position, velocity } => write!(
                f,
                "Non-finite body state: position {:?}, velocity {:?}",
                position, velocity
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// Errors that can occur when running the viewer.
#[derive(Debug)]
pub enum ViewerError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            ViewerError::Window(e) => write!(f, "Failed to create window: {}", e),
            ViewerError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::EventLoop(e) => Some(e),
            ViewerError::Window(e) => Some(e),
            ViewerError::Gpu(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for ViewerError {
    fn from(e: winit::error::EventLoopError) -> Self {
        ViewerError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for ViewerError {
    fn from(e: winit::error::OsError) -> Self {
        ViewerError::Window(e)
    }
}

impl From<GpuError> for ViewerError {
    fn from(e: GpuError) -> Self {
        ViewerError::Gpu(e)
    }
}
