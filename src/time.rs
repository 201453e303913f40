//! Frame clock.
//!
//! [`Clock::update`] turns wall-clock time into the `(elapsed, delta)` pair
//! that [`Aquarium::frame`](crate::Aquarium::frame) consumes. Simulated time
//! is the running sum of scaled deltas, so pausing or changing the time
//! scale never makes `elapsed` jump.
//!
//! ```ignore
//! let mut clock = Clock::new();
//! loop {
//!     let (elapsed, delta) = clock.update();
//!     aquarium.frame(&tuning, elapsed, delta);
//! }
//! ```

use std::time::{Duration, Instant};

/// Longest wall-clock gap counted as one frame.
///
/// A window drag or a debugger break can stall the loop for seconds; the
/// physics accumulator caps catch-up anyway, but the path parameter would
/// still leap.
pub const MAX_FRAME_DELTA: f32 = 0.25;

const FPS_WINDOW: Duration = Duration::from_millis(500);

/// Frames per second averaged over a short window.
#[derive(Debug, Clone, Copy)]
struct FpsMeter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsMeter {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self, now: Instant) {
        self.frames += 1;
        let span = now.duration_since(self.window_start);
        if span >= FPS_WINDOW {
            self.fps = self.frames as f32 / span.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
        }
    }
}

/// Wall clock for the frame loop.
#[derive(Debug, Clone)]
pub struct Clock {
    last_tick: Instant,
    elapsed: f32,
    delta: f32,
    frames: u64,
    paused: bool,
    /// Replaces the measured delta for deterministic runs.
    fixed_delta: Option<f32>,
    time_scale: f32,
    meter: FpsMeter,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_tick: now,
            elapsed: 0.0,
            delta: 0.0,
            frames: 0,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            meter: FpsMeter::new(now),
        }
    }

    /// A clock that advances by exactly `delta` per update, whatever the
    /// wall clock says.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.set_fixed_delta(Some(delta));
        clock
    }

    /// Advance one frame and return `(elapsed, delta)`.
    ///
    /// While paused `delta` is zero and `elapsed` holds still.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let measured = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.frames += 1;
        self.meter.tick(now);

        self.delta = if self.paused {
            0.0
        } else {
            let raw = self.fixed_delta.unwrap_or(measured.min(MAX_FRAME_DELTA));
            raw * self.time_scale
        };
        self.elapsed += self.delta;

        (self.elapsed, self.delta)
    }

    /// Simulated seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Simulated seconds covered by the last update.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Updates since start, paused ones included.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.meter.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// `None` restores wall-clock timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.map(|d| d.max(0.0));
    }

    /// Multiplier on every delta. Negative values clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Start over from now. Fixed delta and time scale are kept.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_tick = now;
        self.elapsed = 0.0;
        self.delta = 0.0;
        self.frames = 0;
        self.paused = false;
        self.meter = FpsMeter::new(now);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
