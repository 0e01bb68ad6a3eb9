use instant::{Duration, Instant};

/// Timing of one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous tick, clamped.
    pub dt: Duration,
    /// Time since the clock was created.
    pub elapsed: Duration,
    pub frame_index: u64,
}

/// Produces per-frame delta times for the render loop.
///
/// Delta time is clamped to `[dt_min, dt_max]` so a stall (window drag,
/// debugger) does not fling the camera across the scene.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts delta measurement, e.g. after the first frame was delayed by loading.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = self.clamp(now.saturating_duration_since(self.last));
        self.last = now;

        let time = FrameTime {
            dt,
            elapsed: now.saturating_duration_since(self.start),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        time
    }

    /// Number of ticks so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn clamp(&self, dt: Duration) -> Duration {
        dt.clamp(self.dt_min, self.dt_max)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
