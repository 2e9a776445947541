use std::time::{Duration, Instant};

/// Timing of one rendered frame, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    pub elapsed: f32,
    pub delta: f32,
}

/// Frame clock: elapsed time since start and delta since the previous tick
pub struct Clock {
    start: Instant,
    last: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        FrameTime {
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            delta: delta.min(MAX_FRAME_DELTA).as_secs_f32(),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Long stalls (window drag, breakpoint) advance animation by at most this much
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);
