//! Shared clock for the marching-dash connector animation.

/// Dash offset after `elapsed_ms` of animation. Negative so dashes flow
/// backwards along the path.
pub fn dash_offset(elapsed_ms: f64, speed_ms: f64, cycle: f64) -> f64 {
    -((elapsed_ms / speed_ms) % cycle)
}

/// Animation time sampled once per frame.
///
/// Paused time does not count, so every connector stops and resumes together.
#[derive(Debug, Clone, Default)]
pub struct AnimationClock {
    elapsed_ms: f64,
    last_sample: Option<f64>,
    paused: bool,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the host time `now_ms` and return the animation time.
    pub fn sample(&mut self, now_ms: f64) -> f64 {
        if let Some(last) = self.last_sample {
            if !self.paused {
                self.elapsed_ms += (now_ms - last).max(0.0);
            }
        }
        self.last_sample = Some(now_ms);
        self.elapsed_ms
    }

    /// Animation time at the last sample.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
