//! Simulation clock

/// Whole simulated seconds elapsed, bounded by the configured run length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    elapsed: u64,
    duration: u64,
}

impl SimClock {
    pub fn new(duration: u64) -> Self {
        Self {
            elapsed: 0,
            duration,
        }
    }

    /// Advance by one second and return the new tick
    pub fn tick(&mut self) -> u64 {
        self.elapsed += 1;
        self.elapsed
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}
