/// Minimum time between two flips of the shared stage bit.
pub const TOGGLE_DWELL_SECS: f64 = 1.0;

/// Metronome shared by every two-frame icon so they all blink in unison.
///
/// Advance it once per tick before updating animators; every toggle animator
/// then reads the same stage within that tick regardless of update order.
#[derive(Debug, Clone, Default)]
pub struct ToggleClock {
    stage: usize,
    last_toggle: f64,
    flips: u64,
}

impl ToggleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the stage if the dwell has elapsed since the last flip.
    pub fn advance(&mut self, now: f64) -> bool {
        if now - self.last_toggle >= TOGGLE_DWELL_SECS {
            self.stage = 1 - self.stage;
            self.last_toggle = now;
            self.flips += 1;
            true
        } else {
            false
        }
    }

    /// Index of the frame every toggle animator shows, 0 or 1.
    pub fn stage(&self) -> usize {
        self.stage
    }

    pub fn last_toggle(&self) -> f64 {
        self.last_toggle
    }

    pub fn flips(&self) -> u64 {
        self.flips
    }
}
