// Tick inputs - the per-tick randomness tuple supplied by the driver
// Every in-tick decision is a pure function of this tuple, so a recorded
// tuple replays to identical events, velocities included

use std::f64::consts::TAU;

/// Three uniform draws in [0, 1) consumed by one player tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    /// Resolved against the function-choice (or looper state-choice) table
    pub func: f64,
    /// Primary choice: pitch position, jump target
    pub primary: f64,
    /// Secondary choice: second pitch position, duration draw
    pub secondary: f64,
}

impl TickInputs {
    pub fn new(func: f64, primary: f64, secondary: f64) -> Self {
        debug_assert!((0.0..1.0).contains(&func));
        debug_assert!((0.0..1.0).contains(&primary));
        debug_assert!((0.0..1.0).contains(&secondary));
        Self {
            func,
            primary,
            secondary,
        }
    }

    /// Gaussian note-on velocity for this tick
    ///
    /// Box-Muller over tuple-derived uniforms: `1 - func` keeps the log
    /// argument in (0, 1]. Unclamped and unscaled; the caller applies the
    /// volume multiplier and the 0-127 range.
    pub fn velocity_gauss(&self, mean: f64, std_dev: f64) -> f64 {
        let u1 = 1.0 - self.func;
        let u2 = self.secondary;
        let radius = (-2.0 * u1.ln()).sqrt();
        mean + std_dev * radius * (TAU * u2).cos()
    }
}

/// Split a uniform draw over `n` buckets into (index, remainder)
///
/// `index = floor(r * n)` and the remainder is again uniform in [0, 1),
/// reusable for a further draw.
pub fn split(r: f64, n: usize) -> (usize, f64) {
    debug_assert!(n > 0, "cannot split a draw over zero buckets");
    let scaled = r * n as f64;
    let index = (scaled as usize).min(n - 1);
    (index, scaled - index as f64)
}
