//! Scene time sources.
//!
//! The compositor is a pure function of a millisecond timestamp, so tests
//! and still renders swap the monotonic clock for a fixed one.

use std::time::Instant;

pub trait Timebase {
    /// Milliseconds since the scene started.
    fn now_ms(&self) -> f32;
}

/// Wall-clock time relative to construction.
#[derive(Debug, Clone)]
pub struct Monotonic {
    origin: Instant,
}

impl Monotonic {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for Monotonic {
    fn default() -> Self {
        Self::new()
    }
}

impl Timebase for Monotonic {
    fn now_ms(&self) -> f32 {
        self.origin.elapsed().as_secs_f64() as f32 * 1_000.0
    }
}

/// Frozen timestamp for stills and tests.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub f32);

impl Timebase for Fixed {
    fn now_ms(&self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_advances() {
        let clock = Monotonic::new();
        let a = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(clock.now_ms() > a);
    }

    #[test]
    fn fixed_never_moves() {
        let clock = Fixed(1234.5);
        assert_eq!(clock.now_ms(), 1234.5);
        assert_eq!(clock.now_ms(), 1234.5);
    }
}
