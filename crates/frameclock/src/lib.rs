//! Frame pacing and suspension policy for the wafer scene.
//!
//! The clock decides *when* a frame may be drawn; it never draws anything
//! itself. The host event loop asks [`FrameClock::ready_for_frame`] before
//! requesting a redraw and reports back through [`FrameClock::mark_rendered`].
//! Suspension (off-screen surface, hidden document, reduced motion) and
//! resumption (visibility, qualifying input) are plain state transitions, so
//! the whole policy is unit-testable with injected instants.

use std::time::{Duration, Instant};

/// Minimum visible fraction of the surface before the loop suspends.
pub const MIN_VISIBLE_FRACTION: f32 = 0.01;

/// Redraw cadence cap while reduced motion is active.
pub const REDUCED_MOTION_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 6);

/// Paces the frame loop and tracks every reason it may be suspended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameClock {
    interval: Duration,
    reduced_motion: bool,
    running: bool,
    /// Re-entrancy guard: at most one frame request may be outstanding.
    redraw_pending: bool,
    /// A qualifying input arrived; draw at least once even while idle.
    forced_redraw: bool,
    /// Reduced motion was (re)activated; draw exactly one settled frame.
    settled_frame_due: bool,
    surface_visible: bool,
    document_hidden: bool,
    last_frame: Option<Instant>,
}

impl FrameClock {
    /// Creates a clock targeting `interval` between frames.
    ///
    /// Under reduced motion the loop never runs; instead a single settled
    /// frame is owed immediately.
    pub fn new(interval: Duration, reduced_motion: bool) -> Self {
        Self {
            interval,
            reduced_motion,
            running: !reduced_motion,
            redraw_pending: false,
            forced_redraw: false,
            settled_frame_due: reduced_motion,
            surface_visible: true,
            document_hidden: false,
            last_frame: None,
        }
    }

    /// Replaces the target frame interval (tier change) and restarts pacing.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        self.last_frame = None;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn eligible(&self) -> bool {
        self.surface_visible && !self.document_hidden && !self.reduced_motion
    }

    /// Starts the continuous loop if nothing suppresses it.
    pub fn start(&mut self) {
        if self.running || !self.eligible() {
            return;
        }
        tracing::debug!("frame loop resumed");
        self.running = true;
        self.last_frame = None;
    }

    /// Stops the continuous loop. Idempotent: stopping twice leaves the
    /// clock in the same state as stopping once.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        tracing::debug!("frame loop suspended");
        self.running = false;
        self.redraw_pending = false;
    }

    /// Reports the fraction of the surface currently on screen.
    pub fn set_visible_fraction(&mut self, fraction: f32) {
        let visible = fraction >= MIN_VISIBLE_FRACTION;
        if visible == self.surface_visible {
            return;
        }
        self.surface_visible = visible;
        if visible {
            self.forced_redraw = true;
            self.start();
        } else {
            self.stop();
        }
    }

    pub fn set_document_hidden(&mut self, hidden: bool) {
        if hidden == self.document_hidden {
            return;
        }
        self.document_hidden = hidden;
        if hidden {
            self.stop();
        } else {
            self.forced_redraw = true;
            self.start();
        }
    }

    /// Flips the reduced-motion preference. Activation stops the loop and
    /// owes one settled frame; deactivation resumes the loop if possible.
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if reduced == self.reduced_motion {
            return;
        }
        self.reduced_motion = reduced;
        if reduced {
            self.stop();
            self.settled_frame_due = true;
        } else {
            self.settled_frame_due = false;
            self.start();
        }
    }

    /// Records a qualifying input (pointer move, scroll, resize). Forces at
    /// least one redraw and restarts the loop where permitted.
    pub fn note_input(&mut self) {
        self.forced_redraw = true;
        if self.reduced_motion {
            self.settled_frame_due = true;
        } else {
            self.start();
        }
    }

    /// Whether a frame should be requested now. A `true` answer arms the
    /// pending-frame guard until [`FrameClock::mark_rendered`] is called.
    ///
    /// A hidden document draws nothing at all; forced and settled frames
    /// wait until it becomes visible again.
    pub fn ready_for_frame(&mut self, now: Instant) -> bool {
        if self.redraw_pending || self.document_hidden {
            return false;
        }

        let due = if self.settled_frame_due {
            self.elapsed(now, REDUCED_MOTION_INTERVAL)
        } else if self.forced_redraw {
            true
        } else {
            self.running && self.eligible() && self.elapsed(now, self.interval)
        };

        if due {
            self.redraw_pending = true;
        }
        due
    }

    /// Wall-clock deadline of the next scheduled frame, if the loop runs.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.redraw_pending || !(self.running && self.eligible()) {
            return None;
        }
        Some(match self.last_frame {
            Some(at) => at + self.interval,
            None => Instant::now(),
        })
    }

    /// Acknowledges that the pending frame was drawn.
    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
        self.redraw_pending = false;
        self.forced_redraw = false;
        self.settled_frame_due = false;
    }

    fn elapsed(&self, now: Instant, interval: Duration) -> bool {
        match self.last_frame {
            Some(at) => now.duration_since(at) >= interval,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(16);

    #[test]
    fn paces_to_interval() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        assert!(clock.ready_for_frame(t0));
        clock.mark_rendered(t0);

        // Too early: nothing due yet.
        assert!(!clock.ready_for_frame(t0 + Duration::from_millis(5)));
        assert!(clock.ready_for_frame(t0 + INTERVAL));
    }

    #[test]
    fn pending_guard_blocks_double_scheduling() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        assert!(clock.ready_for_frame(t0));
        assert!(!clock.ready_for_frame(t0));
        clock.mark_rendered(t0);
        assert!(clock.ready_for_frame(t0 + INTERVAL));
    }

    #[test]
    fn stop_is_idempotent() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let mut once = clock.clone();
        once.stop();
        let mut twice = clock.clone();
        twice.stop();
        twice.stop();
        assert_eq!(once, twice);
        clock.stop();
        clock.stop();
        assert_eq!(clock, once);
    }

    #[test]
    fn suspends_when_surface_leaves_viewport() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        clock.mark_rendered(t0);
        clock.set_visible_fraction(0.0);
        assert!(!clock.ready_for_frame(t0 + INTERVAL));
        assert!(clock.next_deadline().is_none());

        // Becoming visible forces an immediate redraw.
        clock.set_visible_fraction(0.5);
        assert!(clock.ready_for_frame(t0 + Duration::from_millis(1)));
    }

    #[test]
    fn suspends_on_hidden_document() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        clock.mark_rendered(t0);
        clock.set_document_hidden(true);
        assert!(!clock.ready_for_frame(t0 + INTERVAL * 4));
        clock.set_document_hidden(false);
        assert!(clock.ready_for_frame(t0 + INTERVAL * 4 + Duration::from_millis(1)));
    }

    #[test]
    fn reduced_motion_draws_exactly_one_frame() {
        let mut clock = FrameClock::new(INTERVAL, true);
        let t0 = Instant::now();
        assert!(clock.ready_for_frame(t0));
        clock.mark_rendered(t0);

        // No further frames without input, no matter how long we wait.
        assert!(!clock.ready_for_frame(t0 + Duration::from_secs(10)));
        assert!(clock.next_deadline().is_none());

        clock.note_input();
        assert!(clock.ready_for_frame(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn reduced_motion_input_rate_is_capped() {
        let mut clock = FrameClock::new(INTERVAL, true);
        let t0 = Instant::now();
        assert!(clock.ready_for_frame(t0));
        clock.mark_rendered(t0);

        clock.note_input();
        // Within the reduced-motion interval the settled frame is withheld.
        assert!(!clock.ready_for_frame(t0 + Duration::from_millis(10)));
        assert!(clock.ready_for_frame(t0 + REDUCED_MOTION_INTERVAL));
    }

    #[test]
    fn reduced_motion_toggle_restores_loop() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        clock.mark_rendered(t0);
        clock.set_reduced_motion(true);
        assert!(clock.ready_for_frame(t0 + REDUCED_MOTION_INTERVAL));
        clock.mark_rendered(t0 + REDUCED_MOTION_INTERVAL);
        assert!(!clock.ready_for_frame(t0 + Duration::from_secs(5)));

        clock.set_reduced_motion(false);
        assert!(clock.ready_for_frame(t0 + Duration::from_secs(5) + INTERVAL));
    }

    #[test]
    fn hidden_document_defers_input_redraws() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        clock.mark_rendered(t0);
        clock.set_document_hidden(true);
        clock.note_input();
        assert!(!clock.ready_for_frame(t0 + INTERVAL * 4));
        // The deferred redraw fires once the document is visible again.
        clock.set_document_hidden(false);
        assert!(clock.ready_for_frame(t0 + INTERVAL * 4));
    }

    #[test]
    fn input_forces_redraw_while_idle() {
        let mut clock = FrameClock::new(INTERVAL, false);
        let t0 = Instant::now();
        clock.mark_rendered(t0);
        clock.stop();
        assert!(!clock.ready_for_frame(t0 + INTERVAL));
        clock.note_input();
        assert!(clock.ready_for_frame(t0 + INTERVAL));
    }
}
