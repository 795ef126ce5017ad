//! Pointer, scroll and idle-drift state feeding the per-frame pose.

use crate::profile::TierProfile;
use crate::types::Bounds;

/// Fixed wafer rotation (radians) while reduced motion is active.
pub const REDUCED_MOTION_ROTATION: f32 = -0.1;

/// Normalized pointer with eased follow-through.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub target: [f32; 2],
    pub current: [f32; 2],
}

impl PointerState {
    /// Sets the raw target; each axis is clamped to `[-1, 1]`.
    pub fn set_target(&mut self, x: f32, y: f32) {
        self.target = [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)];
    }

    pub fn clear(&mut self) {
        self.target = [0.0, 0.0];
    }

    /// Moves the current position toward the target by `ease` per frame;
    /// an ease of 1 snaps instantly.
    pub fn ease(&mut self, ease: f32) {
        for axis in 0..2 {
            self.current[axis] += (self.target[axis] - self.current[axis]) * ease;
        }
    }
}

/// Motion variables exported to the host on change (quantized, so a frame
/// without perceptible movement publishes nothing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleVars {
    pub pointer_x: f32,
    pub pointer_y: f32,
    pub scroll_progress: f32,
}

impl StyleVars {
    fn quantized(&self) -> (i32, i32, i32) {
        let q = |v: f32| (v * 10_000.0).round() as i32;
        (q(self.pointer_x), q(self.pointer_y), q(self.scroll_progress))
    }
}

/// Per-frame wafer placement, fully determined by time and motion state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePose {
    pub center: (f32, f32),
    /// Wafer rotation in radians.
    pub rotation: f32,
    /// Eased pointer position.
    pub pointer: (f32, f32),
    /// Reflection energy in `[0, 1]` driving specular intensity.
    pub refl_energy: f32,
    /// Idle drift offset in logical pixels.
    pub drift: (f32, f32),
    /// Idle drift rotation component in radians.
    pub drift_rot: f32,
}

/// Owns pointer/scroll/drift state and turns a timestamp into a pose.
#[derive(Debug, Clone)]
pub struct MotionModel {
    pub pointer: PointerState,
    scroll_progress: f32,
    drift_phase: f32,
    reduced_motion: bool,
    last_published: Option<(i32, i32, i32)>,
}

impl MotionModel {
    pub fn new(reduced_motion: bool) -> Self {
        Self::with_drift_phase(reduced_motion, rand::random::<f32>() * std::f32::consts::TAU)
    }

    /// Like [`MotionModel::new`] with an explicit drift phase, for stills
    /// and reproducible tests.
    pub fn with_drift_phase(reduced_motion: bool, drift_phase: f32) -> Self {
        Self {
            pointer: PointerState::default(),
            scroll_progress: 0.0,
            drift_phase,
            reduced_motion,
            last_published: None,
        }
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn scroll_progress(&self) -> f32 {
        self.scroll_progress
    }

    /// Recomputes scroll progress from the surface position within the
    /// viewport: 0 when the surface top sits a full viewport below the
    /// fold, 1 once it has scrolled a full surface height past the top.
    pub fn update_scroll(&mut self, surface_top: f32, surface_height: f32, viewport_height: f32) {
        let denom = (viewport_height + surface_height).max(1.0);
        self.scroll_progress = ((viewport_height - surface_top) / denom).clamp(0.0, 1.0);
    }

    /// Advances pointer easing and evaluates the pose at `t_ms`.
    pub fn pose(&mut self, t_ms: f32, bounds: &Bounds, profile: &TierProfile) -> FramePose {
        let ease = if self.reduced_motion {
            1.0
        } else {
            profile.pointer_ease
        };
        self.pointer.ease(ease);
        let [px, py] = self.pointer.current;

        let (drift, drift_rot, rotation, refl_energy) = if self.reduced_motion {
            ((0.0, 0.0), 0.0, REDUCED_MOTION_ROTATION, 0.5)
        } else {
            let scale = profile.drift_scale;
            let drift = (
                (t_ms * 0.000_11 + self.drift_phase).sin() * 4.5 * scale,
                (t_ms * 0.000_09 + self.drift_phase * 0.75).cos() * 2.8 * scale,
            );
            let drift_rot = (t_ms * 0.000_05 + self.drift_phase).sin() * 0.012 * scale;
            let rotation =
                t_ms * 0.000_032 + self.scroll_progress * 0.06 - 0.12 + drift_rot;
            let refl = ((t_ms * 0.000_55 + self.drift_phase).sin() + 1.0) * 0.5;
            (drift, drift_rot, rotation, refl)
        };

        // The placement offsets vanish entirely under reduced motion; the
        // pointer still feeds the film shear in the compositor.
        let motion = if self.reduced_motion { 0.0 } else { 1.0 };
        let (base_cx, base_cy) = bounds.center();
        FramePose {
            center: (
                base_cx + (px * 8.0 + drift.0) * motion,
                base_cy + (py * 6.0 - self.scroll_progress * 18.0 + drift.1) * motion,
            ),
            rotation,
            pointer: (px, py),
            refl_energy,
            drift,
            drift_rot,
        }
    }

    /// Current style variables, or `None` when nothing changed perceptibly
    /// since the last publication.
    pub fn take_style_vars(&mut self) -> Option<StyleVars> {
        let vars = StyleVars {
            pointer_x: self.pointer.target[0],
            pointer_y: self.pointer.target[1],
            scroll_progress: self.scroll_progress,
        };
        let key = vars.quantized();
        if self.last_published == Some(key) {
            return None;
        }
        self.last_published = Some(key);
        Some(vars)
    }
}
