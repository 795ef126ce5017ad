//! Hover classification over the wafer and tooltip placement.
//!
//! Classification works on an *approximate* disc anchored at the wafer's
//! drawn center, independent of the animated pose, so a slowly drifting
//! wafer does not make the tooltip flicker between zones.

use crate::types::Bounds;

/// Annular (plus two special-cased) regions of the wafer a pointer can
/// rest on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaferZone {
    Die,
    Exclusion,
    Bevel,
    Notch,
    Pcm,
}

impl WaferZone {
    pub fn title(self) -> &'static str {
        match self {
            WaferZone::Die => "Active Die",
            WaferZone::Exclusion => "Edge Exclusion Zone",
            WaferZone::Bevel => "Wafer Bevel",
            WaferZone::Notch => "Crystal Orientation Notch",
            WaferZone::Pcm => "Process Control Monitor (PCM)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WaferZone::Die => {
                "Each die holds a complete integrated circuit — standard-cell logic, \
                 SRAM cache, I/O pad ring, and analog IP. After probe test and \
                 diamond-saw dicing, each good die is packaged into a finished chip."
            }
            WaferZone::Exclusion => {
                "A ~3 mm ring of bare silicon where no dies are placed. Spin-coat \
                 uniformity, CVD film thickness, and CMP removal rate all degrade \
                 near the wafer bevel."
            }
            WaferZone::Bevel => {
                "The chamfered and polished edge of the 300 mm monocrystalline \
                 silicon substrate. The SEMI-standard 22° bevel prevents \
                 micro-fractures during FOUP handling."
            }
            WaferZone::Notch => {
                "Semicircular cut indicating the \u{27E8}110\u{27E9} crystal plane of \
                 the silicon. The lithography stepper uses this for sub-0.001° \
                 rotational alignment before each exposure."
            }
            WaferZone::Pcm => {
                "Test structures for in-line SPC — Kelvin resistors, MOS capacitors, \
                 ring oscillators, and alignment verniers measure Vt, Rs, Tox, and \
                 overlay accuracy."
            }
        }
    }
}

/// Zone boundaries as fractions of the approximate wafer radius.
///
/// Boundaries are inclusive toward the outer zone: a pointer exactly on
/// `bevel_min` reads as bevel, not exclusion. Only `hide_beyond` is
/// exclusive on the inside (a pointer exactly there still classifies).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneThresholds {
    pub hide_beyond: f32,
    pub bevel_min: f32,
    pub exclusion_min: f32,
    pub pcm_max: f32,
    pub notch_min: f32,
    pub notch_descent: f32,
    pub notch_half_width: f32,
    pub shell_radius_factor: f32,
    pub min_shell_radius: f32,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            hide_beyond: 1.08,
            bevel_min: 0.96,
            exclusion_min: 0.86,
            pcm_max: 0.10,
            notch_min: 0.82,
            notch_descent: 0.7,
            notch_half_width: 0.18,
            shell_radius_factor: 0.47,
            min_shell_radius: 40.0,
        }
    }
}

impl ZoneThresholds {
    /// Classifies an offset from the disc center, given the approximate
    /// radius. `None` means the pointer is off the wafer (or the disc is
    /// too small to bother).
    pub fn classify(&self, dx: f32, dy: f32, radius: f32) -> Option<WaferZone> {
        if radius < self.min_shell_radius {
            return None;
        }
        let n = (dx * dx + dy * dy).sqrt() / radius;
        if n > self.hide_beyond {
            return None;
        }

        let bottom =
            dy >= radius * self.notch_descent && dx.abs() < radius * self.notch_half_width;
        Some(if bottom && n >= self.notch_min {
            WaferZone::Notch
        } else if n >= self.bevel_min {
            WaferZone::Bevel
        } else if n >= self.exclusion_min {
            WaferZone::Exclusion
        } else if n < self.pcm_max {
            WaferZone::Pcm
        } else {
            WaferZone::Die
        })
    }
}

/// Ties thresholds to the surface geometry and classifies cursor
/// positions.
#[derive(Debug, Clone, Copy)]
pub struct ZoneLocator {
    thresholds: ZoneThresholds,
}

impl ZoneLocator {
    pub fn new(thresholds: ZoneThresholds) -> Self {
        Self { thresholds }
    }

    /// Classifies a cursor position in surface coordinates. The anchor is
    /// the wafer's drawn center, not the surface midpoint; the compositor
    /// biases the disc toward one side of wide surfaces.
    pub fn locate(&self, cursor: (f32, f32), bounds: &Bounds) -> Option<WaferZone> {
        let (cx, cy) = bounds.center();
        let radius = bounds.width.min(bounds.height) * self.thresholds.shell_radius_factor;
        self.thresholds
            .classify(cursor.0 - cx, cursor.1 - cy, radius)
    }
}

/// Cursor offset of the tooltip anchor.
pub const TOOLTIP_OFFSET: (f32, f32) = (20.0, 16.0);
/// Assumed tooltip extent used for viewport-edge flipping.
pub const TOOLTIP_EXTENT: (f32, f32) = (280.0, 120.0);

/// What [`Tooltip::update`] changed, so the host only touches its output
/// surface when needed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TooltipEvent {
    Unchanged,
    Moved {
        position: (f32, f32),
    },
    ZoneChanged {
        zone: WaferZone,
        position: (f32, f32),
    },
    Hidden,
}

/// Tracks the currently shown zone and computes anchor placement.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tooltip {
    current: Option<WaferZone>,
}

impl Tooltip {
    pub fn current(&self) -> Option<WaferZone> {
        self.current
    }

    /// Folds a classification result into tooltip state. `viewport` is the
    /// area the tooltip must stay inside.
    pub fn update(
        &mut self,
        zone: Option<WaferZone>,
        cursor: (f32, f32),
        viewport: (f32, f32),
    ) -> TooltipEvent {
        match zone {
            None => {
                if self.current.take().is_some() {
                    TooltipEvent::Hidden
                } else {
                    TooltipEvent::Unchanged
                }
            }
            Some(zone) => {
                let position = Self::place(cursor, viewport);
                if self.current == Some(zone) {
                    TooltipEvent::Moved { position }
                } else {
                    self.current = Some(zone);
                    TooltipEvent::ZoneChanged { zone, position }
                }
            }
        }
    }

    /// Anchors below-right of the cursor, flipping to the other side when
    /// the assumed extent would leave the viewport.
    fn place(cursor: (f32, f32), viewport: (f32, f32)) -> (f32, f32) {
        let mut x = cursor.0 + TOOLTIP_OFFSET.0;
        let mut y = cursor.1 + TOOLTIP_OFFSET.1;
        if x + TOOLTIP_EXTENT.0 > viewport.0 {
            x = cursor.0 - TOOLTIP_EXTENT.0 - TOOLTIP_OFFSET.0 + 4.0;
        }
        if y + TOOLTIP_EXTENT.1 > viewport.1 {
            y = cursor.1 - TOOLTIP_EXTENT.1 - 10.0;
        }
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f32 = 300.0;

    fn classify(n: f32) -> Option<WaferZone> {
        // Horizontal ray: never inside the notch window.
        ZoneThresholds::default().classify(n * R, 0.0, R)
    }

    #[test]
    fn radial_bands_in_precedence_order() {
        assert_eq!(classify(0.0), Some(WaferZone::Pcm));
        assert_eq!(classify(0.05), Some(WaferZone::Pcm));
        assert_eq!(classify(0.5), Some(WaferZone::Die));
        assert_eq!(classify(0.9), Some(WaferZone::Exclusion));
        assert_eq!(classify(0.97), Some(WaferZone::Bevel));
        assert_eq!(classify(1.05), Some(WaferZone::Bevel));
        assert_eq!(classify(1.2), None);
    }

    #[test]
    fn boundaries_resolve_to_outer_zone() {
        assert_eq!(classify(0.96), Some(WaferZone::Bevel));
        assert_eq!(classify(0.86), Some(WaferZone::Exclusion));
        assert_eq!(classify(0.10), Some(WaferZone::Die));
        // hide_beyond itself still classifies.
        assert_eq!(classify(1.08), Some(WaferZone::Bevel));
    }

    #[test]
    fn notch_needs_bottom_window_and_distance() {
        let t = ZoneThresholds::default();
        // Straight down, far enough out.
        assert_eq!(t.classify(0.0, 0.9 * R, R), Some(WaferZone::Notch));
        // Same distance but sideways: bevel band instead.
        assert_eq!(t.classify(0.9 * R, 0.0, R), Some(WaferZone::Exclusion));
        // Bottom window but too close to center.
        assert_eq!(t.classify(0.0, 0.75 * R, R), Some(WaferZone::Die));
    }

    #[test]
    fn classification_is_total_over_the_disc() {
        let t = ZoneThresholds::default();
        for ix in -120..=120 {
            for iy in -120..=120 {
                let dx = ix as f32 / 100.0 * R;
                let dy = iy as f32 / 100.0 * R;
                let n = (dx * dx + dy * dy).sqrt() / R;
                let zone = t.classify(dx, dy, R);
                if n <= t.hide_beyond {
                    assert!(zone.is_some(), "unclassified point at n={n}");
                } else {
                    assert_eq!(zone, None);
                }
            }
        }
    }

    #[test]
    fn tiny_shell_suppresses_classification() {
        let t = ZoneThresholds::default();
        assert_eq!(t.classify(0.0, 0.0, 39.0), None);
        assert_eq!(t.classify(0.0, 0.0, 40.0), Some(WaferZone::Pcm));
    }

    #[test]
    fn locator_anchors_at_drawn_center() {
        let locator = ZoneLocator::new(ZoneThresholds::default());
        let bounds = Bounds::new(1280.0, 720.0);
        // The center the compositor draws at classifies as the PCM cluster.
        assert_eq!(
            locator.locate(bounds.center(), &bounds),
            Some(WaferZone::Pcm)
        );
        // The surface midpoint sits well left of the biased disc, out in
        // the die grid.
        assert_eq!(
            locator.locate((640.0, 360.0), &bounds),
            Some(WaferZone::Die)
        );
        assert_eq!(locator.locate((0.0, 0.0), &bounds), None);
    }

    #[test]
    fn tooltip_reports_zone_transitions() {
        let mut tooltip = Tooltip::default();
        let viewport = (1920.0, 1080.0);
        match tooltip.update(Some(WaferZone::Die), (100.0, 100.0), viewport) {
            TooltipEvent::ZoneChanged { zone, position } => {
                assert_eq!(zone, WaferZone::Die);
                assert_eq!(position, (120.0, 116.0));
            }
            other => panic!("expected ZoneChanged, got {other:?}"),
        }
        assert!(matches!(
            tooltip.update(Some(WaferZone::Die), (110.0, 100.0), viewport),
            TooltipEvent::Moved { .. }
        ));
        assert!(matches!(
            tooltip.update(None, (110.0, 100.0), viewport),
            TooltipEvent::Hidden
        ));
        assert!(matches!(
            tooltip.update(None, (110.0, 100.0), viewport),
            TooltipEvent::Unchanged
        ));
    }

    #[test]
    fn tooltip_flips_at_viewport_edges() {
        let mut tooltip = Tooltip::default();
        let viewport = (800.0, 600.0);
        let event = tooltip.update(Some(WaferZone::Bevel), (780.0, 580.0), viewport);
        let TooltipEvent::ZoneChanged { position, .. } = event else {
            panic!("expected ZoneChanged");
        };
        assert!(position.0 + TOOLTIP_EXTENT.0 <= viewport.0);
        assert!(position.1 + TOOLTIP_EXTENT.1 <= viewport.1);
    }
}
