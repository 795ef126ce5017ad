//! Small tiny-skia helpers shared by the layer builders and compositor.
//!
//! Gradient constructors in tiny-skia reject degenerate geometry by
//! returning `None`; every helper here degrades to a transparent solid
//! shader instead so a pathological surface size cannot abort a frame.

use tiny_skia::{
    Color, GradientStop, IntSize, LinearGradient, Path, PathBuilder, Pixmap, Point, Shader,
    SpreadMode, Transform,
};

pub(crate) fn tint(r: u8, g: u8, b: u8, alpha: f32) -> Color {
    Color::from_rgba8(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

pub(crate) fn stops(entries: &[(f32, Color)]) -> Vec<GradientStop> {
    entries
        .iter()
        .map(|&(pos, color)| GradientStop::new(pos, color))
        .collect()
}

/// Like [`stops`] with every alpha multiplied by `alpha_scale`; canvas-style
/// "global alpha" for gradient fills.
pub(crate) fn faded_stops(entries: &[(f32, Color)], alpha_scale: f32) -> Vec<GradientStop> {
    entries
        .iter()
        .map(|&(pos, color)| {
            let mut c = color;
            c.set_alpha((c.alpha() * alpha_scale).clamp(0.0, 1.0));
            GradientStop::new(pos, c)
        })
        .collect()
}

/// Radial gradient from a focal point to a circle of `radius` around
/// `(cx, cy)`.
pub(crate) fn radial(
    fx: f32,
    fy: f32,
    cx: f32,
    cy: f32,
    radius: f32,
    stops: Vec<GradientStop>,
) -> Shader<'static> {
    tiny_skia::RadialGradient::new(
        Point::from_xy(fx, fy),
        Point::from_xy(cx, cy),
        radius,
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(Color::TRANSPARENT))
}

pub(crate) fn linear(
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    stops: Vec<GradientStop>,
) -> Shader<'static> {
    LinearGradient::new(
        Point::from_xy(x0, y0),
        Point::from_xy(x1, y1),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .unwrap_or(Shader::SolidColor(Color::TRANSPARENT))
}

pub(crate) fn circle(cx: f32, cy: f32, radius: f32) -> Option<Path> {
    PathBuilder::from_circle(cx, cy, radius)
}

/// Appends a circular arc as cubic segments. `start` and `sweep` are in
/// radians; a negative sweep runs counter-clockwise.
pub(crate) fn push_arc(
    pb: &mut PathBuilder,
    cx: f32,
    cy: f32,
    radius: f32,
    start: f32,
    sweep: f32,
) {
    let segments = (sweep.abs() / std::f32::consts::FRAC_PI_2).ceil().max(1.0) as u32;
    let delta = sweep / segments as f32;
    let k = 4.0 / 3.0 * (delta / 4.0).tan();

    let mut a0 = start;
    pb.move_to(cx + radius * a0.cos(), cy + radius * a0.sin());
    for _ in 0..segments {
        let a1 = a0 + delta;
        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();
        pb.cubic_to(
            cx + radius * (c0 - k * s0),
            cy + radius * (s0 + k * c0),
            cx + radius * (c1 + k * s1),
            cy + radius * (s1 - k * c1),
            cx + radius * c1,
            cy + radius * s1,
        );
        a0 = a1;
    }
}

pub(crate) fn arc_path(cx: f32, cy: f32, radius: f32, start: f32, sweep: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    push_arc(&mut pb, cx, cy, radius, start, sweep);
    pb.finish()
}

/// Gaussian blur of a whole pixmap. Operates on the premultiplied bytes
/// directly, which is the correct space for later source-over draws.
pub(crate) fn blurred(src: &Pixmap, sigma: f32) -> Option<Pixmap> {
    if sigma <= 0.0 {
        return Some(src.clone());
    }
    let (w, h) = (src.width(), src.height());
    let img = image::RgbaImage::from_raw(w, h, src.data().to_vec())?;
    let soft = image::imageops::blur(&img, sigma);
    Pixmap::from_vec(soft.into_raw(), IntSize::from_wh(w, h)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_gradients_fall_back_to_transparent() {
        let shader = radial(0.0, 0.0, 0.0, 0.0, 0.0, stops(&[(0.0, Color::WHITE)]));
        assert!(matches!(shader, Shader::SolidColor(_)));
        let shader = linear(1.0, 1.0, 1.0, 1.0, stops(&[(0.0, Color::WHITE)]));
        assert!(matches!(shader, Shader::SolidColor(_)));
    }

    #[test]
    fn arcs_stay_on_the_circle() {
        let path = arc_path(0.0, 0.0, 100.0, 0.0, std::f32::consts::PI).expect("arc path");
        let bounds = path.bounds();
        assert!(bounds.right() <= 101.0 && bounds.left() >= -101.0);
        // Half sweep in +y: the arc never rises above the start chord.
        assert!(bounds.top() >= -1.0);
        assert!(bounds.bottom() >= 99.0);
    }

    #[test]
    fn faded_stops_scale_alpha_only() {
        let base = [(0.0, tint(255, 255, 255, 0.8))];
        let scaled = faded_stops(&base, 0.5);
        assert_eq!(scaled.len(), 1);
    }

    #[test]
    fn blur_preserves_dimensions() {
        let mut pixmap = Pixmap::new(32, 32).expect("pixmap");
        pixmap.fill(Color::from_rgba8(120, 40, 40, 255));
        let soft = blurred(&pixmap, 2.0).expect("blurred");
        assert_eq!((soft.width(), soft.height()), (32, 32));
    }
}
