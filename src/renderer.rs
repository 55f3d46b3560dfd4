//! Raster drawing primitives.
//!
//! Every primitive rasterizes by signed-distance coverage: pixels inside the
//! stroke band get full coverage, pixels within half a pixel of the edge get
//! a smoothstep ramp, everything else is untouched. Color is composited
//! source-over with the stroke color's straight alpha; the destination alpha
//! stays `0xFF`, keeping the canvas opaque.
//!
//! The live preview goes through the same functions as the commit path, so
//! what the user sees while dragging is exactly what lands on the canvas.

use egui::{Color32, Pos2};
use rand::Rng;

use crate::pixel_buffer::{self, PixelBuffer};
use crate::redact;
use crate::tools::{Interaction, StrokeParams, ToolKind};

/// Extra padding around a primitive's bounding box to cover the AA ramp.
const AA_PAD: f32 = 2.0;

/// Arrowhead barbs deflect this far from the shaft direction.
const BARB_ANGLE: f32 = std::f32::consts::FRAC_PI_6;

/// Strokes a straight line segment with round end caps. A zero-length
/// segment is a round dot.
pub fn stroke_segment(buf: &mut PixelBuffer, p0: Pos2, p1: Pos2, color: Color32, width: f32) {
    let half = width * 0.5;
    let bounds = (
        p0.x.min(p1.x) - half,
        p0.y.min(p1.y) - half,
        p0.x.max(p1.x) + half,
        p0.y.max(p1.y) + half,
    );
    paint_band(buf, bounds, color, |x, y| {
        segment_distance(x, y, p0, p1) - half
    });
}

/// Strokes the outline of the axis-aligned rectangle spanned by `a` and `b`.
/// The box is normalized to `[min..max]` per axis, so reversed drags draw the
/// same outline. A zero-extent box draws nothing.
pub fn stroke_rectangle(buf: &mut PixelBuffer, a: Pos2, b: Pos2, color: Color32, width: f32) {
    if a == b {
        return;
    }
    let (cx, cy, hx, hy) = normalized_box(a, b);
    let half = width * 0.5;
    let bounds = (cx - hx - half, cy - hy - half, cx + hx + half, cy + hy + half);
    paint_band(buf, bounds, color, |x, y| {
        box_distance(x, y, cx, cy, hx, hy).abs() - half
    });
}

/// Strokes the outline of the ellipse inscribed in the normalized bounding
/// box of `a` and `b`. Boxes thinner than a pixel on either axis draw
/// nothing.
pub fn stroke_ellipse(buf: &mut PixelBuffer, a: Pos2, b: Pos2, color: Color32, width: f32) {
    let (cx, cy, rx, ry) = normalized_box(a, b);
    if rx < 0.5 || ry < 0.5 {
        return;
    }
    let half = width * 0.5;
    let bounds = (cx - rx - half, cy - ry - half, cx + rx + half, cy + ry + half);
    paint_band(buf, bounds, color, |x, y| {
        ellipse_distance(x, y, cx, cy, rx, ry).abs() - half
    });
}

/// Strokes a line from `p0` to `p1` with an arrowhead at `p1`: two barb
/// segments of length `15 + width`, deflected ±π/6 from the shaft direction.
/// A zero-length arrow is a round dot.
pub fn stroke_arrow(buf: &mut PixelBuffer, p0: Pos2, p1: Pos2, color: Color32, width: f32) {
    let half = width * 0.5;
    if p0 == p1 {
        stroke_segment(buf, p0, p1, color, width);
        return;
    }

    let barb_len = 15.0 + width;
    let shaft_angle = (p1.y - p0.y).atan2(p1.x - p0.x);
    let barb = |deflect: f32| {
        let angle = shaft_angle + deflect;
        Pos2::new(p1.x - barb_len * angle.cos(), p1.y - barb_len * angle.sin())
    };
    let barb_a = barb(BARB_ANGLE);
    let barb_b = barb(-BARB_ANGLE);

    let xs = [p0.x, p1.x, barb_a.x, barb_b.x];
    let ys = [p0.y, p1.y, barb_a.y, barb_b.y];
    let bounds = (
        xs.iter().copied().fold(f32::MAX, f32::min) - half,
        ys.iter().copied().fold(f32::MAX, f32::min) - half,
        xs.iter().copied().fold(f32::MIN, f32::max) + half,
        ys.iter().copied().fold(f32::MIN, f32::max) + half,
    );

    // One coverage pass over the union of the three capsules, so the joints
    // at the tip do not double-blend translucent colors.
    paint_band(buf, bounds, color, |x, y| {
        let shaft = segment_distance(x, y, p0, p1);
        let first = segment_distance(x, y, p1, barb_a);
        let second = segment_distance(x, y, p1, barb_b);
        shaft.min(first).min(second) - half
    });
}

/// Draws the live preview for an `Active` interaction into `buf`.
///
/// The caller passes a deep copy of the canvas; the live buffer is never
/// mutated here. Shape tools preview through the same stroke functions the
/// commit path uses. The pen needs no preview (its segments are already on
/// the canvas), and the redact preview scrambles the copied region once.
pub fn render_interaction(
    buf: &mut PixelBuffer,
    interaction: &Interaction,
    params: &StrokeParams,
    rng: &mut impl Rng,
) {
    let Interaction::Active {
        tool,
        start,
        current,
        ..
    } = *interaction
    else {
        return;
    };
    match tool {
        ToolKind::Pen => {}
        ToolKind::Rectangle => stroke_rectangle(buf, start, current, params.color(), params.width()),
        ToolKind::Ellipse => stroke_ellipse(buf, start, current, params.color(), params.width()),
        ToolKind::Arrow => stroke_arrow(buf, start, current, params.color(), params.width()),
        ToolKind::Redact => redact::apply_redact(buf, start, current, rng),
    }
}

/// Rasterizes one coverage band: for every pixel in the clipped bounding
/// box, `distance` returns the signed distance to the stroke edge (negative
/// inside), and coverage ramps over a one-pixel band around zero.
fn paint_band(
    buf: &mut PixelBuffer,
    bounds: (f32, f32, f32, f32),
    color: Color32,
    distance: impl Fn(f32, f32) -> f32,
) {
    let (min_x, min_y, max_x, max_y) = bounds;
    let x0 = ((min_x - AA_PAD).floor() as i32).max(0);
    let y0 = ((min_y - AA_PAD).floor() as i32).max(0);
    let x1 = ((max_x + AA_PAD).ceil() as i32).min(buf.width() as i32);
    let y1 = ((max_y + AA_PAD).ceil() as i32).min(buf.height() as i32);

    let [sr, sg, sb, sa] = color.to_srgba_unmultiplied();
    let src_alpha = sa as f32 / 255.0;

    for y in y0..y1 {
        let py = y as f32 + 0.5;
        for x in x0..x1 {
            let px = x as f32 + 0.5;
            let cov = smoothstep(0.5, -0.5, distance(px, py));
            if cov <= 0.001 {
                continue;
            }
            let alpha = src_alpha * cov;
            let (x, y) = (x as u32, y as u32);
            let (_, dr, dg, db) = pixel_buffer::unpack(buf.pixel(x, y).unwrap_or(pixel_buffer::WHITE));
            let over = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
            buf.put_pixel(
                x,
                y,
                pixel_buffer::pack(0xFF, over(sr, dr), over(sg, dg), over(sb, db)),
            );
        }
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Distance from `(px, py)` to the segment `a..b`; collapses to point
/// distance for degenerate segments.
fn segment_distance(px: f32, py: f32, a: Pos2, b: Pos2) -> f32 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    let t = if len2 <= f32::EPSILON {
        0.0
    } else {
        (((px - a.x) * abx + (py - a.y) * aby) / len2).clamp(0.0, 1.0)
    };
    let dx = px - (a.x + t * abx);
    let dy = py - (a.y + t * aby);
    (dx * dx + dy * dy).sqrt()
}

/// Signed distance to an axis-aligned box with center `(cx, cy)` and half
/// extents `(hx, hy)`; negative inside.
fn box_distance(px: f32, py: f32, cx: f32, cy: f32, hx: f32, hy: f32) -> f32 {
    let qx = (px - cx).abs() - hx;
    let qy = (py - cy).abs() - hy;
    let ox = qx.max(0.0);
    let oy = qy.max(0.0);
    (ox * ox + oy * oy).sqrt() + qx.max(qy).min(0.0)
}

/// Approximate signed distance to an ellipse with radii `(rx, ry)`. The
/// gradient-normalized form is accurate to well under a pixel for the radii
/// a stroke width can meet, which is all the AA ramp needs.
fn ellipse_distance(px: f32, py: f32, cx: f32, cy: f32, rx: f32, ry: f32) -> f32 {
    let ex = (px - cx) / rx;
    let ey = (py - cy) / ry;
    let k0 = (ex * ex + ey * ey).sqrt();
    let gx = ex / rx;
    let gy = ey / ry;
    let k1 = (gx * gx + gy * gy).sqrt();
    if k1 <= f32::EPSILON {
        // Pixel at the exact center.
        return -rx.min(ry);
    }
    k0 * (k0 - 1.0) / k1
}

/// Center and half extents of the normalized box spanned by two corners.
fn normalized_box(a: Pos2, b: Pos2) -> (f32, f32, f32, f32) {
    (
        (a.x + b.x) * 0.5,
        (a.y + b.y) * 0.5,
        (a.x - b.x).abs() * 0.5,
        (a.y - b.y).abs() * 0.5,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::{unpack, PixelBuffer, WHITE};
    use egui::pos2;

    fn buffer() -> PixelBuffer {
        PixelBuffer::new(100, 100).unwrap()
    }

    fn is_dark(buf: &PixelBuffer, x: u32, y: u32) -> bool {
        let (_, r, g, b) = unpack(buf.pixel(x, y).unwrap());
        r < 60 && g < 60 && b < 60
    }

    #[test]
    fn segment_covers_its_core_and_nothing_far_away() {
        let mut buf = buffer();
        stroke_segment(&mut buf, pos2(10.0, 50.0), pos2(90.0, 50.0), Color32::BLACK, 3.0);
        assert!(is_dark(&buf, 50, 50));
        assert!(is_dark(&buf, 10, 50));
        assert_eq!(buf.pixel(50, 10), Some(WHITE));
        assert_eq!(buf.pixel(50, 90), Some(WHITE));
    }

    #[test]
    fn zero_length_segment_is_a_dot() {
        let mut buf = buffer();
        stroke_segment(&mut buf, pos2(50.0, 50.0), pos2(50.0, 50.0), Color32::BLACK, 6.0);
        assert!(is_dark(&buf, 50, 50));
        assert_eq!(buf.pixel(56, 50), Some(WHITE));
    }

    #[test]
    fn alpha_stays_opaque_after_strokes() {
        let mut buf = buffer();
        let translucent = Color32::from_rgba_unmultiplied(255, 0, 0, 90);
        stroke_segment(&mut buf, pos2(0.0, 0.0), pos2(99.0, 99.0), translucent, 9.0);
        stroke_ellipse(&mut buf, pos2(10.0, 10.0), pos2(90.0, 90.0), translucent, 4.0);
        assert!(buf.pixels().iter().all(|&p| p >> 24 == 0xFF));
    }

    #[test]
    fn rectangle_outline_is_hollow() {
        let mut buf = buffer();
        stroke_rectangle(&mut buf, pos2(20.0, 20.0), pos2(80.0, 80.0), Color32::BLACK, 3.0);
        assert!(is_dark(&buf, 50, 20)); // top edge
        assert!(is_dark(&buf, 20, 50)); // left edge
        assert_eq!(buf.pixel(50, 50), Some(WHITE)); // interior
        assert_eq!(buf.pixel(5, 5), Some(WHITE)); // exterior
    }

    #[test]
    fn rectangle_normalizes_reversed_corners() {
        let mut forward = buffer();
        let mut reversed = buffer();
        stroke_rectangle(&mut forward, pos2(20.0, 30.0), pos2(70.0, 60.0), Color32::BLACK, 4.0);
        stroke_rectangle(&mut reversed, pos2(70.0, 60.0), pos2(20.0, 30.0), Color32::BLACK, 4.0);
        assert!(forward.pixels() == reversed.pixels());
    }

    #[test]
    fn degenerate_rectangle_draws_nothing() {
        let mut buf = buffer();
        stroke_rectangle(&mut buf, pos2(40.0, 40.0), pos2(40.0, 40.0), Color32::BLACK, 5.0);
        assert!(buf.pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn ellipse_touches_its_box_midpoints_only() {
        let mut buf = buffer();
        stroke_ellipse(&mut buf, pos2(20.0, 20.0), pos2(80.0, 80.0), Color32::BLACK, 3.0);
        assert!(is_dark(&buf, 50, 20)); // top of the circle
        assert!(is_dark(&buf, 20, 50)); // left
        assert_eq!(buf.pixel(21, 21), Some(WHITE)); // box corner is outside
        assert_eq!(buf.pixel(50, 50), Some(WHITE)); // center is hollow
    }

    #[test]
    fn degenerate_ellipse_draws_nothing() {
        let mut buf = buffer();
        stroke_ellipse(&mut buf, pos2(40.0, 10.0), pos2(40.0, 90.0), Color32::BLACK, 5.0);
        assert!(buf.pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn arrow_has_shaft_and_barbs() {
        let mut buf = buffer();
        stroke_arrow(&mut buf, pos2(10.0, 50.0), pos2(90.0, 50.0), Color32::BLACK, 3.0);
        assert!(is_dark(&buf, 50, 50)); // shaft
        // Barbs of length 18 at ±30° from the tip land near (74, 41)/(74, 59).
        assert!(is_dark(&buf, 82, 45));
        assert!(is_dark(&buf, 82, 55));
        assert_eq!(buf.pixel(95, 50), Some(WHITE)); // beyond the tip
    }

    #[test]
    fn zero_length_arrow_is_a_dot() {
        let mut buf = buffer();
        stroke_arrow(&mut buf, pos2(50.0, 50.0), pos2(50.0, 50.0), Color32::BLACK, 4.0);
        assert!(is_dark(&buf, 50, 50));
        assert_eq!(buf.pixel(60, 50), Some(WHITE));
    }

    #[test]
    fn identical_inputs_rasterize_identically() {
        let mut a = buffer();
        let mut b = buffer();
        stroke_arrow(&mut a, pos2(12.5, 13.25), pos2(77.0, 61.0), Color32::RED, 5.0);
        stroke_arrow(&mut b, pos2(12.5, 13.25), pos2(77.0, 61.0), Color32::RED, 5.0);
        assert!(a.pixels() == b.pixels());
    }
}
