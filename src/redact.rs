//! The redact filter: a pixel scrambler for hiding sensitive regions.
//!
//! Each destination pixel is replaced by a randomly displaced neighbor with
//! per-channel noise added. Reads and writes share the buffer, so later
//! pixels may sample already-scrambled ones; that feedback is part of the
//! filter's look. Repeated passes destroy progressively more structure, and
//! the commit path runs [`COMMIT_PASSES`] of them.

use egui::Pos2;
use rand::Rng;

use crate::pixel_buffer::{pack, unpack, PixelBuffer};

/// Passes applied when the redact tool commits on release.
pub const COMMIT_PASSES: usize = 10;

/// Per-pixel source displacement, drawn independently for x and y.
///
/// The range is asymmetric on purpose: it reproduces the original filter's
/// smeared look, which pulls from below-right of each pixel.
const DISPLACEMENT: std::ops::Range<i32> = -5..45;

/// Per-channel additive noise.
const CHANNEL_NOISE: std::ops::Range<i32> = -20..20;

/// Scrambles the rectangle spanned by `a` and `b`, clipped to the buffer.
///
/// Pixels outside the clipped rectangle are never touched. Output alpha is
/// `0xFF` everywhere the filter writes. Deterministic for a fixed `rng` seed
/// and identical input.
pub fn apply_redact(buf: &mut PixelBuffer, a: Pos2, b: Pos2, rng: &mut impl Rng) {
    let w = buf.width() as i32;
    let h = buf.height() as i32;
    let x0 = (a.x.min(b.x).floor() as i32).max(0);
    let y0 = (a.y.min(b.y).floor() as i32).max(0);
    let x1 = (a.x.max(b.x).ceil() as i32).min(w);
    let y1 = (a.y.max(b.y).ceil() as i32).min(h);

    for y in y0..y1 {
        for x in x0..x1 {
            let sx = (x + rng.gen_range(DISPLACEMENT)).clamp(0, w - 1);
            let sy = (y + rng.gen_range(DISPLACEMENT)).clamp(0, h - 1);
            // In-bounds by the clamp above.
            let (_, r, g, b) = unpack(buf.pixel(sx as u32, sy as u32).unwrap_or_default());
            let scrambled = pack(0xFF, jitter(r, rng), jitter(g, rng), jitter(b, rng));
            buf.put_pixel(x as u32, y as u32, scrambled);
        }
    }
}

fn jitter(channel: u8, rng: &mut impl Rng) -> u8 {
    (channel as i32 + rng.gen_range(CHANNEL_NOISE)).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::WHITE;
    use egui::pos2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn halves() -> PixelBuffer {
        // Red left half, blue right half.
        let mut buf = PixelBuffer::new(100, 100).unwrap();
        for y in 0..100 {
            for x in 0..100 {
                let color = if x < 50 {
                    pack(0xFF, 200, 0, 0)
                } else {
                    pack(0xFF, 0, 0, 200)
                };
                buf.put_pixel(x, y, color);
            }
        }
        buf
    }

    #[test]
    fn only_the_clipped_rectangle_changes() {
        let before = halves();
        let mut buf = before.clone();
        let mut rng = StdRng::seed_from_u64(7);
        apply_redact(&mut buf, pos2(30.0, 30.0), pos2(70.0, 70.0), &mut rng);

        for y in 0..100u32 {
            for x in 0..100u32 {
                let inside = (30..70).contains(&x) && (30..70).contains(&y);
                if !inside {
                    assert_eq!(buf.pixel(x, y), before.pixel(x, y), "pixel ({x},{y}) leaked");
                }
            }
        }
        assert!(buf.pixels() != before.pixels());
    }

    #[test]
    fn reversed_corners_scramble_the_same_rectangle() {
        let before = halves();
        let mut buf = before.clone();
        let mut rng = StdRng::seed_from_u64(3);
        apply_redact(&mut buf, pos2(70.0, 70.0), pos2(30.0, 30.0), &mut rng);
        assert_eq!(buf.pixel(10, 10), before.pixel(10, 10));
        assert!(buf.pixel(40, 40) != before.pixel(40, 40) || buf.pixel(41, 40) != before.pixel(41, 40));
    }

    #[test]
    fn seeded_runs_are_identical() {
        let mut first = halves();
        let mut second = first.clone();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        apply_redact(&mut first, pos2(0.0, 0.0), pos2(100.0, 100.0), &mut rng_a);
        apply_redact(&mut second, pos2(0.0, 0.0), pos2(100.0, 100.0), &mut rng_b);
        assert!(first.pixels() == second.pixels());
    }

    #[test]
    fn output_alpha_is_opaque_and_noise_is_bounded_per_pass() {
        let mut buf = PixelBuffer::new(64, 64).unwrap();
        let solid = pack(0xFF, 120, 60, 180);
        for y in 0..64 {
            for x in 0..64 {
                buf.put_pixel(x, y, solid);
            }
        }
        let mut rng = StdRng::seed_from_u64(1);
        apply_redact(&mut buf, pos2(0.0, 0.0), pos2(64.0, 64.0), &mut rng);
        for &p in buf.pixels() {
            let (a, r, g, b) = unpack(p);
            assert_eq!(a, 0xFF);
            // One pass over a solid color can move each channel by at most
            // the noise bound.
            assert!((r as i32 - 120).abs() <= 20);
            assert!((g as i32 - 60).abs() <= 20);
            assert!((b as i32 - 180).abs() <= 20);
        }
    }

    #[test]
    fn region_outside_the_buffer_is_clipped() {
        let mut buf = PixelBuffer::new(10, 10).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        apply_redact(&mut buf, pos2(-50.0, -50.0), pos2(500.0, 500.0), &mut rng);
        // Every pixel was eligible; at least some must have changed, and
        // none may be transparent.
        assert!(buf.pixels().iter().any(|&p| p != WHITE));
        assert!(buf.pixels().iter().all(|&p| p >> 24 == 0xFF));
    }

    #[test]
    fn repeated_passes_keep_scrambling() {
        let mut buf = halves();
        let mut rng = StdRng::seed_from_u64(9);
        apply_redact(&mut buf, pos2(0.0, 0.0), pos2(100.0, 100.0), &mut rng);
        let after_one = buf.clone();
        for _ in 1..COMMIT_PASSES {
            apply_redact(&mut buf, pos2(0.0, 0.0), pos2(100.0, 100.0), &mut rng);
        }
        assert!(buf.pixels() != after_one.pixels());
    }
}
