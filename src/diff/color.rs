//! YIQ color distance used to weight differences the way people see them.

/// Largest value `delta` can return (pure black against pure white).
pub const MAX_DELTA: f64 = 35215.0;

/// Blend one channel over a background channel at the given opacity (0..=1).
#[inline]
pub fn blend(c: f64, background: f64, a: f64) -> f64 {
    background + (c - background) * a
}

#[inline]
pub fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

#[inline]
pub fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

#[inline]
pub fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

/// Pixel with semi-transparency flattened onto `background`.
#[inline]
fn flatten(px: [u8; 4], background: [u8; 3]) -> (f64, f64, f64) {
    let (r, g, b) = (px[0] as f64, px[1] as f64, px[2] as f64);
    if px[3] == 255 {
        return (r, g, b);
    }
    let a = px[3] as f64 / 255.0;
    (
        blend(r, background[0] as f64, a),
        blend(g, background[1] as f64, a),
        blend(b, background[2] as f64, a),
    )
}

/// Squared YIQ distance between two pixels.
///
/// The magnitude is the perceptual difference; the sign is negative when the
/// first pixel is brighter than the second, which lets the diff image tell
/// lightened and darkened regions apart.
pub fn delta(a: [u8; 4], b: [u8; 4], background: [u8; 3]) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = flatten(a, background);
    let (r2, g2, b2) = flatten(b, background);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;
    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);

    let d = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;
    if y1 > y2 {
        -d
    } else {
        d
    }
}

/// Brightness difference only (used by the anti-aliasing check).
pub fn luma_delta(a: [u8; 4], b: [u8; 4], background: [u8; 3]) -> f64 {
    if a == b {
        return 0.0;
    }
    let (r1, g1, b1) = flatten(a, background);
    let (r2, g2, b2) = flatten(b, background);
    rgb2y(r1, g1, b1) - rgb2y(r2, g2, b2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK_BG: [u8; 3] = [0, 0, 0];

    #[test]
    fn identical_pixels_have_no_distance() {
        assert_eq!(delta([12, 34, 56, 200], [12, 34, 56, 200], BLACK_BG), 0.0);
    }

    #[test]
    fn black_to_white_is_pure_luma() {
        let d = delta([0, 0, 0, 255], [255, 255, 255, 255], BLACK_BG);
        assert!((d - 0.5053 * 255.0 * 255.0).abs() < 0.01, "got {}", d);
        assert!(d <= MAX_DELTA);
        let back = delta([255, 255, 255, 255], [0, 0, 0, 255], BLACK_BG);
        assert!(back < 0.0);
        assert!((back.abs() - d).abs() < 1e-9);
    }

    #[test]
    fn transparency_blends_against_the_background() {
        // Fully transparent pixels flatten to the background color.
        assert_eq!(delta([255, 0, 0, 0], [0, 0, 0, 255], BLACK_BG), 0.0);
        let over_white = delta([255, 0, 0, 0], [0, 0, 0, 255], [255, 255, 255]);
        assert!(over_white.abs() > 0.0);
    }

    #[test]
    fn luma_delta_sign_follows_brightness() {
        assert!(luma_delta([200, 200, 200, 255], [100, 100, 100, 255], BLACK_BG) > 0.0);
        assert!(luma_delta([100, 100, 100, 255], [200, 200, 200, 255], BLACK_BG) < 0.0);
    }
}
