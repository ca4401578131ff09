//! Anti-aliasing detection.
//!
//! A differing pixel is treated as an anti-aliased edge when, in one of the
//! images, it sits between a darker and a brighter neighbor and one of those
//! extreme neighbors belongs to a flat region in both images. Only the two
//! source images are read, so the check can run for any pixel in any order.

use crate::RasterImage;

use super::color::luma_delta;

/// Bounds of the 3x3 neighborhood around (x, y), clipped to the image, plus
/// the initial "identical neighbor" count: pixels on the image border start
/// at one since part of their neighborhood is missing.
fn neighborhood(img: &RasterImage, x: u32, y: u32) -> (u32, u32, u32, u32, u32) {
    let x0 = x.saturating_sub(1);
    let y0 = y.saturating_sub(1);
    let x2 = (x + 1).min(img.width - 1);
    let y2 = (y + 1).min(img.height - 1);
    let on_edge = x == x0 || x == x2 || y == y0 || y == y2;
    (x0, y0, x2, y2, on_edge as u32)
}

/// True when more than two of the pixel's neighbors share its exact RGBA value.
fn has_many_siblings(img: &RasterImage, x: u32, y: u32) -> bool {
    let (x0, y0, x2, y2, mut zeroes) = neighborhood(img, x, y);
    let val = img.pixel(x, y);
    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            if img.pixel(nx, ny) == val {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }
    false
}

/// Whether pixel (x, y) of `img` looks like anti-aliasing, judged against `other`.
pub fn antialiased(img: &RasterImage, other: &RasterImage, x: u32, y: u32, background: [u8; 3]) -> bool {
    let (x0, y0, x2, y2, mut zeroes) = neighborhood(img, x, y);
    let center = img.pixel(x, y);

    let mut min = 0.0;
    let mut max = 0.0;
    let mut min_at = (x, y);
    let mut max_at = (x, y);

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }
            let d = luma_delta(center, img.pixel(nx, ny), background);
            if d == 0.0 {
                zeroes += 1;
                // more than two identical neighbors: flat area, not an edge
                if zeroes > 2 {
                    return false;
                }
            } else if d < min {
                min = d;
                min_at = (nx, ny);
            } else if d > max {
                max = d;
                max_at = (nx, ny);
            }
        }
    }

    // needs both a brighter and a darker neighbor
    if min == 0.0 || max == 0.0 {
        return false;
    }

    let flat_in_both = |(px, py): (u32, u32)| has_many_siblings(img, px, py) && has_many_siblings(other, px, py);
    flat_in_both(min_at) || flat_in_both(max_at)
}
