//! Pure calculation functions for normalized image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Output dimensions for an image bounded to `max_width`.
///
/// Images no wider than `max_width` keep their size. Wider images are scaled
/// so the width becomes exactly `max_width`; the height is scaled by the same
/// factor and rounded to the nearest pixel (never below 1).
///
/// # Examples
/// ```ignore
/// assert_eq!(constrain_to_width(1600, 1200, 800), (800, 600));
/// assert_eq!(constrain_to_width(640, 480, 800), (640, 480));
/// ```
pub fn constrain_to_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspect_ratio(width: u32, height: u32) -> f64 {
        width as f64 / height as f64
    }

    #[test]
    fn narrow_images_are_untouched() {
        assert_eq!(constrain_to_width(640, 480, 800), (640, 480));
        assert_eq!(constrain_to_width(800, 3000, 800), (800, 3000));
        assert_eq!(constrain_to_width(1, 1, 800), (1, 1));
    }

    #[test]
    fn wide_landscape_is_scaled_to_max_width() {
        assert_eq!(constrain_to_width(1600, 1200, 800), (800, 600));
        assert_eq!(constrain_to_width(4032, 3024, 800), (800, 600));
    }

    #[test]
    fn wide_portrait_is_scaled_to_max_width() {
        // 3024 * 800 / 2268 = 1066.67
        assert_eq!(constrain_to_width(2268, 3024, 800), (800, 1067));
    }

    #[test]
    fn height_rounds_to_nearest() {
        // 333 * 800 / 1000 = 266.4 → 266
        assert_eq!(constrain_to_width(1000, 333, 800), (800, 266));
        // 337 * 800 / 1000 = 269.6 → 270
        assert_eq!(constrain_to_width(1000, 337, 800), (800, 270));
    }

    #[test]
    fn extreme_panorama_keeps_at_least_one_row() {
        assert_eq!(constrain_to_width(100_000, 10, 800), (800, 1));
    }

    #[test]
    fn aspect_ratio_is_preserved_within_rounding() {
        for &(w, h) in &[(1920, 1080), (3000, 4000), (1234, 567), (801, 799)] {
            let (out_w, out_h) = constrain_to_width(w, h, 800);
            let drift = (aspect_ratio(w, h) - aspect_ratio(out_w, out_h)).abs();
            // One pixel of height rounding is the only source of drift
            let tolerance = aspect_ratio(out_w, out_h) / out_h as f64;
            assert!(drift <= tolerance, "{w}x{h} → {out_w}x{out_h} drifted {drift}");
        }
    }
}
