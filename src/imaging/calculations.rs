//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions of a capture bounded by `max_dimension`.
///
/// If either side exceeds the bound, both sides are scaled by
/// `min(max/width, max/height)` and truncated, preserving aspect ratio.
/// Otherwise the dimensions pass through unchanged. Sides never drop below 1px.
///
/// # Examples
/// ```
/// # use trailer_photo_qc::imaging::calculate_bounded_dimensions;
/// // 4000x3000 landscape bounded to 2560 → 2560x1920
/// assert_eq!(calculate_bounded_dimensions((4000, 3000), 2560), (2560, 1920));
///
/// // Already small enough → unchanged
/// assert_eq!(calculate_bounded_dimensions((1920, 1080), 2560), (1920, 1080));
/// ```
pub fn calculate_bounded_dimensions(source: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w <= max_dimension && src_h <= max_dimension {
        return source;
    }

    // The longer side is the limiting one; integer math keeps it exactly at the bound.
    let longer = src_w.max(src_h) as u64;
    let max = max_dimension as u64;
    let w = (src_w as u64 * max / longer).max(1) as u32;
    let h = (src_h as u64 * max / longer).max(1) as u32;
    (w, h)
}
