//! Size selection against the hardware's advertised size lists

use crate::types::Size;

/// Aspect ratios closer than this are treated as equal
const ASPECT_TOLERANCE: f64 = 0.05;

/// Pick the preview size for a target picture/video size.
///
/// Prefers the largest advertised size sharing the target's aspect ratio and
/// falls back to the largest advertised size overall.
pub fn optimal_preview_size(sizes: &[Size], target: Option<Size>) -> Option<Size> {
    let largest = sizes.iter().copied().max_by_key(Size::area);
    let Some(target) = target.filter(|t| !t.is_empty()) else {
        return largest;
    };

    let aspect = target.aspect_ratio();
    sizes
        .iter()
        .copied()
        .filter(|s| (s.aspect_ratio() - aspect).abs() < ASPECT_TOLERANCE)
        .max_by_key(Size::area)
        .or(largest)
}

/// Pick the thumbnail size with the closest aspect ratio to the picture,
/// largest first among equally close candidates.
pub fn thumbnail_size_for(sizes: &[Size], picture: Size) -> Option<Size> {
    let aspect = picture.aspect_ratio();
    sizes
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .min_by(|a, b| {
            let da = (a.aspect_ratio() - aspect).abs();
            let db = (b.aspect_ratio() - aspect).abs();
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.area().cmp(&a.area()))
        })
}
