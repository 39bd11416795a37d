use crate::foundation::core::{Rect, Size};

/// Letterbox `image` into `viewport`, keeping its aspect ratio.
///
/// An image relatively wider than the viewport spans the full width and is centered
/// vertically; otherwise it spans the full height and is centered horizontally. Degenerate
/// sizes yield an empty rect at the origin.
pub fn fit_to_viewport(image: Size, viewport: Size) -> Rect {
    if image.width <= 0.0 || image.height <= 0.0 || viewport.width <= 0.0 || viewport.height <= 0.0
    {
        return Rect::ZERO;
    }

    let image_ratio = image.width / image.height;
    let viewport_ratio = viewport.width / viewport.height;

    if image_ratio >= viewport_ratio {
        let width = viewport.width;
        let height = viewport.width / image_ratio;
        let top = 0.5 * viewport.height - 0.5 * height;
        Rect::new(0.0, top, width, top + height)
    } else {
        let width = viewport.height * image_ratio;
        let height = viewport.height;
        let left = 0.5 * viewport.width - 0.5 * width;
        Rect::new(left, 0.0, left + width, height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;
