use crate::error::{ComparisonError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Window dimensions in logical pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale_factor: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, scale_factor: f64) -> Self {
        Self {
            width,
            height,
            scale_factor,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Size shared by both images after fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    /// Pixel-grid size for canvas output. Never collapses to zero.
    pub fn floor(&self) -> (u32, u32) {
        (
            (self.width.floor() as u32).max(1),
            (self.height.floor() as u32).max(1),
        )
    }
}

/// Fits two same-content images into `viewport * scale` without upscaling.
///
/// Starts from the smaller of each natural dimension, then shrinks to the
/// bound, deriving the other side from the after-image's aspect ratio. Width
/// is checked first, then height.
pub fn fit(before: Size, after: Size, viewport: Size, scale: f64) -> Result<DisplaySize> {
    if !before.is_usable() {
        return Err(ComparisonError::missing("before image has no natural size"));
    }
    if !after.is_usable() {
        return Err(ComparisonError::missing("after image has no natural size"));
    }

    let mut width = before.width.min(after.width);
    let mut height = before.height.min(after.height);

    let max_width = viewport.width * scale;
    let max_height = viewport.height * scale;

    if width > max_width {
        width = max_width;
        height = after.height * width / after.width;
    }

    if height > max_height {
        height = max_height;
        width = after.width * height / after.height;
    }

    Ok(DisplaySize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn aspect(s: DisplaySize) -> f64 {
        s.width / s.height
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let d = fit(
            Size::new(640.0, 480.0),
            Size::new(800.0, 600.0),
            Size::new(1920.0, 1080.0),
            1.0,
        )
        .unwrap();
        assert_eq!(d, DisplaySize { width: 640.0, height: 480.0 });
    }

    #[test]
    fn wide_images_shrink_to_viewport_width() {
        let d = fit(
            Size::new(4000.0, 2000.0),
            Size::new(4000.0, 2000.0),
            Size::new(1000.0, 1000.0),
            1.0,
        )
        .unwrap();
        assert!((d.width - 1000.0).abs() < EPS);
        assert!((d.height - 500.0).abs() < EPS);
    }

    #[test]
    fn tall_images_shrink_to_viewport_height() {
        let d = fit(
            Size::new(1000.0, 3000.0),
            Size::new(1000.0, 3000.0),
            Size::new(1200.0, 900.0),
            1.0,
        )
        .unwrap();
        assert!((d.height - 900.0).abs() < EPS);
        assert!((d.width - 300.0).abs() < EPS);
    }

    #[test]
    fn device_scale_widens_the_bound() {
        let d = fit(
            Size::new(3000.0, 1500.0),
            Size::new(3000.0, 1500.0),
            Size::new(1000.0, 800.0),
            2.0,
        )
        .unwrap();
        assert!((d.width - 2000.0).abs() < EPS);
        assert!((d.height - 1000.0).abs() < EPS);
    }

    #[test]
    fn output_stays_inside_viewport_and_keeps_after_aspect() {
        let naturals = [
            (1000.0, 500.0),
            (500.0, 1000.0),
            (3000.0, 2000.0),
            (1920.0, 1080.0),
            (333.0, 777.0),
        ];
        let viewports = [(800.0, 600.0), (300.0, 900.0), (1280.0, 720.0), (200.0, 200.0)];
        for &(w, h) in &naturals {
            for &(vw, vh) in &viewports {
                for scale in [1.0, 1.5, 2.0] {
                    let before = Size::new(w * 1.25, h * 1.25);
                    let after = Size::new(w, h);
                    let d = fit(before, after, Size::new(vw, vh), scale).unwrap();
                    assert!(d.width <= vw * scale + EPS, "{d:?} vs {vw}x{vh}@{scale}");
                    assert!(d.height <= vh * scale + EPS, "{d:?} vs {vw}x{vh}@{scale}");
                    assert!((aspect(d) - w / h).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn fitting_is_idempotent() {
        let args = (
            Size::new(2400.0, 1600.0),
            Size::new(1800.0, 1200.0),
            Size::new(1024.0, 768.0),
            1.25,
        );
        let a = fit(args.0, args.1, args.2, args.3).unwrap();
        let b = fit(args.0, args.1, args.2, args.3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_sized_image_is_missing_data() {
        let err = fit(
            Size::new(0.0, 0.0),
            Size::new(10.0, 10.0),
            Size::new(100.0, 100.0),
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, ComparisonError::MissingData(_)));
    }

    #[test]
    fn floor_never_returns_zero() {
        let d = DisplaySize { width: 0.4, height: 10.9 };
        assert_eq!(d.floor(), (1, 10));
    }
}
