use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, info, warn};

use super::{RenderStrategy, Renderer};
use crate::geometry::{DisplaySize, Viewport};
use crate::image_loader::{ImageAsset, ImagePair};
use crate::label::{bake, CompositedLayer, LabelStyle, TextPainter};
use crate::orientation::{axis_params, Axis, AxisParams, Corner, Orientation};
use crate::reveal::{RevealPosition, RevealUnit};

pub const DIVIDER_WIDTH: u32 = 2;
pub const DIVIDER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Composites two baked layers into a full frame on every update.
pub struct CanvasRenderer<P: TextPainter> {
    params: AxisParams,
    painter: Option<P>,
    style: LabelStyle,
    layers: Option<(CompositedLayer, CompositedLayer)>,
    frame: RgbaImage,
    offset: u32,
}

impl<P: TextPainter> CanvasRenderer<P> {
    /// Without a painter, labels are skipped.
    pub fn new(painter: Option<P>, style: LabelStyle) -> Self {
        Self {
            params: axis_params(Orientation::Horizontal),
            painter,
            style,
            layers: None,
            frame: RgbaImage::new(1, 1),
            offset: 0,
        }
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn layers(&self) -> Option<(&CompositedLayer, &CompositedLayer)> {
        self.layers.as_ref().map(|(b, a)| (b, a))
    }

    pub fn painter(&self) -> Option<&P> {
        self.painter.as_ref()
    }

    pub fn label_style(&self) -> &LabelStyle {
        &self.style
    }

    /// Swaps the label painter and style. A changed style drops the baked
    /// layers, so the next resize bakes them again.
    pub fn set_labels(&mut self, painter: Option<P>, style: LabelStyle) {
        if self.style != style {
            debug!("label style changed to {style:?}");
            self.layers = None;
        }
        self.painter = painter;
        self.style = style;
    }

    /// Offset of the last composite along the primary axis.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    fn primary_length(&self, (w, h): (u32, u32)) -> u32 {
        self.params.primary_axis.pick(w, h)
    }

    fn build_layer(
        &self,
        asset: &ImageAsset,
        size: (u32, u32),
        corner: Corner,
    ) -> CompositedLayer {
        let pixels = asset.pixels();
        let resized = if pixels.dimensions() == size {
            pixels.clone()
        } else {
            imageops::resize(pixels, size.0, size.1, FilterType::Lanczos3)
        };
        match (&asset.label, &self.painter) {
            (Some(text), Some(painter)) => bake(&resized, text, corner, painter, &self.style),
            (Some(text), None) => {
                warn!("No font available, skipping label {text:?}");
                CompositedLayer::plain(resized)
            }
            (None, _) => CompositedLayer::plain(resized),
        }
    }

    /// Redraws the whole frame with the split at `offset` pixels.
    pub fn composite(&mut self, offset: u32) {
        let Some((before, after)) = &self.layers else {
            return;
        };
        let (w, h) = before.dimensions();
        let offset = offset.min(self.params.primary_axis.pick(w, h));
        let (before, after) = (before.image().as_raw(), after.image().as_raw());
        let frame: &mut [u8] = &mut self.frame;
        let stride = w as usize * 4;

        match self.params.primary_axis {
            Axis::X => {
                let split = offset as usize * 4;
                for row in 0..h as usize {
                    let start = row * stride;
                    frame[start..start + split].copy_from_slice(&before[start..start + split]);
                    frame[start + split..start + stride]
                        .copy_from_slice(&after[start + split..start + stride]);
                }
            }
            Axis::Y => {
                let split = offset as usize * stride;
                frame[..split].copy_from_slice(&before[..split]);
                frame[split..].copy_from_slice(&after[split..]);
            }
        }

        draw_divider(&mut self.frame, self.params.primary_axis, offset);
        self.offset = offset;
    }
}

/// Paints a `DIVIDER_WIDTH` line centred on `offset`, clipped to the frame.
fn draw_divider(frame: &mut RgbaImage, axis: Axis, offset: u32) {
    let (w, h) = frame.dimensions();
    let length = axis.pick(w, h);
    let start = offset.saturating_sub(DIVIDER_WIDTH / 2);
    let end = (start + DIVIDER_WIDTH).min(length);
    for along in start..end {
        match axis {
            Axis::X => {
                for y in 0..h {
                    frame.put_pixel(along, y, DIVIDER_COLOR);
                }
            }
            Axis::Y => {
                for x in 0..w {
                    frame.put_pixel(x, along, DIVIDER_COLOR);
                }
            }
        }
    }
}

impl<P: TextPainter> Renderer for CanvasRenderer<P> {
    fn strategy(&self) -> RenderStrategy {
        RenderStrategy::Canvas
    }

    /// Layout is in physical pixels.
    fn fit_scale(&self, viewport: &Viewport) -> f64 {
        viewport.scale_factor
    }

    fn unit(&self, display: DisplaySize) -> RevealUnit {
        RevealUnit::Pixels(self.primary_length(display.floor()) as f64)
    }

    fn apply_orientation(&mut self, params: AxisParams) {
        if self.params != params {
            self.layers = None;
        }
        self.params = params;
    }

    fn resize(&mut self, images: &ImagePair, display: DisplaySize) {
        let size = display.floor();
        if let Some((layer, _)) = &self.layers {
            if layer.dimensions() == size {
                debug!("canvas already at {}x{}", size.0, size.1);
                return;
            }
        }
        let before = self.build_layer(&images.before, size, self.params.before_corner);
        let after = self.build_layer(&images.after, size, self.params.after_corner);
        self.layers = Some((before, after));
        self.frame = RgbaImage::new(size.0, size.1);
        info!("Composited layers at {}x{}", size.0, size.1);
    }

    fn update(&mut self, position: RevealPosition) {
        let offset = position.offset.round().max(0.0) as u32;
        self.composite(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::tests::BlockPainter;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn pair(w: u32, h: u32, labels: bool) -> ImagePair {
        let label = |s: &str| labels.then(|| s.to_string());
        ImagePair {
            before: ImageAsset::new("before", RgbaImage::from_pixel(w, h, RED), label("Before")),
            after: ImageAsset::new("after", RgbaImage::from_pixel(w, h, BLUE), label("After")),
        }
    }

    fn ready(orientation: Orientation, images: &ImagePair) -> CanvasRenderer<BlockPainter> {
        let mut r = CanvasRenderer::new(Some(BlockPainter), LabelStyle::default());
        r.apply_orientation(axis_params(orientation));
        r.resize(
            images,
            DisplaySize {
                width: images.before.natural_width() as f64,
                height: images.before.natural_height() as f64,
            },
        );
        r
    }

    #[test]
    fn horizontal_split_with_divider() {
        let images = pair(100, 50, false);
        let mut r = ready(Orientation::Horizontal, &images);
        r.composite(30);
        let f = r.frame();
        assert_eq!(*f.get_pixel(0, 10), RED);
        assert_eq!(*f.get_pixel(28, 10), RED);
        assert_eq!(*f.get_pixel(29, 10), DIVIDER_COLOR);
        assert_eq!(*f.get_pixel(30, 10), DIVIDER_COLOR);
        assert_eq!(*f.get_pixel(31, 10), BLUE);
        assert_eq!(*f.get_pixel(99, 49), BLUE);
    }

    #[test]
    fn vertical_split_with_divider() {
        let images = pair(40, 100, false);
        let mut r = ready(Orientation::Vertical, &images);
        r.composite(60);
        let f = r.frame();
        assert_eq!(*f.get_pixel(5, 0), RED);
        assert_eq!(*f.get_pixel(5, 58), RED);
        assert_eq!(*f.get_pixel(5, 59), DIVIDER_COLOR);
        assert_eq!(*f.get_pixel(5, 60), DIVIDER_COLOR);
        assert_eq!(*f.get_pixel(5, 61), BLUE);
    }

    #[test]
    fn offsets_past_the_end_are_clamped() {
        let images = pair(20, 10, false);
        let mut r = ready(Orientation::Horizontal, &images);
        r.composite(500);
        assert_eq!(r.offset(), 20);
        assert_eq!(*r.frame().get_pixel(0, 0), RED);
        assert_eq!(*r.frame().get_pixel(18, 0), RED);
        assert_eq!(*r.frame().get_pixel(19, 0), DIVIDER_COLOR);
    }

    #[test]
    fn default_position_is_the_midpoint() {
        let images = pair(200, 100, false);
        let mut r = ready(Orientation::Horizontal, &images);
        let unit = r.unit(DisplaySize { width: 200.0, height: 100.0 });
        let state = crate::reveal::RevealState::new(unit, false);
        r.update(state.position());
        assert_eq!(r.offset(), 100);
    }

    #[test]
    fn layers_are_resized_and_labelled() {
        let images = pair(400, 200, true);
        let mut r = CanvasRenderer::new(Some(BlockPainter), LabelStyle::default());
        r.apply_orientation(axis_params(Orientation::Horizontal));
        r.resize(&images, DisplaySize { width: 200.7, height: 100.2 });
        let (before, after) = r.layers().unwrap();
        assert_eq!(before.dimensions(), (200, 100));
        // before label at bottom-left, after label at bottom-right
        assert_eq!(*before.image().get_pixel(10, 90), Rgba([255, 255, 255, 255]));
        assert_eq!(*after.image().get_pixel(190, 90), Rgba([255, 255, 255, 255]));
        assert_eq!(*after.image().get_pixel(10, 90), BLUE);
    }

    #[test]
    fn missing_painter_skips_labels() {
        let images = pair(50, 50, true);
        let mut r: CanvasRenderer<BlockPainter> =
            CanvasRenderer::new(None, LabelStyle::default());
        r.resize(&images, DisplaySize { width: 50.0, height: 50.0 });
        let (before, _) = r.layers().unwrap();
        assert_eq!(*before.image().get_pixel(10, 40), RED);
    }

    #[test]
    fn resize_to_the_same_size_keeps_layers() {
        let images = pair(64, 32, true);
        let mut r = ready(Orientation::Horizontal, &images);
        let first = r.layers().unwrap().0.clone();
        r.resize(&images, DisplaySize { width: 64.9, height: 32.1 });
        assert_eq!(r.layers().unwrap().0, &first);
    }

    #[test]
    fn new_label_style_rebakes_at_the_same_size() {
        let images = pair(200, 100, true);
        let mut r = ready(Orientation::Horizontal, &images);
        let display = DisplaySize { width: 200.0, height: 100.0 };
        // outside the default before label, inside the doubled one
        assert_eq!(*r.layers().unwrap().0.image().get_pixel(80, 60), RED);

        r.set_labels(Some(BlockPainter), LabelStyle::default());
        r.resize(&images, display);
        assert_eq!(*r.layers().unwrap().0.image().get_pixel(80, 60), RED);

        r.set_labels(Some(BlockPainter), LabelStyle::default().scaled(2.0));
        assert!(r.layers().is_none());
        r.resize(&images, display);
        assert_eq!(r.label_style().margin, 16);
        assert_ne!(*r.layers().unwrap().0.image().get_pixel(80, 60), RED);
    }
}
