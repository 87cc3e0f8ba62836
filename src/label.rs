//! Label compositing for the canvas strategy.
//!
//! Labels are baked into each layer once, so per-frame compositing only
//! copies pixels and never touches text.

use std::path::Path;

use ab_glyph::{point, Font, FontArc, FontVec, Glyph, PxScale, ScaleFont};
use anyhow::{Context as _, Result};
use fontdb::{Database, Family, Query, Weight};
use image::{Pixel, Rgba, RgbaImage};
use log::{debug, info};

use crate::orientation::Corner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

/// Measures and rasterizes label text.
pub trait TextPainter {
    fn measure(&self, text: &str) -> TextExtent;

    /// Draws `text` so that its measured box starts at `origin`.
    fn draw(&self, target: &mut RgbaImage, text: &str, origin: (i64, i64), color: Rgba<u8>);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelStyle {
    pub font_px: f32,
    pub margin: u32,
    pub background: Rgba<u8>,
    pub foreground: Rgba<u8>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_px: 24.0,
            margin: 8,
            background: Rgba([0, 0, 0, 153]),
            foreground: Rgba([255, 255, 255, 255]),
        }
    }
}

impl LabelStyle {
    /// The same style at a device pixel ratio.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            font_px: self.font_px * factor as f32,
            margin: (self.margin as f64 * factor).round() as u32,
            ..self
        }
    }
}

/// Placement of a label on its layer. Coordinates may fall outside the layer
/// when the label is larger than it; drawing clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelBox {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub text_origin: (i64, i64),
}

pub fn label_box(
    layer: (u32, u32),
    extent: TextExtent,
    corner: Corner,
    style: &LabelStyle,
) -> LabelBox {
    let (layer_w, layer_h) = (layer.0 as i64, layer.1 as i64);
    let width = extent.width + 2 * style.margin;
    let height = extent.height + 2 * style.margin;

    let x = if corner.is_right() {
        layer_w - width as i64
    } else {
        0
    };
    let y = if corner.is_top() {
        0
    } else {
        layer_h - height as i64
    };

    let margin = style.margin as i64;
    LabelBox {
        x,
        y,
        width,
        height,
        text_origin: (x + margin, y + margin),
    }
}

/// A layer bitmap with its label baked in.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositedLayer {
    image: RgbaImage,
}

impl CompositedLayer {
    pub fn plain(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

pub fn bake(
    layer: &RgbaImage,
    text: &str,
    corner: Corner,
    painter: &dyn TextPainter,
    style: &LabelStyle,
) -> CompositedLayer {
    let mut image = layer.clone();
    let extent = painter.measure(text);
    let placement = label_box(image.dimensions(), extent, corner, style);
    debug!("baking label {text:?} at {corner:?}: {placement:?}");

    fill_rect(
        &mut image,
        placement.x,
        placement.y,
        placement.width,
        placement.height,
        style.background,
    );
    painter.draw(&mut image, text, placement.text_origin, style.foreground);

    CompositedLayer { image }
}

/// Blends `color` over the part of the rectangle that lies inside `image`.
pub fn fill_rect(image: &mut RgbaImage, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let x0 = x.clamp(0, w);
    let y0 = y.clamp(0, h);
    let x1 = (x + width as i64).clamp(0, w);
    let y1 = (y + height as i64).clamp(0, h);
    for py in y0..y1 {
        for px in x0..x1 {
            image.get_pixel_mut(px as u32, py as u32).blend(&color);
        }
    }
}

/// `TextPainter` backed by an outline font.
#[derive(Clone)]
pub struct GlyphPainter {
    font: FontArc,
    scale: PxScale,
}

impl GlyphPainter {
    pub fn new(font: FontArc, font_px: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(font_px),
        }
    }

    pub fn with_font_px(&self, font_px: f32) -> Self {
        Self::new(self.font.clone(), font_px)
    }

    fn layout(&self, text: &str, origin: (f32, f32)) -> (Vec<Glyph>, f32) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = origin.1 + scaled.ascent();
        let mut caret = origin.0;
        let mut previous = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale, point(caret, baseline)));
            caret += scaled.h_advance(id);
            previous = Some(id);
        }
        (glyphs, caret - origin.0)
    }
}

impl TextPainter for GlyphPainter {
    fn measure(&self, text: &str) -> TextExtent {
        let scaled = self.font.as_scaled(self.scale);
        let (_, advance) = self.layout(text, (0.0, 0.0));
        TextExtent {
            width: advance.ceil().max(0.0) as u32,
            height: (scaled.ascent() - scaled.descent()).ceil().max(0.0) as u32,
        }
    }

    fn draw(&self, target: &mut RgbaImage, text: &str, origin: (i64, i64), color: Rgba<u8>) {
        let (w, h) = (target.width() as i64, target.height() as i64);
        let (glyphs, _) = self.layout(text, (origin.0 as f32, origin.1 as f32));
        for glyph in glyphs {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                if px < 0 || py < 0 || px >= w || py >= h {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * color[3] as f32).round() as u8;
                let ink = Rgba([color[0], color[1], color[2], alpha]);
                target.get_pixel_mut(px as u32, py as u32).blend(&ink);
            });
        }
    }
}

pub fn load_font_file(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read font file '{}'", path.display()))?;
    FontArc::try_from_vec(bytes)
        .with_context(|| format!("Failed to parse font file '{}'", path.display()))
}

/// Looks up a bold sans-serif face in the system font database, falling back
/// to any bold face and then to any face at all.
pub fn find_system_font() -> Option<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let face_id = db
        .query(&Query {
            families: &[Family::SansSerif],
            weight: Weight::BOLD,
            ..Query::default()
        })
        .or_else(|| {
            db.faces()
                .find(|face| face.weight == Weight::BOLD)
                .map(|face| face.id)
        })
        .or_else(|| db.faces().next().map(|face| face.id))?;

    let font = db.with_face_data(face_id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index)
            .ok()
            .map(FontArc::new)
    })??;
    info!("Using system font face {:?} for labels", face_id);
    Some(font)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fixed-metric painter: every character is a solid 10x16 block.
    pub(crate) struct BlockPainter;

    impl TextPainter for BlockPainter {
        fn measure(&self, text: &str) -> TextExtent {
            TextExtent {
                width: 10 * text.chars().count() as u32,
                height: 16,
            }
        }

        fn draw(&self, target: &mut RgbaImage, text: &str, origin: (i64, i64), color: Rgba<u8>) {
            let extent = self.measure(text);
            fill_rect(target, origin.0, origin.1, extent.width, extent.height, color);
        }
    }

    fn gray_layer(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([100, 100, 100, 255]))
    }

    #[test]
    fn bottom_left_label_sits_one_margin_from_the_corner() {
        let style = LabelStyle::default();
        let extent = BlockPainter.measure("Left");
        let placement = label_box((800, 600), extent, Corner::BottomLeft, &style);
        assert_eq!(placement.x, 0);
        assert_eq!(placement.y, 600 - (16 + 16));
        assert_eq!(placement.text_origin, (8, 600 - 16 - 8));
    }

    #[test]
    fn corners_anchor_to_layer_edges() {
        let style = LabelStyle::default();
        let extent = TextExtent { width: 40, height: 16 };
        let tl = label_box((300, 200), extent, Corner::TopLeft, &style);
        assert_eq!((tl.x, tl.y), (0, 0));
        let br = label_box((300, 200), extent, Corner::BottomRight, &style);
        assert_eq!((br.x + br.width as i64, br.y + br.height as i64), (300, 200));
    }

    #[test]
    fn baking_paints_background_and_text() {
        let style = LabelStyle::default();
        let layer = gray_layer(800, 600);
        let baked = bake(&layer, "Left", Corner::BottomLeft, &BlockPainter, &style);
        let img = baked.image();

        // margin area is darkened background
        let bg = img.get_pixel(2, 598);
        assert!(bg[0] < 100);
        // text area is foreground
        assert_eq!(*img.get_pixel(8, 576), style.foreground);
        assert_eq!(*img.get_pixel(47, 591), style.foreground);
        // outside the label is untouched
        assert_eq!(*img.get_pixel(100, 100), Rgba([100, 100, 100, 255]));
        assert_eq!(*img.get_pixel(56, 598), Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn baking_is_idempotent() {
        let style = LabelStyle::default();
        let layer = gray_layer(320, 240);
        let first = bake(&layer, "After", Corner::BottomRight, &BlockPainter, &style);
        let _other = bake(&layer, "Before", Corner::TopLeft, &BlockPainter, &style);
        let second = bake(&layer, "After", Corner::BottomRight, &BlockPainter, &style);
        assert_eq!(first, second);
    }

    #[test]
    fn oversized_label_is_clipped() {
        let style = LabelStyle::default();
        let layer = gray_layer(20, 10);
        let text = "A very long label";
        let baked = bake(&layer, text, Corner::BottomRight, &BlockPainter, &style);
        assert_eq!(baked.dimensions(), (20, 10));
    }

    #[test]
    fn scaled_style_grows_font_and_margin() {
        let style = LabelStyle::default().scaled(1.5);
        assert_eq!(style.font_px, 36.0);
        assert_eq!(style.margin, 12);
        assert_eq!(style.background, LabelStyle::default().background);
        assert_eq!(LabelStyle::default().scaled(1.0), LabelStyle::default());
    }

    #[test]
    fn glyph_painter_measures_and_bakes_with_a_system_font() {
        let Some(font) = find_system_font() else {
            return;
        };
        let style = LabelStyle::default();
        let painter = GlyphPainter::new(font, style.font_px);

        let short = painter.measure("Old");
        let long = painter.measure("Old label");
        assert!(short.width > 0 && short.height > 0);
        assert!(long.width > short.width);
        assert_eq!(long.height, short.height);
        assert!(painter.with_font_px(48.0).measure("Old").width > short.width);

        let layer = gray_layer(320, 240);
        let first = bake(&layer, "After", Corner::BottomRight, &painter, &style);
        let second = bake(&layer, "After", Corner::BottomRight, &painter, &style);
        assert_eq!(first, second);

        // transparent background: only glyph ink changes pixels
        let ink_only = LabelStyle {
            background: Rgba([0, 0, 0, 0]),
            ..style
        };
        let baked = bake(&layer, "After", Corner::BottomRight, &painter, &ink_only);
        let extent = painter.measure("After");
        let placement = label_box((320, 240), extent, Corner::BottomRight, &style);
        let mut inked = 0;
        for (x, y, pixel) in baked.image().enumerate_pixels() {
            if pixel == layer.get_pixel(x, y) {
                continue;
            }
            inked += 1;
            let (x, y) = (x as i64, y as i64);
            assert!(x >= placement.x && x < placement.x + placement.width as i64);
            assert!(y >= placement.y && y < placement.y + placement.height as i64);
        }
        assert!(inked > 0);
    }
}
