use std::fmt;

use crate::geometry::{DisplaySize, Viewport};
use crate::image_loader::ImagePair;
use crate::orientation::AxisParams;
use crate::reveal::{RevealPosition, RevealUnit};

pub mod canvas;
pub mod dom;

pub use canvas::CanvasRenderer;
pub use dom::DomRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStrategy {
    /// Percentage sizing of two stacked layers.
    Dom,
    /// Full-frame pixel compositing from baked layers.
    Canvas,
}

impl fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dom => "dom",
            Self::Canvas => "canvas",
        })
    }
}

/// Turns the reveal position into visible output.
///
/// Call order over a session: `attach` once, `apply_orientation` once, then
/// `resize` and `update` as often as events demand.
pub trait Renderer {
    fn strategy(&self) -> RenderStrategy;

    /// Multiplier for the viewport bound when fitting the display size.
    fn fit_scale(&self, viewport: &Viewport) -> f64;

    /// Unit reveal positions must be expressed in for this display size.
    fn unit(&self, display: DisplaySize) -> RevealUnit;

    fn attach(&mut self, _images: &ImagePair) {}

    fn apply_orientation(&mut self, params: AxisParams);

    fn resize(&mut self, images: &ImagePair, display: DisplaySize);

    fn update(&mut self, position: RevealPosition);
}

/// Formats a number for CSS with at most three decimals.
pub(crate) fn css_number(value: f64) -> String {
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
