//! Before/after image comparison: fitting, reveal state and two renderers.

pub mod error;
pub mod geometry;
pub mod image_loader;
pub mod label;
pub mod orientation;
pub mod remote;
pub mod render;
pub mod reveal;
pub mod style;
pub mod widget;

pub use error::{ComparisonError, Result};
pub use geometry::{fit, DisplaySize, Size, Viewport};
pub use image_loader::{ImageAsset, ImagePair};
pub use orientation::{axis_params, AxisParams, Orientation};
pub use render::{CanvasRenderer, DomRenderer, RenderStrategy, Renderer};
pub use reveal::{RevealPosition, RevealState, RevealUnit};
pub use widget::{Lifecycle, Widget, WidgetEvent};
