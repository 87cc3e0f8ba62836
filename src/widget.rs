//! Widget lifecycle and event dispatch.
//!
//! A widget starts `Pending`, becomes `Ready` once both images have decoded
//! and the first frame is rendered, and ends `Failed` on any fatal error.
//! Every event goes through [`Widget::handle`]; events that arrive while the
//! widget is not ready are dropped.

use log::{debug, error, info};

use crate::error::{ComparisonError, Result};
use crate::geometry::{fit, DisplaySize, Viewport};
use crate::image_loader::ImagePair;
use crate::orientation::{axis_params, AxisParams, Orientation};
use crate::render::Renderer;
use crate::reveal::{RevealPosition, RevealState, RevealUnit};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetEvent {
    /// Slider value on an input whose range is `[0, range]`.
    Input { value: f64, range: f64 },
    /// Pointer position relative to the top-left of the displayed images,
    /// in the renderer's layout pixels.
    Pointer { x: f64, y: f64 },
    Resize(Viewport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Pending,
    Ready,
    Failed(String),
}

struct Session {
    images: ImagePair,
    display: DisplaySize,
}

pub struct Widget<R: Renderer> {
    renderer: R,
    params: AxisParams,
    reveal: RevealState,
    viewport: Viewport,
    session: Option<Session>,
    lifecycle: Lifecycle,
}

impl<R: Renderer> Widget<R> {
    pub fn new(renderer: R, orientation: Orientation, viewport: Viewport) -> Self {
        let params = axis_params(orientation);
        let initial_unit = renderer.unit(DisplaySize {
            width: viewport.width,
            height: viewport.height,
        });
        Self {
            renderer,
            params,
            reveal: RevealState::new(initial_unit, params.input_inverted),
            viewport,
            session: None,
            lifecycle: Lifecycle::Pending,
        }
    }

    /// Joins on the decoded pair and renders the first frame.
    ///
    /// A decode failure moves the widget to `Failed` and is returned as the
    /// fatal signal; nothing is rendered in that case.
    pub fn initialize(&mut self, decoded: Result<ImagePair>) -> Result<()> {
        if self.lifecycle != Lifecycle::Pending {
            return Err(ComparisonError::missing("widget already initialized"));
        }
        let images = match decoded {
            Ok(images) => images,
            Err(err) => return Err(self.fail(err)),
        };
        let display = match self.fit(&images) {
            Ok(display) => display,
            Err(err) => return Err(self.fail(err)),
        };

        self.renderer.attach(&images);
        self.renderer.apply_orientation(self.params);
        self.renderer.resize(&images, display);
        self.reveal.rescale(self.renderer.unit(display));
        self.renderer.update(self.reveal.position());

        info!(
            "Comparison ready: {} orientation, {} renderer, display {:.1}x{:.1}",
            self.params.orientation,
            self.renderer.strategy(),
            display.width,
            display.height
        );
        self.session = Some(Session { images, display });
        self.lifecycle = Lifecycle::Ready;
        Ok(())
    }

    pub fn handle(&mut self, event: WidgetEvent) -> Result<Option<RevealPosition>> {
        if self.lifecycle != Lifecycle::Ready {
            debug!("ignoring {event:?} while {:?}", self.lifecycle);
            if let WidgetEvent::Resize(viewport) = event {
                self.viewport = viewport;
            }
            return Ok(None);
        }

        let position = match event {
            WidgetEvent::Input { value, range } => self.reveal.set_from_input_event(value, range),
            WidgetEvent::Pointer { x, y } => {
                let coordinate = self.params.primary_axis.pick(x, y);
                let axis_length = self.axis_length();
                self.reveal.set_from_pointer_event(coordinate, axis_length)
            }
            WidgetEvent::Resize(viewport) => {
                self.viewport = viewport;
                if let Err(err) = self.refit() {
                    return Err(self.fail(err));
                }
                self.reveal.position()
            }
        };
        self.renderer.update(position);
        Ok(Some(position))
    }

    fn fit(&self, images: &ImagePair) -> Result<DisplaySize> {
        fit(
            images.before.natural_size(),
            images.after.natural_size(),
            self.viewport.size(),
            self.renderer.fit_scale(&self.viewport),
        )
    }

    fn refit(&mut self) -> Result<()> {
        let Some(session) = &self.session else {
            return Ok(());
        };
        let display = self.fit(&session.images)?;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.display != display {
            debug!("display resized to {:.1}x{:.1}", display.width, display.height);
        }
        session.display = display;
        self.renderer.resize(&session.images, display);
        self.reveal.rescale(self.renderer.unit(display));
        Ok(())
    }

    fn axis_length(&self) -> f64 {
        match self.reveal.unit() {
            RevealUnit::Pixels(len) => len,
            RevealUnit::Percent => self
                .session
                .as_ref()
                .map(|s| self.params.primary_axis.pick(s.display.width, s.display.height))
                .unwrap_or(0.0),
        }
    }

    /// Tears the session down and records the fatal error.
    fn fail(&mut self, err: ComparisonError) -> ComparisonError {
        error!("{err}");
        self.session = None;
        self.lifecycle = Lifecycle::Failed(err.to_string());
        err
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    pub fn params(&self) -> &AxisParams {
        &self.params
    }

    pub fn reveal(&self) -> RevealPosition {
        self.reveal.position()
    }

    pub fn display(&self) -> Option<DisplaySize> {
        self.session.as_ref().map(|s| s.display)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::tests::{encoded, png_bytes};
    use crate::image_loader::{decode_pair, ImageAsset};
    use crate::label::tests::BlockPainter;
    use crate::label::LabelStyle;
    use crate::render::{CanvasRenderer, DomRenderer};
    use crate::style::{Element, StyleSheet};
    use image::RgbaImage;

    fn images(w: u32, h: u32) -> ImagePair {
        ImagePair {
            before: ImageAsset::new("before", RgbaImage::new(w, h), Some("Left".into())),
            after: ImageAsset::new("after", RgbaImage::new(w, h), Some("Right".into())),
        }
    }

    fn dom_widget(
        orientation: Orientation,
        viewport: Viewport,
    ) -> Widget<DomRenderer<StyleSheet>> {
        Widget::new(DomRenderer::new(StyleSheet::new()), orientation, viewport)
    }

    #[test]
    fn events_before_initialization_are_ignored() {
        let mut w = dom_widget(Orientation::Horizontal, Viewport::new(800.0, 600.0, 1.0));
        let result = w
            .handle(WidgetEvent::Input { value: 10.0, range: 100.0 })
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(w.reveal().percent(), 50.0);
        assert_eq!(w.renderer().target().write_count(), 0);
    }

    #[test]
    fn pointer_moves_clamp_inside_the_display() {
        let mut w = Widget::new(
            CanvasRenderer::new(Some(BlockPainter), LabelStyle::default()),
            Orientation::Horizontal,
            Viewport::new(400.0, 300.0, 1.0),
        );
        w.initialize(Ok(images(200, 100))).unwrap();
        assert_eq!(w.renderer().offset(), 100);

        let pos = w.handle(WidgetEvent::Pointer { x: 50.0, y: 999.0 }).unwrap().unwrap();
        assert_eq!(pos.offset, 50.0);
        assert_eq!(w.renderer().offset(), 50);

        let pos = w.handle(WidgetEvent::Pointer { x: 5000.0, y: 0.0 }).unwrap().unwrap();
        assert_eq!(pos.offset, 200.0);
    }

    #[test]
    fn resize_refits_and_keeps_the_revealed_share() {
        let mut w = Widget::new(
            CanvasRenderer::new(Some(BlockPainter), LabelStyle::default()),
            Orientation::Horizontal,
            Viewport::new(1000.0, 1000.0, 1.0),
        );
        w.initialize(Ok(images(800, 400))).unwrap();
        w.handle(WidgetEvent::Pointer { x: 200.0, y: 0.0 }).unwrap();

        w.handle(WidgetEvent::Resize(Viewport::new(200.0, 200.0, 2.0))).unwrap();
        let display = w.display().unwrap();
        assert_eq!((display.width, display.height), (400.0, 200.0));
        assert_eq!(w.reveal().offset, 100.0);
        assert_eq!(w.renderer().frame().dimensions(), (400, 200));

        // redundant resize is harmless
        w.handle(WidgetEvent::Resize(Viewport::new(200.0, 200.0, 2.0))).unwrap();
        assert_eq!(w.reveal().offset, 100.0);
    }

    #[test]
    fn scale_change_rebakes_labels_at_the_new_size() {
        let mut w = Widget::new(
            CanvasRenderer::new(Some(BlockPainter), LabelStyle::default()),
            Orientation::Horizontal,
            Viewport::new(1000.0, 1000.0, 1.0),
        );
        w.initialize(Ok(images(400, 200))).unwrap();
        let before_swap = w.renderer().layers().unwrap().0.clone();

        let style = LabelStyle::default().scaled(2.0);
        w.renderer_mut().set_labels(Some(BlockPainter), style);
        w.handle(WidgetEvent::Resize(Viewport::new(1000.0, 1000.0, 2.0))).unwrap();
        let (layer, _) = w.renderer().layers().unwrap();
        assert_eq!(layer.dimensions(), (400, 200));
        assert_ne!(layer, &before_swap);
    }

    #[test]
    fn vertical_pointer_uses_the_y_coordinate() {
        let mut w = dom_widget(Orientation::Vertical, Viewport::new(1000.0, 1000.0, 1.0));
        w.initialize(Ok(images(400, 200))).unwrap();
        w.handle(WidgetEvent::Pointer { x: 399.0, y: 50.0 }).unwrap();
        assert_eq!(w.reveal().percent(), 25.0);
        let sheet = w.renderer().target();
        assert_eq!(sheet.style(Element::BeforeImage, "height"), Some("25%"));
    }

    #[test]
    fn decode_failure_is_fatal_and_renders_nothing() {
        let mut w = dom_widget(Orientation::Horizontal, Viewport::new(800.0, 600.0, 1.0));
        let decoded = decode_pair(
            encoded("a.png", png_bytes(8, 8, [0, 0, 0, 255]), None),
            encoded("b.png", vec![0, 1, 2, 3], None),
        );
        let err = w.initialize(decoded).unwrap_err();
        assert!(matches!(err, ComparisonError::Decode { .. }));
        assert!(matches!(w.lifecycle(), Lifecycle::Failed(_)));
        assert_eq!(w.renderer().target().write_count(), 0);
        assert_eq!(w.reveal().percent(), 50.0);
        assert_eq!(w.handle(WidgetEvent::Pointer { x: 1.0, y: 1.0 }).unwrap(), None);
    }

    #[test]
    fn initializing_twice_is_rejected() {
        let mut w = dom_widget(Orientation::Horizontal, Viewport::new(800.0, 600.0, 1.0));
        w.initialize(Ok(images(10, 10))).unwrap();
        assert!(w.initialize(Ok(images(10, 10))).is_err());
        assert!(w.is_ready());
    }
}
