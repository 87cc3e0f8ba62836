use log::debug;

use super::{css_number, RenderStrategy, Renderer};
use crate::geometry::{DisplaySize, Viewport};
use crate::image_loader::ImagePair;
use crate::orientation::{axis_params, AxisParams, Orientation};
use crate::reveal::{RevealPosition, RevealUnit};
use crate::style::{Element, StyleTarget};

const SLIDER_LINE_THICKNESS: &str = "4px";
const INITIAL_SPLIT: &str = "50%";

/// Drives two stacked layers through style writes.
pub struct DomRenderer<T: StyleTarget> {
    target: T,
    params: AxisParams,
}

impl<T: StyleTarget> DomRenderer<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            params: axis_params(Orientation::Horizontal),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }
}

impl<T: StyleTarget> Renderer for DomRenderer<T> {
    fn strategy(&self) -> RenderStrategy {
        RenderStrategy::Dom
    }

    /// Layout is in CSS pixels.
    fn fit_scale(&self, _viewport: &Viewport) -> f64 {
        1.0
    }

    fn unit(&self, _display: DisplaySize) -> RevealUnit {
        RevealUnit::Percent
    }

    fn attach(&mut self, images: &ImagePair) {
        for (element, label) in [
            (Element::BeforeLabel, &images.before.label),
            (Element::AfterLabel, &images.after.label),
        ] {
            if let Some(text) = label {
                self.target.set_text(element, text);
                self.target.set_style(element, "display", "flex");
            }
        }
    }

    fn apply_orientation(&mut self, params: AxisParams) {
        self.params = params;
        let primary = params.primary_axis;
        let cross = params.cross_axis;
        let t = &mut self.target;

        if params.slider_vertical {
            t.set_attribute(Element::Slider, "orient", "vertical");
            t.set_style(Element::Slider, "appearance", "slider-vertical");
        }
        t.set_style(Element::Slider, "cursor", params.cursor.css());

        t.set_style(Element::BeforeImage, primary.size_property(), INITIAL_SPLIT);
        t.set_style(Element::BeforeImage, "top", "0");
        t.set_style(Element::BeforeImage, "object-position", primary.offset_property());

        t.set_style(Element::SliderLine, cross.size_property(), "100%");
        t.set_style(Element::SliderLine, primary.size_property(), SLIDER_LINE_THICKNESS);
        t.set_style(
            Element::SliderLine,
            "transform",
            &format!("{}(-50%)", primary.translate_function()),
        );
        t.set_style(Element::SliderLine, primary.offset_property(), INITIAL_SPLIT);

        let icon_transform = if params.slider_vertical {
            "translate(-50%, -50%) rotate(90deg)"
        } else {
            "translate(-50%, -50%)"
        };
        t.set_style(Element::SliderIcon, "transform", icon_transform);
        t.set_style(Element::SliderIcon, primary.offset_property(), INITIAL_SPLIT);

        for (element, corner) in [
            (Element::BeforeLabel, params.before_corner),
            (Element::AfterLabel, params.after_corner),
        ] {
            let (vertical, horizontal) = corner.anchors();
            t.set_style(element, primary.max_size_property(), INITIAL_SPLIT);
            t.set_style(element, vertical, "0");
            t.set_style(element, horizontal, "0");
        }
        t.set_style(Element::AfterLabel, "flex-direction", params.label_flow.css());

        debug!("applied {} orientation styles", params.orientation);
    }

    fn resize(&mut self, _images: &ImagePair, display: DisplaySize) {
        self.target
            .set_style(Element::Container, "width", &format!("{}px", css_number(display.width)));
        self.target
            .set_style(Element::Container, "height", &format!("{}px", css_number(display.height)));
    }

    fn update(&mut self, position: RevealPosition) {
        let primary = self.params.primary_axis;
        let shown = format!("{}%", css_number(position.percent()));
        let rest = format!("{}%", css_number(position.inverse_percent()));
        let t = &mut self.target;

        t.set_style(Element::BeforeLabel, primary.max_size_property(), &shown);
        t.set_style(Element::AfterLabel, primary.max_size_property(), &rest);
        t.set_style(Element::BeforeImage, primary.size_property(), &shown);
        t.set_style(Element::SliderLine, primary.offset_property(), &shown);
        t.set_style(Element::SliderIcon, primary.offset_property(), &shown);
    }
}
