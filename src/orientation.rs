use std::fmt;
use std::str::FromStr;

use crate::error::ComparisonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl FromStr for Orientation {
    type Err = ComparisonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h" | "horizontal" => Ok(Self::Horizontal),
            "v" | "vertical" => Ok(Self::Vertical),
            other => Err(ComparisonError::InvalidOrientation(other.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Layer dimension clipped along this axis.
    pub fn size_property(self) -> &'static str {
        match self {
            Self::X => "width",
            Self::Y => "height",
        }
    }

    pub fn max_size_property(self) -> &'static str {
        match self {
            Self::X => "max-width",
            Self::Y => "max-height",
        }
    }

    /// Leading edge offset along this axis.
    pub fn offset_property(self) -> &'static str {
        match self {
            Self::X => "left",
            Self::Y => "top",
        }
    }

    pub fn translate_function(self) -> &'static str {
        match self {
            Self::X => "translateX",
            Self::Y => "translateY",
        }
    }

    /// Picks the component of `(x, y)` that lies on this axis.
    pub fn pick<T>(self, x: T, y: T) -> T {
        match self {
            Self::X => x,
            Self::Y => y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    ColResize,
    RowResize,
}

impl Cursor {
    pub fn css(self) -> &'static str {
        match self {
            Self::ColResize => "col-resize",
            Self::RowResize => "row-resize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    Row,
    Column,
}

impl FlowDirection {
    pub fn css(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn is_top(self) -> bool {
        matches!(self, Self::TopLeft)
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::BottomRight)
    }

    /// CSS anchors `(vertical, horizontal)` for an absolutely positioned label.
    pub fn anchors(self) -> (&'static str, &'static str) {
        match self {
            Self::TopLeft => ("top", "left"),
            Self::BottomLeft => ("bottom", "left"),
            Self::BottomRight => ("bottom", "right"),
        }
    }
}

impl FromStr for Corner {
    type Err = ComparisonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_left" => Ok(Self::TopLeft),
            "bottom_left" => Ok(Self::BottomLeft),
            "bottom_right" => Ok(Self::BottomRight),
            other => Err(ComparisonError::UnsupportedCorner(other.to_string())),
        }
    }
}

/// Everything that differs between the two orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisParams {
    pub orientation: Orientation,
    pub primary_axis: Axis,
    pub cross_axis: Axis,
    pub cursor: Cursor,
    pub label_flow: FlowDirection,
    pub before_corner: Corner,
    pub after_corner: Corner,
    pub slider_vertical: bool,
    /// Vertical sliders count from the bottom edge, the reveal offset from the top.
    pub input_inverted: bool,
}

const HORIZONTAL: AxisParams = AxisParams {
    orientation: Orientation::Horizontal,
    primary_axis: Axis::X,
    cross_axis: Axis::Y,
    cursor: Cursor::ColResize,
    label_flow: FlowDirection::Row,
    before_corner: Corner::BottomLeft,
    after_corner: Corner::BottomRight,
    slider_vertical: false,
    input_inverted: false,
};

const VERTICAL: AxisParams = AxisParams {
    orientation: Orientation::Vertical,
    primary_axis: Axis::Y,
    cross_axis: Axis::X,
    cursor: Cursor::RowResize,
    label_flow: FlowDirection::Column,
    before_corner: Corner::TopLeft,
    after_corner: Corner::BottomLeft,
    slider_vertical: true,
    input_inverted: true,
};

pub fn axis_params(orientation: Orientation) -> AxisParams {
    match orientation {
        Orientation::Horizontal => HORIZONTAL,
        Orientation::Vertical => VERTICAL,
    }
}
