use log::debug;

/// Unit the active renderer consumes reveal positions in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealUnit {
    /// Percentage of the primary axis, 0 to 100.
    Percent,
    /// Pixel offset along a primary axis of the given length.
    Pixels(f64),
}

impl RevealUnit {
    pub fn span(self) -> f64 {
        match self {
            Self::Percent => 100.0,
            Self::Pixels(len) => len.max(0.0),
        }
    }
}

/// Boundary between the two layers, measured from the leading (left/top) edge.
///
/// The before layer covers `[0, offset]`, the after layer `[offset, span]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealPosition {
    pub offset: f64,
    pub span: f64,
}

impl RevealPosition {
    pub fn fraction(&self) -> f64 {
        if self.span > 0.0 {
            self.offset / self.span
        } else {
            0.5
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Remaining share of the axis, in percent.
    pub fn inverse_percent(&self) -> f64 {
        100.0 - self.percent()
    }
}

#[derive(Debug, Clone)]
pub struct RevealState {
    unit: RevealUnit,
    fraction: f64,
    input_inverted: bool,
}

impl RevealState {
    pub const DEFAULT_FRACTION: f64 = 0.5;

    pub fn new(unit: RevealUnit, input_inverted: bool) -> Self {
        Self {
            unit,
            fraction: Self::DEFAULT_FRACTION,
            input_inverted,
        }
    }

    pub fn unit(&self) -> RevealUnit {
        self.unit
    }

    pub fn position(&self) -> RevealPosition {
        let span = self.unit.span();
        RevealPosition {
            offset: self.fraction * span,
            span,
        }
    }

    /// Applies a value from an input widget whose range is `[0, axis_length]`.
    pub fn set_from_input_event(&mut self, raw_value: f64, axis_length: f64) -> RevealPosition {
        if let Some(fraction) = normalize(raw_value, axis_length) {
            self.fraction = if self.input_inverted {
                1.0 - fraction
            } else {
                fraction
            };
            debug!("reveal input {raw_value}/{axis_length} -> {:.4}", self.fraction);
        }
        self.position()
    }

    /// Applies a pointer coordinate along a primary axis `axis_length` pixels long.
    pub fn set_from_pointer_event(&mut self, coordinate: f64, axis_length: f64) -> RevealPosition {
        if let Some(fraction) = normalize(coordinate, axis_length) {
            self.fraction = fraction;
            debug!("reveal pointer {coordinate}/{axis_length} -> {:.4}", self.fraction);
        }
        self.position()
    }

    /// Switches to a new unit (after a resize) keeping the revealed share.
    pub fn rescale(&mut self, unit: RevealUnit) {
        self.unit = unit;
    }
}

fn normalize(value: f64, axis_length: f64) -> Option<f64> {
    if !value.is_finite() || !axis_length.is_finite() || axis_length <= 0.0 {
        return None;
    }
    Some((value / axis_length).clamp(0.0, 1.0))
}
