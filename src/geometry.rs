//! Pixel and data-space primitives captured at render time.

use serde::{Deserialize, Serialize};

use crate::error::{Axis, BoxKind, SetupError};

/// Screen (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f32,
    pub y: f32,
}

impl ScreenPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Data-space coordinates (for a lon/lat map: x = longitude, y = latitude).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotPos {
    pub x: f64,
    pub y: f64,
}

impl PlotPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Normalized position inside the rendered image, measured from its top-left.
///
/// Components are nominally in `0..=1` but may fall outside when a drag leaves
/// the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fraction {
    pub fx: f64,
    pub fy: f64,
}

impl Fraction {
    pub const fn new(fx: f64, fy: f64) -> Self {
        Self { fx, fy }
    }
}

/// Axis-aligned pixel rectangle given by origin (top-left) and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle with origin at `(0, 0)`.
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn contains(&self, p: ScreenPos) -> bool {
        p.x >= self.x && p.y >= self.y && p.x <= self.x + self.width && p.y <= self.y + self.height
    }

    /// Position of `p` relative to this rectangle as a fraction of its size.
    /// Returns `None` for an empty rectangle.
    pub fn fraction_of(&self, p: ScreenPos) -> Option<Fraction> {
        if self.is_empty() || !self.width.is_finite() || !self.height.is_finite() {
            return None;
        }
        Some(Fraction::new(
            (p.x - self.x) as f64 / self.width as f64,
            (p.y - self.y) as f64 / self.height as f64,
        ))
    }

    fn validate(&self, which: BoxKind) -> Result<(), SetupError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(SetupError::NonFiniteOrigin { which });
        }
        if self.is_empty() || !self.width.is_finite() || !self.height.is_finite() {
            return Err(SetupError::DegenerateGeometry {
                which,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

// Sub-pixel slack for layouts computed in floating point.
const EDGE_TOLERANCE: f32 = 1e-3;

/// Inner plot area and outer layout box of a rendered plot, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotGeometry {
    /// Area covered by the data (inside axes and margins).
    pub inner: PixelRect,
    /// Full layout box the rendered image corresponds to.
    pub outer: PixelRect,
}

impl PlotGeometry {
    pub const fn new(inner: PixelRect, outer: PixelRect) -> Self {
        Self { inner, outer }
    }

    /// Check both boxes are usable for deriving a transform and that the
    /// inner area sits within the outer box.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.outer.validate(BoxKind::Outer)?;
        self.inner.validate(BoxKind::Inner)?;
        let (i, o) = (self.inner, self.outer);
        let inside = i.x >= o.x - EDGE_TOLERANCE
            && i.y >= o.y - EDGE_TOLERANCE
            && i.x + i.width <= o.x + o.width + EDGE_TOLERANCE
            && i.y + i.height <= o.y + o.height + EDGE_TOLERANCE;
        if !inside {
            return Err(SetupError::InnerOutsideOuter {
                inner: [i.x, i.y, i.width, i.height],
                outer: [o.x, o.y, o.width, o.height],
            });
        }
        Ok(())
    }
}

/// Closed data range along one axis. `min > max` flips the axis orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn low(&self) -> f64 {
        self.min.min(self.max)
    }

    pub fn high(&self) -> f64 {
        self.min.max(self.max)
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.low(), self.high())
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.low() && v <= self.high()
    }

    fn validate(&self, axis: Axis) -> Result<(), SetupError> {
        let span = self.span();
        if !self.min.is_finite() || !self.max.is_finite() || span == 0.0 || !span.is_finite() {
            return Err(SetupError::DegenerateAxis {
                axis,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Horizontal and vertical data ranges of a rendered plot.
///
/// `y.max` is the value drawn at the top edge of the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub x: AxisRange,
    pub y: AxisRange,
}

impl AxisLimits {
    pub const fn new(x: AxisRange, y: AxisRange) -> Self {
        Self { x, y }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        self.x.validate(Axis::X)?;
        self.y.validate(Axis::Y)
    }

    pub fn clamp(&self, p: PlotPos) -> PlotPos {
        PlotPos::new(self.x.clamp(p.x), self.y.clamp(p.y))
    }

    pub fn contains(&self, p: PlotPos) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_relative_to_rect_origin() {
        let r = PixelRect::new(100.0, 50.0, 200.0, 100.0);
        let f = r.fraction_of(ScreenPos::new(200.0, 75.0)).unwrap();
        assert!((f.fx - 0.5).abs() < 1e-9);
        assert!((f.fy - 0.25).abs() < 1e-9);
        // Outside the rect the fraction simply leaves 0..1
        let f = r.fraction_of(ScreenPos::new(80.0, 50.0)).unwrap();
        assert!(f.fx < 0.0);
    }

    #[test]
    fn empty_rect_has_no_fraction() {
        let r = PixelRect::new(0.0, 0.0, 0.0, 10.0);
        assert!(r.fraction_of(ScreenPos::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn flipped_range_clamps_between_low_and_high() {
        let depth = AxisRange::new(5000.0, 0.0);
        assert_eq!(depth.clamp(-10.0), 0.0);
        assert_eq!(depth.clamp(6000.0), 5000.0);
        assert!(depth.contains(2500.0));
    }

    #[test]
    fn zero_span_axis_is_rejected() {
        let limits = AxisLimits::new(AxisRange::new(0.0, 360.0), AxisRange::new(3.0, 3.0));
        assert!(matches!(
            limits.validate(),
            Err(SetupError::DegenerateAxis { axis: Axis::Y, .. })
        ));
    }

    #[test]
    fn zero_size_inner_box_is_rejected() {
        let g = PlotGeometry::new(
            PixelRect::new(10.0, 10.0, 0.0, 0.0),
            PixelRect::from_size(100.0, 100.0),
        );
        assert!(matches!(
            g.validate(),
            Err(SetupError::DegenerateGeometry {
                which: BoxKind::Inner,
                ..
            })
        ));
    }

    #[test]
    fn inner_box_must_sit_inside_outer_box() {
        let outer = PixelRect::new(20.0, 10.0, 600.0, 400.0);
        let g = PlotGeometry::new(PixelRect::new(500.0, 50.0, 200.0, 100.0), outer);
        assert!(matches!(g.validate(), Err(SetupError::InnerOutsideOuter { .. })));
        let g = PlotGeometry::new(PixelRect::new(0.0, 50.0, 100.0, 100.0), outer);
        assert!(g.validate().is_err());
        // Sharing an edge with the outer box is fine.
        let g = PlotGeometry::new(outer, outer);
        assert!(g.validate().is_ok());
    }
}
