//! Pixel-fraction to data-space mapping.
//!
//! The transform is derived once from a [`PlotGeometry`] and [`AxisLimits`]
//! snapshot and is immutable afterwards; a re-render builds a new one.

use crate::error::SetupError;
use crate::geometry::{AxisLimits, Fraction, PlotGeometry, PlotPos};

/// Four-coefficient affine map from an image fraction to data space.
///
/// `x = x_offset + x_scale * fx`, `y = y_offset + y_scale * fy`, followed by
/// clamping to the axis limits it was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub x_scale: f64,
    pub x_offset: f64,
    pub y_scale: f64,
    pub y_offset: f64,
    limits: AxisLimits,
}

impl AffineTransform {
    /// Derive the transform for a plot whose data area is `geometry.inner`
    /// inside an image covering `geometry.outer`.
    pub fn new(geometry: &PlotGeometry, limits: &AxisLimits) -> Result<Self, SetupError> {
        geometry.validate()?;
        limits.validate()?;

        let outer = geometry.outer;
        let inner = geometry.inner;
        let rel_x = (inner.x - outer.x) as f64 / outer.width as f64;
        let rel_y = (inner.y - outer.y) as f64 / outer.height as f64;
        let span_x = inner.width as f64 / outer.width as f64;
        let span_y = inner.height as f64 / outer.height as f64;

        // Screen y grows downwards, so the top edge of the inner box is y.max.
        let x_scale = limits.x.span() / span_x;
        let x_offset = limits.x.min - x_scale * rel_x;
        let y_scale = -limits.y.span() / span_y;
        let y_offset = limits.y.max - y_scale * rel_y;

        Ok(Self {
            x_scale,
            x_offset,
            y_scale,
            y_offset,
            limits: *limits,
        })
    }

    pub fn limits(&self) -> &AxisLimits {
        &self.limits
    }

    /// Map without clamping.
    pub fn apply_unclamped(&self, f: Fraction) -> PlotPos {
        PlotPos::new(
            self.x_offset + self.x_scale * f.fx,
            self.y_offset + self.y_scale * f.fy,
        )
    }

    /// Map an image fraction to a data coordinate inside the axis limits.
    pub fn apply(&self, f: Fraction) -> PlotPos {
        self.limits.clamp(self.apply_unclamped(f))
    }

    /// Inverse map, used to place overlays (ticks, crosshair) on the image.
    pub fn invert(&self, p: PlotPos) -> Fraction {
        Fraction::new(
            (p.x - self.x_offset) / self.x_scale,
            (p.y - self.y_offset) / self.y_scale,
        )
    }
}
