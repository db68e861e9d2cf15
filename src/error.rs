//! Error types for widget setup and selection binding.
//!
//! Setup errors are fatal: a widget whose transform cannot be derived is never
//! constructed, and a binding that was misused is left untouched.

use std::fmt;

/// Which of the two bounding boxes in a [`PlotGeometry`](crate::geometry::PlotGeometry)
/// was found to be degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    /// The inner plot area.
    Inner,
    /// The outer layout box (usually the whole image).
    Outer,
}

impl fmt::Display for BoxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxKind::Inner => write!(f, "inner plot area"),
            BoxKind::Outer => write!(f, "outer layout box"),
        }
    }
}

/// Data axis named in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
        }
    }
}

/// Unrecoverable configuration error raised while setting up a clickable plot
/// or binding its selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// A bounding box has zero, negative or non-finite size.
    DegenerateGeometry {
        which: BoxKind,
        width: f32,
        height: f32,
    },
    /// A bounding box origin is not finite.
    NonFiniteOrigin { which: BoxKind },
    /// The inner plot area extends past the outer layout box.
    InnerOutsideOuter { inner: [f32; 4], outer: [f32; 4] },
    /// An axis range has zero span or non-finite bounds.
    DegenerateAxis { axis: Axis, min: f64, max: f64 },
    /// The selection binding was used incorrectly.
    Binding(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::DegenerateGeometry {
                which,
                width,
                height,
            } => write!(
                f,
                "degenerate {which}: size {width}x{height} px, cannot derive a pixel-to-data transform"
            ),
            SetupError::NonFiniteOrigin { which } => {
                write!(f, "{which} has a non-finite origin")
            }
            SetupError::InnerOutsideOuter { inner, outer } => write!(
                f,
                "inner plot area {inner:?} (x, y, w, h) lies outside the outer layout box {outer:?}"
            ),
            SetupError::DegenerateAxis { axis, min, max } => write!(
                f,
                "degenerate {axis} axis limits [{min}, {max}]: span must be finite and non-zero"
            ),
            SetupError::Binding(msg) => write!(f, "invalid selection binding: {msg}"),
        }
    }
}

impl std::error::Error for SetupError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_part() {
        let e = SetupError::DegenerateGeometry {
            which: BoxKind::Inner,
            width: 0.0,
            height: 300.0,
        };
        assert!(e.to_string().contains("inner plot area"));

        let e = SetupError::DegenerateAxis {
            axis: Axis::Y,
            min: 5.0,
            max: 5.0,
        };
        assert!(e.to_string().contains("y axis"));
    }
}
