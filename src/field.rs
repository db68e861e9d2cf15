//! Gridded lon/lat/depth fields and the 2-D views the plots are drawn from.
//!
//! Values are stored depth-major: `values[(k * nlat + j) * nlon + i]` for
//! longitude index `i`, latitude index `j` and depth index `k`. Land and
//! below-bottom cells hold `NaN`.

use std::fmt;

use crate::geometry::{AxisRange, PlotPos};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    EmptyGrid,
    ShapeMismatch { expected: usize, got: usize },
    /// Coordinates must be finite and strictly increasing.
    UnsortedAxis(&'static str),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::EmptyGrid => write!(f, "grid has an empty axis"),
            FieldError::ShapeMismatch { expected, got } => {
                write!(f, "expected {expected} values for the grid, got {got}")
            }
            FieldError::UnsortedAxis(name) => {
                write!(f, "{name} coordinates must be finite and strictly increasing")
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// Standard depth levels (cell centres, metres).
pub const STANDARD_DEPTHS: [f64; 26] = [
    5.0, 15.0, 30.0, 50.0, 75.0, 100.0, 135.0, 175.0, 225.0, 290.0, 370.0, 460.0, 560.0, 680.0,
    820.0, 980.0, 1160.0, 1370.0, 1620.0, 1920.0, 2280.0, 2700.0, 3200.0, 3800.0, 4500.0, 5300.0,
];

/// Cell-centre coordinates of a lon/lat/depth grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Longitudes in degrees east, within `0..360`.
    pub lon: Vec<f64>,
    /// Latitudes in degrees north.
    pub lat: Vec<f64>,
    /// Depths in metres, positive downwards.
    pub depth: Vec<f64>,
}

impl Grid {
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, depth: Vec<f64>) -> Result<Self, FieldError> {
        for (name, axis) in [("lon", &lon), ("lat", &lat), ("depth", &depth)] {
            if axis.is_empty() {
                return Err(FieldError::EmptyGrid);
            }
            let sorted = axis.iter().all(|v| v.is_finite()) && axis.windows(2).all(|w| w[0] < w[1]);
            if !sorted {
                return Err(FieldError::UnsortedAxis(name));
            }
        }
        Ok(Self { lon, lat, depth })
    }

    /// Regular global grid with `nlon` x `nlat` cells and the given depth levels.
    pub fn regular(nlon: usize, nlat: usize, depth: Vec<f64>) -> Result<Self, FieldError> {
        if nlon == 0 || nlat == 0 {
            return Err(FieldError::EmptyGrid);
        }
        let dlon = 360.0 / nlon as f64;
        let dlat = 180.0 / nlat as f64;
        let lon = (0..nlon).map(|i| (i as f64 + 0.5) * dlon).collect();
        let lat = (0..nlat).map(|j| -90.0 + (j as f64 + 0.5) * dlat).collect();
        Self::new(lon, lat, depth)
    }

    /// `(nlon, nlat, ndepth)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.lon.len(), self.lat.len(), self.depth.len())
    }

    pub fn len(&self) -> usize {
        let (a, b, c) = self.shape();
        a * b * c
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.lat.len() + j) * self.lon.len() + i
    }

    /// Nearest longitude index, treating longitude as periodic.
    pub fn nearest_lon(&self, lon: f64) -> Option<usize> {
        if !lon.is_finite() {
            return None;
        }
        let lon = lon.rem_euclid(360.0);
        let dist = |c: f64| {
            let d = (c - lon).abs();
            d.min(360.0 - d)
        };
        nearest_by(&self.lon, dist)
    }

    pub fn nearest_lat(&self, lat: f64) -> Option<usize> {
        if !lat.is_finite() {
            return None;
        }
        nearest_by(&self.lat, |c| (c - lat).abs())
    }

    pub fn nearest_depth(&self, depth: f64) -> Option<usize> {
        if !depth.is_finite() {
            return None;
        }
        nearest_by(&self.depth, |c| (c - depth).abs())
    }

    pub fn lon_extent(&self) -> AxisRange {
        extent(&self.lon)
    }

    pub fn lat_extent(&self) -> AxisRange {
        let e = extent(&self.lat);
        AxisRange::new(e.min.max(-90.0), e.max.min(90.0))
    }

    /// Depth range with the sea surface as lower bound.
    pub fn depth_extent(&self) -> AxisRange {
        let e = extent(&self.depth);
        AxisRange::new(e.min.max(0.0), e.max)
    }
}

fn nearest_by(coords: &[f64], dist: impl Fn(f64) -> f64) -> Option<usize> {
    coords
        .iter()
        .enumerate()
        .map(|(i, c)| (i, dist(*c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Outer edges of a set of cell centres.
fn extent(centres: &[f64]) -> AxisRange {
    match centres {
        [] => AxisRange::new(0.0, 1.0),
        [c] => AxisRange::new(c - 0.5, c + 0.5),
        [first, second, ..] => {
            let n = centres.len();
            let (before_last, last) = (centres[n - 2], centres[n - 1]);
            AxisRange::new(
                first - (second - first) / 2.0,
                last + (last - before_last) / 2.0,
            )
        }
    }
}

/// Edges `[lo, hi]` of cell `idx` given all centres.
pub fn cell_edges(centres: &[f64], idx: usize) -> [f64; 2] {
    let e = extent(centres);
    let lo = if idx == 0 {
        e.min
    } else {
        (centres[idx - 1] + centres[idx]) / 2.0
    };
    let hi = if idx + 1 >= centres.len() {
        e.max
    } else {
        (centres[idx] + centres[idx + 1]) / 2.0
    };
    [lo, hi]
}

/// A 2-D view of a field, ready to be rendered as a heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice2 {
    /// Horizontal cell centres.
    pub x: Vec<f64>,
    /// Vertical cell centres.
    pub y: Vec<f64>,
    /// Row-major values, `values[j * x.len() + i]`.
    pub values: Vec<f64>,
    pub x_range: AxisRange,
    /// `y_range.max` is drawn at the top.
    pub y_range: AxisRange,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
}

impl Slice2 {
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.x.len() + i]
    }

    /// Minimum and maximum of the finite values, if any.
    pub fn finite_range(&self) -> Option<[f64; 2]> {
        finite_range(&self.values)
    }
}

pub fn finite_range(values: &[f64]) -> Option<[f64; 2]> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some([v, v]),
            Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
        })
}

/// One point of a vertical profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub depth: f64,
    pub value: f64,
}

/// Radiocarbon age (years) on a [`Grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgeField {
    grid: Grid,
    values: Vec<f64>,
}

impl AgeField {
    pub fn new(grid: Grid, values: Vec<f64>) -> Result<Self, FieldError> {
        if values.len() != grid.len() {
            return Err(FieldError::ShapeMismatch {
                expected: grid.len(),
                got: values.len(),
            });
        }
        Ok(Self { grid, values })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn value(&self, i: usize, j: usize, k: usize) -> f64 {
        self.values[self.grid.index(i, j, k)]
    }

    pub fn finite_range(&self) -> Option<[f64; 2]> {
        finite_range(&self.values)
    }

    /// Lon/lat map at depth level `k`.
    pub fn horizontal_slice(&self, k: usize) -> Option<Slice2> {
        let (nlon, nlat, ndepth) = self.grid.shape();
        if k >= ndepth {
            return None;
        }
        let start = self.grid.index(0, 0, k);
        let values = self.values[start..start + nlon * nlat].to_vec();
        Some(Slice2 {
            x: self.grid.lon.clone(),
            y: self.grid.lat.clone(),
            values,
            x_range: self.grid.lon_extent(),
            y_range: self.grid.lat_extent(),
            x_label: "Longitude (°E)".to_string(),
            y_label: "Latitude (°N)".to_string(),
            title: format!("Radiocarbon age at {:.0} m", self.grid.depth[k]),
        })
    }

    /// Latitude/depth section along the longitude nearest to `lon`.
    pub fn meridional_section(&self, lon: f64) -> Option<Slice2> {
        let i = self.grid.nearest_lon(lon)?;
        let (_, nlat, ndepth) = self.grid.shape();
        let mut values = Vec::with_capacity(nlat * ndepth);
        for k in 0..ndepth {
            for j in 0..nlat {
                values.push(self.value(i, j, k));
            }
        }
        let depth = self.grid.depth_extent();
        Some(Slice2 {
            x: self.grid.lat.clone(),
            y: self.grid.depth.clone(),
            values,
            x_range: self.grid.lat_extent(),
            // Surface at the top.
            y_range: AxisRange::new(depth.max, depth.min),
            x_label: "Latitude (°N)".to_string(),
            y_label: "Depth (m)".to_string(),
            title: format!("Section at {:.1}°E", self.grid.lon[i]),
        })
    }

    /// Grid column nearest to a lon/lat position.
    pub fn nearest_column(&self, pos: PlotPos) -> Option<(usize, usize)> {
        Some((self.grid.nearest_lon(pos.x)?, self.grid.nearest_lat(pos.y)?))
    }

    /// Values down the column nearest to `pos`, skipping land and
    /// below-bottom cells. Empty over land.
    pub fn depth_profile(&self, pos: PlotPos) -> Vec<ProfilePoint> {
        let Some((i, j)) = self.nearest_column(pos) else {
            return Vec::new();
        };
        self.grid
            .depth
            .iter()
            .enumerate()
            .filter_map(|(k, &depth)| {
                let value = self.value(i, j, k);
                value.is_finite().then_some(ProfilePoint { depth, value })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_field() -> AgeField {
        let grid = Grid::regular(4, 3, vec![10.0, 100.0]).unwrap();
        let values: Vec<f64> = (0..grid.len()).map(|n| n as f64).collect();
        AgeField::new(grid, values).unwrap()
    }

    #[test]
    fn regular_grid_has_cell_centres() {
        let g = Grid::regular(4, 2, vec![5.0]).unwrap();
        assert_eq!(g.lon, vec![45.0, 135.0, 225.0, 315.0]);
        assert_eq!(g.lat, vec![-45.0, 45.0]);
        assert_eq!(g.lon_extent(), AxisRange::new(0.0, 360.0));
        assert_eq!(g.lat_extent(), AxisRange::new(-90.0, 90.0));
    }

    #[test]
    fn unsorted_axis_is_rejected() {
        let err = Grid::new(vec![0.0, 1.0], vec![2.0, 1.0], vec![5.0]).unwrap_err();
        assert_eq!(err, FieldError::UnsortedAxis("lat"));
    }

    #[test]
    fn value_count_must_match_grid() {
        let g = Grid::regular(2, 2, vec![5.0]).unwrap();
        assert!(matches!(
            AgeField::new(g, vec![0.0; 3]),
            Err(FieldError::ShapeMismatch {
                expected: 4,
                got: 3
            })
        ));
    }

    #[test]
    fn nearest_lon_wraps_around_the_date_line() {
        let g = Grid::regular(4, 2, vec![5.0]).unwrap();
        assert_eq!(g.nearest_lon(359.0), Some(3));
        assert_eq!(g.nearest_lon(-10.0), Some(3));
        assert_eq!(g.nearest_lon(370.0), Some(0));
        assert_eq!(g.nearest_lon(f64::NAN), None);
    }

    #[test]
    fn horizontal_slice_takes_one_level() {
        let f = small_field();
        let s = f.horizontal_slice(1).unwrap();
        assert_eq!(s.values.len(), 12);
        assert_eq!(s.value(0, 0), 12.0);
        assert_eq!(s.value(3, 2), 23.0);
        assert!(f.horizontal_slice(2).is_none());
    }

    #[test]
    fn section_has_surface_on_top() {
        let f = small_field();
        let s = f.meridional_section(50.0).unwrap();
        assert!(s.y_range.max < s.y_range.min);
        assert_eq!(s.y_range.max, 0.0);
        // column i = 0, level 1, lat 2
        assert_eq!(s.value(2, 1), f.value(0, 2, 1));
    }

    #[test]
    fn three_cell_axes_have_edges() {
        let grid = Grid::regular(2, 3, vec![10.0, 100.0, 1000.0]).unwrap();
        assert_eq!(grid.lat_extent(), AxisRange::new(-90.0, 90.0));
        assert_eq!(grid.depth_extent(), AxisRange::new(0.0, 1450.0));

        let f = AgeField::new(grid, (0..18).map(f64::from).collect()).unwrap();
        let s = f.meridional_section(270.0).unwrap();
        assert_eq!(s.values.len(), 9);
        assert_eq!(s.y_range, AxisRange::new(1450.0, 0.0));
        assert_eq!(s.value(1, 2), f.value(1, 1, 2));
    }

    #[test]
    fn profile_skips_land_cells() {
        let grid = Grid::regular(1, 1, vec![10.0, 100.0, 1000.0]).unwrap();
        let f = AgeField::new(grid, vec![400.0, 800.0, f64::NAN]).unwrap();
        let p = f.depth_profile(PlotPos::new(180.0, 0.0));
        assert_eq!(p.len(), 2);
        assert_eq!(p[1], ProfilePoint { depth: 100.0, value: 800.0 });
    }

    #[test]
    fn cell_edges_are_midpoints() {
        let c = [5.0, 15.0, 30.0];
        assert_eq!(cell_edges(&c, 0), [0.0, 10.0]);
        assert_eq!(cell_edges(&c, 1), [10.0, 22.5]);
        assert_eq!(cell_edges(&c, 2), [22.5, 37.5]);
    }

    #[test]
    fn finite_range_ignores_nan() {
        assert_eq!(finite_range(&[f64::NAN, 3.0, 1.0]), Some([1.0, 3.0]));
        assert_eq!(finite_range(&[f64::NAN]), None);
    }
}
