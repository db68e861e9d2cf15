//! Heatmap rasterizer for field slices.
//!
//! Produces an RGBA image with the data area inset by margins, together with
//! the [`PlotGeometry`] and [`AxisLimits`] a [`ClickablePlot`](crate::widget::ClickablePlot)
//! needs to map clicks back to data space. Text is not rasterized here; tick
//! labels are drawn by the UI overlay using [`nice_ticks`].

use std::fmt;
use std::path::Path;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::colormap::Colormap;
use crate::error::SetupError;
use crate::field::{cell_edges, Slice2};
use crate::geometry::{AxisLimits, AxisRange, PixelRect, PlotGeometry, PlotPos};
use crate::transform::AffineTransform;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    EmptySlice,
    /// Image too small for its margins, or too large to allocate.
    BadSize { width: u32, height: u32 },
    Setup(SetupError),
    Io(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::EmptySlice => write!(f, "nothing to render: slice has no cells"),
            RenderError::BadSize { width, height } => {
                write!(f, "cannot render a {width}x{height} px image with the given margins")
            }
            RenderError::Setup(e) => write!(f, "{e}"),
            RenderError::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Setup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SetupError> for RenderError {
    fn from(e: SetupError) -> Self {
        RenderError::Setup(e)
    }
}

/// Data-space rectangle drawn as masked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskRegion {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

impl MaskRegion {
    pub fn contains(&self, p: PlotPos) -> bool {
        AxisRange::new(self.x[0], self.x[1]).contains(p.x)
            && AxisRange::new(self.y[0], self.y[1]).contains(p.y)
    }
}

/// Space between the image border and the data area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 56,
            right: 16,
            top: 16,
            bottom: 36,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapOptions {
    pub width: u32,
    pub height: u32,
    pub margins: Margins,
    pub colormap: Colormap,
    /// Colour range; `None` fits the finite values of the slice.
    pub display_range: Option<[f64; 2]>,
    pub contour_levels: Vec<f64>,
    pub show_contours: bool,
    pub mask: Option<MaskRegion>,
    pub units: String,
    pub masked_color: [u8; 3],
    pub background: [u8; 3],
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            width: 720,
            height: 400,
            margins: Margins::default(),
            colormap: Colormap::default(),
            display_range: None,
            contour_levels: Vec::new(),
            show_contours: false,
            mask: None,
            units: String::new(),
            masked_color: [160, 160, 160],
            background: [255, 255, 255],
        }
    }
}

impl HeatmapOptions {
    /// Inner plot area for the configured size and margins.
    pub fn plot_area(&self) -> Result<PixelRect, RenderError> {
        let m = self.margins;
        let bad = RenderError::BadSize {
            width: self.width,
            height: self.height,
        };
        let inner_w = m
            .left
            .checked_add(m.right)
            .and_then(|h| self.width.checked_sub(h))
            .ok_or(bad.clone())?;
        let inner_h = m
            .top
            .checked_add(m.bottom)
            .and_then(|v| self.height.checked_sub(v))
            .ok_or(bad.clone())?;
        if inner_w == 0 || inner_h == 0 {
            return Err(bad);
        }
        Ok(PixelRect::new(
            m.left as f32,
            m.top as f32,
            inner_w as f32,
            inner_h as f32,
        ))
    }

    fn active_levels(&self) -> Vec<f64> {
        if !self.show_contours {
            return Vec::new();
        }
        let mut levels: Vec<f64> = self
            .contour_levels
            .iter()
            .copied()
            .filter(|l| l.is_finite())
            .collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup();
        levels
    }
}

/// A rasterized plot and the layout it was drawn with.
#[derive(Debug, Clone)]
pub struct RenderedPlot {
    pub image: RgbaImage,
    pub geometry: PlotGeometry,
    pub limits: AxisLimits,
    /// Colour range actually used.
    pub display_range: [f64; 2],
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub units: String,
}

impl RenderedPlot {
    /// Wrap an externally produced raster.
    pub fn from_parts(image: RgbaImage, geometry: PlotGeometry, limits: AxisLimits) -> Self {
        Self {
            image,
            geometry,
            limits,
            display_range: [0.0, 1.0],
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            units: String::new(),
        }
    }

    pub fn size(&self) -> [u32; 2] {
        [self.image.width(), self.image.height()]
    }

    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| RenderError::Io(format!("Failed to write {:?}: {}", path, e)))?;
        log::info!("saved {}x{} px plot to {:?}", self.image.width(), self.image.height(), path);
        Ok(())
    }
}

const MAX_TICKS: f64 = 1000.0;

/// Evenly spaced "round" tick values inside `range`, roughly `target` of them.
/// Empty when the range is too narrow for its magnitude to place distinct ticks.
pub fn nice_ticks(range: AxisRange, target: usize) -> Vec<f64> {
    let (low, high) = (range.low(), range.high());
    let span = high - low;
    if !span.is_finite() || span <= 0.0 || target == 0 {
        return Vec::new();
    }
    let raw = span / target as f64;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let step = mag
        * if norm < 1.5 {
            1.0
        } else if norm < 3.0 {
            2.0
        } else if norm < 7.0 {
            5.0
        } else {
            10.0
        };
    let eps = step * 1e-9;
    let first = ((low - eps) / step).ceil();
    let last = ((high + eps) / step).floor();
    // Steps below the float resolution of the bounds cannot be told apart.
    let count = last - first;
    if !(0.0..=MAX_TICKS).contains(&count) || first * step + step == first * step {
        return Vec::new();
    }
    (0..=count as usize)
        .map(|n| {
            let t = (first + n as f64) * step;
            // Avoid printing -0
            if t.abs() < eps {
                0.0
            } else {
                t
            }
        })
        .collect()
}

/// Index of the band `v` falls into given sorted `levels`.
fn band_of(levels: &[f64], v: f64) -> usize {
    levels.partition_point(|l| *l <= v)
}

/// Representative value of a band, used for its colour.
fn band_value(levels: &[f64], band: usize, range: [f64; 2]) -> f64 {
    let lo = if band == 0 { range[0] } else { levels[band - 1] };
    let hi = levels.get(band).copied().unwrap_or(range[1]);
    (lo + hi) / 2.0
}

fn color_paint(rgb: [u8; 3]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgb[0], rgb[1], rgb[2], 255);
    paint.anti_alias = false;
    paint
}

fn stroke_line(pixmap: &mut Pixmap, paint: &Paint, width: f32, a: (f32, f32), b: (f32, f32)) {
    let mut pb = PathBuilder::new();
    pb.move_to(a.0, a.1);
    pb.line_to(b.0, b.1);
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), None);
    }
}

/// Rasterize `slice` as a heatmap.
pub fn render_heatmap(slice: &Slice2, opts: &HeatmapOptions) -> Result<RenderedPlot, RenderError> {
    let (nx, ny) = (slice.x.len(), slice.y.len());
    if nx == 0 || ny == 0 || slice.values.len() != nx * ny {
        return Err(RenderError::EmptySlice);
    }
    let inner = opts.plot_area()?;
    let outer = PixelRect::from_size(opts.width as f32, opts.height as f32);
    let geometry = PlotGeometry::new(inner, outer);
    let limits = AxisLimits::new(slice.x_range, slice.y_range);
    let transform = AffineTransform::new(&geometry, &limits)?;

    let mut range = opts
        .display_range
        .or_else(|| slice.finite_range())
        .unwrap_or([0.0, 1.0]);
    if !(range[1] > range[0]) {
        range[1] = range[0] + 1.0;
    }
    let levels = opts.active_levels();

    let mut pixmap = Pixmap::new(opts.width, opts.height).ok_or(RenderError::BadSize {
        width: opts.width,
        height: opts.height,
    })?;
    let bg = opts.background;
    pixmap.fill(Color::from_rgba8(bg[0], bg[1], bg[2], 255));

    let to_px = |p: PlotPos| {
        let f = transform.invert(p);
        (
            outer.x + (f.fx * outer.width as f64) as f32,
            outer.y + (f.fy * outer.height as f64) as f32,
        )
    };
    let x_edges: Vec<[f64; 2]> = (0..nx).map(|i| cell_edges(&slice.x, i)).collect();
    let y_edges: Vec<[f64; 2]> = (0..ny).map(|j| cell_edges(&slice.y, j)).collect();

    // Cells
    let mut bands = vec![None; nx * ny];
    for j in 0..ny {
        for i in 0..nx {
            let v = slice.value(i, j);
            let centre = PlotPos::new(slice.x[i], slice.y[j]);
            let masked = !v.is_finite() || opts.mask.is_some_and(|m| m.contains(centre));
            let rgb = if masked {
                opts.masked_color
            } else if levels.is_empty() {
                opts.colormap.sample((v - range[0]) / (range[1] - range[0]))
            } else {
                let band = band_of(&levels, v);
                bands[j * nx + i] = Some(band);
                let bv = band_value(&levels, band, range);
                opts.colormap.sample((bv - range[0]) / (range[1] - range[0]))
            };
            let (x0, y0) = to_px(PlotPos::new(x_edges[i][0], y_edges[j][0]));
            let (x1, y1) = to_px(PlotPos::new(x_edges[i][1], y_edges[j][1]));
            // Round outwards so neighbouring cells leave no seams.
            let rect = Rect::from_ltrb(
                x0.min(x1).floor(),
                y0.min(y1).floor(),
                x0.max(x1).ceil(),
                y0.max(y1).ceil(),
            );
            if let Some(rect) = rect {
                pixmap.fill_rect(rect, &color_paint(rgb), Transform::identity(), None);
            }
        }
    }

    // Band boundaries
    if !levels.is_empty() {
        let paint = color_paint([20, 20, 20]);
        for j in 0..ny {
            for i in 0..nx {
                let Some(here) = bands[j * nx + i] else {
                    continue;
                };
                if i + 1 < nx && bands[j * nx + i + 1].is_some_and(|b| b != here) {
                    let x = x_edges[i][1];
                    let a = to_px(PlotPos::new(x, y_edges[j][0]));
                    let b = to_px(PlotPos::new(x, y_edges[j][1]));
                    stroke_line(&mut pixmap, &paint, 2.0, a, b);
                }
                if j + 1 < ny && bands[(j + 1) * nx + i].is_some_and(|b| b != here) {
                    let y = y_edges[j][1];
                    let a = to_px(PlotPos::new(x_edges[i][0], y));
                    let b = to_px(PlotPos::new(x_edges[i][1], y));
                    stroke_line(&mut pixmap, &paint, 2.0, a, b);
                }
            }
        }
    }

    // Frame and tick marks
    let frame_paint = color_paint([0, 0, 0]);
    let (left, top) = (inner.x, inner.y);
    let (right, bottom) = (inner.x + inner.width, inner.y + inner.height);
    if let Some(frame) = Rect::from_ltrb(left, top, right, bottom) {
        let path = PathBuilder::from_rect(frame);
        pixmap.stroke_path(
            &path,
            &frame_paint,
            &Stroke::default(),
            Transform::identity(),
            None,
        );
    }
    for t in nice_ticks(limits.x, 6) {
        let (x, _) = to_px(PlotPos::new(t, limits.y.max));
        stroke_line(&mut pixmap, &frame_paint, 1.0, (x, bottom), (x, bottom + 5.0));
    }
    for t in nice_ticks(limits.y, 5) {
        let (_, y) = to_px(PlotPos::new(limits.x.min, t));
        stroke_line(&mut pixmap, &frame_paint, 1.0, (left - 5.0, y), (left, y));
    }

    // Every pixel is opaque, so premultiplied and straight alpha coincide.
    let image = RgbaImage::from_raw(opts.width, opts.height, pixmap.take()).ok_or(
        RenderError::BadSize {
            width: opts.width,
            height: opts.height,
        },
    )?;
    log::debug!(
        "rendered {} ({}x{} cells) into {}x{} px",
        slice.title,
        nx,
        ny,
        opts.width,
        opts.height
    );

    Ok(RenderedPlot {
        image,
        geometry,
        limits,
        display_range: range,
        title: slice.title.clone(),
        x_label: slice.x_label.clone(),
        y_label: slice.y_label.clone(),
        units: opts.units.clone(),
    })
}
