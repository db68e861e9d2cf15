//! ageplot crate root: re-exports and module wiring.
//!
//! A click-to-coordinate plot widget and a radiocarbon age explorer built on
//! egui/eframe:
//! - `geometry`, `transform`: render-time layout snapshot and the
//!   pixel-fraction to data-space mapping
//! - `widget`: pointer state machine publishing into a `selection` binding
//! - `events`: optional event stream of widget interactions
//! - `field`, `model`: gridded age field and the age source seam
//! - `colormap`, `render`: heatmap rasterization
//! - `ui`, `app`: egui front end and the explorer window
//! - `config`, `persistence`: YAML settings and JSON sessions

pub mod app;
pub mod colormap;
pub mod config;
pub mod error;
pub mod events;
pub mod field;
pub mod geometry;
pub mod model;
pub mod persistence;
pub mod render;
pub mod selection;
pub mod transform;
pub mod ui;
pub mod widget;

// Public re-exports for a compact external API
pub use app::{run_explorer, ExplorerApp, ExplorerError, ExplorerState};
pub use colormap::Colormap;
pub use config::{AppConfig, ClickablePlotConfig, GuardReset};
pub use error::SetupError;
pub use events::{EventController, EventFilter, EventKind, WidgetEvent};
pub use field::{AgeField, Grid, Slice2};
pub use geometry::{AxisLimits, AxisRange, Fraction, PixelRect, PlotGeometry, PlotPos, ScreenPos};
pub use model::{radiocarbon_age, AgeParams, AgeSource, SolveError, SyntheticAgeModel};
pub use render::{render_heatmap, HeatmapOptions, MaskRegion, RenderError, RenderedPlot};
pub use selection::{SelectionBinding, SelectionUpdate};
pub use transform::AffineTransform;
pub use widget::{ClickablePlot, PointerEvent, PointerPhase};
