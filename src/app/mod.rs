//! Radiocarbon age explorer application.
//!
//! | Sub-module   | Responsibility |
//! | ------------ | -------------- |
//! | [`update`]   | Per-frame selection/event draining and the [`eframe::App`] impl |
//! | [`layout`]   | Menu bar, control sidebar, map/profile/section panels |
//! | [`run`]      | Top-level [`run_explorer()`] entry point |
//!
//! All state that does not need an egui context lives in [`ExplorerState`] so
//! it can be driven headless.

mod layout;
mod run;
mod update;

pub use run::run_explorer;

use std::fmt;
use std::path::Path;
use std::sync::mpsc::Receiver;

use crate::config::{AppConfig, ClickablePlotConfig, GuardReset};
use crate::error::SetupError;
use crate::events::{EventController, EventFilter, EventKind, WidgetEvent};
use crate::field::{AgeField, ProfilePoint, STANDARD_DEPTHS};
use crate::geometry::PlotPos;
use crate::model::{AgeParams, AgeSource, SolveError, SyntheticAgeModel};
use crate::persistence::{self, SessionState};
use crate::render::{render_heatmap, HeatmapOptions, Margins, RenderError, RenderedPlot};
use crate::selection::SelectionUpdate;
use crate::ui::PlotImageView;
use crate::widget::ClickablePlot;

/// Grid resolution of the built-in synthetic model.
pub const DEFAULT_GRID: (usize, usize) = (72, 36);

#[derive(Debug)]
pub enum ExplorerError {
    Solve(SolveError),
    Render(RenderError),
    Setup(SetupError),
    Ui(eframe::Error),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerError::Solve(e) => write!(f, "age source failed: {e}"),
            ExplorerError::Render(e) => write!(f, "rendering failed: {e}"),
            ExplorerError::Setup(e) => write!(f, "widget setup failed: {e}"),
            ExplorerError::Ui(e) => write!(f, "window error: {e}"),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<SolveError> for ExplorerError {
    fn from(e: SolveError) -> Self {
        ExplorerError::Solve(e)
    }
}

impl From<RenderError> for ExplorerError {
    fn from(e: RenderError) -> Self {
        ExplorerError::Render(e)
    }
}

impl From<SetupError> for ExplorerError {
    fn from(e: SetupError) -> Self {
        ExplorerError::Setup(e)
    }
}

impl From<eframe::Error> for ExplorerError {
    fn from(e: eframe::Error) -> Self {
        ExplorerError::Ui(e)
    }
}

/// Headless explorer state: field, widgets and dependent views.
pub struct ExplorerState {
    pub cfg: AppConfig,
    field: AgeField,
    depth_index: usize,
    map: ClickablePlot,
    selection_rx: Receiver<SelectionUpdate>,
    events: EventController,
    events_rx: Receiver<WidgetEvent>,
    /// Meridional section at the selected longitude; clicking it picks a depth.
    section: Option<ClickablePlot>,
    section_rx: Option<Receiver<SelectionUpdate>>,
    profile: Vec<ProfilePoint>,
    profile_pos: Option<PlotPos>,
    pub status: String,
}

impl ExplorerState {
    /// Solve the built-in synthetic model and set up the views.
    pub fn new(cfg: AppConfig) -> Result<Self, ExplorerError> {
        let grid = crate::field::Grid::regular(
            DEFAULT_GRID.0,
            DEFAULT_GRID.1,
            STANDARD_DEPTHS.to_vec(),
        )
        .map_err(SolveError::from)?;
        let source = SyntheticAgeModel::new(grid);
        Self::with_source(cfg, &source, &AgeParams::default())
    }

    pub fn with_source(
        cfg: AppConfig,
        source: &dyn AgeSource,
        params: &AgeParams,
    ) -> Result<Self, ExplorerError> {
        let field = source.solve(params)?;
        log::info!("age field from {} source ready", source.name());
        Self::with_field(cfg, field)
    }

    pub fn with_field(cfg: AppConfig, field: AgeField) -> Result<Self, ExplorerError> {
        let ndepth = field.grid().depth.len();
        let depth_index = cfg.initial_depth_index.min(ndepth.saturating_sub(1));
        let events = EventController::new();
        let events_rx = events.subscribe(EventFilter::only(
            EventKind::SUPPRESSED | EventKind::RERENDER,
        ));

        let map_plot = render_map(&field, depth_index, &cfg)?;
        let map = ClickablePlot::new(map_plot, cfg.widget_config().events(events.clone()))?;
        let selection_rx = map.selection().subscribe();

        let mut state = Self {
            cfg,
            field,
            depth_index,
            map,
            selection_rx,
            events,
            events_rx,
            section: None,
            section_rx: None,
            profile: Vec::new(),
            profile_pos: None,
            status: String::new(),
        };
        if let Some(pos) = state.map.selection().get() {
            state.refresh_dependents(pos);
        }
        Ok(state)
    }

    pub fn field(&self) -> &AgeField {
        &self.field
    }

    pub fn map(&self) -> &ClickablePlot {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut ClickablePlot {
        &mut self.map
    }

    pub fn section(&self) -> Option<&ClickablePlot> {
        self.section.as_ref()
    }

    pub fn section_mut(&mut self) -> Option<&mut ClickablePlot> {
        self.section.as_mut()
    }

    pub fn profile(&self) -> &[ProfilePoint] {
        &self.profile
    }

    /// Coordinate the profile and section were last drawn for.
    pub fn profile_pos(&self) -> Option<PlotPos> {
        self.profile_pos
    }

    pub fn depth_index(&self) -> usize {
        self.depth_index
    }

    pub fn depth(&self) -> f64 {
        self.field.grid().depth[self.depth_index]
    }

    /// Show another depth level. The map is re-rendered, which re-attaches
    /// pointer handling.
    pub fn set_depth_index(&mut self, k: usize) {
        let k = k.min(self.field.grid().depth.len().saturating_sub(1));
        if k == self.depth_index {
            return;
        }
        self.depth_index = k;
        self.rerender_map();
    }

    pub fn set_draggable(&mut self, draggable: bool) {
        self.cfg.draggable = draggable;
        self.map.set_draggable(draggable);
    }

    /// Re-render map and section after a display setting changed.
    pub fn apply_display_settings(&mut self) {
        self.rerender_map();
        if let Some(pos) = self.profile_pos {
            self.refresh_section(pos);
        }
    }

    fn rerender_map(&mut self) {
        let result = render_map(&self.field, self.depth_index, &self.cfg)
            .map_err(ExplorerError::from)
            .and_then(|plot| self.map.rerender(plot).map_err(ExplorerError::from));
        if let Err(e) = result {
            self.report_error(&e);
        }
    }

    /// Apply pending selection updates. Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        if let Some(update) = self.selection_rx.try_iter().last() {
            self.refresh_dependents(update.pos);
            changed = true;
        }
        let picked = self.section_rx.as_ref().and_then(|rx| rx.try_iter().last());
        if let Some(k) = picked.and_then(|u| self.field.grid().nearest_depth(u.pos.y)) {
            if k != self.depth_index {
                self.set_depth_index(k);
                changed = true;
            }
        }
        for ev in self.events_rx.try_iter() {
            if ev.kinds.contains(EventKind::SUPPRESSED) {
                self.status = "Click ignored: selection already taken for this map".to_string();
            } else if let Some(meta) = ev.render {
                log::debug!("map re-rendered (generation {})", meta.generation);
            }
        }
        changed
    }

    fn refresh_dependents(&mut self, pos: PlotPos) {
        self.profile = self.field.depth_profile(pos);
        self.profile_pos = Some(pos);
        self.status = if self.profile.is_empty() {
            format!("({:.1}°E, {:.1}°N) is land", pos.x, pos.y)
        } else {
            format!("Selected {:.1}°E, {:.1}°N", pos.x, pos.y)
        };
        self.refresh_section(pos);
    }

    fn refresh_section(&mut self, pos: PlotPos) {
        let Some(slice) = self.field.meridional_section(pos.x) else {
            return;
        };
        if let Err(e) = self.replace_section(render_heatmap(&slice, &section_options(&self.cfg))) {
            self.report_error(&e);
        }
    }

    fn replace_section(
        &mut self,
        plot: Result<RenderedPlot, RenderError>,
    ) -> Result<(), ExplorerError> {
        let plot = plot?;
        match &mut self.section {
            Some(section) => section.rerender(plot)?,
            None => {
                let cfg = ClickablePlotConfig::default().guard_reset(GuardReset::OnRelease);
                let section = ClickablePlot::new(plot, cfg)?;
                self.section_rx = Some(section.selection().subscribe());
                self.section = Some(section);
            }
        }
        Ok(())
    }

    fn report_error(&mut self, e: &ExplorerError) {
        log::error!("{e}");
        self.status = e.to_string();
    }

    pub fn export_map_png(&self, path: &Path) -> Result<(), String> {
        self.map.plot().save_png(path).map_err(|e| e.to_string())
    }

    pub fn session(&self) -> SessionState {
        SessionState {
            version: persistence::SESSION_FORMAT_VERSION,
            saved_at: None,
            selection: self.map.selection().get(),
            depth_index: self.depth_index,
            draggable: self.cfg.draggable,
            guard_reset: self.cfg.guard_reset,
            colormap: self.cfg.colormap,
            display_range: self.cfg.display_range,
            contour_levels: self.cfg.contour_levels.clone(),
            show_contours: self.cfg.show_contours,
            window_size: Some(self.cfg.window_size),
        }
    }

    pub fn save_session(&self, path: &Path) -> Result<(), String> {
        persistence::save_state_to_path(&self.session().stamped(), path)?;
        log::info!("session saved to {:?}", path);
        Ok(())
    }

    /// Restore a session. The map widget is rebuilt on a fresh binding seeded
    /// with the stored selection.
    ///
    /// Nothing changes unless the new map renders and its widget sets up.
    pub fn restore_session(&mut self, s: SessionState) -> Result<(), ExplorerError> {
        let mut cfg = self.cfg.clone();
        cfg.draggable = s.draggable;
        cfg.guard_reset = s.guard_reset;
        cfg.colormap = s.colormap;
        cfg.display_range = s.display_range;
        cfg.contour_levels = s.contour_levels;
        cfg.show_contours = s.show_contours;
        if let Some(size) = s.window_size {
            cfg.window_size = size;
        }
        let depth_index = s.depth_index.min(self.field.grid().depth.len().saturating_sub(1));

        let mut widget_cfg = cfg.widget_config().events(self.events.clone());
        widget_cfg.default_selection = s.selection;
        let plot = render_map(&self.field, depth_index, &cfg)?;
        let map = ClickablePlot::new(plot, widget_cfg)?;

        self.cfg = cfg;
        self.depth_index = depth_index;
        self.map = map;
        self.selection_rx = self.map.selection().subscribe();
        match self.map.selection().get() {
            Some(pos) => self.refresh_dependents(pos),
            None => {
                self.profile.clear();
                self.profile_pos = None;
                self.section = None;
                self.section_rx = None;
            }
        }
        Ok(())
    }

    pub fn load_session(&mut self, path: &Path) -> Result<(), String> {
        let s = persistence::load_state_from_path(path)?;
        self.restore_session(s).map_err(|e| e.to_string())?;
        log::info!("session loaded from {:?}", path);
        Ok(())
    }
}

fn map_options(cfg: &AppConfig) -> HeatmapOptions {
    HeatmapOptions {
        width: cfg.map_size[0],
        height: cfg.map_size[1],
        margins: Margins::default(),
        colormap: cfg.colormap,
        display_range: cfg.display_range,
        contour_levels: cfg.contour_levels.clone(),
        show_contours: cfg.show_contours,
        mask: cfg.mask,
        units: cfg.units.clone(),
        ..HeatmapOptions::default()
    }
}

fn section_options(cfg: &AppConfig) -> HeatmapOptions {
    HeatmapOptions {
        width: cfg.section_size[0],
        height: cfg.section_size[1],
        mask: None,
        ..map_options(cfg)
    }
}

fn render_map(field: &AgeField, k: usize, cfg: &AppConfig) -> Result<RenderedPlot, RenderError> {
    let slice = field.horizontal_slice(k).ok_or(RenderError::EmptySlice)?;
    render_heatmap(&slice, &map_options(cfg))
}

/// eframe application wrapping an [`ExplorerState`].
pub struct ExplorerApp {
    pub state: ExplorerState,
    map_view: PlotImageView,
    section_view: PlotImageView,
}

impl ExplorerApp {
    pub fn new(state: ExplorerState) -> Self {
        Self {
            state,
            map_view: PlotImageView::new("age_map"),
            section_view: PlotImageView::new("age_section"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Grid;
    use crate::geometry::{PixelRect, ScreenPos};
    use crate::widget::PointerEvent;

    fn small_state(cfg: AppConfig) -> ExplorerState {
        let grid = Grid::regular(36, 18, STANDARD_DEPTHS.to_vec()).unwrap();
        let field = SyntheticAgeModel::new(grid)
            .solve(&AgeParams::default())
            .unwrap();
        ExplorerState::with_field(cfg, field).unwrap()
    }

    fn map_rect(state: &ExplorerState) -> PixelRect {
        let [w, h] = state.map().plot().size();
        PixelRect::from_size(w as f32, h as f32)
    }

    #[test]
    fn default_selection_draws_dependents() {
        let state = small_state(AppConfig::default());
        assert_eq!(state.profile_pos(), Some(PlotPos::new(200.0, -30.0)));
        assert!(!state.profile().is_empty());
        assert!(state.section().is_some());
    }

    #[test]
    fn click_updates_profile_after_poll() {
        let mut state = small_state(AppConfig::default());
        let rect = map_rect(&state);
        let inner = state.map().plot().geometry.inner;
        let centre = ScreenPos::new(inner.x + inner.width / 2.0, inner.y + inner.height / 2.0);
        let p = state.map_mut().handle(PointerEvent::Down(centre), rect).unwrap();
        assert!((p.x - 180.0).abs() < 1.0);
        assert!(state.poll());
        assert_eq!(state.profile_pos(), Some(p));
        assert!(!state.poll());
    }

    #[test]
    fn depth_change_rerenders_and_rearms_guard() {
        let mut state = small_state(AppConfig::default());
        let rect = map_rect(&state);
        state
            .map_mut()
            .handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), rect);
        state.map_mut().handle(PointerEvent::Up, rect);
        assert!(!state.map().guard_armed());

        state.set_depth_index(3);
        assert_eq!(state.map().generation(), 1);
        assert!(state.map().guard_armed());
        assert_eq!(state.depth(), STANDARD_DEPTHS[3]);
    }

    #[test]
    fn suppressed_click_is_reported() {
        let mut state = small_state(AppConfig::default());
        let rect = map_rect(&state);
        let pos = ScreenPos::new(300.0, 200.0);
        state.map_mut().handle(PointerEvent::Down(pos), rect);
        state.map_mut().handle(PointerEvent::Up, rect);
        state.map_mut().handle(PointerEvent::Down(pos), rect);
        state.poll();
        assert!(state.status.contains("ignored"));
    }

    #[test]
    fn clicking_the_section_picks_a_depth() {
        let mut state = small_state(AppConfig::default());
        let section = state.section_mut().unwrap();
        let [w, h] = section.plot().size();
        let rect = PixelRect::from_size(w as f32, h as f32);
        let inner = section.plot().geometry.inner;
        // Bottom edge of the data area is the deepest level.
        let deep = ScreenPos::new(inner.x + inner.width / 2.0, inner.y + inner.height - 1.0);
        section.handle(PointerEvent::Down(deep), rect);
        state.poll();
        assert_eq!(state.depth_index(), STANDARD_DEPTHS.len() - 1);
    }

    #[test]
    fn session_roundtrip_restores_selection_and_depth() {
        let mut state = small_state(AppConfig::default());
        let mut s = state.session();
        s.selection = Some(PlotPos::new(160.0, 10.0));
        s.depth_index = 5;
        s.draggable = true;
        state.restore_session(s).unwrap();
        assert_eq!(state.map().selection().get(), Some(PlotPos::new(160.0, 10.0)));
        assert_eq!(state.depth_index(), 5);
        assert!(state.map().draggable());
        assert_eq!(state.profile_pos(), Some(PlotPos::new(160.0, 10.0)));
    }

    #[test]
    fn failed_restore_keeps_previous_state() {
        let mut state = small_state(AppConfig::default());
        let before = state.session();
        let map_generation = state.map().generation();
        let mut s = before.clone();
        s.selection = Some(PlotPos::new(f64::NAN, 0.0));
        s.depth_index = 3;
        s.colormap = crate::colormap::Colormap::Magma;
        s.draggable = true;

        assert!(state.restore_session(s).is_err());
        assert_eq!(state.session(), before);
        assert_eq!(state.depth_index(), 12);
        assert!(!state.map().draggable());
        assert_eq!(state.map().generation(), map_generation);
        assert_eq!(state.map().selection().get(), Some(PlotPos::new(200.0, -30.0)));
    }
}
