//! Clickable plot: pointer interaction over a rendered plot image, published
//! as a data-space coordinate.
//!
//! The widget is driven by [`PointerEvent`]s together with the on-screen
//! rectangle the image currently occupies. A press maps the pointer through
//! the [`AffineTransform`] derived at render time and publishes the result to
//! the [`SelectionBinding`]. In draggable mode a move listener is attached on
//! press and every move publishes until the pointer is released or leaves.
//!
//! ```text
//!   Idle --down--> Pressed --move (draggable)--> Dragging
//!    ^                |                              |
//!    +----up/leave----+-----------up/leave-----------+
//! ```

use crate::config::{ClickablePlotConfig, GuardReset};
use crate::error::SetupError;
use crate::events::{EventController, EventKind, PointerMeta, RenderMeta, WidgetEvent};
use crate::geometry::{Fraction, PixelRect, PlotPos, ScreenPos};
use crate::render::RenderedPlot;
use crate::selection::SelectionBinding;
use crate::transform::AffineTransform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerPhase {
    #[default]
    Idle,
    Pressed,
    /// Draggable mode only.
    Dragging,
}

/// Pointer input in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Primary button went down over the image.
    Down(ScreenPos),
    /// Pointer moved.
    Move(ScreenPos),
    /// Primary button released anywhere.
    Up,
    /// Pointer left the window.
    Leave,
}

pub struct ClickablePlot {
    plot: RenderedPlot,
    transform: AffineTransform,
    draggable: bool,
    guard_reset: GuardReset,
    phase: PointerPhase,
    /// Set once a non-draggable press has published; cleared on attachment
    /// (and on release under [`GuardReset::OnRelease`]).
    fired: bool,
    move_listener: bool,
    generation: u64,
    selection: SelectionBinding,
    events: Option<EventController>,
}

impl ClickablePlot {
    /// Set up pointer handling for `plot` with a fresh selection binding.
    pub fn new(plot: RenderedPlot, cfg: ClickablePlotConfig) -> Result<Self, SetupError> {
        Self::with_binding(plot, cfg, SelectionBinding::new())
    }

    /// Set up pointer handling publishing into an existing binding.
    ///
    /// A configured default selection is seeded into `selection`, which fails
    /// if the binding already received interactive updates.
    pub fn with_binding(
        plot: RenderedPlot,
        cfg: ClickablePlotConfig,
        selection: SelectionBinding,
    ) -> Result<Self, SetupError> {
        let transform = AffineTransform::new(&plot.geometry, &plot.limits)?;
        if let Some(default) = cfg.default_selection {
            if !plot.limits.contains(default) {
                log::warn!(
                    "default selection ({}, {}) lies outside the axis limits",
                    default.x,
                    default.y
                );
            }
            selection.seed(default)?;
        }
        log::debug!(
            "clickable plot attached: draggable={} guard={:?} transform={:?}",
            cfg.draggable,
            cfg.guard_reset,
            transform
        );
        Ok(Self {
            plot,
            transform,
            draggable: cfg.draggable,
            guard_reset: cfg.guard_reset,
            phase: PointerPhase::Idle,
            fired: false,
            move_listener: false,
            generation: 0,
            selection,
            events: cfg.events,
        })
    }

    pub fn plot(&self) -> &RenderedPlot {
        &self.plot
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn selection(&self) -> &SelectionBinding {
        &self.selection
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    /// Whether move tracking is currently attached.
    pub fn move_listener_attached(&self) -> bool {
        self.move_listener
    }

    /// Whether the next non-draggable press will publish.
    pub fn guard_armed(&self) -> bool {
        !self.fired
    }

    /// Incremented on every successful [`rerender`](Self::rerender).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn draggable(&self) -> bool {
        self.draggable
    }

    /// Switch interaction mode. This re-attaches pointer handling: tracking
    /// is dropped and the guard re-armed.
    pub fn set_draggable(&mut self, draggable: bool) {
        if self.draggable != draggable {
            self.draggable = draggable;
            self.attach();
        }
    }

    /// Replace the raster, geometry and limits and derive a new transform.
    ///
    /// On error the widget keeps its previous plot and transform.
    pub fn rerender(&mut self, plot: RenderedPlot) -> Result<(), SetupError> {
        let transform = AffineTransform::new(&plot.geometry, &plot.limits)?;
        self.plot = plot;
        self.transform = transform;
        self.generation += 1;
        self.attach();
        self.emit(|| {
            WidgetEvent::new(EventKind::RERENDER).with_render(RenderMeta {
                geometry: self.plot.geometry,
                limits: self.plot.limits,
                generation: self.generation,
            })
        });
        Ok(())
    }

    /// Data coordinate under `pos` without publishing, or `None` when the
    /// image rectangle is empty.
    pub fn locate(&self, pos: ScreenPos, image_rect: PixelRect) -> Option<PlotPos> {
        image_rect
            .fraction_of(pos)
            .map(|f| self.transform.apply(f))
    }

    /// Feed one pointer event. `image_rect` is where the image is currently
    /// drawn on screen. Returns the coordinate if one was published.
    pub fn handle(&mut self, event: PointerEvent, image_rect: PixelRect) -> Option<PlotPos> {
        match event {
            PointerEvent::Down(pos) => self.on_down(pos, image_rect),
            PointerEvent::Move(pos) => self.on_move(pos, image_rect),
            PointerEvent::Up => {
                self.end_press(EventKind::RELEASE);
                None
            }
            PointerEvent::Leave => {
                self.end_press(EventKind::LEAVE);
                None
            }
        }
    }

    fn on_down(&mut self, pos: ScreenPos, image_rect: PixelRect) -> Option<PlotPos> {
        if self.phase != PointerPhase::Idle {
            // Missed the release of the previous press.
            self.detach();
        }
        let Some(fraction) = image_rect.fraction_of(pos) else {
            log::warn!("pointer down over a zero-size image rectangle, event dropped");
            return None;
        };
        self.phase = PointerPhase::Pressed;

        if !self.draggable && self.fired {
            log::debug!("press suppressed by one-shot guard");
            self.emit(|| WidgetEvent::new(EventKind::PRESS | EventKind::SUPPRESSED));
            return None;
        }

        let plot_pos = self.publish(pos, fraction, EventKind::PRESS);
        if self.draggable {
            self.move_listener = true;
        } else {
            self.fired = true;
        }
        Some(plot_pos)
    }

    fn on_move(&mut self, pos: ScreenPos, image_rect: PixelRect) -> Option<PlotPos> {
        if !self.move_listener {
            return None;
        }
        let Some(fraction) = image_rect.fraction_of(pos) else {
            log::warn!("pointer move over a zero-size image rectangle, event dropped");
            return None;
        };
        self.phase = PointerPhase::Dragging;
        Some(self.publish(pos, fraction, EventKind::DRAG))
    }

    fn end_press(&mut self, kind: EventKind) {
        let was_active = self.phase != PointerPhase::Idle;
        self.detach();
        if self.guard_reset == GuardReset::OnRelease {
            self.fired = false;
        }
        if was_active {
            self.emit(|| WidgetEvent::new(kind));
        }
    }

    fn publish(&mut self, screen_pos: ScreenPos, fraction: Fraction, kind: EventKind) -> PlotPos {
        let plot_pos = self.transform.apply(fraction);
        self.selection.offer(Some(plot_pos));
        self.emit(|| {
            WidgetEvent::new(kind | EventKind::SELECTION).with_pointer(PointerMeta {
                screen_pos,
                fraction,
                plot_pos,
            })
        });
        plot_pos
    }

    /// Drop move tracking and return to idle.
    fn detach(&mut self) {
        self.move_listener = false;
        self.phase = PointerPhase::Idle;
    }

    /// Fresh attachment of pointer handling.
    fn attach(&mut self) {
        self.detach();
        self.fired = false;
    }

    fn emit(&self, make: impl FnOnce() -> WidgetEvent) {
        if let Some(ctrl) = &self.events {
            ctrl.emit(make());
        }
    }
}

impl std::fmt::Debug for ClickablePlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickablePlot")
            .field("size", &self.plot.size())
            .field("transform", &self.transform)
            .field("draggable", &self.draggable)
            .field("phase", &self.phase)
            .field("fired", &self.fired)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventFilter;
    use crate::geometry::{AxisLimits, AxisRange, PlotGeometry};
    use image::RgbaImage;

    const RECT: PixelRect = PixelRect::new(0.0, 0.0, 600.0, 400.0);

    fn world_plot() -> RenderedPlot {
        RenderedPlot::from_parts(
            RgbaImage::new(600, 400),
            PlotGeometry::new(
                PixelRect::new(60.0, 40.0, 480.0, 320.0),
                PixelRect::from_size(600.0, 400.0),
            ),
            AxisLimits::new(AxisRange::new(0.0, 360.0), AxisRange::new(-90.0, 90.0)),
        )
    }

    fn widget(cfg: ClickablePlotConfig) -> ClickablePlot {
        ClickablePlot::new(world_plot(), cfg).unwrap()
    }

    #[test]
    fn press_at_centre_publishes_centre_of_limits() {
        let mut w = widget(ClickablePlotConfig::default());
        let p = w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        assert_eq!(p, Some(PlotPos::new(180.0, 0.0)));
        assert_eq!(w.selection().get(), Some(PlotPos::new(180.0, 0.0)));
        assert_eq!(w.phase(), PointerPhase::Pressed);
    }

    #[test]
    fn non_draggable_cycle_publishes_once() {
        let mut w = widget(ClickablePlotConfig::default());
        let rx = w.selection().subscribe();
        w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        assert_eq!(w.handle(PointerEvent::Move(ScreenPos::new(350.0, 220.0)), RECT), None);
        w.handle(PointerEvent::Up, RECT);
        assert_eq!(rx.try_iter().count(), 1);
        assert!(!w.move_listener_attached());
        assert_eq!(w.phase(), PointerPhase::Idle);
    }

    #[test]
    fn draggable_publishes_per_press_and_move() {
        let mut w = widget(ClickablePlotConfig::default().draggable(true));
        let rx = w.selection().subscribe();
        w.handle(PointerEvent::Down(ScreenPos::new(60.0, 40.0)), RECT);
        assert!(w.move_listener_attached());
        w.handle(PointerEvent::Move(ScreenPos::new(300.0, 200.0)), RECT);
        assert_eq!(w.phase(), PointerPhase::Dragging);
        w.handle(PointerEvent::Move(ScreenPos::new(540.0, 360.0)), RECT);
        w.handle(PointerEvent::Up, RECT);
        assert!(!w.move_listener_attached());

        let got: Vec<PlotPos> = rx.try_iter().map(|u| u.pos).collect();
        assert_eq!(
            got,
            vec![
                PlotPos::new(0.0, 90.0),
                PlotPos::new(180.0, 0.0),
                PlotPos::new(360.0, -90.0)
            ]
        );
        // Moves after release are not tracked.
        assert_eq!(w.handle(PointerEvent::Move(ScreenPos::new(1.0, 1.0)), RECT), None);
    }

    #[test]
    fn drag_outside_the_image_clamps() {
        let mut w = widget(ClickablePlotConfig::default().draggable(true));
        w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        let p = w.handle(PointerEvent::Move(ScreenPos::new(-100.0, 900.0)), RECT);
        assert_eq!(p, Some(PlotPos::new(0.0, -90.0)));
    }

    #[test]
    fn leave_detaches_move_tracking() {
        let mut w = widget(ClickablePlotConfig::default().draggable(true));
        w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        w.handle(PointerEvent::Leave, RECT);
        assert!(!w.move_listener_attached());
        assert_eq!(w.phase(), PointerPhase::Idle);
        assert_eq!(w.handle(PointerEvent::Move(ScreenPos::new(10.0, 10.0)), RECT), None);
    }

    #[test]
    fn guard_suppresses_second_click_until_rerender() {
        let mut w = widget(ClickablePlotConfig::default());
        assert!(w
            .handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT)
            .is_some());
        w.handle(PointerEvent::Up, RECT);
        assert!(!w.guard_armed());
        assert!(w
            .handle(PointerEvent::Down(ScreenPos::new(100.0, 100.0)), RECT)
            .is_none());
        w.handle(PointerEvent::Up, RECT);
        assert_eq!(w.selection().get(), Some(PlotPos::new(180.0, 0.0)));

        w.rerender(world_plot()).unwrap();
        assert!(w.guard_armed());
        assert!(w
            .handle(PointerEvent::Down(ScreenPos::new(540.0, 360.0)), RECT)
            .is_some());
        assert_eq!(w.selection().version(), 2);
    }

    #[test]
    fn release_policy_rearms_guard_per_cycle() {
        let mut w = widget(ClickablePlotConfig::default().guard_reset(GuardReset::OnRelease));
        for _ in 0..3 {
            assert!(w
                .handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT)
                .is_some());
            w.handle(PointerEvent::Up, RECT);
        }
        assert_eq!(w.selection().version(), 3);
    }

    #[test]
    fn default_selection_is_seeded() {
        let w = widget(ClickablePlotConfig::default().default_selection(PlotPos::new(200.0, -30.0)));
        assert_eq!(w.selection().get(), Some(PlotPos::new(200.0, -30.0)));
        assert_eq!(w.selection().version(), 0);
    }

    #[test]
    fn seeding_a_used_binding_fails_setup() {
        let binding = SelectionBinding::new();
        binding.publish(PlotPos::new(1.0, 1.0));
        let cfg = ClickablePlotConfig::default().default_selection(PlotPos::new(0.0, 0.0));
        let err = ClickablePlot::with_binding(world_plot(), cfg, binding).unwrap_err();
        assert!(matches!(err, SetupError::Binding(_)));
    }

    #[test]
    fn zero_size_image_rect_drops_event() {
        let mut w = widget(ClickablePlotConfig::default());
        let p = w.handle(
            PointerEvent::Down(ScreenPos::new(0.0, 0.0)),
            PixelRect::new(0.0, 0.0, 0.0, 0.0),
        );
        assert_eq!(p, None);
        assert_eq!(w.phase(), PointerPhase::Idle);
        assert!(w.guard_armed());
    }

    #[test]
    fn failed_rerender_keeps_previous_transform() {
        let mut w = widget(ClickablePlotConfig::default());
        let before = *w.transform();
        let mut bad = world_plot();
        bad.limits.y = AxisRange::new(0.0, 0.0);
        assert!(w.rerender(bad).is_err());
        assert_eq!(*w.transform(), before);
        assert_eq!(w.generation(), 0);
    }

    #[test]
    fn events_describe_each_step() {
        let ctrl = EventController::new();
        let rx = ctrl.subscribe(EventFilter::all());
        let mut w = widget(ClickablePlotConfig::default().events(ctrl));
        w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        w.handle(PointerEvent::Up, RECT);
        w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        w.handle(PointerEvent::Leave, RECT);
        w.rerender(world_plot()).unwrap();

        let kinds: Vec<EventKind> = rx.try_iter().map(|e| e.kinds).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::PRESS | EventKind::SELECTION,
                EventKind::RELEASE,
                EventKind::PRESS | EventKind::SUPPRESSED,
                EventKind::LEAVE,
                EventKind::RERENDER,
            ]
        );
    }

    #[test]
    fn toggling_draggable_reattaches() {
        let mut w = widget(ClickablePlotConfig::default());
        w.handle(PointerEvent::Down(ScreenPos::new(300.0, 200.0)), RECT);
        w.handle(PointerEvent::Up, RECT);
        w.set_draggable(true);
        assert!(w.guard_armed());
        assert!(w.draggable());
    }
}
