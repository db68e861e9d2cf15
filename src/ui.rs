//! egui front end for [`ClickablePlot`].
//!
//! [`PlotImageView`] uploads the rendered raster as a texture, paints it,
//! converts egui pointer input into [`PointerEvent`]s and overlays tick
//! labels, a crosshair at the current selection and a hover readout.

use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions};

use crate::geometry::{PixelRect, PlotPos, ScreenPos};
use crate::render::nice_ticks;
use crate::widget::{ClickablePlot, PointerEvent, PointerPhase};

/// Pointer state of one frame, reduced to what the widget needs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSnapshot {
    pub pos: Option<ScreenPos>,
    /// Primary button went down this frame.
    pub pressed: bool,
    /// Primary button went up this frame.
    pub released: bool,
    /// Pointer moved since last frame.
    pub moved: bool,
    /// Pointer is inside the window.
    pub in_window: bool,
    /// Pointer is over the image rectangle.
    pub over_image: bool,
}

/// Widget events for one frame, in delivery order.
pub fn translate_pointer(s: &PointerSnapshot, phase: PointerPhase) -> Vec<PointerEvent> {
    let mut out = Vec::new();
    match s.pos {
        Some(pos) if s.pressed && s.over_image => out.push(PointerEvent::Down(pos)),
        Some(pos) if s.moved && phase != PointerPhase::Idle => out.push(PointerEvent::Move(pos)),
        _ => {}
    }
    if s.released {
        out.push(PointerEvent::Up);
    } else if !s.in_window && phase != PointerPhase::Idle {
        out.push(PointerEvent::Leave);
    }
    out
}

/// Short label for a tick value.
pub fn format_tick(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// Overlay settings.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub ticks: bool,
    pub crosshair: bool,
    pub hover_readout: bool,
    pub crosshair_color: Color32,
    pub label_color: Color32,
    pub font_size: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            ticks: true,
            crosshair: true,
            hover_readout: true,
            crosshair_color: Color32::from_rgb(230, 30, 30),
            label_color: Color32::BLACK,
            font_size: 11.0,
        }
    }
}

/// Texture cache and pointer bookkeeping for showing a [`ClickablePlot`].
pub struct PlotImageView {
    id: String,
    texture: Option<TextureHandle>,
    uploaded_generation: Option<u64>,
    last_pos: Option<ScreenPos>,
    pub style: OverlayStyle,
}

impl PlotImageView {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            texture: None,
            uploaded_generation: None,
            last_pos: None,
            style: OverlayStyle::default(),
        }
    }

    /// Force a texture upload on the next frame, e.g. after swapping widgets.
    pub fn invalidate(&mut self) {
        self.uploaded_generation = None;
    }

    fn texture(&mut self, ctx: &egui::Context, plot: &ClickablePlot) -> egui::TextureId {
        let stale = self.uploaded_generation != Some(plot.generation());
        let img = &plot.plot().image;
        let size = [img.width() as usize, img.height() as usize];
        match &mut self.texture {
            Some(handle) if !stale => return handle.id(),
            Some(handle) => {
                let color = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
                handle.set(color, TextureOptions::LINEAR);
            }
            None => {
                let color = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
                self.texture = Some(ctx.load_texture(&self.id, color, TextureOptions::LINEAR));
            }
        }
        self.uploaded_generation = Some(plot.generation());
        log::trace!("uploaded texture {} (generation {})", self.id, plot.generation());
        self.texture.as_ref().map(|h| h.id()).unwrap_or_default()
    }

    /// Draw the plot at most `max_width` wide and feed this frame's pointer
    /// input to it. Returns the coordinate published this frame, if any.
    pub fn show(&mut self, ui: &mut egui::Ui, plot: &mut ClickablePlot, max_width: f32) -> Option<PlotPos> {
        let [img_w, img_h] = plot.plot().size();
        let width = max_width.min(ui.available_width()).min(img_w as f32).max(1.0);
        let height = width * img_h as f32 / img_w.max(1) as f32;
        let (rect, response) = ui.allocate_exact_size(egui::vec2(width, height), Sense::click_and_drag());

        let tex = self.texture(ui.ctx(), plot);
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        ui.painter().image(tex, rect, uv, Color32::WHITE);

        let image_rect = PixelRect::new(rect.min.x, rect.min.y, rect.width(), rect.height());
        let snapshot = ui.input(|i| {
            let pos = i.pointer.latest_pos().map(|p| ScreenPos::new(p.x, p.y));
            PointerSnapshot {
                pos,
                pressed: i.pointer.primary_pressed(),
                released: i.pointer.primary_released(),
                moved: pos.is_some() && pos != self.last_pos,
                in_window: i.pointer.has_pointer(),
                over_image: pos.is_some_and(|p| image_rect.contains(p)),
            }
        });
        self.last_pos = snapshot.pos;

        let mut published = None;
        for event in translate_pointer(&snapshot, plot.phase()) {
            if let Some(p) = plot.handle(event, image_rect) {
                published = Some(p);
            }
        }

        if self.style.ticks {
            self.paint_ticks(ui, plot, rect);
        }
        if self.style.crosshair {
            if let Some(sel) = plot.selection().get() {
                self.paint_crosshair(ui, plot, rect, sel);
            }
        }
        if self.style.hover_readout {
            if let Some(hover) = response.hover_pos() {
                let here = plot.locate(ScreenPos::new(hover.x, hover.y), image_rect);
                if let Some(p) = here {
                    ui.painter().text(
                        rect.right_top() + egui::vec2(-4.0, 4.0),
                        Align2::RIGHT_TOP,
                        format!("{:.1}, {:.1}", p.x, p.y),
                        FontId::monospace(self.style.font_size),
                        self.style.label_color,
                    );
                }
            }
        }
        if plot.phase() != PointerPhase::Idle {
            ui.ctx().request_repaint();
        }
        published
    }

    /// Screen position of a data coordinate inside `rect`.
    fn to_screen(plot: &ClickablePlot, rect: Rect, p: PlotPos) -> Pos2 {
        let f = plot.transform().invert(p);
        Pos2::new(
            rect.min.x + f.fx as f32 * rect.width(),
            rect.min.y + f.fy as f32 * rect.height(),
        )
    }

    fn paint_ticks(&self, ui: &egui::Ui, plot: &ClickablePlot, rect: Rect) {
        let limits = plot.plot().limits;
        let font = FontId::proportional(self.style.font_size);
        let painter = ui.painter();
        for t in nice_ticks(limits.x, 6) {
            let at = Self::to_screen(plot, rect, PlotPos::new(t, limits.y.min));
            painter.text(
                at + egui::vec2(0.0, 6.0),
                Align2::CENTER_TOP,
                format_tick(t),
                font.clone(),
                self.style.label_color,
            );
        }
        for t in nice_ticks(limits.y, 5) {
            let at = Self::to_screen(plot, rect, PlotPos::new(limits.x.min, t));
            painter.text(
                at - egui::vec2(7.0, 0.0),
                Align2::RIGHT_CENTER,
                format_tick(t),
                font.clone(),
                self.style.label_color,
            );
        }
    }

    fn paint_crosshair(&self, ui: &egui::Ui, plot: &ClickablePlot, rect: Rect, sel: PlotPos) {
        let limits = plot.plot().limits;
        let stroke = Stroke::new(1.0, self.style.crosshair_color);
        let centre = Self::to_screen(plot, rect, sel);
        let left = Self::to_screen(plot, rect, PlotPos::new(limits.x.min, sel.y));
        let right = Self::to_screen(plot, rect, PlotPos::new(limits.x.max, sel.y));
        let top = Self::to_screen(plot, rect, PlotPos::new(sel.x, limits.y.max));
        let bottom = Self::to_screen(plot, rect, PlotPos::new(sel.x, limits.y.min));
        let painter = ui.painter();
        painter.line_segment([left, right], stroke);
        painter.line_segment([top, bottom], stroke);
        painter.circle_stroke(centre, 4.0, Stroke::new(2.0, self.style.crosshair_color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap() -> PointerSnapshot {
        PointerSnapshot {
            pos: Some(ScreenPos::new(10.0, 10.0)),
            in_window: true,
            over_image: true,
            ..PointerSnapshot::default()
        }
    }

    #[test]
    fn press_over_image_is_down() {
        let s = PointerSnapshot {
            pressed: true,
            moved: true,
            ..snap()
        };
        assert_eq!(
            translate_pointer(&s, PointerPhase::Idle),
            vec![PointerEvent::Down(ScreenPos::new(10.0, 10.0))]
        );
    }

    #[test]
    fn press_outside_image_is_ignored() {
        let s = PointerSnapshot {
            pressed: true,
            over_image: false,
            ..snap()
        };
        assert!(translate_pointer(&s, PointerPhase::Idle).is_empty());
    }

    #[test]
    fn click_within_one_frame_is_down_then_up() {
        let s = PointerSnapshot {
            pressed: true,
            released: true,
            ..snap()
        };
        assert_eq!(
            translate_pointer(&s, PointerPhase::Idle),
            vec![PointerEvent::Down(ScreenPos::new(10.0, 10.0)), PointerEvent::Up]
        );
    }

    #[test]
    fn moves_are_forwarded_only_while_pressed() {
        let s = PointerSnapshot {
            moved: true,
            over_image: false,
            ..snap()
        };
        assert!(translate_pointer(&s, PointerPhase::Idle).is_empty());
        assert_eq!(
            translate_pointer(&s, PointerPhase::Dragging),
            vec![PointerEvent::Move(ScreenPos::new(10.0, 10.0))]
        );
    }

    #[test]
    fn release_anywhere_is_up() {
        let s = PointerSnapshot {
            released: true,
            over_image: false,
            ..snap()
        };
        assert_eq!(translate_pointer(&s, PointerPhase::Pressed), vec![PointerEvent::Up]);
    }

    #[test]
    fn leaving_the_window_while_pressed_is_leave() {
        let s = PointerSnapshot {
            pos: None,
            in_window: false,
            over_image: false,
            ..PointerSnapshot::default()
        };
        assert_eq!(translate_pointer(&s, PointerPhase::Dragging), vec![PointerEvent::Leave]);
        assert!(translate_pointer(&s, PointerPhase::Idle).is_empty());
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_tick(150.0), "150");
        assert_eq!(format_tick(-0.5), "-0.5");
    }
}
