//! Layout of the explorer window.
//!
//! * **[`render_menu`](ExplorerApp::render_menu)**: file menu with PNG export,
//!   session save/load and settings persistence.
//! * **[`render_controls`](ExplorerApp::render_controls)**: left sidebar with
//!   depth, interaction and colour controls.
//! * **[`render_views`](ExplorerApp::render_views)**: map on top, profile and
//!   meridional section below.

use eframe::egui;
use egui_plot::{Legend, Line, Plot, Points};

use crate::colormap::Colormap;
use crate::config::GuardReset;

use super::ExplorerApp;

impl ExplorerApp {
    pub(super) fn render_menu(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Export map PNG…").clicked() {
                    self.export_map_dialog();
                    ui.close();
                }
                ui.separator();
                if ui.button("Save session…").clicked() {
                    self.save_session_dialog();
                    ui.close();
                }
                if ui.button("Load session…").clicked() {
                    self.load_session_dialog();
                    ui.close();
                }
                ui.separator();
                if ui.button("Save settings").clicked() {
                    match self.state.cfg.save_to_default_path() {
                        Ok(()) => self.state.status = "Settings saved".to_string(),
                        Err(e) => {
                            log::error!("Failed to save settings: {e}");
                            self.state.status = e;
                        }
                    }
                    ui.close();
                }
            });
        });
    }

    fn export_map_dialog(&mut self) {
        let name = format!("age_map_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(&name)
            .save_file()
        else {
            return;
        };
        if let Err(e) = self.state.export_map_png(&path) {
            log::error!("{e}");
            self.state.status = e;
        } else {
            self.state.status = format!("Map exported to {}", path.display());
        }
    }

    fn save_session_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name("ageplot_session.json")
            .save_file()
        else {
            return;
        };
        if let Err(e) = self.state.save_session(&path) {
            log::error!("Failed to save session: {e}");
            self.state.status = e;
        }
    }

    fn load_session_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .pick_file()
        else {
            return;
        };
        match self.state.load_session(&path) {
            Ok(()) => {
                self.map_view.invalidate();
                self.section_view.invalidate();
            }
            Err(e) => {
                log::error!("Failed to load session: {e}");
                self.state.status = e;
            }
        }
    }

    pub(super) fn render_controls(&mut self, ui: &mut egui::Ui) {
        let state = &mut self.state;
        ui.heading("Map");

        let ndepth = state.field().grid().depth.len();
        let mut k = state.depth_index();
        let depth_label = format!("{:.0} m", state.depth());
        if ui
            .add(egui::Slider::new(&mut k, 0..=ndepth.saturating_sub(1)).text(depth_label))
            .changed()
        {
            state.set_depth_index(k);
        }

        ui.separator();
        ui.heading("Interaction");
        let mut draggable = state.cfg.draggable;
        if ui
            .checkbox(&mut draggable, "Draggable")
            .on_hover_text("Publish continuously while the button is held")
            .changed()
        {
            state.set_draggable(draggable);
        }
        let mut guard = state.cfg.guard_reset;
        ui.add_enabled_ui(!draggable, |ui| {
            egui::ComboBox::from_label("Click guard")
                .selected_text(match guard {
                    GuardReset::OnAttach => "Once per render",
                    GuardReset::OnRelease => "Every click",
                })
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut guard, GuardReset::OnAttach, "Once per render");
                    ui.selectable_value(&mut guard, GuardReset::OnRelease, "Every click");
                });
        });
        let mut redraw = false;
        if guard != state.cfg.guard_reset {
            state.cfg.guard_reset = guard;
            // Takes effect on the rebuilt widget.
            let session = state.session();
            if let Err(e) = state.restore_session(session) {
                log::error!("{e}");
                state.status = e.to_string();
            }
            self.map_view.invalidate();
        }

        ui.separator();
        ui.heading("Colours");
        let mut cmap = state.cfg.colormap;
        egui::ComboBox::from_label("Colormap")
            .selected_text(cmap.label())
            .show_ui(ui, |ui| {
                for c in Colormap::all() {
                    ui.selectable_value(&mut cmap, *c, c.label());
                }
            });
        if cmap != state.cfg.colormap {
            state.cfg.colormap = cmap;
            redraw = true;
        }

        let mut auto = state.cfg.display_range.is_none();
        if ui.checkbox(&mut auto, "Fit colour range").changed() {
            state.cfg.display_range = if auto { None } else { Some([0.0, 2500.0]) };
            redraw = true;
        }
        if let Some(range) = &mut state.cfg.display_range {
            ui.horizontal(|ui| {
                let lo = ui.add(egui::DragValue::new(&mut range[0]).speed(10.0).prefix("min "));
                let hi = ui.add(egui::DragValue::new(&mut range[1]).speed(10.0).prefix("max "));
                if lo.drag_stopped() || lo.lost_focus() || hi.drag_stopped() || hi.lost_focus() {
                    redraw = true;
                }
            });
        }
        if ui.checkbox(&mut state.cfg.show_contours, "Contours").changed() {
            redraw = true;
        }
        if redraw {
            state.apply_display_settings();
        }

        ui.separator();
        if let Some(p) = state.profile_pos() {
            ui.label(format!("Selection: {:.1}°E, {:.1}°N", p.x, p.y));
        } else {
            ui.label("Selection: none");
        }
        ui.label(format!("Updates: {}", state.map().selection().version()));
        if !state.status.is_empty() {
            ui.small(&state.status);
        }
    }

    pub(super) fn render_views(&mut self, ui: &mut egui::Ui) -> bool {
        let mut published = false;
        let width = ui.available_width();

        ui.label(self.state.map().plot().title.clone());
        published |= self
            .map_view
            .show(ui, self.state.map_mut(), width)
            .is_some();

        ui.separator();
        ui.columns(2, |cols| {
            self.render_profile(&mut cols[0]);
            if let Some(section) = self.state.section_mut() {
                cols[1].label(section.plot().title.clone());
                let w = cols[1].available_width();
                published |= self.section_view.show(&mut cols[1], section, w).is_some();
            }
        });
        published
    }

    fn render_profile(&self, ui: &mut egui::Ui) {
        let units = &self.state.cfg.units;
        let points: Vec<[f64; 2]> = self
            .state
            .profile()
            .iter()
            .map(|p| [p.value, -p.depth])
            .collect();
        let title = match self.state.profile_pos() {
            Some(p) => format!("Profile at {:.1}°E, {:.1}°N", p.x, p.y),
            None => "Profile".to_string(),
        };
        ui.label(title);
        let current = -self.state.depth();
        Plot::new("age_profile")
            .legend(Legend::default())
            .height(ui.available_height().max(200.0))
            .allow_scroll(false)
            .x_axis_label(format!("Age ({units})"))
            .y_axis_label("Depth (m)")
            .y_axis_formatter(|y, _range| format!("{:.0}", -y.value))
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new("age", points.clone()));
                plot_ui.points(Points::new("levels", points).radius(2.5));
                plot_ui.hline(egui_plot::HLine::new("map depth", current));
            });
    }
}
