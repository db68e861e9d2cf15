//! Per-frame update of the explorer window.

use eframe::egui;

use super::ExplorerApp;

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Selection updates published last frame redraw the dependent views.
        if self.state.poll() {
            self.section_view.invalidate();
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.render_menu(ui);
        });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(240.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_controls(ui);
                });
            });

        let published = egui::CentralPanel::default()
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| self.render_views(ui))
                    .inner
            })
            .inner;

        if published {
            ctx.request_repaint();
        }
    }
}
