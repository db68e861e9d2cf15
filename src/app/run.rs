//! Top-level entry point for running the explorer as a native window.

use eframe::egui;
use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::colormap::Colormap;
use crate::config::AppConfig;

use super::{ExplorerApp, ExplorerError, ExplorerState};

/// Solve the age field, build the views and open the explorer window.
///
/// The call blocks until the window is closed.
pub fn run_explorer(cfg: AppConfig) -> Result<(), ExplorerError> {
    let title = cfg.title.clone();
    let [w, h] = cfg.window_size;
    let app = ExplorerApp::new(ExplorerState::new(cfg)?);

    let mut viewport = egui::ViewportBuilder::default().with_inner_size(egui::vec2(w, h));
    if let Some(icon) = app_icon() {
        viewport = viewport.with_icon(icon);
    }
    let opts = eframe::NativeOptions {
        viewport,
        ..eframe::NativeOptions::default()
    };

    eframe::run_native(&title, opts, Box::new(|_cc| Ok(Box::new(app))))?;
    Ok(())
}

/// Window icon: a small colormap swatch with a crosshair.
fn app_icon() -> Option<egui::IconData> {
    const SIZE: u32 = 64;
    let mut pixmap = Pixmap::new(SIZE, SIZE)?;
    let bands = 16;
    let band_h = SIZE as f32 / bands as f32;
    for b in 0..bands {
        let [r, g, bl] = Colormap::Viridis.sample(1.0 - b as f64 / (bands - 1) as f64);
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, bl, 255);
        let rect = Rect::from_xywh(0.0, b as f32 * band_h, SIZE as f32, band_h + 1.0)?;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    }

    let mut pb = PathBuilder::new();
    pb.move_to(8.0, 40.0);
    pb.line_to(56.0, 40.0);
    pb.move_to(24.0, 8.0);
    pb.line_to(24.0, 56.0);
    let path = pb.finish()?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(230, 30, 30, 255);
    let stroke = Stroke {
        width: 3.0,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

    Some(egui::IconData {
        rgba: pixmap.take(),
        width: SIZE,
        height: SIZE,
    })
}
