//! Example: Selection binding and widget events
//!
//! What it demonstrates
//! - Setting up a [`ClickablePlot`] over a rendered age map.
//! - Subscribing to the selection binding on a background thread.
//! - Watching PRESS / DRAG / RELEASE / SUPPRESSED events through an
//!   [`EventController`].
//! - The one-shot guard in non-draggable mode versus continuous publishing in
//!   draggable mode.
//!
//! The pointer input is scripted, so no window is opened.
//!
//! How to run
//! ```bash
//! RUST_LOG=debug cargo run --example selection_events
//! ```

use ageplot::{
    field::STANDARD_DEPTHS, render_heatmap, AgeParams, AgeSource, ClickablePlot,
    ClickablePlotConfig, EventController, EventFilter, EventKind, Grid, HeatmapOptions, PixelRect,
    PlotPos, PointerEvent, ScreenPos, SyntheticAgeModel,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let grid = Grid::regular(72, 36, STANDARD_DEPTHS.to_vec())?;
    let field = SyntheticAgeModel::new(grid).solve(&AgeParams::default())?;
    let slice = field.horizontal_slice(12).ok_or("no such depth level")?;
    let opts = HeatmapOptions {
        display_range: Some([0.0, 2500.0]),
        ..HeatmapOptions::default()
    };
    let plot = render_heatmap(&slice, &opts)?;
    let [w, h] = plot.size();
    let rect = PixelRect::from_size(w as f32, h as f32);

    let events = EventController::new();
    let events_rx = events.subscribe(EventFilter::all());
    let cfg = ClickablePlotConfig::default()
        .default_selection(PlotPos::new(200.0, -30.0))
        .events(events);
    let mut widget = ClickablePlot::new(plot.clone(), cfg)?;

    let selection = widget.selection().clone();
    let updates = selection.subscribe();
    let printer = std::thread::spawn(move || {
        for u in updates {
            println!("selection v{} = ({:.2}, {:.2})", u.version, u.pos.x, u.pos.y);
        }
    });
    println!("default selection: {:?}", selection.get());

    println!("-- click, then click again (second is suppressed)");
    let at = |x: f32, y: f32| PointerEvent::Down(ScreenPos::new(x, y));
    widget.handle(at(360.0, 200.0), rect);
    widget.handle(PointerEvent::Up, rect);
    widget.handle(at(100.0, 100.0), rect);
    widget.handle(PointerEvent::Up, rect);

    println!("-- re-render re-arms the guard");
    widget.rerender(plot)?;
    widget.handle(at(100.0, 100.0), rect);
    widget.handle(PointerEvent::Up, rect);

    println!("-- draggable: press, three moves, leave");
    widget.set_draggable(true);
    widget.handle(at(100.0, 300.0), rect);
    for x in [200.0, 300.0, 400.0] {
        widget.handle(PointerEvent::Move(ScreenPos::new(x, 300.0)), rect);
    }
    widget.handle(PointerEvent::Leave, rect);
    widget.handle(PointerEvent::Move(ScreenPos::new(500.0, 300.0)), rect);

    // Closing the widget drops its binding handle; dropping ours ends the printer.
    drop(widget);
    drop(selection);
    printer.join().map_err(|_| "printer thread panicked")?;

    for ev in events_rx.try_iter() {
        let detail = match (ev.pointer, ev.render) {
            (Some(p), _) => format!(
                " at ({:.0}, {:.0}) px -> ({:.2}, {:.2})",
                p.screen_pos.x, p.screen_pos.y, p.plot_pos.x, p.plot_pos.y
            ),
            (None, Some(r)) => format!(" generation {}", r.generation),
            _ => String::new(),
        };
        let marker = if ev.kinds.contains(EventKind::SUPPRESSED) { " (guard)" } else { "" };
        println!("[{:8.4}s] {}{}{}", ev.timestamp, ev.kinds, detail, marker);
    }
    Ok(())
}
