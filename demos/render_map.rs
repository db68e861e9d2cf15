//! Example: Render age maps and sections to PNG
//!
//! What it demonstrates
//! - Solving the synthetic age model.
//! - Rendering a horizontal slice and a meridional section with contours and
//!   a masked region.
//! - Exporting the rasters to PNG files.
//!
//! How to run
//! ```bash
//! cargo run --example render_map -- /tmp/ageplot
//! ```

use std::path::PathBuf;

use ageplot::{
    field::STANDARD_DEPTHS, render_heatmap, AgeParams, AgeSource, Colormap, Grid, HeatmapOptions,
    MaskRegion, SyntheticAgeModel,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&out_dir)?;

    let grid = Grid::regular(72, 36, STANDARD_DEPTHS.to_vec())?;
    let field = SyntheticAgeModel::new(grid).solve(&AgeParams::default())?;
    if let Some([lo, hi]) = field.finite_range() {
        println!("age range: {lo:.0} .. {hi:.0} yr");
    }

    let opts = HeatmapOptions {
        colormap: Colormap::Magma,
        display_range: Some([0.0, 2500.0]),
        contour_levels: vec![250.0, 500.0, 1000.0, 1500.0, 2000.0],
        show_contours: true,
        mask: Some(MaskRegion {
            x: [300.0, 360.0],
            y: [60.0, 90.0],
        }),
        units: "yr".into(),
        ..HeatmapOptions::default()
    };
    for k in [0, 12, 20] {
        let slice = field.horizontal_slice(k).ok_or("depth index out of range")?;
        let plot = render_heatmap(&slice, &opts)?;
        let path = out_dir.join(format!("age_map_{:04.0}m.png", field.grid().depth[k]));
        plot.save_png(&path)?;
        println!("{} -> {}", plot.title, path.display());
    }

    let section = field.meridional_section(200.0).ok_or("empty grid")?;
    let plot = render_heatmap(
        &section,
        &HeatmapOptions {
            height: 300,
            mask: None,
            ..opts
        },
    )?;
    let path = out_dir.join("age_section_200E.png");
    plot.save_png(&path)?;
    println!("{} -> {}", plot.title, path.display());
    Ok(())
}
