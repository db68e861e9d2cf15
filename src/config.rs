//! Configuration for the clickable plot widget and the explorer app.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::colormap::Colormap;
use crate::events::EventController;
use crate::geometry::PlotPos;
use crate::render::MaskRegion;

// ─────────────────────────────────────────────────────────────────────────────
// Widget configuration
// ─────────────────────────────────────────────────────────────────────────────

/// When the one-shot press guard of a non-draggable widget is re-armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GuardReset {
    /// Re-armed only when pointer handling is (re)attached, i.e. on setup and
    /// on every re-render. After the first press, further presses on the same
    /// render are suppressed.
    #[default]
    OnAttach,
    /// Re-armed on every release, so each press-release cycle publishes once.
    OnRelease,
}

/// Behaviour of a [`ClickablePlot`](crate::widget::ClickablePlot).
#[derive(Clone, Default)]
pub struct ClickablePlotConfig {
    /// Publish continuously while the pointer is pressed and moving.
    pub draggable: bool,
    /// Re-arm policy of the one-shot guard (non-draggable mode only).
    pub guard_reset: GuardReset,
    /// Value readers see before the first interaction.
    pub default_selection: Option<PlotPos>,
    /// Optional event stream for press/drag/release/selection notifications.
    pub events: Option<EventController>,
}

impl ClickablePlotConfig {
    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub fn guard_reset(mut self, policy: GuardReset) -> Self {
        self.guard_reset = policy;
        self
    }

    pub fn default_selection(mut self, pos: PlotPos) -> Self {
        self.default_selection = Some(pos);
        self
    }

    pub fn events(mut self, ctrl: EventController) -> Self {
        self.events = Some(ctrl);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Application configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Persistent settings of the explorer app, stored as YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Native window title.
    pub title: String,
    /// Initial window size in logical pixels.
    pub window_size: [f32; 2],
    /// Size of the rendered map raster in pixels.
    pub map_size: [u32; 2],
    /// Size of the rendered section raster in pixels.
    pub section_size: [u32; 2],
    pub draggable: bool,
    pub guard_reset: GuardReset,
    pub colormap: Colormap,
    /// Fixed colour range in years; `None` fits the data of each slice.
    pub display_range: Option<[f64; 2]>,
    /// Contour levels in years. Empty disables contouring.
    pub contour_levels: Vec<f64>,
    pub show_contours: bool,
    pub units: String,
    /// Region drawn as masked on the map.
    pub mask: Option<MaskRegion>,
    /// Depth level shown on start.
    pub initial_depth_index: usize,
    /// Selection seeded before the first click.
    pub default_selection: Option<PlotPos>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Radiocarbon age explorer".to_string(),
            window_size: [1280.0, 860.0],
            map_size: [720, 400],
            section_size: [720, 300],
            draggable: false,
            guard_reset: GuardReset::OnAttach,
            colormap: Colormap::Viridis,
            display_range: Some([0.0, 2500.0]),
            contour_levels: vec![250.0, 500.0, 1000.0, 1500.0, 2000.0],
            show_contours: true,
            units: "yr".to_string(),
            mask: None,
            initial_depth_index: 12,
            default_selection: Some(PlotPos::new(200.0, -30.0)),
        }
    }
}

impl AppConfig {
    /// Location of the config file: `~/.ageplot/config.yaml`.
    pub fn default_path() -> Result<PathBuf, String> {
        let home = std::env::var("HOME").map_err(|e| format!("HOME env var not set: {}", e))?;
        Ok(PathBuf::from(home).join(".ageplot").join("config.yaml"))
    }

    pub fn to_yaml(&self) -> Result<String, String> {
        serde_yaml::to_string(self).map_err(|e| format!("Serialization error: {}", e))
    }

    pub fn from_yaml(s: &str) -> Result<Self, String> {
        serde_yaml::from_str(s).map_err(|e| format!("Deserialization error: {}", e))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create dir {:?}: {}", dir, e))?;
        }
        let s = self.to_yaml()?;
        let mut f = fs::File::create(path)
            .map_err(|e| format!("Failed to create file {:?}: {}", path, e))?;
        f.write_all(s.as_bytes())
            .map_err(|e| format!("Failed to write file {:?}: {}", path, e))?;
        log::debug!("saved config to {:?}", path);
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Err(format!("Config file {:?} does not exist", path));
        }
        let s = fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        Self::from_yaml(&s)
    }

    pub fn save_to_default_path(&self) -> Result<(), String> {
        self.save_to_path(&Self::default_path()?)
    }

    pub fn load_from_default_path() -> Result<Self, String> {
        Self::load_from_path(&Self::default_path()?)
    }

    /// Widget settings derived from this config.
    pub fn widget_config(&self) -> ClickablePlotConfig {
        let mut cfg = ClickablePlotConfig::default()
            .draggable(self.draggable)
            .guard_reset(self.guard_reset);
        cfg.default_selection = self.default_selection;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_roundtrip_keeps_every_field() {
        let mut cfg = AppConfig::default();
        cfg.draggable = true;
        cfg.guard_reset = GuardReset::OnRelease;
        cfg.colormap = Colormap::Grayscale;
        cfg.mask = Some(MaskRegion {
            x: [20.0, 40.0],
            y: [-10.0, 10.0],
        });
        let back = AppConfig::from_yaml(&cfg.to_yaml().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = AppConfig::from_yaml("draggable: true\n").unwrap();
        assert!(cfg.draggable);
        assert_eq!(cfg.map_size, AppConfig::default().map_size);
    }

    #[test]
    fn widget_config_carries_interaction_settings() {
        let mut app = AppConfig::default();
        app.draggable = true;
        let w = app.widget_config();
        assert!(w.draggable);
        assert_eq!(w.default_selection, app.default_selection);
        assert!(w.events.is_none());
    }

    #[test]
    fn save_and_load_from_explicit_path() {
        let dir = std::env::temp_dir().join(format!("ageplot_cfg_{}", std::process::id()));
        let path = dir.join("config.yaml");
        let cfg = AppConfig {
            title: "test".into(),
            ..AppConfig::default()
        };
        cfg.save_to_path(&path).unwrap();
        let back = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(back.title, "test");
        let _ = fs::remove_dir_all(&dir);
    }
}
