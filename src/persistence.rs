//! Session persistence: save and load explorer state to/from JSON files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::colormap::Colormap;
use crate::config::GuardReset;
use crate::geometry::PlotPos;

pub const SESSION_FORMAT_VERSION: u32 = 1;

/// Serializable snapshot of an explorer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Local time the session was saved, RFC 3339.
    #[serde(default)]
    pub saved_at: Option<String>,
    pub selection: Option<PlotPos>,
    pub depth_index: usize,
    pub draggable: bool,
    #[serde(default)]
    pub guard_reset: GuardReset,
    pub colormap: Colormap,
    pub display_range: Option<[f64; 2]>,
    #[serde(default)]
    pub contour_levels: Vec<f64>,
    #[serde(default)]
    pub show_contours: bool,
    #[serde(default)]
    pub window_size: Option<[f32; 2]>,
}

fn default_version() -> u32 {
    SESSION_FORMAT_VERSION
}

impl SessionState {
    /// Stamp the snapshot with the current local time.
    pub fn stamped(mut self) -> Self {
        self.saved_at = Some(chrono::Local::now().to_rfc3339());
        self
    }
}

/// Serialize a session to a pretty JSON string.
pub fn state_to_json(state: &SessionState) -> Result<String, String> {
    serde_json::to_string_pretty(state).map_err(|e| e.to_string())
}

/// Deserialize a session from a JSON string.
pub fn state_from_json(json: &str) -> Result<SessionState, String> {
    let state: SessionState = serde_json::from_str(json).map_err(|e| e.to_string())?;
    if state.version > SESSION_FORMAT_VERSION {
        return Err(format!(
            "session format {} is newer than supported ({})",
            state.version, SESSION_FORMAT_VERSION
        ));
    }
    Ok(state)
}

pub fn save_state_to_path(state: &SessionState, path: &Path) -> Result<(), String> {
    let txt = state_to_json(state)?;
    std::fs::write(path, txt).map_err(|e| format!("Failed to write {:?}: {}", path, e))
}

pub fn load_state_from_path(path: &Path) -> Result<SessionState, String> {
    let txt =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
    state_from_json(&txt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionState {
        SessionState {
            version: SESSION_FORMAT_VERSION,
            saved_at: None,
            selection: Some(PlotPos::new(200.0, -30.0)),
            depth_index: 7,
            draggable: true,
            guard_reset: GuardReset::OnRelease,
            colormap: Colormap::Magma,
            display_range: Some([0.0, 2000.0]),
            contour_levels: vec![500.0, 1000.0],
            show_contours: true,
            window_size: Some([1200.0, 800.0]),
        }
    }

    #[test]
    fn json_roundtrip() {
        let s = sample().stamped();
        let back = state_from_json(&state_to_json(&s).unwrap()).unwrap();
        assert_eq!(back, s);
        assert!(back.saved_at.is_some());
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let json = r#"{
            "selection": null,
            "depth_index": 3,
            "draggable": false,
            "colormap": "Viridis",
            "display_range": null
        }"#;
        let s = state_from_json(json).unwrap();
        assert_eq!(s.version, SESSION_FORMAT_VERSION);
        assert_eq!(s.guard_reset, GuardReset::OnAttach);
        assert!(s.contour_levels.is_empty());
    }

    #[test]
    fn newer_format_is_rejected() {
        let mut s = sample();
        s.version = SESSION_FORMAT_VERSION + 1;
        let json = state_to_json(&s).unwrap();
        assert!(state_from_json(&json).unwrap_err().contains("newer"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_state_from_path(Path::new("/nonexistent/ageplot/session.json")).unwrap_err();
        assert!(err.contains("session.json"));
    }
}
