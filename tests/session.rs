use ageplot::field::STANDARD_DEPTHS;
use ageplot::persistence::{load_state_from_path, save_state_to_path};
use ageplot::*;

fn state() -> ExplorerState {
    let grid = Grid::regular(36, 18, STANDARD_DEPTHS.to_vec()).unwrap();
    let source = SyntheticAgeModel::new(grid);
    ExplorerState::with_source(AppConfig::default(), &source, &AgeParams::default()).unwrap()
}

#[test]
fn saved_session_restores_into_a_new_explorer() {
    let dir = std::env::temp_dir().join(format!("ageplot_session_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("session.json");

    let mut first = state();
    first.set_depth_index(4);
    first.set_draggable(true);
    let rect = {
        let [w, h] = first.map().plot().size();
        PixelRect::from_size(w as f32, h as f32)
    };
    first
        .map_mut()
        .handle(PointerEvent::Down(ScreenPos::new(500.0, 120.0)), rect);
    first.map_mut().handle(PointerEvent::Up, rect);
    let picked = first.map().selection().get().unwrap();
    first.save_session(&path).unwrap();

    let close = |p: Option<PlotPos>| {
        p.is_some_and(|p| (p.x - picked.x).abs() < 1e-9 && (p.y - picked.y).abs() < 1e-9)
    };
    let saved = load_state_from_path(&path).unwrap();
    assert!(close(saved.selection));
    assert!(saved.saved_at.is_some());

    let mut second = state();
    second.load_session(&path).unwrap();
    assert_eq!(second.depth_index(), 4);
    assert!(second.map().draggable());
    assert!(close(second.map().selection().get()));
    assert_eq!(second.map().selection().version(), 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn corrupt_session_leaves_state_untouched() {
    let path = std::env::temp_dir().join(format!("ageplot_bad_{}.json", std::process::id()));
    std::fs::write(&path, "{ not json").unwrap();
    let mut s = state();
    let before = s.session();
    assert!(s.load_session(&path).is_err());
    assert_eq!(s.session(), before);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn session_file_is_plain_json() {
    let path = std::env::temp_dir().join(format!("ageplot_plain_{}.json", std::process::id()));
    let s = state().session();
    save_state_to_path(&s, &path).unwrap();
    let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(v["depth_index"], 12);
    assert_eq!(v["colormap"], "Viridis");
    let _ = std::fs::remove_file(&path);
}
