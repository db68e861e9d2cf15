use ageplot::{run_explorer, AppConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match AppConfig::load_from_default_path() {
        Ok(cfg) => {
            log::info!("loaded settings from {:?}", AppConfig::default_path().ok());
            cfg
        }
        Err(e) => {
            log::warn!("using default settings: {e}");
            AppConfig::default()
        }
    };

    run_explorer(cfg)?;
    Ok(())
}
