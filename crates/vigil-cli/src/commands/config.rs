/// Config command handlers (show, init, path)
use anyhow::Result;
use vigil_core::config::config_path;
use vigil_core::TrackerConfig;

pub fn handle_show() -> Result<()> {
    let config = TrackerConfig::load()?;
    if let Err(e) = config.validate() {
        println!("Warning: configuration is invalid: {e}");
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn handle_init() -> Result<()> {
    let path = config_path()?;
    if path.exists() {
        println!("Config file already exists at {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(&TrackerConfig::default())?)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

pub fn handle_path() -> Result<()> {
    println!("{}", config_path()?.display());
    Ok(())
}
