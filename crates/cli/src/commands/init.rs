//! `stepwise init`: write a starter config file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use stepwise_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    match write_default_config(&config_dir)? {
        Some(path) => {
            println!("Created {}", path.display());
            println!("Next: add your API key, then `stepwise run --task \"...\"`");
        }
        None => {
            println!(
                "Config already exists at {}; leaving it untouched",
                config_dir.join("config.toml").display()
            );
        }
    }
    Ok(())
}

/// Write `config.toml` under `dir` unless one is already there.
///
/// Returns the path written, or `None` when an existing file was kept.
pub fn write_default_config(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    std::fs::write(&path, AppConfig::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(Some(path))
}
