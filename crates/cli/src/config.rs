//! CLI configuration utilities

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use shelf_core::ClientSettings;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings file picked up from the data directory when `--config` is absent
pub const CONFIG_FILE: &str = "shelf.toml";

/// Data directory: the override if given, else the platform data dir
pub fn resolve_data_dir(override_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir;
    }

    if let Some(project_dirs) = ProjectDirs::from("org", "Shelf", "shelf") {
        project_dirs.data_dir().to_path_buf()
    } else {
        warn!("Failed to determine platform-specific directories, using ./.shelf");
        PathBuf::from(".shelf")
    }
}

/// Load client settings for this invocation
///
/// Precedence: `--api-url` flag, then `SHELF_*` environment, then the
/// config file, then defaults.
pub fn load_settings(
    config: Option<&Path>,
    data_dir: &Path,
    api_url: Option<&str>,
) -> Result<ClientSettings> {
    let file = match config {
        Some(path) if !path.exists() => {
            bail!("configuration file not found: {}", path.display())
        }
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default_file = data_dir.join(CONFIG_FILE);
            default_file.exists().then_some(default_file)
        }
    };
    if let Some(path) = &file {
        debug!("Loading configuration from: {}", path.display());
    }

    let settings = ClientSettings::load(file.as_deref()).context("failed to load configuration")?;
    match api_url {
        Some(url) => settings.with_api_url(url).context("invalid --api-url"),
        None => Ok(settings),
    }
}
