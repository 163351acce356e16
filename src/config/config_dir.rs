use std::path::PathBuf;

use tracing::debug;

use super::error::{ConfigError, ConfigResult};

pub static CONFIG_PATH_ENV: &str = "MESTRE_CONFIG";

/// Resolution order: `$MESTRE_CONFIG`, `./config.toml` for local runs, then the
/// per-user config directory, then `./config.toml` again as a last resort.
pub fn find_config_file(use_local: bool) -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    if use_local {
        return PathBuf::from("./config.toml");
    }

    #[cfg(unix)]
    let home = std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"));
    #[cfg(windows)]
    let home = std::env::var_os("APPDATA").map(PathBuf::from);
    #[cfg(not(any(unix, windows)))]
    let home: Option<PathBuf> = None;

    if let Some(dir) = home {
        let path = dir.join(crate::APPLICATION_NAME).join("config.toml");
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("./config.toml")
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let filename = find_config_file(use_local);

    tracing::trace!("looking for config at: {}", filename.display());
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound);
    }

    let filename = filename.canonicalize()?;
    debug!("using {} as configuration file", filename.display());

    Ok(std::fs::read(filename)?)
}
