use serde::Deserialize;

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};

pub static BACKEND_URL_ENV: &str = "MESTRE_BACKEND_URL";
pub static BACKEND_ANON_KEY_ENV: &str = "MESTRE_BACKEND_ANON_KEY";

/// 100 MiB, the largest lesson material accepted by the admin panel.
pub const DEFAULT_MATERIAL_MAX_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    host: Host,
    app: App,
    backend: Backend,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    docs: bool,
    static_dir: String,
    material_max_bytes: usize,
    materials_bucket: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Backend {
    url: String,
    anon_key: String,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            bindto: String::from("127.0.0.1:5000"),
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            docs: false,
            static_dir: String::from("public"),
            material_max_bytes: DEFAULT_MATERIAL_MAX_BYTES,
            materials_bucket: String::from("materials"),
        }
    }
}

impl Config {
    /// Reads the configuration file, applies environment overrides and reports
    /// a missing backend endpoint. Only an unreadable or malformed file is fatal.
    #[tracing::instrument]
    pub fn load(use_local: bool) -> ConfigResult<Self> {
        let mut config = match read_config(use_local) {
            Ok(bytes) => Self::from_slice(&bytes)?,
            Err(ConfigError::ConfigNotFound) => {
                tracing::warn!("config not found, using defaults.");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_env();
        config.check_backend();
        Ok(config)
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        Ok(toml::from_slice(bytes)?)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            self.backend.url = url;
        }
        if let Ok(key) = std::env::var(BACKEND_ANON_KEY_ENV) {
            self.backend.anon_key = key;
        }
    }

    /// Returns `false` when the backend endpoint or key is missing.
    pub fn check_backend(&self) -> bool {
        let mut ok = true;
        if self.backend.url.trim().is_empty() {
            tracing::error!("backend url is not configured (set `backend.url` or {BACKEND_URL_ENV}).");
            ok = false;
        }
        if self.backend.anon_key.trim().is_empty() {
            tracing::error!(
                "backend public key is not configured (set `backend.anon_key` or {BACKEND_ANON_KEY_ENV})."
            );
            ok = false;
        }
        ok
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn static_dir(&self) -> &str {
        &self.static_dir
    }

    #[inline]
    pub fn material_max_bytes(&self) -> usize {
        self.material_max_bytes
    }

    #[inline]
    pub fn materials_bucket(&self) -> &str {
        &self.materials_bucket
    }
}

impl Backend {
    #[inline]
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    #[inline]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }
}
