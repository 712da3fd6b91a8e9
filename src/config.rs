//! Configuration structures and resolution logic

use crate::error::{SetupError, SetupResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Registry repository used when `--model-id` is not given
pub const DEFAULT_MODEL_ID: &str = "NX-AI/TiRex";

/// Cache directory used when `--cache-dir` is not given (tilde is expanded)
pub const DEFAULT_CACHE_DIR: &str = "~/.cache/tirex/weights";

/// File fetched from the registry and the canonical name it is stored under
pub const CHECKPOINT_FILENAME: &str = "model.ckpt";

/// Environment variable the TiRex library reads the weights location from
pub const WEIGHTS_PATH_VAR: &str = "TIREX_WEIGHTS_PATH";

/// Setup run configuration
///
/// Built once from command-line arguments and never mutated afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SetupConfig {
    /// Fully resolved cache directory (no `~`)
    pub cache_dir: PathBuf,
    pub model_id: String,
    pub create_env_file: bool,
    /// Where the env file is written when `create_env_file` is set
    pub env_file_path: PathBuf,
    pub registry: RegistrySettings,
}

/// Connection settings for the model registry client
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RegistrySettings {
    /// Alternative hub endpoint (`HF_ENDPOINT`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Access token for gated or private repositories (`HF_TOKEN`)
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl RegistrySettings {
    /// Read registry settings from the process environment
    ///
    /// Only the binaries call this; library code receives the settings
    /// explicitly.
    pub fn from_env() -> Self {
        Self {
            endpoint: non_empty_var("HF_ENDPOINT"),
            token: non_empty_var("HF_TOKEN"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl SetupConfig {
    /// Resolve a configuration from raw argument values
    ///
    /// `home` is the invoking user's home directory; it is only required when
    /// the cache directory (explicit or default) starts with `~`.
    pub fn resolve(
        cache_dir: Option<&str>,
        model_id: Option<&str>,
        create_env_file: bool,
        home: Option<&Path>,
    ) -> SetupResult<Self> {
        let raw_cache_dir = cache_dir.unwrap_or(DEFAULT_CACHE_DIR);
        let cache_dir = expand_tilde(raw_cache_dir, home)
            .ok_or_else(|| SetupError::HomeDirUnavailable(raw_cache_dir.to_string()))?;

        let config = Self {
            cache_dir,
            model_id: model_id.unwrap_or(DEFAULT_MODEL_ID).to_string(),
            create_env_file,
            env_file_path: default_env_file_path(),
            registry: RegistrySettings::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the registry settings
    pub fn with_registry(mut self, registry: RegistrySettings) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the env file destination
    pub fn with_env_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file_path = path.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> SetupResult<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(SetupError::InvalidConfig(
                "cache directory cannot be empty".to_string(),
            ));
        }
        if self.model_id.trim().is_empty() {
            return Err(SetupError::InvalidConfig(
                "model id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Canonical checkpoint location inside the cache directory
    pub fn checkpoint_path(&self) -> PathBuf {
        self.cache_dir.join(CHECKPOINT_FILENAME)
    }

    /// Line written to the env file
    pub fn env_line(&self) -> String {
        format!("{}={}", WEIGHTS_PATH_VAR, self.cache_dir.display())
    }
}

/// Expand a leading `~` to `home`
///
/// Only the invoking user's home is expanded (`~` and `~/...`). Other users'
/// homes (`~user/...`) are not looked up and the path is returned verbatim,
/// so `~alice/w` becomes a relative directory named `~alice`.
///
/// Returns `None` when the path needs a home directory and none is known.
pub fn expand_tilde(path: &str, home: Option<&Path>) -> Option<PathBuf> {
    if path == "~" {
        return home.map(Path::to_path_buf);
    }
    match path.strip_prefix("~/") {
        Some(rest) => home.map(|h| h.join(rest.trim_start_matches('/'))),
        None => Some(PathBuf::from(path)),
    }
}

/// Default weights directory for the current user, if a home dir is known
pub fn default_cache_dir() -> Option<PathBuf> {
    expand_tilde(DEFAULT_CACHE_DIR, dirs::home_dir().as_deref())
}

fn default_env_file_path() -> PathBuf {
    PathBuf::from(".env")
}
