//! Configuration loading for the command line
//!
//! `create`, `get` and `batch` each run in a fresh process, so their cache
//! must outlive the process: they default to the `file` backend under the
//! user cache directory. `serve` keeps one process alive and defaults to the
//! in-memory backend.

use std::path::{Path, PathBuf};
use titlecache_core::TitleCacheConfig;
use tracing::{info, warn};

/// How long the process running an action lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One action (or one batch file) per process
    OneShot,
    /// Long-running HTTP server
    Server,
}

/// Built-in defaults for `mode`
pub fn mode_defaults(mode: RunMode) -> TitleCacheConfig {
    let mut config = TitleCacheConfig::default();
    if mode == RunMode::OneShot {
        config.cache.backend = "file".to_string();
        if let Some(dir) = dirs::cache_dir() {
            config.cache.file.path = dir.join("titlecache");
        }
    }
    config
}

/// Config file read when `--config` is not given
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("titlecache").join("config.yaml"))
}

/// Mode defaults, overlaid with the config file and `TITLECACHE_*` variables
pub fn load_config(path: Option<&Path>, mode: RunMode) -> titlecache_core::Result<TitleCacheConfig> {
    let base = mode_defaults(mode);

    let config = match (path, default_config_path()) {
        (Some(path), _) => base.with_yaml_file(path)?,
        (None, Some(path)) if path.exists() => {
            info!("Using configuration from {:?}", path);
            base.with_yaml_file(&path)?
        }
        _ => base,
    }
    .with_env()?;

    if mode == RunMode::OneShot && config.cache.backend == "memory" {
        warn!("The memory cache backend is dropped when this process exits; use `serve` or the file backend to keep entries");
    }

    Ok(config)
}
