//! Settings file – reads/writes `~/.clawmem/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use clawmem_runtime::PluginConfig;
use serde::{Deserialize, Serialize};

/// Persisted settings.  Keys are snake_case on disk; every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the storage worker.
    pub worker_url: String,
    pub auto_capture: bool,
    pub auto_recall: bool,
    /// Token budget for recalled context.
    pub max_context_tokens: usize,
    /// Kinds allowed into recalled context; empty allows all.
    pub capture_types: Vec<String>,
    pub dedup_capacity: usize,
    pub recall_limit: usize,
    pub hook_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let plugin = PluginConfig::default();
        Self {
            worker_url: plugin.worker_url,
            auto_capture: plugin.auto_capture,
            auto_recall: plugin.auto_recall,
            max_context_tokens: plugin.max_context_tokens,
            capture_types: plugin.capture_types,
            dedup_capacity: plugin.dedup_capacity,
            recall_limit: plugin.recall_limit,
            hook_timeout_ms: plugin.hook_timeout_ms,
        }
    }
}

impl From<&Config> for PluginConfig {
    fn from(cfg: &Config) -> Self {
        PluginConfig {
            worker_url: cfg.worker_url.clone(),
            auto_capture: cfg.auto_capture,
            auto_recall: cfg.auto_recall,
            max_context_tokens: cfg.max_context_tokens,
            capture_types: cfg.capture_types.clone(),
            dedup_capacity: cfg.dedup_capacity,
            recall_limit: cfg.recall_limit,
            hook_timeout_ms: cfg.hook_timeout_ms,
        }
    }
}

/// `~/.clawmem/config.toml`.
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    config_path_for_home(&home)
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".clawmem").join("config.toml")
}

/// `Ok(None)` when no settings file exists yet.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| format!("Failed to read config at {}: {e}", path.display()))?;
    let mut cfg: Config = toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {e}"))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply `CLAWMEM_*` overrides.  Unparseable values are ignored.
///
/// | Variable | Field |
/// |---|---|
/// | `CLAWMEM_WORKER_URL` | `worker_url` |
/// | `CLAWMEM_AUTO_CAPTURE` | `auto_capture` |
/// | `CLAWMEM_AUTO_RECALL` | `auto_recall` |
/// | `CLAWMEM_MAX_CONTEXT_TOKENS` | `max_context_tokens` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("CLAWMEM_WORKER_URL")
        && !v.trim().is_empty()
    {
        cfg.worker_url = v.trim().to_string();
    }
    if let Some(flag) = std::env::var("CLAWMEM_AUTO_CAPTURE").ok().as_deref().and_then(parse_flag) {
        cfg.auto_capture = flag;
    }
    if let Some(flag) = std::env::var("CLAWMEM_AUTO_RECALL").ok().as_deref().and_then(parse_flag) {
        cfg.auto_recall = flag;
    }
    if let Ok(v) = std::env::var("CLAWMEM_MAX_CONTEXT_TOKENS")
        && let Ok(tokens) = v.trim().parse::<usize>()
    {
        cfg.max_context_tokens = tokens;
    }
}

/// Built-in defaults with `CLAWMEM_*` overrides applied.  Used when no
/// settings file exists or the existing one cannot be read.
pub fn defaults_with_env() -> Config {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// Write the settings, creating `~/.clawmem/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create config directory: {e}"))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {e}"))?;
        }
    }
    let raw = toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {e}"))?;
    write_private(path, raw.as_bytes()).map_err(|e| format!("Failed to write config at {}: {e}", path.display()))
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}
