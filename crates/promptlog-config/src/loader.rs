use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::Config;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PROMPTLOG_CONFIG";

const LOCAL_CONFIG: &str = "promptlog.json";

/// Expand a leading `~` to the home directory. Other paths pass through.
pub fn resolve_path(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Where the record file configured in `config` lives. A relative path is
/// taken relative to the directory holding `config_path`.
pub fn records_path(config: &Config, config_path: &Path) -> PathBuf {
    let path = resolve_path(&config.records.path);
    if path.is_absolute() {
        return path;
    }
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
        _ => path,
    }
}

/// Pick the config file: `$PROMPTLOG_CONFIG`, then `./promptlog.json`, then
/// `~/.promptlog/config.json`. The returned file may not exist yet.
pub fn find_config_path() -> PathBuf {
    locate_config(
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        Path::new(LOCAL_CONFIG),
        dirs::home_dir(),
    )
}

fn locate_config(explicit: Option<PathBuf>, local: &Path, home: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return path;
    }
    if local.exists() {
        return local.to_path_buf();
    }
    match home {
        Some(home) => home.join(".promptlog").join("config.json"),
        None => local.to_path_buf(),
    }
}

/// Load configuration from a JSON file. A missing file yields the defaults;
/// a file with an unknown sort key or order is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse config '{}'", path.display()))
}

/// Write `config` as pretty JSON, creating parent directories as needed.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let mut contents = serde_json::to_string_pretty(config)?;
    contents.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create config directory '{}'", parent.display())
        })?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config '{}'", path.display()))
}
