use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::PlannerConfig;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "planner.toml";

/// Environment variable that overrides `data_root`
pub const DATA_ROOT_ENV: &str = "PLANNER_DATA_ROOT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("could not edit {path}: {source}")]
    EditError {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
}

/// Read the config file. A missing file gives the defaults.
pub fn read_config(path: &Path) -> Result<PlannerConfig, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(PlannerConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read the config file and apply environment overrides.
pub fn load_config(path: &Path) -> Result<PlannerConfig, ConfigError> {
    let mut config = read_config(path)?;
    if let Ok(root) = std::env::var(DATA_ROOT_ENV)
        && !root.is_empty()
    {
        config.data_root = root;
    }
    Ok(config)
}

/// Resolve `data_root` against the directory holding the config file.
pub fn resolve_data_root(config_path: &Path, config: &PlannerConfig) -> PathBuf {
    let root = Path::new(&config.data_root);
    if root.is_absolute() {
        return root.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(root),
        _ => root.to_path_buf(),
    }
}

/// Set `data_root`, keeping the rest of the file's formatting and comments.
pub fn set_data_root(path: &Path, data_root: &str) -> Result<(), ConfigError> {
    edit_config(path, |doc| {
        doc["data_root"] = toml_edit::value(data_root);
    })
}

/// Set `[calendar] filter`.
pub fn set_filter(path: &Path, filter: &str) -> Result<(), ConfigError> {
    edit_config(path, |doc| {
        if !doc.contains_key("calendar") {
            doc["calendar"] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        doc["calendar"]["filter"] = toml_edit::value(filter);
    })
}

fn edit_config(path: &Path, edit: impl FnOnce(&mut toml_edit::DocumentMut)) -> Result<(), ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let mut doc: toml_edit::DocumentMut = text.parse().map_err(|e| ConfigError::EditError {
        path: path.to_path_buf(),
        source: e,
    })?;
    edit(&mut doc);
    fs::write(path, doc.to_string()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}
