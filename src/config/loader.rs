use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use super::SchedulerConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Option<Format> {
    match path.extension()?.to_str()? {
        "yaml" | "yml" => Some(Format::Yaml),
        "json" => Some(Format::Json),
        _ => None,
    }
}

/// Loads a single YAML or JSON config file, chosen by extension.
pub fn load_config(path: &Path) -> Result<SchedulerConfig, ConfigError> {
    let format = format_of(path).ok_or_else(|| ConfigError::unsupported_format(path))?;
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

    let config = match format {
        Format::Yaml => serde_yaml::from_str(&content).map_err(|e| ConfigError::parse(path, e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e.to_string())),
    }?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Loads a config file, or merges every config file under a directory in name order.
pub fn load_path(path: &Path) -> Result<SchedulerConfig, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::read(path, e))?;
    if metadata.is_file() {
        return load_config(path);
    }

    let mut merged: Option<SchedulerConfig> = None;
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| ConfigError::read(path, e.into()))?;
        if !entry.file_type().is_file() || format_of(entry.path()).is_none() {
            continue;
        }
        let config = load_config(entry.path())?;
        match merged.as_mut() {
            Some(existing) => existing.merge(config),
            None => merged = Some(config),
        }
    }

    merged.ok_or_else(|| {
        ConfigError::invalid(format!("no config files found in {}", path.display()))
    })
}
