use std::path::Path;

use log::debug;

use crate::config::types::Criteria;
use crate::config::validation;
use crate::utils::error::{Result, TocError};
use crate::utils::fs;

/// Configuration file names looked up next to the book when none is given
pub const CONFIG_FILES: [&str; 4] = ["tocgen.yml", "tocgen.yaml", "tocgen.toml", "tocgen.json"];

/// Load generation criteria from a file, or the built-in defaults when `path` is `None`
pub fn load_criteria(path: Option<&Path>) -> Result<Criteria> {
    let criteria = match path {
        Some(path) => {
            debug!("Loading criteria from {}", path.display());
            parse_criteria_file(path)?
        }
        None => {
            debug!("No configuration file given, using default rules");
            Criteria::default()
        }
    };

    validation::validate_criteria(&criteria)?;

    debug!(
        "Criteria loaded: {} rules, {} tags, {} styled levels",
        criteria.rules.len(),
        criteria.tags.len(),
        criteria.style.len()
    );
    Ok(criteria)
}

/// Find a default configuration file in a directory
pub fn find_config_file<P: AsRef<Path>>(dir: P) -> Option<std::path::PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| dir.as_ref().join(name))
        .find(|path| path.is_file())
}

/// Parse a configuration file, choosing the format from its extension
fn parse_criteria_file(config_path: &Path) -> Result<Criteria> {
    if !config_path.exists() {
        return Err(TocError::Config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let content = fs::read_file(config_path).map_err(|e| {
        TocError::Config(format!(
            "Failed to read configuration file {}: {}",
            config_path.display(),
            e
        ))
    })?;

    match config_path.extension() {
        Some(ext) => {
            let ext_str = ext.to_string_lossy().to_lowercase();
            match ext_str.as_str() {
                "yml" | "yaml" => parse_yaml_criteria(&content, config_path),
                "toml" => parse_toml_criteria(&content, config_path),
                "json" => parse_json_criteria(&content, config_path),
                _ => Err(TocError::Config(format!(
                    "Unsupported configuration file format: {}",
                    ext.to_string_lossy()
                ))),
            }
        }
        // Assume YAML if no extension
        None => parse_yaml_criteria(&content, config_path),
    }
}

/// Parse YAML criteria
pub fn parse_yaml_criteria(content: &str, path: &Path) -> Result<Criteria> {
    serde_yaml::from_str(content).map_err(|e| {
        TocError::Config(format!(
            "Failed to parse YAML configuration ({}): {}",
            path.display(),
            e
        ))
    })
}

/// Parse TOML criteria
pub fn parse_toml_criteria(content: &str, path: &Path) -> Result<Criteria> {
    toml::from_str(content).map_err(|e| {
        TocError::Config(format!(
            "Failed to parse TOML configuration ({}): {}",
            path.display(),
            e
        ))
    })
}

/// Parse JSON criteria (the format the plugin host saves)
pub fn parse_json_criteria(content: &str, path: &Path) -> Result<Criteria> {
    serde_json::from_str(content).map_err(|e| {
        TocError::Config(format!(
            "Failed to parse JSON configuration ({}): {}",
            path.display(),
            e
        ))
    })
}

/// Render criteria in the requested format (`yaml`, `toml` or `json`)
pub fn render_criteria(criteria: &Criteria, format: &str) -> Result<String> {
    match format {
        "yaml" | "yml" => serde_yaml::to_string(criteria)
            .map_err(|e| TocError::Config(format!("Failed to render YAML: {}", e))),
        "toml" => toml::to_string_pretty(criteria)
            .map_err(|e| TocError::Config(format!("Failed to render TOML: {}", e))),
        "json" => serde_json::to_string_pretty(criteria)
            .map_err(|e| TocError::Config(format!("Failed to render JSON: {}", e))),
        other => Err(TocError::Config(format!("Unknown output format: {}", other))),
    }
}
