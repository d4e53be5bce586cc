//! Configuration loading from classcheck.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::ClassCheckError;
use crate::scan::ScanOptions;

/// Name of the configuration file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "classcheck.toml";

/// Main configuration structure for classcheck.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ClassCheckConfig {
    /// URLs of third-party sources searched in addition to local files.
    pub third_party_libraries: Option<Vec<String>>,
    /// File discovery configuration.
    pub scan: Option<ScanConfig>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// File discovery configuration.
#[derive(Debug, Deserialize, Default)]
pub struct ScanConfig {
    /// File extensions searched for usages (without the dot).
    pub extensions: Option<Vec<String>>,
    /// Extra directory names pruned from the walk.
    pub exclude: Option<Vec<String>>,
}

/// Output format configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Output format: "plain" or "json".
    pub format: Option<String>,
}

impl ClassCheckConfig {
    /// Configured reference URLs, empty when unset.
    pub fn library_urls(&self) -> &[String] {
        self.third_party_libraries.as_deref().unwrap_or_default()
    }

    /// Scan options with configured overrides applied to the defaults.
    pub fn scan_options(&self) -> ScanOptions {
        let mut options = ScanOptions::default();
        if let Some(scan) = &self.scan {
            if let Some(extensions) = &scan.extensions {
                options.extensions = extensions
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_string())
                    .collect();
            }
            if let Some(exclude) = &scan.exclude {
                for dir in exclude {
                    if !options.excluded_dirs.contains(dir) {
                        options.excluded_dirs.push(dir.clone());
                    }
                }
            }
        }
        options
    }

    /// True if the configured output format is JSON.
    pub fn wants_json(&self) -> bool {
        self.output
            .as_ref()
            .and_then(|o| o.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

/// Loads configuration from classcheck.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<ClassCheckConfig>> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg = toml::from_str(&content)
        .map_err(|e| ClassCheckError::config(&path, e.to_string()))
        .context("Invalid classcheck.toml")?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let cfg: ClassCheckConfig = toml::from_str(
            r#"
third_party_libraries = ["https://cdn.example.com/bootstrap.css"]

[scan]
extensions = [".css", "vue"]
exclude = ["dist"]

[output]
format = "JSON"
"#,
        )
        .unwrap();

        assert_eq!(cfg.library_urls(), ["https://cdn.example.com/bootstrap.css"]);
        let options = cfg.scan_options();
        assert_eq!(options.extensions, vec!["css", "vue"]);
        assert!(options.excluded_dirs.contains(&"node_modules".to_string()));
        assert!(options.excluded_dirs.contains(&"dist".to_string()));
        assert!(cfg.wants_json());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg: ClassCheckConfig = toml::from_str("").unwrap();
        assert!(cfg.library_urls().is_empty());
        assert_eq!(cfg.scan_options().extensions, ScanOptions::default().extensions);
        assert!(!cfg.wants_json());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = std::env::temp_dir().join(format!("classcheck_cfg_none_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        assert!(load_config(&dir).unwrap().is_none());
        fs::remove_dir_all(&dir).ok();
    }
}
