//! Configuration file structure (raml2html.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "raml2html.toml";

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct RenderSettings {
    /// Main template file; the bundled theme is used when absent
    pub template: Option<PathBuf>,
    pub templates_path: Option<PathBuf>,
    #[serde(default = "default_minify")]
    pub minify: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            template: None,
            templates_path: None,
            minify: default_minify(),
        }
    }
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct OutputSettings {
    pub path: Option<PathBuf>,
}

fn default_minify() -> bool {
    true
}

/// Load configuration from `path` if it exists.
/// Returns an error if the file exists but is malformed.
pub fn load(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No config file at {}", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempdir().unwrap();

        let config = load(&temp.path().join("raml2html.toml")).unwrap();

        assert_eq!(config, ConfigFile::default());
        assert!(config.render.minify);
    }

    #[test]
    fn reads_all_sections() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("raml2html.toml");
        fs::write(
            &path,
            r#"
[render]
template = "theme/main.html"
templates_path = "theme"
minify = false

[output]
path = "api.html"
"#,
        )
        .unwrap();

        let config = load(&path).unwrap();

        assert_eq!(config.render.template, Some(PathBuf::from("theme/main.html")));
        assert_eq!(config.render.templates_path, Some(PathBuf::from("theme")));
        assert!(!config.render.minify);
        assert_eq!(config.output.path, Some(PathBuf::from("api.html")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("raml2html.toml");
        fs::write(&path, "[render\nminify = yes").unwrap();

        let err = load(&path).unwrap_err();

        assert!(err.to_string().contains("Failed to parse"));
    }
}
