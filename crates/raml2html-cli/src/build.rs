//! Documentation build command.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use raml2html::{default_config, Source, Url};
use tokio::io::AsyncWriteExt;

use crate::config::ConfigFile;

/// Command-line overrides; `None` falls back to the config file.
#[derive(Debug, Default)]
pub struct Options {
    pub input: Option<String>,
    pub output: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub templates_path: Option<PathBuf>,
    pub minify: Option<bool>,
}

/// Resolved template settings for [`default_config`].
#[derive(Debug, PartialEq)]
struct TemplateSettings {
    main: Option<String>,
    path: Option<PathBuf>,
}

/// Split a template file into its name and search directory.
///
/// An explicit `templates_path` wins over the template's own directory.
fn template_settings(template: Option<&Path>, templates_path: Option<PathBuf>) -> Result<TemplateSettings> {
    let Some(template) = template else {
        return Ok(TemplateSettings {
            main: None,
            path: templates_path,
        });
    };

    if templates_path.is_some() {
        return Ok(TemplateSettings {
            main: Some(template.to_string_lossy().into_owned()),
            path: templates_path,
        });
    }

    let name = template
        .file_name()
        .with_context(|| format!("Invalid template path: {}", template.display()))?;
    let dir = template
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf);

    Ok(TemplateSettings {
        main: Some(name.to_string_lossy().into_owned()),
        path: dir,
    })
}

/// Classify command-line input: URLs are fetched, everything else is a file.
fn input_source(input: &str) -> Result<Source> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input).with_context(|| format!("Invalid URL: {}", input))?;
        return Ok(Source::Url(url));
    }

    Ok(Source::Path(PathBuf::from(input)))
}

/// Run the build.
pub async fn run(options: Options, file_config: ConfigFile) -> Result<()> {
    let Some(input) = options.input else {
        bail!("No input given. Pass a RAML file path or URL.");
    };

    let templates = template_settings(
        options.template.or(file_config.render.template).as_deref(),
        options.templates_path.or(file_config.render.templates_path),
    )?;
    let minify = options.minify.unwrap_or(file_config.render.minify);
    let output_path = options.output.or(file_config.output.path);

    let mut config = default_config(templates.main.as_deref(), templates.path.as_deref());
    if !minify {
        config = config.without_post_process_html();
    }

    let source = input_source(&input)?;
    tracing::info!("Rendering {}", source.describe());
    let start = Instant::now();

    let html = raml2html::render(source, Some(config))
        .await
        .with_context(|| format!("Failed to render {}", input))?
        .into_html()
        .context("Renderer did not produce HTML")?;

    match output_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&path, &html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(
                "Wrote {} bytes to {} in {}ms",
                html.len(),
                path.display(),
                start.elapsed().as_millis()
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(html.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputSettings, RenderSettings};
    use tempfile::tempdir;

    const RAML: &str = "#%RAML 0.8\ntitle: CLI Test\n/ping:\n  get:\n    description: Ping it.\n";

    #[test]
    fn template_directory_becomes_search_path() {
        let settings = template_settings(Some(Path::new("theme/main.html")), None).unwrap();

        assert_eq!(
            settings,
            TemplateSettings {
                main: Some("main.html".to_string()),
                path: Some(PathBuf::from("theme")),
            }
        );
    }

    #[test]
    fn bare_template_name_uses_working_directory() {
        let settings = template_settings(Some(Path::new("main.html")), None).unwrap();

        assert_eq!(settings.main.as_deref(), Some("main.html"));
        assert_eq!(settings.path, None);
    }

    #[test]
    fn explicit_templates_path_wins() {
        let settings = template_settings(
            Some(Path::new("pages/main.html")),
            Some(PathBuf::from("theme")),
        )
        .unwrap();

        assert_eq!(settings.main.as_deref(), Some("pages/main.html"));
        assert_eq!(settings.path, Some(PathBuf::from("theme")));
    }

    #[test]
    fn no_template_means_bundled_theme() {
        let settings = template_settings(None, None).unwrap();

        assert_eq!(settings, TemplateSettings { main: None, path: None });
    }

    #[test]
    fn input_is_a_path_or_url() {
        assert_eq!(
            input_source("docs/api.raml").unwrap(),
            Source::Path(PathBuf::from("docs/api.raml"))
        );
        assert!(matches!(
            input_source("https://example.com/api.raml").unwrap(),
            Source::Url(url) if url.path() == "/api.raml"
        ));
    }

    #[tokio::test]
    async fn missing_file_names_the_file() {
        let options = Options {
            input: Some("typo.raml".to_string()),
            ..Options::default()
        };

        let err = run(options, ConfigFile::default()).await.unwrap_err();

        assert!(format!("{err:#}").contains("Failed to read typo.raml"));
    }

    #[tokio::test]
    async fn missing_input_is_an_error() {
        let err = run(Options::default(), ConfigFile::default()).await.unwrap_err();

        assert!(err.to_string().contains("No input"));
    }

    #[tokio::test]
    async fn writes_to_config_output_path() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("api.raml");
        std::fs::write(&input, RAML).unwrap();
        let output = temp.path().join("out/api.html");

        let file_config = ConfigFile {
            render: RenderSettings {
                minify: false,
                ..RenderSettings::default()
            },
            output: OutputSettings {
                path: Some(output.clone()),
            },
        };
        let options = Options {
            input: Some(input.to_string_lossy().into_owned()),
            ..Options::default()
        };

        run(options, file_config).await.unwrap();

        let html = std::fs::read_to_string(output).unwrap();
        assert!(html.contains("CLI Test"));
        assert!(html.contains("Ping it."));
    }

    #[tokio::test]
    async fn renders_with_custom_template_file() {
        let temp = tempdir().unwrap();
        let input = temp.path().join("api.raml");
        std::fs::write(&input, RAML).unwrap();
        let theme = temp.path().join("theme");
        std::fs::create_dir(&theme).unwrap();
        std::fs::write(theme.join("page.html"), "<h1>{{ title }}</h1>").unwrap();
        let output = temp.path().join("api.html");

        let options = Options {
            input: Some(input.to_string_lossy().into_owned()),
            output: Some(output.clone()),
            template: Some(theme.join("page.html")),
            minify: Some(false),
            ..Options::default()
        };

        run(options, ConfigFile::default()).await.unwrap();

        assert_eq!(std::fs::read_to_string(output).unwrap(), "<h1>CLI Test</h1>");
    }
}
