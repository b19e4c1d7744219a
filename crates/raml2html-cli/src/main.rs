//! raml2html CLI - render RAML API descriptions to HTML documentation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod build;
mod config;

#[derive(Parser)]
#[command(name = "raml2html")]
#[command(about = "Render RAML API descriptions to HTML documentation")]
#[command(version)]
pub struct Cli {
    /// RAML file path or URL
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    /// RAML file path or URL (alternative to the positional argument)
    #[arg(short, long = "input", value_name = "INPUT", conflicts_with = "input")]
    input_flag: Option<String>,

    /// Output file (defaults to config or stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Main template file
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Directory to resolve templates from (defaults to the template's directory)
    #[arg(long)]
    templates_path: Option<PathBuf>,

    /// Skip minification
    #[arg(long)]
    no_minify: bool,

    /// Path to raml2html.toml config file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let file_config = config::load(&cli.config)?;

    build::run(
        build::Options {
            input: cli.input.or(cli.input_flag),
            output: cli.output,
            template: cli.template,
            templates_path: cli.templates_path,
            minify: if cli.no_minify { Some(false) } else { None },
        },
        file_config,
    )
    .await
}
