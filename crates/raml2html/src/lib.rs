//! Render RAML API descriptions to HTML documentation.
//!
//! [`render`] parses a RAML source, hands the parsed object to the configured
//! renderer and optionally post-processes the HTML. [`default_config`] wires
//! the bundled minijinja theme, markdown support, JSON schema expansion and
//! HTML minification into a ready-to-use [`Config`].
//!
//! ```no_run
//! # async fn run() -> Result<(), raml2html::Error> {
//! let config = raml2html::default_config(None, None);
//! let output = raml2html::render("api.raml", Some(config)).await?;
//! println!("{}", output.as_html().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod defaults;
pub mod expander;
pub mod markdown;
pub mod minify;
pub mod render;
pub mod security;
pub mod templates;

pub use config::{Config, Output, PostProcessHtml, ProcessRamlObj};
pub use defaults::default_config;
pub use render::{render, Error, VERSION};

pub use raml2html_parser::{ParseError, RamlObject, Source, Url};
