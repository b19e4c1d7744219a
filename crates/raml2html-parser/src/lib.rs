//! RAML loader for raml2html.
//!
//! This crate turns a RAML document, given as a file path, URL, raw text or an
//! already-parsed value, into a [`RamlObject`]: an ordered mapping with
//! includes resolved, traits and resource types applied and resources laid out
//! as a tree ready for templates.

mod include;
pub mod normalize;
pub mod object;
pub mod parser;
pub mod source;

pub use include::MAX_INCLUDE_DEPTH;
pub use normalize::METHODS;
pub use object::RamlObject;
pub use parser::{parse, ParseError, SUPPORTED_VERSIONS};
pub use source::Source;

/// Re-exported so callers can build [`Source::Url`] without a direct dependency.
pub use reqwest::Url;
