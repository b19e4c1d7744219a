//! HTML minification.
//!
//! Whitespace between block-level tags is dropped, other whitespace runs are
//! collapsed to a single space and comments are removed. Tags are written
//! back exactly as they appear, so attribute quotes are always preserved.
//! `<pre>`, `<textarea>` and `<script>` elements pass through untouched;
//! `<style>` contents are minified as CSS.

use std::sync::LazyLock;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use regex::{Captures, Regex};

use crate::render::Error;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?is)(?P<comment><!--.*?-->)"#,
        r#"|(?P<raw><pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>)"#,
        r#"|<style\b(?P<style_attrs>(?:[^>"']|"[^"]*"|'[^']*')*)>(?P<css>.*?)</style\s*>"#,
        r#"|<(?:/)?(?P<name>!?[a-z][a-z0-9-]*)(?:[^>"']|"[^"]*"|'[^']*')*>"#,
    ))
    .expect("valid HTML token pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n\x0C]+").expect("valid whitespace pattern"));

/// Elements around which whitespace carries no meaning.
const BLOCK_ELEMENTS: &[&str] = &[
    "!doctype", "address", "article", "aside", "blockquote", "body", "dd", "details", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hr", "html", "li", "link", "main", "meta", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr",
    "ul",
];

/// Minify CSS using lightningcss.
fn minify_css(css: &str) -> Result<String, Error> {
    let stylesheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| Error::Minify(format!("CSS parse error: {}", e)))?;

    let minified = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| Error::Minify(format!("CSS minify error: {}", e)))?;

    Ok(minified.code)
}

/// Whether whitespace next to this token can be dropped.
fn is_block(caps: &Captures) -> bool {
    if caps.name("comment").is_some() || caps.name("css").is_some() {
        return true;
    }

    if let Some(raw) = caps.name("raw") {
        let raw = raw.as_str();
        return raw.len() >= 4 && !raw[..4].eq_ignore_ascii_case("<tex");
    }

    caps.name("name")
        .map(|name| BLOCK_ELEMENTS.contains(&name.as_str().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn push_text(out: &mut String, text: &str, after_block: bool, before_block: bool) {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let mut text = collapsed.as_ref();
    if after_block {
        text = text.trim_start_matches(' ');
    }
    if before_block {
        text = text.trim_end_matches(' ');
    }
    out.push_str(text);
}

/// Minify `html` on the current thread.
pub fn minify_html(html: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut after_block = true;

    for caps in TOKEN.captures_iter(html) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        let block = is_block(&caps);
        push_text(&mut out, &html[last..token.start()], after_block, block);

        if let Some(comment) = caps.name("comment") {
            // Conditional comments are markup for old browsers.
            if comment.as_str().starts_with("<!--[if") {
                out.push_str(comment.as_str());
            }
        } else if let Some(css) = caps.name("css") {
            let attrs = caps.name("style_attrs").map_or("", |m| m.as_str());
            out.push_str("<style");
            out.push_str(attrs);
            out.push('>');
            out.push_str(&minify_css(css.as_str())?);
            out.push_str("</style>");
        } else {
            out.push_str(token.as_str());
        }

        after_block = block;
        last = token.end();
    }

    push_text(&mut out, &html[last..], after_block, true);
    Ok(out)
}

/// Minify rendered HTML on a blocking thread.
///
/// Minifier failures are reported as [`Error::Minify`].
pub async fn minify(html: String) -> Result<String, Error> {
    let input_len = html.len();

    let minified = tokio::task::spawn_blocking(move || minify_html(&html))
        .await
        .map_err(|e| Error::Minify(e.to_string()))??;

    tracing::debug!("Minified HTML from {} to {} bytes", input_len, minified.len());

    Ok(minified)
}
