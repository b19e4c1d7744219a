//! Markdown support for templates.

use minijinja::{Environment, Value};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Name of the template filter.
pub const FILTER: &str = "markdown";

/// Opening tag used for every rendered table.
const TABLE_OPEN: &str = r#"<table class="table">"#;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Convert markdown to HTML.
///
/// Tables are rendered with `class="table"`.
pub fn to_html(text: &str) -> String {
    let mut events: Vec<Event> = Vec::new();
    let mut table: Vec<Event> = Vec::new();
    let mut in_table = false;

    for event in Parser::new_ext(text, options()) {
        match event {
            Event::Start(Tag::Table(_)) => {
                in_table = true;
                table.push(event);
            }
            Event::End(TagEnd::Table) => {
                table.push(event);
                in_table = false;
                events.push(Event::Html(CowStr::from(render_table(table.drain(..)))));
            }
            _ if in_table => table.push(event),
            _ => events.push(event),
        }
    }

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());
    output
}

fn render_table<'a>(events: impl Iterator<Item = Event<'a>>) -> String {
    let mut table = String::new();
    html::push_html(&mut table, events);
    table.replacen("<table>", TABLE_OPEN, 1)
}

/// Register a `markdown` filter that renders with `render`.
///
/// The filter output is marked safe. Undefined and none values render as an
/// empty string, so `{{ method.description | markdown }}` works for optional
/// fields.
pub fn register<F>(env: &mut Environment<'_>, render: F)
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    env.add_filter(FILTER, move |value: Value| -> Value {
        if value.is_undefined() || value.is_none() {
            return Value::from_safe_string(String::new());
        }

        let html = match value.as_str() {
            Some(text) => render(text),
            None => render(&value.to_string()),
        };
        Value::from_safe_string(html)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_basic_markdown() {
        let html = to_html("Some *emphasis* and `code`.");

        assert_eq!(html, "<p>Some <em>emphasis</em> and <code>code</code>.</p>\n");
    }

    #[test]
    fn tables_carry_class() {
        let html = to_html("| Name | Type |\n|:-----|-----:|\n| id | int |\n");

        assert!(html.starts_with(r#"<table class="table">"#));
        assert!(html.contains(r#"<th style="text-align: left">Name</th>"#));
        assert!(html.contains(r#"<td style="text-align: right">int</td>"#));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn content_around_tables_is_kept() {
        let html = to_html("Intro\n\n| a |\n|---|\n| 1 |\n\nOutro");

        assert!(html.starts_with("<p>Intro</p>"));
        assert!(html.contains(r#"<table class="table">"#));
        assert!(html.trim_end().ends_with("<p>Outro</p>"));
    }

    #[test]
    fn raw_html_tables_are_untouched() {
        let html = to_html("<table><tr><td>raw</td></tr></table>\n");

        assert!(html.contains("<table><tr>"));
    }

    #[test]
    fn filter_renders_safe_html() {
        let mut env = Environment::new();
        register(&mut env, to_html);
        env.add_template("page.html", "{{ text | markdown }}").unwrap();

        let html = env
            .get_template("page.html")
            .unwrap()
            .render(context! { text => "**bold**" })
            .unwrap();

        assert_eq!(html, "<p><strong>bold</strong></p>\n");
    }

    #[test]
    fn filter_block_and_missing_values() {
        let mut env = Environment::new();
        register(&mut env, to_html);

        let html = env
            .render_str(
                "{% filter markdown %}# Title{% endfilter %}[{{ missing | markdown }}]",
                context! {},
            )
            .unwrap();

        assert_eq!(html, "<h1>Title</h1>\n[]");
    }
}
