use ammonia::Builder;
use comrak::nodes::NodeValue;
use comrak::{markdown_to_html, parse_document, Arena, Options};
use std::collections::HashSet;

const WORDS_PER_MINUTE: usize = 200;
const EXCERPT_MAX_CHARS: usize = 200;

fn options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options
}

/// Render blog Markdown to sanitized HTML (comrak for GFM, ammonia for XSS).
pub fn render_markdown(raw: &str) -> String {
    let mut options = options();
    // ammonia strips whatever raw HTML comrak lets through
    options.render.unsafe_ = true;

    let html = markdown_to_html(raw, &options);
    sanitize_html(&html)
}

fn sanitize_html(html: &str) -> String {
    let extra_tags: HashSet<&str> = [
        "h1", "h2", "h3", "h4", "h5", "h6", "pre", "code", "blockquote", "hr", "table", "thead",
        "tbody", "tr", "th", "td", "img", "input", "del", "figure", "figcaption",
    ]
    .into_iter()
    .collect();

    let url_schemes: HashSet<&str> = ["http", "https", "mailto"].into_iter().collect();

    let mut builder = Builder::default();
    builder
        .add_tags(&extra_tags)
        .add_tag_attributes("a", &["href", "title"])
        .add_tag_attributes("img", &["src", "alt", "title"])
        .add_tag_attributes("code", &["class"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .url_schemes(url_schemes)
        .link_rel(Some("noopener noreferrer"));

    builder.clean(html).to_string()
}

/// Visible text of a Markdown document, whitespace-collapsed.
pub fn plain_text(raw: &str) -> String {
    let arena = Arena::new();
    let root = parse_document(&arena, raw, &options());

    let mut out = String::new();
    for node in root.descendants() {
        match &node.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::CodeBlock(block) => {
                out.push(' ');
                out.push_str(&block.literal);
            }
            NodeValue::SoftBreak | NodeValue::LineBreak | NodeValue::Paragraph => out.push(' '),
            NodeValue::Heading(_) | NodeValue::Item(_) => out.push(' '),
            _ => {}
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Short plain-text teaser, cut on a word boundary.
pub fn excerpt(raw: &str) -> String {
    let text = plain_text(raw);
    if text.chars().count() <= EXCERPT_MAX_CHARS {
        return text;
    }

    let mut cut: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
    if let Some(idx) = cut.rfind(' ') {
        cut.truncate(idx);
    }
    cut.push('…');
    cut
}

/// Whole minutes at 200 wpm, never less than one.
pub fn reading_time_minutes(raw: &str) -> i32 {
    let words = plain_text(raw).split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i32
}
