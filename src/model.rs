use pulldown_cmark::{html, Event, Options, Parser};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated recipe. Created only by the pipeline and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub summary: String,
    /// Markdown body
    pub content: String,
}

impl Recipe {
    /// Create a recipe under a freshly generated identifier
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Recipe {
            id: new_id(),
            name: name.into(),
            summary: summary.into(),
            content: content.into(),
        }
    }

    /// Render the markdown content as HTML
    pub fn to_html(&self) -> String {
        markdown_to_html(&self.content)
    }
}

/// 32 character lowercase hex identifier
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    // Raw HTML in model output is shown, not rendered
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
