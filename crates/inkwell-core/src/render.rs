//! Content rendering for document views.
//!
//! The file extension picks the render mode: `.md` is converted to HTML for
//! embedding in the page layout, `.txt` is served byte-for-byte as plain
//! text. Any other extension is also served as plain text rather than
//! producing an empty response.

use std::path::Path;

use pulldown_cmark::{Options, Parser, html};

/// Content type of a rendered markdown body once wrapped in the layout.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Content type of a passthrough body.
pub const PLAIN_CONTENT_TYPE: &str = "text/plain";

/// A document body ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// HTML converted from markdown. Not escaped; embed as-is.
    Html(String),
    /// The raw document bytes.
    PlainText(Vec<u8>),
}

impl Rendered {
    /// The `Content-Type` header value for this body.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Html(_) => HTML_CONTENT_TYPE,
            Self::PlainText(_) => PLAIN_CONTENT_TYPE,
        }
    }
}

/// Render a document for viewing based on its extension.
#[must_use]
pub fn render(filename: &str, content: &[u8]) -> Rendered {
    let extension = Path::new(filename).extension().and_then(|e| e.to_str());

    match extension {
        Some("md") => Rendered::Html(markdown_to_html(&String::from_utf8_lossy(content))),
        _ => Rendered::PlainText(content.to_vec()),
    }
}

/// Convert markdown text to an HTML fragment.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);
    html_output
}
