use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

use crate::error::ExecutionError;
use crate::executor::MarkdownRenderer;

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// CommonMark renderer backed by pulldown-cmark.
///
/// Raw HTML in the input is emitted as escaped text and link or image
/// destinations with script-capable schemes are blanked, so the output is
/// safe to embed directly.
#[derive(Debug, Clone, Copy)]
pub struct CmarkRenderer {
    options: Options,
}

impl CmarkRenderer {
    pub fn new() -> Self {
        CmarkRenderer {
            options: Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES,
        }
    }
}

impl Default for CmarkRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> Result<String, ExecutionError> {
        let events = Parser::new_ext(markdown, self.options).map(sanitize_event);
        let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut out, events);
        Ok(out)
    }
}

fn sanitize_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized = url.trim_start().to_ascii_lowercase();
    if UNSAFE_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme)) {
        CowStr::Borrowed("")
    } else {
        url
    }
}
