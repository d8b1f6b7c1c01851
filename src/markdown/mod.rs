//! Rendered chat message → Markdown.
//!
//! - [`kind`]: classifies each node into a closed set of renderable kinds
//! - [`render`]: the transducer itself
//! - [`escape`]: code span and fence helpers
//!
//! ## Design Notes
//!
//! Chat pages render Markdown to HTML and then decorate it: code blocks get
//! toolbars, math gets KaTeX markup with the TeX source hidden in an
//! annotation. The transducer undoes just enough of that to recover the
//! source. It is not a general HTML converter:
//!
//! - **Literal text**: text is copied as-is, without Markdown escaping
//! - **Single-level inline formatting**: bold, italic and link text come from
//!   the element's text content, so nested formatting is flattened
//! - **Code is verbatim**: code block bodies are never trimmed or reflowed,
//!   and the fence grows past any backtick run inside the code

mod escape;
mod kind;
mod render;

pub use escape::{
    calculate_fence_length, calculate_inline_code_ticks, code_span, fenced_block,
    normalize_language,
};
pub use kind::{NodeKind, classify};
pub use render::{MAX_DEPTH, render};

use crate::dialect::Dialect;
use crate::dom::parse_html;
use crate::error::Result;

/// Parse a page or fragment and render its first message content.
///
/// Falls back to the whole body when the dialect's content selector matches
/// nothing, so pasted fragments convert too.
///
/// ```
/// use mdcopy::dialect::{Dialect, Platform};
/// use mdcopy::markdown::html_to_markdown;
///
/// let dialect = Dialect::builtin(Platform::Gemini);
/// let md = html_to_markdown(r#"<div class="markdown"><h1>Hi</h1></div>"#, &dialect).unwrap();
/// assert_eq!(md, "# Hi");
/// ```
pub fn html_to_markdown(html: &str, dialect: &Dialect) -> Result<String> {
    let doc = parse_html(html);
    let root = doc
        .query_selector(doc.root(), dialect.content_selector())
        .or_else(|| doc.body())
        .unwrap_or_else(|| doc.root());
    render(&doc, root, dialect.markup())
}
