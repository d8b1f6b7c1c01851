//! The page document: an arena node tree the host mutates and the
//! controller reads.
//!
//! - [`arena`]: node storage, structural operations, navigation
//! - [`mutation`]: the single mutation observer subscription
//! - [`selector`]: CSS selector queries via the `selectors` crate
//! - [`serialize`]: HTML output for debugging and the CLI
//!
//! # Example
//!
//! ```
//! use mdcopy::dom::{parse_html, Selector};
//!
//! let doc = parse_html(r#"<div class="markdown"><p>Hello</p></div>"#);
//! let markdown = Selector::parse(".markdown").unwrap();
//! let root = doc.query_selector(doc.root(), &markdown).unwrap();
//! assert_eq!(doc.text_content(root), "Hello");
//! ```

mod arena;
mod mutation;
mod selector;
mod serialize;
mod tree_sink;

pub use arena::{Attribute, ChildrenIter, Descendants, Document, Node, NodeData, NodeId, ReadyState};
pub use mutation::{MutationKind, MutationRecord, ObserveOptions};
pub use selector::{ElementRef, PageSelectors, Selector};
pub use tree_sink::DocumentSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

/// Parse a full HTML page into a document whose ready state is complete.
pub fn parse_html(html: &str) -> Document {
    let sink = DocumentSink::new();
    let result = parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes());
    let mut doc = result.into_document();
    doc.set_ready_state(ReadyState::Complete);
    doc
}
