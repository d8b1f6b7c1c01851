//! Node classification for the transducer.

use crate::dom::{Document, NodeData, NodeId};

/// How a node renders. Each node is classified exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    /// Comments, doctypes and anything else with no Markdown form.
    Ignored,
    /// `<code-block>` with a decoration header and a code body.
    DecoratedCode,
    Heading(u8),
    Paragraph,
    Strong,
    Emphasis,
    InlineCode,
    Preformatted,
    Link,
    UnorderedList,
    OrderedList,
    ListItem,
    BlockQuote,
    Rule,
    Break,
    /// `span.katex`: TeX lives in an annotation element.
    Katex,
    /// Formula stored in a `data-math` attribute.
    DataMath { display: bool },
    /// Render children only.
    Container,
}

impl NodeKind {
    pub fn is_list(self) -> bool {
        matches!(self, NodeKind::UnorderedList | NodeKind::OrderedList)
    }
}

pub fn classify(doc: &Document, id: NodeId) -> NodeKind {
    let Some(node) = doc.get(id) else {
        return NodeKind::Ignored;
    };

    match &node.data {
        NodeData::Text(_) => NodeKind::Text,
        NodeData::Document => NodeKind::Container,
        NodeData::Comment(_) | NodeData::Doctype { .. } => NodeKind::Ignored,
        NodeData::Element { name, .. } => match name.local.as_ref() {
            "code-block" => NodeKind::DecoratedCode,
            "h1" => NodeKind::Heading(1),
            "h2" => NodeKind::Heading(2),
            "h3" => NodeKind::Heading(3),
            "h4" => NodeKind::Heading(4),
            "h5" => NodeKind::Heading(5),
            "h6" => NodeKind::Heading(6),
            "p" => NodeKind::Paragraph,
            "strong" | "b" => NodeKind::Strong,
            "em" | "i" => NodeKind::Emphasis,
            "code" => NodeKind::InlineCode,
            "pre" => NodeKind::Preformatted,
            "a" => NodeKind::Link,
            "ul" => NodeKind::UnorderedList,
            "ol" => NodeKind::OrderedList,
            "li" => NodeKind::ListItem,
            "blockquote" => NodeKind::BlockQuote,
            "hr" => NodeKind::Rule,
            "br" => NodeKind::Break,
            "span" if doc.has_class(id, "katex") => NodeKind::Katex,
            "span" if doc.has_class(id, "math-block") => NodeKind::DataMath { display: true },
            "span" if doc.has_class(id, "math-inline") => NodeKind::DataMath { display: false },
            "div" if doc.has_class(id, "math-block") => NodeKind::DataMath { display: true },
            _ => NodeKind::Container,
        },
    }
}
