//! Content tree → Markdown rendering.
//!
//! Rendering is compositional: every node renders to its own string and
//! parents assemble those strings. The only state that travels down is
//! [`Scope`], which records whether an ancestor already covers the node.

use url::Url;

use crate::dialect::MarkupRules;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

use super::escape::{code_span, fenced_block, normalize_language};
use super::kind::{NodeKind, classify};

/// Deepest element nesting rendered before giving up.
pub const MAX_DEPTH: usize = 256;

/// Facts about a node's ancestors that change how it renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Scope {
    /// Some ancestor is a decorated code block.
    in_decorated_code: bool,
    /// The direct parent is `<pre>`.
    parent_is_pre: bool,
}

impl Scope {
    /// Compute the scope of an arbitrary node from its ancestor chain.
    fn of(doc: &Document, id: NodeId) -> Self {
        Self {
            in_decorated_code: doc
                .ancestors(id)
                .any(|a| doc.tag_name(a) == Some("code-block")),
            parent_is_pre: doc.parent(id).and_then(|p| doc.tag_name(p)) == Some("pre"),
        }
    }

    /// Scope for the children of `kind`.
    fn enter(self, kind: NodeKind) -> Self {
        Self {
            in_decorated_code: self.in_decorated_code || kind == NodeKind::DecoratedCode,
            parent_is_pre: kind == NodeKind::Preformatted,
        }
    }
}

/// Render a content subtree to Markdown.
///
/// The result is trimmed. Rendering reads the document only and holds no
/// state between calls.
pub fn render(doc: &Document, root: NodeId, markup: &MarkupRules) -> Result<String> {
    if doc.get(root).is_none() {
        return Err(Error::UnknownNode(root));
    }
    let renderer = Renderer {
        doc,
        markup,
        base_url: doc.base_url(),
    };
    let out = renderer.node(root, "", Scope::of(doc, root), 0)?;
    Ok(out.trim().to_string())
}

struct Renderer<'a> {
    doc: &'a Document,
    markup: &'a MarkupRules,
    base_url: Option<&'a Url>,
}

impl Renderer<'_> {
    fn node(&self, id: NodeId, indent: &str, scope: Scope, depth: usize) -> Result<String> {
        self.classified(id, classify(self.doc, id), indent, scope, depth)
    }

    fn classified(
        &self,
        id: NodeId,
        kind: NodeKind,
        indent: &str,
        scope: Scope,
        depth: usize,
    ) -> Result<String> {
        let doc = self.doc;
        if depth > MAX_DEPTH {
            return Err(Error::NestingTooDeep {
                tag: doc.tag_name(id).unwrap_or("#text").to_string(),
            });
        }

        let inner = scope.enter(kind);

        let out = match kind {
            NodeKind::Text => doc.text(id).unwrap_or_default().to_string(),

            NodeKind::Ignored => String::new(),

            NodeKind::DecoratedCode => self.decorated_code(id),

            NodeKind::Heading(level) => {
                format!("{} {}\n\n", "#".repeat(level as usize), doc.text_content(id))
            }

            NodeKind::Paragraph => self.children(id, indent, inner, depth)? + "\n\n",

            NodeKind::Strong => format!("**{}**", doc.text_content(id)),

            NodeKind::Emphasis => format!("*{}*", doc.text_content(id)),

            NodeKind::InlineCode => {
                if scope.in_decorated_code || scope.parent_is_pre {
                    String::new()
                } else {
                    code_span(&doc.text_content(id))
                }
            }

            NodeKind::Preformatted => {
                if scope.in_decorated_code {
                    String::new()
                } else {
                    self.preformatted(id)
                }
            }

            NodeKind::Link => {
                format!("[{}]({})", doc.text_content(id), self.resolve_href(id))
            }

            NodeKind::UnorderedList => {
                let child_indent = format!("{indent}  ");
                let mut items = Vec::new();
                for item in doc.element_children(id) {
                    let body = self.node(item, &child_indent, inner, depth + 1)?;
                    items.push(format!("{indent}- {}", body.trim()));
                }
                items.join("\n") + "\n\n"
            }

            NodeKind::OrderedList => {
                let child_indent = format!("{indent}   ");
                let mut items = Vec::new();
                for (i, item) in doc.element_children(id).enumerate() {
                    let body = self.node(item, &child_indent, inner, depth + 1)?;
                    items.push(format!("{indent}{}. {}", i + 1, body.trim()));
                }
                items.join("\n") + "\n\n"
            }

            NodeKind::ListItem => {
                let mut out = String::new();
                for child in doc.children(id) {
                    let child_kind = classify(doc, child);
                    let part = self.classified(child, child_kind, indent, inner, depth + 1)?;
                    // A nested list never continues the item's text line.
                    if child_kind.is_list()
                        && !out.trim_end_matches(' ').is_empty()
                        && !out.ends_with('\n')
                    {
                        out.push('\n');
                    }
                    out.push_str(&part);
                }
                out
            }

            NodeKind::BlockQuote => {
                let body = self.children(id, indent, inner, depth)?;
                let quoted: Vec<String> = body
                    .trim()
                    .split('\n')
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {line}")
                        }
                    })
                    .collect();
                quoted.join("\n") + "\n\n"
            }

            NodeKind::Rule => "---\n\n".to_string(),

            NodeKind::Break => "\n".to_string(),

            NodeKind::Katex => {
                let display = doc.has_class(id, "katex-display")
                    || doc
                        .parent_element(id)
                        .is_some_and(|p| doc.has_class(p, "katex-display"));
                doc.query_selector(id, &self.markup.tex_annotation)
                    .map(|annotation| math(&doc.text_content(annotation), display))
                    .unwrap_or_default()
            }

            NodeKind::DataMath { display } => doc
                .attr(id, "data-math")
                .filter(|f| !f.is_empty())
                .map(|f| math(f, display))
                .unwrap_or_default(),

            NodeKind::Container => self.children(id, indent, inner, depth)?,
        };

        Ok(out)
    }

    fn children(&self, id: NodeId, indent: &str, scope: Scope, depth: usize) -> Result<String> {
        let mut out = String::new();
        for child in self.doc.children(id) {
            out.push_str(&self.node(child, indent, scope, depth + 1)?);
        }
        Ok(out)
    }

    fn decorated_code(&self, id: NodeId) -> String {
        let doc = self.doc;
        let Some(code) = doc.query_selector(id, &self.markup.code_content) else {
            return String::new();
        };
        let language = doc
            .query_selector(id, &self.markup.code_language)
            .and_then(|label| normalize_language(&doc.text_content(label)));
        fenced_block(&doc.text_content(code), language.as_deref())
    }

    fn preformatted(&self, id: NodeId) -> String {
        let doc = self.doc;
        let code = doc
            .descendants(id)
            .find(|&d| doc.tag_name(d) == Some("code"));

        match code {
            Some(code) => {
                // ChatGPT puts the language label in pre > div > div.
                let language = doc
                    .first_element_child(id)
                    .and_then(|header| doc.first_element_child(header))
                    .and_then(|label| normalize_language(&doc.text_content(label)));
                fenced_block(&doc.text_content(code), language.as_deref())
            }
            None => fenced_block(&doc.text_content(id), None),
        }
    }

    fn resolve_href(&self, id: NodeId) -> String {
        let Some(href) = self.doc.attr(id, "href") else {
            return String::new();
        };
        let href = href.trim();
        let resolved = match self.base_url {
            Some(base) => base.join(href),
            None => Url::parse(href),
        };
        match resolved {
            Ok(url) => url.to_string(),
            Err(_) => href.to_string(),
        }
    }
}

fn math(formula: &str, display: bool) -> String {
    if formula.is_empty() {
        String::new()
    } else if display {
        format!("\n$$\n{formula}\n$$\n\n")
    } else {
        format!("${formula}$")
    }
}
