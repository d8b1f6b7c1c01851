//! Per-platform page dialects.
//!
//! A [`Dialect`] says where a chat page keeps its messages, the native
//! action button the control sits next to, and the rendered Markdown
//! content. Platforms differ only in selector strings and in how they get
//! from a button container to the content, so a dialect is plain data plus
//! a handful of functions that branch on [`Platform`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::config::SelectorOverrides;
use crate::dom::{Document, NodeId, Selector};
use crate::error::Error;
use crate::inject::CONTROL_MARKER;

/// Supported chat platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Forum-style turn list: every message carries its own action bar.
    ChatGpt,
    /// Card-style responses: a `copy-button` custom element per response,
    /// with the content in a sibling card further up the tree.
    Gemini,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::ChatGpt, Platform::Gemini];

    /// Stable id used as the settings key.
    pub fn id(self) -> &'static str {
        match self {
            Platform::ChatGpt => "chatgpt",
            Platform::Gemini => "gemini",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Work out the platform from the page's host name.
    pub fn detect(hostname: &str) -> Option<Self> {
        let host = hostname.to_ascii_lowercase();
        if host.contains("chatgpt.com") || host.contains("openai.com") {
            Some(Platform::ChatGpt)
        } else if host.contains("gemini.google.com") {
            Some(Platform::Gemini)
        } else {
            None
        }
    }

    fn default_selectors(self) -> SelectorSet<'static> {
        match self {
            Platform::ChatGpt => SelectorSet {
                message: r#"[data-testid^="conversation-turn"]"#,
                button_container: ".flex.flex-wrap.items-center",
                copy_button: r#"[aria-label="Copy"]"#,
                content: ".markdown.prose",
            },
            Platform::Gemini => SelectorSet {
                message: "message-content",
                button_container: "copy-button",
                copy_button: r#"button[aria-label="Copy"]"#,
                content: ".markdown",
            },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| Error::UnsupportedPlatform(s.to_string()))
    }
}

struct SelectorSet<'a> {
    message: &'a str,
    button_container: &'a str,
    copy_button: &'a str,
    content: &'a str,
}

const TEX_ANNOTATION: &str = r#"annotation[encoding="application/x-tex"]"#;
const CODE_LANGUAGE_LABEL: &str = ".code-block-decoration span";
const CODE_CONTENT: &str = r#"code[data-test-id="code-content"]"#;

/// Selectors the transducer uses to pick apart platform-specific markup.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupRules {
    /// TeX source inside a rendered KaTeX formula.
    pub tex_annotation: Selector,
    /// Language label in the header of a decorated code block.
    pub code_language: Selector,
    /// Code body of a decorated code block.
    pub code_content: Selector,
}

impl Default for MarkupRules {
    fn default() -> Self {
        Self {
            tex_annotation: builtin(TEX_ANNOTATION),
            code_language: builtin(CODE_LANGUAGE_LABEL),
            code_content: builtin(CODE_CONTENT),
        }
    }
}

/// Resolved selectors and rules for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Dialect {
    platform: Platform,
    message: Selector,
    button_container: Selector,
    copy_button: Selector,
    content: Selector,
    markup: MarkupRules,
}

fn builtin(source: &'static str) -> Selector {
    Selector::parse(source).expect("built-in selectors are valid")
}

/// Pick the override when it is non-empty and parses, the default otherwise.
fn merge_field(field: &str, custom: Option<&str>, default: &'static str) -> Selector {
    match custom.map(str::trim).filter(|s| !s.is_empty()) {
        Some(custom) => Selector::parse(custom).unwrap_or_else(|e| {
            log::warn!("ignoring {field} override: {e}");
            builtin(default)
        }),
        None => builtin(default),
    }
}

impl Dialect {
    /// Merge optional user overrides over the platform defaults, field by
    /// field.
    pub fn resolve(platform: Platform, overrides: Option<&SelectorOverrides>) -> Self {
        let defaults = platform.default_selectors();
        let custom = overrides.cloned().unwrap_or_default();

        Self {
            platform,
            message: merge_field(
                "messageSelector",
                custom.message_selector.as_deref(),
                defaults.message,
            ),
            button_container: merge_field(
                "buttonContainerSelector",
                custom.button_container_selector.as_deref(),
                defaults.button_container,
            ),
            copy_button: merge_field(
                "copyButtonSelector",
                custom.copy_button_selector.as_deref(),
                defaults.copy_button,
            ),
            content: merge_field(
                "contentSelector",
                custom.content_selector.as_deref(),
                defaults.content,
            ),
            markup: MarkupRules::default(),
        }
    }

    /// The platform's built-in dialect.
    pub fn builtin(platform: Platform) -> Self {
        Self::resolve(platform, None)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn message_selector(&self) -> &Selector {
        &self.message
    }

    pub fn button_container_selector(&self) -> &Selector {
        &self.button_container
    }

    pub fn copy_button_selector(&self) -> &Selector {
        &self.copy_button
    }

    pub fn content_selector(&self) -> &Selector {
        &self.content
    }

    pub fn markup(&self) -> &MarkupRules {
        &self.markup
    }

    /// All button containers currently in the document, in document order.
    pub fn scan(&self, doc: &Document) -> Vec<NodeId> {
        match self.platform {
            Platform::ChatGpt => {
                let mut seen = HashSet::new();
                doc.query_selector_all(doc.root(), &self.message)
                    .into_iter()
                    .flat_map(|message| doc.query_selector_all(message, &self.button_container))
                    .filter(|c| seen.insert(*c))
                    .collect()
            }
            Platform::Gemini => doc.query_selector_all(doc.root(), &self.button_container),
        }
    }

    /// Whether a freshly added node can bring new containers with it.
    pub fn is_relevant_addition(&self, doc: &Document, node: NodeId) -> bool {
        if !doc.is_element(node) {
            return false;
        }
        match self.platform {
            Platform::ChatGpt => doc.matches_or_contains(node, &self.message),
            Platform::Gemini => doc.matches_or_contains(node, &self.button_container),
        }
    }

    /// The native copy button inside a container.
    pub fn anchor_in(&self, doc: &Document, container: NodeId) -> Option<NodeId> {
        doc.query_selector(container, &self.copy_button)
    }

    /// The element that hosts the control for a given anchor.
    pub fn control_container(&self, doc: &Document, anchor: NodeId) -> Option<NodeId> {
        match self.platform {
            Platform::ChatGpt => doc.parent_element(anchor),
            Platform::Gemini => doc.closest(anchor, &self.button_container),
        }
    }

    /// The node the control is inserted directly after.
    pub fn insertion_point(&self, doc: &Document, container: NodeId, anchor: NodeId) -> NodeId {
        match self.platform {
            Platform::ChatGpt => anchor,
            Platform::Gemini => self.control_container(doc, anchor).unwrap_or(container),
        }
    }

    /// Gemini only: whether the element right after the container is
    /// already a control.
    pub fn has_adjacent_control(&self, doc: &Document, container: NodeId) -> bool {
        self.platform == Platform::Gemini
            && doc
                .next_element_sibling(container)
                .is_some_and(|next| doc.attr(next, CONTROL_MARKER) == Some("true"))
    }

    /// Locate the rendered content that belongs to a container.
    pub fn content_root(&self, doc: &Document, container: NodeId) -> Option<NodeId> {
        match self.platform {
            Platform::ChatGpt => {
                let message = doc.closest(container, &self.message)?;
                doc.query_selector(message, &self.content)
            }
            Platform::Gemini => {
                // copy-button > div > div > message-actions > div; the
                // response card is the previous sibling of that last div.
                let mut up = container;
                for _ in 0..4 {
                    up = doc.parent_element(up)?;
                }
                let card = doc.prev_element_sibling(up)?;
                let message = doc.query_selector(card, &self.message).unwrap_or(card);
                doc.query_selector(message, &self.content)
            }
        }
    }
}
