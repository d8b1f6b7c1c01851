//! CSS selector matching against the page document.
//!
//! Implements the `selectors` crate's `Element` trait for [`ElementRef`] and
//! wraps compiled selector lists in [`Selector`], which remembers its source
//! text so dialects can report and serialize what they were built from.

use std::fmt;

use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{ParseRelative, SelectorList, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use super::arena::{Document, NodeData, NodeId};
use crate::error::{Error, Result};

/// Our selector implementation for the selectors crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelectors;

/// Identifier string type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct IdentStr(pub String);

impl precomputed_hash::PrecomputedHash for IdentStr {
    fn precomputed_hash(&self) -> u32 {
        let mut h: u32 = 0;
        for byte in self.0.bytes() {
            h = h.wrapping_mul(31).wrapping_add(byte as u32);
        }
        h
    }
}

impl AsRef<str> for IdentStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for IdentStr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for IdentStr {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for IdentStr {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

/// LocalName wrapper that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CssLocalName(pub LocalName);

impl precomputed_hash::PrecomputedHash for CssLocalName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssLocalName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssLocalName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl<'a> From<&'a str> for CssLocalName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

impl AsRef<str> for CssLocalName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Namespace wrapper that implements ToCss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssNamespace(pub Namespace);

impl precomputed_hash::PrecomputedHash for CssNamespace {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for CssNamespace {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for CssNamespace {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'a> From<&'a str> for CssNamespace {
    fn from(s: &'a str) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'i> selectors::parser::Parser<'i> for PageSelectors {
    type Impl = PageSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// Pseudo-elements never match on a static page snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = PageSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// State pseudo-classes (`:hover`, `:link`, ...) are not supported; a
/// selector using one fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = PageSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl cssparser::ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl SelectorImpl for PageSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = IdentStr;
    type Identifier = IdentStr;
    type LocalName = CssLocalName;
    type NamespaceUrl = CssNamespace;
    type NamespacePrefix = IdentStr;
    type BorrowedLocalName = CssLocalName;
    type BorrowedNamespaceUrl = CssNamespace;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// Reference to an element in the document for selector matching.
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    pub doc: &'a Document,
    pub id: NodeId,
}

impl<'a> ElementRef<'a> {
    pub fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.doc.tag_name(self.id))
            .finish()
    }
}

impl selectors::Element for ElementRef<'_> {
    type Impl = PageSelectors;

    fn opaque(&self) -> OpaqueElement {
        match self.doc.get(self.id) {
            Some(node) => OpaqueElement::new(node),
            None => OpaqueElement::new(self),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc
            .parent_element(self.id)
            .map(|p| Self::new(self.doc, p))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.doc
            .prev_element_sibling(self.id)
            .map(|s| Self::new(self.doc, s))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.doc
            .next_element_sibling(self.id)
            .map(|s| Self::new(self.doc, s))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .first_element_child(self.id)
            .map(|c| Self::new(self.doc, c))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        self.doc
            .namespace(self.id)
            .is_some_and(|ns| *ns == html5ever::ns!(html))
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.doc.local_name(self.id).is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &CssNamespace) -> bool {
        self.doc.namespace(self.id).is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.doc.local_name(self.id) == other.doc.local_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssNamespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&IdentStr>,
    ) -> bool {
        for attr in self.doc.attrs(self.id) {
            let ns_match = match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            };
            if !ns_match || attr.name.local != local_name.0 {
                continue;
            }
            return operation.eval_str(&attr.value);
        }
        false
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn is_link(&self) -> bool {
        self.doc.tag_name(self.id) == Some("a") && self.doc.has_attr(self.id, "href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .attr(self.id, "id")
            .is_some_and(|elem_id| case_sensitivity.eq(elem_id.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &IdentStr, case_sensitivity: CaseSensitivity) -> bool {
        self.doc
            .classes(self.id)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &IdentStr) -> Option<IdentStr> {
        None
    }

    fn is_part(&self, _name: &IdentStr) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.id).all(|child| {
            match self.doc.get(child).map(|n| &n.data) {
                Some(NodeData::Element { .. }) => false,
                Some(NodeData::Text(t)) => t.is_empty(),
                _ => true,
            }
        })
    }

    fn is_root(&self) -> bool {
        self.doc.parent(self.id) == Some(self.doc.root())
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &IdentStr) -> bool {
        false
    }
}

/// A compiled selector list plus the text it was parsed from.
#[derive(Clone)]
pub struct Selector {
    source: String,
    list: SelectorList<PageSelectors>,
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Selector {
    /// Parse a comma-separated selector list.
    pub fn parse(source: &str) -> Result<Self> {
        let mut input = cssparser::ParserInput::new(source);
        let mut parser = cssparser::Parser::new(&mut input);
        let list = SelectorList::parse(&PageSelectors, &mut parser, ParseRelative::No)
            .map_err(|_| Error::InvalidSelector(source.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            list,
        })
    }

    /// The text this selector was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True if the element matches any selector in the list.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        if !doc.is_element(id) {
            return false;
        }
        let element = ElementRef::new(doc, id);
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );
        self.list
            .slice()
            .iter()
            .any(|s| selectors::matching::matches_selector(s, 0, None, &element, &mut context))
    }
}

/// Selector queries, scoped the way `querySelector` scopes them: the match
/// must be a proper descendant of the scope, but ancestors above the scope
/// still count for combinators.
impl Document {
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope).find(|&d| selector.matches(self, d))
    }

    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|&d| selector.matches(self, d))
            .collect()
    }

    /// Nearest inclusive ancestor matching the selector.
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&a| selector.matches(self, a))
    }

    /// True if the node matches or contains a match.
    pub fn matches_or_contains(&self, id: NodeId, selector: &Selector) -> bool {
        selector.matches(self, id) || self.query_selector(id, selector).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn select(html: &str, selector: &str) -> (Document, Vec<NodeId>) {
        let doc = parse_html(html);
        let sel = Selector::parse(selector).unwrap();
        let found = doc.query_selector_all(doc.root(), &sel);
        (doc, found)
    }

    #[test]
    fn test_tag_and_class_selectors() {
        let (doc, found) = select(
            r#"<div class="markdown prose"><p class="intro">Hello</p></div>"#,
            ".markdown.prose p.intro",
        );
        assert_eq!(found.len(), 1);
        assert_eq!(doc.tag_name(found[0]), Some("p"));
    }

    #[test]
    fn test_attribute_prefix_selector() {
        let (_, found) = select(
            r#"<article data-testid="conversation-turn-3"></article>
               <article data-testid="composer"></article>"#,
            r#"[data-testid^="conversation-turn"]"#,
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_attribute_equality_selector() {
        let (_, found) = select(
            r#"<button aria-label="Copy"></button><button aria-label="Edit"></button>"#,
            r#"button[aria-label="Copy"]"#,
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_custom_element_tag_selector() {
        let (_, found) = select(
            "<message-content><copy-button></copy-button></message-content>",
            "copy-button",
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_descendant_and_child_combinators() {
        let doc = parse_html("<div><span><p>Nested</p></span></div>");
        let p = doc.find_by_tag("p").unwrap();

        assert!(Selector::parse("div p").unwrap().matches(&doc, p));
        assert!(Selector::parse("span > p").unwrap().matches(&doc, p));
        assert!(!Selector::parse("div > p").unwrap().matches(&doc, p));
    }

    #[test]
    fn test_query_is_scoped_to_descendants() {
        let doc = parse_html(r#"<section class="a"><p>one</p></section><p>two</p>"#);
        let section = doc.find_by_tag("section").unwrap();
        let p = Selector::parse("p").unwrap();

        let found = doc.query_selector_all(section, &p);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.text_content(found[0]), "one");
        assert!(doc.query_selector(found[0], &p).is_none());
    }

    #[test]
    fn test_closest_is_inclusive() {
        let doc = parse_html(r#"<div class="turn"><span class="turn"><b>x</b></span></div>"#);
        let b = doc.find_by_tag("b").unwrap();
        let span = doc.find_by_tag("span").unwrap();
        let turn = Selector::parse(".turn").unwrap();

        assert_eq!(doc.closest(b, &turn), Some(span));
        assert_eq!(doc.closest(span, &turn), Some(span));
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        assert!(matches!(
            Selector::parse("div[["),
            Err(Error::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_state_pseudo_classes_are_rejected() {
        for source in ["a:link", "button:hover", "input:focus"] {
            assert!(Selector::parse(source).is_err(), "{source} parsed");
        }
        assert!(Selector::parse("li:first-child").is_ok());
    }
}
