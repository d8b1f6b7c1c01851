//! Arena-backed page document.
//!
//! Every node lives in one contiguous vector and links to its relatives by
//! index, so node ids stay stable for the whole life of the page even after
//! a node is detached. Detached nodes are never freed; a host page that
//! re-renders a subtree simply leaves the old nodes unreachable.

use html5ever::{LocalName, Namespace, QualName, ns};
use url::Url;

use super::mutation::{MutationKind, MutationRecord, ObserveOptions, Observer};
use crate::error::{Error, Result};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    fn option(self) -> Option<NodeId> {
        self.is_some().then_some(self)
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with qualified name and attributes in source order.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-split class list for fast matching.
        classes: Vec<String>,
    },
    Text(String),
    Comment(String),
    Doctype { name: String },
}

/// Element attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the arena.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Loading state reported by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Complete,
}

/// A live page document.
///
/// The host mutates it through the structural operations below; those
/// operations feed the single mutation observer installed with
/// [`Document::observe`].
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    ready_state: ReadyState,
    base_url: Option<Url>,
    observer: Option<Observer>,
}

impl Document {
    /// Create an empty document that is still loading.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
            ready_state: ReadyState::Loading,
            base_url: None,
            observer: None,
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// The document root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn set_base_url(&mut self, url: Url) {
        self.base_url = Some(url);
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    fn require(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(Error::UnknownNode(id))
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    /// Create a detached HTML element.
    pub fn create_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        self.create_element_ns(ns!(html), tag, attrs)
    }

    /// Create a detached element in the given namespace (e.g. `ns!(svg)`).
    pub fn create_element_ns(
        &mut self,
        namespace: Namespace,
        tag: &str,
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, ns!(), LocalName::from(*name)),
                value: value.to_string(),
            })
            .collect();
        self.create_element_qual(QualName::new(None, namespace, LocalName::from(tag)), attrs)
    }

    /// Create a detached element from a fully qualified name.
    pub(crate) fn create_element_qual(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let classes = attrs
            .iter()
            .find(|a| a.name.local.as_ref() == "class")
            .map(|a| split_classes(&a.value))
            .unwrap_or_default();

        self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            classes,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text.into())))
    }

    pub(crate) fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    pub(crate) fn create_doctype(&mut self, name: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype { name }))
    }

    // ------------------------------------------------------------------
    // Raw link surgery (no mutation records)
    // ------------------------------------------------------------------

    /// Link `child` as the last child of `parent`. Links that would make a
    /// node its own ancestor are skipped.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) {
        if self.is_inclusive_ancestor(child, parent) {
            return;
        }
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
            child_node.next_sibling = NodeId::NONE;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Link `new_node` immediately before `sibling`.
    pub(crate) fn link_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let (parent, prev) = match self.get(sibling) {
            Some(n) => (n.parent, n.prev_sibling),
            None => return,
        };
        if self.is_inclusive_ancestor(new_node, sibling) {
            return;
        }

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Unlink a node from its parent and siblings.
    pub(crate) fn unlink(&mut self, target: NodeId) {
        let (parent, prev, next) = match self.get(target) {
            Some(n) => (n.parent, n.prev_sibling, n.next_sibling),
            None => return,
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if let Some(p) = self.get_mut(parent) {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append text to the last child when it is a text node, otherwise
    /// create a new text node.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(existing) = &mut last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text);
        self.link_last(parent, text_node);
    }

    // ------------------------------------------------------------------
    // Observed structural operations
    // ------------------------------------------------------------------

    /// Append `child` to `parent`, moving it out of its current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.require(parent)?;
        self.require(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(Error::HierarchyRequest(child));
        }
        self.detach(child)?;
        self.link_last(parent, child);
        self.record(parent, MutationKind::added(child));
        Ok(())
    }

    /// Insert `new_node` immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new_node: NodeId) -> Result<()> {
        let parent = self.require(reference)?.parent;
        if parent.is_none() {
            return Err(Error::Detached(reference));
        }
        self.require(new_node)?;
        if self.is_inclusive_ancestor(new_node, reference) {
            return Err(Error::HierarchyRequest(new_node));
        }
        self.detach(new_node)?;
        self.link_before(reference, new_node);
        self.record(parent, MutationKind::added(new_node));
        Ok(())
    }

    /// Insert `new_node` immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new_node: NodeId) -> Result<()> {
        let node = self.require(reference)?;
        let (parent, next) = (node.parent, node.next_sibling);
        if parent.is_none() {
            return Err(Error::Detached(reference));
        }
        if next.is_some() {
            self.insert_before(next, new_node)
        } else {
            self.append_child(parent, new_node)
        }
    }

    /// Remove a node from its parent. Detaching a detached node is a no-op.
    pub fn detach(&mut self, target: NodeId) -> Result<()> {
        let parent = self.require(target)?.parent;
        if parent.is_none() {
            return Ok(());
        }
        self.unlink(target);
        self.record(parent, MutationKind::removed(target));
        Ok(())
    }

    /// Detach every child of `parent`, returning them in order.
    pub fn take_children(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        self.require(parent)?;
        let children: Vec<_> = self.children(parent).collect();
        for child in &children {
            self.unlink(*child);
        }
        if !children.is_empty() {
            self.record(
                parent,
                MutationKind::ChildList {
                    added: Vec::new(),
                    removed: children.clone(),
                },
            );
        }
        Ok(children)
    }

    /// Set an attribute, keeping the pre-split class list in sync.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        let node = self.get_mut(id).ok_or(Error::UnknownNode(id))?;
        let NodeData::Element { attrs, classes, .. } = &mut node.data else {
            return Err(Error::NotAnElement(id));
        };

        match attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            Some(attr) => attr.value = value.to_string(),
            None => attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: value.to_string(),
            }),
        }
        if name == "class" {
            *classes = split_classes(value);
        }

        self.record(
            id,
            MutationKind::Attributes {
                name: name.to_string(),
            },
        );
        Ok(())
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<()> {
        let node = self.get_mut(id).ok_or(Error::UnknownNode(id))?;
        let NodeData::Element { attrs, classes, .. } = &mut node.data else {
            return Err(Error::NotAnElement(id));
        };

        let before = attrs.len();
        attrs.retain(|a| a.name.local.as_ref() != name);
        if name == "class" {
            classes.clear();
        }
        if attrs.len() != before {
            self.record(
                id,
                MutationKind::Attributes {
                    name: name.to_string(),
                },
            );
        }
        Ok(())
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        let node = self.get_mut(id).ok_or(Error::UnknownNode(id))?;
        match &mut node.data {
            NodeData::Text(existing) | NodeData::Comment(existing) => {
                existing.clear();
                existing.push_str(text);
            }
            _ => return Err(Error::NotText(id)),
        }
        self.record(id, MutationKind::CharacterData);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutation observation
    // ------------------------------------------------------------------

    /// Install the mutation observer, replacing any previous one.
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) {
        self.observer = Some(Observer::new(target, options));
    }

    /// Remove the mutation observer and drop its pending records.
    pub fn disconnect(&mut self) {
        self.observer = None;
    }

    pub fn is_observed(&self) -> bool {
        self.observer.is_some()
    }

    /// Drain the records queued since the last call.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.observer
            .as_mut()
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        let Some(observer) = &self.observer else {
            return;
        };
        if !observer.options.accepts(&kind) {
            return;
        }
        let in_scope = target == observer.target
            || (observer.options.subtree && self.is_inclusive_ancestor(observer.target, target));
        if !in_scope {
            return;
        }
        if let Some(observer) = &mut self.observer {
            observer.records.push(MutationRecord { target, kind });
        }
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.option())
    }

    /// Parent, only if it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Iterate over element children only.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(|&c| self.is_element(c))
    }

    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id).next()
    }

    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.prev_sibling;
        while current.is_some() {
            if self.is_element(current) {
                return Some(current);
            }
            current = self.get(current)?.prev_sibling;
        }
        None
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.get(id)?.next_sibling;
        while current.is_some() {
            if self.is_element(current) {
                return Some(current);
            }
            current = self.get(current)?.next_sibling;
        }
        None
    }

    /// Iterate over proper ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Iterate over proper descendants in document order.
    pub fn descendants(&self, scope: NodeId) -> Descendants<'_> {
        let first = self
            .get(scope)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        Descendants {
            doc: self,
            scope,
            next: first,
        }
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// True if the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, id)
    }

    /// The `<body>` element, if the document has one.
    pub fn body(&self) -> Option<NodeId> {
        let html = self
            .element_children(self.root)
            .find(|&c| self.tag_name(c) == Some("html"))?;
        self.element_children(html)
            .find(|&c| self.tag_name(c) == Some("body"))
    }

    /// Find the first element with the given tag in document order.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|&id| self.tag_name(id) == Some(tag))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl Iterator for ChildrenIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Pre-order walk over the subtree under `scope`, following sibling links
/// so it needs no stack.
pub struct Descendants<'a> {
    doc: &'a Document,
    scope: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_none() {
            return None;
        }
        let id = self.next;
        let node = self.doc.get(id)?;

        self.next = if node.first_child.is_some() {
            node.first_child
        } else {
            let mut cursor = id;
            loop {
                if cursor == self.scope {
                    break NodeId::NONE;
                }
                let Some(n) = self.doc.get(cursor) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_some() {
                    break n.next_sibling;
                }
                cursor = n.parent;
                if cursor.is_none() || cursor == self.scope {
                    break NodeId::NONE;
                }
            }
        };
        Some(id)
    }
}

/// Element and text accessors.
impl Document {
    /// Element's local name (tag).
    pub fn local_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Element's tag as a string slice.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.local_name(id).map(|n| n.as_ref())
    }

    pub fn namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Get an attribute value.
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local.as_ref() == attr_name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, id: NodeId, attr_name: &str) -> bool {
        self.attr(id, attr_name).is_some()
    }

    /// Element's classes.
    pub fn classes(&self, id: NodeId) -> &[String] {
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Concatenated text of the node and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for desc in self.descendants(id) {
            if let Some(text) = self.text(desc) {
                out.push_str(text);
            }
        }
        out
    }
}

fn split_classes(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_elements() {
        let mut doc = Document::new();

        let div = doc.create_element("div", &[("id", "main"), ("class", "a b")]);
        doc.append_child(doc.root(), div).unwrap();

        assert_eq!(doc.tag_name(div), Some("div"));
        assert_eq!(doc.attr(div, "id"), Some("main"));
        assert!(doc.has_class(div, "b"));
        assert!(doc.is_connected(div));
    }

    #[test]
    fn test_append_children() {
        let mut doc = Document::new();

        let parent = doc.create_element("div", &[]);
        let child1 = doc.create_element("p", &[]);
        let child2 = doc.create_element("p", &[]);

        doc.append_child(doc.root(), parent).unwrap();
        doc.append_child(parent, child1).unwrap();
        doc.append_child(parent, child2).unwrap();

        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(doc.next_element_sibling(child1), Some(child2));
        assert_eq!(doc.prev_element_sibling(child2), Some(child1));
    }

    #[test]
    fn test_insert_after_last_and_middle() {
        let mut doc = Document::new();
        let parent = doc.create_element("div", &[]);
        let a = doc.create_element("a", &[]);
        let b = doc.create_element("b", &[]);
        let c = doc.create_element("i", &[]);
        doc.append_child(doc.root(), parent).unwrap();
        doc.append_child(parent, a).unwrap();

        doc.insert_after(a, c).unwrap();
        doc.insert_after(a, b).unwrap();

        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![a, b, c]);
    }

    #[test]
    fn test_insert_after_detached_reference_fails() {
        let mut doc = Document::new();
        let lonely = doc.create_element("div", &[]);
        let other = doc.create_element("span", &[]);

        assert!(matches!(
            doc.insert_after(lonely, other),
            Err(Error::Detached(_))
        ));
    }

    #[test]
    fn test_inserting_into_own_subtree_fails() {
        let mut doc = Document::new();
        let outer = doc.create_element("div", &[]);
        let inner = doc.create_element("section", &[]);
        let leaf = doc.create_element("p", &[]);
        doc.append_child(doc.root(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.append_child(inner, leaf).unwrap();

        assert!(matches!(
            doc.append_child(inner, outer),
            Err(Error::HierarchyRequest(id)) if id == outer
        ));
        assert!(matches!(
            doc.append_child(outer, outer),
            Err(Error::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.insert_before(leaf, outer),
            Err(Error::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.insert_after(leaf, inner),
            Err(Error::HierarchyRequest(_))
        ));
        assert!(matches!(
            doc.insert_before(leaf, leaf),
            Err(Error::HierarchyRequest(_))
        ));

        // The tree is untouched and still walkable.
        assert!(doc.is_connected(leaf));
        assert_eq!(doc.parent(outer), Some(doc.root()));
        let under_outer: Vec<_> = doc.descendants(outer).collect();
        assert_eq!(under_outer, vec![inner, leaf]);
    }

    #[test]
    fn test_text_merging() {
        let mut doc = Document::new();

        let p = doc.create_element("p", &[]);
        doc.append_child(doc.root(), p).unwrap();

        doc.append_text(p, "Hello, ");
        doc.append_text(p, "World!");

        let children: Vec<_> = doc.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(doc.text(children[0]), Some("Hello, World!"));
    }

    #[test]
    fn test_descendants_stay_in_scope() {
        let mut doc = Document::new();
        let outer = doc.create_element("div", &[]);
        let inner = doc.create_element("section", &[]);
        let leaf = doc.create_element("p", &[]);
        let sibling = doc.create_element("aside", &[]);
        doc.append_child(doc.root(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.append_child(inner, leaf).unwrap();
        doc.append_child(outer, sibling).unwrap();

        let under_inner: Vec<_> = doc.descendants(inner).collect();
        assert_eq!(under_inner, vec![leaf]);

        let under_outer: Vec<_> = doc.descendants(outer).collect();
        assert_eq!(under_outer, vec![inner, leaf, sibling]);
    }

    #[test]
    fn test_detached_nodes_are_not_connected() {
        let mut doc = Document::new();
        let div = doc.create_element("div", &[]);
        doc.append_child(doc.root(), div).unwrap();
        doc.detach(div).unwrap();

        assert!(!doc.is_connected(div));
        assert!(doc.detach(div).is_ok());
    }

    #[test]
    fn test_set_class_attribute_resplits() {
        let mut doc = Document::new();
        let div = doc.create_element("div", &[("class", "one")]);
        doc.set_attr(div, "class", "two three").unwrap();

        assert!(!doc.has_class(div, "one"));
        assert!(doc.has_class(div, "three"));
    }
}
