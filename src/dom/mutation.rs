//! Mutation observation for the page document.
//!
//! A document carries at most one observer. Structural operations on the
//! [`Document`](super::Document) queue [`MutationRecord`]s for it when the
//! change falls inside the observed subtree and the options accept its kind.

use super::NodeId;

/// Which mutations an observer wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
}

impl ObserveOptions {
    /// Node insertions and removals anywhere under the target.
    pub fn structural() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Self::default()
        }
    }

    pub(crate) fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList { .. } => self.child_list,
            MutationKind::Attributes { .. } => self.attributes,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    Attributes {
        name: String,
    },
    CharacterData,
}

impl MutationKind {
    pub(crate) fn added(node: NodeId) -> Self {
        Self::ChildList {
            added: vec![node],
            removed: Vec::new(),
        }
    }

    pub(crate) fn removed(node: NodeId) -> Self {
        Self::ChildList {
            added: Vec::new(),
            removed: vec![node],
        }
    }
}

/// One observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// Parent for child-list changes, the node itself otherwise.
    pub target: NodeId,
    pub kind: MutationKind,
}

impl MutationRecord {
    /// Nodes this record added, empty for anything but child-list changes.
    pub fn added_nodes(&self) -> &[NodeId] {
        match &self.kind {
            MutationKind::ChildList { added, .. } => added,
            _ => &[],
        }
    }
}

#[derive(Debug)]
pub(crate) struct Observer {
    pub(crate) target: NodeId,
    pub(crate) options: ObserveOptions,
    pub(crate) records: Vec<MutationRecord>,
}

impl Observer {
    pub(crate) fn new(target: NodeId, options: ObserveOptions) -> Self {
        Self {
            target,
            options,
            records: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn test_structural_observer_ignores_attributes() {
        let mut doc = Document::new();
        let main = doc.create_element("main", &[]);
        doc.append_child(doc.root(), main).unwrap();
        doc.observe(main, ObserveOptions::structural());

        let div = doc.create_element("div", &[]);
        doc.append_child(main, div).unwrap();
        doc.set_attr(div, "class", "busy").unwrap();

        let records = doc.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].added_nodes(), &[div]);
        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn test_mutations_outside_target_are_not_recorded() {
        let mut doc = Document::new();
        let main = doc.create_element("main", &[]);
        let aside = doc.create_element("aside", &[]);
        doc.append_child(doc.root(), main).unwrap();
        doc.append_child(doc.root(), aside).unwrap();
        doc.observe(main, ObserveOptions::structural());

        let span = doc.create_element("span", &[]);
        doc.append_child(aside, span).unwrap();

        assert!(doc.take_records().is_empty());
    }

    #[test]
    fn test_subtree_records_deep_insertions() {
        let mut doc = Document::new();
        let main = doc.create_element("main", &[]);
        let section = doc.create_element("section", &[]);
        doc.append_child(doc.root(), main).unwrap();
        doc.append_child(main, section).unwrap();
        doc.observe(main, ObserveOptions::structural());

        let p = doc.create_element("p", &[]);
        doc.append_child(section, p).unwrap();
        doc.detach(p).unwrap();

        let records = doc.take_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, section);
        assert!(matches!(
            &records[1].kind,
            MutationKind::ChildList { removed, .. } if removed == &vec![p]
        ));
    }
}
