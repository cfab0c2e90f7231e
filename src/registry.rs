//! Definitions registry: canonical record name → built schema node.
//!
//! A name is reserved before its record's members are walked, so a record
//! that reaches itself (directly or through a cycle) gets a `$ref` to the
//! reserved slot instead of recursing forever. Each name is filled once.
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::SchemaNode;

#[derive(Clone, Debug)]
enum Slot {
    Reserved { referenced: bool },
    Built(SchemaNode),
}

/// Owned by exactly one reflection call; never shared between calls.
#[derive(Debug, Default)]
pub struct Registry {
    slots: IndexMap<String, Slot>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn contains(&self, name: &str) -> bool { self.slots.contains_key(name) }

    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    /// Built definition, if any. Reserved slots have nothing to show yet.
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        match self.slots.get(name)? {
            Slot::Built(node) => Some(node),
            Slot::Reserved { .. } => None,
        }
    }

    /// `$ref` to `name` when it is known (built or still being built).
    pub fn reference(&mut self, name: &str) -> Option<SchemaNode> {
        let slot = self.slots.get_mut(name)?;
        if let Slot::Reserved { referenced } = slot {
            *referenced = true;
        }
        Some(SchemaNode::reference(name))
    }

    /// Claim `name` for a record about to be walked. False if already known.
    pub fn reserve(&mut self, name: &str) -> bool {
        if self.contains(name) { return false; }
        self.slots.insert(name.to_string(), Slot::Reserved { referenced: false });
        true
    }

    /// Store the finished node and hand back a `$ref` to it.
    pub fn fill(&mut self, name: &str, node: SchemaNode) -> Result<SchemaNode> {
        match self.slots.get_mut(name) {
            Some(Slot::Built(_)) => return Err(Error::DuplicateDefinition(name.to_string())),
            Some(slot) => *slot = Slot::Built(node),
            None => { self.slots.insert(name.to_string(), Slot::Built(node)); }
        }
        debug!(definition = name, "registered definition");
        Ok(SchemaNode::reference(name))
    }

    /// Settle the reservation of an inline (root) record: keep a copy if
    /// something pointed at it, otherwise forget the name.
    pub fn release(&mut self, name: &str, node: &SchemaNode) -> Result<()> {
        match self.slots.get(name) {
            Some(Slot::Reserved { referenced: true }) => self.fill(name, node.clone()).map(|_| ()),
            Some(Slot::Reserved { referenced: false }) => {
                self.slots.shift_remove(name);
                Ok(())
            }
            Some(Slot::Built(_)) | None => Ok(()),
        }
    }

    /// Finished definitions in first-seen order.
    pub fn into_definitions(self) -> Result<IndexMap<String, SchemaNode>> {
        self.slots.into_iter()
            .map(|(name, slot)| match slot {
                Slot::Built(node) => Ok((name, node)),
                Slot::Reserved { .. } => Err(Error::UnresolvedDefinition(name)),
            })
            .collect()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaKind;

    #[test]
    fn reserve_then_fill_yields_reference() {
        let mut reg = Registry::new();
        assert!(reg.reserve("A"));
        assert!(!reg.reserve("A"));
        assert_eq!(reg.get("A"), None);
        let r = reg.fill("A", SchemaNode::object()).unwrap();
        assert_eq!(r.ref_name(), Some("A"));
        assert_eq!(reg.get("A"), Some(&SchemaNode::object()));
    }

    #[test]
    fn names_are_write_once() {
        let mut reg = Registry::new();
        reg.fill("A", SchemaNode::object()).unwrap();
        assert_eq!(
            reg.fill("A", SchemaNode::of_kind(SchemaKind::String)),
            Err(Error::DuplicateDefinition("A".into()))
        );
    }

    #[test]
    fn reference_to_unknown_name_is_none() {
        let mut reg = Registry::new();
        assert_eq!(reg.reference("Missing"), None);
    }

    #[test]
    fn release_keeps_only_referenced_roots() {
        let mut reg = Registry::new();
        reg.reserve("Quiet");
        reg.release("Quiet", &SchemaNode::object()).unwrap();
        assert!(!reg.contains("Quiet"));

        reg.reserve("Loop");
        assert!(reg.reference("Loop").is_some());
        reg.release("Loop", &SchemaNode::object()).unwrap();
        assert_eq!(reg.get("Loop"), Some(&SchemaNode::object()));
    }

    #[test]
    fn unfinished_reservations_are_errors() {
        let mut reg = Registry::new();
        reg.reserve("Half");
        assert_eq!(reg.into_definitions(), Err(Error::UnresolvedDefinition("Half".into())));
    }

    #[test]
    fn definitions_keep_first_seen_order() {
        let mut reg = Registry::new();
        reg.reserve("Outer");
        reg.fill("Inner", SchemaNode::object()).unwrap();
        reg.fill("Outer", SchemaNode::object()).unwrap();
        let names: Vec<_> = reg.into_definitions().unwrap().into_keys().collect();
        assert_eq!(names, vec!["Outer", "Inner"]);
    }
}
