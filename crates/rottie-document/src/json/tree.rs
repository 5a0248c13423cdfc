//! The element tree: an arena of elements addressed by creation ticket.
//!
//! # Overview
//!
//! An [`ElementTree`] owns every element ever created in a document, live or
//! tombstoned, keyed by its `created_at` ticket. It also records the parent
//! of each element and the `executed_at` ticket of every operation applied
//! so far, which is what makes replays detectable.
//!
//! Mutation goes through [`ElementTree::apply`] and
//! [`ElementTree::apply_change`]. Both validate first and mutate second, so a
//! rejected operation or change leaves the tree exactly as it was.

use std::collections::{HashMap, HashSet};
use std::fmt;

use log::trace;
use serde_json::{Map, Value};

use super::{Array, Element, ElementKind, Object};
use crate::change::Change;
use crate::error::StructuralError;
use crate::operation::Operation;
use crate::time::Ticket;

/// Outcome of applying an operation or a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The tree changed.
    Changed,
    /// Everything had been applied before; nothing changed.
    Duplicate,
}

/// Arena of CRDT elements rooted at an object created at [`Ticket::INITIAL`].
///
/// Equality is structural: two trees are equal when they hold the same
/// elements with the same tombstones, the same membership and order, and
/// have applied the same operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTree {
    root: Ticket,
    elements: HashMap<Ticket, Element>,
    parents: HashMap<Ticket, Ticket>,
    applied: HashSet<Ticket>,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// Create a tree holding only an empty root object.
    pub fn new() -> Self {
        let root = Ticket::INITIAL;
        let mut elements = HashMap::new();
        elements.insert(root, Element::Object(Object::new(root)));
        Self {
            root,
            elements,
            parents: HashMap::new(),
            applied: HashSet::new(),
        }
    }

    pub fn root(&self) -> Ticket {
        self.root
    }

    pub fn get(&self, id: &Ticket) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn contains(&self, id: &Ticket) -> bool {
        self.elements.contains_key(id)
    }

    pub fn parent_of(&self, id: &Ticket) -> Option<Ticket> {
        self.parents.get(id).copied()
    }

    /// Number of elements, tombstones and root included.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_applied(&self, executed_at: &Ticket) -> bool {
        self.applied.contains(executed_at)
    }

    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    // ── Enumeration ──────────────────────────────────────────────────────

    fn object(&self, id: Ticket) -> Option<&Object> {
        self.elements.get(&id).and_then(Element::as_object)
    }

    fn array(&self, id: Ticket) -> Option<&Array> {
        self.elements.get(&id).and_then(Element::as_array)
    }

    /// Live value stored under `key` in object `object`.
    pub fn object_get(&self, object: Ticket, key: &str) -> Option<&Element> {
        let winner = self.object(object)?.winner(key)?;
        self.elements.get(&winner).filter(|e| !e.is_removed())
    }

    /// Live members of an object, sorted by key. Empty if `object` is not an
    /// object.
    pub fn object_members(&self, object: Ticket) -> Vec<(&str, &Element)> {
        let Some(obj) = self.object(object) else {
            return Vec::new();
        };
        obj.keys()
            .filter_map(|key| self.object_get(object, key).map(|e| (key, e)))
            .collect()
    }

    /// Every element ever written under `key`, oldest first, tombstones
    /// included.
    pub fn key_history(&self, object: Ticket, key: &str) -> Vec<&Element> {
        match self.object(object) {
            Some(obj) => obj.entries(key).filter_map(|t| self.elements.get(&t)).collect(),
            None => Vec::new(),
        }
    }

    /// Live elements of an array in RGA order. Empty if `array` is not an
    /// array.
    pub fn array_elements(&self, array: Ticket) -> Vec<&Element> {
        match self.array(array) {
            Some(arr) => arr
                .rga()
                .iter()
                .filter_map(|t| self.elements.get(&t))
                .filter(|e| !e.is_removed())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Tombstoned children of a container, in canonical order.
    pub fn tombstones_of(&self, container: Ticket) -> Vec<&Element> {
        let children: Vec<Ticket> = match self.elements.get(&container) {
            Some(Element::Object(obj)) => obj.all_entries().map(|(_, t)| t).collect(),
            Some(Element::Array(arr)) => arr.rga().iter().collect(),
            _ => Vec::new(),
        };
        children
            .iter()
            .filter_map(|t| self.elements.get(t))
            .filter(|e| e.is_removed())
            .collect()
    }

    /// JSON view of the live document.
    pub fn to_json(&self) -> Value {
        self.element_json(self.root)
    }

    fn element_json(&self, id: Ticket) -> Value {
        match self.elements.get(&id) {
            Some(Element::Object(_)) => {
                let mut map = Map::new();
                for (key, element) in self.object_members(id) {
                    map.insert(key.to_string(), self.element_json(element.created_at()));
                }
                Value::Object(map)
            }
            Some(Element::Array(_)) => Value::Array(
                self.array_elements(id)
                    .into_iter()
                    .map(|e| self.element_json(e.created_at()))
                    .collect(),
            ),
            Some(Element::Primitive(p)) => p.value().to_json(),
            None => Value::Null,
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────────

    /// Apply a single operation.
    pub fn apply(&mut self, op: &Operation) -> Result<Applied, StructuralError> {
        if !Pending::new(self).check(op)? {
            return Ok(Applied::Duplicate);
        }
        self.execute(op);
        Ok(Applied::Changed)
    }

    /// Check an ordered batch of operations without mutating anything.
    ///
    /// Later operations may refer to elements created earlier in the batch.
    pub fn validate(&self, ops: &[Operation]) -> Result<(), StructuralError> {
        let mut pending = Pending::new(self);
        for op in ops {
            pending.check(op)?;
        }
        Ok(())
    }

    /// Apply every operation of `change` in recorded order, or none of them.
    ///
    /// Operations applied before are skipped. If all of them were, the
    /// change is a duplicate and the tree is untouched.
    pub fn apply_change(&mut self, change: &Change) -> Result<Applied, StructuralError> {
        let mut pending = Pending::new(self);
        let mut fresh = Vec::with_capacity(change.operations().len());
        for op in change.operations() {
            if pending.check(op)? {
                fresh.push(op);
            }
        }
        if fresh.is_empty() {
            trace!("change {} already applied", change.id());
            return Ok(Applied::Duplicate);
        }
        for op in fresh {
            self.execute(op);
        }
        Ok(Applied::Changed)
    }

    /// Mutate the tree. `op` must have passed validation.
    fn execute(&mut self, op: &Operation) {
        match op {
            Operation::Set {
                parent_created_at,
                key,
                value,
                ..
            } => {
                let id = value.created_at();
                self.elements.insert(id, value.shallow());
                self.parents.insert(id, *parent_created_at);
                let tombstones = match self.elements.get_mut(parent_created_at) {
                    Some(Element::Object(obj)) => obj.put(key, id),
                    _ => Vec::new(),
                };
                for (loser, at) in tombstones {
                    if let Some(element) = self.elements.get_mut(&loser) {
                        element.remove(at);
                    }
                }
            }
            Operation::Add {
                parent_created_at,
                prev_created_at,
                value,
                ..
            } => {
                let id = value.created_at();
                self.elements.insert(id, value.shallow());
                self.parents.insert(id, *parent_created_at);
                if let Some(Element::Array(arr)) = self.elements.get_mut(parent_created_at) {
                    arr.insert_after(*prev_created_at, id);
                }
            }
            Operation::Remove {
                created_at,
                executed_at,
                ..
            } => {
                if let Some(element) = self.elements.get_mut(created_at) {
                    element.remove(*executed_at);
                }
            }
        }
        self.applied.insert(op.executed_at());
        trace!("applied {}", op);
    }
}

impl fmt::Display for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// ── Validation overlay ────────────────────────────────────────────────────

/// The tree as it would look after the operations checked so far.
struct Pending<'t> {
    tree: &'t ElementTree,
    /// created_at → (kind, parent) for elements created by the batch.
    created: HashMap<Ticket, (ElementKind, Ticket)>,
    executed: HashSet<Ticket>,
}

impl<'t> Pending<'t> {
    fn new(tree: &'t ElementTree) -> Self {
        Self {
            tree,
            created: HashMap::new(),
            executed: HashSet::new(),
        }
    }

    fn kind_of(&self, id: &Ticket) -> Option<ElementKind> {
        match self.created.get(id) {
            Some((kind, _)) => Some(*kind),
            None => self.tree.get(id).map(Element::kind),
        }
    }

    fn parent_of(&self, id: &Ticket) -> Option<Ticket> {
        match self.created.get(id) {
            Some((_, parent)) => Some(*parent),
            None => self.tree.parent_of(id),
        }
    }

    /// Returns `Ok(false)` for an operation that was already applied.
    fn check(&mut self, op: &Operation) -> Result<bool, StructuralError> {
        let executed_at = op.executed_at();
        if self.tree.is_applied(&executed_at) || self.executed.contains(&executed_at) {
            return Ok(false);
        }

        let parent = op.parent_created_at();
        let found = self
            .kind_of(&parent)
            .ok_or(StructuralError::ParentNotFound {
                parent,
                executed_at,
            })?;
        let mismatch = |expected| StructuralError::ParentTypeMismatch {
            parent,
            executed_at,
            expected,
            found,
        };

        match op {
            Operation::Set { value, .. } => {
                if found != ElementKind::Object {
                    return Err(mismatch(ElementKind::Object));
                }
                self.create(value, parent, executed_at)?;
            }
            Operation::Add {
                prev_created_at,
                value,
                ..
            } => {
                if found != ElementKind::Array {
                    return Err(mismatch(ElementKind::Array));
                }
                let prev = *prev_created_at;
                if prev != Ticket::INITIAL && self.parent_of(&prev) != Some(parent) {
                    return Err(StructuralError::PrevNotFound {
                        parent,
                        prev,
                        executed_at,
                    });
                }
                self.create(value, parent, executed_at)?;
            }
            Operation::Remove { created_at, .. } => {
                if self.parent_of(created_at) != Some(parent) {
                    return Err(StructuralError::ChildNotFound {
                        parent,
                        created_at: *created_at,
                        executed_at,
                    });
                }
            }
        }

        self.executed.insert(executed_at);
        Ok(true)
    }

    fn create(
        &mut self,
        value: &Element,
        parent: Ticket,
        executed_at: Ticket,
    ) -> Result<(), StructuralError> {
        let created_at = value.created_at();
        if self.kind_of(&created_at).is_some() {
            return Err(StructuralError::DuplicateElement {
                created_at,
                executed_at,
            });
        }
        self.created.insert(created_at, (value.kind(), parent));
        Ok(())
    }
}
