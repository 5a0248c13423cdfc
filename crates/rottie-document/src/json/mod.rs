//! JSON CRDT elements and the element tree.
//!
//! # Element types
//!
//! | Rust type    | Semantics                                              |
//! |--------------|--------------------------------------------------------|
//! | `Object`     | key → entries, greatest ticket per key wins            |
//! | `Array`      | RGA sequence addressed by predecessor ticket           |
//! | `Primitive`  | immutable leaf value                                   |
//!
//! Elements never own each other. Containers hold child tickets; the
//! [`ElementTree`] arena resolves them. A tombstoned element keeps its slot
//! and its identity forever.

pub mod primitive;
pub mod rga;
pub mod tree;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::time::Ticket;

pub use primitive::{PrimitiveError, PrimitiveValue, ValueType};
pub use rga::Rga;
pub use tree::{Applied, ElementTree};

// ── ElementKind ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Object,
    Array,
    Primitive,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementKind::Object => "object",
            ElementKind::Array => "array",
            ElementKind::Primitive => "primitive",
        })
    }
}

// ── Object ────────────────────────────────────────────────────────────────

/// Last-writer-wins map.
///
/// Every ticket ever written under a key is kept, in ticket order. The last
/// one is the visible entry; the others are tombstones.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    members: BTreeMap<String, BTreeSet<Ticket>>,
}

impl Object {
    pub fn new(created_at: Ticket) -> Self {
        Self {
            created_at,
            removed_at: None,
            members: BTreeMap::new(),
        }
    }

    /// Ticket of the winning entry for `key`, tombstoned or not.
    pub fn winner(&self, key: &str) -> Option<Ticket> {
        self.members.get(key).and_then(|set| set.last().copied())
    }

    /// Every entry ever written under `key`, oldest first.
    pub fn entries(&self, key: &str) -> impl Iterator<Item = Ticket> + '_ {
        self.members.get(key).into_iter().flat_map(|set| set.iter().copied())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// All `(key, ticket)` pairs, sorted by key then ticket.
    pub fn all_entries(&self) -> impl Iterator<Item = (&str, Ticket)> {
        self.members
            .iter()
            .flat_map(|(k, set)| set.iter().map(move |t| (k.as_str(), *t)))
    }

    /// Record `id` under `key`.
    ///
    /// Returns the tombstones this insertion implies: every entry older than
    /// the key's winner is removed at the winner's ticket. Removal keeps the
    /// maximum ticket, so the outcome does not depend on arrival order.
    pub(crate) fn put(&mut self, key: &str, id: Ticket) -> Vec<(Ticket, Ticket)> {
        let set = self.members.entry(key.to_string()).or_default();
        set.insert(id);
        let Some(winner) = set.last().copied() else {
            return Vec::new();
        };
        if winner == id {
            set.iter().filter(|t| **t != id).map(|t| (*t, id)).collect()
        } else {
            vec![(id, winner)]
        }
    }

    /// Key under which `id` was written.
    pub fn key_of(&self, id: Ticket) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, set)| set.contains(&id))
            .map(|(k, _)| k.as_str())
    }
}

// ── Array ─────────────────────────────────────────────────────────────────

/// RGA array of element tickets.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    rga: Rga,
}

impl Array {
    pub fn new(created_at: Ticket) -> Self {
        Self {
            created_at,
            removed_at: None,
            rga: Rga::new(),
        }
    }

    pub fn rga(&self) -> &Rga {
        &self.rga
    }

    pub(crate) fn insert_after(&mut self, prev: Ticket, id: Ticket) -> usize {
        self.rga.insert_after(prev, id)
    }
}

// ── Primitive ─────────────────────────────────────────────────────────────

/// Immutable leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    created_at: Ticket,
    removed_at: Option<Ticket>,
    value: PrimitiveValue,
}

impl Primitive {
    pub fn new(created_at: Ticket, value: impl Into<PrimitiveValue>) -> Self {
        Self {
            created_at,
            removed_at: None,
            value: value.into(),
        }
    }

    pub fn value(&self) -> &PrimitiveValue {
        &self.value
    }
}

// ── Element ───────────────────────────────────────────────────────────────

/// Closed set of element variants.
///
/// A freshly constructed element is always detached and empty; containers
/// only gain members through the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Object(Object),
    Array(Array),
    Primitive(Primitive),
}

impl Element {
    pub fn created_at(&self) -> Ticket {
        match self {
            Element::Object(e) => e.created_at,
            Element::Array(e) => e.created_at,
            Element::Primitive(e) => e.created_at,
        }
    }

    pub fn removed_at(&self) -> Option<Ticket> {
        match self {
            Element::Object(e) => e.removed_at,
            Element::Array(e) => e.removed_at,
            Element::Primitive(e) => e.removed_at,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at().is_some()
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Object(_) => ElementKind::Object,
            Element::Array(_) => ElementKind::Array,
            Element::Primitive(_) => ElementKind::Primitive,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Element::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Element::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Element::Primitive(p) => Some(&p.value),
            _ => None,
        }
    }

    /// Tombstone this element at `at`. The greatest removal ticket wins.
    /// Returns `true` if the tombstone changed.
    pub(crate) fn remove(&mut self, at: Ticket) -> bool {
        let slot = match self {
            Element::Object(e) => &mut e.removed_at,
            Element::Array(e) => &mut e.removed_at,
            Element::Primitive(e) => &mut e.removed_at,
        };
        match *slot {
            Some(existing) if existing >= at => false,
            _ => {
                *slot = Some(at);
                true
            }
        }
    }

    /// A copy without members or tombstone, as carried by an operation.
    pub fn shallow(&self) -> Element {
        match self {
            Element::Object(o) => Element::Object(Object::new(o.created_at)),
            Element::Array(a) => Element::Array(Array::new(a.created_at)),
            Element::Primitive(p) => {
                Element::Primitive(Primitive::new(p.created_at, p.value.clone()))
            }
        }
    }
}
