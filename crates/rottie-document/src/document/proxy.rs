//! Typed handles used inside [`Document::update`](super::Document::update).
//!
//! A proxy names one container of the session tree and turns method calls
//! into operations on the surrounding [`ChangeContext`]. Child proxies
//! reborrow the context, so only one handle is usable at a time.

use crate::change::ChangeContext;
use crate::error::{DocumentError, Result};
use crate::json::{Array, Element, ElementKind, Object, Primitive, PrimitiveValue};
use crate::operation::Operation;
use crate::time::Ticket;

fn expect_kind(element: &Element, expected: ElementKind) -> Result<()> {
    if element.kind() == expected {
        Ok(())
    } else {
        Err(DocumentError::UnexpectedKind {
            created_at: element.created_at(),
            expected,
            found: element.kind(),
        })
    }
}

// ── ObjectProxy ───────────────────────────────────────────────────────────

pub struct ObjectProxy<'c, 'a> {
    ctx: &'c mut ChangeContext<'a>,
    target: Ticket,
}

impl<'c, 'a> ObjectProxy<'c, 'a> {
    pub(crate) fn new(ctx: &'c mut ChangeContext<'a>, target: Ticket) -> Self {
        Self { ctx, target }
    }

    /// Ticket of the object this proxy edits.
    pub fn id(&self) -> Ticket {
        self.target
    }

    fn put(&mut self, key: &str, value: Element, at: Ticket) -> Result<()> {
        self.ctx.push(Operation::Set {
            parent_created_at: self.target,
            key: key.to_string(),
            value,
            executed_at: at,
        })?;
        Ok(())
    }

    /// Write a primitive under `key`. Returns the new element's ticket.
    pub fn set(&mut self, key: &str, value: impl Into<PrimitiveValue>) -> Result<Ticket> {
        let at = self.ctx.issue_ticket()?;
        self.put(key, Element::Primitive(Primitive::new(at, value)), at)?;
        Ok(at)
    }

    /// Write an empty object under `key` and return a proxy for it.
    pub fn set_new_object(&mut self, key: &str) -> Result<ObjectProxy<'_, 'a>> {
        let at = self.ctx.issue_ticket()?;
        self.put(key, Element::Object(Object::new(at)), at)?;
        Ok(ObjectProxy::new(&mut *self.ctx, at))
    }

    /// Write an empty array under `key` and return a proxy for it.
    pub fn set_new_array(&mut self, key: &str) -> Result<ArrayProxy<'_, 'a>> {
        let at = self.ctx.issue_ticket()?;
        self.put(key, Element::Array(Array::new(at)), at)?;
        Ok(ArrayProxy::new(&mut *self.ctx, at))
    }

    /// Tombstone the live value under `key`.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        let created_at = self
            .ctx
            .tree()
            .object_get(self.target, key)
            .map(Element::created_at)
            .ok_or_else(|| DocumentError::KeyNotFound(key.to_string()))?;
        let at = self.ctx.issue_ticket()?;
        self.ctx.push(Operation::Remove {
            parent_created_at: self.target,
            created_at,
            executed_at: at,
        })?;
        Ok(())
    }

    fn child(&self, key: &str, expected: ElementKind) -> Result<Ticket> {
        let element = self
            .ctx
            .tree()
            .object_get(self.target, key)
            .ok_or_else(|| DocumentError::KeyNotFound(key.to_string()))?;
        expect_kind(element, expected)?;
        Ok(element.created_at())
    }

    /// Proxy for the live object under `key`.
    pub fn object(&mut self, key: &str) -> Result<ObjectProxy<'_, 'a>> {
        let id = self.child(key, ElementKind::Object)?;
        Ok(ObjectProxy::new(&mut *self.ctx, id))
    }

    /// Proxy for the live array under `key`.
    pub fn array(&mut self, key: &str) -> Result<ArrayProxy<'_, 'a>> {
        let id = self.child(key, ElementKind::Array)?;
        Ok(ArrayProxy::new(&mut *self.ctx, id))
    }

    /// Live primitive under `key`.
    pub fn get(&self, key: &str) -> Option<&PrimitiveValue> {
        self.ctx
            .tree()
            .object_get(self.target, key)
            .and_then(Element::as_primitive)
    }

    pub fn has(&self, key: &str) -> bool {
        self.ctx.tree().object_get(self.target, key).is_some()
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.ctx
            .tree()
            .object_members(self.target)
            .into_iter()
            .map(|(k, _)| k.to_string())
            .collect()
    }
}

// ── ArrayProxy ────────────────────────────────────────────────────────────

pub struct ArrayProxy<'c, 'a> {
    ctx: &'c mut ChangeContext<'a>,
    target: Ticket,
}

impl<'c, 'a> ArrayProxy<'c, 'a> {
    pub(crate) fn new(ctx: &'c mut ChangeContext<'a>, target: Ticket) -> Self {
        Self { ctx, target }
    }

    pub fn id(&self) -> Ticket {
        self.target
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.ctx.tree().array_elements(self.target).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ticket of the live element at `index`.
    pub fn ticket_at(&self, index: usize) -> Result<Ticket> {
        let live = self.ctx.tree().array_elements(self.target);
        live.get(index)
            .map(|e| e.created_at())
            .ok_or(DocumentError::IndexOutOfBounds {
                index,
                len: live.len(),
            })
    }

    /// Live primitive at `index`.
    pub fn get(&self, index: usize) -> Option<&PrimitiveValue> {
        self.ctx
            .tree()
            .array_elements(self.target)
            .get(index)
            .copied()
            .and_then(Element::as_primitive)
    }

    fn tail(&self) -> Ticket {
        self.ctx
            .tree()
            .get(&self.target)
            .and_then(Element::as_array)
            .map(|a| a.rga().last())
            .unwrap_or(Ticket::INITIAL)
    }

    fn add(&mut self, prev: Ticket, value: Element, at: Ticket) -> Result<()> {
        self.ctx.push(Operation::Add {
            parent_created_at: self.target,
            prev_created_at: prev,
            value,
            executed_at: at,
        })?;
        Ok(())
    }

    /// Append a primitive. Returns the new element's ticket.
    pub fn push(&mut self, value: impl Into<PrimitiveValue>) -> Result<Ticket> {
        let prev = self.tail();
        self.insert_after(prev, value)
    }

    /// Insert a primitive right after element `prev` ([`Ticket::INITIAL`]
    /// for the head).
    pub fn insert_after(&mut self, prev: Ticket, value: impl Into<PrimitiveValue>) -> Result<Ticket> {
        let at = self.ctx.issue_ticket()?;
        self.add(prev, Element::Primitive(Primitive::new(at, value)), at)?;
        Ok(at)
    }

    /// Append an empty object and return a proxy for it.
    pub fn push_new_object(&mut self) -> Result<ObjectProxy<'_, 'a>> {
        let prev = self.tail();
        let at = self.ctx.issue_ticket()?;
        self.add(prev, Element::Object(Object::new(at)), at)?;
        Ok(ObjectProxy::new(&mut *self.ctx, at))
    }

    /// Append an empty array and return a proxy for it.
    pub fn push_new_array(&mut self) -> Result<ArrayProxy<'_, 'a>> {
        let prev = self.tail();
        let at = self.ctx.issue_ticket()?;
        self.add(prev, Element::Array(Array::new(at)), at)?;
        Ok(ArrayProxy::new(&mut *self.ctx, at))
    }

    /// Tombstone the live element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let created_at = self.ticket_at(index)?;
        let at = self.ctx.issue_ticket()?;
        self.ctx.push(Operation::Remove {
            parent_created_at: self.target,
            created_at,
            executed_at: at,
        })?;
        Ok(())
    }

    /// Proxy for the live object at `index`.
    pub fn object_at(&mut self, index: usize) -> Result<ObjectProxy<'_, 'a>> {
        let id = self.child_at(index, ElementKind::Object)?;
        Ok(ObjectProxy::new(&mut *self.ctx, id))
    }

    /// Proxy for the live array at `index`.
    pub fn array_at(&mut self, index: usize) -> Result<ArrayProxy<'_, 'a>> {
        let id = self.child_at(index, ElementKind::Array)?;
        Ok(ArrayProxy::new(&mut *self.ctx, id))
    }

    fn child_at(&self, index: usize, expected: ElementKind) -> Result<Ticket> {
        let live = self.ctx.tree().array_elements(self.target);
        let element = live.get(index).ok_or(DocumentError::IndexOutOfBounds {
            index,
            len: live.len(),
        })?;
        expect_kind(element, expected)?;
        Ok(element.created_at())
    }
}
