//! Conversion between wire shapes and document-model types.

use base64::Engine;
use rottie_document::json::{Array, Object, Primitive, PrimitiveError};
use rottie_document::time::ActorIdError;
use rottie_document::{
    ActorId, Change, ChangeId, ChangePack, Checkpoint, DocumentKey, Element, KeyError, Operation,
    PrimitiveValue, Ticket, ValueType,
};
use thiserror::Error;

use crate::types as wire;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("{field} does not fit the wire range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
    #[error("invalid actor id: {0}")]
    ActorId(#[from] ActorIdError),
    #[error("invalid document key: {0}")]
    Key(#[from] KeyError),
    #[error("{0:?} element must not carry a value")]
    UnexpectedValue(wire::ElementType),
    #[error("{0:?} element is missing its value")]
    MissingValue(wire::ElementType),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid primitive payload: {0}")]
    Primitive(#[from] PrimitiveError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, ConvertError>;

fn to_wire_int(field: &'static str, value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| ConvertError::OutOfRange { field, value })
}

fn from_wire_int(field: &'static str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| ConvertError::Negative { field, value })
}

// ── Leaves ────────────────────────────────────────────────────────────────

pub fn to_ticket(ticket: &Ticket) -> Result<wire::TimeTicket> {
    Ok(wire::TimeTicket {
        lamport: to_wire_int("lamport", ticket.lamport())?,
        delimiter: ticket.delimiter(),
        actor_id: ticket.actor_id().to_string(),
    })
}

pub fn from_ticket(ticket: &wire::TimeTicket) -> Result<Ticket> {
    Ok(Ticket::new(
        from_wire_int("lamport", ticket.lamport)?,
        ticket.delimiter,
        ticket.actor_id.parse::<ActorId>()?,
    ))
}

pub fn to_checkpoint(checkpoint: &Checkpoint) -> Result<wire::Checkpoint> {
    Ok(wire::Checkpoint {
        server_seq: to_wire_int("serverSeq", checkpoint.server_seq())?,
        client_seq: to_wire_int("clientSeq", checkpoint.client_seq())?,
    })
}

pub fn from_checkpoint(checkpoint: &wire::Checkpoint) -> Result<Checkpoint> {
    Ok(Checkpoint::new(
        from_wire_int("serverSeq", checkpoint.server_seq)?,
        from_wire_int("clientSeq", checkpoint.client_seq)?,
    ))
}

pub fn to_document_key(key: &DocumentKey) -> wire::DocumentKey {
    wire::DocumentKey {
        collection: key.collection().to_string(),
        document: key.document().to_string(),
    }
}

pub fn from_document_key(key: &wire::DocumentKey) -> Result<DocumentKey> {
    Ok(DocumentKey::new(key.collection.as_str(), key.document.as_str())?)
}

fn to_change_id(id: &ChangeId) -> Result<wire::ChangeId> {
    Ok(wire::ChangeId {
        client_seq: to_wire_int("clientSeq", id.client_seq())?,
        lamport: to_wire_int("lamport", id.lamport())?,
        actor_id: id.actor_id().to_string(),
    })
}

fn from_change_id(id: &wire::ChangeId) -> Result<ChangeId> {
    Ok(ChangeId::new(
        from_wire_int("clientSeq", id.client_seq)?,
        from_wire_int("lamport", id.lamport)?,
        id.actor_id.parse::<ActorId>()?,
    ))
}

// ── Elements ──────────────────────────────────────────────────────────────

fn wire_type(ty: ValueType) -> wire::ElementType {
    match ty {
        ValueType::Null => wire::ElementType::Null,
        ValueType::Boolean => wire::ElementType::Boolean,
        ValueType::Integer => wire::ElementType::Integer,
        ValueType::Long => wire::ElementType::Long,
        ValueType::Double => wire::ElementType::Double,
        ValueType::String => wire::ElementType::String,
        ValueType::Bytes => wire::ElementType::Bytes,
    }
}

pub fn to_element(element: &Element) -> Result<wire::JsonElement> {
    let created_at = to_ticket(&element.created_at())?;
    let (element_type, value) = match element {
        Element::Object(_) => (wire::ElementType::Object, None),
        Element::Array(_) => (wire::ElementType::Array, None),
        Element::Primitive(p) => {
            let value = p.value();
            let encoded = base64::engine::general_purpose::STANDARD.encode(value.to_bytes());
            (wire_type(value.value_type()), Some(encoded))
        }
    };
    Ok(wire::JsonElement {
        element_type,
        created_at,
        value,
    })
}

/// Decode a wire element. `NULL` may omit its value.
pub fn from_element(element: &wire::JsonElement) -> Result<Element> {
    let created_at = from_ticket(&element.created_at)?;
    let ty = match element.element_type {
        wire::ElementType::Object | wire::ElementType::Array => {
            if element.value.is_some() {
                return Err(ConvertError::UnexpectedValue(element.element_type));
            }
            return Ok(match element.element_type {
                wire::ElementType::Object => Element::Object(Object::new(created_at)),
                _ => Element::Array(Array::new(created_at)),
            });
        }
        wire::ElementType::Null => ValueType::Null,
        wire::ElementType::Boolean => ValueType::Boolean,
        wire::ElementType::Integer => ValueType::Integer,
        wire::ElementType::Long => ValueType::Long,
        wire::ElementType::Double => ValueType::Double,
        wire::ElementType::String => ValueType::String,
        wire::ElementType::Bytes => ValueType::Bytes,
    };
    let bytes = match (&element.value, ty) {
        (Some(encoded), _) => base64::engine::general_purpose::STANDARD.decode(encoded)?,
        (None, ValueType::Null) => Vec::new(),
        (None, _) => return Err(ConvertError::MissingValue(element.element_type)),
    };
    let value = PrimitiveValue::from_bytes(ty, &bytes)?;
    Ok(Element::Primitive(Primitive::new(created_at, value)))
}

// ── Operations and changes ────────────────────────────────────────────────

pub fn to_operation(op: &Operation) -> Result<wire::Operation> {
    Ok(match op {
        Operation::Set {
            parent_created_at,
            key,
            value,
            executed_at,
        } => wire::Operation::Set(wire::SetOperation {
            parent_created_at: to_ticket(parent_created_at)?,
            key: key.clone(),
            value: to_element(value)?,
            executed_at: to_ticket(executed_at)?,
        }),
        Operation::Add {
            parent_created_at,
            prev_created_at,
            value,
            executed_at,
        } => wire::Operation::Add(wire::AddOperation {
            parent_created_at: to_ticket(parent_created_at)?,
            prev_created_at: to_ticket(prev_created_at)?,
            value: to_element(value)?,
            executed_at: to_ticket(executed_at)?,
        }),
        Operation::Remove {
            parent_created_at,
            created_at,
            executed_at,
        } => wire::Operation::Remove(wire::RemoveOperation {
            parent_created_at: to_ticket(parent_created_at)?,
            created_at: to_ticket(created_at)?,
            executed_at: to_ticket(executed_at)?,
        }),
    })
}

pub fn from_operation(op: &wire::Operation) -> Result<Operation> {
    Ok(match op {
        wire::Operation::Set(set) => Operation::Set {
            parent_created_at: from_ticket(&set.parent_created_at)?,
            key: set.key.clone(),
            value: from_element(&set.value)?,
            executed_at: from_ticket(&set.executed_at)?,
        },
        wire::Operation::Add(add) => Operation::Add {
            parent_created_at: from_ticket(&add.parent_created_at)?,
            prev_created_at: from_ticket(&add.prev_created_at)?,
            value: from_element(&add.value)?,
            executed_at: from_ticket(&add.executed_at)?,
        },
        wire::Operation::Remove(remove) => Operation::Remove {
            parent_created_at: from_ticket(&remove.parent_created_at)?,
            created_at: from_ticket(&remove.created_at)?,
            executed_at: from_ticket(&remove.executed_at)?,
        },
    })
}

pub fn to_change(change: &Change) -> Result<wire::Change> {
    Ok(wire::Change {
        id: to_change_id(&change.id())?,
        message: change.message().unwrap_or_default().to_string(),
        operations: change
            .operations()
            .iter()
            .map(to_operation)
            .collect::<Result<_>>()?,
    })
}

pub fn from_change(change: &wire::Change) -> Result<Change> {
    Ok(Change::new(
        from_change_id(&change.id)?,
        change
            .operations
            .iter()
            .map(from_operation)
            .collect::<Result<_>>()?,
        Some(change.message.clone()).filter(|message| !message.is_empty()),
    ))
}

pub fn to_change_pack(pack: &ChangePack) -> Result<wire::ChangePack> {
    Ok(wire::ChangePack {
        document_key: to_document_key(pack.document_key()),
        checkpoint: to_checkpoint(&pack.checkpoint())?,
        changes: pack.changes().iter().map(to_change).collect::<Result<_>>()?,
    })
}

pub fn from_change_pack(pack: &wire::ChangePack) -> Result<ChangePack> {
    Ok(ChangePack::new(
        from_document_key(&pack.document_key)?,
        from_checkpoint(&pack.checkpoint)?,
        pack.changes.iter().map(from_change).collect::<Result<_>>()?,
    ))
}

// ── JSON ──────────────────────────────────────────────────────────────────

/// Render a change pack as wire JSON.
pub fn encode_json(pack: &ChangePack) -> Result<String> {
    Ok(serde_json::to_string(&to_change_pack(pack)?)?)
}

/// Parse wire JSON into a change pack.
pub fn decode_json(json: &str) -> Result<ChangePack> {
    let pack: wire::ChangePack = serde_json::from_str(json)?;
    from_change_pack(&pack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_round_trip() {
        let t = Ticket::new(7, 2, ActorId::MAX);
        let w = to_ticket(&t).unwrap();
        assert_eq!(w.actor_id, "ffffffffffffffffffffffff");
        assert_eq!(from_ticket(&w).unwrap(), t);
    }

    #[test]
    fn lamport_beyond_i64_is_rejected() {
        let t = Ticket::new(u64::MAX, 0, ActorId::MAX);
        assert!(matches!(
            to_ticket(&t),
            Err(ConvertError::OutOfRange { field: "lamport", .. })
        ));
    }

    #[test]
    fn primitive_element_carries_base64() {
        let at = Ticket::new(1, 1, ActorId::MAX);
        let element = Element::Primitive(Primitive::new(at, 258i32));
        let w = to_element(&element).unwrap();
        assert_eq!(w.element_type, wire::ElementType::Integer);
        assert_eq!(w.value.as_deref(), Some("AgEAAA=="));
        assert_eq!(from_element(&w).unwrap(), element);
    }

    #[test]
    fn container_with_value_is_rejected() {
        let w = wire::JsonElement {
            element_type: wire::ElementType::Object,
            created_at: to_ticket(&Ticket::new(1, 1, ActorId::MAX)).unwrap(),
            value: Some("AA==".into()),
        };
        assert!(matches!(
            from_element(&w),
            Err(ConvertError::UnexpectedValue(wire::ElementType::Object))
        ));
    }

    #[test]
    fn null_may_omit_value_but_string_may_not() {
        let created_at = to_ticket(&Ticket::new(1, 1, ActorId::MAX)).unwrap();
        let null = wire::JsonElement {
            element_type: wire::ElementType::Null,
            created_at: created_at.clone(),
            value: None,
        };
        assert_eq!(
            from_element(&null).unwrap().as_primitive(),
            Some(&PrimitiveValue::Null)
        );
        let string = wire::JsonElement {
            element_type: wire::ElementType::String,
            created_at,
            value: None,
        };
        assert!(matches!(
            from_element(&string),
            Err(ConvertError::MissingValue(wire::ElementType::String))
        ));
    }
}
