//! Serde shapes of the push/pull wire format.
//!
//! Field names are camelCase. Sequence numbers and lamports are signed
//! 64-bit on the wire; the converter rejects negative values. Unknown fields
//! are ignored so newer peers can add fields without breaking older ones.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentKey {
    pub collection: String,
    pub document: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default)]
    pub server_seq: i64,
    #[serde(default)]
    pub client_seq: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTicket {
    pub lamport: i64,
    #[serde(default)]
    pub delimiter: u32,
    pub actor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeId {
    pub client_seq: i64,
    pub lamport: i64,
    pub actor_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Object,
    Array,
    Null,
    Boolean,
    Integer,
    Long,
    Double,
    String,
    Bytes,
}

/// An element as carried by `set` and `add`. Containers travel empty;
/// primitives carry their bytes, base64-encoded, in `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub created_at: TimeTicket,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOperation {
    pub parent_created_at: TimeTicket,
    pub key: String,
    pub value: JsonElement,
    pub executed_at: TimeTicket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOperation {
    pub parent_created_at: TimeTicket,
    pub prev_created_at: TimeTicket,
    pub value: JsonElement,
    pub executed_at: TimeTicket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOperation {
    pub parent_created_at: TimeTicket,
    pub created_at: TimeTicket,
    pub executed_at: TimeTicket,
}

/// `{"set": {..}}`, `{"add": {..}}` or `{"remove": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Set(SetOperation),
    Add(AddOperation),
    Remove(RemoveOperation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub id: ChangeId,
    /// Empty when the change carries no message.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePack {
    pub document_key: DocumentKey,
    #[serde(default)]
    pub checkpoint: Checkpoint,
    #[serde(default)]
    pub changes: Vec<Change>,
}
