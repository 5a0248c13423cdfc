//! Wire representation of change packs.
//!
//! [`types`] mirrors the JSON shapes exchanged between actors and the
//! coordinator; [`converter`] maps them to and from the document model.

pub mod converter;
pub mod types;

pub use converter::{
    decode_json, encode_json, from_change, from_change_pack, from_checkpoint, from_document_key,
    from_element, from_operation, from_ticket, to_change, to_change_pack, to_checkpoint,
    to_document_key, to_element, to_operation, to_ticket, ConvertError,
};
