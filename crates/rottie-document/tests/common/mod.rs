#![allow(dead_code)]

use rottie_document::time::ACTOR_ID_LEN;
use rottie_document::{ActorId, Change, ChangePack, Checkpoint, Document, DocumentKey, Ticket};

pub fn actor(n: u8) -> ActorId {
    let mut bytes = [0u8; ACTOR_ID_LEN];
    bytes[ACTOR_ID_LEN - 1] = n;
    ActorId::from_bytes(bytes)
}

pub fn ticket(lamport: u64, delimiter: u32, n: u8) -> Ticket {
    Ticket::new(lamport, delimiter, actor(n))
}

pub fn key() -> DocumentKey {
    DocumentKey::new("tests", "doc").unwrap()
}

pub fn replica(n: u8) -> Document {
    Document::with_actor(key(), actor(n))
}

/// Hand `changes` to `to` as if a coordinator relayed them, with the
/// server watermark moved to `server_seq`.
pub fn deliver(to: &mut Document, server_seq: u64, changes: &[Change]) {
    let checkpoint = Checkpoint::new(server_seq, to.checkpoint().client_seq());
    let pack = ChangePack::new(to.key().clone(), checkpoint, changes.to_vec());
    to.apply_change_pack(&pack).unwrap();
}
