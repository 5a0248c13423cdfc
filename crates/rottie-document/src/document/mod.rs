//! Client-side replica of one document.
//!
//! # Overview
//!
//! A [`Document`] owns an actor's logical clock, its copy of the element
//! tree, its checkpoint and the local changes the coordinator has not
//! acknowledged yet.
//!
//! ```text
//!  update(..)  ──► local change queued ──► create_change_pack()  (Pushing)
//!                                                   │
//!                                        coordinator push_pull
//!                                                   │
//!  apply_change_pack(response) ◄────────────────────┘          (Synced)
//! ```
//!
//! Edits run against a scratch copy of the tree. A failing edit closure
//! leaves the document untouched, and so does a response pack that cannot
//! be applied.

pub mod proxy;

use log::{debug, trace};
use serde_json::Value;

use crate::change::{Change, ChangeContext, ChangeId, ChangePack};
use crate::checkpoint::Checkpoint;
use crate::error::{DocumentError, Result};
use crate::json::{Applied, ElementTree};
use crate::key::DocumentKey;
use crate::time::{ActorId, LogicalClock};

pub use proxy::{ArrayProxy, ObjectProxy};

/// Where a document stands in the push/pull cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Local state not yet exchanged with the coordinator.
    Idle,
    /// A pack with local changes is in flight.
    Pushing,
    /// A pack without local changes, asking only for remote ones, is in
    /// flight.
    Pulling,
    /// The last response acknowledged every local change.
    Synced,
}

#[derive(Debug, Clone)]
pub struct Document {
    key: DocumentKey,
    clock: LogicalClock,
    checkpoint: Checkpoint,
    root: ElementTree,
    client_seq: u64,
    local_changes: Vec<Change>,
    state: SyncState,
}

impl Document {
    /// A fresh replica with a random actor id.
    pub fn new(key: DocumentKey) -> Self {
        Self::with_actor(key, ActorId::random())
    }

    pub fn with_actor(key: DocumentKey, actor_id: ActorId) -> Self {
        Self {
            key,
            clock: LogicalClock::new(actor_id),
            checkpoint: Checkpoint::INITIAL,
            root: ElementTree::new(),
            client_seq: 0,
            local_changes: Vec::new(),
            state: SyncState::Idle,
        }
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn actor_id(&self) -> ActorId {
        self.clock.actor_id()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn sync_state(&self) -> SyncState {
        self.state
    }

    pub fn root(&self) -> &ElementTree {
        &self.root
    }

    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }

    /// Current lamport value of this replica's clock.
    pub fn lamport(&self) -> u64 {
        self.clock.lamport()
    }

    /// Local changes not yet acknowledged by the coordinator.
    pub fn local_changes(&self) -> &[Change] {
        &self.local_changes
    }

    pub fn has_local_changes(&self) -> bool {
        !self.local_changes.is_empty()
    }

    /// Run an edit session against the root object.
    ///
    /// If `edit` records at least one operation and returns `Ok`, the
    /// operations become one local change and its id is returned. If `edit`
    /// fails, nothing is kept: not the edits, not the clock ticks.
    pub fn update<F>(&mut self, message: Option<&str>, edit: F) -> Result<Option<ChangeId>>
    where
        F: FnOnce(&mut ObjectProxy<'_, '_>) -> Result<()>,
    {
        let mut scratch = self.root.clone();
        let mut clock = self.clock.clone();
        let lamport = clock.tick()?;
        let id = ChangeId::new(self.client_seq + 1, lamport, clock.actor_id());

        let mut ctx = ChangeContext::new(id, &mut clock, &mut scratch);
        let root = ctx.tree().root();
        edit(&mut ObjectProxy::new(&mut ctx, root))?;
        let Some(change) = ctx.into_change(message.map(str::to_string)) else {
            return Ok(None);
        };

        trace!("{}: local change {} with {} ops", self.key, id, change.operations().len());
        self.clock = clock;
        self.root = scratch;
        self.client_seq = id.client_seq();
        self.local_changes.push(change);
        self.state = SyncState::Idle;
        Ok(Some(id))
    }

    /// Bundle pending local changes with the current checkpoint.
    pub fn create_change_pack(&mut self) -> ChangePack {
        self.state = if self.local_changes.is_empty() {
            SyncState::Pulling
        } else {
            SyncState::Pushing
        };
        ChangePack::new(self.key.clone(), self.checkpoint, self.local_changes.clone())
    }

    /// The coordinator did not answer. Pending changes stay queued and go out
    /// again with the next pack.
    pub fn abandon_push(&mut self) {
        self.state = SyncState::Idle;
    }

    /// Merge a coordinator response.
    ///
    /// Drops local changes the response acknowledges, applies the remote
    /// changes it carries, advances the clock past them and forwards the
    /// checkpoint. Either all of that happens or none of it.
    pub fn apply_change_pack(&mut self, pack: &ChangePack) -> Result<()> {
        if pack.document_key() != &self.key {
            return Err(DocumentError::KeyMismatch {
                expected: self.key.combined(),
                found: pack.document_key().combined(),
            });
        }
        let theirs = pack.checkpoint();
        let checkpoint = self
            .checkpoint
            .advance(Some(theirs.server_seq()), Some(theirs.client_seq()))?;

        let mut clock = self.clock.clone();
        for change in pack.changes() {
            clock.advance(change.id().lamport())?;
        }
        let mut scratch = self.root.clone();
        for change in pack.changes() {
            if scratch.apply_change(change)? == Applied::Duplicate {
                trace!("{}: remote change {} already applied", self.key, change.id());
            }
        }

        self.clock = clock;
        self.root = scratch;
        self.local_changes
            .retain(|c| checkpoint.has_pending_client(c.id().client_seq()));
        self.checkpoint = checkpoint;
        self.state = if self.local_changes.is_empty() {
            SyncState::Synced
        } else {
            SyncState::Idle
        };
        debug!(
            "{}: applied pack with {} changes, checkpoint {}",
            self.key,
            pack.len(),
            self.checkpoint
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClockOverflowError;
    use crate::json::{Element, Primitive, PrimitiveValue};
    use crate::operation::Operation;
    use crate::time::{Ticket, ACTOR_ID_LEN, MAX_LAMPORT};
    use serde_json::json;

    fn doc(n: u8) -> Document {
        let mut bytes = [0u8; ACTOR_ID_LEN];
        bytes[ACTOR_ID_LEN - 1] = n;
        Document::with_actor(
            DocumentKey::new("c", "d").unwrap(),
            ActorId::from_bytes(bytes),
        )
    }

    #[test]
    fn update_builds_nested_values() {
        let mut d = doc(1);
        let id = d
            .update(Some("init"), |root| {
                root.set("title", "hello")?;
                let mut list = root.set_new_array("items")?;
                list.push(1i32)?;
                list.push(2i32)?;
                let mut meta = root.set_new_object("meta")?;
                meta.set("draft", true)?;
                Ok(())
            })
            .unwrap()
            .unwrap();
        assert_eq!(id.client_seq(), 1);
        assert_eq!(id.lamport(), 1);
        assert_eq!(
            d.to_json(),
            json!({ "title": "hello", "items": [1, 2], "meta": { "draft": true } })
        );
        assert_eq!(d.local_changes().len(), 1);
        assert_eq!(d.local_changes()[0].message(), Some("init"));
    }

    #[test]
    fn nested_proxies_reach_existing_containers() {
        let mut d = doc(1);
        d.update(None, |root| {
            root.set_new_array("list")?;
            Ok(())
        })
        .unwrap();
        d.update(None, |root| {
            let mut list = root.array("list")?;
            let first = list.push("a")?;
            list.insert_after(Ticket::INITIAL, "z")?;
            list.insert_after(first, "b")?;
            assert_eq!(list.len(), 3);
            assert_eq!(list.get(0), Some(&PrimitiveValue::from("z")));
            list.remove(0)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(d.to_json(), json!({ "list": ["a", "b"] }));
        assert_eq!(d.local_changes().len(), 2);
    }

    #[test]
    fn failed_edit_leaves_document_untouched() {
        let mut d = doc(1);
        let before = d.to_json();
        let err = d
            .update(None, |root| {
                root.set("a", 1i32)?;
                root.remove("missing")
            })
            .unwrap_err();
        assert_eq!(err, DocumentError::KeyNotFound("missing".into()));
        assert_eq!(d.to_json(), before);
        assert_eq!(d.lamport(), 0);
        assert!(!d.has_local_changes());
    }

    #[test]
    fn empty_edit_records_nothing() {
        let mut d = doc(1);
        assert_eq!(d.update(None, |_| Ok(())), Ok(None));
        assert!(!d.has_local_changes());
    }

    #[test]
    fn wrong_kind_is_reported() {
        let mut d = doc(1);
        d.update(None, |root| root.set("x", 1i32).map(|_| ())).unwrap();
        let err = d
            .update(None, |root| root.array("x").map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnexpectedKind { .. }));
    }

    #[test]
    fn response_pack_acknowledges_and_merges() {
        let mut a = doc(1);
        let mut b = doc(2);
        a.update(None, |root| root.set("a", 1i32).map(|_| ())).unwrap();
        b.update(None, |root| root.set("b", 2i32).map(|_| ())).unwrap();

        let push = a.create_change_pack();
        assert_eq!(a.sync_state(), SyncState::Pushing);
        assert_eq!(push.len(), 1);

        // response: a's change acknowledged, b's change delivered at serverSeq 2
        let response = ChangePack::new(
            a.key().clone(),
            Checkpoint::new(2, 1),
            b.local_changes().to_vec(),
        );
        a.apply_change_pack(&response).unwrap();
        assert_eq!(a.sync_state(), SyncState::Synced);
        assert!(!a.has_local_changes());
        assert_eq!(a.checkpoint(), Checkpoint::new(2, 1));
        assert_eq!(a.to_json(), json!({ "a": 1, "b": 2 }));
        assert!(a.lamport() > b.local_changes()[0].id().lamport());

        // redelivery is harmless
        a.apply_change_pack(&response).unwrap();
        assert_eq!(a.to_json(), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn response_pack_is_all_or_nothing() {
        let mut a = doc(1);
        let mut b = doc(2);
        b.update(None, |root| root.set_new_array("l").map(|_| ())).unwrap();
        b.update(None, |root| root.array("l")?.push(1i32).map(|_| ())).unwrap();

        // only the second change arrives: its parent is unknown
        let response = ChangePack::new(
            a.key().clone(),
            Checkpoint::new(2, 0),
            b.local_changes()[1..].to_vec(),
        );
        let before = a.to_json();
        assert!(matches!(
            a.apply_change_pack(&response),
            Err(DocumentError::Structural(_))
        ));
        assert_eq!(a.to_json(), before);
        assert_eq!(a.checkpoint(), Checkpoint::INITIAL);
    }

    #[test]
    fn response_for_other_document_is_rejected() {
        let mut a = doc(1);
        let pack = ChangePack::new(
            DocumentKey::new("c", "other").unwrap(),
            Checkpoint::INITIAL,
            Vec::new(),
        );
        assert!(matches!(
            a.apply_change_pack(&pack),
            Err(DocumentError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn stale_response_is_a_regression() {
        let mut a = doc(1);
        let key = a.key().clone();
        a.apply_change_pack(&ChangePack::new(key.clone(), Checkpoint::new(5, 0), Vec::new()))
            .unwrap();
        let err = a
            .apply_change_pack(&ChangePack::new(key, Checkpoint::new(3, 0), Vec::new()))
            .unwrap_err();
        assert!(matches!(err, DocumentError::ClockRegression(_)));
    }

    #[test]
    fn response_beyond_the_clock_range_is_rejected() {
        let mut a = doc(1);
        let remote = doc(2).actor_id();
        let at = Ticket::new(u64::MAX, 1, remote);
        let change = Change::new(
            ChangeId::new(1, u64::MAX, remote),
            vec![Operation::Set {
                parent_created_at: Ticket::INITIAL,
                key: "x".into(),
                value: Element::Primitive(Primitive::new(at, 1i32)),
                executed_at: at,
            }],
            None,
        );
        let pack = ChangePack::new(a.key().clone(), Checkpoint::new(1, 0), vec![change]);
        let err = a.apply_change_pack(&pack).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::ClockOverflow(ClockOverflowError {
                lamport: u64::MAX,
                ..
            })
        ));
        assert_eq!(a.to_json(), json!({}));
        assert_eq!(a.checkpoint(), Checkpoint::INITIAL);
        assert_eq!(a.lamport(), 0);
    }

    #[test]
    fn edit_at_the_clock_limit_fails() {
        let mut a = doc(1);
        let remote = doc(2).actor_id();
        let limit = ChangePack::new(
            a.key().clone(),
            Checkpoint::INITIAL,
            vec![Change::new(ChangeId::new(1, MAX_LAMPORT - 1, remote), Vec::new(), None)],
        );
        a.apply_change_pack(&limit).unwrap();
        assert_eq!(a.lamport(), MAX_LAMPORT);
        let err = a
            .update(None, |root| root.set("k", 1i32).map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, DocumentError::ClockOverflow(_)));
        assert!(!a.has_local_changes());
    }
}
