//! The push/pull coordinator.
//!
//! # Overview
//!
//! ```text
//!  actor ── push_pull(pack) ──► registry (RwLock) ──► document (Mutex)
//!                                                        │
//!                          validate: serverSeq claim, clientSeq run, lamports
//!                          apply to scratch tree, then commit + sequence
//!                                                        │
//!  actor ◄── response pack (checkpoint + missing changes) ┘
//! ```
//!
//! Each document is guarded by its own mutex, held for the whole pack, so
//! packs for one document are serialized while different documents proceed
//! in parallel. Applying changes never awaits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace, warn};
use rottie_document::time::MAX_LAMPORT;
use rottie_document::{
    ActorId, Change, ChangeLog, ChangePack, Checkpoint, ClockOverflowError, ClockRegressionError,
    DocumentKey, ElementTree, SeqField, SequenceGapError,
};
use tokio::sync::{Mutex, RwLock};

use crate::config::CoordinatorConfig;
use crate::error::SyncError;
use crate::stats::{CoordinatorStats, StatsSnapshot};

/// What the coordinator knows about one actor of one document.
#[derive(Debug, Clone, Copy, Default)]
struct ActorProgress {
    /// Last client sequence accepted from the actor.
    client_seq: u64,
    /// Lamport of that change.
    lamport: u64,
    /// Last server sequence delivered to the actor.
    server_seq: u64,
}

/// Authoritative state of one document.
#[derive(Debug, Default)]
struct DocumentState {
    tree: ElementTree,
    log: ChangeLog,
    actors: HashMap<ActorId, ActorProgress>,
}

impl DocumentState {
    /// Nothing was ever accepted or delivered.
    fn is_pristine(&self) -> bool {
        self.log.is_empty() && self.actors.is_empty()
    }
}

pub struct Coordinator {
    config: CoordinatorConfig,
    documents: RwLock<HashMap<DocumentKey, Arc<Mutex<DocumentState>>>>,
    stats: CoordinatorStats,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            documents: RwLock::new(HashMap::new()),
            stats: CoordinatorStats::default(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    async fn entry(&self, key: &DocumentKey) -> Arc<Mutex<DocumentState>> {
        if let Some(doc) = self.documents.read().await.get(key) {
            return Arc::clone(doc);
        }
        let mut documents = self.documents.write().await;
        let doc = documents
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(DocumentState::default())));
        Arc::clone(doc)
    }

    async fn existing(&self, key: &DocumentKey) -> Option<Arc<Mutex<DocumentState>>> {
        self.documents.read().await.get(key).cloned()
    }

    /// Push `actor`'s changes and pull what it is missing.
    ///
    /// The pack is accepted whole or rejected whole. On success the response
    /// carries the changes the actor has not seen, excluding its own unless
    /// configured otherwise, and a checkpoint acknowledging its changes.
    pub async fn push_pull(&self, actor: ActorId, pack: ChangePack) -> Result<ChangePack, SyncError> {
        self.stats.record_received();
        let key = pack.document_key().clone();
        let result = self.handle(actor, &pack).await;
        if let Err(err) = &result {
            self.stats.record_rejected();
            warn!("{key}: rejected pack from {actor}: {err}");
            self.forget_if_pristine(&key).await;
        }
        result
    }

    /// Drop the entry for `key` if a rejected pack created it and no other
    /// pack holds it.
    async fn forget_if_pristine(&self, key: &DocumentKey) {
        let mut documents = self.documents.write().await;
        let unused = documents.get(key).is_some_and(|doc| {
            Arc::strong_count(doc) == 1
                && doc.try_lock().map(|state| state.is_pristine()).unwrap_or(false)
        });
        if unused {
            documents.remove(key);
            trace!("{key}: dropped empty document after rejection");
        }
    }

    async fn handle(&self, actor: ActorId, pack: &ChangePack) -> Result<ChangePack, SyncError> {
        if pack.len() > self.config.max_pack_changes {
            return Err(SyncError::PackTooLarge {
                count: pack.len(),
                limit: self.config.max_pack_changes,
            });
        }

        let key = pack.document_key();
        let entry = self.entry(key).await;
        let mut guard = entry.lock().await;
        let state = &mut *guard;

        let claimed = pack.checkpoint();
        let last_seq = state.log.last_server_seq();
        if claimed.server_seq() > last_seq {
            return Err(SequenceGapError {
                field: SeqField::ServerSeq,
                expected: last_seq,
                actual: claimed.server_seq(),
            }
            .into());
        }

        let mut progress = state.actors.get(&actor).copied().unwrap_or_default();
        let fresh = accept_run(actor, progress, pack.changes())?;

        if let Some(last) = fresh.last() {
            let started = Instant::now();
            let mut scratch = state.tree.clone();
            for change in &fresh {
                scratch
                    .apply_change(change)
                    .map_err(|source| SyncError::Rejected {
                        change: change.id(),
                        source,
                    })?;
            }
            state.tree = scratch;
            for change in &fresh {
                let seq = state.log.append((*change).clone());
                trace!("{key}: change {} stored at serverSeq {seq}", change.id());
            }
            progress.client_seq = last.id().client_seq();
            progress.lamport = last.id().lamport();
            self.stats.record_applied(fresh.len(), started.elapsed());
            debug!(
                "{key}: accepted {} changes from {actor}, serverSeq now {}",
                fresh.len(),
                state.log.last_server_seq()
            );
        }

        let mut delivered_through = claimed.server_seq();
        let mut pulled = Vec::new();
        for (seq, change) in state.log.since(claimed.server_seq()) {
            let own = change.id().actor_id() == actor;
            if own && self.config.exclude_own_changes {
                delivered_through = seq;
                continue;
            }
            if pulled.len() == self.config.max_pull_changes {
                break;
            }
            pulled.push(change.clone());
            delivered_through = seq;
        }
        self.stats.record_pulled(pulled.len());

        progress.server_seq = progress.server_seq.max(delivered_through);
        state.actors.insert(actor, progress);

        let checkpoint = Checkpoint::new(delivered_through, progress.client_seq);
        trace!("{key}: {actor} pulled {} changes, checkpoint {checkpoint}", pulled.len());
        Ok(ChangePack::new(key.clone(), checkpoint, pulled))
    }

    /// Authoritative tree of `key`, if the document exists.
    pub async fn snapshot(&self, key: &DocumentKey) -> Option<ElementTree> {
        let entry = self.existing(key).await?;
        let state = entry.lock().await;
        Some(state.tree.clone())
    }

    /// Highest server sequence issued for `key`.
    pub async fn server_seq(&self, key: &DocumentKey) -> Option<u64> {
        let entry = self.existing(key).await?;
        let state = entry.lock().await;
        Some(state.log.last_server_seq())
    }

    /// What the coordinator has recorded for `actor` on `key`: the last
    /// server sequence delivered and the last client sequence accepted.
    pub async fn checkpoint_of(&self, key: &DocumentKey, actor: ActorId) -> Option<Checkpoint> {
        let entry = self.existing(key).await?;
        let state = entry.lock().await;
        state
            .actors
            .get(&actor)
            .map(|p| Checkpoint::new(p.server_seq, p.client_seq))
    }

    /// Stored changes of `key` after `server_seq`, with their sequence numbers.
    pub async fn changes_since(&self, key: &DocumentKey, server_seq: u64) -> Vec<(u64, Change)> {
        let Some(entry) = self.existing(key).await else {
            return Vec::new();
        };
        let state = entry.lock().await;
        state
            .log
            .since(server_seq)
            .map(|(seq, change)| (seq, change.clone()))
            .collect()
    }

    pub async fn document_keys(&self) -> Vec<DocumentKey> {
        let mut keys: Vec<DocumentKey> = self.documents.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Pick the changes of `pack` not yet accepted from `actor`.
///
/// Already acknowledged client sequences are skipped as redeliveries. The
/// rest must continue the actor's run without gaps and with increasing
/// lamports that stay within [`MAX_LAMPORT`].
fn accept_run<'p>(
    actor: ActorId,
    progress: ActorProgress,
    changes: &'p [Change],
) -> Result<Vec<&'p Change>, SyncError> {
    let mut expected = progress.client_seq + 1;
    let mut lamport = progress.lamport;
    let mut fresh = Vec::new();
    for change in changes {
        let id = change.id();
        if id.actor_id() != actor {
            return Err(SyncError::ForeignChange { change: id, actor });
        }
        if id.client_seq() <= progress.client_seq {
            trace!("skipping redelivered change {id}");
            continue;
        }
        if id.client_seq() != expected {
            return Err(SequenceGapError {
                field: SeqField::ClientSeq,
                expected,
                actual: id.client_seq(),
            }
            .into());
        }
        if id.lamport() > MAX_LAMPORT {
            return Err(SyncError::ClockOverflow {
                change: id,
                source: ClockOverflowError {
                    lamport: id.lamport(),
                    limit: MAX_LAMPORT,
                },
            });
        }
        if id.lamport() <= lamport {
            return Err(SyncError::ClockRegression {
                change: id,
                source: ClockRegressionError {
                    field: SeqField::Lamport,
                    current: lamport,
                    proposed: id.lamport(),
                },
            });
        }
        expected += 1;
        lamport = id.lamport();
        fresh.push(change);
    }
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rottie_document::time::ACTOR_ID_LEN;
    use rottie_document::ChangeId;

    fn actor(n: u8) -> ActorId {
        let mut bytes = [0u8; ACTOR_ID_LEN];
        bytes[ACTOR_ID_LEN - 1] = n;
        ActorId::from_bytes(bytes)
    }

    fn empty(client_seq: u64, lamport: u64, n: u8) -> Change {
        Change::new(ChangeId::new(client_seq, lamport, actor(n)), Vec::new(), None)
    }

    #[test]
    fn run_skips_acknowledged_and_checks_gaps() {
        let progress = ActorProgress {
            client_seq: 2,
            lamport: 4,
            server_seq: 0,
        };
        let changes = vec![empty(2, 4, 1), empty(3, 6, 1), empty(4, 7, 1)];
        let fresh = accept_run(actor(1), progress, &changes).unwrap();
        assert_eq!(fresh.len(), 2);

        let gap = vec![empty(4, 9, 1)];
        assert_eq!(
            accept_run(actor(1), progress, &gap),
            Err(SyncError::SequenceGap(SequenceGapError {
                field: SeqField::ClientSeq,
                expected: 3,
                actual: 4
            }))
        );
    }

    #[test]
    fn run_rejects_lamport_regression_and_foreign_changes() {
        let changes = vec![empty(1, 5, 1), empty(2, 5, 1)];
        assert!(matches!(
            accept_run(actor(1), ActorProgress::default(), &changes),
            Err(SyncError::ClockRegression { .. })
        ));
        let unencodable = vec![empty(1, MAX_LAMPORT + 1, 1)];
        assert!(matches!(
            accept_run(actor(1), ActorProgress::default(), &unencodable),
            Err(SyncError::ClockOverflow { .. })
        ));
        let at_limit = vec![empty(1, MAX_LAMPORT, 1)];
        assert!(accept_run(actor(1), ActorProgress::default(), &at_limit).is_ok());
        let foreign = vec![empty(1, 1, 2)];
        assert!(matches!(
            accept_run(actor(1), ActorProgress::default(), &foreign),
            Err(SyncError::ForeignChange { .. })
        ));
    }
}
