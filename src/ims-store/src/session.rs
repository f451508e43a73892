// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use bson::Document;
use ims_errors::{CoreError, Result};
use ims_ids::Id;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

use crate::collection::MemoryCollection;

/// A database session, optionally wrapping a multi-document transaction.
/// Every multi-collection mutation in this workspace (property propagation,
/// a system move that may trigger spares recompute, item create/update/
/// delete with spares recompute) runs inside one of these, per spec §5.
///
/// Carries the [`CancellationToken`] for the request it belongs to. Every
/// mutating repository method checks it before touching the database, so a
/// caller that cancels a request (client disconnect, request timeout) stops
/// the in-flight write instead of letting it complete unobserved.
pub struct Session {
    pub(crate) inner: SessionInner,
    cancellation: CancellationToken,
}

pub(crate) enum SessionInner {
    Mongo(mongodb::ClientSession),
    /// The in-memory backend has no real multi-document isolation; it
    /// tracks which per-document write locks this session holds so they are
    /// released together, which is enough to reproduce the serialization
    /// behaviour spec §4.E/§5 describe for a single process.
    Memory(MemorySessionState),
}

#[derive(Default)]
pub(crate) struct MemorySessionState {
    pub(crate) held_locks: Vec<OwnedMutexGuard<()>>,
    /// Set between `start_transaction()` and `commit_transaction()`/
    /// `abort_transaction()`. Writes issued while this is set are buffered
    /// in `pending` instead of applied immediately, so an abort can discard
    /// them; writes issued outside a transaction apply straight through, as
    /// they always have, since there is nothing to roll them back to.
    in_transaction: bool,
    /// Writes made through this session that have not yet been applied to
    /// the collections they target. Reads issued through this same session
    /// (`Collection::find_one_in_session`/`all_in_session`) check here first,
    /// so a transaction sees its own writes before they are committed.
    pub(crate) pending: BTreeMap<&'static str, PendingCollectionWrites>,
}

pub(crate) struct PendingCollectionWrites {
    collection: Arc<MemoryCollection>,
    pub(crate) writes: BTreeMap<Id, Option<Document>>,
}

impl MemorySessionState {
    pub(crate) fn begin_transaction(&mut self) {
        self.in_transaction = true;
    }

    /// Writes `doc` against `id` in `collection` (`Some(doc)` for an
    /// insert/replace, `None` for a delete). Buffered under an active
    /// transaction so it can be rolled back on abort; applied immediately
    /// otherwise, matching every write issued outside `start_transaction()`.
    pub(crate) async fn write(
        &mut self,
        name: &'static str,
        collection: &Arc<MemoryCollection>,
        id: Id,
        doc: Option<Document>,
    ) {
        if !self.in_transaction {
            let mut docs = collection.docs.lock().await;
            match doc {
                Some(doc) => {
                    docs.insert(id, doc);
                }
                None => {
                    docs.remove(&id);
                }
            }
            return;
        }
        self.pending
            .entry(name)
            .or_insert_with(|| PendingCollectionWrites {
                collection: collection.clone(),
                writes: BTreeMap::new(),
            })
            .writes
            .insert(id, doc);
    }

    /// Applies every buffered write to its collection's committed state.
    pub(crate) async fn apply_pending(&mut self) {
        for (_, pending) in std::mem::take(&mut self.pending) {
            let mut docs = pending.collection.docs.lock().await;
            for (id, doc) in pending.writes {
                match doc {
                    Some(doc) => {
                        docs.insert(id, doc);
                    }
                    None => {
                        docs.remove(&id);
                    }
                }
            }
        }
        self.in_transaction = false;
    }

    pub(crate) fn discard_pending(&mut self) {
        self.pending.clear();
        self.in_transaction = false;
    }
}

impl Session {
    pub(crate) fn from_mongo(session: mongodb::ClientSession, cancellation: CancellationToken) -> Session {
        Session {
            inner: SessionInner::Mongo(session),
            cancellation,
        }
    }

    pub(crate) fn memory_with_cancellation(cancellation: CancellationToken) -> Session {
        Session {
            inner: SessionInner::Memory(MemorySessionState::default()),
            cancellation,
        }
    }

    pub(crate) fn memory() -> Session {
        Session::memory_with_cancellation(CancellationToken::new())
    }

    /// The cancellation token for the request this session belongs to.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns [`CoreError::Cancelled`] if the caller has cancelled this
    /// session's request. Called at the top of every mutating repository
    /// method, before any document is read or written.
    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Starts a multi-document transaction on this session. On the
    /// in-memory backend, writes issued from this point on are buffered
    /// until `commit_transaction`/`abort_transaction` instead of applied
    /// immediately.
    pub async fn start_transaction(&mut self) -> Result<()> {
        match &mut self.inner {
            SessionInner::Mongo(s) => {
                s.start_transaction(None).await?;
            }
            SessionInner::Memory(state) => {
                state.begin_transaction();
            }
        }
        Ok(())
    }

    /// Commits the transaction, making its writes visible to other
    /// sessions. Held write locks are released as part of dropping this
    /// session afterwards.
    pub async fn commit_transaction(&mut self) -> Result<()> {
        match &mut self.inner {
            SessionInner::Mongo(s) => {
                s.commit_transaction().await?;
            }
            SessionInner::Memory(state) => {
                state.apply_pending().await;
                state.held_locks.clear();
            }
        }
        Ok(())
    }

    /// Aborts the transaction, discarding its writes and releasing its
    /// locks.
    pub async fn abort_transaction(&mut self) -> Result<()> {
        match &mut self.inner {
            SessionInner::Mongo(s) => {
                s.abort_transaction().await?;
            }
            SessionInner::Memory(state) => {
                state.discard_pending();
                state.held_locks.clear();
            }
        }
        Ok(())
    }
}
