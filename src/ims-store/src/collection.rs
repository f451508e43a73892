// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! A small abstraction over "a Mongo collection of `T`" that also has an
//! in-memory implementation, so the repository logic in [`crate::tree`] and
//! [`crate::flat`] is written once and exercised in tests without a live
//! `mongod`. This plays the same role `mz-stash`'s `Memory` backend plays
//! for `mz-stash`'s `Postgres` backend: same trait-shaped surface, two
//! implementations, one of them fast and deterministic enough to unit test
//! against.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use bson::Document;
use ims_errors::{CoreError, Result};
use ims_ids::Id;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::session::{Session, SessionInner};

#[derive(Clone)]
pub struct Collection<T> {
    name: &'static str,
    backend: CollectionBackend,
    _marker: PhantomData<fn() -> T>,
}

#[derive(Clone)]
enum CollectionBackend {
    Mongo(mongodb::Database),
    Memory(Arc<MemoryCollection>),
}

pub(crate) struct MemoryCollection {
    pub(crate) docs: AsyncMutex<BTreeMap<Id, Document>>,
    locks: AsyncMutex<BTreeMap<Id, Arc<AsyncMutex<()>>>>,
}

impl MemoryCollection {
    pub(crate) fn new() -> Arc<MemoryCollection> {
        Arc::new(MemoryCollection {
            docs: AsyncMutex::new(BTreeMap::new()),
            locks: AsyncMutex::new(BTreeMap::new()),
        })
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin,
{
    pub(crate) fn mongo(db: mongodb::Database, name: &'static str) -> Collection<T> {
        Collection {
            name,
            backend: CollectionBackend::Mongo(db),
            _marker: PhantomData,
        }
    }

    pub(crate) fn memory(shared: Arc<MemoryCollection>, name: &'static str) -> Collection<T> {
        Collection {
            name,
            backend: CollectionBackend::Memory(shared),
            _marker: PhantomData,
        }
    }

    fn mongo_collection(&self, db: &mongodb::Database) -> mongodb::Collection<T> {
        db.collection::<T>(self.name)
    }

    pub async fn insert(&self, session: &mut Session, doc: &T) -> Result<()> {
        session.check_cancelled()?;
        match (&self.backend, &mut session.inner) {
            (CollectionBackend::Mongo(db), SessionInner::Mongo(s)) => {
                self.mongo_collection(db)
                    .insert_one_with_session(doc, None, s)
                    .await?;
                Ok(())
            }
            (CollectionBackend::Memory(mem), SessionInner::Memory(mem_session)) => {
                let id = extract_id(doc)?;
                let bson = bson::to_document(doc)
                    .map_err(|e| CoreError::database_integrity(e.to_string()))?;
                mem_session.write(self.name, mem, id, Some(bson)).await;
                Ok(())
            }
            _ => Err(mismatched_backend()),
        }
    }

    /// A read outside any transaction: for standalone lookups (a plain GET)
    /// where there is no in-flight mutation whose write set this read must
    /// see. Inside a mutating operation, use [`Collection::find_one_in_session`]
    /// instead — see its doc comment for why this distinction matters.
    pub async fn find_one(&self, id: Id) -> Result<Option<T>> {
        match &self.backend {
            CollectionBackend::Mongo(db) => {
                let filter = bson::doc! { "_id": id.as_object_id() };
                Ok(self.mongo_collection(db).find_one(filter, None).await?)
            }
            CollectionBackend::Memory(mem) => {
                let docs = mem.docs.lock().await;
                match docs.get(&id) {
                    None => Ok(None),
                    Some(doc) => Ok(Some(
                        bson::from_document(doc.clone())
                            .map_err(|e| CoreError::database_integrity(e.to_string()))?,
                    )),
                }
            }
        }
    }

    /// Returns every document in the collection. The repository layer does
    /// its own filtering over the result, since the in-memory backend has
    /// no query planner of its own — acceptable for the modest collection
    /// sizes this system deals with, and it keeps the two backends'
    /// filtering logic identical by construction.
    ///
    /// A standalone read, like [`Collection::find_one`]; see
    /// [`Collection::all_in_session`] for the transaction-aware version.
    pub async fn all(&self) -> Result<Vec<T>> {
        match &self.backend {
            CollectionBackend::Mongo(db) => {
                use futures::stream::TryStreamExt;
                let cursor = self.mongo_collection(db).find(None, None).await?;
                Ok(cursor.try_collect().await?)
            }
            CollectionBackend::Memory(mem) => {
                let docs = mem.docs.lock().await;
                docs.values()
                    .map(|doc| {
                        bson::from_document(doc.clone())
                            .map_err(|e| CoreError::database_integrity(e.to_string()))
                    })
                    .collect()
            }
        }
    }

    /// `find_one`, but issued inside `session`. On the Mongo backend this
    /// makes the read part of `session`'s transaction, so it sees that
    /// transaction's own uncommitted writes (spec §4.B/§5: a move's cycle
    /// check and a derived-state recompute must read the update that
    /// triggered them, not just what was committed before it started). On
    /// the in-memory backend this reads `session`'s buffered writes first,
    /// falling back to the committed map — see [`crate::session`] for how
    /// that buffer is applied on commit and discarded on abort.
    pub async fn find_one_in_session(&self, session: &mut Session, id: Id) -> Result<Option<T>> {
        session.check_cancelled()?;
        match (&self.backend, &mut session.inner) {
            (CollectionBackend::Mongo(db), SessionInner::Mongo(s)) => {
                let filter = bson::doc! { "_id": id.as_object_id() };
                Ok(self
                    .mongo_collection(db)
                    .find_one_with_session(filter, None, s)
                    .await?)
            }
            (CollectionBackend::Memory(mem), SessionInner::Memory(mem_session)) => {
                if let Some(pending) = mem_session.pending.get(self.name) {
                    if let Some(overridden) = pending.writes.get(&id) {
                        return match overridden {
                            Some(doc) => Ok(Some(
                                bson::from_document(doc.clone())
                                    .map_err(|e| CoreError::database_integrity(e.to_string()))?,
                            )),
                            None => Ok(None),
                        };
                    }
                }
                let docs = mem.docs.lock().await;
                match docs.get(&id) {
                    None => Ok(None),
                    Some(doc) => Ok(Some(
                        bson::from_document(doc.clone())
                            .map_err(|e| CoreError::database_integrity(e.to_string()))?,
                    )),
                }
            }
            _ => Err(mismatched_backend()),
        }
    }

    /// `all`, but issued inside `session`; see [`Collection::find_one_in_session`].
    pub async fn all_in_session(&self, session: &mut Session) -> Result<Vec<T>> {
        session.check_cancelled()?;
        match (&self.backend, &mut session.inner) {
            (CollectionBackend::Mongo(db), SessionInner::Mongo(s)) => {
                use futures::stream::TryStreamExt;
                let mut cursor = self.mongo_collection(db).find_with_session(None, None, s).await?;
                Ok(cursor.stream(s).try_collect().await?)
            }
            (CollectionBackend::Memory(mem), SessionInner::Memory(mem_session)) => {
                let docs = mem.docs.lock().await;
                let mut merged = docs.clone();
                if let Some(pending) = mem_session.pending.get(self.name) {
                    for (id, overridden) in &pending.writes {
                        match overridden {
                            Some(doc) => {
                                merged.insert(*id, doc.clone());
                            }
                            None => {
                                merged.remove(id);
                            }
                        }
                    }
                }
                merged
                    .values()
                    .map(|doc| {
                        bson::from_document(doc.clone())
                            .map_err(|e| CoreError::database_integrity(e.to_string()))
                    })
                    .collect()
            }
            _ => Err(mismatched_backend()),
        }
    }

    pub async fn replace(&self, session: &mut Session, id: Id, doc: &T) -> Result<()> {
        session.check_cancelled()?;
        match (&self.backend, &mut session.inner) {
            (CollectionBackend::Mongo(db), SessionInner::Mongo(s)) => {
                let filter = bson::doc! { "_id": id.as_object_id() };
                self.mongo_collection(db)
                    .replace_one_with_session(filter, doc, None, s)
                    .await?;
                Ok(())
            }
            (CollectionBackend::Memory(mem), SessionInner::Memory(mem_session)) => {
                let bson = bson::to_document(doc)
                    .map_err(|e| CoreError::database_integrity(e.to_string()))?;
                mem_session.write(self.name, mem, id, Some(bson)).await;
                Ok(())
            }
            _ => Err(mismatched_backend()),
        }
    }

    pub async fn delete(&self, session: &mut Session, id: Id) -> Result<()> {
        session.check_cancelled()?;
        match (&self.backend, &mut session.inner) {
            (CollectionBackend::Mongo(db), SessionInner::Mongo(s)) => {
                let filter = bson::doc! { "_id": id.as_object_id() };
                self.mongo_collection(db)
                    .delete_one_with_session(filter, None, s)
                    .await?;
                Ok(())
            }
            (CollectionBackend::Memory(mem), SessionInner::Memory(mem_session)) => {
                mem_session.write(self.name, mem, id, None).await;
                Ok(())
            }
            _ => Err(mismatched_backend()),
        }
    }

    /// A no-op self-update on `id`, solely to force the document into the
    /// current transaction's write set (spec §4.B `write_lock`). On the
    /// in-memory backend this additionally takes an async mutex scoped to
    /// `id` for the lifetime of `session`, which gives tests a real,
    /// observable serialization point instead of only a documented
    /// contract.
    pub async fn write_lock(&self, session: &mut Session, id: Id) -> Result<()> {
        session.check_cancelled()?;
        match (&self.backend, &mut session.inner) {
            (CollectionBackend::Mongo(db), SessionInner::Mongo(s)) => {
                let filter = bson::doc! { "_id": id.as_object_id() };
                let update = bson::doc! { "$set": { "_write_lock_token": bson::oid::ObjectId::new() } };
                self.mongo_collection(db)
                    .update_one_with_session(filter, update, None, s)
                    .await?;
                Ok(())
            }
            (CollectionBackend::Memory(mem), SessionInner::Memory(mem_session)) => {
                let lock = {
                    let mut locks = mem.locks.lock().await;
                    locks
                        .entry(id)
                        .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                        .clone()
                };
                let guard = lock.lock_owned().await;
                mem_session.held_locks.push(guard);
                Ok(())
            }
            _ => Err(mismatched_backend()),
        }
    }
}

fn mismatched_backend() -> CoreError {
    CoreError::database_integrity("session backend does not match collection backend")
}

fn extract_id<T: Serialize>(doc: &T) -> Result<Id> {
    let bson = bson::to_bson(doc).map_err(|e| CoreError::database_integrity(e.to_string()))?;
    let document = bson
        .as_document()
        .ok_or_else(|| CoreError::database_integrity("document did not serialize to an object"))?;
    let oid = document
        .get_object_id("_id")
        .map_err(|_| CoreError::database_integrity("document is missing an `_id`"))?;
    Ok(Id::from(oid))
}
