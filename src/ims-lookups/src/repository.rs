// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use std::future::Future;

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_store::{Collection, DbContext, Session};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// What [`FlatRepository`] needs from a stored document: an id and a
/// collection-wide unique code. Unlike [`ims_store::TreeNode`] there is no
/// parent — uniqueness is global to the collection, not per-sibling-set.
pub trait Coded: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin {
    fn id(&self) -> Option<Id>;
    fn set_id(&mut self, id: Id);
    fn code(&self) -> &str;
}

/// CRUD over a flat, code-unique collection (units, usage statuses,
/// manufacturers). Referential guards (is this record still referenced by
/// a catalogue item, item, or rule?) are supplied by the caller at the
/// delete call site, since `ims-lookups` does not depend on the crates that
/// would hold those references.
#[derive(Clone)]
pub struct FlatRepository<T> {
    collection: Collection<T>,
    kind: &'static str,
}

impl<T: Coded> FlatRepository<T> {
    pub fn new(db: &DbContext, collection_name: &'static str, kind: &'static str) -> FlatRepository<T> {
        FlatRepository {
            collection: db.collection(collection_name),
            kind,
        }
    }

    pub async fn create(&self, session: &mut Session, mut record: T) -> Result<T> {
        if self.code_exists(session, record.code(), None).await? {
            return Err(CoreError::DuplicateRecord(format!(
                "a {} with code '{}' already exists",
                self.kind,
                record.code()
            )));
        }
        let id = Id::new();
        record.set_id(id);
        self.collection.insert(session, &record).await?;
        Ok(record)
    }

    pub async fn get(&self, id: Id) -> Result<Option<T>> {
        self.collection.find_one(id).await
    }

    /// `get`, but participating in `session`'s transaction — for use inside
    /// a mutating operation that must see its own prior writes.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<T>> {
        self.collection.find_one_in_session(session, id).await
    }

    pub async fn list(&self) -> Result<Vec<T>> {
        self.collection.all().await
    }

    pub async fn update<F>(&self, session: &mut Session, id: Id, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut T),
    {
        let Some(mut record) = self.collection.find_one_in_session(session, id).await? else {
            return Err(CoreError::missing(self.kind, id));
        };
        let old_code = record.code().to_string();
        mutator(&mut record);
        if record.code() != old_code && self.code_exists(session, record.code(), Some(id)).await? {
            return Err(CoreError::DuplicateRecord(format!(
                "a {} with code '{}' already exists",
                self.kind,
                record.code()
            )));
        }
        self.collection.replace(session, id, &record).await?;
        Ok(record)
    }

    /// Deletes `id` unless `is_referenced` reports that some other entity
    /// still points to it, in which case the deletion is refused with
    /// [`CoreError::ChildElementsExist`].
    pub async fn delete<F, Fut>(&self, session: &mut Session, id: Id, is_referenced: F) -> Result<()>
    where
        F: FnOnce(Id) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        if self.collection.find_one_in_session(session, id).await?.is_none() {
            return Err(CoreError::missing(self.kind, id));
        }
        if is_referenced(id).await? {
            return Err(CoreError::ChildElementsExist(self.kind.to_string()));
        }
        self.collection.delete(session, id).await?;
        Ok(())
    }

    async fn code_exists(&self, session: &mut Session, code: &str, exclude: Option<Id>) -> Result<bool> {
        let all = self.collection.all_in_session(session).await?;
        Ok(all.iter().any(|r| r.code() == code && r.id() != exclude))
    }
}

/// CRUD over a flat collection that has no unique code of its own (system
/// types, rules). Referential guards work the same way as
/// [`FlatRepository::delete`].
#[derive(Clone)]
pub struct SimpleRepository<T> {
    collection: Collection<T>,
    kind: &'static str,
}

pub trait Keyed: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin {
    fn id(&self) -> Option<Id>;
    fn set_id(&mut self, id: Id);
}

impl<T: Keyed> SimpleRepository<T> {
    pub fn new(db: &DbContext, collection_name: &'static str, kind: &'static str) -> SimpleRepository<T> {
        SimpleRepository {
            collection: db.collection(collection_name),
            kind,
        }
    }

    pub async fn create(&self, session: &mut Session, mut record: T) -> Result<T> {
        let id = Id::new();
        record.set_id(id);
        self.collection.insert(session, &record).await?;
        Ok(record)
    }

    pub async fn get(&self, id: Id) -> Result<Option<T>> {
        self.collection.find_one(id).await
    }

    /// `get`, but participating in `session`'s transaction.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<T>> {
        self.collection.find_one_in_session(session, id).await
    }

    pub async fn list(&self) -> Result<Vec<T>> {
        self.collection.all().await
    }

    /// `list`, but participating in `session`'s transaction — for use inside
    /// a mutating operation that must see its own prior writes.
    pub async fn list_in_session(&self, session: &mut Session) -> Result<Vec<T>> {
        self.collection.all_in_session(session).await
    }

    pub async fn update<F>(&self, session: &mut Session, id: Id, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut T),
    {
        let Some(mut record) = self.collection.find_one_in_session(session, id).await? else {
            return Err(CoreError::missing(self.kind, id));
        };
        mutator(&mut record);
        self.collection.replace(session, id, &record).await?;
        Ok(record)
    }

    pub async fn delete<F, Fut>(&self, session: &mut Session, id: Id, is_referenced: F) -> Result<()>
    where
        F: FnOnce(Id) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        if self.collection.find_one_in_session(session, id).await?.is_none() {
            return Err(CoreError::missing(self.kind, id));
        }
        if is_referenced(id).await? {
            return Err(CoreError::ChildElementsExist(self.kind.to_string()));
        }
        self.collection.delete(session, id).await?;
        Ok(())
    }
}
