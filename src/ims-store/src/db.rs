// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use ims_errors::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::collection::{Collection, MemoryCollection};
use crate::session::Session;
use crate::settings::SettingsStore;

/// Holds the process-wide database handle. One `DbContext` is created at
/// startup and torn down at shutdown; per spec §5's "shared resources"
/// paragraph, it is the only piece of shared mutable state the core
/// requires — everything else is either local to a request or owned by a
/// [`Session`].
#[derive(Clone)]
pub struct DbContext {
    inner: DbInner,
}

#[derive(Clone)]
enum DbInner {
    Mongo(mongodb::Client, mongodb::Database),
    Memory(Arc<MemoryRegistry>),
}

struct MemoryRegistry {
    collections: Mutex<HashMap<&'static str, Arc<MemoryCollection>>>,
    settings: Arc<AsyncMutex<BTreeMap<String, bson::Document>>>,
}

impl DbContext {
    /// Connects to `uri` and selects database `name`.
    pub async fn connect(uri: &str, name: &str) -> Result<DbContext> {
        let client = mongodb::Client::with_uri_str(uri).await?;
        Ok(DbContext {
            inner: DbInner::Mongo(client.clone(), client.database(name)),
        })
    }

    /// An in-memory `DbContext` for tests: no network, no `mongod`, but the
    /// same repository code path runs against it. Every call to
    /// [`DbContext::collection`] for the same name returns a handle onto
    /// the same underlying store, so code that looks up "the catalogue
    /// items collection" from two different crates still sees one
    /// consistent set of documents.
    pub fn memory() -> DbContext {
        DbContext {
            inner: DbInner::Memory(Arc::new(MemoryRegistry {
                collections: Mutex::new(HashMap::new()),
                settings: Arc::new(AsyncMutex::new(BTreeMap::new())),
            })),
        }
    }

    pub fn collection<T>(&self, name: &'static str) -> Collection<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin,
    {
        match &self.inner {
            DbInner::Mongo(_client, db) => Collection::mongo(db.clone(), name),
            DbInner::Memory(registry) => {
                let mut collections = registry.collections.lock().expect("memory registry poisoned");
                let shared = collections
                    .entry(name)
                    .or_insert_with(MemoryCollection::new)
                    .clone();
                Collection::memory(shared, name)
            }
        }
    }

    pub fn settings(&self) -> SettingsStore {
        match &self.inner {
            DbInner::Mongo(_client, db) => SettingsStore::mongo(db),
            DbInner::Memory(registry) => SettingsStore::memory(registry.settings.clone()),
        }
    }

    /// Starts a session with no cancellation token of its own: it can still
    /// be cancelled by dropping the future, but [`Session::check_cancelled`]
    /// never trips. Use [`DbContext::start_session_with_cancellation`] when
    /// a request-scoped token is available.
    pub async fn start_session(&self) -> Result<Session> {
        self.start_session_with_cancellation(CancellationToken::new()).await
    }

    /// Starts a session bound to `cancellation`. Every mutating repository
    /// call made through this session checks the token first.
    pub async fn start_session_with_cancellation(&self, cancellation: CancellationToken) -> Result<Session> {
        match &self.inner {
            DbInner::Mongo(client, _db) => {
                let session = client.start_session(None).await?;
                Ok(Session::from_mongo(session, cancellation))
            }
            DbInner::Memory(_) => Ok(Session::memory_with_cancellation(cancellation)),
        }
    }
}
