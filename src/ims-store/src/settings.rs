// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The `settings` collection is keyed by a fixed string id per setting
//! (e.g. `"spares_definition"`) rather than an object id, so it does not fit
//! [`crate::Collection`]'s id-keyed shape. This is a small, separate
//! abstraction for that one access pattern.

use std::collections::BTreeMap;
use std::sync::Arc;

use bson::Document;
use ims_errors::{CoreError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Clone)]
pub struct SettingsStore {
    inner: SettingsInner,
}

#[derive(Clone)]
enum SettingsInner {
    Mongo(mongodb::Collection<Document>),
    Memory(Arc<AsyncMutex<BTreeMap<String, Document>>>),
}

impl SettingsStore {
    pub(crate) fn mongo(db: &mongodb::Database) -> SettingsStore {
        SettingsStore {
            inner: SettingsInner::Mongo(db.collection::<Document>("settings")),
        }
    }

    pub(crate) fn memory(store: Arc<AsyncMutex<BTreeMap<String, Document>>>) -> SettingsStore {
        SettingsStore {
            inner: SettingsInner::Memory(store),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match &self.inner {
            SettingsInner::Mongo(coll) => {
                let filter = bson::doc! { "_id": key };
                match coll.find_one(filter, None).await? {
                    None => Ok(None),
                    Some(doc) => Ok(Some(
                        bson::from_document(doc)
                            .map_err(|e| CoreError::database_integrity(e.to_string()))?,
                    )),
                }
            }
            SettingsInner::Memory(store) => {
                let store = store.lock().await;
                match store.get(key) {
                    None => Ok(None),
                    Some(doc) => Ok(Some(
                        bson::from_document(doc.clone())
                            .map_err(|e| CoreError::database_integrity(e.to_string()))?,
                    )),
                }
            }
        }
    }

    /// Upserts `value` under `key`. Settings are administrative and do not
    /// participate in item/system transactions, so no session is required.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut doc = bson::to_document(value)
            .map_err(|e| CoreError::database_integrity(e.to_string()))?;
        doc.insert("_id", key);
        match &self.inner {
            SettingsInner::Mongo(coll) => {
                let filter = bson::doc! { "_id": key };
                let options = mongodb::options::ReplaceOptions::builder()
                    .upsert(true)
                    .build();
                coll.replace_one(filter, doc, options).await?;
                Ok(())
            }
            SettingsInner::Memory(store) => {
                let mut store = store.lock().await;
                store.insert(key.to_string(), doc);
                Ok(())
            }
        }
    }
}
