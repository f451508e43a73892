// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_store::{Collection, DbContext, Session};

use crate::item::Item;
use crate::property::StoredProperty;

/// CRUD plus the bulk queries the catalogue (propagation, spares count) and
/// system (rule validation, move, delete) engines need. Item has no code of
/// its own, so this is a thinner wrapper than [`ims_store::TreeRepository`]
/// or `ims-lookups`'s `FlatRepository` — just [`Collection`] plus the
/// filters those callers actually perform.
#[derive(Clone)]
pub struct ItemRepository {
    collection: Collection<Item>,
}

impl ItemRepository {
    pub fn new(db: &DbContext) -> ItemRepository {
        ItemRepository {
            collection: db.collection("items"),
        }
    }

    pub async fn create(&self, session: &mut Session, mut item: Item) -> Result<Item> {
        let id = Id::new();
        item.id = Some(id);
        self.collection.insert(session, &item).await?;
        Ok(item)
    }

    pub async fn get(&self, id: Id) -> Result<Option<Item>> {
        self.collection.find_one(id).await
    }

    /// `get`, but participating in `session`'s transaction.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<Item>> {
        self.collection.find_one_in_session(session, id).await
    }

    pub async fn list_by_catalogue_item(&self, catalogue_item_id: Id) -> Result<Vec<Item>> {
        let all = self.collection.all().await?;
        Ok(all
            .into_iter()
            .filter(|i| i.catalogue_item_id == catalogue_item_id)
            .collect())
    }

    /// `list_by_catalogue_item`, but participating in `session`'s
    /// transaction — used by spares recompute, which must see the very
    /// item create/update/delete that triggered it even though that write
    /// has not committed yet.
    pub async fn list_by_catalogue_item_in_session(
        &self,
        session: &mut Session,
        catalogue_item_id: Id,
    ) -> Result<Vec<Item>> {
        let all = self.collection.all_in_session(session).await?;
        Ok(all
            .into_iter()
            .filter(|i| i.catalogue_item_id == catalogue_item_id)
            .collect())
    }

    pub async fn list_by_system(&self, system_id: Id) -> Result<Vec<Item>> {
        let all = self.collection.all().await?;
        Ok(all.into_iter().filter(|i| i.system_id == system_id).collect())
    }

    /// `list_by_system`, but participating in `session`'s transaction.
    pub async fn list_by_system_in_session(&self, session: &mut Session, system_id: Id) -> Result<Vec<Item>> {
        let all = self.collection.all_in_session(session).await?;
        Ok(all.into_iter().filter(|i| i.system_id == system_id).collect())
    }

    pub async fn update<F>(&self, session: &mut Session, id: Id, mutator: F) -> Result<Item>
    where
        F: FnOnce(&mut Item),
    {
        let Some(mut item) = self.collection.find_one_in_session(session, id).await? else {
            return Err(CoreError::missing("item", id));
        };
        mutator(&mut item);
        self.collection.replace(session, id, &item).await?;
        Ok(item)
    }

    pub async fn delete(&self, session: &mut Session, id: Id) -> Result<()> {
        if self.collection.find_one_in_session(session, id).await?.is_none() {
            return Err(CoreError::missing("item", id));
        }
        self.collection.delete(session, id).await?;
        Ok(())
    }

    /// Appends `property` to every item under any of `catalogue_item_ids`
    /// (propagation engine step D.1.c).
    pub async fn append_property_for_catalogue_items(
        &self,
        session: &mut Session,
        catalogue_item_ids: &[Id],
        property: &StoredProperty,
    ) -> Result<()> {
        let all = self.collection.all_in_session(session).await?;
        for mut item in all {
            if !catalogue_item_ids.contains(&item.catalogue_item_id) {
                continue;
            }
            let id = item.id.expect("stored item always has an id");
            item.properties.push(property.clone());
            self.collection.replace(session, id, &item).await?;
        }
        Ok(())
    }

    /// Overwrites `name` on every stored property matching `property_id`,
    /// wherever it appears (propagation engine step D.2).
    pub async fn rename_property(
        &self,
        session: &mut Session,
        property_id: Id,
        new_name: &str,
    ) -> Result<()> {
        let all = self.collection.all_in_session(session).await?;
        for mut item in all {
            let mut changed = false;
            for prop in item.properties.iter_mut() {
                if prop.id == property_id {
                    prop.name = new_name.to_string();
                    changed = true;
                }
            }
            if changed {
                let id = item.id.expect("stored item always has an id");
                self.collection.replace(session, id, &item).await?;
            }
        }
        Ok(())
    }
}
