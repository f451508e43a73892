// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_store::{Collection, DbContext, Session};

use crate::catalogue_item::CatalogueItem;

#[derive(Clone)]
pub struct CatalogueItemRepository {
    collection: Collection<CatalogueItem>,
}

impl CatalogueItemRepository {
    pub fn new(db: &DbContext) -> CatalogueItemRepository {
        CatalogueItemRepository {
            collection: db.collection("catalogue_items"),
        }
    }

    pub async fn create(&self, session: &mut Session, mut item: CatalogueItem) -> Result<CatalogueItem> {
        let id = Id::new();
        item.id = Some(id);
        self.collection.insert(session, &item).await?;
        Ok(item)
    }

    pub async fn get(&self, id: Id) -> Result<Option<CatalogueItem>> {
        self.collection.find_one(id).await
    }

    /// `get`, but participating in `session`'s transaction.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<CatalogueItem>> {
        self.collection.find_one_in_session(session, id).await
    }

    pub async fn list_by_category(&self, catalogue_category_id: Id) -> Result<Vec<CatalogueItem>> {
        let all = self.collection.all().await?;
        Ok(all
            .into_iter()
            .filter(|i| i.catalogue_category_id == catalogue_category_id)
            .collect())
    }

    /// `list_by_category`, but participating in `session`'s transaction.
    pub async fn list_by_category_in_session(
        &self,
        session: &mut Session,
        catalogue_category_id: Id,
    ) -> Result<Vec<CatalogueItem>> {
        let all = self.collection.all_in_session(session).await?;
        Ok(all
            .into_iter()
            .filter(|i| i.catalogue_category_id == catalogue_category_id)
            .collect())
    }

    pub async fn update<F>(&self, session: &mut Session, id: Id, mutator: F) -> Result<CatalogueItem>
    where
        F: FnOnce(&mut CatalogueItem),
    {
        let Some(mut item) = self.collection.find_one_in_session(session, id).await? else {
            return Err(CoreError::missing("catalogue item", id));
        };
        mutator(&mut item);
        self.collection.replace(session, id, &item).await?;
        Ok(item)
    }

    pub async fn delete(&self, session: &mut Session, id: Id) -> Result<()> {
        if self.collection.find_one_in_session(session, id).await?.is_none() {
            return Err(CoreError::missing("catalogue item", id));
        }
        self.collection.delete(session, id).await?;
        Ok(())
    }

    /// Acquires a write lock on `id`. Callers must do this *before* reading
    /// the data a derived-state recompute depends on (spec §5), then call
    /// [`CatalogueItemRepository::set_number_of_spares`] with the result.
    pub async fn write_lock(&self, session: &mut Session, id: Id) -> Result<()> {
        self.collection.write_lock(session, id).await
    }

    pub async fn set_number_of_spares(
        &self,
        session: &mut Session,
        id: Id,
        number_of_spares: u64,
    ) -> Result<()> {
        let Some(mut item) = self.collection.find_one_in_session(session, id).await? else {
            return Err(CoreError::missing("catalogue item", id));
        };
        item.number_of_spares = Some(number_of_spares);
        self.collection.replace(session, id, &item).await?;
        Ok(())
    }

    /// Appends `property` to every catalogue item under any of
    /// `catalogue_category_ids` (propagation engine step D.1.b).
    pub async fn append_property_for_categories(
        &self,
        session: &mut Session,
        catalogue_category_ids: &[Id],
        property: &ims_items::StoredProperty,
    ) -> Result<Vec<Id>> {
        let all = self.collection.all_in_session(session).await?;
        let mut touched = Vec::new();
        for mut item in all {
            if !catalogue_category_ids.contains(&item.catalogue_category_id) {
                continue;
            }
            let id = item.id.expect("stored catalogue item always has an id");
            item.properties.push(property.clone());
            self.collection.replace(session, id, &item).await?;
            touched.push(id);
        }
        Ok(touched)
    }

    /// Overwrites `name` on every stored property matching `property_id`
    /// (propagation engine step D.2), returning the touched catalogue item
    /// ids so the caller can cascade the same rename into items.
    pub async fn rename_property(
        &self,
        session: &mut Session,
        property_id: Id,
        new_name: &str,
    ) -> Result<Vec<Id>> {
        let all = self.collection.all_in_session(session).await?;
        let mut touched = Vec::new();
        for mut item in all {
            let mut changed = false;
            for prop in item.properties.iter_mut() {
                if prop.id == property_id {
                    prop.name = new_name.to_string();
                    changed = true;
                }
            }
            if changed {
                let id = item.id.expect("stored catalogue item always has an id");
                self.collection.replace(session, id, &item).await?;
                touched.push(id);
            }
        }
        Ok(touched)
    }
}
