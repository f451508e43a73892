// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Orchestrates item lifecycle operations that need more than one
//! repository: rule validation against the system-type/usage-status the
//! item is entering or leaving, and spares recomputation for the affected
//! catalogue item. This is the glue spec §4.E describes but does not
//! assign to a single repository, since it spans `ims-items`,
//! `ims-catalog`, and `ims-lookups`.

use ims_catalog::{as_supplied, CatalogueItemRepository, CategoryRepository, PropertyPropagationEngine};
use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_items::{Item, ItemRepository};
use ims_lookups::SparesDefinitionStore;
use ims_object_storage::ObjectStorageClient;
use ims_store::{DbContext, Session};

use crate::rules::RuleValidator;
use crate::system::System;
use crate::system_repository::SystemRepository;

#[derive(Clone)]
pub struct SystemService {
    systems: SystemRepository,
    items: ItemRepository,
    catalogue_items: CatalogueItemRepository,
    categories: CategoryRepository,
    properties: PropertyPropagationEngine,
    rules: RuleValidator,
    spares_definition: SparesDefinitionStore,
    object_storage: Option<ObjectStorageClient>,
}

impl SystemService {
    pub fn new(db: &DbContext, object_storage: Option<ObjectStorageClient>) -> SystemService {
        SystemService {
            systems: SystemRepository::new(db),
            items: ItemRepository::new(db),
            catalogue_items: CatalogueItemRepository::new(db),
            categories: CategoryRepository::new(db),
            properties: PropertyPropagationEngine::new(db),
            rules: RuleValidator::new(db),
            spares_definition: SparesDefinitionStore::new(db),
            object_storage,
        }
    }

    pub fn systems(&self) -> &SystemRepository {
        &self.systems
    }

    /// Deletes a system and, once that commits, best-effort deletes its
    /// attachments and images. A remote failure is surfaced to the caller
    /// but does not and cannot roll back the already-committed deletion
    /// (spec §9 design notes, Open Question 3).
    pub async fn delete_system(&self, session: &mut Session, id: Id) -> Result<()> {
        self.systems.delete(session, id).await?;
        session.commit_transaction().await?;
        if let Some(client) = &self.object_storage {
            client.delete_entity_attachments(id).await?;
        }
        Ok(())
    }

    /// Creates an item, validating the creation rule for its destination
    /// system's type and usage status and its supplied properties against
    /// its catalogue item's category schema, then recomputing spares for
    /// that catalogue item if a spares definition is configured.
    pub async fn create_item(&self, session: &mut Session, mut item: Item) -> Result<Item> {
        let system = self.require_system_in_session(session, item.system_id).await?;
        self.rules
            .check_creation(session, system.type_id, item.usage_status_id)
            .await?;
        item.properties = self.revalidate_properties(session, &item).await?;

        let created = self.items.create(session, item).await?;
        self.recompute_spares(session, created.catalogue_item_id).await?;
        Ok(created)
    }

    /// Moves an item to `new_system_id`, validating the move rule when the
    /// destination system has a different type, then recomputing spares.
    pub async fn move_item(&self, session: &mut Session, item_id: Id, new_system_id: Id) -> Result<Item> {
        let Some(item) = self.items.get_in_session(session, item_id).await? else {
            return Err(CoreError::missing("item", item_id));
        };
        let old_system = self.require_system_in_session(session, item.system_id).await?;
        let new_system = self.require_system_in_session(session, new_system_id).await?;
        self.rules
            .check_move(session, old_system.type_id, new_system.type_id, item.usage_status_id)
            .await?;

        let updated = self
            .items
            .update(session, item_id, move |item| item.system_id = new_system_id)
            .await?;
        self.recompute_spares(session, updated.catalogue_item_id).await?;
        Ok(updated)
    }

    /// Changes an item's usage status, recomputing spares for its catalogue
    /// item afterwards (the status change itself carries no rule
    /// constraint beyond what creation/move already validated).
    pub async fn change_item_usage_status(
        &self,
        session: &mut Session,
        item_id: Id,
        new_usage_status_id: Id,
    ) -> Result<Item> {
        let updated = self
            .items
            .update(session, item_id, move |item| item.usage_status_id = new_usage_status_id)
            .await?;
        self.recompute_spares(session, updated.catalogue_item_id).await?;
        Ok(updated)
    }

    /// Deletes an item, validating the deletion rule for its current
    /// system's type, then recomputing spares for the catalogue item it
    /// left behind.
    pub async fn delete_item(&self, session: &mut Session, item_id: Id) -> Result<()> {
        let Some(item) = self.items.get_in_session(session, item_id).await? else {
            return Err(CoreError::missing("item", item_id));
        };
        let system = self.require_system_in_session(session, item.system_id).await?;
        self.rules.check_deletion(session, system.type_id).await?;

        self.items.delete(session, item_id).await?;
        self.recompute_spares(session, item.catalogue_item_id).await?;
        Ok(())
    }

    /// Recomputes `number_of_spares` for one catalogue item under
    /// write-lock, a no-op when no spares definition is configured (spec
    /// §4.E). The lock is acquired before the dependent item data is read,
    /// per spec §5.
    async fn recompute_spares(&self, session: &mut Session, catalogue_item_id: Id) -> Result<()> {
        let Some(definition) = self.spares_definition.get().await? else {
            return Ok(());
        };
        self.catalogue_items.write_lock(session, catalogue_item_id).await?;

        let items = self
            .items
            .list_by_catalogue_item_in_session(session, catalogue_item_id)
            .await?;
        let count = items
            .iter()
            .filter(|item| definition.counts_as_spare(item.usage_status_id))
            .count() as u64;

        self.catalogue_items
            .set_number_of_spares(session, catalogue_item_id, count)
            .await
    }

    async fn require_system_in_session(&self, session: &mut Session, id: Id) -> Result<System> {
        self.systems
            .get_in_session(session, id)
            .await?
            .ok_or_else(|| CoreError::missing("system", id))
    }

    /// Resolves `item.catalogue_item_id` and re-derives `item.properties`
    /// against that catalogue item's category schema, the item-side
    /// counterpart of `ims_catalog::CatalogueItemService`'s validation.
    async fn revalidate_properties(&self, session: &mut Session, item: &Item) -> Result<Vec<ims_items::StoredProperty>> {
        let Some(catalogue_item) = self
            .catalogue_items
            .get_in_session(session, item.catalogue_item_id)
            .await?
        else {
            return Err(CoreError::missing("catalogue item", item.catalogue_item_id));
        };
        let Some(category) = self
            .categories
            .get_in_session(session, catalogue_item.catalogue_category_id)
            .await?
        else {
            return Err(CoreError::missing("catalogue category", catalogue_item.catalogue_category_id));
        };
        let supplied = as_supplied(&item.properties);
        self.properties
            .validate_supplied_properties(session, &category, supplied)
            .await
    }
}
