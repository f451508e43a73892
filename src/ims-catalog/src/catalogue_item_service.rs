// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Validates a catalogue item against the references and schema it claims
//! before `CatalogueItemRepository` ever sees it — spec §3/§7 require
//! `catalogue_category_id` to resolve to a leaf category, `manufacturer_id`
//! to exist, `obsolete_replacement_catalogue_item_id` (if set) to resolve,
//! and `properties[]` to satisfy the category's declared schema (I4/I5/I6).
//! `CatalogueItemRepository` itself stays raw CRUD, the same split
//! `ims-systems::SystemService` uses between repository and rule-checking
//! service.

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_lookups::{FlatRepository, Manufacturer};
use ims_store::{DbContext, Session};

use crate::catalogue_item::CatalogueItem;
use crate::category::CatalogueCategory;
use crate::category_repository::CategoryRepository;
use crate::catalogue_item_repository::CatalogueItemRepository;
use crate::propagation::{as_supplied, PropertyPropagationEngine};

#[derive(Clone)]
pub struct CatalogueItemService {
    categories: CategoryRepository,
    catalogue_items: CatalogueItemRepository,
    manufacturers: FlatRepository<Manufacturer>,
    properties: PropertyPropagationEngine,
}

impl CatalogueItemService {
    pub fn new(db: &DbContext) -> CatalogueItemService {
        CatalogueItemService {
            categories: CategoryRepository::new(db),
            catalogue_items: CatalogueItemRepository::new(db),
            manufacturers: FlatRepository::new(db, "manufacturers", "manufacturer"),
            properties: PropertyPropagationEngine::new(db),
        }
    }

    pub fn repository(&self) -> &CatalogueItemRepository {
        &self.catalogue_items
    }

    /// Validates `item`'s references and supplied properties, then persists
    /// it. `item.properties` is treated as caller-supplied input (matched
    /// against the category schema by id or name) and replaced with the
    /// schema-authoritative, denormalised form before the insert.
    pub async fn create(&self, session: &mut Session, mut item: CatalogueItem) -> Result<CatalogueItem> {
        let category = self.require_leaf_category(session, item.catalogue_category_id).await?;
        if self
            .manufacturers
            .get_in_session(session, item.manufacturer_id)
            .await?
            .is_none()
        {
            return Err(CoreError::missing("manufacturer", item.manufacturer_id));
        }
        if let Some(replacement_id) = item.obsolete_replacement_catalogue_item_id {
            self.require_existing_catalogue_item(session, replacement_id).await?;
        }

        let supplied = as_supplied(&item.properties);
        item.properties = self
            .properties
            .validate_supplied_properties(session, &category, supplied)
            .await?;

        self.catalogue_items.create(session, item).await
    }

    /// Re-validates `item`'s references and supplied properties against
    /// its current (possibly changed) category, then persists it in place.
    pub async fn update(&self, session: &mut Session, mut item: CatalogueItem) -> Result<CatalogueItem> {
        let id = item.id.ok_or_else(|| CoreError::database_integrity("update requires an id"))?;
        let category = self.require_leaf_category(session, item.catalogue_category_id).await?;
        if self
            .manufacturers
            .get_in_session(session, item.manufacturer_id)
            .await?
            .is_none()
        {
            return Err(CoreError::missing("manufacturer", item.manufacturer_id));
        }
        if let Some(replacement_id) = item.obsolete_replacement_catalogue_item_id {
            if replacement_id == id {
                return Err(CoreError::InvalidAction(
                    "a catalogue item cannot be its own obsolete replacement".to_string(),
                ));
            }
            self.require_existing_catalogue_item(session, replacement_id).await?;
        }

        let supplied = as_supplied(&item.properties);
        item.properties = self
            .properties
            .validate_supplied_properties(session, &category, supplied)
            .await?;

        self.catalogue_items.update(session, id, move |stored| *stored = item).await
    }

    async fn require_leaf_category(&self, session: &mut Session, id: Id) -> Result<CatalogueCategory> {
        let Some(category) = self.categories.get_in_session(session, id).await? else {
            return Err(CoreError::missing("catalogue category", id));
        };
        if !category.is_leaf {
            return Err(CoreError::InvalidAction(
                "a catalogue item must be classified under a leaf category".to_string(),
            ));
        }
        Ok(category)
    }

    async fn require_existing_catalogue_item(&self, session: &mut Session, id: Id) -> Result<()> {
        if self.catalogue_items.get_in_session(session, id).await?.is_none() {
            return Err(CoreError::missing("catalogue item", id));
        }
        Ok(())
    }
}
