// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use std::collections::HashSet;

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_lookups::{FlatRepository, Unit};
use ims_store::{Breadcrumbs, DbContext, ParentFilter, Session, TreeRepository};

use crate::category::CatalogueCategory;
use crate::catalogue_item_repository::CatalogueItemRepository;

/// The catalogue-category engine (component C): a [`TreeRepository`]
/// specialised with leaf/non-leaf invariants and per-leaf property
/// schemas. Property-schema *edits* (add/rename/modify-allowed-values) are
/// delegated to [`crate::propagation`]; this repository only validates the
/// schema supplied at `create` time and the leaf/non-leaf/parent rules.
#[derive(Clone)]
pub struct CategoryRepository {
    tree: TreeRepository<CatalogueCategory>,
    units: FlatRepository<Unit>,
    catalogue_items: CatalogueItemRepository,
}

impl CategoryRepository {
    pub fn new(db: &DbContext) -> CategoryRepository {
        CategoryRepository {
            tree: TreeRepository::new(db, "catalogue_categories"),
            units: FlatRepository::new(db, "units", "unit"),
            catalogue_items: CatalogueItemRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        session: &mut Session,
        category: CatalogueCategory,
    ) -> Result<CatalogueCategory> {
        if let Some(parent_id) = category.parent_id {
            let Some(parent) = self.tree.get_in_session(session, parent_id).await? else {
                return Err(CoreError::missing("catalogue category", parent_id));
            };
            if parent.is_leaf {
                return Err(CoreError::LeafParent);
            }
        }

        if !category.is_leaf && !category.properties.is_empty() {
            return Err(CoreError::InvalidAction(
                "a non-leaf category cannot declare properties".to_string(),
            ));
        }

        self.validate_schema_names(&category.properties)?;
        for property in &category.properties {
            if let Some(unit_id) = property.unit_id {
                if self.units.get_in_session(session, unit_id).await?.is_none() {
                    return Err(CoreError::missing("unit", unit_id));
                }
            }
        }

        self.tree.create(session, category).await
    }

    pub async fn get(&self, id: Id) -> Result<Option<CatalogueCategory>> {
        self.tree.get(id).await
    }

    /// `get`, but participating in `session`'s transaction.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<CatalogueCategory>> {
        self.tree.get_in_session(session, id).await
    }

    pub async fn list(&self, filter: ParentFilter) -> Result<Vec<CatalogueCategory>> {
        self.tree.list(filter).await
    }

    pub async fn breadcrumbs(&self, id: Id) -> Result<Option<Breadcrumbs>> {
        self.tree.breadcrumbs(id).await
    }

    /// Renames a category: regenerates `code` from the new name and
    /// re-checks sibling uniqueness (delegated to the generic tree's
    /// `update`, which detects the code change automatically).
    pub async fn rename(&self, session: &mut Session, id: Id, new_name: String) -> Result<CatalogueCategory> {
        let code = ims_ids::slugify(&new_name);
        self.tree
            .update(session, id, move |category| {
                category.name = new_name;
                category.code = code;
            })
            .await
    }

    /// Moves `id` under `new_parent_id` (or to the root if `None`), subject
    /// to the leaf-parent and cycle checks.
    pub async fn r#move(
        &self,
        session: &mut Session,
        id: Id,
        new_parent_id: Option<Id>,
    ) -> Result<CatalogueCategory> {
        if let Some(parent_id) = new_parent_id {
            let Some(parent) = self.tree.get_in_session(session, parent_id).await? else {
                return Err(CoreError::missing("catalogue category", parent_id));
            };
            if parent.is_leaf {
                return Err(CoreError::LeafParent);
            }
        }
        self.tree
            .update(session, id, move |category| category.parent_id = new_parent_id)
            .await
    }

    /// Flips `is_leaf`, refusing while the category has child categories
    /// (if becoming a leaf) or catalogue items (if becoming non-leaf) — I3.
    pub async fn set_is_leaf(&self, session: &mut Session, id: Id, is_leaf: bool) -> Result<CatalogueCategory> {
        let Some(current) = self.tree.get_in_session(session, id).await? else {
            return Err(CoreError::missing("catalogue category", id));
        };
        if current.is_leaf == is_leaf {
            return Ok(current);
        }
        if self.tree.has_direct_children_in_session(session, id).await? {
            return Err(CoreError::ChildElementsExist("catalogue category".to_string()));
        }
        if !self
            .catalogue_items
            .list_by_category_in_session(session, id)
            .await?
            .is_empty()
        {
            return Err(CoreError::ChildElementsExist("catalogue category".to_string()));
        }
        self.tree
            .update(session, id, move |category| {
                category.is_leaf = is_leaf;
                if !is_leaf {
                    category.properties.clear();
                }
            })
            .await
    }

    pub async fn delete(&self, session: &mut Session, id: Id) -> Result<()> {
        if !self
            .catalogue_items
            .list_by_category_in_session(session, id)
            .await?
            .is_empty()
        {
            return Err(CoreError::ChildElementsExist("catalogue category".to_string()));
        }
        self.tree.delete(session, id).await
    }

    pub async fn add_property_descriptor(
        &self,
        session: &mut Session,
        id: Id,
        descriptor: crate::category::PropertyDescriptor,
    ) -> Result<CatalogueCategory> {
        self.tree
            .update(session, id, move |category| category.properties.push(descriptor))
            .await
    }

    pub async fn rename_property_descriptor(
        &self,
        session: &mut Session,
        id: Id,
        property_id: Id,
        new_name: String,
    ) -> Result<CatalogueCategory> {
        self.tree
            .update(session, id, move |category| {
                if let Some(property) = category.properties.iter_mut().find(|p| p.id == property_id) {
                    property.name = new_name;
                }
            })
            .await
    }

    pub async fn set_allowed_values_descriptor(
        &self,
        session: &mut Session,
        id: Id,
        property_id: Id,
        allowed_values: crate::category::AllowedValues,
    ) -> Result<CatalogueCategory> {
        self.tree
            .update(session, id, move |category| {
                if let Some(property) = category.properties.iter_mut().find(|p| p.id == property_id) {
                    property.allowed_values = Some(allowed_values);
                }
            })
            .await
    }

    fn validate_schema_names(&self, properties: &[crate::category::PropertyDescriptor]) -> Result<()> {
        let mut seen = HashSet::new();
        for property in properties {
            if !seen.insert(property.name.as_str()) {
                return Err(CoreError::DuplicatePropertyName(property.name.clone()));
            }
        }
        Ok(())
    }
}
