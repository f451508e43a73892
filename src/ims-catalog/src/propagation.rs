// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The property propagation engine (component D): the workspace's hardest
//! subsystem. Guarantees that every catalogue item and item under a
//! category carries a consistent, denormalised view of the category's
//! property schema. Every public method here runs its cascade inside the
//! caller's `session` — callers are expected to have already called
//! `session.start_transaction()` and to commit or abort it themselves, per
//! spec §5.

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_items::{ItemRepository, PropertyType, PropertyValue, StoredProperty};
use ims_lookups::{FlatRepository, Unit};
use ims_store::{DbContext, Session};

use crate::catalogue_item_repository::CatalogueItemRepository;
use crate::category::{AllowedValues, CatalogueCategory, PropertyDescriptor};
use crate::category_repository::CategoryRepository;

/// The input to [`PropertyPropagationEngine::add_property`]: everything
/// about a new property except its id, which is minted when it is born.
pub struct NewProperty {
    pub name: String,
    pub property_type: PropertyType,
    pub unit_id: Option<Id>,
    pub mandatory: bool,
    pub allowed_values: Option<AllowedValues>,
    pub default_value: Option<PropertyValue>,
}

/// A property value supplied by a caller creating or updating a catalogue
/// item or item. Matched against the category's declared schema by `id`
/// when present, else by `name`.
#[derive(Debug, Clone)]
pub struct SuppliedProperty {
    pub id: Option<Id>,
    pub name: Option<String>,
    pub value: Option<PropertyValue>,
}

#[derive(Clone)]
pub struct PropertyPropagationEngine {
    categories: CategoryRepository,
    catalogue_items: CatalogueItemRepository,
    items: ItemRepository,
    units: FlatRepository<Unit>,
}

impl PropertyPropagationEngine {
    pub fn new(db: &DbContext) -> PropertyPropagationEngine {
        PropertyPropagationEngine {
            categories: CategoryRepository::new(db),
            catalogue_items: CatalogueItemRepository::new(db),
            items: ItemRepository::new(db),
            units: FlatRepository::new(db, "units", "unit"),
        }
    }

    /// Operation 1: add a property to a leaf category, cascading a default
    /// value into every catalogue item and item already classified under
    /// it.
    pub async fn add_property(
        &self,
        session: &mut Session,
        category_id: Id,
        new_property: NewProperty,
    ) -> Result<CatalogueCategory> {
        let Some(category) = self.categories.get_in_session(session, category_id).await? else {
            return Err(CoreError::missing("catalogue category", category_id));
        };
        if !category.is_leaf {
            return Err(CoreError::InvalidAction(
                "properties can only be added to a leaf category".to_string(),
            ));
        }
        if category.has_property_named(&new_property.name) {
            return Err(CoreError::DuplicatePropertyName(new_property.name));
        }
        if let Some(unit_id) = new_property.unit_id {
            if self.units.get_in_session(session, unit_id).await?.is_none() {
                return Err(CoreError::missing("unit", unit_id));
            }
        }
        if new_property.mandatory {
            match &new_property.default_value {
                None => {
                    return Err(CoreError::InvalidAction(
                        "a mandatory property requires a default value".to_string(),
                    ))
                }
                Some(value) => {
                    check_value_against_descriptor(
                        value,
                        new_property.property_type,
                        new_property.allowed_values.as_ref(),
                    )?;
                }
            }
        }

        let property_id = Id::new();
        let unit_label = resolve_unit_label(&self.units, session, new_property.unit_id).await?;

        let descriptor = PropertyDescriptor {
            id: property_id,
            name: new_property.name.clone(),
            property_type: new_property.property_type,
            unit_id: new_property.unit_id,
            mandatory: new_property.mandatory,
            allowed_values: new_property.allowed_values,
        };
        let category = self
            .categories
            .add_property_descriptor(session, category_id, descriptor)
            .await?;

        let stored = StoredProperty {
            id: property_id,
            name: new_property.name,
            unit: unit_label,
            value: new_property.default_value,
        };
        let touched_catalogue_items = self
            .catalogue_items
            .append_property_for_categories(session, &[category_id], &stored)
            .await?;
        self.items
            .append_property_for_catalogue_items(session, &touched_catalogue_items, &stored)
            .await?;

        Ok(category)
    }

    /// Operation 2: rename a property descriptor, cascading the new name
    /// into every catalogue item and item carrying it.
    pub async fn rename_property(
        &self,
        session: &mut Session,
        category_id: Id,
        property_id: Id,
        new_name: String,
    ) -> Result<CatalogueCategory> {
        let Some(category) = self.categories.get_in_session(session, category_id).await? else {
            return Err(CoreError::missing("catalogue category", category_id));
        };
        if category.find_property(property_id).is_none() {
            return Err(CoreError::missing("property", property_id));
        }
        if category
            .properties
            .iter()
            .any(|p| p.id != property_id && p.name == new_name)
        {
            return Err(CoreError::DuplicatePropertyName(new_name));
        }

        let category = self
            .categories
            .rename_property_descriptor(session, category_id, property_id, new_name.clone())
            .await?;

        self.catalogue_items
            .rename_property(session, property_id, &new_name)
            .await?;
        self.items.rename_property(session, property_id, &new_name).await?;

        Ok(category)
    }

    /// Operation 3: extend a `list`-constrained property's allowed values.
    /// Any change other than a pure superset extension is rejected; no
    /// cascade is required since already-stored values remain valid by
    /// construction.
    pub async fn extend_allowed_values(
        &self,
        session: &mut Session,
        category_id: Id,
        property_id: Id,
        new_values: Vec<PropertyValue>,
    ) -> Result<CatalogueCategory> {
        let Some(category) = self.categories.get_in_session(session, category_id).await? else {
            return Err(CoreError::missing("catalogue category", category_id));
        };
        let Some(property) = category.find_property(property_id) else {
            return Err(CoreError::missing("property", property_id));
        };
        let Some(AllowedValues::List { values: old_values }) = &property.allowed_values else {
            return Err(CoreError::InvalidAction(
                "cannot introduce allowed values on an existing property".to_string(),
            ));
        };
        if old_values.len() > new_values.len() || !old_values.iter().all(|v| new_values.contains(v)) {
            return Err(CoreError::InvalidAction(
                "allowed values may only be extended, not removed or modified".to_string(),
            ));
        }

        self.categories
            .set_allowed_values_descriptor(
                session,
                category_id,
                property_id,
                AllowedValues::List { values: new_values },
            )
            .await
    }

    /// Operation 4: validate a caller-supplied property list against a
    /// category's declared schema, producing the authoritative stored
    /// representation. Used by catalogue-item and item create/update.
    pub async fn validate_supplied_properties(
        &self,
        session: &mut Session,
        category: &CatalogueCategory,
        supplied: Vec<SuppliedProperty>,
    ) -> Result<Vec<StoredProperty>> {
        let mut result = Vec::with_capacity(category.properties.len());
        for declared in &category.properties {
            let entry = supplied.iter().find(|s| {
                s.id == Some(declared.id) || s.name.as_deref() == Some(declared.name.as_str())
            });
            let value = entry.and_then(|e| e.value.clone());

            if declared.mandatory && value.is_none() {
                return Err(CoreError::MissingMandatoryProperty(declared.name.clone()));
            }
            if let Some(value) = &value {
                check_value_against_descriptor(value, declared.property_type, declared.allowed_values.as_ref())?;
            }

            let unit_label = resolve_unit_label(&self.units, session, declared.unit_id).await?;
            result.push(StoredProperty {
                id: declared.id,
                name: declared.name.clone(),
                unit: unit_label,
                value,
            });
        }
        Ok(result)
    }
}

/// Converts already-stored properties back into the caller-supplied shape
/// [`PropertyPropagationEngine::validate_supplied_properties`] expects, so a
/// catalogue item or item handed to a create/update call can be re-validated
/// against its category's current schema without a second input shape.
pub fn as_supplied(properties: &[StoredProperty]) -> Vec<SuppliedProperty> {
    properties
        .iter()
        .map(|p| SuppliedProperty {
            id: Some(p.id),
            name: Some(p.name.clone()),
            value: p.value.clone(),
        })
        .collect()
}

async fn resolve_unit_label(
    units: &FlatRepository<Unit>,
    session: &mut Session,
    unit_id: Option<Id>,
) -> Result<Option<String>> {
    match unit_id {
        None => Ok(None),
        Some(unit_id) => match units.get_in_session(session, unit_id).await? {
            Some(unit) => Ok(Some(unit.value)),
            None => Err(CoreError::missing("unit", unit_id)),
        },
    }
}

fn check_value_against_descriptor(
    value: &PropertyValue,
    property_type: PropertyType,
    allowed_values: Option<&AllowedValues>,
) -> Result<()> {
    if !value.matches_type(property_type) {
        return Err(CoreError::InvalidPropertyType(format!("{value:?}")));
    }
    if let Some(AllowedValues::List { values }) = allowed_values {
        if !values.contains(value) {
            return Err(CoreError::InvalidPropertyType(format!(
                "{value:?} is not an allowed value"
            )));
        }
    }
    Ok(())
}
