// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_ids::Id;
use ims_items::{PropertyType, PropertyValue};
use ims_store::TreeNode;
use serde::{Deserialize, Serialize};

/// The set of values a property may take, when constrained. Spec §1
/// Non-goals close the type set to `string`/`number`/`boolean` and the only
/// constraint kind is a `list` of allowed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AllowedValues {
    List { values: Vec<PropertyValue> },
}

/// A single property a leaf category's items and catalogue items must
/// carry. `id` is the stable join key the propagation engine uses to
/// correlate this descriptor with every denormalised copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub id: Id,
    pub name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub unit_id: Option<Id>,
    pub mandatory: bool,
    pub allowed_values: Option<AllowedValues>,
}

/// A node in the catalogue-category tree. Only leaves (`is_leaf = true`)
/// own a property schema (I2); an item can only be classified under a
/// leaf (I3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueCategory {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub parent_id: Option<Id>,
    pub name: String,
    pub code: String,
    pub is_leaf: bool,
    pub properties: Vec<PropertyDescriptor>,
}

impl CatalogueCategory {
    pub fn new(name: impl Into<String>, parent_id: Option<Id>, is_leaf: bool) -> CatalogueCategory {
        let name = name.into();
        CatalogueCategory {
            id: None,
            code: ims_ids::slugify(&name),
            name,
            parent_id,
            is_leaf,
            properties: Vec::new(),
        }
    }

    pub fn find_property(&self, property_id: Id) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.id == property_id)
    }

    pub fn has_property_named(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }
}

impl TreeNode for CatalogueCategory {
    fn id(&self) -> Option<Id> {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }
    fn parent_id(&self) -> Option<Id> {
        self.parent_id
    }
    fn set_parent_id(&mut self, parent_id: Option<Id>) {
        self.parent_id = parent_id;
    }
    fn code(&self) -> &str {
        &self.code
    }
    fn set_code(&mut self, code: String) {
        self.code = code;
    }
    fn name(&self) -> &str {
        &self.name
    }
}
