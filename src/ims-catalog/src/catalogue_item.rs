// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_ids::Id;
use ims_items::StoredProperty;
use serde::{Deserialize, Serialize};

/// An abstract item model living under a leaf category. `number_of_spares`
/// is derived state (I10), recomputed by the system engine whenever an
/// item's usage status, system, or existence changes — this crate never
/// writes it directly except through [`crate::catalogue_item::CatalogueItemRepository::set_number_of_spares`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub catalogue_category_id: Id,
    pub manufacturer_id: Id,
    pub name: String,
    pub description: Option<String>,
    pub cost_gbp: f64,
    pub days_to_replace: u32,
    pub obsolete: bool,
    pub obsolete_replacement_catalogue_item_id: Option<Id>,
    pub properties: Vec<StoredProperty>,
    pub number_of_spares: Option<u64>,
}

impl CatalogueItem {
    pub fn new(
        catalogue_category_id: Id,
        manufacturer_id: Id,
        name: impl Into<String>,
        cost_gbp: f64,
        days_to_replace: u32,
    ) -> CatalogueItem {
        CatalogueItem {
            id: None,
            catalogue_category_id,
            manufacturer_id,
            name: name.into(),
            description: None,
            cost_gbp,
            days_to_replace,
            obsolete: false,
            obsolete_replacement_catalogue_item_id: None,
            properties: Vec::new(),
            number_of_spares: None,
        }
    }
}
