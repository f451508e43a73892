// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use chrono::NaiveDate;
use ims_ids::Id;
use serde::{Deserialize, Serialize};

use crate::property::StoredProperty;

/// A physical instance of a catalogue item, located within a system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub catalogue_item_id: Id,
    pub system_id: Id,
    pub usage_status_id: Id,
    pub is_defective: bool,
    pub serial_number: Option<String>,
    pub warranty_end_date: Option<NaiveDate>,
    pub properties: Vec<StoredProperty>,
}

impl Item {
    pub fn new(catalogue_item_id: Id, system_id: Id, usage_status_id: Id) -> Item {
        Item {
            id: None,
            catalogue_item_id,
            system_id,
            usage_status_id,
            is_defective: false,
            serial_number: None,
            warranty_end_date: None,
            properties: Vec::new(),
        }
    }
}
