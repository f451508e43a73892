// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_ids::Id;
use serde::{Deserialize, Serialize};

/// The closed set of property value types (spec §1 Non-goals: no arbitrary
/// JSON schemas). `None` on the wrapping [`StoredProperty::value`] models a
/// null, permitted only for non-mandatory properties (I6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Boolean(bool),
}

/// The declared type of a property, independent of any particular value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
}

impl PropertyValue {
    pub fn matches_type(&self, declared: PropertyType) -> bool {
        matches!(
            (self, declared),
            (PropertyValue::String(_), PropertyType::String)
                | (PropertyValue::Number(_), PropertyType::Number)
                | (PropertyValue::Boolean(_), PropertyType::Boolean)
        )
    }
}

/// One property entry as it is denormalised onto a catalogue item or item.
/// `id` is the stable join key back to the owning category's
/// `PropertyDescriptor`; `name` and `unit` are copies kept coherent by the
/// propagation engine, never edited directly by item/catalogue-item updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProperty {
    pub id: Id,
    pub name: String,
    pub unit: Option<String>,
    pub value: Option<PropertyValue>,
}
