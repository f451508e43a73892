// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_ids::Id;
use ims_store::TreeNode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
}

/// A node in the deployment-location tree. Unlike [`ims_catalog::CatalogueCategory`]
/// systems do not distinguish leaves: any system may have both child
/// systems and items placed directly within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub parent_id: Option<Id>,
    pub name: String,
    pub code: String,
    pub type_id: Id,
    pub description: Option<String>,
    pub location: Option<String>,
    pub owner: Option<String>,
    pub importance: Importance,
}

impl System {
    pub fn new(name: impl Into<String>, parent_id: Option<Id>, type_id: Id) -> System {
        let name = name.into();
        System {
            id: None,
            code: ims_ids::slugify(&name),
            name,
            parent_id,
            type_id,
            description: None,
            location: None,
            owner: None,
            importance: Importance::Medium,
        }
    }
}

impl TreeNode for System {
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
