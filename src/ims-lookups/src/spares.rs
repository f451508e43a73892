// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_errors::Result;
use ims_ids::Id;
use ims_store::DbContext;
use serde::{Deserialize, Serialize};

const SPARES_DEFINITION_KEY: &str = "spares_definition";

/// The set of usage statuses that cause an item to be counted as a spare.
/// Administered as a singleton document rather than a collection, per
/// spec §6.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparesDefinition {
    pub usage_statuses: Vec<Id>,
}

impl SparesDefinition {
    pub fn counts_as_spare(&self, usage_status_id: Id) -> bool {
        self.usage_statuses.contains(&usage_status_id)
    }
}

#[derive(Clone)]
pub struct SparesDefinitionStore {
    db: DbContext,
}

impl SparesDefinitionStore {
    pub fn new(db: &DbContext) -> SparesDefinitionStore {
        SparesDefinitionStore { db: db.clone() }
    }

    /// `None` means spares recompute is unconfigured, i.e. disabled (spec
    /// §4.E: recompute only runs "when a spares definition is configured").
    pub async fn get(&self) -> Result<Option<SparesDefinition>> {
        self.db.settings().get(SPARES_DEFINITION_KEY).await
    }

    pub async fn put(&self, definition: &SparesDefinition) -> Result<()> {
        self.db.settings().put(SPARES_DEFINITION_KEY, definition).await
    }
}
