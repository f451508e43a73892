// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Process wiring: loads [`config::Settings`], installs tracing, and
//! composes every engine crate into a single [`Core`] handle. This is the
//! only crate in the workspace that is allowed to know about all the
//! others — `ims-catalog`, `ims-systems`, and `ims-lookups` never depend on
//! each other's wiring, only on the repositories they each need.

pub mod config;
pub mod telemetry;

use std::time::Duration;

use ims_catalog::{CatalogueItemService, CategoryRepository, PropertyPropagationEngine};
use ims_errors::Result;
use ims_lookups::{FlatRepository, Manufacturer, SimpleRepository, SparesDefinitionStore, Unit, UsageStatus};
use ims_object_storage::{AuthTokenSource, ObjectStorageClient, ObjectStorageConfig};
use ims_store::DbContext;
use ims_systems::SystemService;

use crate::config::Settings;

/// The composed core: one instance per process, created at startup and
/// torn down at shutdown (spec §9 "global mutable state").
#[derive(Clone)]
pub struct Core {
    pub db: DbContext,
    pub categories: CategoryRepository,
    pub properties: PropertyPropagationEngine,
    pub catalogue_items: CatalogueItemService,
    pub systems: SystemService,
    pub units: FlatRepository<Unit>,
    pub usage_statuses: FlatRepository<UsageStatus>,
    pub manufacturers: FlatRepository<Manufacturer>,
    pub system_types: SimpleRepository<ims_lookups::SystemType>,
    pub rules: SimpleRepository<ims_lookups::Rule>,
    pub spares_definition: SparesDefinitionStore,
}

impl Core {
    pub async fn connect(settings: &Settings) -> Result<Core> {
        let db = DbContext::connect(&settings.database.uri, &settings.database.name).await?;
        Ok(Core::wire(db, settings))
    }

    /// An in-memory core for tests: every repository runs against
    /// [`DbContext::memory`] instead of a live `mongod`.
    pub fn memory(settings: &Settings) -> Core {
        Core::wire(DbContext::memory(), settings)
    }

    fn wire(db: DbContext, settings: &Settings) -> Core {
        let object_storage = settings.object_storage.enabled.then(|| {
            ObjectStorageClient::new(ObjectStorageConfig {
                enabled: settings.object_storage.enabled,
                base_url: settings.object_storage.url.clone(),
                request_timeout: Duration::from_secs(settings.object_storage.request_timeout_seconds),
                auth_token_source: AuthTokenSource::Static(settings.object_storage.auth_token_source.clone()),
            })
        });

        Core {
            categories: CategoryRepository::new(&db),
            properties: PropertyPropagationEngine::new(&db),
            catalogue_items: CatalogueItemService::new(&db),
            systems: SystemService::new(&db, object_storage),
            units: FlatRepository::new(&db, "units", "unit"),
            usage_statuses: FlatRepository::new(&db, "usage_statuses", "usage status"),
            manufacturers: FlatRepository::new(&db, "manufacturers", "manufacturer"),
            system_types: SimpleRepository::new(&db, "system_types", "system type"),
            rules: SimpleRepository::new(&db, "rules", "rule"),
            spares_definition: SparesDefinitionStore::new(&db),
            db,
        }
    }
}
