// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_items::ItemRepository;
use ims_lookups::{SimpleRepository, SparesDefinitionStore};
use ims_store::{Breadcrumbs, DbContext, ParentFilter, Session, TreeRepository};

use crate::system::System;

/// The system tree specialisation of the generic tree repository
/// (component E's tree half). Rule validation and spares recompute, which
/// need the rule/usage-status lookups as well, live in
/// [`crate::service::SystemService`]. The spares-definition store is held
/// here too, only to decide whether `change_type` needs the §4.E write lock
/// — `SystemService` remains the place spares are actually recomputed.
#[derive(Clone)]
pub struct SystemRepository {
    tree: TreeRepository<System>,
    system_types: SimpleRepository<ims_lookups::SystemType>,
    items: ItemRepository,
    spares_definition: SparesDefinitionStore,
}

impl SystemRepository {
    pub fn new(db: &DbContext) -> SystemRepository {
        SystemRepository {
            tree: TreeRepository::new(db, "systems"),
            system_types: SimpleRepository::new(db, "system_types", "system type"),
            items: ItemRepository::new(db),
            spares_definition: SparesDefinitionStore::new(db),
        }
    }

    pub async fn create(&self, session: &mut Session, system: System) -> Result<System> {
        if self.system_types.get_in_session(session, system.type_id).await?.is_none() {
            return Err(CoreError::missing("system type", system.type_id));
        }
        if let Some(parent_id) = system.parent_id {
            let Some(parent) = self.tree.get_in_session(session, parent_id).await? else {
                return Err(CoreError::missing("system", parent_id));
            };
            if parent.type_id != system.type_id {
                return Err(CoreError::InvalidAction(
                    "a system must share its parent's system type".to_string(),
                ));
            }
        }
        self.tree.create(session, system).await
    }

    pub async fn get(&self, id: Id) -> Result<Option<System>> {
        self.tree.get(id).await
    }

    /// `get`, but participating in `session`'s transaction.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<System>> {
        self.tree.get_in_session(session, id).await
    }

    pub async fn list(&self, filter: ParentFilter) -> Result<Vec<System>> {
        self.tree.list(filter).await
    }

    pub async fn breadcrumbs(&self, id: Id) -> Result<Option<Breadcrumbs>> {
        self.tree.breadcrumbs(id).await
    }

    pub async fn has_direct_children(&self, id: Id) -> Result<bool> {
        self.tree.has_direct_children(id).await
    }

    /// Renames a system, regenerating `code` (same pattern as
    /// `ims_catalog::CategoryRepository::rename`).
    pub async fn rename(&self, session: &mut Session, id: Id, new_name: String) -> Result<System> {
        let code = ims_ids::slugify(&new_name);
        self.tree
            .update(session, id, move |system| {
                system.name = new_name;
                system.code = code;
            })
            .await
    }

    /// Changes `type_id`, refusing if the system has any direct child
    /// systems or items (it must be a leaf of the deployment tree to
    /// reclassify), and requiring the new type to be consistent with
    /// whichever parent the system currently has.
    ///
    /// Per spec §4.E, a write lock is acquired on `id` first when a spares
    /// definition is configured, `type_id` is actually changing, and
    /// `parent_id` is null — `change_type` never touches `parent_id` itself,
    /// so "current or new parent_id" collapse to the one value this system
    /// already has. A null `parent_id` is the case where this system could
    /// newly become (or stop being) a root-level spares-eligible node, which
    /// a concurrent sibling read must not observe half-applied.
    pub async fn change_type(&self, session: &mut Session, id: Id, new_type_id: Id) -> Result<System> {
        let Some(system) = self.tree.get_in_session(session, id).await? else {
            return Err(CoreError::missing("system", id));
        };
        let type_is_changing = system.type_id != new_type_id;
        if type_is_changing && system.parent_id.is_none() && self.spares_definition.get().await?.is_some() {
            self.write_lock(session, id).await?;
        }
        if self.tree.has_direct_children_in_session(session, id).await?
            || !self.items.list_by_system_in_session(session, id).await?.is_empty()
        {
            return Err(CoreError::ChildElementsExist("system".to_string()));
        }
        if self.system_types.get_in_session(session, new_type_id).await?.is_none() {
            return Err(CoreError::missing("system type", new_type_id));
        }
        if let Some(parent_id) = system.parent_id {
            let parent = self
                .tree
                .get_in_session(session, parent_id)
                .await?
                .ok_or_else(|| CoreError::database_integrity("system's parent vanished"))?;
            if parent.type_id != new_type_id {
                return Err(CoreError::InvalidAction(
                    "a system must share its parent's system type".to_string(),
                ));
            }
        }
        self.tree
            .update(session, id, move |system| system.type_id = new_type_id)
            .await
    }

    /// Moves a system under `new_parent_id` (or to the root), requiring the
    /// new parent (if any) to share the system's current type, and running
    /// the generic tree's cycle check.
    pub async fn r#move(&self, session: &mut Session, id: Id, new_parent_id: Option<Id>) -> Result<System> {
        let Some(system) = self.tree.get_in_session(session, id).await? else {
            return Err(CoreError::missing("system", id));
        };
        if let Some(parent_id) = new_parent_id {
            let Some(parent) = self.tree.get_in_session(session, parent_id).await? else {
                return Err(CoreError::missing("system", parent_id));
            };
            if parent.type_id != system.type_id {
                return Err(CoreError::InvalidAction(
                    "a system must share its parent's system type".to_string(),
                ));
            }
        }
        self.tree
            .update(session, id, move |system| system.parent_id = new_parent_id)
            .await
    }

    /// Refuses deletion while child systems or items exist. The outbound
    /// object-storage cleanup is invoked by
    /// [`crate::service::SystemService::delete_system`] after this commits.
    pub async fn delete(&self, session: &mut Session, id: Id) -> Result<()> {
        if self.tree.has_direct_children_in_session(session, id).await?
            || !self.items.list_by_system_in_session(session, id).await?.is_empty()
        {
            return Err(CoreError::ChildElementsExist("system".to_string()));
        }
        self.tree.delete(session, id).await
    }

    pub async fn write_lock(&self, session: &mut Session, id: Id) -> Result<()> {
        self.tree.write_lock(session, id).await
    }
}
