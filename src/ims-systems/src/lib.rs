// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The system tree and rule engine (component E): deployment-location
//! hierarchy with system-type constraints, transition-rule validation for
//! item creation/move/deletion, and spares recomputation under write-lock.

mod rules;
mod service;
mod system;
mod system_repository;

pub use rules::RuleValidator;
pub use service::SystemService;
pub use system::{Importance, System};
pub use system_repository::SystemRepository;

#[cfg(test)]
mod tests {
    use ims_catalog::{CatalogueCategory, CatalogueItem, CatalogueItemRepository, CategoryRepository};
    use ims_ids::Id;
    use ims_items::{Item, ItemRepository};
    use ims_lookups::{Rule, SimpleRepository, SparesDefinition, SparesDefinitionStore};
    use ims_store::{DbContext, Session};
    use pretty_assertions::assert_eq;

    use super::*;

    async fn leaf_category(db: &DbContext, session: &mut Session) -> Id {
        let categories = CategoryRepository::new(db);
        categories
            .create(session, CatalogueCategory::new("Fasteners", None, true))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    async fn system_type(db: &DbContext, session: &mut Session) -> Id {
        let repo: SimpleRepository<ims_lookups::SystemType> =
            SimpleRepository::new(db, "system_types", "system type");
        repo.create(session, ims_lookups::SystemType::new("Storage"))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    #[tokio::test]
    async fn create_rejects_mismatched_parent_type() {
        let db = DbContext::memory();
        let systems = SystemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        let storage = system_type(&db, &mut session).await;
        let other_type: SimpleRepository<ims_lookups::SystemType> =
            SimpleRepository::new(&db, "system_types", "system type");
        let operational = other_type
            .create(&mut session, ims_lookups::SystemType::new("Operational"))
            .await
            .unwrap()
            .id
            .unwrap();

        let root = systems
            .create(&mut session, System::new("Building A", None, storage))
            .await
            .unwrap();

        let err = systems
            .create(
                &mut session,
                System::new("Room 1", Some(root.id.unwrap()), operational),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn s2_move_cycle_rejected() {
        let db = DbContext::memory();
        let systems = SystemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();
        let storage = system_type(&db, &mut session).await;

        let a = systems
            .create(&mut session, System::new("A", None, storage))
            .await
            .unwrap();
        let b = systems
            .create(&mut session, System::new("B", Some(a.id.unwrap()), storage))
            .await
            .unwrap();
        let c = systems
            .create(&mut session, System::new("C", Some(b.id.unwrap()), storage))
            .await
            .unwrap();

        let err = systems
            .r#move(&mut session, a.id.unwrap(), Some(c.id.unwrap()))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::InvalidAction(_)));

        let a_after = systems.get(a.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(a_after.parent_id, None);
    }

    #[tokio::test]
    async fn delete_blocked_by_items() {
        let db = DbContext::memory();
        let systems = SystemRepository::new(&db);
        let items = ItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();
        let storage = system_type(&db, &mut session).await;

        let system = systems
            .create(&mut session, System::new("A", None, storage))
            .await
            .unwrap();
        items
            .create(
                &mut session,
                Item::new(Id::new(), system.id.unwrap(), Id::new()),
            )
            .await
            .unwrap();

        let err = systems.delete(&mut session, system.id.unwrap()).await.unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::ChildElementsExist(_)));
    }

    #[tokio::test]
    async fn s5_spares_recompute_on_status_change() {
        let db = DbContext::memory();
        let service = SystemService::new(&db, None);
        let systems = SystemRepository::new(&db);
        let catalogue_items = CatalogueItemRepository::new(&db);
        let usage_statuses: SimpleRepository<ims_lookups::SystemType> =
            SimpleRepository::new(&db, "usage_statuses", "usage status");
        let rules: SimpleRepository<Rule> = SimpleRepository::new(&db, "rules", "rule");
        let spares_definition = SparesDefinitionStore::new(&db);

        let mut session = db.start_session().await.unwrap();
        let storage_type = system_type(&db, &mut session).await;
        let category_id = leaf_category(&db, &mut session).await;
        let new_status = usage_statuses
            .create(&mut session, ims_lookups::SystemType::new("New"))
            .await
            .unwrap()
            .id
            .unwrap();
        let scrapped_status = usage_statuses
            .create(&mut session, ims_lookups::SystemType::new("Scrapped"))
            .await
            .unwrap()
            .id
            .unwrap();
        rules
            .create(&mut session, Rule::creation(storage_type, new_status))
            .await
            .unwrap();
        rules
            .create(&mut session, Rule::creation(storage_type, scrapped_status))
            .await
            .unwrap();

        spares_definition
            .put(&SparesDefinition {
                usage_statuses: vec![scrapped_status],
            })
            .await
            .unwrap();

        let system = systems
            .create(&mut session, System::new("Shelf", None, storage_type))
            .await
            .unwrap();
        let catalogue_item = catalogue_items
            .create(
                &mut session,
                CatalogueItem::new(category_id, Id::new(), "Widget", 10.0, 3),
            )
            .await
            .unwrap();

        let i1 = service
            .create_item(
                &mut session,
                Item::new(catalogue_item.id.unwrap(), system.id.unwrap(), new_status),
            )
            .await
            .unwrap();
        service
            .create_item(
                &mut session,
                Item::new(catalogue_item.id.unwrap(), system.id.unwrap(), scrapped_status),
            )
            .await
            .unwrap();

        let after_create = catalogue_items
            .get(catalogue_item.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_create.number_of_spares, Some(1));

        service
            .change_item_usage_status(&mut session, i1.id.unwrap(), scrapped_status)
            .await
            .unwrap();

        let after_patch = catalogue_items
            .get(catalogue_item.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_patch.number_of_spares, Some(2));

        // Recomputing again off the back of a no-op status change must be
        // idempotent: the count is derived entirely from current item state.
        service
            .change_item_usage_status(&mut session, i1.id.unwrap(), scrapped_status)
            .await
            .unwrap();
        let after_repeat = catalogue_items
            .get(catalogue_item.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_repeat.number_of_spares, Some(2));
    }

    #[tokio::test]
    async fn create_item_rejected_without_matching_rule() {
        let db = DbContext::memory();
        let service = SystemService::new(&db, None);
        let systems = SystemRepository::new(&db);
        let catalogue_items = CatalogueItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();
        let storage_type = system_type(&db, &mut session).await;
        let category_id = leaf_category(&db, &mut session).await;

        let system = systems
            .create(&mut session, System::new("Shelf", None, storage_type))
            .await
            .unwrap();
        let catalogue_item = catalogue_items
            .create(
                &mut session,
                CatalogueItem::new(category_id, Id::new(), "Widget", 10.0, 3),
            )
            .await
            .unwrap();

        let err = service
            .create_item(
                &mut session,
                Item::new(catalogue_item.id.unwrap(), system.id.unwrap(), Id::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::InvalidAction(_)));
    }
}
