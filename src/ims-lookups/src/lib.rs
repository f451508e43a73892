// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Flat, non-hierarchical lookup entities: units, usage statuses,
//! manufacturers, system types, rules, and the spares definition setting
//! (component "Flat lookups" in the system overview).

mod entities;
mod repository;
mod spares;

pub use entities::{Address, Manufacturer, Rule, SystemType, Unit, UsageStatus};
pub use repository::{Coded, FlatRepository, Keyed, SimpleRepository};
pub use spares::{SparesDefinition, SparesDefinitionStore};

#[cfg(test)]
mod tests {
    use ims_store::DbContext;

    use super::*;

    #[tokio::test]
    async fn create_rejects_duplicate_code() {
        let db = DbContext::memory();
        let repo: FlatRepository<Unit> = FlatRepository::new(&db, "units", "unit");
        let mut session = db.start_session().await.unwrap();

        repo.create(&mut session, Unit::new("millimetres")).await.unwrap();
        let err = repo
            .create(&mut session, Unit::new("millimetres"))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::DuplicateRecord(_)));
    }

    #[tokio::test]
    async fn update_allows_same_code_no_reuse_check_against_self() {
        let db = DbContext::memory();
        let repo: FlatRepository<Unit> = FlatRepository::new(&db, "units", "unit");
        let mut session = db.start_session().await.unwrap();

        let unit = repo.create(&mut session, Unit::new("millimetres")).await.unwrap();
        let updated = repo
            .update(&mut session, unit.id.unwrap(), |u| u.value = "millimetres".to_string())
            .await
            .unwrap();
        assert_eq!(updated.code, "millimetres");
    }

    #[tokio::test]
    async fn delete_refuses_when_referenced() {
        let db = DbContext::memory();
        let repo: FlatRepository<Unit> = FlatRepository::new(&db, "units", "unit");
        let mut session = db.start_session().await.unwrap();

        let unit = repo.create(&mut session, Unit::new("millimetres")).await.unwrap();
        let err = repo
            .delete(&mut session, unit.id.unwrap(), |_id| async { Ok(true) })
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::ChildElementsExist(_)));
    }

    #[tokio::test]
    async fn delete_succeeds_when_unreferenced() {
        let db = DbContext::memory();
        let repo: FlatRepository<Unit> = FlatRepository::new(&db, "units", "unit");
        let mut session = db.start_session().await.unwrap();

        let unit = repo.create(&mut session, Unit::new("millimetres")).await.unwrap();
        repo.delete(&mut session, unit.id.unwrap(), |_id| async { Ok(false) })
            .await
            .unwrap();
        assert!(repo.get(unit.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn system_type_has_no_code_uniqueness() {
        let db = DbContext::memory();
        let repo: SimpleRepository<SystemType> = SimpleRepository::new(&db, "system_types", "system type");
        let mut session = db.start_session().await.unwrap();

        repo.create(&mut session, SystemType::new("Storage")).await.unwrap();
        repo.create(&mut session, SystemType::new("Storage")).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn spares_definition_round_trips_through_settings() {
        let db = DbContext::memory();
        let store = SparesDefinitionStore::new(&db);

        assert!(store.get().await.unwrap().is_none());

        let scrapped = ims_ids::Id::new();
        let definition = SparesDefinition {
            usage_statuses: vec![scrapped],
        };
        store.put(&definition).await.unwrap();

        let loaded = store.get().await.unwrap().unwrap();
        assert!(loaded.counts_as_spare(scrapped));
    }

    #[tokio::test]
    async fn rule_degenerate_move_is_detected() {
        let t = ims_ids::Id::new();
        let rule = Rule::movement(t, t, ims_ids::Id::new());
        assert!(rule.is_degenerate_move());
        assert!(!Rule::creation(t, ims_ids::Id::new()).is_degenerate_move());
    }
}
