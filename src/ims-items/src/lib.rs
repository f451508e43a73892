// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The `Item` entity — a physical instance classified against the
//! catalogue and located within the system tree — shared by the catalogue
//! engine (property propagation cascades into item documents) and the
//! system engine (rule validation, move, spares recompute).

mod item;
mod property;
mod repository;

pub use item::Item;
pub use property::{PropertyType, PropertyValue, StoredProperty};
pub use repository::ItemRepository;

#[cfg(test)]
mod tests {
    use ims_store::DbContext;

    use super::*;

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let db = DbContext::memory();
        let repo = ItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        let catalogue_item_id = ims_ids::Id::new();
        let system_id = ims_ids::Id::new();
        let usage_status_id = ims_ids::Id::new();
        let created = repo
            .create(
                &mut session,
                Item::new(catalogue_item_id, system_id, usage_status_id),
            )
            .await
            .unwrap();

        let fetched = repo.get(created.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(fetched.catalogue_item_id, catalogue_item_id);
    }

    #[tokio::test]
    async fn list_by_catalogue_item_filters_correctly() {
        let db = DbContext::memory();
        let repo = ItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        let cat_a = ims_ids::Id::new();
        let cat_b = ims_ids::Id::new();
        let system_id = ims_ids::Id::new();
        let usage_status_id = ims_ids::Id::new();
        repo.create(&mut session, Item::new(cat_a, system_id, usage_status_id))
            .await
            .unwrap();
        repo.create(&mut session, Item::new(cat_a, system_id, usage_status_id))
            .await
            .unwrap();
        repo.create(&mut session, Item::new(cat_b, system_id, usage_status_id))
            .await
            .unwrap();

        assert_eq!(repo.list_by_catalogue_item(cat_a).await.unwrap().len(), 2);
        assert_eq!(repo.list_by_catalogue_item(cat_b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_property_only_touches_matching_catalogue_items() {
        let db = DbContext::memory();
        let repo = ItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        let cat_a = ims_ids::Id::new();
        let cat_b = ims_ids::Id::new();
        let system_id = ims_ids::Id::new();
        let usage_status_id = ims_ids::Id::new();
        let item_a = repo
            .create(&mut session, Item::new(cat_a, system_id, usage_status_id))
            .await
            .unwrap();
        let item_b = repo
            .create(&mut session, Item::new(cat_b, system_id, usage_status_id))
            .await
            .unwrap();

        let property = StoredProperty {
            id: ims_ids::Id::new(),
            name: "Diameter".to_string(),
            unit: Some("mm".to_string()),
            value: Some(PropertyValue::Number(42.0)),
        };
        repo.append_property_for_catalogue_items(&mut session, &[cat_a], &property)
            .await
            .unwrap();

        assert_eq!(
            repo.get(item_a.id.unwrap()).await.unwrap().unwrap().properties.len(),
            1
        );
        assert!(repo
            .get(item_b.id.unwrap())
            .await
            .unwrap()
            .unwrap()
            .properties
            .is_empty());
    }

    #[tokio::test]
    async fn rename_property_updates_every_occurrence() {
        let db = DbContext::memory();
        let repo = ItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        let property_id = ims_ids::Id::new();
        let property = StoredProperty {
            id: property_id,
            name: "Old Name".to_string(),
            unit: None,
            value: Some(PropertyValue::Boolean(true)),
        };
        let mut item = Item::new(ims_ids::Id::new(), ims_ids::Id::new(), ims_ids::Id::new());
        item.properties.push(property);
        let created = repo.create(&mut session, item).await.unwrap();

        repo.rename_property(&mut session, property_id, "New Name")
            .await
            .unwrap();

        let fetched = repo.get(created.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(fetched.properties[0].name, "New Name");
    }
}
