// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The catalogue-category engine (component C) and the property
//! propagation engine (component D): category trees with per-leaf property
//! schemas, catalogue items, and the cascading update of denormalised
//! property copies onto catalogue items and items.

mod catalogue_item;
mod catalogue_item_repository;
mod catalogue_item_service;
mod category;
mod category_repository;
mod propagation;

pub use catalogue_item::CatalogueItem;
pub use catalogue_item_repository::CatalogueItemRepository;
pub use catalogue_item_service::CatalogueItemService;
pub use category::{AllowedValues, CatalogueCategory, PropertyDescriptor};
pub use category_repository::CategoryRepository;
pub use propagation::{as_supplied, NewProperty, PropertyPropagationEngine, SuppliedProperty};

#[cfg(test)]
mod tests {
    use ims_items::{PropertyType, PropertyValue};
    use ims_store::{DbContext, ParentFilter};

    use super::*;

    async fn leaf_category(db: &DbContext) -> (CategoryRepository, Id) {
        let categories = CategoryRepository::new(db);
        let mut session = db.start_session().await.unwrap();
        let leaf = categories
            .create(&mut session, CatalogueCategory::new("Lenses", None, true))
            .await
            .unwrap();
        (categories, leaf.id.unwrap())
    }

    use ims_ids::Id;

    #[tokio::test]
    async fn create_rejects_properties_on_non_leaf() {
        let db = DbContext::memory();
        let categories = CategoryRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        let mut category = CatalogueCategory::new("Optics", None, false);
        category.properties.push(PropertyDescriptor {
            id: Id::new(),
            name: "Diameter".to_string(),
            property_type: PropertyType::Number,
            unit_id: None,
            mandatory: false,
            allowed_values: None,
        });
        let err = categories.create(&mut session, category).await.unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn create_rejects_child_under_leaf_parent() {
        let db = DbContext::memory();
        let (categories, leaf_id) = leaf_category(&db).await;
        let mut session = db.start_session().await.unwrap();

        let err = categories
            .create(&mut session, CatalogueCategory::new("Telephoto", Some(leaf_id), true))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::LeafParent));
    }

    #[tokio::test]
    async fn set_is_leaf_blocked_by_catalogue_items() {
        let db = DbContext::memory();
        let (categories, leaf_id) = leaf_category(&db).await;
        let catalogue_items = CatalogueItemRepository::new(&db);
        let mut session = db.start_session().await.unwrap();

        catalogue_items
            .create(
                &mut session,
                CatalogueItem::new(leaf_id, Id::new(), "50mm lens", 100.0, 5),
            )
            .await
            .unwrap();

        let err = categories
            .set_is_leaf(&mut session, leaf_id, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::ChildElementsExist(_)));
    }

    #[tokio::test]
    async fn s1_property_cascade_add() {
        let db = DbContext::memory();
        let (categories, category_id) = leaf_category(&db).await;
        let catalogue_items = CatalogueItemRepository::new(&db);
        let items = ims_items::ItemRepository::new(&db);
        let engine = PropertyPropagationEngine::new(&db);
        let mut session = db.start_session().await.unwrap();

        let existing_property_id = Id::new();
        categories
            .add_property_descriptor(
                &mut session,
                category_id,
                PropertyDescriptor {
                    id: existing_property_id,
                    name: "Property B".to_string(),
                    property_type: PropertyType::Boolean,
                    unit_id: None,
                    mandatory: false,
                    allowed_values: None,
                },
            )
            .await
            .unwrap();

        let mut catalogue_item = CatalogueItem::new(category_id, Id::new(), "50mm lens", 100.0, 5);
        catalogue_item.properties.push(ims_items::StoredProperty {
            id: existing_property_id,
            name: "Property B".to_string(),
            unit: None,
            value: Some(PropertyValue::Boolean(false)),
        });
        let catalogue_item = catalogue_items.create(&mut session, catalogue_item).await.unwrap();

        let mut item = ims_items::Item::new(catalogue_item.id.unwrap(), Id::new(), Id::new());
        item.properties.push(ims_items::StoredProperty {
            id: existing_property_id,
            name: "Property B".to_string(),
            unit: None,
            value: Some(PropertyValue::Boolean(false)),
        });
        let item = items.create(&mut session, item).await.unwrap();

        let category = engine
            .add_property(
                &mut session,
                category_id,
                NewProperty {
                    name: "Diameter".to_string(),
                    property_type: PropertyType::Number,
                    unit_id: None,
                    mandatory: true,
                    allowed_values: None,
                    default_value: Some(PropertyValue::Number(42.0)),
                },
            )
            .await
            .unwrap();

        assert_eq!(category.properties.len(), 2);
        let new_property_id = category.properties[1].id;

        let catalogue_item = catalogue_items.get(catalogue_item.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(catalogue_item.properties.len(), 2);
        assert_eq!(catalogue_item.properties[1].id, new_property_id);
        assert_eq!(catalogue_item.properties[1].value, Some(PropertyValue::Number(42.0)));

        let item = items.get(item.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(item.properties.len(), 2);
        assert_eq!(item.properties[1].id, new_property_id);
    }

    #[tokio::test]
    async fn s6_allowed_values_extension_then_illegal_modify() {
        let db = DbContext::memory();
        let (categories, category_id) = leaf_category(&db).await;
        let engine = PropertyPropagationEngine::new(&db);
        let mut session = db.start_session().await.unwrap();

        let property_id = Id::new();
        categories
            .add_property_descriptor(
                &mut session,
                category_id,
                PropertyDescriptor {
                    id: property_id,
                    name: "Resistance".to_string(),
                    property_type: PropertyType::Number,
                    unit_id: None,
                    mandatory: false,
                    allowed_values: Some(AllowedValues::List {
                        values: vec![PropertyValue::Number(100.0), PropertyValue::Number(500.0)],
                    }),
                },
            )
            .await
            .unwrap();

        engine
            .extend_allowed_values(
                &mut session,
                category_id,
                property_id,
                vec![
                    PropertyValue::Number(100.0),
                    PropertyValue::Number(500.0),
                    PropertyValue::Number(1000.0),
                    PropertyValue::Number(2000.0),
                ],
            )
            .await
            .unwrap();

        let err = engine
            .extend_allowed_values(
                &mut session,
                category_id,
                property_id,
                vec![
                    PropertyValue::Number(100.0),
                    PropertyValue::Number(700.0),
                    PropertyValue::Number(1000.0),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn list_roots_only() {
        let db = DbContext::memory();
        let categories = CategoryRepository::new(&db);
        let mut session = db.start_session().await.unwrap();
        categories
            .create(&mut session, CatalogueCategory::new("Root", None, false))
            .await
            .unwrap();
        let roots = categories.list(ParentFilter::RootOnly).await.unwrap();
        assert_eq!(roots.len(), 1);
    }
}
