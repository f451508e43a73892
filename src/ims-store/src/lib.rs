// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Storage primitives shared across the workspace: a database handle that
//! can be either a real MongoDB connection or an in-memory stand-in, a
//! thin per-collection CRUD wrapper over that handle, and the generic tree
//! repository built on top of it (component B).
//!
//! Flat, non-hierarchical collections (units, manufacturers, system types,
//! rules, settings, items) use [`Collection`] directly rather than going
//! through [`TreeRepository`]; see `ims-lookups` and `ims-items`.

mod collection;
mod db;
mod node;
mod session;
mod settings;
mod tree;

pub use collection::Collection;
pub use db::DbContext;
pub use node::{Breadcrumbs, ParentFilter, TreeNode};
pub use session::Session;
pub use settings::SettingsStore;
pub use tree::{TreeRepository, DEFAULT_MAX_TRAIL_LENGTH};

#[cfg(test)]
mod tests {
    use ims_ids::Id;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Category {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<Id>,
        parent_id: Option<Id>,
        code: String,
        name: String,
    }

    impl TreeNode for Category {
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

    fn category(parent_id: Option<Id>, code: &str) -> Category {
        Category {
            id: None,
            parent_id,
            code: code.to_string(),
            name: code.to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_missing_parent() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let err = repo
            .create(&mut session, category(Some(Id::new()), "root"))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::MissingRecord { .. }));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_sibling_code() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        repo.create(&mut session, category(None, "electronics"))
            .await
            .unwrap();
        let err = repo
            .create(&mut session, category(None, "electronics"))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::DuplicateRecord(_)));
    }

    #[tokio::test]
    async fn breadcrumbs_walks_to_root_and_reverses() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let root = repo
            .create(&mut session, category(None, "root"))
            .await
            .unwrap();
        let child = repo
            .create(&mut session, category(Some(root.id().unwrap()), "child"))
            .await
            .unwrap();

        let crumbs = repo
            .breadcrumbs(child.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(crumbs.full_trail);
        assert_eq!(crumbs.trail.len(), 2);
        assert_eq!(crumbs.trail[0].1, "root");
        assert_eq!(crumbs.trail[1].1, "child");
    }

    #[tokio::test]
    async fn breadcrumbs_truncates_past_max_trail_length() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> =
            TreeRepository::new(&db, "categories").with_max_trail_length(2);
        let mut session = db.start_session().await.unwrap();

        let a = repo.create(&mut session, category(None, "a")).await.unwrap();
        let b = repo
            .create(&mut session, category(Some(a.id().unwrap()), "b"))
            .await
            .unwrap();
        let c = repo
            .create(&mut session, category(Some(b.id().unwrap()), "c"))
            .await
            .unwrap();

        let crumbs = repo.breadcrumbs(c.id().unwrap()).await.unwrap().unwrap();
        assert!(!crumbs.full_trail);
        assert_eq!(crumbs.trail.len(), 2);
        assert_eq!(crumbs.trail[0].1, "b");
        assert_eq!(crumbs.trail[1].1, "c");
    }

    #[tokio::test]
    async fn breadcrumbs_returns_none_for_missing_node() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        assert!(repo.breadcrumbs(Id::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_rejects_move_that_would_create_a_cycle() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let a = repo.create(&mut session, category(None, "a")).await.unwrap();
        let b = repo
            .create(&mut session, category(Some(a.id().unwrap()), "b"))
            .await
            .unwrap();

        let a_id = a.id().unwrap();
        let b_id = b.id().unwrap();
        let err = repo
            .update(&mut session, a_id, |node| node.set_parent_id(Some(b_id)))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::InvalidAction(_)));
    }

    #[tokio::test]
    async fn delete_refuses_when_children_exist() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let a = repo.create(&mut session, category(None, "a")).await.unwrap();
        repo.create(&mut session, category(Some(a.id().unwrap()), "b"))
            .await
            .unwrap();

        let err = repo.delete(&mut session, a.id().unwrap()).await.unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::ChildElementsExist(_)));
    }

    #[tokio::test]
    async fn list_filters_by_parent() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let root = repo.create(&mut session, category(None, "root")).await.unwrap();
        repo.create(&mut session, category(Some(root.id().unwrap()), "child"))
            .await
            .unwrap();
        repo.create(&mut session, category(None, "other-root"))
            .await
            .unwrap();

        let roots = repo.list(ParentFilter::RootOnly).await.unwrap();
        assert_eq!(roots.len(), 2);

        let children = repo
            .list(ParentFilter::Under(root.id().unwrap()))
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].code, "child");
    }

    #[tokio::test]
    async fn same_collection_name_shares_state_across_handles() {
        let db = DbContext::memory();
        let repo_a: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let repo_b: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let created = repo_a
            .create(&mut session, category(None, "shared"))
            .await
            .unwrap();
        let seen = repo_b.get(created.id().unwrap()).await.unwrap();
        assert!(seen.is_some());
    }

    #[tokio::test]
    async fn cancelled_session_rejects_create_before_touching_the_store() {
        use tokio_util::sync::CancellationToken;

        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let token = CancellationToken::new();
        let mut session = db.start_session_with_cancellation(token.clone()).await.unwrap();
        token.cancel();

        let err = repo
            .create(&mut session, category(None, "too-late"))
            .await
            .unwrap_err();
        assert!(matches!(err, ims_errors::CoreError::Cancelled));
        assert!(repo.list(ParentFilter::RootOnly).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn aborted_transaction_discards_its_writes() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        let root = repo.create(&mut session, category(None, "root")).await.unwrap();

        session.start_transaction().await.unwrap();
        let child = repo
            .create(&mut session, category(Some(root.id().unwrap()), "child"))
            .await
            .unwrap();
        assert!(repo.get_in_session(&mut session, child.id().unwrap()).await.unwrap().is_some());

        session.abort_transaction().await.unwrap();

        assert!(repo.get(child.id().unwrap()).await.unwrap().is_none());
        assert_eq!(repo.list(ParentFilter::RootOnly).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn committed_transaction_applies_its_writes() {
        let db = DbContext::memory();
        let repo: TreeRepository<Category> = TreeRepository::new(&db, "categories");
        let mut session = db.start_session().await.unwrap();

        session.start_transaction().await.unwrap();
        let root = repo.create(&mut session, category(None, "root")).await.unwrap();
        session.commit_transaction().await.unwrap();

        assert!(repo.get(root.id().unwrap()).await.unwrap().is_some());
    }

    proptest::proptest! {
        /// For any chain of `depth` nested categories, the breadcrumbs trail
        /// length never exceeds `max_trail_length`, and a trail short enough
        /// to fit is always reported `full_trail`.
        #[test]
        fn breadcrumbs_trail_never_exceeds_max_length(depth in 1usize..8, max_trail_length in 1usize..6) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let (trail_len, full_trail) = runtime.block_on(async {
                let db = DbContext::memory();
                let repo: TreeRepository<Category> =
                    TreeRepository::new(&db, "categories").with_max_trail_length(max_trail_length);
                let mut session = db.start_session().await.unwrap();

                let mut parent = None;
                let mut leaf = None;
                for i in 0..depth {
                    let node = repo
                        .create(&mut session, category(parent, &format!("n{i}")))
                        .await
                        .unwrap();
                    parent = node.id();
                    leaf = Some(node);
                }

                let crumbs = repo
                    .breadcrumbs(leaf.unwrap().id().unwrap())
                    .await
                    .unwrap()
                    .unwrap();
                (crumbs.trail.len(), crumbs.full_trail)
            });
            proptest::prop_assert!(trail_len <= max_trail_length);
            proptest::prop_assert_eq!(full_trail, depth <= max_trail_length);
        }
    }
}
