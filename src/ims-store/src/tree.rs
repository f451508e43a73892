// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The generic rooted-forest repository (component B), shared by the
//! catalogue-category tree and the system tree. Everything here is written
//! against [`TreeNode`] rather than a concrete type, per the "polymorphic
//! tree repository" design note in spec §9.

use ims_errors::{CoreError, Result};
use ims_ids::Id;

use crate::collection::Collection;
use crate::db::DbContext;
use crate::node::{Breadcrumbs, ParentFilter, TreeNode};
use crate::session::Session;

/// Default maximum breadcrumb trail length (self + up to `L - 1`
/// ancestors), overridable via `breadcrumbs.max_trail_length`.
pub const DEFAULT_MAX_TRAIL_LENGTH: usize = 5;

#[derive(Clone)]
pub struct TreeRepository<T> {
    collection: Collection<T>,
    max_trail_length: usize,
}

impl<T: TreeNode> TreeRepository<T> {
    pub fn new(db: &DbContext, collection_name: &'static str) -> TreeRepository<T> {
        TreeRepository {
            collection: db.collection(collection_name),
            max_trail_length: DEFAULT_MAX_TRAIL_LENGTH,
        }
    }

    pub fn with_max_trail_length(mut self, max_trail_length: usize) -> TreeRepository<T> {
        assert!(max_trail_length >= 2, "breadcrumbs.max_trail_length must be >= 2");
        self.max_trail_length = max_trail_length;
        self
    }

    /// Inserts `node`, rejecting it if `parent_id` is set but does not
    /// resolve, and surfacing sibling `(parent_id, code)` collisions as
    /// [`CoreError::DuplicateRecord`]. The uniqueness check here is a
    /// fail-fast pre-check; the unique index is the actual source of truth
    /// and a race would still be caught when the driver rejects the insert.
    pub async fn create(&self, session: &mut Session, mut node: T) -> Result<T> {
        if let Some(parent_id) = node.parent_id() {
            if self.collection.find_one_in_session(session, parent_id).await?.is_none() {
                return Err(CoreError::missing(parent_kind::<T>(), parent_id));
            }
        }
        if self
            .sibling_exists_in_session(session, node.parent_id(), node.code(), None)
            .await?
        {
            return Err(CoreError::DuplicateRecord(format!(
                "a node with code '{}' already exists under this parent",
                node.code()
            )));
        }
        let id = Id::new();
        node.set_id(id);
        self.collection.insert(session, &node).await?;
        Ok(node)
    }

    pub async fn get(&self, id: Id) -> Result<Option<T>> {
        self.collection.find_one(id).await
    }

    /// `get`, but participating in `session`'s transaction — for use inside
    /// a mutating operation that must see its own prior writes.
    pub async fn get_in_session(&self, session: &mut Session, id: Id) -> Result<Option<T>> {
        self.collection.find_one_in_session(session, id).await
    }

    pub async fn list(&self, filter: ParentFilter) -> Result<Vec<T>> {
        match filter {
            ParentFilter::Empty => Ok(Vec::new()),
            ParentFilter::Any => self.collection.all().await,
            ParentFilter::RootOnly => {
                let all = self.collection.all().await?;
                Ok(all.into_iter().filter(|n| n.parent_id().is_none()).collect())
            }
            ParentFilter::Under(parent) => {
                let all = self.collection.all().await?;
                Ok(all
                    .into_iter()
                    .filter(|n| n.parent_id() == Some(parent))
                    .collect())
            }
        }
    }

    /// True iff any other node in this collection has `id` as its parent.
    /// Does not consider cross-collection references (catalogue items under
    /// a category, items/child-systems under a system) — those are the
    /// caller's responsibility to check as well, per spec §4.B
    /// `has_child_elements`.
    pub async fn has_direct_children(&self, id: Id) -> Result<bool> {
        let all = self.collection.all().await?;
        Ok(all.iter().any(|n| n.parent_id() == Some(id)))
    }

    /// `has_direct_children`, but participating in `session`'s transaction.
    pub async fn has_direct_children_in_session(&self, session: &mut Session, id: Id) -> Result<bool> {
        let all = self.collection.all_in_session(session).await?;
        Ok(all.iter().any(|n| n.parent_id() == Some(id)))
    }

    /// Computes the root-to-node trail for `id`, truncating at
    /// `max_trail_length` total entries (self included). Mirrors the
    /// original service's breadcrumb walk: add the current node, follow its
    /// `parent_id`, stop once the trail is full or the root is reached.
    /// Returns `Ok(None)` if `id` itself does not exist; a missing link
    /// encountered partway up an otherwise-valid trail is a
    /// [`CoreError::DatabaseIntegrity`] violation, not a plain not-found.
    pub async fn breadcrumbs(&self, id: Id) -> Result<Option<Breadcrumbs>> {
        let mut trail = Vec::new();
        let mut next_id = Some(id);

        while trail.len() < self.max_trail_length {
            let Some(current_id) = next_id else {
                break;
            };
            match self.collection.find_one(current_id).await? {
                None if trail.is_empty() => return Ok(None),
                None => {
                    return Err(CoreError::database_integrity(format!(
                        "missing ancestor {current_id} while computing breadcrumbs for {id}"
                    )))
                }
                Some(node) => {
                    let node_id = node
                        .id()
                        .ok_or_else(|| CoreError::database_integrity("stored node has no id"))?;
                    trail.push((node_id, node.name().to_string()));
                    next_id = node.parent_id();
                }
            }
        }

        trail.reverse();
        Ok(Some(Breadcrumbs {
            trail,
            full_trail: next_id.is_none(),
        }))
    }

    /// True iff walking upward from `start` (inclusive) ever reaches
    /// `target`. Used both to detect a move that would create a cycle
    /// (§4.B) and, with `start` and `target` swapped, to answer "is `a` a
    /// descendant of `b`". Always called from inside a mutating operation's
    /// transaction, so it reads through `session` — a cycle check that
    /// missed the move's own uncommitted writes would be unsound.
    pub async fn walk_reaches(&self, session: &mut Session, start: Id, target: Id) -> Result<bool> {
        let mut current = Some(start);
        while let Some(id) = current {
            if id == target {
                return Ok(true);
            }
            match self.collection.find_one_in_session(session, id).await? {
                None => {
                    return Err(CoreError::database_integrity(format!(
                        "missing node {id} while checking for a cycle"
                    )))
                }
                Some(node) => current = node.parent_id(),
            }
        }
        Ok(false)
    }

    /// Applies `mutator` to the node at `id` and persists the result,
    /// re-validating sibling-code uniqueness (I1) if the code changed and
    /// running the cycle check (I8) inside `session` if the parent changed.
    pub async fn update<F>(&self, session: &mut Session, id: Id, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut T),
    {
        let Some(mut node) = self.collection.find_one_in_session(session, id).await? else {
            return Err(CoreError::missing(node_kind::<T>(), id));
        };
        let old_parent = node.parent_id();
        let old_code = node.code().to_string();

        mutator(&mut node);

        let new_parent = node.parent_id();
        if new_parent != old_parent {
            if let Some(new_parent_id) = new_parent {
                if self
                    .collection
                    .find_one_in_session(session, new_parent_id)
                    .await?
                    .is_none()
                {
                    return Err(CoreError::missing(parent_kind::<T>(), new_parent_id));
                }
                // Move-validity aggregation (§4.B): walk up from the
                // prospective new parent; if we encounter `id`, this move
                // would create a cycle. Runs inside `session` so it sees
                // this same update's own uncommitted state.
                if self.walk_reaches(session, new_parent_id, id).await? {
                    return Err(CoreError::InvalidAction(
                        "move would create a cycle".to_string(),
                    ));
                }
            }
        }

        if new_parent != old_parent || node.code() != old_code {
            if self
                .sibling_exists_in_session(session, new_parent, node.code(), Some(id))
                .await?
            {
                return Err(CoreError::DuplicateRecord(format!(
                    "a node with code '{}' already exists under this parent",
                    node.code()
                )));
            }
        }

        self.collection.replace(session, id, &node).await?;
        Ok(node)
    }

    /// Refuses if `id` has direct child nodes (cross-collection entities
    /// must be checked by the caller first).
    pub async fn delete(&self, session: &mut Session, id: Id) -> Result<()> {
        if self.has_direct_children_in_session(session, id).await? {
            return Err(CoreError::ChildElementsExist(node_kind::<T>().to_string()));
        }
        self.collection.delete(session, id).await?;
        Ok(())
    }

    /// A no-op self-update that forces document-level serialization within
    /// `session`. Must be called before reading the data a derived-state
    /// recompute depends on (spec §5).
    pub async fn write_lock(&self, session: &mut Session, id: Id) -> Result<()> {
        self.collection.write_lock(session, id).await
    }

    async fn sibling_exists_in_session(
        &self,
        session: &mut Session,
        parent_id: Option<Id>,
        code: &str,
        exclude: Option<Id>,
    ) -> Result<bool> {
        let all = self.collection.all_in_session(session).await?;
        Ok(all.iter().any(|n| {
            n.parent_id() == parent_id && n.code() == code && n.id() != exclude
        }))
    }
}

fn node_kind<T>() -> &'static str {
    std::any::type_name::<T>()
}

fn parent_kind<T>() -> &'static str {
    node_kind::<T>()
}
