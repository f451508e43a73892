// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_ids::Id;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The capabilities [`crate::tree::TreeRepository`] needs from a stored
/// document: an id, a parent link, a sibling-scoped code, and a display
/// name. Catalogue categories and systems both implement this; the
/// repository logic (breadcrumbs, cycle-safe move, sibling uniqueness) is
/// written once against the trait, per the "polymorphic tree repository"
/// design note.
pub trait TreeNode: Serialize + DeserializeOwned + Clone + Send + Sync + Unpin + 'static {
    fn id(&self) -> Option<Id>;
    fn set_id(&mut self, id: Id);
    fn parent_id(&self) -> Option<Id>;
    fn set_parent_id(&mut self, parent_id: Option<Id>);
    fn code(&self) -> &str;
    fn set_code(&mut self, code: String);
    fn name(&self) -> &str;
}

/// How to filter a [`crate::tree::TreeRepository::list`] call by parent.
///
/// The three non-trivial cases come directly from spec §4.B: a caller can
/// ask for everything, for roots only (the literal sentinel `null`,
/// distinct from the parameter being unset), or for the children of a
/// specific, valid parent. [`ParentFilter::Empty`] exists so that an
/// unparseable id can short-circuit to an empty result without the caller
/// having to special-case a parse failure as a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    Any,
    RootOnly,
    Under(Id),
    Empty,
}

impl ParentFilter {
    /// Parses the wire representation of a `parent_id` query parameter.
    /// `None` means the parameter was not supplied at all (list everything);
    /// `Some("null")` is the literal sentinel for roots only; anything else
    /// that fails to parse as an [`Id`] yields [`ParentFilter::Empty`]
    /// rather than an error, per spec §4.B.
    pub fn parse(raw: Option<&str>) -> ParentFilter {
        match raw {
            None => ParentFilter::Any,
            Some("null") => ParentFilter::RootOnly,
            Some(s) => match s.parse::<Id>() {
                Ok(id) => ParentFilter::Under(id),
                Err(_) => ParentFilter::Empty,
            },
        }
    }
}

/// Root-to-node id/name trail, truncated at a configured maximum.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Breadcrumbs {
    /// Oldest-first: `trail[0]` is the most distant surviving ancestor,
    /// `trail.last()` is the node itself.
    pub trail: Vec<(Id, String)>,
    /// False if the trail was truncated before reaching the root.
    pub full_trail: bool,
}
