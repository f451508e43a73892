// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! Opaque identifiers and slug-code derivation (component A).
//!
//! Identifiers are 12-byte, time-seeded + random values: exactly the shape
//! `bson::oid::ObjectId` already gives us, so [`Id`] is a thin newtype over
//! it rather than a reimplementation. Codes are one-way: they exist only to
//! give sibling nodes in a tree a stable, comparable, database-indexable key.

use std::fmt;
use std::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

mod code;

pub use code::slugify;

/// An opaque 96-bit identifier, serialized on the wire as a 24-character hex
/// string and stored natively as a BSON object id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(ObjectId);

/// Error returned when a string does not parse as an [`Id`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid id: {0:?}")]
pub struct InvalidId(String);

impl Id {
    /// Generates a new identifier, seeded from the current time plus
    /// process/random entropy.
    pub fn new() -> Id {
        Id(ObjectId::new())
    }

    /// Returns the 24-character hex representation.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    pub fn into_inner(self) -> ObjectId {
        self.0
    }

    pub fn as_object_id(&self) -> &ObjectId {
        &self.0
    }
}

impl Default for Id {
    fn default() -> Id {
        Id::new()
    }
}

impl From<ObjectId> for Id {
    fn from(oid: ObjectId) -> Id {
        Id(oid)
    }
}

impl From<Id> for ObjectId {
    fn from(id: Id) -> ObjectId {
        id.0
    }
}

impl FromStr for Id {
    type Err = InvalidId;

    /// Parses a 24-character hex string. Anything else — wrong length,
    /// non-hex characters, surrounding whitespace — is rejected rather than
    /// trimmed or coerced: the spec is explicit that this is a strict parse.
    fn from_str(s: &str) -> Result<Id, InvalidId> {
        ObjectId::parse_str(s)
            .map(Id)
            .map_err(|_| InvalidId(s.to_owned()))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0.to_hex())
    }
}
