// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! The error taxonomy shared by every crate in the catalogue/system-tree
//! core (spec §7). Kinds, not concrete causes: the façade (out of scope
//! here) maps each variant to an HTTP status; nothing in this workspace
//! translates an error a second time.

use std::fmt;

/// A structured error kind, propagated to callers without local recovery
/// except for the boundary's optional retry on [`CoreError::WriteConflict`].
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A syntactically malformed identifier was supplied.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A referenced entity (parent, unit, usage-status, manufacturer,
    /// system-type, replacement catalogue item, ...) does not exist.
    #[error("{kind} {id} does not exist")]
    MissingRecord { kind: &'static str, id: String },

    /// Sibling `code` uniqueness (I1) or another unique-index constraint was
    /// violated.
    #[error("{0} already exists")]
    DuplicateRecord(String),

    /// Deletion or a leaf/non-leaf conversion was refused because dependent
    /// records still exist.
    #[error("{0} has child elements")]
    ChildElementsExist(String),

    /// A child node was placed under (or moved under) a leaf category.
    #[error("cannot place a child under a leaf category")]
    LeafParent,

    /// A structural or rule violation: cycle on move, system type mismatch,
    /// mandatory property without a default, illegal `allowed_values` edit,
    /// or a missing transition rule.
    #[error("{0}")]
    InvalidAction(String),

    /// Two properties in the same schema were given the same name.
    #[error("duplicate property name: {0}")]
    DuplicatePropertyName(String),

    /// A supplied property value failed its declared type or
    /// `allowed_values` membership check.
    #[error("invalid value for property {0}")]
    InvalidPropertyType(String),

    /// A mandatory property was null or absent.
    #[error("missing mandatory property: {0}")]
    MissingMandatoryProperty(String),

    /// A transient transactional conflict. Safe to retry.
    #[error("write conflict, retry the operation")]
    WriteConflict,

    /// An internal consistency violation — e.g. a parent link pointing at a
    /// document that no longer exists. Logged as exceptional by
    /// [`CoreError::database_integrity`] before being returned; never
    /// expected to occur in a correctly operating system.
    #[error("database integrity violation: {0}")]
    DatabaseIntegrity(String),

    /// The object-storage collaborator rejected our bearer token.
    #[error("object storage authentication failed")]
    ObjectStorageAuth,

    /// The object-storage collaborator returned an unexpected status.
    #[error("object storage request failed: {0}")]
    ObjectStorageServer(String),

    /// The caller cancelled the request this operation belongs to before it
    /// reached the database.
    #[error("operation cancelled")]
    Cancelled,
}

impl CoreError {
    pub fn missing(kind: &'static str, id: impl fmt::Display) -> CoreError {
        CoreError::MissingRecord {
            kind,
            id: id.to_string(),
        }
    }

    /// Builds a [`CoreError::DatabaseIntegrity`] and immediately logs it at
    /// `error` level, per the spec's "must be logged as exceptional"
    /// requirement — callers should never need to log this variant again.
    #[track_caller]
    pub fn database_integrity(message: impl Into<String>) -> CoreError {
        let message = message.into();
        tracing::error!(%message, "database integrity violation");
        CoreError::DatabaseIntegrity(message)
    }

    /// True if the boundary layer may retry the operation that produced this
    /// error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, CoreError::WriteConflict)
    }
}

/// Translates a raw driver error into the taxonomy above. A `DuplicateKey`
/// write error becomes [`CoreError::DuplicateRecord`]; an error labelled
/// transient or an unknown-commit-result by the driver becomes
/// [`CoreError::WriteConflict`] so the boundary's retry policy can act on it;
/// everything else is a [`CoreError::database_integrity`] violation, since by
/// the time a raw driver error reaches this layer every expected failure
/// mode has already been checked for explicitly.
impl From<mongodb::error::Error> for CoreError {
    fn from(err: mongodb::error::Error) -> CoreError {
        use mongodb::error::ErrorKind;

        if err.contains_label("TransientTransactionError")
            || err.contains_label("UnknownTransactionCommitResult")
        {
            return CoreError::WriteConflict;
        }
        match err.kind.as_ref() {
            ErrorKind::Write(mongodb::error::WriteFailure::WriteError(we)) if we.code == 11000 => {
                CoreError::DuplicateRecord(we.message.clone())
            }
            ErrorKind::BulkWrite(failure)
                if failure
                    .write_errors
                    .as_ref()
                    .map(|errs| errs.iter().any(|e| e.code == 11000))
                    .unwrap_or(false) =>
            {
                CoreError::DuplicateRecord("duplicate key in bulk write".to_string())
            }
            _ => CoreError::database_integrity(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_write_conflict_is_retriable() {
        assert!(CoreError::WriteConflict.is_retriable());
        assert!(!CoreError::LeafParent.is_retriable());
        assert!(!CoreError::InvalidAction("x".into()).is_retriable());
    }
}
