// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_errors::{CoreError, Result};
use ims_ids::Id;
use ims_lookups::{Rule, SimpleRepository};
use ims_store::{DbContext, Session};

/// Validates item creation/move/deletion against the configured transition
/// rules (spec §4.E "Rule validation").
#[derive(Clone)]
pub struct RuleValidator {
    rules: SimpleRepository<Rule>,
}

impl RuleValidator {
    pub fn new(db: &DbContext) -> RuleValidator {
        RuleValidator {
            rules: SimpleRepository::new(db, "rules", "rule"),
        }
    }

    /// Admissible iff a rule exists with `src=None, dst=Some(type), dst_usage_status=Some(status)`.
    pub async fn check_creation(&self, session: &mut Session, dst_type_id: Id, dst_usage_status_id: Id) -> Result<()> {
        let rules = self.rules.list_in_session(session).await?;
        let admissible = rules.iter().any(|r| {
            r.src_system_type_id.is_none()
                && r.dst_system_type_id == Some(dst_type_id)
                && r.dst_usage_status_id == Some(dst_usage_status_id)
        });
        if admissible {
            Ok(())
        } else {
            Err(CoreError::InvalidAction(
                "no rule permits creating an item with this system type and usage status".to_string(),
            ))
        }
    }

    /// Admissible iff a rule exists with `src=Some(old), dst=Some(new), dst_usage_status=Some(status)`.
    pub async fn check_move(
        &self,
        session: &mut Session,
        src_type_id: Id,
        dst_type_id: Id,
        dst_usage_status_id: Id,
    ) -> Result<()> {
        if src_type_id == dst_type_id {
            return Ok(());
        }
        let rules = self.rules.list_in_session(session).await?;
        let admissible = rules.iter().any(|r| {
            r.src_system_type_id == Some(src_type_id)
                && r.dst_system_type_id == Some(dst_type_id)
                && r.dst_usage_status_id == Some(dst_usage_status_id)
        });
        if admissible {
            Ok(())
        } else {
            Err(CoreError::InvalidAction(
                "no rule permits this move between system types for the item's usage status".to_string(),
            ))
        }
    }

    /// Admissible iff a rule exists with `src=Some(type), dst=None`.
    pub async fn check_deletion(&self, session: &mut Session, src_type_id: Id) -> Result<()> {
        let rules = self.rules.list_in_session(session).await?;
        let admissible = rules
            .iter()
            .any(|r| r.src_system_type_id == Some(src_type_id) && r.dst_system_type_id.is_none());
        if admissible {
            Ok(())
        } else {
            Err(CoreError::InvalidAction(
                "no rule permits deleting an item with this system type".to_string(),
            ))
        }
    }
}
