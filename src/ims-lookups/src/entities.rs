// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

use ims_ids::Id;
use serde::{Deserialize, Serialize};

use crate::repository::{Coded, Keyed};

/// A unit of measurement (e.g. `mm`, `kg`) referenced by property
/// descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub value: String,
    pub code: String,
}

impl Unit {
    pub fn new(value: impl Into<String>) -> Unit {
        let value = value.into();
        Unit {
            id: None,
            code: ims_ids::slugify(&value),
            value,
        }
    }
}

impl Coded for Unit {
    fn id(&self) -> Option<Id> {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }
    fn code(&self) -> &str {
        &self.code
    }
}

/// A lifecycle state an item can be in (New, Used, In Use, Scrapped, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub value: String,
    pub code: String,
}

impl UsageStatus {
    pub fn new(value: impl Into<String>) -> UsageStatus {
        let value = value.into();
        UsageStatus {
            id: None,
            code: ims_ids::slugify(&value),
            value,
        }
    }
}

impl Coded for UsageStatus {
    fn id(&self) -> Option<Id> {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_line: String,
    pub town: Option<String>,
    pub county: Option<String>,
    pub country: String,
    pub postcode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    pub code: String,
    pub url: String,
    pub address: Address,
    pub telephone: Option<String>,
}

impl Manufacturer {
    pub fn new(name: impl Into<String>, url: impl Into<String>, address: Address) -> Manufacturer {
        let name = name.into();
        Manufacturer {
            id: None,
            code: ims_ids::slugify(&name),
            name,
            url: url.into(),
            address,
            telephone: None,
        }
    }
}

impl Coded for Manufacturer {
    fn id(&self) -> Option<Id> {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }
    fn code(&self) -> &str {
        &self.code
    }
}

/// A coarse classification of systems (Storage, Operational, Scrapped).
/// Unlike [`Unit`]/[`UsageStatus`]/[`Manufacturer`] this has no code of its
/// own: system types are an administrator-managed closed enumeration, and
/// nothing else needs to slug-match against them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemType {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub value: String,
}

impl SystemType {
    pub fn new(value: impl Into<String>) -> SystemType {
        SystemType {
            id: None,
            value: value.into(),
        }
    }
}

impl Keyed for SystemType {
    fn id(&self) -> Option<Id> {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }
}

/// A permitted transition triple. `src_system_type_id = None` marks item
/// creation rules; `dst_system_type_id = None` marks item deletion rules;
/// both set marks a move rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub src_system_type_id: Option<Id>,
    pub dst_system_type_id: Option<Id>,
    pub dst_usage_status_id: Option<Id>,
}

impl Rule {
    pub fn creation(dst_system_type_id: Id, dst_usage_status_id: Id) -> Rule {
        Rule {
            id: None,
            src_system_type_id: None,
            dst_system_type_id: Some(dst_system_type_id),
            dst_usage_status_id: Some(dst_usage_status_id),
        }
    }

    pub fn movement(src: Id, dst: Id, dst_usage_status_id: Id) -> Rule {
        Rule {
            id: None,
            src_system_type_id: Some(src),
            dst_system_type_id: Some(dst),
            dst_usage_status_id: Some(dst_usage_status_id),
        }
    }

    pub fn deletion(src_system_type_id: Id) -> Rule {
        Rule {
            id: None,
            src_system_type_id: Some(src_system_type_id),
            dst_system_type_id: None,
            dst_usage_status_id: None,
        }
    }

    /// Whether this is a move rule that is a no-op in system type (the open
    /// question in the design notes — decided to reject these, see
    /// `DESIGN.md`).
    pub fn is_degenerate_move(&self) -> bool {
        matches!(
            (self.src_system_type_id, self.dst_system_type_id),
            (Some(src), Some(dst)) if src == dst
        )
    }
}

impl Keyed for Rule {
    fn id(&self) -> Option<Id> {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = Some(id);
    }
}
