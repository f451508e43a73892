// Copyright Inventory Systems Contributors. All rights reserved.
//
// Use of this software is governed by the Apache License, Version 2.0,
// a copy of which is included in the LICENSE file at the root of this
// repository.

//! A thin client for the remote object-storage service that holds
//! attachments and images. Invoked only as a best-effort delete hook
//! during system removal (spec §4.E, §6) — never inside the deleting
//! transaction, since a remote failure must not roll back a local commit
//! that has already succeeded (spec §9 design notes).

use std::time::Duration;

use ims_errors::{CoreError, Result};
use ims_ids::Id;

/// Where the bearer token for the object-storage service comes from.
/// Modeled as an enum rather than a bare string so a future source (e.g. a
/// secrets manager) can be added without changing the client's signature.
#[derive(Debug, Clone)]
pub enum AuthTokenSource {
    Static(String),
}

impl AuthTokenSource {
    fn token(&self) -> &str {
        match self {
            AuthTokenSource::Static(token) => token,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObjectStorageConfig {
    pub enabled: bool,
    pub base_url: String,
    pub request_timeout: Duration,
    pub auth_token_source: AuthTokenSource,
}

#[derive(Clone)]
pub struct ObjectStorageClient {
    config: ObjectStorageConfig,
    http: reqwest::Client,
}

impl ObjectStorageClient {
    pub fn new(config: ObjectStorageConfig) -> ObjectStorageClient {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client configuration is always valid");
        ObjectStorageClient { config, http }
    }

    /// Best-effort deletion of every attachment and image referencing
    /// `entity_id`. A no-op when the collaborator is disabled in
    /// configuration. Errors are returned, not retried — the caller (the
    /// system engine, after its own local delete has committed) decides
    /// whether to log-and-continue or surface the failure.
    pub async fn delete_entity_attachments(&self, entity_id: Id) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.delete("attachments", entity_id).await?;
        self.delete("images", entity_id).await
    }

    async fn delete(&self, resource: &str, entity_id: Id) -> Result<()> {
        let url = format!("{}/{resource}", self.config.base_url);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(self.config.auth_token_source.token())
            .query(&[("entity_id", entity_id.to_hex())])
            .send()
            .await
            .map_err(|e| CoreError::ObjectStorageServer(e.to_string()))?;

        match response.status().as_u16() {
            204 => Ok(()),
            403 => {
                tracing::warn!(entity_id = %entity_id, resource, "object storage rejected our bearer token");
                Err(CoreError::ObjectStorageAuth)
            }
            status => {
                tracing::warn!(entity_id = %entity_id, resource, status, "object storage delete failed");
                Err(CoreError::ObjectStorageServer(format!(
                    "unexpected status {status}"
                )))
            }
        }
    }
}
